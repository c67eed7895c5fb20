//! Commenting on articles.
//!
//! Comment text is wrapped into chunks of at most [`LINE_WIDTH`] display
//! columns and each chunk is posted as its own comment line. Two modes are
//! offered: [`comment`] posts on the article already open, and
//! [`comment_by_aid`] finds the article by its id and reopens it for every
//! chunk.

use crate::error::{BotError, Result};
use crate::keys::{ARROW_LEFT, ENTER};
use crate::link::Link;
use crate::navigation::{enter_article_by_aid_from_board, enter_board_by_name, enter_index};
use crate::width::char_width;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Widest comment line the host accepts, in display columns.
pub const LINE_WIDTH: usize = 52;

const KIND_PROMPT: &str = "您覺得這篇文章";
const ARROW_ONLY_HINT: &str = "使用 → 加註方式";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Push,
    Boo,
    Arrow,
}

impl CommentKind {
    /// Key selecting this kind at the host's prompt.
    pub fn key(self) -> &'static str {
        match self {
            Self::Push => "1",
            Self::Boo => "2",
            Self::Arrow => "3",
        }
    }
}

impl FromStr for CommentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "push" | "1" => Ok(Self::Push),
            "boo" | "2" => Ok(Self::Boo),
            "arrow" | "3" => Ok(Self::Arrow),
            other => Err(format!("unknown comment kind '{other}'")),
        }
    }
}

impl fmt::Display for CommentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Push => "push",
            Self::Boo => "boo",
            Self::Arrow => "arrow",
        })
    }
}

/// What to do when a chunk finds no way to confirm the comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log it and carry on with the next chunk.
    #[default]
    Skip,
    /// Stop and return [`BotError::CommentRejected`].
    Abort,
}

/// Outcome of posting a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentReport {
    pub chunks: usize,
    pub sent: usize,
    pub skipped: usize,
    /// Set when in-place posting stepped back out of the comment UI.
    pub stopped: bool,
}

/// Split `text` into chunks no wider than [`LINE_WIDTH`] columns.
pub fn wrap(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = char_width(ch);
        if width + w > LINE_WIDTH {
            chunks.push(std::mem::take(&mut chunk));
            width = 0;
        }
        chunk.push(ch);
        width += w;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

fn prepare(text: &str) -> Result<Vec<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BotError::EmptyInput);
    }
    Ok(wrap(text))
}

/// Whether the comment UI now on screen lets the chunk be typed and
/// confirmed. Self-authored articles and rate-limited accounts only get
/// the arrow mode, which skips the kind prompt.
fn can_confirm<L: Link + ?Sized>(link: &L) -> bool {
    let screen = link.screen();
    if screen.from_bottom(1).contains(ARROW_ONLY_HINT) {
        return true;
    }
    match link.state().username.as_deref() {
        Some(name) if !name.is_empty() => screen.status().contains(name),
        _ => false,
    }
}

/// Open the comment UI and post one chunk. Returns `false` if the UI offered
/// no confirmation path; nothing was typed in that case.
async fn compose<L: Link + ?Sized>(link: &mut L, kind: CommentKind, chunk: &str) -> Result<bool> {
    link.send("X").await?;
    if link.screen().status().contains(KIND_PROMPT) {
        link.send(kind.key()).await?;
    }
    if !can_confirm(link) {
        return Ok(false);
    }
    link.send(&format!("{chunk}{ENTER}")).await?;
    link.send(&format!("y{ENTER}")).await?;
    Ok(true)
}

/// Comment on the article currently open.
///
/// Stops at the first chunk that cannot be confirmed and steps back out of
/// the comment UI; the report says how many chunks were posted.
pub async fn comment<L: Link + ?Sized>(
    link: &mut L,
    kind: CommentKind,
    text: &str,
) -> Result<CommentReport> {
    link.require_login()?;
    let chunks = prepare(text)?;
    let mut report = CommentReport {
        chunks: chunks.len(),
        ..CommentReport::default()
    };

    for chunk in &chunks {
        if !compose(link, kind, chunk).await? {
            warn!(sent = report.sent, of = report.chunks, "no way to confirm the comment, stepping back");
            link.send(ARROW_LEFT).await?;
            report.stopped = true;
            break;
        }
        report.sent += 1;
        link.send(ENTER).await?;
    }
    info!(%kind, sent = report.sent, "comment posted");
    Ok(report)
}

/// Comment on article `aid` of `boardname`, re-finding it for every chunk.
///
/// The configured [`FailurePolicy`] decides whether an unconfirmable chunk is
/// skipped or aborts the whole comment. The session ends at the index either
/// way.
pub async fn comment_by_aid<L: Link + ?Sized>(
    link: &mut L,
    boardname: &str,
    aid: &str,
    kind: CommentKind,
    text: &str,
) -> Result<CommentReport> {
    let chunks = prepare(text)?;
    let policy = link.config().comment.failure_policy;
    let mut report = CommentReport {
        chunks: chunks.len(),
        ..CommentReport::default()
    };

    enter_board_by_name(link, boardname).await?;
    for (index, chunk) in chunks.iter().enumerate() {
        enter_article_by_aid_from_board(link, aid).await?;
        if compose(link, kind, chunk).await? {
            report.sent += 1;
            continue;
        }
        link.send(ARROW_LEFT).await?;
        match policy {
            FailurePolicy::Skip => {
                warn!(chunk = index, aid, "no way to confirm the comment, skipping chunk");
                report.skipped += 1;
            }
            FailurePolicy::Abort => {
                warn!(chunk = index, aid, "no way to confirm the comment, aborting");
                enter_index(link).await?;
                return Err(BotError::CommentRejected);
            }
        }
    }
    enter_index(link).await?;
    info!(%kind, boardname, aid, sent = report.sent, skipped = report.skipped, "comment posted");
    Ok(report)
}
