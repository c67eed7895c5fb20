//! Moving around the host's menus, boards and articles.
//!
//! Every move that fails sends the session back to the index before the
//! error is returned, so a failed navigation never leaves it somewhere
//! unexpected.

use crate::error::{BotError, Result};
use crate::keys::{ARROW_LEFT, ARROW_RIGHT, END, ENTER, HOME};
use crate::link::Link;
use crate::screen::ScreenBuffer;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Enough steps back to reach the index from any nesting depth.
const INDEX_DEPTH: usize = 10;
const BOARD_LIST_TITLE: &str = "看板列表";

/// Column windows holding a menu entry's sequence number, tried in order.
const COUNTER_COLUMNS: [(usize, usize); 2] = [(3, 4), (15, 2)];
/// First menu row below the header lines.
const FIRST_ENTRY_ROW: usize = 3;

static BOARD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"【(?P<title>.*)】.*《(?P<boardname>.*)》").expect("board header pattern is valid")
});

/// Back out to the index.
pub async fn enter_index<L: Link + ?Sized>(link: &mut L) -> Result<()> {
    link.send(&ARROW_LEFT.repeat(INDEX_DEPTH)).await?;
    Ok(())
}

/// The board name shown in the header row, if a board is open.
pub fn current_boardname(screen: &ScreenBuffer) -> Option<String> {
    let caps = BOARD_HEADER.captures(screen.text(0))?;
    if caps["title"].starts_with(BOARD_LIST_TITLE) {
        return None;
    }
    Some(caps["boardname"].to_string())
}

/// Open a board by name through the board search.
///
/// # Errors
///
/// [`BotError::NavigationFailed`] if the header does not show the requested
/// board afterwards.
pub async fn enter_board_by_name<L: Link + ?Sized>(link: &mut L, boardname: &str) -> Result<()> {
    link.send(&format!("s{boardname}{ENTER} {HOME}{END}")).await?;
    match current_boardname(link.screen()) {
        Some(current) if current.eq_ignore_ascii_case(boardname) => {
            info!(boardname = %current, "entered board");
            link.confirm_board(&current);
            Ok(())
        }
        current => {
            warn!(boardname, ?current, "board not entered");
            enter_index(link).await?;
            Err(BotError::NavigationFailed(format!(
                "board '{boardname}' not entered (screen shows {current:?})"
            )))
        }
    }
}

/// Resolve a menu offset against the entries on screen.
///
/// Positive offsets are literal entry numbers; negative ones count from the
/// last entry shown, so `-1` is the last entry. Zero never resolves.
pub fn resolve_offset(screen: &ScreenBuffer, offset: i64) -> Option<i64> {
    if offset > 0 {
        return Some(offset);
    }
    if offset == 0 {
        return None;
    }
    let last = (FIRST_ENTRY_ROW..screen.status_index()).rev().find_map(|index| {
        let row = screen.row(index);
        COUNTER_COLUMNS.iter().find_map(|&(start, width)| {
            row.substr(start, Some(width)).trim().parse::<i64>().ok()
        })
    })?;
    let target = offset + last + 1;
    (target > 0).then_some(target)
}

/// Follow a sequence of menu offsets from the current menu.
///
/// On success the board named in the header, if any, becomes the confirmed
/// position.
pub async fn enter_by_offset<L: Link + ?Sized>(link: &mut L, offsets: &[i64]) -> Result<()> {
    for &offset in offsets {
        let Some(target) = resolve_offset(link.screen(), offset) else {
            warn!(offset, "menu offset does not resolve");
            enter_index(link).await?;
            return Err(BotError::NavigationFailed(format!(
                "menu offset {offset} does not resolve"
            )));
        };
        debug!(offset, target, "selecting menu entry");
        link.send(&format!("{target}{ENTER}{ENTER} {HOME}{END}")).await?;
    }
    if let Some(boardname) = current_boardname(link.screen()) {
        info!(%boardname, "entered board");
        link.confirm_board(&boardname);
    }
    link.send(HOME).await?;
    Ok(())
}

/// Walk the class menu by offsets.
pub async fn enter_board_by_offset<L: Link + ?Sized>(link: &mut L, offsets: &[i64]) -> Result<()> {
    link.send(&format!("C{ENTER}")).await?;
    enter_by_offset(link, offsets).await
}

/// Walk the favorites menu by offsets.
pub async fn enter_favorite<L: Link + ?Sized>(link: &mut L, offsets: &[i64]) -> Result<()> {
    link.send(&format!("F{ENTER}")).await?;
    enter_by_offset(link, offsets).await
}

/// Open article `aid` (with or without its leading `#`) on the board
/// already open.
pub async fn enter_article_by_aid_from_board<L: Link + ?Sized>(
    link: &mut L,
    aid: &str,
) -> Result<()> {
    link.require_login()?;
    let aid = aid.trim_start_matches('#');
    if !link.send(&format!("#{aid}{ENTER}")).await? {
        link.send(ENTER).await?;
        return Err(BotError::NavigationFailed(format!("article #{aid} not found")));
    }
    link.send(ARROW_RIGHT).await?;
    Ok(())
}

/// Open board `boardname`, then article `aid` on it.
pub async fn enter_article_by_aid<L: Link + ?Sized>(
    link: &mut L,
    boardname: &str,
    aid: &str,
) -> Result<()> {
    link.require_login()?;
    enter_board_by_name(link, boardname).await?;
    enter_article_by_aid_from_board(link, aid).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLink, screen};

    const GOSSIPING: &str = "【板主:someone】   八卦 ...    看板《Gossiping》";

    fn menu(entries: &[(usize, &str)]) -> ScreenBuffer {
        let mut lines = vec![(0, "【看板列表】   我的最愛   看板《我的最愛》")];
        lines.extend_from_slice(entries);
        screen(&lines)
    }

    #[test]
    fn test_current_boardname() {
        assert_eq!(current_boardname(&screen(&[(0, GOSSIPING)])).as_deref(), Some("Gossiping"));
        assert_eq!(current_boardname(&menu(&[])), None);
        assert_eq!(current_boardname(&screen(&[(0, "【主功能表】")])), None);
    }

    #[test]
    fn test_resolve_offset() {
        let screen = menu(&[
            (3, "     1   ˇTest         測試"),
            (4, "     2   ˇGossiping    八卦"),
            (5, "    12   ˇC_Chat       閒聊"),
        ]);
        assert_eq!(resolve_offset(&screen, 4), Some(4));
        assert_eq!(resolve_offset(&screen, 0), None);
        assert_eq!(resolve_offset(&screen, -1), Some(12));
        assert_eq!(resolve_offset(&screen, -3), Some(10));
        assert_eq!(resolve_offset(&screen, -12), Some(1));
        assert_eq!(resolve_offset(&screen, -13), None);
        assert_eq!(resolve_offset(&menu(&[]), -1), None);
    }

    #[tokio::test]
    async fn test_enter_board_by_name() {
        let mut link = ScriptedLink::logged_in("guest").reply(screen(&[(0, GOSSIPING)]));
        enter_board_by_name(&mut link, "gossiping").await.unwrap();
        assert_eq!(link.sent, vec!["sgossiping\r \x1b[1~\x1b[4~"]);
        assert_eq!(link.boardname(), Some("Gossiping"));
    }

    #[tokio::test]
    async fn test_enter_board_by_name_mismatch() {
        let mut link = ScriptedLink::logged_in("guest").reply(screen(&[(0, GOSSIPING)]));
        let result = enter_board_by_name(&mut link, "Test").await;
        assert!(matches!(result, Err(BotError::NavigationFailed(_))));
        assert_eq!(link.sent.last(), Some(&ARROW_LEFT.repeat(10)));
        assert_eq!(link.boardname(), Some(""));
    }

    #[tokio::test]
    async fn test_enter_favorite_last_entry() {
        let entries = [(3, "     1   ˇTest"), (4, "     2   ˇGossiping")];
        let mut link = ScriptedLink::logged_in("guest")
            .reply(menu(&entries))
            .reply(screen(&[(0, GOSSIPING)]))
            .reply(screen(&[(0, GOSSIPING)]));
        enter_favorite(&mut link, &[-1]).await.unwrap();
        assert_eq!(link.sent, vec!["F\r", "2\r\r \x1b[1~\x1b[4~", HOME]);
        assert_eq!(link.boardname(), Some("Gossiping"));
    }

    #[tokio::test]
    async fn test_zero_offset_aborts() {
        let mut link = ScriptedLink::logged_in("guest").reply(menu(&[(3, "     1   ˇTest")]));
        let result = enter_board_by_offset(&mut link, &[1, 0]).await;
        assert!(matches!(result, Err(BotError::NavigationFailed(_))));
        assert_eq!(link.sent[0], "C\r");
        assert_eq!(link.sent[1], "1\r\r \x1b[1~\x1b[4~");
        assert_eq!(link.sent.last(), Some(&ARROW_LEFT.repeat(10)));
    }

    #[tokio::test]
    async fn test_article_not_found() {
        let mut link = ScriptedLink::logged_in("guest").silent();
        let result = enter_article_by_aid_from_board(&mut link, "#1abcDEF").await;
        assert!(matches!(result, Err(BotError::NavigationFailed(_))));
        assert_eq!(link.sent, vec!["#1abcDEF\r", "\r"]);
    }

    #[tokio::test]
    async fn test_article_requires_login() {
        let mut link = ScriptedLink::new();
        let result = enter_article_by_aid(&mut link, "Test", "1abcDEF").await;
        assert!(matches!(result, Err(BotError::NotAuthenticated)));
        assert!(link.sent.is_empty());
    }
}
