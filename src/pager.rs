//! Reading a full article out of the host's pager.

use crate::error::Result;
use crate::keys::{HOME, PAGE_DOWN};
use crate::link::Link;
use crate::screen::{Row, ScreenBuffer};
use tracing::{debug, warn};

/// Status-line marker of the last page.
pub const LAST_PAGE_MARKER: &str = "100%";
/// Status-line marker of an article with no body.
pub const EMPTY_MARKER: &str = "此文章無內容";

fn is_last_page(screen: &ScreenBuffer) -> bool {
    let status = screen.status();
    status.contains(LAST_PAGE_MARKER) || status.contains(EMPTY_MARKER)
}

/// Collect the article currently open in the pager, one row per line.
///
/// Pages forward until the status line reports the end, then joins the last
/// page onto what was already collected. The last page usually overlaps the
/// previous one, so only the rows after the previously collected last line
/// are appended. Trailing blank lines are dropped. If any paging happened,
/// the pager is returned to the top.
pub async fn read_content<L: Link + ?Sized>(link: &mut L) -> Result<Vec<Row>> {
    let mut lines = vec![link.screen().row(0).clone()];
    let mut paged = false;

    while !is_last_page(link.screen()) {
        let screen = link.screen();
        lines.extend_from_slice(&screen.rows()[1..screen.status_index()]);
        paged = true;
        if !link.send(PAGE_DOWN).await? {
            warn!(lines = lines.len(), "pager stopped responding, keeping partial content");
            break;
        }
    }

    join_last_page(&mut lines, link.screen());
    while lines.last().is_some_and(Row::is_blank) {
        lines.pop();
    }
    debug!(lines = lines.len(), paged, "article read");

    if paged {
        link.send(HOME).await?;
    }
    Ok(lines)
}

fn join_last_page(lines: &mut Vec<Row>, screen: &ScreenBuffer) {
    let body_end = screen.status_index();
    let Some(last) = lines.last() else {
        return;
    };
    let start = match (0..body_end).find(|&i| screen.text(i) == last.text()) {
        Some(i) => i + 1,
        None => 1,
    };
    if start < body_end {
        lines.extend_from_slice(&screen.rows()[start..body_end]);
    }
}
