//! Articles as read from board listings and the pager.

use crate::screen::{Row, ScreenBuffer};
use crate::width::substr_width;

/// Listing marker of a pinned article.
pub const PINNED_MARK: &str = "★";
const HEADER_LABEL: &str = "作者";

/// First listing row below the board header.
const FIRST_LISTING_ROW: usize = 3;

/// An article, as far as it is known.
///
/// Listing rows fill in the summary fields; reading the article adds
/// `content` and the header fields parsed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub boardname: String,
    /// Sequence number in the board view or search result it was read
    /// from; 0 for pinned articles, which carry no number.
    pub id: u32,
    pub push: String,
    pub date: String,
    pub timestamp: String,
    pub author: String,
    pub status: String,
    pub title: String,
    pub pinned: bool,
    pub content: Vec<Row>,
}

impl Article {
    /// Parse one board listing row.
    pub fn from_row(boardname: &str, row: &Row) -> Self {
        let field = |start, width| row.substr(start, Some(width)).trim().to_string();
        let number = field(1, 7);
        Self {
            boardname: boardname.to_string(),
            id: number.parse().unwrap_or(0),
            pinned: number == PINNED_MARK,
            push: field(9, 2),
            date: field(11, 5),
            author: field(17, 12),
            status: field(30, 2),
            title: row.substr(32, None).trim().to_string(),
            ..Self::default()
        }
    }

    /// Whether the content starts with the standard author/title/time header.
    pub fn has_header(&self) -> bool {
        self.content
            .first()
            .is_some_and(|row| row.substr(0, Some(6)).trim() == HEADER_LABEL)
    }

    /// Fill author, title and timestamp from the content header.
    ///
    /// Does nothing when the article has no standard header, e.g. a reposted
    /// announcement.
    pub fn apply_header(&mut self) {
        if !self.has_header() {
            return;
        }
        let line = |i: usize| self.content.get(i).map(Row::text).unwrap_or_default();
        let author = substr_width(line(0), 7, Some(50)).trim().to_string();
        let title = substr_width(line(1), 7, None).trim().to_string();
        let timestamp = substr_width(line(2), 7, None).trim().to_string();
        self.author = author;
        self.title = title;
        self.timestamp = timestamp;
    }

    /// The content as plain text, one line per row.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(Row::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Articles listed on screen, top to bottom, up to the first blank row.
pub(crate) fn read_listing(screen: &ScreenBuffer, boardname: &str) -> Vec<Article> {
    screen
        .rows()
        .get(FIRST_LISTING_ROW..screen.status_index())
        .unwrap_or_default()
        .iter()
        .take_while(|row| !row.is_blank())
        .map(|row| Article::from_row(boardname, row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{listing_row, screen};

    #[test]
    fn test_from_row() {
        let row = Row::new(listing_row("1234", "爆", " 9/30", "someone", "[問卦] 有沒有八卦"));
        let article = Article::from_row("Gossiping", &row);
        assert_eq!(article.id, 1234);
        assert!(!article.pinned);
        assert_eq!(article.push, "爆");
        assert_eq!(article.date, "9/30");
        assert_eq!(article.author, "someone");
        assert_eq!(article.status, "□");
        assert_eq!(article.title, "[問卦] 有沒有八卦");
        assert_eq!(article.boardname, "Gossiping");
    }

    #[test]
    fn test_pinned_row() {
        let row = Row::new(listing_row("★", "", "", "admin", "[公告] 板規"));
        let article = Article::from_row("Test", &row);
        assert_eq!(article.id, 0);
        assert!(article.pinned);
        assert_eq!(article.author, "admin");
    }

    #[test]
    fn test_apply_header() {
        let mut article = Article {
            content: vec![
                Row::new(format!(" 作者  {:<50}看板  Test", "someone (暱稱)")),
                Row::new(" 標題  [測試] hello"),
                Row::new(" 時間  Fri Oct 16 12:00:00 2026"),
                Row::new(""),
                Row::new("body"),
            ],
            ..Article::default()
        };
        assert!(article.has_header());
        article.apply_header();
        assert_eq!(article.author, "someone (暱稱)");
        assert_eq!(article.title, "[測試] hello");
        assert_eq!(article.timestamp, "Fri Oct 16 12:00:00 2026");
        assert!(article.text().ends_with("\n\nbody"));
    }

    #[test]
    fn test_headerless_content_untouched() {
        let mut article = Article {
            title: "kept".into(),
            content: vec![Row::new("just text")],
            ..Article::default()
        };
        assert!(!article.has_header());
        article.apply_header();
        assert_eq!(article.title, "kept");
    }

    #[test]
    fn test_read_listing_stops_at_blank() {
        let first = listing_row("2", "", "10/16", "a", "first");
        let second = listing_row("3", "", "10/16", "b", "second");
        let after = listing_row("9", "", "10/16", "c", "unreachable");
        let screen = screen(&[
            (0, "【板主:someone】  看板《Test》"),
            (3, first.as_str()),
            (4, second.as_str()),
            (6, after.as_str()),
        ]);
        let articles = read_listing(&screen, "Test");
        let ids: Vec<u32> = articles.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
