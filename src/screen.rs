//! Immutable snapshots of the emulated terminal display.

use crate::width::{get_width, substr_width};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u8 {
        const BOLD      = 0b0000_0001;
        const UNDERLINE = 0b0000_0010;
        const BLINK     = 0b0000_0100;
        const REVERSE   = 0b0000_1000;
    }
}

/// Display attributes of a cell. `None` colors mean the terminal default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Attr {
    pub fg: Option<u8>,
    pub bg: Option<u8>,
    pub flags: AttrFlags,
}

impl Attr {
    pub fn is_default(&self) -> bool {
        *self == Attr::default()
    }
}

/// A run of visual columns `[start, end)` sharing one non-default [`Attr`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttrSpan {
    pub start: usize,
    pub end: usize,
    pub attr: Attr,
}

/// One terminal line: its text (without trailing blank cells) and the
/// attribute spans laid over it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    text: String,
    attrs: Vec<AttrSpan>,
}

static BLANK_ROW: Row = Row {
    text: String::new(),
    attrs: Vec::new(),
};

impl Row {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attrs(text: impl Into<String>, attrs: Vec<AttrSpan>) -> Self {
        Self {
            text: text.into(),
            attrs,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attrs(&self) -> &[AttrSpan] {
        &self.attrs
    }

    /// Attribute in effect at visual column `col`.
    pub fn attr_at(&self, col: usize) -> Attr {
        self.attrs
            .iter()
            .find(|span| span.start <= col && col < span.end)
            .map(|span| span.attr)
            .unwrap_or_default()
    }

    /// Text rendered in visual columns `[start, start + width)`.
    pub fn substr(&self, start: usize, width: Option<usize>) -> &str {
        substr_width(&self.text, start, width)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.text.contains(pattern)
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn width(&self) -> usize {
        get_width(&self.text)
    }
}

/// A fixed grid of `rows` lines, each logically `cols` visual columns wide.
///
/// Indexing past the last row yields a blank row, so screen parsers written
/// against the standard 24-line layout never panic on a smaller terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenBuffer {
    rows: Vec<Row>,
    cols: usize,
}

impl ScreenBuffer {
    pub fn blank(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![Row::default(); rows],
            cols,
        }
    }

    /// Build a screen from rows, padding or truncating to exactly `row_count`.
    pub fn from_rows(mut rows: Vec<Row>, row_count: usize, cols: usize) -> Self {
        rows.resize_with(row_count, Row::default);
        Self { rows, cols }
    }

    /// Build a screen from `(row index, text)` pairs; other rows are blank.
    pub fn from_lines<S: AsRef<str>>(lines: &[(usize, S)], row_count: usize, cols: usize) -> Self {
        let mut screen = Self::blank(row_count, cols);
        for (index, text) in lines {
            if let Some(row) = screen.rows.get_mut(*index) {
                *row = Row::new(text.as_ref());
            }
        }
        screen
    }

    pub fn row(&self, index: usize) -> &Row {
        self.rows.get(index).unwrap_or(&BLANK_ROW)
    }

    pub fn text(&self, index: usize) -> &str {
        self.row(index).text()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Index of the bottom status line (R-1).
    pub fn status_index(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// The bottom status line.
    pub fn status(&self) -> &Row {
        self.row(self.status_index())
    }

    /// Row `n` lines above the status line; `from_bottom(0)` is the status line.
    pub fn from_bottom(&self, n: usize) -> &Row {
        match self.status_index().checked_sub(n) {
            Some(index) => self.row(index),
            None => &BLANK_ROW,
        }
    }
}

impl fmt::Display for ScreenBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(row.text())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_pads_to_row_count() {
        let screen = ScreenBuffer::from_lines(&[(0, "header"), (23, "status")], 24, 80);
        assert_eq!(screen.row_count(), 24);
        assert_eq!(screen.text(0), "header");
        assert_eq!(screen.status().text(), "status");
        assert!(screen.row(5).is_blank());
    }

    #[test]
    fn test_out_of_range_row_is_blank() {
        let screen = ScreenBuffer::blank(4, 80);
        assert_eq!(screen.text(23), "");
        assert_eq!(screen.from_bottom(10).text(), "");
    }

    #[test]
    fn test_from_bottom() {
        let screen = ScreenBuffer::from_lines(&[(21, "a"), (22, "b"), (23, "c")], 24, 80);
        assert_eq!(screen.from_bottom(0).text(), "c");
        assert_eq!(screen.from_bottom(1).text(), "b");
        assert_eq!(screen.from_bottom(2).text(), "a");
    }

    #[test]
    fn test_attr_at() {
        let reverse = Attr {
            flags: AttrFlags::REVERSE,
            ..Attr::default()
        };
        let row = Row::with_attrs(
            "  menu",
            vec![AttrSpan {
                start: 2,
                end: 6,
                attr: reverse,
            }],
        );
        assert!(row.attr_at(1).is_default());
        assert_eq!(row.attr_at(3), reverse);
    }

    #[test]
    fn test_display_joins_rows() {
        let screen = ScreenBuffer::from_lines(&[(0, "a"), (2, "c")], 3, 80);
        assert_eq!(screen.to_string(), "a\n\nc");
    }
}
