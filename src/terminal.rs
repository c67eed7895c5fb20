//! Terminal emulation: turns decoded host output into a [`ScreenBuffer`].
//!
//! [`Terminal`] is the seam; [`VteTerminal`] is the default implementation,
//! covering the cursor, erase and color sequences a BBS actually emits.
//! Cell widths follow [`crate::width`] so the grid lines up with the host's
//! double-width layout.

use crate::screen::{Attr, AttrFlags, AttrSpan, Row, ScreenBuffer};
use crate::width::char_width;

pub trait Terminal: Send {
    /// Feed decoded host output.
    fn write(&mut self, text: &str);

    /// Current display contents.
    fn snapshot(&self) -> ScreenBuffer;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cell {
    Char(char, Attr),
    /// Right half of a double-width glyph.
    Tail(Attr),
}

impl Cell {
    const BLANK: Cell = Cell::Char(' ', Attr {
        fg: None,
        bg: None,
        flags: AttrFlags::empty(),
    });

    fn attr(&self) -> Attr {
        match *self {
            Cell::Char(_, attr) | Cell::Tail(attr) => attr,
        }
    }
}

struct Grid {
    cells: Vec<Vec<Cell>>,
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
    attr: Attr,
    saved: (usize, usize),
}

impl Grid {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![vec![Cell::BLANK; cols]; rows],
            rows,
            cols,
            row: 0,
            col: 0,
            attr: Attr::default(),
            saved: (0, 0),
        }
    }

    fn blank_line(&self) -> Vec<Cell> {
        vec![Cell::BLANK; self.cols]
    }

    fn line_feed(&mut self) {
        if self.row + 1 >= self.rows {
            self.cells.remove(0);
            let line = self.blank_line();
            self.cells.push(line);
        } else {
            self.row += 1;
        }
    }

    fn reverse_index(&mut self) {
        if self.row == 0 {
            self.cells.pop();
            let line = self.blank_line();
            self.cells.insert(0, line);
        } else {
            self.row -= 1;
        }
    }

    fn put_char(&mut self, c: char) {
        let width = char_width(c);
        if width > self.cols {
            return; // a wide glyph can never fit a one-column screen
        }
        if self.col + width > self.cols {
            self.col = 0;
            self.line_feed();
        }
        let (row, col) = (self.row, self.col);
        // Overwriting half of a wide glyph blanks the other half.
        if let Cell::Tail(_) = self.cells[row][col] {
            if col > 0 {
                self.cells[row][col - 1] = Cell::BLANK;
            }
        }
        if width == 2 {
            self.cells[row][col] = Cell::Char(c, self.attr);
            self.cells[row][col + 1] = Cell::Tail(self.attr);
        } else {
            self.cells[row][col] = Cell::Char(c, self.attr);
            if let Some(Cell::Tail(_)) = self.cells[row].get(col + 1) {
                self.cells[row][col + 1] = Cell::BLANK;
            }
        }
        self.col += width;
    }

    fn erase_cells(&mut self, row: usize, from: usize, to: usize) {
        let to = to.min(self.cols);
        for cell in &mut self.cells[row][from.min(to)..to] {
            *cell = Cell::BLANK;
        }
    }

    fn erase_display(&mut self, mode: u16) {
        match mode {
            0 => {
                self.erase_cells(self.row, self.col, self.cols);
                for row in self.row + 1..self.rows {
                    self.erase_cells(row, 0, self.cols);
                }
            }
            1 => {
                for row in 0..self.row {
                    self.erase_cells(row, 0, self.cols);
                }
                self.erase_cells(self.row, 0, self.col + 1);
            }
            _ => {
                for row in 0..self.rows {
                    self.erase_cells(row, 0, self.cols);
                }
            }
        }
    }

    fn erase_line(&mut self, mode: u16) {
        match mode {
            0 => self.erase_cells(self.row, self.col, self.cols),
            1 => self.erase_cells(self.row, 0, self.col + 1),
            _ => self.erase_cells(self.row, 0, self.cols),
        }
    }

    fn insert_lines(&mut self, count: usize) {
        for _ in 0..count.min(self.rows - self.row) {
            self.cells.pop();
            let line = self.blank_line();
            self.cells.insert(self.row, line);
        }
    }

    fn delete_lines(&mut self, count: usize) {
        for _ in 0..count.min(self.rows - self.row) {
            self.cells.remove(self.row);
            let line = self.blank_line();
            self.cells.push(line);
        }
    }

    fn goto(&mut self, row: usize, col: usize) {
        self.row = row.min(self.rows - 1);
        self.col = col.min(self.cols - 1);
    }

    fn select_graphic_rendition(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.attr = Attr::default();
            return;
        }
        for &p in params {
            match p {
                0 => self.attr = Attr::default(),
                1 => self.attr.flags.insert(AttrFlags::BOLD),
                4 => self.attr.flags.insert(AttrFlags::UNDERLINE),
                5 => self.attr.flags.insert(AttrFlags::BLINK),
                7 => self.attr.flags.insert(AttrFlags::REVERSE),
                22 => self.attr.flags.remove(AttrFlags::BOLD),
                24 => self.attr.flags.remove(AttrFlags::UNDERLINE),
                25 => self.attr.flags.remove(AttrFlags::BLINK),
                27 => self.attr.flags.remove(AttrFlags::REVERSE),
                n @ 30..=37 => self.attr.fg = Some((n - 30) as u8),
                39 => self.attr.fg = None,
                n @ 40..=47 => self.attr.bg = Some((n - 40) as u8),
                49 => self.attr.bg = None,
                _ => {}
            }
        }
    }

    fn row_snapshot(&self, row: usize) -> Row {
        let cells = &self.cells[row];
        let used = cells
            .iter()
            .rposition(|cell| *cell != Cell::BLANK)
            .map_or(0, |i| i + 1);

        let mut text = String::new();
        let mut spans: Vec<AttrSpan> = Vec::new();
        for (col, cell) in cells.iter().enumerate() {
            if col < used {
                if let Cell::Char(c, _) = cell {
                    text.push(*c);
                }
            }
            let attr = cell.attr();
            if attr.is_default() {
                continue;
            }
            match spans.last_mut() {
                Some(span) if span.end == col && span.attr == attr => span.end = col + 1,
                _ => spans.push(AttrSpan {
                    start: col,
                    end: col + 1,
                    attr,
                }),
            }
        }
        Row::with_attrs(text, spans)
    }
}

impl vte::Perform for Grid {
    fn print(&mut self, c: char) {
        self.put_char(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | 0x0b | 0x0c => self.line_feed(),
            b'\r' => self.col = 0,
            0x08 => self.col = self.col.saturating_sub(1),
            b'\t' => self.col = ((self.col / 8 + 1) * 8).min(self.cols - 1),
            _ => {}
        }
    }

    fn csi_dispatch(&mut self, params: &vte::Params, intermediates: &[u8], _ignore: bool, action: char) {
        if !intermediates.is_empty() {
            return;
        }
        let params: Vec<u16> = params.iter().map(|p| p[0]).collect();
        let arg = |i: usize| params.get(i).copied().filter(|&n| n > 0).unwrap_or(1) as usize;
        match action {
            'H' | 'f' => self.goto(arg(0) - 1, arg(1) - 1),
            'A' => self.row = self.row.saturating_sub(arg(0)),
            'B' => self.row = (self.row + arg(0)).min(self.rows - 1),
            'C' => self.col = (self.col + arg(0)).min(self.cols - 1),
            'D' => self.col = self.col.saturating_sub(arg(0)),
            'G' => self.col = (arg(0) - 1).min(self.cols - 1),
            'd' => self.row = (arg(0) - 1).min(self.rows - 1),
            'J' => self.erase_display(params.first().copied().unwrap_or(0)),
            'K' => self.erase_line(params.first().copied().unwrap_or(0)),
            'L' => self.insert_lines(arg(0)),
            'M' => self.delete_lines(arg(0)),
            'm' => self.select_graphic_rendition(&params),
            's' => self.saved = (self.row, self.col),
            'u' => {
                let (row, col) = self.saved;
                self.goto(row, col);
            }
            _ => {}
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        if !intermediates.is_empty() {
            return;
        }
        match byte {
            b'M' => self.reverse_index(),
            b'D' => self.line_feed(),
            b'E' => {
                self.col = 0;
                self.line_feed();
            }
            b'7' => self.saved = (self.row, self.col),
            b'8' => {
                let (row, col) = self.saved;
                self.goto(row, col);
            }
            b'c' => *self = Grid::new(self.rows, self.cols),
            _ => {}
        }
    }
}

/// Fixed-size terminal backed by the `vte` escape-sequence parser.
pub struct VteTerminal {
    parser: vte::Parser,
    grid: Grid,
}

impl VteTerminal {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            parser: vte::Parser::new(),
            grid: Grid::new(rows.max(1), cols.max(2)),
        }
    }
}

impl Terminal for VteTerminal {
    fn write(&mut self, text: &str) {
        self.parser.advance(&mut self.grid, text.as_bytes());
    }

    fn snapshot(&self) -> ScreenBuffer {
        let rows = (0..self.grid.rows).map(|r| self.grid.row_snapshot(r)).collect();
        ScreenBuffer::from_rows(rows, self.grid.rows, self.grid.cols)
    }
}
