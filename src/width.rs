//! Visual-width text access.
//!
//! The host lays its screens out in display columns, and every code point at
//! or above [`WIDE_THRESHOLD`] occupies two of them. All row parsing goes
//! through these helpers rather than raw character indices.

/// Code points at or above this value render two columns wide.
pub const WIDE_THRESHOLD: u32 = 0xFF;

/// Display width of one character: 1 or 2.
#[inline]
pub fn char_width(c: char) -> usize {
    if c as u32 >= WIDE_THRESHOLD { 2 } else { 1 }
}

/// Total display width of `s`.
pub fn get_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Character index of the first character that starts at or after visual
/// column `width`. Returns the character count if the string is narrower.
///
/// A double-width glyph straddling `width` is skipped, so the result always
/// points at a character boundary that is also a column boundary.
pub fn index_of_width(s: &str, width: usize) -> usize {
    let mut col = 0;
    for (i, ch) in s.chars().enumerate() {
        if col >= width {
            return i;
        }
        col += char_width(ch);
    }
    s.chars().count()
}

/// The slice of `s` rendered within visual columns `[start, start + width)`,
/// or `[start, ..)` when `width` is `None`.
///
/// A double-width glyph that straddles either boundary is left out, so the
/// width of the result never exceeds the requested window.
pub fn substr_width(s: &str, start: usize, width: Option<usize>) -> &str {
    let end = width.map(|w| start + w);
    let mut col = 0;
    let mut from = None;
    let mut to = s.len();
    for (idx, ch) in s.char_indices() {
        if from.is_none() && col >= start {
            from = Some(idx);
        }
        let w = char_width(ch);
        if let Some(end) = end {
            if col + w > end {
                to = idx;
                break;
            }
        }
        col += w;
    }
    match from {
        Some(from) if from <= to => &s[from..to],
        _ => "",
    }
}
