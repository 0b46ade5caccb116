//! The compiled-in ASCII art and the glyph grid it is laid out on.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Art shown when no other source is given. Embedded at compile time.
pub const DEFAULT_ART: &str = include_str!("../../art/banner.txt");

/// Size of one glyph cell in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub width: f32,
    pub height: f32,
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Width in columns and height in rows of a piece of art.
pub fn art_dimensions(art: &str) -> (usize, usize) {
    let width = art.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
    (width, art.lines().count())
}

/// Every visible glyph with its (column, row) on the grid.
///
/// Columns advance by display width, so wide glyphs take two cells.
/// Whitespace and zero-width characters produce no glyph.
pub fn glyph_cells(art: &str) -> Vec<(char, usize, usize)> {
    let mut cells = Vec::new();
    for (row, line) in art.lines().enumerate() {
        let mut col = 0;
        for ch in line.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            if !ch.is_whitespace() {
                cells.push((ch, col, row));
            }
            col += width;
        }
    }
    cells
}
