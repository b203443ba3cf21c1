// SPDX-License-Identifier: MIT
//
// Cells: what the editor writes, and what the backend paints.
//
// The editor fills a grid of `ScreenCell`s. Each holds a glyph and a
// palette id: a small handle returned by the palette pool, not a color.
// At paint time the renderer resolves each palette id into the color pair
// and attribute bits the backend understands and composes a `PaintCell`.
//
// Keeping the palette id in the screen grid (instead of resolved colors)
// means a palette change is visible on the next paint without touching
// the grid.

use crate::palette::{ColorPairId, PaletteId};
use crate::style::Attr;

/// Default glyph for empty cells.
const SPACE: u32 = b' ' as u32;

/// One character position in the editor's screen buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenCell {
    /// Unicode codepoint. One cell is always one terminal column.
    pub glyph: u32,
    /// Palette entry the glyph is drawn with.
    pub palette: PaletteId,
}

impl ScreenCell {
    /// A blank cell drawn with palette entry 0.
    pub const BLANK: Self = Self {
        glyph: SPACE,
        palette: PaletteId::new(0),
    };

    #[inline]
    #[must_use]
    pub const fn new(ch: char, palette: PaletteId) -> Self {
        Self {
            glyph: ch as u32,
            palette,
        }
    }

    /// The glyph as a `char`, `None` if it isn't a valid scalar value.
    #[inline]
    #[must_use]
    pub const fn ch(self) -> Option<char> {
        char::from_u32(self.glyph)
    }
}

impl Default for ScreenCell {
    fn default() -> Self {
        Self::BLANK
    }
}

/// A cell composed for the backend: glyph plus resolved color and style.
///
/// The backend writes these verbatim; it only decodes the pair and the
/// attribute bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintCell {
    pub glyph: u32,
    pub pair: ColorPairId,
    pub attrs: Attr,
}

impl PaintCell {
    #[inline]
    #[must_use]
    pub const fn new(glyph: u32, pair: ColorPairId, attrs: Attr) -> Self {
        Self { glyph, pair, attrs }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
