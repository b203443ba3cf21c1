// SPDX-License-Identifier: MIT
//
// ScreenBuffer: the grid the editor writes into, and the renderer that
// copies regions of it to the backend.
//
// The editor owns what is in the grid; the driver only reads it at paint
// time. Painting is explicit: the editor marks a rectangle as ready with
// `paint_rect`, and every row of that rectangle is resolved through the
// palette pool and handed to the backend in one call.
//
// Design:
//
//   - Flat `Vec<ScreenCell>` with row-major indexing. A row's cells are
//     contiguous, so building a paint row is a linear scan.
//
//   - One cell per column, always. `put_str` substitutes `?` for anything
//     that isn't exactly one column wide (CJK, combining marks, controls)
//     so the grid and the terminal can't disagree about positions.

use unicode_width::UnicodeWidthChar;

use crate::backend::Backend;
use crate::cell::{PaintCell, ScreenCell};
use crate::palette::{PaletteId, PalettePool};

// ─── Rect ────────────────────────────────────────────────────────────────────

/// A screen rectangle in cell coordinates.
///
/// ```
/// use ww_disp::screen::Rect;
///
/// let r = Rect::new(10, 5, 20, 3);
/// assert_eq!(r.right(), 30);
/// assert_eq!(r.bottom(), 8);
/// assert!(r.fits_in(80, 25));
/// assert!(!r.fits_in(25, 25));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> u32 {
        self.x as u32 + self.w as u32
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> u32 {
        self.y as u32 + self.h as u32
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Whether the rectangle lies entirely inside a `width` x `height` area.
    #[inline]
    #[must_use]
    pub const fn fits_in(self, width: u16, height: u16) -> bool {
        self.right() <= width as u32 && self.bottom() <= height as u32
    }
}

// ─── ScreenBuffer ────────────────────────────────────────────────────────────

/// Row-major grid of [`ScreenCell`]s sized to the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenBuffer {
    width: u16,
    height: u16,
    cells: Vec<ScreenCell>,
}

impl ScreenBuffer {
    /// A buffer of blank cells (space on palette entry 0).
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![ScreenCell::BLANK; size],
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&ScreenCell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Bounds-checked write. Returns `true` if the position was in bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: ScreenCell) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        self.cells[idx] = cell;
        true
    }

    /// A single row as a slice, `None` if `y` is out of bounds.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[ScreenCell]> {
        if y < self.height {
            let start = self.index(0, y);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    /// Resize, clearing all content to blank cells.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let size = usize::from(width) * usize::from(height);
        self.cells.clear();
        self.cells.resize(size, ScreenCell::BLANK);
    }

    /// Fill the part of `rect` that lies on screen with `cell`.
    pub fn fill(&mut self, rect: Rect, cell: ScreenCell) {
        if rect.x >= self.width {
            return;
        }
        let x_end = rect.right().min(u32::from(self.width));
        let y_end = rect.bottom().min(u32::from(self.height));
        for y in u32::from(rect.y)..y_end {
            #[allow(clippy::cast_possible_truncation)] // y < height (u16).
            let start = self.index(rect.x, y as u16);
            let len = x_end.saturating_sub(u32::from(rect.x)) as usize;
            self.cells[start..start + len].fill(cell);
        }
    }

    /// Write `text` starting at `(x, y)` with `palette`, one glyph per
    /// column, clipped at the right edge.
    ///
    /// Characters whose display width isn't exactly 1 are written as `?`.
    /// Returns the number of columns written.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, palette: PaletteId) -> u16 {
        if y >= self.height {
            return 0;
        }
        let mut col = x;
        for ch in text.chars() {
            if col >= self.width {
                break;
            }
            let glyph = if ch.width() == Some(1) { ch } else { '?' };
            self.set(col, y, ScreenCell::new(glyph, palette));
            col += 1;
        }
        col - x
    }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Copy `rect` of `screen` to `backend`, one `paint_row` call per row.
///
/// Each cell's palette id is resolved through `pool` into the color pair
/// and attributes the backend renders. Nothing is flushed.
///
/// # Panics
///
/// - if `rect` is empty or extends past the screen,
/// - if a cell in `rect` references a palette entry that isn't in use,
/// - if the backend fails to paint a row (the terminal connection is gone).
pub fn paint_rect(screen: &ScreenBuffer, pool: &PalettePool, backend: &mut impl Backend, rect: Rect) {
    assert!(!rect.is_empty(), "paint of empty rectangle {rect:?}");
    assert!(
        rect.fits_in(screen.width(), screen.height()),
        "paint rectangle {rect:?} outside {}x{} screen",
        screen.width(),
        screen.height()
    );

    let x0 = usize::from(rect.x);
    let x1 = x0 + usize::from(rect.w);
    let mut row_buf: Vec<PaintCell> = Vec::with_capacity(usize::from(rect.w));

    for y in rect.y..rect.y + rect.h {
        let start = screen.index(0, y);
        row_buf.clear();
        row_buf.extend(screen.cells[start + x0..start + x1].iter().map(|cell| {
            let (pair, attrs) = pool.resolve(cell.palette);
            PaintCell::new(cell.glyph, pair, attrs)
        }));
        backend
            .paint_row(rect.x, y, &row_buf)
            .unwrap_or_else(|e| panic!("backend paint failed at row {y}: {e}"));
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
