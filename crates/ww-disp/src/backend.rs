// SPDX-License-Identifier: MIT
//
// The seam between the driver and whatever draws the characters.
//
// `Backend` is the small surface the palette pool and the renderer need:
// register a color pair, paint one row of resolved cells, place and show
// the cursor, clear, flush. `AnsiBackend` implements it over any writer by
// translating pairs into SGR colors itself; a terminal has no color-pair
// concept of its own.
//
// Tests run against `AnsiBackend<Vec<u8>>` and inspect the bytes.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::PaintCell;
use crate::color::Color;
use crate::error::{DispError, Result};
use crate::output::{OutputBuffer, RowWriter};
use crate::palette::ColorPairId;

/// Drawing surface used by the palette pool and the renderer.
pub trait Backend {
    /// Register `pair` as `fg` on `bg`. Both are base colors.
    ///
    /// # Errors
    ///
    /// [`DispError::BackendRejected`] if the backend cannot hold the pair.
    fn init_pair(&mut self, pair: ColorPairId, fg: Color, bg: Color) -> Result<()>;

    /// Paint `cells` left to right starting at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying writer.
    fn paint_row(&mut self, x: u16, y: u16, cells: &[PaintCell]) -> io::Result<()>;

    /// Move the hardware cursor.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying writer.
    fn move_cursor(&mut self, x: u16, y: u16) -> io::Result<()>;

    /// # Errors
    ///
    /// Propagates I/O errors from the underlying writer.
    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()>;

    /// # Errors
    ///
    /// Propagates I/O errors from the underlying writer.
    fn clear(&mut self) -> io::Result<()>;

    /// Push everything painted so far to the terminal.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying writer.
    fn flush(&mut self) -> io::Result<()>;

    /// Take over the display (alternate screen). Default: nothing to do.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying writer.
    fn enter(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Give the display back. Default: nothing to do.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying writer.
    fn leave(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── AnsiBackend ─────────────────────────────────────────────────────────────

/// `Backend` over any byte sink, speaking ANSI/VT100 escapes.
pub struct AnsiBackend<W: Write> {
    out: W,
    buf: OutputBuffer,
    writer: RowWriter,
    /// Pair id → colors. Index 0 stays `None` (terminal defaults).
    pairs: Vec<Option<(Color, Color)>>,
}

impl<W: Write> AnsiBackend<W> {
    /// Backend over `out` able to hold pair ids `1..pair_capacity`.
    #[must_use]
    pub fn new(out: W, pair_capacity: usize) -> Self {
        Self {
            out,
            buf: OutputBuffer::new(),
            writer: RowWriter::new(),
            pairs: vec![None; pair_capacity],
        }
    }

    /// Colors registered for `pair`, if any.
    #[must_use]
    pub fn pair(&self, pair: ColorPairId) -> Option<(Color, Color)> {
        self.pairs.get(pair.index()).copied().flatten()
    }

    /// The underlying writer (flushed bytes only).
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Backend for AnsiBackend<W> {
    fn init_pair(&mut self, pair: ColorPairId, fg: Color, bg: Color) -> Result<()> {
        let i = pair.index();
        if i == 0 {
            return Err(DispError::BackendRejected {
                pair,
                reason: "pair 0 is reserved",
            });
        }
        let Some(slot) = self.pairs.get_mut(i) else {
            return Err(DispError::BackendRejected {
                pair,
                reason: "pair slot out of range",
            });
        };
        *slot = Some((fg.base(), bg.base()));
        // Cells already on screen keep their old colors until repainted.
        self.writer.reset_state();
        Ok(())
    }

    fn paint_row(&mut self, x: u16, y: u16, cells: &[PaintCell]) -> io::Result<()> {
        let pairs = &self.pairs;
        self.writer.render_row(&mut self.buf, x, y, cells, |p| {
            pairs.get(p.index()).copied().flatten()
        })
    }

    fn move_cursor(&mut self, x: u16, y: u16) -> io::Result<()> {
        ansi::cursor_to(&mut self.buf, x, y)
    }

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
        if visible {
            ansi::cursor_show(&mut self.buf)
        } else {
            ansi::cursor_hide(&mut self.buf)
        }
    }

    fn clear(&mut self) -> io::Result<()> {
        ansi::reset(&mut self.buf)?;
        ansi::clear_screen(&mut self.buf)?;
        self.writer.reset_state();
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buf.flush_to(&mut self.out)
    }

    fn enter(&mut self) -> io::Result<()> {
        ansi::enter_alt_screen(&mut self.buf)?;
        self.clear()?;
        self.flush()
    }

    fn leave(&mut self) -> io::Result<()> {
        ansi::reset(&mut self.buf)?;
        ansi::cursor_show(&mut self.buf)?;
        ansi::exit_alt_screen(&mut self.buf)?;
        self.writer.reset_state();
        self.flush()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Attr;

    fn text(b: &AnsiBackend<Vec<u8>>) -> String {
        String::from_utf8(b.get_ref().clone()).unwrap()
    }

    #[test]
    fn init_pair_records_colors() {
        let mut b = AnsiBackend::new(Vec::new(), 4);
        b.init_pair(ColorPairId::new(3), Color::Cyan, Color::Black).unwrap();
        assert_eq!(b.pair(ColorPairId::new(3)), Some((Color::Cyan, Color::Black)));
        assert_eq!(b.pair(ColorPairId::new(2)), None);
    }

    #[test]
    fn init_pair_rejects_reserved_and_out_of_range() {
        let mut b = AnsiBackend::new(Vec::new(), 4);
        let err = b.init_pair(ColorPairId::new(0), Color::Red, Color::Black).unwrap_err();
        assert!(matches!(err, DispError::BackendRejected { .. }));
        let err = b.init_pair(ColorPairId::new(4), Color::Red, Color::Black).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn nothing_reaches_writer_before_flush() {
        let mut b = AnsiBackend::new(Vec::new(), 4);
        b.paint_row(0, 0, &[PaintCell::new(u32::from('x'), ColorPairId::NONE, Attr::empty())])
            .unwrap();
        assert!(b.get_ref().is_empty());
        b.flush().unwrap();
        assert_eq!(text(&b), "\x1b[1;1H\x1b[39;49mx");
    }

    #[test]
    fn paint_uses_registered_pair() {
        let mut b = AnsiBackend::new(Vec::new(), 4);
        b.init_pair(ColorPairId::new(1), Color::Brown, Color::Blue).unwrap();
        b.paint_row(
            4,
            2,
            &[PaintCell::new(u32::from('#'), ColorPairId::new(1), Attr::BOLD)],
        )
        .unwrap();
        b.flush().unwrap();
        assert_eq!(text(&b), "\x1b[3;5H\x1b[1m\x1b[33m\x1b[44m#");
    }

    #[test]
    fn cursor_commands() {
        let mut b = AnsiBackend::new(Vec::new(), 2);
        b.move_cursor(9, 0).unwrap();
        b.set_cursor_visible(false).unwrap();
        b.set_cursor_visible(true).unwrap();
        b.flush().unwrap();
        assert_eq!(text(&b), "\x1b[1;10H\x1b[?25l\x1b[?25h");
    }

    #[test]
    fn enter_and_leave_alt_screen() {
        let mut b = AnsiBackend::new(Vec::new(), 2);
        b.enter().unwrap();
        assert_eq!(text(&b), "\x1b[?1049h\x1b[0m\x1b[2J");
        b.leave().unwrap();
        assert!(text(&b).ends_with("\x1b[0m\x1b[?25h\x1b[?1049l"));
    }
}
