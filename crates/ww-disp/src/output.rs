// SPDX-License-Identifier: MIT
//
// Output buffering and stateful row rendering.
//
// Two components work together to minimize terminal I/O:
//
//   OutputBuffer: accumulates all ANSI bytes in memory so a whole paint
//   can be written in a single write() syscall.
//
//   RowWriter: tracks the color pair and attributes last sent to the
//   terminal and skips redundant SGR sequences. A row of text in a single
//   palette entry costs one cursor move, one SGR run and the glyphs.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::PaintCell;
use crate::color::Color;
use crate::palette::ColorPairId;
use crate::style::Attr;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates ANSI output for a single `write()` syscall.
///
/// Default capacity: 16 KB, enough for a full 80x25 repaint without
/// reallocation.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Write a Unicode codepoint as UTF-8.
    ///
    /// Invalid codepoints and control characters produce `?`; a raw control
    /// byte in the middle of a row would move the terminal's cursor.
    pub fn write_codepoint(&mut self, cp: u32) {
        match char::from_u32(cp) {
            Some(ch) if !ch.is_control() => {
                let mut enc = [0u8; 4];
                let s = ch.encode_utf8(&mut enc);
                self.buf.extend_from_slice(s.as_bytes());
            }
            _ => self.buf.push(b'?'),
        }
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to an arbitrary writer and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No-op; real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RowWriter ───────────────────────────────────────────────────────────────

/// Stateful row renderer that tracks terminal state to skip redundant escapes.
///
/// - **Cursor**: one CUP per row; glyphs auto-advance.
/// - **Attributes**: on change, reset (SGR 0) + re-emit. This invalidates
///   the tracked pair, forcing the colors out again. Going from no
///   attributes to some skips the reset.
/// - **Colors**: emitted when the pair differs from the last one sent.
///   Pair 0 (and any pair the backend doesn't know) means default colors.
#[allow(clippy::struct_field_names)] // The `last_` prefix IS the semantic grouping.
pub struct RowWriter {
    last_pair: Option<ColorPairId>,
    last_attrs: Attr,
}

impl RowWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_pair: None,
            last_attrs: Attr::empty(),
        }
    }

    /// Forget tracked state. Call after a terminal reset or screen clear.
    #[allow(clippy::missing_const_for_fn)] // *self = Self::new() isn't const-evaluable.
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    /// Render a run of cells starting at `(x, y)`.
    ///
    /// `colors` maps a pair id to its (foreground, background); `None`
    /// means terminal defaults.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `out`.
    pub fn render_row<F>(
        &mut self,
        out: &mut OutputBuffer,
        x: u16,
        y: u16,
        cells: &[PaintCell],
        colors: F,
    ) -> io::Result<()>
    where
        F: Fn(ColorPairId) -> Option<(Color, Color)>,
    {
        ansi::cursor_to(out, x, y)?;
        for cell in cells {
            self.apply_style(out, cell, &colors)?;
            out.write_codepoint(cell.glyph);
        }
        Ok(())
    }

    fn apply_style<F>(&mut self, out: &mut OutputBuffer, cell: &PaintCell, colors: &F) -> io::Result<()>
    where
        F: Fn(ColorPairId) -> Option<(Color, Color)>,
    {
        if cell.attrs != self.last_attrs {
            if !self.last_attrs.is_empty() {
                // SGR 0 clears colors too.
                ansi::reset(out)?;
                self.last_pair = None;
            }
            self.last_attrs = cell.attrs;
            ansi::attrs(out, cell.attrs)?;
        }

        if self.last_pair != Some(cell.pair) {
            match colors(cell.pair) {
                Some((fg, bg)) => {
                    ansi::fg(out, fg)?;
                    ansi::bg(out, bg)?;
                }
                None => ansi::default_colors(out)?,
            }
            self.last_pair = Some(cell.pair);
        }
        Ok(())
    }
}

impl Default for RowWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── OutputBuffer ────────────────────────────────────────────────────

    #[test]
    fn output_buffer_write_trait() {
        let mut buf = OutputBuffer::new();
        write!(buf, "hello {}", 42).unwrap();
        assert_eq!(buf.as_bytes(), b"hello 42");
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn write_codepoint_unicode() {
        let mut buf = OutputBuffer::new();
        buf.write_codepoint(u32::from('A'));
        buf.write_codepoint(u32::from('é'));
        assert_eq!(buf.as_bytes(), "Aé".as_bytes());
    }

    #[test]
    fn write_codepoint_invalid_and_control() {
        let mut buf = OutputBuffer::new();
        buf.write_codepoint(0xD800);
        buf.write_codepoint(0x1B);
        buf.write_codepoint(0);
        assert_eq!(buf.as_bytes(), b"???");
    }

    #[test]
    fn flush_to_drains() {
        let mut buf = OutputBuffer::new();
        write!(buf, "frame data").unwrap();
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert_eq!(dest, b"frame data");
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_to_empty_is_noop() {
        let mut buf = OutputBuffer::new();
        let mut dest = Vec::new();
        buf.flush_to(&mut dest).unwrap();
        assert!(dest.is_empty());
    }

    // ── RowWriter ───────────────────────────────────────────────────────

    fn colors(pair: ColorPairId) -> Option<(Color, Color)> {
        match pair.index() {
            1 => Some((Color::LightGray, Color::Blue)),
            2 => Some((Color::Red, Color::Black)),
            _ => None,
        }
    }

    fn cell(ch: char, pair: u8, attrs: Attr) -> PaintCell {
        PaintCell::new(u32::from(ch), ColorPairId::new(pair), attrs)
    }

    fn render(rows: &[(u16, u16, Vec<PaintCell>)]) -> String {
        let mut out = OutputBuffer::new();
        let mut writer = RowWriter::new();
        for (x, y, cells) in rows {
            writer.render_row(&mut out, *x, *y, cells, colors).unwrap();
        }
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn row_is_one_cursor_move_and_one_color_run() {
        let row = vec![
            cell('a', 1, Attr::empty()),
            cell('b', 1, Attr::empty()),
            cell('c', 1, Attr::empty()),
        ];
        assert_eq!(render(&[(2, 1, row)]), "\x1b[2;3H\x1b[37m\x1b[44mabc");
    }

    #[test]
    fn pair_change_mid_row() {
        let row = vec![cell('a', 1, Attr::empty()), cell('b', 2, Attr::empty())];
        assert_eq!(
            render(&[(0, 0, row)]),
            "\x1b[1;1H\x1b[37m\x1b[44ma\x1b[31m\x1b[40mb"
        );
    }

    #[test]
    fn unknown_pair_uses_default_colors() {
        let row = vec![cell('x', 0, Attr::empty())];
        assert_eq!(render(&[(0, 0, row)]), "\x1b[1;1H\x1b[39;49mx");
    }

    #[test]
    fn state_carries_across_rows() {
        let out = render(&[
            (0, 0, vec![cell('a', 1, Attr::empty())]),
            (0, 1, vec![cell('b', 1, Attr::empty())]),
        ]);
        assert_eq!(out.matches("\x1b[44m").count(), 1);
        assert_eq!(out.matches('H').count(), 2);
    }

    #[test]
    fn attr_change_resets_and_re_emits_colors() {
        let row = vec![cell('a', 1, Attr::BOLD), cell('b', 1, Attr::empty())];
        let out = render(&[(0, 0, row)]);
        assert_eq!(
            out,
            "\x1b[1;1H\x1b[1m\x1b[37m\x1b[44ma\x1b[0m\x1b[37m\x1b[44mb"
        );
    }

    #[test]
    fn none_to_attr_skips_reset() {
        let row = vec![cell('a', 1, Attr::empty()), cell('b', 1, Attr::REVERSE)];
        let out = render(&[(0, 0, row)]);
        assert!(!out.contains("\x1b[0m"));
        assert!(out.ends_with("\x1b[7mb"));
    }

    #[test]
    fn reset_state_forces_colors_again() {
        let mut out = OutputBuffer::new();
        let mut writer = RowWriter::new();
        let row = [cell('a', 2, Attr::empty())];
        writer.render_row(&mut out, 0, 0, &row, colors).unwrap();
        writer.reset_state();
        writer.render_row(&mut out, 0, 0, &row, colors).unwrap();
        let s = String::from_utf8(out.as_bytes().to_vec()).unwrap();
        assert_eq!(s.matches("\x1b[31m").count(), 2);
    }
}
