// SPDX-License-Identifier: MIT
//
// Palette pool: bounded, deduplicated, reference-counted color state.
//
// Two fixed-size tables:
//
//   Color pairs: (foreground, background) combinations registered with
//   the backend. Slot 0 is reserved (backends treat pair 0 as "no
//   override") and is never handed out. A pair is shared: asking for an
//   existing combination bumps its reference count and returns the same
//   slot.
//
//   Palette: editor-level style handles. Each entry references one color
//   pair and carries renderable attribute bits. The editor stores the
//   entry's `PaletteId` in every screen cell and never sees the pair
//   directly.
//
// Both tables use a linear first-free-slot scan. Capacities are small
// (tens of entries), and which slot gets reused after a release is
// observable through exhaustion behavior, so the policy stays as simple
// and predictable as possible.
//
// Bright foregrounds: terminals addressed through color pairs only have
// the eight base colors. A foreground >= 8 is folded onto its base color
// with BOLD added, the classic 16-on-8 emulation.

use std::fmt;

use tracing::debug;

use crate::backend::Backend;
use crate::color::Color;
use crate::error::{DispError, Result};
use crate::style::{Attr, FontStyle};

// ─── Ids ─────────────────────────────────────────────────────────────────────

/// Index into the color-pair table. Also the id the backend knows it by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorPairId(u8);

impl ColorPairId {
    /// The reserved "no override" pair.
    pub const NONE: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ColorPairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a palette entry, stored in every screen cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaletteId(u16);

impl PaletteId {
    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PaletteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// One slot of the color-pair table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPairEntry {
    pub in_use: bool,
    pub foreground: Color,
    pub background: Color,
    /// Number of palette entries (or direct callers) holding this pair.
    pub ref_count: u32,
}

impl ColorPairEntry {
    const FREE: Self = Self {
        in_use: false,
        foreground: Color::Black,
        background: Color::Black,
        ref_count: 0,
    };
}

/// One slot of the palette table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub in_use: bool,
    pub pair: ColorPairId,
    /// Requested style after bright-color folding (may include ITALIC).
    pub style: FontStyle,
    /// What the backend will actually render.
    pub attrs: Attr,
}

impl PaletteEntry {
    const FREE: Self = Self {
        in_use: false,
        pair: ColorPairId::NONE,
        style: FontStyle::empty(),
        attrs: Attr::empty(),
    };
}

// ─── PalettePool ─────────────────────────────────────────────────────────────

/// Owner of the color-pair and palette tables.
///
/// # Example
///
/// ```
/// use ww_disp::backend::AnsiBackend;
/// use ww_disp::color::Color;
/// use ww_disp::palette::PalettePool;
/// use ww_disp::style::{Attr, FontStyle};
///
/// let mut backend = AnsiBackend::new(Vec::new(), 16);
/// let mut pool = PalettePool::new(16, 8);
///
/// let id = pool
///     .add_palette_entry(&mut backend, Color::Yellow, Color::Blue, FontStyle::empty())
///     .unwrap();
/// assert_eq!(pool.attrs(id), Attr::BOLD); // bright yellow = brown + bold
/// ```
#[derive(Debug, Clone)]
pub struct PalettePool {
    pairs: Vec<ColorPairEntry>,
    palette: Vec<PaletteEntry>,
}

impl PalettePool {
    /// Create empty tables.
    ///
    /// # Panics
    ///
    /// Panics if `color_pairs` is not in `2..=256` (slot 0 is reserved and
    /// ids are 8-bit) or `palette` is not in `1..=65535`.
    #[must_use]
    pub fn new(color_pairs: usize, palette: usize) -> Self {
        assert!(
            (2..=256).contains(&color_pairs),
            "color pair capacity {color_pairs} not in 2..=256"
        );
        assert!(
            (1..=usize::from(u16::MAX)).contains(&palette),
            "palette capacity {palette} not in 1..=65535"
        );
        Self {
            pairs: vec![ColorPairEntry::FREE; color_pairs],
            palette: vec![PaletteEntry::FREE; palette],
        }
    }

    /// Total color-pair slots, including the reserved slot 0.
    #[must_use]
    pub fn pair_capacity(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn palette_capacity(&self) -> usize {
        self.palette.len()
    }

    #[must_use]
    pub fn pairs_in_use(&self) -> usize {
        self.pairs.iter().filter(|p| p.in_use).count()
    }

    #[must_use]
    pub fn entries_in_use(&self) -> usize {
        self.palette.iter().filter(|p| p.in_use).count()
    }

    // ── Color pairs ──────────────────────────────────────────────────

    /// Find or create the color pair for `(fg, bg)`.
    ///
    /// An existing in-use pair gets its reference count bumped. Otherwise
    /// the first free slot from 1 up is registered with the backend.
    ///
    /// # Errors
    ///
    /// - [`DispError::ResourceExhausted`] if every slot is in use.
    /// - [`DispError::BackendRejected`] if the backend refuses the pair.
    ///
    /// Neither leaves partial state behind.
    ///
    /// # Panics
    ///
    /// Panics if either color is bright; pairs hold base colors only.
    pub fn add_color_pair(
        &mut self,
        backend: &mut impl Backend,
        fg: Color,
        bg: Color,
    ) -> Result<ColorPairId> {
        assert!(!fg.is_bright(), "color pair foreground {fg} is not a base color");
        assert!(!bg.is_bright(), "color pair background {bg} is not a base color");

        if let Some(i) = self
            .pairs
            .iter()
            .skip(1)
            .position(|p| p.in_use && p.foreground == fg && p.background == bg)
            .map(|i| i + 1)
        {
            self.pairs[i].ref_count += 1;
            return Ok(pair_id(i));
        }

        let Some(i) = self.pairs.iter().skip(1).position(|p| !p.in_use).map(|i| i + 1) else {
            return Err(DispError::ResourceExhausted);
        };

        let id = pair_id(i);
        backend.init_pair(id, fg, bg)?;

        self.pairs[i] = ColorPairEntry {
            in_use: true,
            foreground: fg,
            background: bg,
            ref_count: 1,
        };
        debug!(pair = i, ?fg, ?bg, "color pair allocated");
        Ok(id)
    }

    /// Drop one reference to a color pair, freeing the slot at zero.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the reserved pair, out of range, or not in use.
    pub fn release_color_pair(&mut self, id: ColorPairId) {
        let i = id.index();
        assert!(
            i != 0 && i < self.pairs.len() && self.pairs[i].in_use,
            "release of unallocated color pair {id}"
        );
        let entry = &mut self.pairs[i];
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            *entry = ColorPairEntry::FREE;
            debug!(pair = i, "color pair released");
        }
    }

    /// Read a color-pair slot.
    #[must_use]
    pub fn pair_entry(&self, id: ColorPairId) -> Option<&ColorPairEntry> {
        self.pairs.get(id.index())
    }

    // ── Palette entries ──────────────────────────────────────────────

    /// Create a palette entry for `fg` on `bg` with `style`.
    ///
    /// A bright foreground is folded onto its base color with BOLD added.
    /// A bright background has no emulation and is folded onto its base
    /// color as is.
    ///
    /// # Errors
    ///
    /// - [`DispError::ResourceExhausted`] / [`DispError::BackendRejected`]
    ///   from the color-pair step.
    /// - [`DispError::PaletteFull`] if no palette slot is free. The pair
    ///   reference taken for this call is given back first.
    pub fn add_palette_entry(
        &mut self,
        backend: &mut impl Backend,
        fg: Color,
        bg: Color,
        style: FontStyle,
    ) -> Result<PaletteId> {
        let mut style = style;
        let fg = if fg.is_bright() {
            style |= FontStyle::BOLD;
            fg.base()
        } else {
            fg
        };
        if bg.is_bright() {
            debug!(?bg, "bright background folded to base color");
        }
        let bg = bg.base();

        let pair = self.add_color_pair(backend, fg, bg)?;

        let Some(i) = self.palette.iter().position(|e| !e.in_use) else {
            self.release_color_pair(pair);
            return Err(DispError::PaletteFull);
        };

        self.palette[i] = PaletteEntry {
            in_use: true,
            pair,
            style,
            attrs: Attr::from_font_style(style),
        };
        Ok(palette_id(i))
    }

    /// Release a palette entry and its reference on the color pair.
    ///
    /// The pair slot is freed once no palette entry uses it.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range or not in use.
    pub fn free_palette_entry(&mut self, id: PaletteId) {
        let entry = *self.entry(id);
        self.palette[id.index()] = PaletteEntry::FREE;
        self.release_color_pair(entry.pair);
    }

    /// Bounds check only: `id` may or may not be in use.
    #[must_use]
    pub fn validate_palette_id(&self, id: PaletteId) -> bool {
        id.index() < self.palette.len()
    }

    /// The backend color pair for a palette entry.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range or not in use.
    #[must_use]
    pub fn color_pair(&self, id: PaletteId) -> ColorPairId {
        self.entry(id).pair
    }

    /// The renderable attributes for a palette entry.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range or not in use.
    #[must_use]
    pub fn attrs(&self, id: PaletteId) -> Attr {
        self.entry(id).attrs
    }

    /// Both halves of a palette lookup at once, as the renderer needs them.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range or not in use.
    #[must_use]
    pub fn resolve(&self, id: PaletteId) -> (ColorPairId, Attr) {
        let e = self.entry(id);
        (e.pair, e.attrs)
    }

    /// Read a palette slot.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range or not in use.
    #[must_use]
    pub fn entry(&self, id: PaletteId) -> &PaletteEntry {
        let entry = self
            .palette
            .get(id.index())
            .unwrap_or_else(|| panic!("palette id {id} out of range"));
        assert!(entry.in_use, "palette id {id} is not in use");
        entry
    }
}

#[allow(clippy::cast_possible_truncation)] // Pair table is at most 256 slots.
const fn pair_id(i: usize) -> ColorPairId {
    ColorPairId(i as u8)
}

#[allow(clippy::cast_possible_truncation)] // Palette table is at most 65535 slots.
const fn palette_id(i: usize) -> PaletteId {
    PaletteId(i as u16)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AnsiBackend;
    use pretty_assertions::assert_eq;

    fn backend() -> AnsiBackend<Vec<u8>> {
        AnsiBackend::new(Vec::new(), 256)
    }

    // ── Color pairs ─────────────────────────────────────────────────

    #[test]
    fn first_pair_uses_slot_one() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let id = pool.add_color_pair(&mut b, Color::LightGray, Color::Blue).unwrap();
        assert_eq!(id, ColorPairId::new(1));
        assert_eq!(b.pair(id), Some((Color::LightGray, Color::Blue)));
    }

    #[test]
    fn same_pair_is_deduplicated() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let a = pool.add_color_pair(&mut b, Color::Red, Color::Black).unwrap();
        let c = pool.add_color_pair(&mut b, Color::Red, Color::Black).unwrap();
        assert_eq!(a, c);
        assert_eq!(pool.pair_entry(a).unwrap().ref_count, 2);
        assert_eq!(pool.pairs_in_use(), 1);
    }

    #[test]
    fn ref_count_grows_by_one_per_request() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let id = pool.add_color_pair(&mut b, Color::Green, Color::Black).unwrap();
        for n in 2..=5 {
            assert_eq!(pool.add_color_pair(&mut b, Color::Green, Color::Black).unwrap(), id);
            assert_eq!(pool.pair_entry(id).unwrap().ref_count, n);
        }
    }

    #[test]
    fn distinct_pairs_take_successive_slots() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let a = pool.add_color_pair(&mut b, Color::Red, Color::Black).unwrap();
        let c = pool.add_color_pair(&mut b, Color::Black, Color::Red).unwrap();
        assert_eq!(a.index(), 1);
        assert_eq!(c.index(), 2);
    }

    #[test]
    fn exhaustion_leaves_prior_pairs_intact() {
        let mut b = backend();
        let mut pool = PalettePool::new(4, 8); // slots 1..=3 usable
        let ids: Vec<_> = [Color::Red, Color::Green, Color::Blue]
            .into_iter()
            .map(|fg| pool.add_color_pair(&mut b, fg, Color::Black).unwrap())
            .collect();

        let err = pool.add_color_pair(&mut b, Color::Cyan, Color::Black).unwrap_err();
        assert!(matches!(err, DispError::ResourceExhausted));

        for (id, fg) in ids.iter().zip([Color::Red, Color::Green, Color::Blue]) {
            let e = pool.pair_entry(*id).unwrap();
            assert!(e.in_use);
            assert_eq!(e.foreground, fg);
            assert_eq!(e.ref_count, 1);
        }
        assert_eq!(pool.pairs_in_use(), 3);
        // An existing pair is still reachable when the table is full.
        assert_eq!(pool.add_color_pair(&mut b, Color::Red, Color::Black).unwrap(), ids[0]);
    }

    #[test]
    fn backend_rejection_is_surfaced_without_state() {
        let mut b = AnsiBackend::new(Vec::new(), 2); // backend only knows pair 1
        let mut pool = PalettePool::new(8, 8);
        pool.add_color_pair(&mut b, Color::Red, Color::Black).unwrap();
        let err = pool.add_color_pair(&mut b, Color::Blue, Color::Black).unwrap_err();
        assert!(matches!(err, DispError::BackendRejected { .. }));
        assert_eq!(pool.pairs_in_use(), 1);
        assert!(!pool.pair_entry(ColorPairId::new(2)).unwrap().in_use);
    }

    #[test]
    fn release_frees_at_zero_and_slot_is_reused() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let a = pool.add_color_pair(&mut b, Color::Red, Color::Black).unwrap();
        let _ = pool.add_color_pair(&mut b, Color::Red, Color::Black).unwrap();
        let c = pool.add_color_pair(&mut b, Color::Green, Color::Black).unwrap();

        pool.release_color_pair(a);
        assert!(pool.pair_entry(a).unwrap().in_use);
        pool.release_color_pair(a);
        assert!(!pool.pair_entry(a).unwrap().in_use);

        // First free slot wins: slot 1 again, not slot 3.
        let d = pool.add_color_pair(&mut b, Color::Cyan, Color::Black).unwrap();
        assert_eq!(d, a);
        assert_eq!(c.index(), 2);
    }

    #[test]
    #[should_panic(expected = "not in 1..=65535")]
    fn palette_capacity_past_id_range_panics() {
        let _ = PalettePool::new(8, 65536);
    }

    #[test]
    #[should_panic(expected = "unallocated color pair")]
    fn release_reserved_pair_panics() {
        let mut pool = PalettePool::new(8, 8);
        pool.release_color_pair(ColorPairId::NONE);
    }

    #[test]
    #[should_panic(expected = "not a base color")]
    fn bright_pair_color_panics() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let _ = pool.add_color_pair(&mut b, Color::Yellow, Color::Black);
    }

    // ── Palette entries ─────────────────────────────────────────────

    #[test]
    fn palette_entry_resolves() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let id = pool
            .add_palette_entry(&mut b, Color::LightGray, Color::Blue, FontStyle::UNDERLINE)
            .unwrap();
        assert_eq!(id, PaletteId::new(0));
        assert_eq!(pool.resolve(id), (ColorPairId::new(1), Attr::UNDERLINE));
    }

    #[test]
    fn bright_foreground_folds_to_bold() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let bright = pool
            .add_palette_entry(&mut b, Color::White, Color::Blue, FontStyle::empty())
            .unwrap();
        let bolded = pool
            .add_palette_entry(&mut b, Color::LightGray, Color::Blue, FontStyle::BOLD)
            .unwrap();

        assert_ne!(bright, bolded);
        assert_eq!(pool.resolve(bright), pool.resolve(bolded));
        assert_eq!(pool.entry(bright).style, FontStyle::BOLD);
        assert_eq!(pool.pairs_in_use(), 1);
    }

    #[test]
    fn every_bright_color_normalizes() {
        let mut b = backend();
        let mut pool = PalettePool::new(64, 64);
        for i in 8..16 {
            let fg = Color::from_index(i).unwrap();
            let id = pool
                .add_palette_entry(&mut b, fg, Color::Black, FontStyle::UNDERLINE)
                .unwrap();
            let pair = pool.pair_entry(pool.color_pair(id)).unwrap();
            assert_eq!(pair.foreground.index(), i - 8);
            assert_eq!(pool.attrs(id), Attr::BOLD | Attr::UNDERLINE);
        }
    }

    #[test]
    fn bright_background_folds_without_bold() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let id = pool
            .add_palette_entry(&mut b, Color::Black, Color::LightCyan, FontStyle::empty())
            .unwrap();
        let pair = pool.pair_entry(pool.color_pair(id)).unwrap();
        assert_eq!(pair.background, Color::Cyan);
        assert_eq!(pool.attrs(id), Attr::empty());
    }

    #[test]
    fn italic_is_kept_but_not_rendered() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let id = pool
            .add_palette_entry(&mut b, Color::Green, Color::Black, FontStyle::ITALIC)
            .unwrap();
        assert_eq!(pool.entry(id).style, FontStyle::ITALIC);
        assert_eq!(pool.attrs(id), Attr::empty());
    }

    #[test]
    fn palette_full_returns_pair_reference() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 1);
        let first = pool
            .add_palette_entry(&mut b, Color::Red, Color::Black, FontStyle::empty())
            .unwrap();

        let err = pool
            .add_palette_entry(&mut b, Color::Red, Color::Black, FontStyle::BOLD)
            .unwrap_err();
        assert!(matches!(err, DispError::PaletteFull));
        assert_eq!(pool.pair_entry(pool.color_pair(first)).unwrap().ref_count, 1);

        let err = pool
            .add_palette_entry(&mut b, Color::Blue, Color::Black, FontStyle::empty())
            .unwrap_err();
        assert!(matches!(err, DispError::PaletteFull));
        assert_eq!(pool.pairs_in_use(), 1);
    }

    #[test]
    fn pair_exhaustion_propagates_from_palette_add() {
        let mut b = backend();
        let mut pool = PalettePool::new(2, 8);
        pool.add_palette_entry(&mut b, Color::Red, Color::Black, FontStyle::empty())
            .unwrap();
        let err = pool
            .add_palette_entry(&mut b, Color::Blue, Color::Black, FontStyle::empty())
            .unwrap_err();
        assert!(matches!(err, DispError::ResourceExhausted));
        assert_eq!(pool.entries_in_use(), 1);
    }

    #[test]
    fn free_releases_entry_and_unshared_pair() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let id = pool
            .add_palette_entry(&mut b, Color::Red, Color::Black, FontStyle::empty())
            .unwrap();
        let pair = pool.color_pair(id);

        pool.free_palette_entry(id);
        assert_eq!(pool.entries_in_use(), 0);
        assert!(!pool.pair_entry(pair).unwrap().in_use);
    }

    #[test]
    fn free_keeps_pair_shared_by_another_entry() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let plain = pool
            .add_palette_entry(&mut b, Color::Red, Color::Black, FontStyle::empty())
            .unwrap();
        let bold = pool
            .add_palette_entry(&mut b, Color::Red, Color::Black, FontStyle::BOLD)
            .unwrap();
        let pair = pool.color_pair(plain);
        assert_eq!(pool.color_pair(bold), pair);

        pool.free_palette_entry(plain);
        let e = pool.pair_entry(pair).unwrap();
        assert!(e.in_use);
        assert_eq!(e.ref_count, 1);
        assert_eq!(pool.attrs(bold), Attr::BOLD);

        pool.free_palette_entry(bold);
        assert!(!pool.pair_entry(pair).unwrap().in_use);
    }

    #[test]
    fn freed_slot_is_reused_first() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let a = pool
            .add_palette_entry(&mut b, Color::Red, Color::Black, FontStyle::empty())
            .unwrap();
        let _ = pool
            .add_palette_entry(&mut b, Color::Blue, Color::Black, FontStyle::empty())
            .unwrap();
        pool.free_palette_entry(a);
        let c = pool
            .add_palette_entry(&mut b, Color::Green, Color::Black, FontStyle::empty())
            .unwrap();
        assert_eq!(c, a);
    }

    #[test]
    #[should_panic(expected = "not in use")]
    fn double_free_panics() {
        let mut b = backend();
        let mut pool = PalettePool::new(8, 8);
        let id = pool
            .add_palette_entry(&mut b, Color::Red, Color::Black, FontStyle::empty())
            .unwrap();
        pool.free_palette_entry(id);
        pool.free_palette_entry(id);
    }

    #[test]
    fn validate_is_bounds_only() {
        let pool = PalettePool::new(8, 4);
        assert!(pool.validate_palette_id(PaletteId::new(0)));
        assert!(pool.validate_palette_id(PaletteId::new(3)));
        assert!(!pool.validate_palette_id(PaletteId::new(4)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn lookup_out_of_range_panics() {
        let pool = PalettePool::new(8, 4);
        let _ = pool.color_pair(PaletteId::new(9));
    }

    #[test]
    #[should_panic(expected = "not in use")]
    fn lookup_unused_panics() {
        let pool = PalettePool::new(8, 4);
        let _ = pool.attrs(PaletteId::new(1));
    }
}
