// SPDX-License-Identifier: MIT
//
// The 16 PC text-mode colors.
//
// The editor speaks in the classic DOS palette: eight base colors in PC
// order (black, blue, green, cyan, red, magenta, yellow, white) plus a
// bright variant of each. Terminals speak ANSI order (black, red, green,
// yellow, blue, magenta, cyan, white), so every color crossing into the
// backend goes through `ansi_index()`.
//
// Terminals addressed through color pairs only guarantee the eight base
// colors. Bright foregrounds are emulated by the palette pool as base
// color + bold, see `Color::base()`.

use std::fmt;

/// One of the 16 PC colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    LightMagenta = 13,
    Yellow = 14,
    White = 15,
}

/// PC color index → ANSI color index, for the eight base colors.
const PC_TO_ANSI: [u8; 8] = [
    0, // black
    4, // blue
    2, // green
    6, // cyan
    1, // red
    5, // magenta
    3, // yellow (brown)
    7, // white (light gray)
];

const ALL: [Color; 16] = [
    Color::Black,
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Red,
    Color::Magenta,
    Color::Brown,
    Color::LightGray,
    Color::DarkGray,
    Color::LightBlue,
    Color::LightGreen,
    Color::LightCyan,
    Color::LightRed,
    Color::LightMagenta,
    Color::Yellow,
    Color::White,
];

impl Color {
    /// Color for a PC index `0..=15`, `None` beyond that.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 16 {
            Some(ALL[index as usize])
        } else {
            None
        }
    }

    /// The platform color for a standard index.
    ///
    /// Terminals need no remapping for the standard colors, so this is the
    /// identity on `0..=15`.
    ///
    /// # Panics
    ///
    /// Panics if `index > 15`.
    #[must_use]
    pub fn standard(index: u8) -> Self {
        Self::from_index(index).unwrap_or_else(|| panic!("standard color index {index} > 15"))
    }

    /// PC index `0..=15`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Whether this is one of the eight bright colors (index >= 8).
    #[inline]
    #[must_use]
    pub const fn is_bright(self) -> bool {
        self.index() >= 8
    }

    /// Fold a bright color onto its base color (`index - 8`).
    #[inline]
    #[must_use]
    pub const fn base(self) -> Self {
        ALL[(self.index() & 7) as usize]
    }

    /// ANSI color index `0..=7` of the base color.
    ///
    /// This is the value used in SGR `30+n` / `40+n`.
    #[inline]
    #[must_use]
    pub const fn ansi_index(self) -> u8 {
        PC_TO_ANSI[(self.index() & 7) as usize]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_index_round_trips() {
        for i in 0..16 {
            assert_eq!(Color::from_index(i).unwrap().index(), i);
        }
        assert_eq!(Color::from_index(16), None);
    }

    #[test]
    fn standard_is_identity() {
        assert_eq!(Color::standard(0), Color::Black);
        assert_eq!(Color::standard(14), Color::Yellow);
    }

    #[test]
    #[should_panic(expected = "standard color index")]
    fn standard_out_of_range_panics() {
        let _ = Color::standard(16);
    }

    #[test]
    fn brightness() {
        assert!(!Color::LightGray.is_bright());
        assert!(Color::DarkGray.is_bright());
        assert!(Color::White.is_bright());
    }

    #[test]
    fn base_folds_bright() {
        assert_eq!(Color::Yellow.base(), Color::Brown);
        assert_eq!(Color::White.base(), Color::LightGray);
        assert_eq!(Color::DarkGray.base(), Color::Black);
        assert_eq!(Color::Blue.base(), Color::Blue);
    }

    #[test]
    fn pc_order_maps_to_ansi_order() {
        assert_eq!(Color::Black.ansi_index(), 0);
        assert_eq!(Color::Blue.ansi_index(), 4);
        assert_eq!(Color::Green.ansi_index(), 2);
        assert_eq!(Color::Cyan.ansi_index(), 6);
        assert_eq!(Color::Red.ansi_index(), 1);
        assert_eq!(Color::Magenta.ansi_index(), 5);
        assert_eq!(Color::Brown.ansi_index(), 3);
        assert_eq!(Color::LightGray.ansi_index(), 7);
    }

    #[test]
    fn bright_shares_base_ansi_index() {
        assert_eq!(Color::LightRed.ansi_index(), Color::Red.ansi_index());
    }
}
