// SPDX-License-Identifier: MIT
//
// Font styles (what the editor asks for) and backend attributes (what the
// terminal can draw).
//
// The editor describes a palette entry with four style bits. The terminal
// backend renders three of them. Italic has no dependable SGR support on
// the consoles this driver targets, so it is accepted and rendered as
// normal text rather than rejected.

use bitflags::bitflags;

bitflags! {
    /// Style bits requested for a palette entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct FontStyle: u8 {
        const ITALIC    = 1 << 0;
        const BOLD      = 1 << 1;
        const UNDERLINE = 1 << 2;
        const REVERSE   = 1 << 3;
    }
}

bitflags! {
    /// Attribute bits the backend renders.
    ///
    /// ```
    /// use ww_disp::style::{Attr, FontStyle};
    ///
    /// let attr = Attr::from_font_style(FontStyle::ITALIC | FontStyle::BOLD);
    /// assert_eq!(attr, Attr::BOLD);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1.
        const BOLD      = 1 << 0;
        /// SGR 4.
        const UNDERLINE = 1 << 1;
        /// SGR 7.
        const REVERSE   = 1 << 2;
    }
}

impl Attr {
    /// Translate requested style bits into renderable attributes.
    ///
    /// `ITALIC` maps to nothing.
    #[must_use]
    pub const fn from_font_style(style: FontStyle) -> Self {
        let mut attr = Self::empty();
        if style.contains(FontStyle::BOLD) {
            attr = attr.union(Self::BOLD);
        }
        if style.contains(FontStyle::UNDERLINE) {
            attr = attr.union(Self::UNDERLINE);
        }
        if style.contains(FontStyle::REVERSE) {
            attr = attr.union(Self::REVERSE);
        }
        attr
    }
}
