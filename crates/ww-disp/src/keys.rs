// SPDX-License-Identifier: MIT
//
// Key identities and key events.
//
// The editor binds commands to PC keyboard scan codes plus a shift state,
// the way DOS programs did. Terminals don't send scan codes; they send
// characters and escape sequences. The catalog (see `catalog.rs`) maps
// those byte strings back onto this vocabulary.
//
// `KeyCode` values are the PC/AT set-1 scan codes, so `scan_code()` is the
// ordinal itself. `ShiftState` uses the Linux console modifier bit layout
// (`KG_SHIFT`, `KG_ALTGR`, `KG_CTRL`, `KG_ALT`), which is what the live
// console shift query reports, so the two can be OR-ed directly.

use std::fmt;

use bitflags::bitflags;

/// A key on the PC keyboard, numbered by scan code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum KeyCode {
    Esc = 0x01,
    Digit1 = 0x02,
    Digit2 = 0x03,
    Digit3 = 0x04,
    Digit4 = 0x05,
    Digit5 = 0x06,
    Digit6 = 0x07,
    Digit7 = 0x08,
    Digit8 = 0x09,
    Digit9 = 0x0A,
    Digit0 = 0x0B,
    Minus = 0x0C,
    Equal = 0x0D,
    Backspace = 0x0E,
    Tab = 0x0F,
    Q = 0x10,
    W = 0x11,
    E = 0x12,
    R = 0x13,
    T = 0x14,
    Y = 0x15,
    U = 0x16,
    I = 0x17,
    O = 0x18,
    P = 0x19,
    LBracket = 0x1A,
    RBracket = 0x1B,
    Enter = 0x1C,
    A = 0x1E,
    S = 0x1F,
    D = 0x20,
    F = 0x21,
    G = 0x22,
    H = 0x23,
    J = 0x24,
    K = 0x25,
    L = 0x26,
    Semicolon = 0x27,
    Quote = 0x28,
    Backtick = 0x29,
    Backslash = 0x2B,
    Z = 0x2C,
    X = 0x2D,
    C = 0x2E,
    V = 0x2F,
    B = 0x30,
    N = 0x31,
    M = 0x32,
    Comma = 0x33,
    Period = 0x34,
    Slash = 0x35,
    Space = 0x39,
    F1 = 0x3B,
    F2 = 0x3C,
    F3 = 0x3D,
    F4 = 0x3E,
    F5 = 0x3F,
    F6 = 0x40,
    F7 = 0x41,
    F8 = 0x42,
    F9 = 0x43,
    F10 = 0x44,
    Pause = 0x45,
    Home = 0x47,
    Up = 0x48,
    PageUp = 0x49,
    Left = 0x4B,
    Right = 0x4D,
    End = 0x4F,
    Down = 0x50,
    PageDown = 0x51,
    Insert = 0x52,
    Delete = 0x53,
    F11 = 0x57,
    F12 = 0x58,
    Macro = 0x6F,
}

/// Every key, in scan-code order.
const ALL: [KeyCode; 76] = {
    #[allow(clippy::enum_glob_use)]
    use KeyCode::*;
    [
        Esc, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9, Digit0,
        Minus, Equal, Backspace, Tab, Q, W, E, R, T, Y, U, I, O, P, LBracket, RBracket, Enter,
        A, S, D, F, G, H, J, K, L, Semicolon, Quote, Backtick, Backslash, Z, X, C, V, B, N, M,
        Comma, Period, Slash, Space, F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, Pause, Home, Up,
        PageUp, Left, Right, End, Down, PageDown, Insert, Delete, F11, F12, Macro,
    ]
};

impl KeyCode {
    /// The PC scan code of this key.
    #[inline]
    #[must_use]
    pub const fn scan_code(self) -> u8 {
        self as u8
    }

    /// The key with scan code `code`, if there is one.
    #[must_use]
    pub fn from_scan_code(code: u8) -> Option<Self> {
        ALL.iter().copied().find(|k| k.scan_code() == code)
    }

    /// Every key, in scan-code order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &ALL
    }

    /// Short display name as printed on the keycap.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Esc => "Esc",
            Self::Digit1 => "1",
            Self::Digit2 => "2",
            Self::Digit3 => "3",
            Self::Digit4 => "4",
            Self::Digit5 => "5",
            Self::Digit6 => "6",
            Self::Digit7 => "7",
            Self::Digit8 => "8",
            Self::Digit9 => "9",
            Self::Digit0 => "0",
            Self::Minus => "-",
            Self::Equal => "=",
            Self::Backspace => "BackSpace",
            Self::Tab => "Tab",
            Self::Q => "Q",
            Self::W => "W",
            Self::E => "E",
            Self::R => "R",
            Self::T => "T",
            Self::Y => "Y",
            Self::U => "U",
            Self::I => "I",
            Self::O => "O",
            Self::P => "P",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Enter => "Enter",
            Self::A => "A",
            Self::S => "S",
            Self::D => "D",
            Self::F => "F",
            Self::G => "G",
            Self::H => "H",
            Self::J => "J",
            Self::K => "K",
            Self::L => "L",
            Self::Semicolon => ";",
            Self::Quote => "'",
            Self::Backtick => "`",
            Self::Backslash => "\\",
            Self::Z => "Z",
            Self::X => "X",
            Self::C => "C",
            Self::V => "V",
            Self::B => "B",
            Self::N => "N",
            Self::M => "M",
            Self::Comma => ",",
            Self::Period => ".",
            Self::Slash => "/",
            Self::Space => "Space",
            Self::F1 => "F1",
            Self::F2 => "F2",
            Self::F3 => "F3",
            Self::F4 => "F4",
            Self::F5 => "F5",
            Self::F6 => "F6",
            Self::F7 => "F7",
            Self::F8 => "F8",
            Self::F9 => "F9",
            Self::F10 => "F10",
            Self::Pause => "Pause",
            Self::Home => "Home",
            Self::Up => "Up",
            Self::PageUp => "PgUp",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::End => "End",
            Self::Down => "Down",
            Self::PageDown => "PgDn",
            Self::Insert => "Ins",
            Self::Delete => "Del",
            Self::F11 => "F11",
            Self::F12 => "F12",
            Self::Macro => "Macro",
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Modifier keys held with a key, in Linux console bit order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct ShiftState: u8 {
        const SHIFT  = 1 << 0;
        const ALT_GR = 1 << 1;
        const CTRL   = 1 << 2;
        const ALT    = 1 << 3;
    }
}

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub shift: ShiftState,
    /// Scan code of `key`, kept alongside for bindings keyed on raw codes.
    pub scan_code: u8,
    /// The ASCII character the key produced, if it produced one.
    pub ch: Option<u8>,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(key: KeyCode, shift: ShiftState, ch: Option<u8>) -> Self {
        Self {
            key,
            shift,
            scan_code: key.scan_code(),
            ch,
        }
    }

    /// A bare key with no modifiers and no character.
    #[must_use]
    pub const fn plain(key: KeyCode) -> Self {
        Self::new(key, ShiftState::empty(), None)
    }
}

impl fmt::Display for KeyEvent {
    /// `Ctrl+Shift+Home`, `Alt+Q`, `F5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (ShiftState::CTRL, "Ctrl+"),
            (ShiftState::ALT, "Alt+"),
            (ShiftState::ALT_GR, "AltGr+"),
            (ShiftState::SHIFT, "Shift+"),
        ] {
            if self.shift.contains(flag) {
                f.write_str(name)?;
            }
        }
        f.write_str(self.key.name())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
