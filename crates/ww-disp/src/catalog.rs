// SPDX-License-Identifier: MIT
//
// The key-sequence catalog and its matcher.
//
// Terminals report keys as byte strings: a printable character, a control
// byte, or an escape sequence. The catalog is an ordered list of rules
// mapping those strings to a key and shift state. Matching walks the list
// in order and stops at the first rule the pending bytes are a prefix of:
//
//   bytes == rule pattern      → Complete (the key)
//   bytes a strict prefix      → Partial  (read more)
//   no rule has bytes as prefix → None     (drop them)
//
// Order matters. Moving a rule can change which key a sequence decodes
// to, so the table below keeps its historical order.
//
// The base table is immutable. Rules carrying a terminfo capability name
// can have their pattern replaced by what the running terminal reports;
// those replacements live in a separate override map filled once at init.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::caps::CapabilitySource;
use crate::keys::{KeyCode, KeyEvent, ShiftState};
use crate::pump::KEY_BUFFER_LEN;

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRule {
    /// Bytes the terminal sends.
    pub pattern: &'static [u8],
    pub key: KeyCode,
    /// Modifiers implied by the pattern itself.
    pub shift: ShiftState,
    /// ASCII value delivered with the key, for keys that produce text.
    pub ch: Option<u8>,
    /// terminfo name whose string may replace `pattern`.
    pub capability: Option<&'static str>,
}

/// Result of matching pending bytes against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    None,
    Partial,
    Complete(KeyEvent),
}

// ─── Base table ──────────────────────────────────────────────────────────────

const NONE: ShiftState = ShiftState::empty();
const SHIFT: ShiftState = ShiftState::SHIFT;
const CTRL: ShiftState = ShiftState::CTRL;
const ALT: ShiftState = ShiftState::ALT;
const CTRL_SHIFT: ShiftState = ShiftState::CTRL.union(ShiftState::SHIFT);
const ALT_SHIFT: ShiftState = ShiftState::ALT.union(ShiftState::SHIFT);

/// A key that produces a character.
const fn ch(pattern: &'static [u8], key: KeyCode, shift: ShiftState, c: u8) -> KeyRule {
    KeyRule {
        pattern,
        key,
        shift,
        ch: Some(c),
        capability: None,
    }
}

/// A key that produces no character.
const fn k(pattern: &'static [u8], key: KeyCode, shift: ShiftState) -> KeyRule {
    KeyRule {
        pattern,
        key,
        shift,
        ch: None,
        capability: None,
    }
}

/// A key whose pattern terminfo may override.
const fn cap(pattern: &'static [u8], key: KeyCode, shift: ShiftState, name: &'static str) -> KeyRule {
    KeyRule {
        pattern,
        key,
        shift,
        ch: None,
        capability: Some(name),
    }
}

use KeyCode as K;

#[rustfmt::skip]
static BASE: &[KeyRule] = &[
    // Printable characters, each followed by its Alt forms: ESC prefix,
    // then the high-bit meta byte xterm sends with eightBitInput.
    ch(b"~", K::Backtick, NONE, b'~'),
    ch(b"`", K::Backtick, SHIFT, b'`'),
    ch(b"1", K::Digit1, NONE, b'1'),
    ch(b"!", K::Digit1, SHIFT, b'!'),
    k(b"\x1b1", K::Digit1, ALT),
    k(b"\xb1", K::Digit1, ALT),
    ch(b"2", K::Digit2, NONE, b'2'),
    ch(b"@", K::Digit2, SHIFT, b'@'),
    k(b"\x1b2", K::Digit2, ALT),
    k(b"\xb2", K::Digit2, ALT),
    ch(b"3", K::Digit3, NONE, b'3'),
    ch(b"#", K::Digit3, SHIFT, b'#'),
    k(b"\x1b3", K::Digit3, ALT),
    k(b"\xb3", K::Digit3, ALT),
    ch(b"4", K::Digit4, NONE, b'4'),
    ch(b"$", K::Digit4, SHIFT, b'$'),
    k(b"\x1b4", K::Digit4, ALT),
    k(b"\xb4", K::Digit4, ALT),
    ch(b"5", K::Digit5, NONE, b'5'),
    ch(b"%", K::Digit5, SHIFT, b'%'),
    k(b"\x1b5", K::Digit5, ALT),
    k(b"\xb5", K::Digit5, ALT),
    ch(b"6", K::Digit6, NONE, b'6'),
    ch(b"^", K::Digit6, SHIFT, b'^'),
    k(b"\x1b6", K::Digit6, ALT),
    k(b"\xb6", K::Digit6, ALT),
    ch(b"7", K::Digit7, NONE, b'7'),
    ch(b"&", K::Digit7, SHIFT, b'&'),
    k(b"\x1b7", K::Digit7, ALT),
    k(b"\xb7", K::Digit7, ALT),
    ch(b"8", K::Digit8, NONE, b'8'),
    ch(b"*", K::Digit8, SHIFT, b'*'),
    k(b"\x1b8", K::Digit8, ALT),
    k(b"\xb8", K::Digit8, ALT),
    ch(b"9", K::Digit9, NONE, b'9'),
    ch(b"(", K::Digit9, SHIFT, b'('),
    k(b"\x1b9", K::Digit9, ALT),
    k(b"\xb9", K::Digit9, ALT),
    ch(b"0", K::Digit0, NONE, b'0'),
    ch(b")", K::Digit0, SHIFT, b')'),
    k(b"\x1b0", K::Digit0, ALT),
    k(b"\xb0", K::Digit0, ALT),
    ch(b"-", K::Minus, NONE, b'-'),
    ch(b"_", K::Minus, SHIFT, b'_'),
    k(b"\x1b-", K::Minus, ALT),
    k(b"\xad", K::Minus, ALT),
    ch(b"=", K::Equal, NONE, b'='),
    ch(b"+", K::Equal, SHIFT, b'+'),
    k(b"\x1b=", K::Equal, ALT),
    k(b"\xbd", K::Equal, ALT),
    cap(b"\x7f", K::Backspace, NONE, "kbs"),
    k(b"\x1b\x7f", K::Backspace, ALT),
    k(b"\x88", K::Backspace, ALT),
    k(b"\x09", K::Tab, NONE),
    ch(b"q", K::Q, NONE, b'q'),
    ch(b"Q", K::Q, SHIFT, b'Q'),
    k(b"\x1bq", K::Q, ALT),
    k(b"\xf1", K::Q, ALT),
    ch(b"w", K::W, NONE, b'w'),
    ch(b"W", K::W, SHIFT, b'W'),
    k(b"\x1bw", K::W, ALT),
    k(b"\xf7", K::W, ALT),
    ch(b"e", K::E, NONE, b'e'),
    ch(b"E", K::E, SHIFT, b'E'),
    k(b"\x1be", K::E, ALT),
    k(b"\xe5", K::E, ALT),
    ch(b"r", K::R, NONE, b'r'),
    ch(b"R", K::R, SHIFT, b'R'),
    k(b"\x1br", K::R, ALT),
    k(b"\xf2", K::R, ALT),
    ch(b"t", K::T, NONE, b't'),
    ch(b"T", K::T, SHIFT, b'T'),
    k(b"\x1bt", K::T, ALT),
    k(b"\xf4", K::T, ALT),
    ch(b"y", K::Y, NONE, b'y'),
    ch(b"Y", K::Y, SHIFT, b'Y'),
    k(b"\x1by", K::Y, ALT),
    k(b"\xf9", K::Y, ALT),
    ch(b"u", K::U, NONE, b'u'),
    ch(b"U", K::U, SHIFT, b'U'),
    k(b"\x1bu", K::U, ALT),
    k(b"\xf5", K::U, ALT),
    ch(b"i", K::I, NONE, b'i'),
    ch(b"I", K::I, SHIFT, b'I'),
    k(b"\x1bi", K::I, ALT),
    k(b"\xe9", K::I, ALT),
    ch(b"o", K::O, NONE, b'o'),
    ch(b"O", K::O, SHIFT, b'O'),
    k(b"\x1bo", K::O, ALT),
    k(b"\xef", K::O, ALT),
    ch(b"p", K::P, NONE, b'p'),
    ch(b"P", K::P, SHIFT, b'P'),
    k(b"\x1bp", K::P, ALT),
    k(b"\xf0", K::P, ALT),
    ch(b"[", K::LBracket, NONE, b'['),
    ch(b"{", K::LBracket, SHIFT, b'{'),
    k(b"\xdb", K::LBracket, ALT),
    ch(b"]", K::RBracket, NONE, b']'),
    ch(b"}", K::RBracket, SHIFT, b'}'),
    k(b"\x1b]", K::RBracket, ALT),
    k(b"\xdd", K::RBracket, ALT),
    k(b"\x0d", K::Enter, NONE),
    k(b"\x1b\x0d", K::Enter, ALT),
    k(b"\x8d", K::Enter, ALT),
    ch(b"a", K::A, NONE, b'a'),
    ch(b"A", K::A, SHIFT, b'A'),
    k(b"\x1ba", K::A, ALT),
    k(b"\xe1", K::A, ALT),
    ch(b"s", K::S, NONE, b's'),
    ch(b"S", K::S, SHIFT, b'S'),
    k(b"\x1bs", K::S, ALT),
    k(b"\xf3", K::S, ALT),
    ch(b"d", K::D, NONE, b'd'),
    ch(b"D", K::D, SHIFT, b'D'),
    k(b"\x1bd", K::D, ALT),
    k(b"\xe4", K::D, ALT),
    ch(b"f", K::F, NONE, b'f'),
    ch(b"F", K::F, SHIFT, b'F'),
    k(b"\x1bf", K::F, ALT),
    k(b"\xe6", K::F, ALT),
    ch(b"g", K::G, NONE, b'g'),
    ch(b"G", K::G, SHIFT, b'G'),
    k(b"\x1bg", K::G, ALT),
    k(b"\xe7", K::G, ALT),
    ch(b"h", K::H, NONE, b'h'),
    ch(b"H", K::H, SHIFT, b'H'),
    k(b"\x1bh", K::H, ALT),
    k(b"\xe8", K::H, ALT),
    ch(b"j", K::J, NONE, b'j'),
    ch(b"J", K::J, SHIFT, b'J'),
    k(b"\x1bj", K::J, ALT),
    k(b"\xea", K::J, ALT),
    ch(b"k", K::K, NONE, b'k'),
    ch(b"K", K::K, SHIFT, b'K'),
    k(b"\x1bk", K::K, ALT),
    k(b"\xeb", K::K, ALT),
    ch(b"l", K::L, NONE, b'l'),
    ch(b"L", K::L, SHIFT, b'L'),
    k(b"\x1bl", K::L, ALT),
    k(b"\xec", K::L, ALT),
    ch(b";", K::Semicolon, NONE, b';'),
    ch(b":", K::Semicolon, SHIFT, b':'),
    k(b"\x1b;", K::Semicolon, ALT),
    k(b"\xbb", K::Semicolon, ALT),
    ch(b"\"", K::Quote, NONE, b'"'),
    ch(b"'", K::Quote, SHIFT, b'\''),
    k(b"\x1b'", K::Quote, ALT),
    k(b"\xa7", K::Quote, ALT),
    ch(b"\\", K::Backslash, NONE, b'\\'),
    ch(b"|", K::Backslash, SHIFT, b'|'),
    k(b"\x1b\\", K::Backslash, ALT),
    k(b"\xdc", K::Backslash, ALT),
    ch(b"z", K::Z, NONE, b'z'),
    ch(b"Z", K::Z, SHIFT, b'Z'),
    k(b"\x1bz", K::Z, ALT),
    k(b"\xfa", K::Z, ALT),
    ch(b"x", K::X, NONE, b'x'),
    ch(b"X", K::X, SHIFT, b'X'),
    k(b"\x1bx", K::X, ALT),
    k(b"\xf8", K::X, ALT),
    ch(b"c", K::C, NONE, b'c'),
    ch(b"C", K::C, SHIFT, b'C'),
    k(b"\x1bc", K::C, ALT),
    k(b"\xe3", K::C, ALT),
    ch(b"v", K::V, NONE, b'v'),
    ch(b"V", K::V, SHIFT, b'V'),
    k(b"\x1bv", K::V, ALT),
    k(b"\xf6", K::V, ALT),
    ch(b"b", K::B, NONE, b'b'),
    ch(b"B", K::B, SHIFT, b'B'),
    k(b"\x1bb", K::B, ALT),
    k(b"\xe2", K::B, ALT),
    ch(b"n", K::N, NONE, b'n'),
    ch(b"N", K::N, SHIFT, b'N'),
    k(b"\x1bn", K::N, ALT),
    k(b"\xee", K::N, ALT),
    ch(b"m", K::M, NONE, b'm'),
    ch(b"M", K::M, SHIFT, b'M'),
    k(b"\x1bm", K::M, ALT),
    k(b"\xed", K::M, ALT),
    ch(b",", K::Comma, NONE, b','),
    ch(b"<", K::Comma, SHIFT, b'<'),
    k(b"\x1b,", K::Comma, ALT),
    k(b"\xac", K::Comma, ALT),
    ch(b".", K::Period, NONE, b'.'),
    ch(b">", K::Period, SHIFT, b'>'),
    k(b"\x1b.", K::Period, ALT),
    k(b"\xae", K::Period, ALT),
    ch(b"/", K::Slash, NONE, b'/'),
    ch(b"?", K::Slash, SHIFT, b'?'),
    k(b"\x1b/", K::Slash, ALT),
    k(b"\xaf", K::Slash, ALT),
    ch(b" ", K::Space, NONE, b' '),
    k(b"\x1b ", K::Space, ALT),
    k(b"\xa0", K::Space, ALT),

    // linux console F1-F4
    k(b"\x1b[11~", K::F1, NONE),
    k(b"\x1b[12~", K::F2, NONE),
    k(b"\x1b[13~", K::F3, NONE),
    k(b"\x1b[14~", K::F4, NONE),

    // Function and editing keys. Entries with a capability name are
    // replaced by the terminal's own sequence at init; the bare
    // duplicates keep the common encoding reachable (putty, Macro, Pause).
    cap(b"\x1b[[A", K::F1, NONE, "kf1"),
    cap(b"\x1b[[B", K::F2, NONE, "kf2"),
    cap(b"\x1b[[C", K::F3, NONE, "kf3"),
    cap(b"\x1b[[D", K::F4, NONE, "kf4"),
    cap(b"\x1b[[E", K::F5, NONE, "kf5"),
    cap(b"\x1b[17~", K::F6, NONE, "kf6"),
    cap(b"\x1b[18~", K::F7, NONE, "kf7"),
    cap(b"\x1b[19~", K::F8, NONE, "kf8"),
    cap(b"\x1b[20~", K::F9, NONE, "kf9"),
    cap(b"\x1b[21~", K::F10, NONE, "kf10"),
    cap(b"\x1b[23~", K::F11, NONE, "kf11"),
    cap(b"\x1b[24~", K::F12, NONE, "kf12"),
    cap(b"\x1b[1~", K::Home, NONE, "khome"),
    k(b"\x1b[1~", K::Home, NONE),
    cap(b"\x1b[2~", K::Insert, NONE, "kich1"),
    cap(b"\x1b[3~", K::Delete, NONE, "kdch1"),
    cap(b"\x1b[4~", K::End, NONE, "kend"),
    k(b"\x1b[4~", K::End, NONE),
    cap(b"\x1b[5~", K::PageUp, NONE, "kpp"),
    cap(b"\x1b[6~", K::PageDown, NONE, "knp"),
    k(b"\x1b[M", K::Macro, NONE),
    k(b"\x1b[P", K::Pause, NONE),

    // Cursor keys as terminfo names them.
    cap(b"\x1b[A", K::Up, NONE, "kcuu1"),
    cap(b"\x1b[B", K::Down, NONE, "kcud1"),
    cap(b"\x1b[D", K::Left, NONE, "kcub1"),
    cap(b"\x1b[C", K::Right, NONE, "kcuf1"),

    // Cursor keys in xterm normal mode. terminfo usually reports the
    // application-mode form, so these stay hard coded.
    k(b"\x1b[A", K::Up, NONE),
    k(b"\x1b[B", K::Down, NONE),
    k(b"\x1b[D", K::Left, NONE),
    k(b"\x1b[C", K::Right, NONE),
    k(b"\x1b[H", K::Home, NONE),
    k(b"\x1b[F", K::End, NONE),

    // xterm modified keys, CSI 1;<m>: 2 = Shift, 3 = Alt,
    // 4 = Alt+Shift, 5 = Ctrl, 6 = Ctrl+Shift.
    k(b"\x1b[1;5H", K::Home, CTRL),
    k(b"\x1b[1;5F", K::End, CTRL),
    k(b"\x1b[5;5~", K::PageUp, CTRL),
    k(b"\x1b[6;5~", K::PageDown, CTRL),

    k(b"\x1b[1;2H", K::Home, SHIFT),
    k(b"\x1b[1;2F", K::End, SHIFT),
    k(b"\x1b[5;2~", K::PageUp, SHIFT),
    k(b"\x1b[6;2~", K::PageDown, SHIFT),

    k(b"\x1b[1;6H", K::Home, CTRL_SHIFT),
    k(b"\x1b[1;6F", K::End, CTRL_SHIFT),
    k(b"\x1b[5;6~", K::PageUp, CTRL_SHIFT),
    k(b"\x1b[6;6~", K::PageDown, CTRL_SHIFT),

    k(b"\x1b[1;2A", K::Up, SHIFT),
    k(b"\x1b[1;2B", K::Down, SHIFT),
    k(b"\x1b[1;2D", K::Left, SHIFT),
    k(b"\x1b[1;2C", K::Right, SHIFT),

    k(b"\x1b[1;5A", K::Up, CTRL),
    k(b"\x1b[1;5B", K::Down, CTRL),
    k(b"\x1b[1;5D", K::Left, CTRL),
    k(b"\x1b[1;5C", K::Right, CTRL),

    k(b"\x1b[1;6A", K::Up, CTRL_SHIFT),
    k(b"\x1b[1;6B", K::Down, CTRL_SHIFT),
    k(b"\x1b[1;6D", K::Left, CTRL_SHIFT),
    k(b"\x1b[1;6C", K::Right, CTRL_SHIFT),

    // xterm modified F1-F4 (SS3) and F5-F12 (CSI).
    k(b"\x1bO2P", K::F1, SHIFT),
    k(b"\x1bO5P", K::F1, CTRL),
    k(b"\x1bO3P", K::F1, ALT),
    k(b"\x1bO6P", K::F1, CTRL_SHIFT),
    k(b"\x1bO4P", K::F1, ALT_SHIFT),
    k(b"\x1bO2Q", K::F2, SHIFT),
    k(b"\x1bO5Q", K::F2, CTRL),
    k(b"\x1bO3Q", K::F2, ALT),
    k(b"\x1bO6Q", K::F2, CTRL_SHIFT),
    k(b"\x1bO4Q", K::F2, ALT_SHIFT),
    k(b"\x1bO2R", K::F3, SHIFT),
    k(b"\x1bO5R", K::F3, CTRL),
    k(b"\x1bO3R", K::F3, ALT),
    k(b"\x1bO6R", K::F3, CTRL_SHIFT),
    k(b"\x1bO4R", K::F3, ALT_SHIFT),
    k(b"\x1bO2S", K::F4, SHIFT),
    k(b"\x1bO5S", K::F4, CTRL),
    k(b"\x1bO3S", K::F4, ALT),
    k(b"\x1bO6S", K::F4, CTRL_SHIFT),
    k(b"\x1bO4S", K::F4, ALT_SHIFT),
    k(b"\x1b[15;2~", K::F5, SHIFT),
    k(b"\x1b[15;5~", K::F5, CTRL),
    k(b"\x1b[15;3~", K::F5, ALT),
    k(b"\x1b[15;6~", K::F5, CTRL_SHIFT),
    k(b"\x1b[15;4~", K::F5, ALT_SHIFT),
    k(b"\x1b[17;2~", K::F6, SHIFT),
    k(b"\x1b[17;5~", K::F6, CTRL),
    k(b"\x1b[17;3~", K::F6, ALT),
    k(b"\x1b[17;6~", K::F6, CTRL_SHIFT),
    k(b"\x1b[17;4~", K::F6, ALT_SHIFT),
    k(b"\x1b[18;2~", K::F7, SHIFT),
    k(b"\x1b[18;5~", K::F7, CTRL),
    k(b"\x1b[18;3~", K::F7, ALT),
    k(b"\x1b[18;6~", K::F7, CTRL_SHIFT),
    k(b"\x1b[18;4~", K::F7, ALT_SHIFT),
    k(b"\x1b[19;2~", K::F8, SHIFT),
    k(b"\x1b[19;5~", K::F8, CTRL),
    k(b"\x1b[19;3~", K::F8, ALT),
    k(b"\x1b[19;6~", K::F8, CTRL_SHIFT),
    k(b"\x1b[19;4~", K::F8, ALT_SHIFT),
    k(b"\x1b[10;2~", K::F9, SHIFT),
    k(b"\x1b[10;5~", K::F9, CTRL),
    k(b"\x1b[10;3~", K::F9, ALT),
    k(b"\x1b[10;6~", K::F9, CTRL_SHIFT),
    k(b"\x1b[10;4~", K::F9, ALT_SHIFT),
    k(b"\x1b[11;2~", K::F10, SHIFT),
    k(b"\x1b[11;5~", K::F10, CTRL),
    k(b"\x1b[11;3~", K::F10, ALT),
    k(b"\x1b[11;6~", K::F10, CTRL_SHIFT),
    k(b"\x1b[11;4~", K::F10, ALT_SHIFT),
    k(b"\x1b[13;2~", K::F11, SHIFT),
    k(b"\x1b[13;5~", K::F11, CTRL),
    k(b"\x1b[13;3~", K::F11, ALT),
    k(b"\x1b[13;6~", K::F11, CTRL_SHIFT),
    k(b"\x1b[13;4~", K::F11, ALT_SHIFT),
    k(b"\x1b[14;2~", K::F12, SHIFT),
    k(b"\x1b[14;5~", K::F12, CTRL),
    k(b"\x1b[14;3~", K::F12, ALT),
    k(b"\x1b[14;6~", K::F12, CTRL_SHIFT),
    k(b"\x1b[14;4~", K::F12, ALT_SHIFT),

    // Control characters. Ctrl+I and Ctrl+[ collide with Tab and ESC, so
    // loadkeys maps them to F30/F31, which send these strings:
    //   control keycode 15 = F30, string F30 = "\033[[F"
    //   control keycode 26 = F31, string F31 = "\033[[G"
    ch(b"\x01", K::A, CTRL, b'\x01'),
    ch(b"\x02", K::B, CTRL, b'\x02'),
    ch(b"\x03", K::C, CTRL, b'\x03'),
    ch(b"\x04", K::D, CTRL, b'\x04'),
    ch(b"\x05", K::E, CTRL, b'\x05'),
    ch(b"\x06", K::F, CTRL, b'\x06'),
    ch(b"\x07", K::G, CTRL, b'\x07'),
    k(b"\x08", K::Backspace, NONE),
    ch(b"\x1b[[F", K::I, CTRL, b'\x09'),
    ch(b"\x0a", K::J, CTRL, b'\x0a'),
    ch(b"\x0b", K::K, CTRL, b'\x0b'),
    ch(b"\x0c", K::L, CTRL, b'\x0c'),
    ch(b"\x0e", K::N, CTRL, b'\x0e'),
    ch(b"\x0f", K::O, CTRL, b'\x0f'),
    ch(b"\x10", K::P, CTRL, b'\x10'),
    ch(b"\x11", K::Q, CTRL, b'\x11'),
    ch(b"\x12", K::R, CTRL, b'\x12'),
    ch(b"\x13", K::S, CTRL, b'\x13'),
    ch(b"\x14", K::T, CTRL, b'\x14'),
    ch(b"\x15", K::U, CTRL, b'\x15'),
    ch(b"\x16", K::V, CTRL, b'\x16'),
    ch(b"\x17", K::W, CTRL, b'\x17'),
    ch(b"\x18", K::X, CTRL, b'\x18'),
    ch(b"\x19", K::Y, CTRL, b'\x19'),
    ch(b"\x1a", K::Z, CTRL, b'\x1a'),
    ch(b"\x1b[[G", K::LBracket, CTRL, b'\x1b'),
];

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// The base table plus any terminal-specific pattern overrides.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: &'static [KeyRule],
    overrides: HashMap<usize, Vec<u8>>,
}

impl Catalog {
    /// The built-in table with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: BASE,
            overrides: HashMap::new(),
        }
    }

    /// The rules in match order.
    #[must_use]
    pub const fn rules(&self) -> &'static [KeyRule] {
        self.rules
    }

    /// The pattern rule `index` currently matches: its override if it has
    /// one, its base pattern otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn pattern(&self, index: usize) -> &[u8] {
        self.overrides
            .get(&index)
            .map_or(self.rules[index].pattern, Vec::as_slice)
    }

    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Replace the patterns of capability-named rules with the sequences
    /// `caps` reports. Returns the number of rules overridden.
    ///
    /// Empty strings, and strings too long to ever fit in the pending
    /// input buffer, are ignored. Calling again replaces earlier
    /// overrides.
    pub fn apply_capabilities(&mut self, caps: &impl CapabilitySource) -> usize {
        self.overrides.clear();
        for (i, rule) in self.rules.iter().enumerate() {
            let Some(name) = rule.capability else {
                continue;
            };
            let Some(seq) = caps.string(name) else {
                continue;
            };
            if seq.is_empty() || seq.len() > KEY_BUFFER_LEN {
                debug!(name, len = seq.len(), "terminfo key string ignored");
                continue;
            }
            if seq != rule.pattern {
                debug!(name, seq = ?seq.escape_ascii().to_string(), key = %rule.key, "key override");
            }
            self.overrides.insert(i, seq.to_vec());
        }
        self.overrides.len()
    }

    /// Classify `buf` against the catalog.
    ///
    /// `console_shift` is called only on a complete match; its bits are
    /// OR-ed with the rule's own.
    pub fn match_sequence<F>(&self, buf: &[u8], console_shift: F) -> Match
    where
        F: FnOnce() -> ShiftState,
    {
        let hit = (0..self.rules.len()).find(|&i| self.pattern(i).starts_with(buf));
        let Some(i) = hit else {
            trace!(buf = ?buf.escape_ascii().to_string(), "no match");
            return Match::None;
        };
        if self.pattern(i).len() != buf.len() {
            return Match::Partial;
        }
        let rule = &self.rules[i];
        Match::Complete(KeyEvent::new(rule.key, rule.shift | console_shift(), rule.ch))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
