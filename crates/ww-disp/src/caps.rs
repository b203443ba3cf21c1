// SPDX-License-Identifier: MIT
//
// Terminal capability lookup.
//
// Queried once at session init for three things: cursor addressing
// (`cup`), color support (`colors` / `setaf`), and the byte strings a
// handful of keys send. The last is how the key catalog learns what this
// particular terminal emits for F1 or Home instead of guessing.
//
// `TermInfo` reads the compiled terminfo entry for `$TERM`. `StaticCaps`
// is an in-memory source for tests and for running without a database.

use std::collections::HashMap;

use tracing::debug;

/// Read access to a terminal description.
pub trait CapabilitySource {
    /// Boolean capability, `false` when absent.
    fn flag(&self, name: &str) -> bool;
    /// Numeric capability.
    fn number(&self, name: &str) -> Option<i32>;
    /// String capability, raw bytes as the terminal sends or expects them.
    fn string(&self, name: &str) -> Option<&[u8]>;

    /// Absolute cursor addressing is available.
    fn has_cursor_addressing(&self) -> bool {
        self.string("cup").is_some_and(|s| !s.is_empty())
    }

    /// At least the eight ANSI colors are available.
    fn has_color(&self) -> bool {
        self.number("colors").is_some_and(|n| n >= 8) || self.string("setaf").is_some()
    }
}

// ─── StaticCaps ──────────────────────────────────────────────────────────────

/// A hand-built capability set.
///
/// ```
/// use ww_disp::caps::{CapabilitySource, StaticCaps};
///
/// let caps = StaticCaps::new()
///     .with_string("cup", b"\x1b[%i%p1%d;%p2%dH")
///     .with_number("colors", 8);
/// assert!(caps.has_cursor_addressing());
/// assert!(caps.has_color());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCaps {
    flags: Vec<String>,
    numbers: HashMap<String, i32>,
    strings: HashMap<String, Vec<u8>>,
}

impl StaticCaps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An xterm-like set: cursor addressing, 8 colors, no key strings.
    #[must_use]
    pub fn ansi() -> Self {
        Self::new()
            .with_string("cup", b"\x1b[%i%p1%d;%p2%dH")
            .with_string("setaf", b"\x1b[3%p1%dm")
            .with_number("colors", 8)
    }

    #[must_use]
    pub fn with_flag(mut self, name: &str) -> Self {
        self.flags.push(name.to_owned());
        self
    }

    #[must_use]
    pub fn with_number(mut self, name: &str, value: i32) -> Self {
        self.numbers.insert(name.to_owned(), value);
        self
    }

    #[must_use]
    pub fn with_string(mut self, name: &str, value: &[u8]) -> Self {
        self.strings.insert(name.to_owned(), value.to_vec());
        self
    }
}

impl CapabilitySource for StaticCaps {
    fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
    }

    fn number(&self, name: &str) -> Option<i32> {
        self.numbers.get(name).copied()
    }

    fn string(&self, name: &str) -> Option<&[u8]> {
        self.strings.get(name).map(Vec::as_slice)
    }
}

// ─── TermInfo ────────────────────────────────────────────────────────────────

/// Capabilities from the system terminfo database.
#[cfg(unix)]
pub struct TermInfo {
    db: terminfo::Database,
}

#[cfg(unix)]
impl TermInfo {
    /// Load the entry for `$TERM`.
    ///
    /// # Errors
    ///
    /// Returns the terminfo error if `$TERM` is unset or has no entry.
    pub fn from_env() -> Result<Self, terminfo::Error> {
        let db = terminfo::Database::from_env()?;
        debug!(name = db.name(), "terminfo loaded");
        Ok(Self { db })
    }

    /// Look up by short name, then by the long name terminfo also files
    /// capabilities under.
    fn raw(&self, name: &str) -> Option<&terminfo::Value> {
        self.db
            .raw(name)
            .or_else(|| long_name(name).and_then(|long| self.db.raw(long)))
    }
}

#[cfg(unix)]
impl CapabilitySource for TermInfo {
    fn flag(&self, name: &str) -> bool {
        matches!(self.raw(name), Some(terminfo::Value::True))
    }

    fn number(&self, name: &str) -> Option<i32> {
        match self.raw(name) {
            Some(terminfo::Value::Number(n)) => Some(*n),
            _ => None,
        }
    }

    fn string(&self, name: &str) -> Option<&[u8]> {
        match self.raw(name) {
            Some(terminfo::Value::String(s)) => Some(s.as_slice()),
            _ => None,
        }
    }
}

/// Long terminfo names for the short names the driver asks for.
#[cfg_attr(not(unix), allow(dead_code))]
fn long_name(short: &str) -> Option<&'static str> {
    Some(match short {
        "cup" => "cursor_address",
        "colors" => "max_colors",
        "setaf" => "set_a_foreground",
        "kbs" => "key_backspace",
        "kf1" => "key_f1",
        "kf2" => "key_f2",
        "kf3" => "key_f3",
        "kf4" => "key_f4",
        "kf5" => "key_f5",
        "kf6" => "key_f6",
        "kf7" => "key_f7",
        "kf8" => "key_f8",
        "kf9" => "key_f9",
        "kf10" => "key_f10",
        "kf11" => "key_f11",
        "kf12" => "key_f12",
        "khome" => "key_home",
        "kich1" => "key_ic",
        "kdch1" => "key_dc",
        "kend" => "key_end",
        "kpp" => "key_ppage",
        "knp" => "key_npage",
        "kcuu1" => "key_up",
        "kcud1" => "key_down",
        "kcub1" => "key_left",
        "kcuf1" => "key_right",
        _ => return None,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_nothing() {
        let caps = StaticCaps::new();
        assert!(!caps.flag("am"));
        assert_eq!(caps.number("colors"), None);
        assert_eq!(caps.string("cup"), None);
        assert!(!caps.has_cursor_addressing());
        assert!(!caps.has_color());
    }

    #[test]
    fn builder_stores_values() {
        let caps = StaticCaps::new()
            .with_flag("am")
            .with_number("cols", 80)
            .with_string("kf1", b"\x1bOP");
        assert!(caps.flag("am"));
        assert_eq!(caps.number("cols"), Some(80));
        assert_eq!(caps.string("kf1"), Some(&b"\x1bOP"[..]));
    }

    #[test]
    fn empty_cup_is_not_addressing() {
        let caps = StaticCaps::new().with_string("cup", b"");
        assert!(!caps.has_cursor_addressing());
    }

    #[test]
    fn color_from_count_or_setaf() {
        assert!(!StaticCaps::new().with_number("colors", 2).has_color());
        assert!(StaticCaps::new().with_number("colors", 256).has_color());
        assert!(StaticCaps::new().with_string("setaf", b"\x1b[3%p1%dm").has_color());
    }

    #[test]
    fn ansi_preset_passes_init_checks() {
        let caps = StaticCaps::ansi();
        assert!(caps.has_cursor_addressing());
        assert!(caps.has_color());
    }

    #[test]
    fn long_names_cover_key_capabilities() {
        assert_eq!(long_name("kcuu1"), Some("key_up"));
        assert_eq!(long_name("kf12"), Some("key_f12"));
        assert_eq!(long_name("smkx"), None);
    }
}
