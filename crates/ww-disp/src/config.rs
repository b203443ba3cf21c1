// SPDX-License-Identifier: MIT
//
// Driver configuration, loaded from `~/.ww/console.toml`.
//
// Every table is optional and every field has a default, so an empty or
// missing file gives the stock behavior:
//
//   [timing]
//   poll_slice_ms  = 15     # one wait slice for input readiness
//   key_timeout_ms = 30     # bare ESC vs. escape sequence cutoff
//   idle_timer_ms  = 5000   # periodic timer event while idle
//
//   [capacity]
//   color_pairs = 64        # including the reserved slot 0
//   palette     = 128
//
//   [keys]
//   use_terminfo = true     # override catalog entries from terminfo
//
// The key timeout is user visible: it is how long a lone Escape keypress
// waits before being reported.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DispError, Result};

/// Complete driver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispConfig {
    pub timing: TimingConfig,
    pub capacity: CapacityConfig,
    pub keys: KeysConfig,
}

/// Event pump timing thresholds, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub poll_slice_ms: u64,
    pub key_timeout_ms: u64,
    pub idle_timer_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_slice_ms: 15,
            key_timeout_ms: 30,
            idle_timer_ms: 5000,
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub const fn poll_slice(&self) -> Duration {
        Duration::from_millis(self.poll_slice_ms)
    }

    #[must_use]
    pub const fn key_timeout(&self) -> Duration {
        Duration::from_millis(self.key_timeout_ms)
    }

    #[must_use]
    pub const fn idle_timer(&self) -> Duration {
        Duration::from_millis(self.idle_timer_ms)
    }
}

/// Table sizes for the palette pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Color-pair slots, including the reserved slot 0.
    pub color_pairs: usize,
    /// Palette entry slots.
    pub palette: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            color_pairs: 64,
            palette: 128,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub use_terminfo: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self { use_terminfo: true }
    }
}

impl DispConfig {
    /// Load from the default location. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DispError::Config`] if the file exists but cannot be read
    /// or parsed, or holds out-of-range values.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`DispError::Config`] on read, parse, or validation failure.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| DispError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`DispError::Config`] on parse or validation failure.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| DispError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if t.poll_slice_ms == 0 {
            return Err(DispError::Config("timing.poll_slice_ms must be > 0".into()));
        }
        if t.key_timeout_ms < t.poll_slice_ms {
            return Err(DispError::Config(
                "timing.key_timeout_ms must be >= timing.poll_slice_ms".into(),
            ));
        }
        if t.idle_timer_ms <= t.key_timeout_ms {
            return Err(DispError::Config(
                "timing.idle_timer_ms must be > timing.key_timeout_ms".into(),
            ));
        }
        let c = &self.capacity;
        // Slot 0 is reserved and ids are u8, so 2..=256 pair slots.
        if !(2..=256).contains(&c.color_pairs) {
            return Err(DispError::Config("capacity.color_pairs must be in 2..=256".into()));
        }
        if c.palette == 0 || c.palette > usize::from(u16::MAX) {
            return Err(DispError::Config("capacity.palette must be in 1..=65535".into()));
        }
        Ok(())
    }
}

/// `~/.ww/console.toml`, if a home directory is known.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".ww").join("console.toml"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
