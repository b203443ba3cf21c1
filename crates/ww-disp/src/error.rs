// SPDX-License-Identifier: MIT
//
// Error kinds for the console driver.
//
// Two families live here. Palette errors (`ResourceExhausted`,
// `PaletteFull`, `BackendRejected`) are recoverable: the caller can fall
// back to an existing palette entry or drop styling. Init errors
// (`TerminalIncapable`, `ModeSetupFailure`) are fatal and surface before
// any screen state is touched.
//
// Programmer errors (an unregistered palette id, a paint rectangle outside
// the screen) are not represented here. Those are assertions at the call
// site.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::palette::ColorPairId;

/// A terminal capability that the driver cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// No capability database could be loaded for `$TERM`.
    Database,
    /// Absolute cursor addressing (`cup`).
    CursorAddressing,
    /// At least 8 colors (`colors` / `setaf`).
    Color,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Database => "no terminal description found for $TERM",
            Self::CursorAddressing => "terminal doesn't support cursor oriented operations",
            Self::Color => "terminal doesn't support color",
        })
    }
}

#[derive(Error, Debug)]
pub enum DispError {
    #[error("no room for additional color pairs")]
    ResourceExhausted,

    #[error("no more entries available in the palette table")]
    PaletteFull,

    #[error("backend refused color pair {pair}: {reason}")]
    BackendRejected {
        pair: ColorPairId,
        reason: &'static str,
    },

    #[error("{0}")]
    TerminalIncapable(Capability),

    #[error("failed to set desired terminal mode: {0}")]
    ModeSetupFailure(#[source] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DispError {
    /// Whether the caller can degrade gracefully instead of aborting.
    ///
    /// True for the palette allocation failures; everything else means the
    /// session cannot continue.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ResourceExhausted | Self::PaletteFull | Self::BackendRejected { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DispError>;
