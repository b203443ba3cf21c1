// SPDX-License-Identifier: MIT
//
// ww-disp: console driver for the ww text editor.
//
// Turns a raw terminal into three things the editor can use: a grid of
// characters painted in palette styles, a stream of PC-style key events,
// and a small pool of color/style entries backed by the terminal's color
// pairs.
//
// Input goes byte by byte through a table of known escape sequences, with
// timing deciding whether a lone ESC was the Escape key or the start of
// something longer. Output goes row by row through a stateful ANSI writer
// into one buffered write per flush.
//
// Everything hangs off `session::Display`. The hardware seams (`Backend`,
// `ByteSource`, `CapabilitySource`) are traits, so the whole driver runs
// headless in tests.

pub mod ansi;
pub mod backend;
pub mod caps;
pub mod catalog;
pub mod cell;
pub mod color;
pub mod config;
pub mod error;
pub mod keys;
pub mod output;
pub mod palette;
pub mod pump;
pub mod screen;
pub mod session;
pub mod style;
pub mod terminal;

pub use error::{DispError, Result};
