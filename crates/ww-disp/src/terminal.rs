// SPDX-License-Identifier: MIT
//
// Terminal mode control: raw input, geometry, the live shift state, and
// RAII restore.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ, TIOCLINUX), isatty, and raw fd writes.
// These are the POSIX interfaces for terminal control and have no safe
// equivalent in std. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// Input is switched to raw, non-blocking single-byte reads (VMIN=0,
// VTIME=0) with ISIG off, so Ctrl+C and Ctrl+Z arrive as keys. The event
// pump does its own waiting with poll(); read() never blocks.
//
// The panic hook bypasses Rust's stdout lock and writes a pre-built
// restore sequence straight to fd 1, then puts termios back. A panic in
// the middle of a paint (including the deliberate one on backend failure)
// still leaves a usable shell.

use std::io;
use std::sync::{Mutex, Once};

use tracing::{debug, warn};

use crate::keys::ShiftState;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Used when the terminal does not report its size.
    pub const FALLBACK: Self = Self { cols: 80, rows: 25 };
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Modifier keys physically held right now, as the Linux console reports
/// them.
///
/// Escape sequences cannot express every modifier combination; on a
/// virtual console the kernel can tell us the latched state directly.
/// Anywhere else (xterm, ssh, not a tty) the query fails and this returns
/// no modifiers.
#[cfg(target_os = "linux")]
#[must_use]
pub fn console_shift_state() -> ShiftState {
    // TIOCLINUX subcode 6: read the shift state into the argument byte.
    let mut arg: u8 = 6;
    let result = unsafe { libc::ioctl(libc::STDIN_FILENO, libc::TIOCLINUX, &raw mut arg) };
    if result == 0 {
        ShiftState::from_bits_truncate(arg)
    } else {
        ShiftState::empty()
    }
}

#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn console_shift_state() -> ShiftState {
    ShiftState::empty()
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Original termios for the panic hook, which cannot reach the
/// [`Terminal`] that owns the real copy.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Reset SGR attributes, show the cursor, leave the alternate screen.
///
/// Alternate screen exit is last so the shell content comes back clean.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install (once per process) a panic hook that restores the terminal
/// before the original hook prints the message.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor,
/// skipping `io::stdout()` in case the panic happened under its lock.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        use std::io::Write;
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Raw-mode handle with RAII restore.
///
/// [`enter`](Self::enter) switches stdin to raw non-blocking reads; drop
/// (or [`leave`](Self::leave)) puts the original mode back. Screen setup
/// (alternate screen, clearing) belongs to the backend, not to this type.
///
/// ```no_run
/// use ww_disp::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// // ... pump events ...
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
    size: Size,
    active: bool,
}

impl Terminal {
    /// Handle with the current size, not yet in raw mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            size: get_size().unwrap_or(Size::FALLBACK),
            active: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the size from the OS and cache it.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(s) = get_size() {
            self.size = s;
        }
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode. Idempotent. A no-op (but still "active") when stdin
    /// is not a terminal.
    ///
    /// # Errors
    ///
    /// Returns the OS error if termios cannot be read or set.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_panic_hook();
        self.enable_raw_mode()?;
        self.active = true;
        debug!(cols = self.size.cols, rows = self.size.rows, "raw mode on");
        Ok(())
    }

    /// Restore the original mode. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the OS error if termios cannot be restored.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.disable_raw_mode()?;
        self.active = false;
        debug!("raw mode off");
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=0, VTIME=0: read() returns at once with whatever is there.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            warn!(error = %e, "terminal mode restore failed");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
