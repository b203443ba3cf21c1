// SPDX-License-Identifier: MIT
//
// The console session: everything the editor talks to, in one value.
//
// `Display` owns the backend, the screen buffer, the palette pool, the key
// catalog and the event pump. There is no global state; exclusive access
// to the session is exclusive access to all of it.
//
// Startup order matters. Capabilities are checked before anything is
// written to the terminal, so an unusable terminal is reported on a clean
// screen. Once the terminal has been switched over, any later failure (or
// a drop) switches it back.

use std::io;

use tracing::{debug, info, warn};

use crate::backend::{AnsiBackend, Backend};
use crate::caps::CapabilitySource;
use crate::catalog::Catalog;
use crate::color::Color;
use crate::config::DispConfig;
use crate::error::{Capability, DispError, Result};
use crate::keys::ShiftState;
use crate::palette::{PaletteId, PalettePool};
use crate::pump::{ByteSource, Event, EventPump, EventQueue, StdinSource};
use crate::screen::{self, Rect, ScreenBuffer};
use crate::style::FontStyle;
use crate::terminal::{self, Size, Terminal};

/// A running console session.
pub struct Display<B: Backend, S: ByteSource> {
    backend: B,
    source: S,
    terminal: Option<Terminal>,
    screen: ScreenBuffer,
    pool: PalettePool,
    catalog: Catalog,
    pump: EventPump,
    queue: EventQueue,
    console_shift: fn() -> ShiftState,
    size: Size,
    cursor: (u16, u16),
    cursor_visible: bool,
    focused: bool,
    paint_suspended: bool,
    active: bool,
}

/// Refuse terminals the driver cannot drive.
fn check_capabilities(caps: &impl CapabilitySource) -> Result<()> {
    if !caps.has_cursor_addressing() {
        return Err(DispError::TerminalIncapable(Capability::CursorAddressing));
    }
    if !caps.has_color() {
        return Err(DispError::TerminalIncapable(Capability::Color));
    }
    Ok(())
}

#[cfg(unix)]
impl Display<AnsiBackend<io::Stdout>, StdinSource> {
    /// Take over the controlling terminal.
    ///
    /// # Errors
    ///
    /// - [`DispError::TerminalIncapable`] if `$TERM` has no terminfo entry,
    ///   or lacks cursor addressing or color. The terminal is untouched.
    /// - [`DispError::ModeSetupFailure`] if raw mode or the screen switch
    ///   fails. The terminal is restored.
    pub fn init(config: &DispConfig) -> Result<Self> {
        let caps = crate::caps::TermInfo::from_env().map_err(|e| {
            warn!(error = %e, "terminfo lookup failed");
            DispError::TerminalIncapable(Capability::Database)
        })?;
        check_capabilities(&caps)?;

        let mut term = Terminal::new();
        term.enter().map_err(DispError::ModeSetupFailure)?;
        let size = term.size();

        let backend = AnsiBackend::new(io::stdout(), config.capacity.color_pairs);
        let mut display = Self::assemble(backend, StdinSource::new(), size, config);
        display.console_shift = terminal::console_shift_state;
        display.terminal = Some(term);
        display.load_key_overrides(&caps, config);
        display.start()?;
        Ok(display)
    }
}

impl<B: Backend, S: ByteSource> Display<B, S> {
    /// Start a session on caller-supplied parts.
    ///
    /// Runs the same capability checks and catalog override step as
    /// [`Display::init`], but never touches the real terminal mode.
    ///
    /// # Errors
    ///
    /// As for `init`: [`DispError::TerminalIncapable`] before the backend
    /// is used, [`DispError::ModeSetupFailure`] if the backend cannot take
    /// over the display.
    pub fn with_parts(
        backend: B,
        source: S,
        caps: &impl CapabilitySource,
        size: Size,
        config: &DispConfig,
    ) -> Result<Self> {
        check_capabilities(caps)?;
        let mut display = Self::assemble(backend, source, size, config);
        display.load_key_overrides(caps, config);
        display.start()?;
        Ok(display)
    }

    fn assemble(backend: B, source: S, size: Size, config: &DispConfig) -> Self {
        Self {
            backend,
            source,
            terminal: None,
            screen: ScreenBuffer::new(size.cols, size.rows),
            pool: PalettePool::new(config.capacity.color_pairs, config.capacity.palette),
            catalog: Catalog::new(),
            pump: EventPump::new(&config.timing),
            queue: EventQueue::new(),
            console_shift: ShiftState::empty,
            size,
            cursor: (0, 0),
            cursor_visible: true,
            focused: true,
            paint_suspended: false,
            active: false,
        }
    }

    fn load_key_overrides(&mut self, caps: &impl CapabilitySource, config: &DispConfig) {
        if config.keys.use_terminfo {
            let n = self.catalog.apply_capabilities(caps);
            debug!(overrides = n, "key catalog loaded");
        } else {
            debug!("terminfo key strings disabled");
        }
    }

    fn start(&mut self) -> Result<()> {
        // From here on a failure must undo whatever was switched over.
        self.active = true;
        self.backend.enter().map_err(DispError::ModeSetupFailure)?;
        info!(cols = self.size.cols, rows = self.size.rows, "console session started");
        Ok(())
    }

    // ── Geometry and state ───────────────────────────────────────────

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub const fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub const fn screen_mut(&mut self) -> &mut ScreenBuffer {
        &mut self.screen
    }

    #[must_use]
    pub const fn palette(&self) -> &PalettePool {
        &self.pool
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    // ── Palette ─────────────────────────────────────────────────────

    /// Register a style. See [`PalettePool::add_palette_entry`].
    ///
    /// # Errors
    ///
    /// The recoverable palette errors: [`DispError::ResourceExhausted`],
    /// [`DispError::PaletteFull`], [`DispError::BackendRejected`].
    pub fn add_palette_entry(&mut self, fg: Color, bg: Color, style: FontStyle) -> Result<PaletteId> {
        self.pool.add_palette_entry(&mut self.backend, fg, bg, style)
    }

    /// # Panics
    ///
    /// Panics if `id` is not an allocated entry.
    pub fn free_palette_entry(&mut self, id: PaletteId) {
        self.pool.free_palette_entry(id);
    }

    #[must_use]
    pub fn validate_palette_id(&self, id: PaletteId) -> bool {
        self.pool.validate_palette_id(id)
    }

    // ── Painting ────────────────────────────────────────────────────

    /// Send `rect` of the screen buffer to the terminal (on the next
    /// flush) and lift any paint suspension.
    ///
    /// # Panics
    ///
    /// See [`screen::paint_rect`].
    pub fn paint_rect(&mut self, rect: Rect) {
        self.paint_suspended = false;
        screen::paint_rect(&self.screen, &self.pool, &mut self.backend, rect);
    }

    /// Mark painting as held off, e.g. while a shell command owns the
    /// screen. The next `paint_rect` lifts it.
    pub const fn suspend_paint(&mut self) {
        self.paint_suspended = true;
    }

    #[must_use]
    pub const fn is_paint_suspended(&self) -> bool {
        self.paint_suspended
    }

    /// Clear the terminal. The screen buffer is left as is.
    ///
    /// # Errors
    ///
    /// Propagates backend I/O errors.
    pub fn clear(&mut self) -> Result<()> {
        self.backend.clear()?;
        Ok(())
    }

    // ── Cursor ──────────────────────────────────────────────────────

    /// Place the cursor. Applied now and again on every flush, since
    /// painting moves the terminal's cursor.
    ///
    /// # Errors
    ///
    /// Propagates backend I/O errors.
    pub fn set_cursor_pos(&mut self, x: u16, y: u16) -> Result<()> {
        self.cursor = (x, y);
        self.backend.move_cursor(x, y)?;
        Ok(())
    }

    #[must_use]
    pub const fn cursor_pos(&self) -> (u16, u16) {
        self.cursor
    }

    /// Show or hide the cursor. Takes effect only while the session has
    /// focus; otherwise it is remembered for when focus returns.
    ///
    /// # Errors
    ///
    /// Propagates backend I/O errors.
    pub fn show_cursor(&mut self, visible: bool) -> Result<()> {
        if visible == self.cursor_visible {
            return Ok(());
        }
        self.cursor_visible = visible;
        if self.focused {
            self.backend.set_cursor_visible(visible)?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Record whether the session has input focus. Regaining it
    /// re-applies the cursor visibility.
    ///
    /// # Errors
    ///
    /// Propagates backend I/O errors.
    pub fn set_focus(&mut self, focused: bool) -> Result<()> {
        let regained = focused && !self.focused;
        self.focused = focused;
        if regained {
            self.backend.set_cursor_visible(self.cursor_visible)?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn has_focus(&self) -> bool {
        self.focused
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Push pending output to the terminal, cursor last.
    ///
    /// # Errors
    ///
    /// Propagates backend I/O errors.
    pub fn flush(&mut self) -> Result<()> {
        let (x, y) = self.cursor;
        self.backend.move_cursor(x, y)?;
        self.backend.flush()?;
        Ok(())
    }

    /// Flush, then wait until one more event is queued.
    ///
    /// # Errors
    ///
    /// Output errors, input errors, and end of input
    /// ([`io::ErrorKind::UnexpectedEof`] inside [`DispError::Io`]).
    pub fn process_events(&mut self) -> Result<()> {
        self.flush()?;
        self.pump
            .pump_once(&mut self.source, &self.catalog, self.console_shift, &mut self.queue)?;
        Ok(())
    }

    /// The next event, waiting for one if the queue is empty.
    ///
    /// # Errors
    ///
    /// As for [`process_events`](Self::process_events).
    pub fn next_event(&mut self) -> Result<Event> {
        loop {
            if let Some(ev) = self.queue.pop() {
                return Ok(ev);
            }
            self.process_events()?;
        }
    }

    /// Events decoded but not yet taken.
    pub const fn events(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    // ── Teardown ────────────────────────────────────────────────────

    /// Give the terminal back. Idempotent; failures are logged and
    /// otherwise ignored. Also runs on drop.
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(e) = self.backend.leave() {
            warn!(error = %e, "screen restore failed");
        }
        if let Some(term) = self.terminal.as_mut() {
            if let Err(e) = term.leave() {
                warn!(error = %e, "terminal mode restore failed");
            }
        }
        info!("console session closed");
    }
}

impl<B: Backend, S: ByteSource> Drop for Display<B, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
