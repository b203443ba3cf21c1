// SPDX-License-Identifier: MIT
//
// The event pump: the one place the driver blocks.
//
// Each call waits on the input in short slices until it has exactly one
// event to report, then returns. Between slices it keeps two clocks:
//
//   idle: time since the last byte of any kind. Past the idle threshold
//   it reports a timer event, so the editor sees wall-clock time pass
//   while the user does nothing.
//
//   pending: time since the bytes in the key buffer started arriving.
//   Past the key timeout the buffer is abandoned. A lone ESC becomes the
//   Escape key; anything longer is dropped.
//
// The ESC timeout is the only thing that tells a bare Escape keypress
// apart from the first byte of a function-key sequence. The pending clock
// is measured from the first byte of the sequence, not the latest one.
//
// Each byte goes into the key buffer and the buffer is matched against
// the catalog. Unknown sequences are dropped without comment.
#![allow(unsafe_code)]

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use tracing::{debug, trace};

use crate::catalog::{Catalog, Match};
use crate::config::TimingConfig;
use crate::keys::{KeyCode, KeyEvent, ShiftState};

/// Capacity of the pending input buffer.
pub const KEY_BUFFER_LEN: usize = 10;

const ESC: u8 = 0x1b;

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    /// The input has been idle for the configured idle period.
    Timer5Sec,
}

/// FIFO of events waiting for the editor.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Oldest event first.
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ─── Byte sources ────────────────────────────────────────────────────────────

/// Outcome of one wait slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// A byte can be read.
    Ready,
    /// Nothing arrived; this much time went by.
    Idle(Duration),
}

/// Where the pump gets its bytes.
pub trait ByteSource {
    /// Wait up to `slice` for input.
    ///
    /// An interrupted wait reports `Idle` with the time actually spent.
    ///
    /// # Errors
    ///
    /// Propagates OS errors other than interruption.
    fn wait(&mut self, slice: Duration) -> io::Result<Wait>;

    /// Read one byte after a `Ready` wait. `Ok(None)` means the readiness
    /// was spurious.
    ///
    /// # Errors
    ///
    /// [`io::ErrorKind::UnexpectedEof`] when the terminal has gone away,
    /// and OS read errors.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// The process's standard input.
#[derive(Debug, Default)]
pub struct StdinSource;

impl StdinSource {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl ByteSource for StdinSource {
    fn wait(&mut self, slice: Duration) -> io::Result<Wait> {
        let mut fds = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout = libc::c_int::try_from(slice.as_millis()).unwrap_or(libc::c_int::MAX);
        let start = std::time::Instant::now();
        let n = unsafe { libc::poll(&raw mut fds, 1, timeout) };
        if n > 0 {
            return Ok(Wait::Ready);
        }
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
        Ok(Wait::Idle(start.elapsed()))
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast::<libc::c_void>(), 1) };
        match n {
            1 => Ok(Some(byte)),
            // poll() said readable and there is nothing: hangup.
            0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "terminal closed")),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }
}

/// Without poll() every wait is "ready" and reads block.
#[cfg(not(unix))]
impl ByteSource for StdinSource {
    fn wait(&mut self, _slice: Duration) -> io::Result<Wait> {
        Ok(Wait::Ready)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;
        let mut byte = [0u8; 1];
        match io::stdin().read(&mut byte)? {
            0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "terminal closed")),
            _ => Ok(Some(byte[0])),
        }
    }
}

// ─── KeyBuffer ───────────────────────────────────────────────────────────────

/// Bytes of a key sequence received so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyBuffer {
    bytes: [u8; KEY_BUFFER_LEN],
    len: usize,
}

impl KeyBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; KEY_BUFFER_LEN],
            len: 0,
        }
    }

    /// Append a byte. Returns `false` (and stores nothing) when full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.len == KEY_BUFFER_LEN {
            return false;
        }
        self.bytes[self.len] = byte;
        self.len += 1;
        true
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn clear(&mut self) {
        self.len = 0;
    }
}

// ─── EventPump ───────────────────────────────────────────────────────────────

/// Key decoding and timer state between pump calls.
#[derive(Debug)]
pub struct EventPump {
    slice: Duration,
    key_timeout: Duration,
    idle_timer: Duration,
    buf: KeyBuffer,
    idle: Duration,
    pending: Duration,
}

impl EventPump {
    #[must_use]
    pub const fn new(timing: &TimingConfig) -> Self {
        Self {
            slice: timing.poll_slice(),
            key_timeout: timing.key_timeout(),
            idle_timer: timing.idle_timer(),
            buf: KeyBuffer::new(),
            idle: Duration::ZERO,
            pending: Duration::ZERO,
        }
    }

    /// Bytes of an unfinished sequence.
    #[must_use]
    pub fn pending_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Wait for input until one event is pushed onto `queue`.
    ///
    /// `console_shift` supplies the modifier state the byte stream cannot
    /// carry; it is asked once per decoded key.
    ///
    /// # Errors
    ///
    /// Propagates errors from `source`, including end of input. The
    /// partially decoded sequence, if any, is kept.
    pub fn pump_once<S, F>(
        &mut self,
        source: &mut S,
        catalog: &Catalog,
        console_shift: F,
        queue: &mut EventQueue,
    ) -> io::Result<()>
    where
        S: ByteSource + ?Sized,
        F: Fn() -> ShiftState,
    {
        self.idle = Duration::ZERO;
        self.pending = Duration::ZERO;

        loop {
            match source.wait(self.slice)? {
                Wait::Idle(elapsed) => {
                    self.idle += elapsed;
                    self.pending += elapsed;

                    // A bare ESC due in the same slice as the timer wins.
                    if self.pending > self.key_timeout {
                        self.pending = Duration::ZERO;
                        if self.buf.as_slice() == [ESC] {
                            self.buf.clear();
                            queue.push(Event::Key(KeyEvent::plain(KeyCode::Esc)));
                            return Ok(());
                        }
                        if !self.buf.is_empty() {
                            debug!(bytes = ?self.pending_text(), "key sequence timed out");
                            self.buf.clear();
                        }
                    }

                    if self.idle > self.idle_timer {
                        self.idle = Duration::ZERO;
                        queue.push(Event::Timer5Sec);
                        return Ok(());
                    }
                }
                Wait::Ready => {
                    let Some(byte) = source.read_byte()? else {
                        continue;
                    };
                    trace!(byte, "input");
                    self.idle = Duration::ZERO;

                    if byte == ESC && !self.buf.is_empty() {
                        debug!(bytes = ?self.pending_text(), "ESC inside sequence, restarting");
                        self.buf.clear();
                    }
                    if !self.buf.push(byte) {
                        debug!(bytes = ?self.pending_text(), "key buffer overflow");
                        self.buf.clear();
                        self.buf.push(byte);
                    }
                    if self.buf.len() == 1 {
                        self.pending = Duration::ZERO;
                    }

                    match catalog.match_sequence(self.buf.as_slice(), &console_shift) {
                        Match::None => self.buf.clear(),
                        Match::Partial => {}
                        Match::Complete(ev) => {
                            self.buf.clear();
                            trace!(key = %ev, "key");
                            queue.push(Event::Key(ev));
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    fn pending_text(&self) -> String {
        self.buf.as_slice().escape_ascii().to_string()
    }
}

// ─── Scripted source ─────────────────────────────────────────────────────────

/// A byte source replaying a fixed script, for headless tests.
#[cfg(test)]
pub(crate) mod script {
    use super::{ByteSource, Wait};
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;

    #[derive(Debug, Clone, Copy)]
    pub enum Step {
        Byte(u8),
        Idle(Duration),
    }

    #[derive(Debug, Default)]
    pub struct ScriptedSource {
        steps: VecDeque<Step>,
        ready: Option<u8>,
    }

    impl ScriptedSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn bytes(mut self, bytes: &[u8]) -> Self {
            self.steps.extend(bytes.iter().map(|&b| Step::Byte(b)));
            self
        }

        /// `n` empty slices of 15 ms.
        pub fn idle(mut self, n: usize) -> Self {
            self.steps
                .extend(std::iter::repeat_n(Step::Idle(Duration::from_millis(15)), n));
            self
        }

        pub fn remaining(&self) -> usize {
            self.steps.len()
        }
    }

    impl ByteSource for ScriptedSource {
        fn wait(&mut self, _slice: Duration) -> io::Result<Wait> {
            match self.steps.pop_front() {
                Some(Step::Byte(b)) => {
                    self.ready = Some(b);
                    Ok(Wait::Ready)
                }
                Some(Step::Idle(d)) => Ok(Wait::Idle(d)),
                None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted")),
            }
        }

        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Ok(self.ready.take())
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::script::ScriptedSource;
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_shift() -> ShiftState {
        ShiftState::empty()
    }

    fn pump() -> EventPump {
        EventPump::new(&TimingConfig::default())
    }

    /// Run one pump call and return everything it queued.
    fn run(p: &mut EventPump, src: &mut ScriptedSource) -> Vec<Event> {
        let catalog = Catalog::new();
        let mut q = EventQueue::new();
        p.pump_once(src, &catalog, no_shift, &mut q).unwrap();
        std::iter::from_fn(|| q.pop()).collect()
    }

    fn key(key: KeyCode, shift: ShiftState, ch: Option<u8>) -> Event {
        Event::Key(KeyEvent::new(key, shift, ch))
    }

    // ── KeyBuffer ───────────────────────────────────────────────────────

    #[test]
    fn key_buffer_refuses_past_capacity() {
        let mut b = KeyBuffer::new();
        for i in 0..10 {
            assert!(b.push(i));
        }
        assert!(!b.push(10));
        assert_eq!(b.len(), 10);
        assert_eq!(b.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        b.clear();
        assert!(b.is_empty());
    }

    // ── EventQueue ──────────────────────────────────────────────────────

    #[test]
    fn queue_is_fifo() {
        let mut q = EventQueue::new();
        q.push(Event::Timer5Sec);
        q.push(key(KeyCode::Q, ShiftState::empty(), Some(b'q')));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(Event::Timer5Sec));
        assert_eq!(q.pop(), Some(key(KeyCode::Q, ShiftState::empty(), Some(b'q'))));
        assert!(q.is_empty());
    }

    // ── Decoding ────────────────────────────────────────────────────────

    #[test]
    fn sequence_decodes_to_one_key() {
        let mut src = ScriptedSource::new().bytes(b"\x1b[A").bytes(b"q");
        let mut p = pump();
        assert_eq!(run(&mut p, &mut src), vec![key(KeyCode::Up, ShiftState::empty(), None)]);
        // Stops right after the key; the rest of the input stays unread.
        assert_eq!(src.remaining(), 1);
        assert!(p.pending_bytes().is_empty());
    }

    #[test]
    fn one_event_per_call_in_arrival_order() {
        let mut src = ScriptedSource::new().bytes(b"ab");
        let mut p = pump();
        assert_eq!(run(&mut p, &mut src), vec![key(KeyCode::A, ShiftState::empty(), Some(b'a'))]);
        assert_eq!(run(&mut p, &mut src), vec![key(KeyCode::B, ShiftState::empty(), Some(b'b'))]);
    }

    #[test]
    fn live_shift_is_merged() {
        let catalog = Catalog::new();
        let mut src = ScriptedSource::new().bytes(b"\x1b[1;5B");
        let mut q = EventQueue::new();
        pump()
            .pump_once(&mut src, &catalog, || ShiftState::SHIFT, &mut q)
            .unwrap();
        assert_eq!(
            q.pop(),
            Some(key(KeyCode::Down, ShiftState::CTRL | ShiftState::SHIFT, None))
        );
    }

    #[test]
    fn unknown_sequence_is_dropped() {
        let mut src = ScriptedSource::new().bytes(b"\x1b[Zq");
        assert_eq!(
            run(&mut pump(), &mut src),
            vec![key(KeyCode::Q, ShiftState::empty(), Some(b'q'))]
        );
    }

    #[test]
    fn esc_restarts_a_partial_sequence() {
        // Ctrl+Down cut off after five bytes, then a whole Down.
        let mut src = ScriptedSource::new().bytes(b"\x1b[1;5").bytes(b"\x1b[B");
        assert_eq!(
            run(&mut pump(), &mut src),
            vec![key(KeyCode::Down, ShiftState::empty(), None)]
        );
    }

    // ── Timeouts ────────────────────────────────────────────────────────

    #[test]
    fn lone_esc_times_out_into_escape() {
        let mut src = ScriptedSource::new().bytes(b"\x1b").idle(5);
        let mut p = pump();
        assert_eq!(
            run(&mut p, &mut src),
            vec![key(KeyCode::Esc, ShiftState::empty(), None)]
        );
        // Third 15 ms slice crosses the 30 ms timeout.
        assert_eq!(src.remaining(), 2);
        assert!(p.pending_bytes().is_empty());
    }

    #[test]
    fn lone_esc_ignores_live_shift() {
        let catalog = Catalog::new();
        let mut src = ScriptedSource::new().bytes(b"\x1b").idle(3);
        let mut q = EventQueue::new();
        pump()
            .pump_once(&mut src, &catalog, || ShiftState::CTRL, &mut q)
            .unwrap();
        assert_eq!(q.pop(), Some(Event::Key(KeyEvent::plain(KeyCode::Esc))));
    }

    #[test]
    fn lone_esc_beats_timer_due_in_same_slice() {
        let mut p = EventPump::new(&TimingConfig {
            poll_slice_ms: 15,
            key_timeout_ms: 30,
            idle_timer_ms: 30,
        });
        let mut src = ScriptedSource::new().bytes(b"\x1b").idle(30);
        assert_eq!(
            run(&mut p, &mut src),
            vec![key(KeyCode::Esc, ShiftState::empty(), None)]
        );
        assert!(p.pending_bytes().is_empty());
        assert_eq!(run(&mut p, &mut src), vec![Event::Timer5Sec]);
        assert_eq!(run(&mut p, &mut src), vec![Event::Timer5Sec]);
    }

    #[test]
    fn sequence_within_timeout_still_decodes() {
        let mut src = ScriptedSource::new().bytes(b"\x1b").idle(2).bytes(b"[A");
        assert_eq!(
            run(&mut pump(), &mut src),
            vec![key(KeyCode::Up, ShiftState::empty(), None)]
        );
    }

    #[test]
    fn timeout_is_measured_from_sequence_start() {
        // Two slices after ESC, one after '[': 45 ms since the sequence
        // began, so it is abandoned before 'A' arrives.
        let mut src = ScriptedSource::new()
            .bytes(b"\x1b")
            .idle(2)
            .bytes(b"[")
            .idle(1)
            .bytes(b"Aq");
        assert_eq!(
            run(&mut pump(), &mut src),
            vec![key(KeyCode::A, ShiftState::SHIFT, Some(b'A'))]
        );
    }

    #[test]
    fn stale_partial_is_dropped_silently() {
        let mut src = ScriptedSource::new().bytes(b"\x1b[").idle(3).bytes(b"x");
        assert_eq!(
            run(&mut pump(), &mut src),
            vec![key(KeyCode::X, ShiftState::empty(), Some(b'x'))]
        );
    }

    #[test]
    fn idle_timer_fires_after_five_seconds() {
        let mut src = ScriptedSource::new().idle(340);
        let mut p = pump();
        assert_eq!(run(&mut p, &mut src), vec![Event::Timer5Sec]);
        // 334 × 15 ms = 5010 ms is the first total past 5000 ms.
        assert_eq!(src.remaining(), 6);
    }

    #[test]
    fn idle_timer_repeats_per_call() {
        let mut src = ScriptedSource::new().idle(668);
        let mut p = pump();
        assert_eq!(run(&mut p, &mut src), vec![Event::Timer5Sec]);
        assert_eq!(run(&mut p, &mut src), vec![Event::Timer5Sec]);
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn any_byte_holds_off_the_timer() {
        // The dropped "\x1b[" restarts the idle clock; 333 slices after it
        // is 4995 ms, short of the threshold.
        let mut src = ScriptedSource::new()
            .idle(200)
            .bytes(b"\x1b[")
            .idle(333)
            .bytes(b"q");
        assert_eq!(
            run(&mut pump(), &mut src),
            vec![key(KeyCode::Q, ShiftState::empty(), Some(b'q'))]
        );
    }

    // ── Errors ──────────────────────────────────────────────────────────

    #[test]
    fn end_of_input_is_an_error() {
        let catalog = Catalog::new();
        let mut src = ScriptedSource::new().bytes(b"\x1b[");
        let mut q = EventQueue::new();
        let mut p = pump();
        let err = p.pump_once(&mut src, &catalog, no_shift, &mut q).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(q.is_empty());
        assert_eq!(p.pending_bytes(), b"\x1b[");
    }
}
