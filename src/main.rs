// SPDX-License-Identifier: MIT
//
// ww: live key viewer for the ww console driver.
//
// Opens a console session and shows, for every key pressed, the decoded
// key, its modifiers, scan code and character. It also counts the idle
// timer ticks. Ctrl+Q quits.
//
// Handy for checking what a given terminal actually sends: a key that
// never shows up here will never reach the editor either.
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ title bar                    │  ← row 0
//   │ key / scan / char / timer    │  ← rows 2..6
//   │ ...                          │
//   │ help line                    │  ← last row
//   └──────────────────────────────┘
//
// Logging goes to ~/.ww/ww.log. The screen belongs to the renderer.

use std::env;
use std::path::PathBuf;
use std::process;

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ww_disp::backend::Backend;
use ww_disp::cell::ScreenCell;
use ww_disp::color::Color;
use ww_disp::config::DispConfig;
use ww_disp::keys::{KeyCode, KeyEvent, ShiftState};
use ww_disp::palette::PaletteId;
use ww_disp::pump::{ByteSource, Event};
use ww_disp::screen::Rect;
use ww_disp::session::Display;
use ww_disp::style::FontStyle;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─── Viewer ─────────────────────────────────────────────────────────────────

/// Palette entries the viewer paints with.
struct Styles {
    normal: PaletteId,
    title: PaletteId,
    value: PaletteId,
}

impl Styles {
    /// Register the viewer's styles. `normal` goes first so it lands on
    /// palette id 0, which blank screen cells use.
    fn register<B: Backend, S: ByteSource>(d: &mut Display<B, S>) -> ww_disp::Result<Self> {
        let normal = d.add_palette_entry(Color::LightGray, Color::Blue, FontStyle::empty())?;
        let title = d.add_palette_entry(Color::Black, Color::Cyan, FontStyle::empty())?;
        // Fall back to the plain style on a terminal short of color pairs.
        let value = match d.add_palette_entry(Color::Yellow, Color::Blue, FontStyle::empty()) {
            Ok(id) => id,
            Err(e) if e.is_recoverable() => normal,
            Err(e) => return Err(e),
        };
        Ok(Self { normal, title, value })
    }
}

#[derive(Default)]
struct Viewer {
    last: Option<KeyEvent>,
    keys: u32,
    ticks: u32,
}

impl Viewer {
    /// Record `event`. Returns `false` when it asks to quit.
    fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Key(k) if k.key == KeyCode::Q && k.shift.contains(ShiftState::CTRL) => false,
            Event::Key(k) => {
                self.last = Some(k);
                self.keys += 1;
                true
            }
            Event::Timer5Sec => {
                self.ticks += 1;
                true
            }
        }
    }

    fn lines(&self) -> [(&'static str, String); 5] {
        let (key, scan, ch) = self.last.map_or_else(
            || ("-".to_owned(), "-".to_owned(), "-".to_owned()),
            |k| {
                let ch = k
                    .ch
                    .map_or_else(|| "-".to_owned(), |c| format!("{:?} (0x{c:02x})", char::from(c)));
                (k.to_string(), format!("0x{:02x}", k.scan_code), ch)
            },
        );
        [
            ("Key", key),
            ("Scan code", scan),
            ("Char", ch),
            ("Keys seen", self.keys.to_string()),
            ("Timer ticks", self.ticks.to_string()),
        ]
    }

    fn draw<B: Backend, S: ByteSource>(&self, d: &mut Display<B, S>, styles: &Styles) {
        let size = d.size();
        if size.cols == 0 || size.rows == 0 {
            return;
        }
        let full = Rect::new(0, 0, size.cols, size.rows);
        let screen = d.screen_mut();
        screen.fill(full, ScreenCell::new(' ', styles.normal));
        screen.fill(Rect::new(0, 0, size.cols, 1), ScreenCell::new(' ', styles.title));
        screen.put_str(1, 0, &format!("ww {VERSION} key viewer"), styles.title);

        for (row, (label, value)) in (2u16..).zip(self.lines()) {
            screen.put_str(2, row, &format!("{label:<12}"), styles.normal);
            screen.put_str(15, row, &value, styles.value);
        }
        screen.put_str(1, size.rows - 1, "Press keys. Ctrl+Q quits.", styles.normal);

        d.paint_rect(full);
    }
}

fn run<B: Backend, S: ByteSource>(d: &mut Display<B, S>) -> ww_disp::Result<Viewer> {
    let styles = Styles::register(d)?;
    d.show_cursor(false)?;

    let mut viewer = Viewer::default();
    loop {
        viewer.draw(d, &styles);
        let event = d.next_event()?;
        if let Event::Key(k) = event {
            info!(key = %k, scan = k.scan_code, ch = ?k.ch, "key");
        }
        if !viewer.handle(event) {
            return Ok(viewer);
        }
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

fn log_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|h| PathBuf::from(h).join(".ww").join("ww.log"))
}

/// Log to `~/.ww/ww.log`, level from `WW_LOG` (default `info`). Without a
/// writable log file, logging is off.
fn init_logging() {
    let Some(path) = log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_env("WW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    if env::args().skip(1).any(|a| a == "-v" || a == "--version") {
        eprintln!("ww {VERSION}");
        return Ok(());
    }

    init_logging();

    let config = DispConfig::load().unwrap_or_else(|e| {
        eprintln!("ww: {e}");
        process::exit(1);
    });

    let mut display = Display::init(&config).unwrap_or_else(|e| {
        error!(error = %e, "console init failed");
        eprintln!("ww: {e}");
        process::exit(1);
    });

    let result = run(&mut display);
    display.shutdown();

    let viewer = result?;
    info!(keys = viewer.keys, ticks = viewer.ticks, "viewer closed");
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────────────
