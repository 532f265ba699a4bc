// SPDX-License-Identifier: MIT
//
// kilo: a tiny raw-mode terminal text viewer.
//
// This is the binary that wires the two crates together:
//
//   kilo-term   → raw mode, key decoding, frames, signals, event loop
//   kilo-editor → line store, cursor, row layout, options
//
// The Editor struct implements kilo-term's App trait. Each keypress flows
// through:
//
//   stdin → KeyDecoder → on_key → cursor movement
//   paint → view::draw_rows → Frame → one write → terminal
//
// Exit status: 0 after the quit key, 1 on a fatal error, 128 + signo when
// a termination signal ends the session.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{debug, error, info};
use thiserror::Error;

use kilo_editor::buffer::Buffer;
use kilo_editor::cursor::{Cursor, Direction};
use kilo_editor::options::Options;
use kilo_editor::view;
use kilo_term::TermError;
use kilo_term::ansi;
use kilo_term::event_loop::{Action, App, EventLoop, Exit, LoopConfig};
use kilo_term::input::{Key, NavKey};
use kilo_term::output::Frame;
use kilo_term::terminal::{DEFAULT_READ_TIMEOUT_DS, Size};

// ─── Command Line ───────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "kilo", about = "A tiny raw-mode terminal text viewer", version)]
struct Cli {
    /// File to show. Without one, the welcome screen is drawn.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Append debug logs to this file. Nothing is logged without it.
    #[arg(long, value_name = "PATH", env = "KILO_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// How long one read waits for a key, in tenths of a second.
    #[arg(long, value_name = "DS", default_value_t = DEFAULT_READ_TIMEOUT_DS)]
    read_timeout: u8,
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Anything that ends the program with status 1.
#[derive(Debug, Error)]
enum Fatal {
    #[error(transparent)]
    Term(#[from] TermError),

    #[error("open: {0}")]
    Open(#[source] io::Error),

    #[error("log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ─── Editor ─────────────────────────────────────────────────────────────────

/// The viewer's whole state: what is shown, where the cursor is, and how
/// big the screen is.
struct Editor {
    buffer: Buffer,
    cursor: Cursor,
    size: Size,
    options: Options,
}

impl Editor {
    fn new(buffer: Buffer, size: Size, options: Options) -> Self {
        Self {
            buffer,
            cursor: Cursor::new(),
            size,
            options,
        }
    }

    fn navigate(&mut self, key: NavKey) {
        match key {
            NavKey::Home => self.cursor.jump_home(),
            NavKey::End => self.cursor.jump_end(self.size),
            NavKey::PageUp => self.cursor.page_move(Direction::Up, self.size),
            NavKey::PageDown => self.cursor.page_move(Direction::Down, self.size),
            NavKey::Delete => {}
            arrow => {
                if let Some(dir) = Direction::from_nav(arrow) {
                    self.cursor.move_in(dir, self.size);
                }
            }
        }
    }
}

impl App for Editor {
    fn on_key(&mut self, key: Key) -> Action {
        if key == Key::from_byte(self.options.quit_key) {
            return Action::Quit;
        }
        if let Key::Nav(nav) = key {
            self.navigate(nav);
        }
        Action::Continue
    }

    fn on_resize(&mut self, size: Size) {
        self.size = size;
        self.cursor.clamp_to(size);
    }

    fn paint(&mut self, frame: &mut Frame) {
        view::draw_rows(frame, &self.buffer, self.size, &self.options);
    }

    fn cursor(&self) -> (u16, u16) {
        (self.cursor.x, self.cursor.y)
    }
}

// ─── Startup ────────────────────────────────────────────────────────────────

/// Route `log` output to `path`, filtered by `KILO_LOG` (default `debug`).
fn init_logging(path: &Path) -> Result<(), Fatal> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Fatal::LogFile {
            path: path.to_path_buf(),
            source,
        })?;
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("KILO_LOG", "debug"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .init();
    Ok(())
}

fn load_buffer(path: Option<&Path>) -> Result<Buffer, Fatal> {
    let Some(path) = path else {
        return Ok(Buffer::new());
    };
    Buffer::from_file(path).map_err(Fatal::Open)
}

fn run(cli: &Cli) -> Result<Exit, Fatal> {
    // Load before raw mode so a bad path never touches the terminal state.
    let buffer = load_buffer(cli.file.as_deref())?;
    match buffer.path() {
        Some(path) => info!("viewing {}", path.display()),
        None => info!("no file, showing the welcome screen"),
    }

    let mut event_loop = EventLoop::new(LoopConfig {
        read_timeout_ds: cli.read_timeout,
    })?;
    let mut editor = Editor::new(buffer, event_loop.size(), Options::default());
    Ok(event_loop.run(&mut editor)?)
}

/// Wipe whatever is on screen so the error message starts at the top.
fn clear_for_error() {
    let mut stdout = io::stdout().lock();
    let _ = ansi::clear_screen(&mut stdout);
    let _ = ansi::cursor_home(&mut stdout);
    let _ = stdout.flush();
}

fn main() {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        if let Err(e) = init_logging(path) {
            eprintln!("kilo: {e}");
            process::exit(1);
        }
    }
    debug!("starting with {cli:?}");

    match run(&cli) {
        Ok(exit) => {
            info!("exit: {exit:?}");
            process::exit(exit.code());
        }
        Err(e) => {
            error!("{e}");
            clear_for_error();
            eprintln!("kilo: {e}");
            process::exit(1);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
