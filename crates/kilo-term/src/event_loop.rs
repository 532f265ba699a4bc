// SPDX-License-Identifier: MIT
//
// Event loop: render, read, dispatch.
//
// The whole program runs on one thread:
//
//   1. compose a frame from the application's state and write it at once
//   2. wait for one decoded key, checking for signals every time a read
//      times out
//   3. hand the key to the application; quit or go round again
//
// One key is fully handled before the next frame is drawn. There is no
// event queue and no tick: if nothing is typed, nothing is redrawn, except
// after a resize.
//
// # Shutdown
//
// The loop ends on `Action::Quit` (exit status 0), on a termination signal
// (status 128 + signo), or on a fatal error. In all three cases the screen
// is cleared and cooked mode restored before `run` returns, so whatever the
// caller prints next lands on a usable terminal.

use std::io::Write;

use log::{debug, info};

use crate::ansi;
use crate::error::TermError;
use crate::input::{ByteSource, Key, KeyDecoder};
use crate::output::{FdWriter, Frame};
use crate::reader::TtyReader;
use crate::signals::{self, Pending};
use crate::terminal::{DEFAULT_READ_TIMEOUT_DS, Size, Terminal};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Leave the loop, clear the screen and restore the terminal.
    Quit,
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The application returned [`Action::Quit`].
    Quit,
    /// A termination signal arrived.
    Signal(i32),
}

impl Exit {
    /// Conventional process exit status.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Quit => 0,
            Self::Signal(sig) => 128 + sig,
        }
    }
}

/// Application interface for the event loop.
///
/// Each cycle the loop calls [`paint`](App::paint) then
/// [`cursor`](App::cursor) to build a frame, then
/// [`on_key`](App::on_key) with the next key.
pub trait App {
    /// Handle one decoded key.
    fn on_key(&mut self, key: Key) -> Action;

    /// The terminal was resized. Called before the next paint.
    fn on_resize(&mut self, _size: Size) {}

    /// Draw the screen body into `frame`. The frame preamble is already in
    /// place; the trailer is added by the loop.
    fn paint(&mut self, frame: &mut Frame);

    /// Where the hardware cursor goes after painting, 0-indexed `(x, y)`.
    fn cursor(&self) -> (u16, u16);
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

/// Configuration for the event loop timing.
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Read timeout in deciseconds (`VTIME`). Bounds both the idle wait
    /// between signal checks and how long a lone ESC waits for the rest of
    /// a sequence. Default: 1 (100 ms).
    pub read_timeout_ds: u8,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            read_timeout_ds: DEFAULT_READ_TIMEOUT_DS,
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// Owns the terminal, the key decoder, and the output stream. Call
/// [`run`](Self::run) to enter the loop.
///
/// # Example
///
/// ```no_run
/// use kilo_term::event_loop::{Action, App, EventLoop, LoopConfig};
/// use kilo_term::input::Key;
/// use kilo_term::output::Frame;
///
/// struct MyApp;
///
/// impl App for MyApp {
///     fn on_key(&mut self, key: Key) -> Action {
///         if key == Key::Control(0x11) { Action::Quit } else { Action::Continue }
///     }
///     fn paint(&mut self, frame: &mut Frame) {
///         frame.push_bytes(b"hello");
///         frame.end_row(true);
///     }
///     fn cursor(&self) -> (u16, u16) {
///         (0, 0)
///     }
/// }
///
/// let mut event_loop = EventLoop::new(LoopConfig::default())?;
/// let exit = event_loop.run(&mut MyApp)?;
/// std::process::exit(exit.code());
/// # Ok::<(), kilo_term::TermError>(())
/// ```
pub struct EventLoop<S = TtyReader, W = FdWriter> {
    terminal: Terminal,
    decoder: KeyDecoder<S>,
    out: W,
    frame: Frame,
    size: Size,
    signals: fn() -> Pending,
}

impl EventLoop {
    /// Take over stdin/stdout: enter raw mode, trap signals, and measure
    /// the viewport.
    ///
    /// If measuring fails the terminal handle is dropped here, which puts
    /// cooked mode back before the error reaches the caller.
    ///
    /// # Errors
    ///
    /// [`TermError::TerminalIo`] if raw mode can't be entered,
    /// [`TermError::WindowSize`] if the size can't be determined.
    pub fn new(config: LoopConfig) -> Result<Self, TermError> {
        let mut terminal = Terminal::stdio().with_read_timeout(config.read_timeout_ds);
        terminal.enter_raw_mode()?;
        signals::install_handlers();

        let mut reader = TtyReader::stdin();
        let size = terminal.query_size(&mut reader)?;
        info!("viewport {}x{}", size.cols, size.rows);

        let out = FdWriter::new(terminal.output_fd());
        Ok(Self::with_parts(terminal, reader, out, size))
    }
}

impl<S: ByteSource, W: Write> EventLoop<S, W> {
    /// Assemble a loop from explicit parts. The terminal should already be
    /// in raw mode if it is a real one.
    #[must_use]
    pub fn with_parts(terminal: Terminal, source: S, out: W, size: Size) -> Self {
        Self {
            terminal,
            decoder: KeyDecoder::new(source),
            out,
            frame: Frame::begin(),
            size,
            signals: signals::take_pending,
        }
    }

    /// Replace where pending signals are read from.
    #[must_use]
    pub fn with_signal_source(mut self, signals: fn() -> Pending) -> Self {
        self.signals = signals;
        self
    }

    /// The current viewport size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// The output stream (for inspection in tests).
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Run until the application quits or a termination signal arrives.
    ///
    /// Clears the screen and restores cooked mode on every way out,
    /// including errors.
    ///
    /// # Errors
    ///
    /// Any fatal [`TermError`] from reading, writing, or re-measuring the
    /// terminal.
    pub fn run(&mut self, app: &mut impl App) -> Result<Exit, TermError> {
        let result = self.run_inner(app);

        // Always clean up, even if the loop errored.
        let cleared = self.clear_screen();
        let restored = self.terminal.restore_mode();

        let exit = result?;
        restored?;
        cleared?;
        info!("loop finished: {exit:?}");
        Ok(exit)
    }

    /// The inner loop, separated so cleanup runs regardless of outcome.
    fn run_inner(&mut self, app: &mut impl App) -> Result<Exit, TermError> {
        loop {
            self.render(app)?;

            let key = loop {
                let pending = (self.signals)();
                if let Some(sig) = pending.exit_signal() {
                    info!("terminating on signal {sig}");
                    return Ok(Exit::Signal(sig));
                }
                if pending.contains(Pending::RESIZE) {
                    self.resize(app)?;
                    self.render(app)?;
                }
                if let Some(key) = self.decoder.poll_key()? {
                    break key;
                }
            };

            if app.on_key(key) == Action::Quit {
                debug!("quit requested");
                return Ok(Exit::Quit);
            }
        }
    }

    /// Compose one frame and write it in a single call.
    fn render(&mut self, app: &mut impl App) -> Result<(), TermError> {
        self.frame.reset();
        app.paint(&mut self.frame);
        let (x, y) = app.cursor();
        self.frame.end(x, y);
        self.frame.flush_to(&mut self.out)?;
        Ok(())
    }

    fn resize(&mut self, app: &mut impl App) -> Result<(), TermError> {
        let size = self.terminal.query_size(self.decoder.source_mut())?;
        if size != self.size {
            debug!("resized to {}x{}", size.cols, size.rows);
            self.size = size;
        }
        app.on_resize(size);
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<(), TermError> {
        ansi::clear_screen(&mut self.out)?;
        ansi::cursor_home(&mut self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
