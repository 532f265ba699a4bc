// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, window size, RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and isatty. These are the standard
// POSIX interfaces for terminal control; there is no safe alternative.
// Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// The `Terminal` owns the one thing that must never leak: the termios
// snapshot taken before raw mode. It is put back on every way out of the
// process we control:
//
//   - `restore_mode()`: explicit, idempotent, called by the event loop on
//     quit, on signals, and before any fatal diagnostic is printed
//   - `Drop`: covers early returns and `?` propagation
//   - a panic hook: covers panics, using a global backup because the hook
//     cannot reach the struct
//
// The panic hook bypasses Rust's stdout lock and writes its restore bytes
// straight to the output fd, so a panic in the middle of a frame flush
// cannot deadlock on the lock it interrupted.

use std::io::Write;
use std::os::unix::io::RawFd;
use std::sync::{Mutex, Once};

use log::debug;

use crate::ansi;
use crate::error::TermError;
use crate::input::ByteSource;
use crate::output::FdWriter;

/// Default `VTIME`: reads give up after 100 ms without input.
pub const DEFAULT_READ_TIMEOUT_DS: u8 = 1;

/// Longest cursor position report we are willing to read.
const REPORT_MAX: usize = 31;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

impl Size {
    /// Build a size, rejecting degenerate zero-width or zero-height values.
    #[must_use]
    pub const fn new(rows: u16, cols: u16) -> Option<Self> {
        if rows == 0 || cols == 0 {
            None
        } else {
            Some(Self { rows, cols })
        }
    }

    /// The last valid column index.
    #[inline]
    #[must_use]
    pub const fn max_x(self) -> u16 {
        self.cols.saturating_sub(1)
    }

    /// The last valid row index.
    #[inline]
    #[must_use]
    pub const fn max_y(self) -> u16 {
        self.rows.saturating_sub(1)
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the size of the terminal behind `fd` via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if `fd` is not a terminal, the query fails, or the
/// terminal reports zero rows or columns.
#[must_use]
pub fn get_size(fd: RawFd) -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 {
        Size::new(ws.ws_row, ws.ws_col)
    } else {
        None
    }
}

/// Check whether `fd` is connected to a terminal.
#[must_use]
pub fn is_tty(fd: RawFd) -> bool {
    unsafe { libc::isatty(fd) != 0 }
}

/// Find the terminal size by driving the cursor into the bottom-right
/// corner and asking where it ended up.
///
/// The request goes to `out` in one write; the `ESC [ rows ; cols R` reply
/// is read from `input` until the `R`, a timeout, or [`REPORT_MAX`] bytes.
/// On very small terminals the cursor simply stops at the real corner, so
/// the reply is still the true size.
///
/// # Errors
///
/// [`TermError::WindowSize`] if the request can't be written or the reply is
/// missing, malformed, or reports a zero dimension.
pub fn probe_size(out: &mut impl Write, input: &mut impl ByteSource) -> Result<Size, TermError> {
    let mut request = Vec::with_capacity(16);
    ansi::cursor_far_corner(&mut request)?;
    ansi::request_cursor_position(&mut request)?;
    if out.write_all(&request).and_then(|()| out.flush()).is_err() {
        return Err(TermError::WindowSize);
    }

    let mut report = Vec::with_capacity(REPORT_MAX);
    while report.len() < REPORT_MAX {
        match input.read_byte() {
            Ok(Some(b'R')) | Ok(None) | Err(_) => break,
            Ok(Some(byte)) => report.push(byte),
        }
    }

    debug!("cursor probe reply: {:?}", String::from_utf8_lossy(&report));

    ansi::parse_cursor_report(&report)
        .and_then(|(rows, cols)| Size::new(rows, cols))
        .ok_or(TermError::WindowSize)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Where the panic hook finds the termios to put back.
#[derive(Clone, Copy)]
struct Backup {
    input: RawFd,
    output: RawFd,
    termios: libc::termios,
}

/// Global backup of the original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This global backup, behind a [`Mutex`] rather than `static mut`,
/// lets the hook restore cooked mode without the struct.
static TERMIOS_BACKUP: Mutex<Option<Backup>> = Mutex::new(None);

/// Clear the screen, home and show the cursor. Written raw by the panic
/// hook so the panic message lands on a clean, visible screen.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Panic hook guard: ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_from_backup();
            original(info);
        }));
    });
}

/// Best-effort restore from the global backup. Ignores errors.
fn restore_from_backup() {
    let Ok(mut guard) = TERMIOS_BACKUP.lock() else {
        return;
    };
    if let Some(backup) = guard.take() {
        unsafe {
            let _ = libc::write(
                backup.output,
                EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
                EMERGENCY_RESTORE.len(),
            );
            let _ = libc::tcsetattr(backup.input, libc::TCSAFLUSH, &raw const backup.termios);
        }
    }
}

fn set_backup(backup: Option<Backup>) {
    if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
        *guard = backup;
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Raw-mode controller with RAII cleanup.
///
/// Call [`enter_raw_mode`](Self::enter_raw_mode) to switch the input
/// terminal to raw mode. The original settings come back on
/// [`restore_mode`](Self::restore_mode), on drop, or on panic, whichever
/// happens first.
///
/// # Example
///
/// ```no_run
/// use kilo_term::terminal::Terminal;
///
/// let mut term = Terminal::stdio();
/// term.enter_raw_mode()?;
/// // ... render frames, read keys ...
/// term.restore_mode()?;
/// # Ok::<(), kilo_term::TermError>(())
/// ```
pub struct Terminal {
    /// Keyboard side: termios lives here.
    input: RawFd,
    /// Screen side: frames and size queries go here.
    output: RawFd,
    /// `VTIME` in deciseconds.
    read_timeout_ds: u8,
    /// Original termios saved before entering raw mode.
    original_termios: Option<libc::termios>,
}

impl Terminal {
    /// Handle for an explicit pair of descriptors. Touches nothing yet.
    #[must_use]
    pub const fn new(input: RawFd, output: RawFd) -> Self {
        Self {
            input,
            output,
            read_timeout_ds: DEFAULT_READ_TIMEOUT_DS,
            original_termios: None,
        }
    }

    /// Handle for stdin/stdout.
    #[must_use]
    pub const fn stdio() -> Self {
        Self::new(libc::STDIN_FILENO, libc::STDOUT_FILENO)
    }

    /// Use a different read timeout (deciseconds, clamped to at least 1).
    #[must_use]
    pub fn with_read_timeout(mut self, deciseconds: u8) -> Self {
        self.read_timeout_ds = deciseconds.max(1);
        self
    }

    /// The input file descriptor.
    #[inline]
    #[must_use]
    pub const fn input_fd(&self) -> RawFd {
        self.input
    }

    /// The output file descriptor.
    #[inline]
    #[must_use]
    pub const fn output_fd(&self) -> RawFd {
        self.output
    }

    /// Whether raw mode is currently active.
    #[inline]
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.original_termios.is_some()
    }

    /// Switch the input terminal to raw mode.
    ///
    /// Saves the current attributes, then turns off canonical mode, echo,
    /// signal keys, `IEXTEN`, software flow control, CR→NL translation,
    /// output post-processing, and forces 8-bit characters. Reads return
    /// as soon as a byte is available, or after the read timeout with
    /// nothing.
    ///
    /// Idempotent: calling it while already raw is a no-op.
    ///
    /// # Errors
    ///
    /// [`TermError::TerminalIo`] naming `tcgetattr` or `tcsetattr`.
    pub fn enter_raw_mode(&mut self) -> Result<(), TermError> {
        if self.is_raw() {
            return Ok(());
        }

        install_panic_hook();

        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(self.input, &raw mut termios) } != 0 {
            return Err(TermError::last_os("tcgetattr"));
        }
        let original = termios;

        termios.c_iflag &=
            !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        termios.c_oflag &= !libc::OPOST;
        termios.c_cflag |= libc::CS8;
        termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

        // VMIN=0, VTIME=n: read() returns what's there, or nothing after n/10 s.
        termios.c_cc[libc::VMIN] = 0;
        termios.c_cc[libc::VTIME] = self.read_timeout_ds;

        // Publish the backup first so a panic between here and the
        // tcsetattr below still has something to restore.
        set_backup(Some(Backup {
            input: self.input,
            output: self.output,
            termios: original,
        }));

        if unsafe { libc::tcsetattr(self.input, libc::TCSAFLUSH, &raw const termios) } != 0 {
            let err = TermError::last_os("tcsetattr");
            set_backup(None);
            return Err(err);
        }

        self.original_termios = Some(original);
        debug!(
            "raw mode on fd {} (VTIME={})",
            self.input, self.read_timeout_ds
        );
        Ok(())
    }

    /// Put the saved terminal attributes back.
    ///
    /// Idempotent: after the first successful call (or without a prior
    /// [`enter_raw_mode`](Self::enter_raw_mode)) this does nothing and
    /// returns `Ok`.
    ///
    /// # Errors
    ///
    /// [`TermError::TerminalIo`] naming `tcsetattr`. The saved state is
    /// dropped either way; there is no retry.
    pub fn restore_mode(&mut self) -> Result<(), TermError> {
        let Some(original) = self.original_termios.take() else {
            return Ok(());
        };
        set_backup(None);

        if unsafe { libc::tcsetattr(self.input, libc::TCSAFLUSH, &raw const original) } != 0 {
            return Err(TermError::last_os("tcsetattr"));
        }

        debug!("cooked mode restored on fd {}", self.input);
        Ok(())
    }

    /// Current viewport size.
    ///
    /// Prefers `TIOCGWINSZ` on the output fd; falls back to
    /// [`probe_size`] when that fails or reports a zero dimension. The
    /// probe's reply is read from `input`, so raw mode should be on.
    ///
    /// # Errors
    ///
    /// [`TermError::WindowSize`] if both methods fail.
    pub fn query_size(&self, input: &mut impl ByteSource) -> Result<Size, TermError> {
        if let Some(size) = get_size(self.output) {
            debug!("TIOCGWINSZ: {}x{}", size.cols, size.rows);
            return Ok(size);
        }

        debug!("TIOCGWINSZ unavailable, probing cursor position");
        probe_size(&mut FdWriter::new(self.output), input)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.restore_mode();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
