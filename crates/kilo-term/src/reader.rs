// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Terminal byte reader: the real `ByteSource`.
//
// Reads stdin (or any fd) one byte per `read()` on the control thread.
// There is no reader thread: in raw mode the termios `VMIN=0 / VTIME=n`
// pair makes every `read()` return after at most n/10 s, with zero bytes
// if nothing was typed. That bounded wait is what lets the event loop
// notice signals and what tells a lone ESC from an escape sequence.
//
// When the fd is not a terminal there is no VTIME, and a zero-byte read
// means end of input. We report that as an error instead of spinning.

use std::io;
use std::os::unix::io::RawFd;

use crate::input::ByteSource;
use crate::terminal::is_tty;

/// Byte source backed by a raw file descriptor.
pub struct TtyReader {
    fd: RawFd,
    /// Zero-byte reads are timeouts on a tty and EOF on anything else.
    tty: bool,
}

impl TtyReader {
    /// Reader for `fd`. Does not take ownership; the fd is never closed.
    #[must_use]
    pub fn new(fd: RawFd) -> Self {
        Self { fd, tty: is_tty(fd) }
    }

    /// Reader for stdin.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }
}

impl ByteSource for TtyReader {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(self.fd, (&raw mut byte).cast::<libc::c_void>(), 1) };

        match n {
            1 => Ok(Some(byte)),
            0 if self.tty => Ok(None),
            0 => Err(io::ErrorKind::UnexpectedEof.into()),
            // EAGAIN / EINTR surface as WouldBlock / Interrupted, which the
            // decoder treats as "no data yet".
            _ => Err(io::Error::last_os_error()),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
