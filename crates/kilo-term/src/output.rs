// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Output buffering and frame composition.
//
//   OutputBuffer: accumulates ANSI bytes in memory so a whole frame can be
//   written with a single write call.
//
//   Frame: the refresh protocol on top of it: hide the cursor and home it,
//   let the caller draw rows, put the cursor back and show it, then hand the
//   whole thing to the terminal at once. The terminal only ever sees a
//   complete frame, so there is no tearing and no cursor flicker.
//
//   FdWriter: `io::Write` over a borrowed raw fd, for the few places that
//   need to write somewhere other than the locked stdout.

use std::io::{self, Write};
use std::os::unix::io::RawFd;

use crate::ansi;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates ANSI output for a single write.
///
/// Default capacity: 16 KB, enough for most frames without reallocation.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes.
    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append one byte `n` times.
    #[inline]
    pub fn push_repeated(&mut self, byte: u8, n: usize) {
        self.buf.resize(self.buf.len() + n, byte);
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w` in one call and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. The buffer is cleared
    /// either way so a failed frame is never half-resent.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        let result = if self.buf.is_empty() {
            Ok(())
        } else {
            w.write_all(&self.buf).and_then(|()| w.flush())
        };
        self.buf.clear();
        result
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Frame ───────────────────────────────────────────────────────────────────

/// One screen refresh, built in memory and written at once.
///
/// ```
/// use kilo_term::output::Frame;
///
/// let mut frame = Frame::begin();
/// frame.push_bytes(b"hello");
/// frame.end(5, 0);
/// let mut screen = Vec::new();
/// frame.flush_to(&mut screen)?;
/// assert_eq!(screen, b"\x1b[?25l\x1b[Hhello\x1b[1;6H\x1b[?25h");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Frame {
    out: OutputBuffer,
}

impl Frame {
    /// Start a frame: hide the cursor, then home it.
    #[must_use]
    pub fn begin() -> Self {
        let mut frame = Self {
            out: OutputBuffer::new(),
        };
        frame.reset();
        frame
    }

    /// Throw away anything drawn so far and start over with the frame
    /// preamble. Keeps the allocation.
    pub fn reset(&mut self) {
        self.out.clear();
        // Writes into a Vec cannot fail.
        let _ = ansi::cursor_hide(&mut self.out);
        let _ = ansi::cursor_home(&mut self.out);
    }

    /// Append raw row content.
    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.out.push_bytes(bytes);
    }

    /// Append `n` copies of `byte` (banner padding).
    #[inline]
    pub fn push_repeated(&mut self, byte: u8, n: usize) {
        self.out.push_repeated(byte, n);
    }

    /// Finish the current row: erase whatever the previous frame left to
    /// the right of it, and move to the next row unless this is the last.
    pub fn end_row(&mut self, last: bool) {
        let _ = ansi::clear_line(&mut self.out);
        if !last {
            let _ = ansi::newline(&mut self.out);
        }
    }

    /// Close the frame: place the cursor at `(x, y)` (0-indexed) and show it.
    pub fn end(&mut self, x: u16, y: u16) {
        let _ = ansi::cursor_to(&mut self.out, x, y);
        let _ = ansi::cursor_show(&mut self.out);
    }

    /// Bytes composed so far.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.out.as_bytes()
    }

    /// Write the whole frame to `w` in one call, then empty the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.out.flush_to(w)
    }
}

// ─── FdWriter ────────────────────────────────────────────────────────────────

/// `io::Write` over a borrowed file descriptor. Never closes it.
pub struct FdWriter {
    fd: RawFd,
}

impl FdWriter {
    #[must_use]
    pub const fn new(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.fd, buf.as_ptr().cast::<libc::c_void>(), buf.len()) };
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
