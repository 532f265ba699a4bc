// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write VT100 sequences to any `impl Write`. No state,
// no decisions about when to emit; the frame compositor makes those.
// This module only knows the byte-level encoding of each command.
//
// Cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (CUP is 1-based).
use std::io::{self, Write};

/// The escape byte that starts every sequence, in both directions.
pub const ESC: u8 = 0x1B;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Move the cursor to the top-left corner (CUP with no parameters).
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Push the cursor as far right and down as the terminal allows.
///
/// CUF/CUD stop at the screen edge, so 999 lands on the bottom-right cell
/// of any realistic terminal without wrapping or scrolling.
#[inline]
pub fn cursor_far_corner(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[999C\x1b[999B")
}

/// Ask the terminal where the cursor is (DSR 6).
///
/// The answer arrives on the *input* stream as `ESC [ rows ; cols R`.
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[6n")
}

/// Parse a cursor position report `ESC [ rows ; cols R`.
///
/// The trailing `R` is optional since callers stop reading at it. Returns
/// `(rows, cols)` as reported (1-based), or `None` if the bytes are not a
/// well-formed report.
#[must_use]
pub fn parse_cursor_report(report: &[u8]) -> Option<(u16, u16)> {
    let body = report.strip_prefix(b"\x1b[")?;
    let body = body.strip_suffix(b"R").unwrap_or(body);
    let text = std::str::from_utf8(body).ok()?;
    let (rows, cols) = text.split_once(';')?;
    Some((rows.parse().ok()?, cols.parse().ok()?))
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Clear from the cursor to the end of the current line (EL 0).
#[inline]
pub fn clear_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

/// Row separator. With `OPOST` off the terminal no longer turns `\n` into
/// `\r\n`, so we send both.
#[inline]
pub fn newline(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\r\n")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
