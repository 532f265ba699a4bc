// SPDX-License-Identifier: MIT
//
// kilo-term: terminal core for kilo.
//
// Everything between the editor and the tty lives here: raw mode via
// termios, a byte-at-a-time key decoder that understands the handful of
// VT100 navigation sequences we care about, and a frame buffer that turns
// each redraw into exactly one write.
//
// The terminal is driven directly through ANSI escape sequences and libc.
// No TUI framework sits in between.

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod reader;
pub mod signals;
pub mod terminal;

#[cfg(all(test, target_os = "linux"))]
mod test_pty;

pub use error::TermError;
