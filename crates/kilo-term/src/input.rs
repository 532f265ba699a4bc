// SPDX-License-Identifier: MIT
//
// Key decoder.
//
// Turns raw bytes into logical keys. The decoder pulls one byte at a time
// from a `ByteSource` and only understands what a plain VT100-ish terminal
// sends in raw mode without any extended protocols:
//
// - single bytes: printable characters and control characters
// - CSI letter forms: `ESC [ A..D`, `ESC [ H`, `ESC [ F`
// - CSI tilde forms:  `ESC [ 1..8 ~`
// - SS3 forms:        `ESC O H`, `ESC O F`
//
// # Design
//
// Unlike a chunk-fed parser, this decoder reads exactly as many bytes as a
// sequence needs, and relies on the source's read timeout to tell a lone
// Escape keypress from the start of a sequence: if the byte after ESC does
// not arrive within one timeout, the ESC was a keypress.
//
// Decoding never fails because of what the bytes say. Anything it does not
// recognise comes out as a literal ESC character; bytes read while trying
// to complete the sequence are dropped.

use std::io;

use log::trace;

use crate::ansi::ESC;
use crate::error::TermError;

// ─── Key Types ──────────────────────────────────────────────────────────────

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A byte that is neither a control character nor part of a sequence.
    /// Also used for a lone or unrecognised ESC.
    Char(u8),
    /// A control byte: below 0x20, or DEL (0x7F).
    Control(u8),
    /// A navigation key decoded from an escape sequence.
    Nav(NavKey),
}

/// Named keys that arrive as escape sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
}

impl Key {
    /// Classify a single byte that is not the start of an escape sequence.
    #[inline]
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        if is_control(byte) {
            Self::Control(byte)
        } else {
            Self::Char(byte)
        }
    }
}

/// The byte Ctrl+`key` produces: the key with its top three bits cleared.
#[inline]
#[must_use]
pub const fn ctrl_key(key: u8) -> u8 {
    key & 0x1F
}

/// Control bytes are C0 (below space) plus DEL.
#[inline]
#[must_use]
pub const fn is_control(byte: u8) -> bool {
    byte < 0x20 || byte == 0x7F
}

// ─── Byte Sources ───────────────────────────────────────────────────────────

/// Where the decoder gets its bytes.
///
/// `Ok(None)` means no byte arrived within the source's timeout. That is
/// the normal idle state, not an error.
pub trait ByteSource {
    /// Read at most one byte.
    ///
    /// # Errors
    ///
    /// Any I/O error the source can't classify as "no data yet".
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Replay a fixed byte slice. An exhausted slice behaves like a timeout.
impl ByteSource for &[u8] {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.split_first() {
            Some((&byte, rest)) => {
                *self = rest;
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Where the decoder is inside a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between keys.
    Idle,
    /// Read ESC, waiting for the introducer.
    EscapeSeen,
    /// Read `ESC [`, waiting for a letter or digit.
    Csi,
    /// Read `ESC [ <digit>`, waiting for `~`.
    CsiDigit(u8),
    /// Read `ESC O`, waiting for a letter.
    Ss3,
}

/// What one decoder step produced.
enum Step {
    /// Keep going in this state.
    Next(State),
    /// A key is complete.
    Emit(Key),
}

/// Byte-stream → [`Key`] decoder.
///
/// # Example
///
/// ```
/// use kilo_term::input::{Key, KeyDecoder, NavKey};
///
/// let mut decoder = KeyDecoder::new(&b"\x1b[Ax"[..]);
/// assert_eq!(decoder.poll_key()?, Some(Key::Nav(NavKey::Up)));
/// assert_eq!(decoder.poll_key()?, Some(Key::Char(b'x')));
/// assert_eq!(decoder.poll_key()?, None);
/// # Ok::<(), kilo_term::TermError>(())
/// ```
pub struct KeyDecoder<S> {
    source: S,
}

impl<S: ByteSource> KeyDecoder<S> {
    /// Wrap a byte source.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Borrow the underlying source (e.g. to reuse it for a size probe).
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Decode one key, or return `Ok(None)` if the source timed out before
    /// the first byte of a key arrived.
    ///
    /// Once the first byte is in, the rest of the key is decoded in this
    /// call. A timeout inside a sequence yields a literal ESC.
    ///
    /// # Errors
    ///
    /// [`TermError::Read`] for non-transient source failures.
    pub fn poll_key(&mut self) -> Result<Option<Key>, TermError> {
        let mut state = State::Idle;
        loop {
            let Some(byte) = self.next_byte()? else {
                if state == State::Idle {
                    return Ok(None);
                }
                trace!("sequence timed out in {state:?}");
                return Ok(Some(Key::Char(ESC)));
            };

            match step(state, byte) {
                Step::Next(next) => state = next,
                Step::Emit(key) => {
                    trace!("decoded {key:?}");
                    return Ok(Some(key));
                }
            }
        }
    }

    /// One byte from the source, with transient errors folded into
    /// "no data yet".
    fn next_byte(&mut self) -> Result<Option<u8>, TermError> {
        match self.source.read_byte() {
            Ok(byte) => Ok(byte),
            Err(e) if is_transient(&e) => Ok(None),
            Err(e) => Err(TermError::Read(e)),
        }
    }
}

/// Errors that just mean "try again".
#[must_use]
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Advance the state machine by one byte.
const fn step(state: State, byte: u8) -> Step {
    match state {
        State::Idle => {
            if byte == ESC {
                Step::Next(State::EscapeSeen)
            } else {
                Step::Emit(Key::from_byte(byte))
            }
        }
        State::EscapeSeen => match byte {
            b'[' => Step::Next(State::Csi),
            b'O' => Step::Next(State::Ss3),
            _ => Step::Emit(Key::Char(ESC)),
        },
        State::Csi => match byte {
            b'0'..=b'9' => Step::Next(State::CsiDigit(byte)),
            b'A' => Step::Emit(Key::Nav(NavKey::Up)),
            b'B' => Step::Emit(Key::Nav(NavKey::Down)),
            b'C' => Step::Emit(Key::Nav(NavKey::Right)),
            b'D' => Step::Emit(Key::Nav(NavKey::Left)),
            b'H' => Step::Emit(Key::Nav(NavKey::Home)),
            b'F' => Step::Emit(Key::Nav(NavKey::End)),
            _ => Step::Emit(Key::Char(ESC)),
        },
        State::CsiDigit(digit) => {
            if byte != b'~' {
                return Step::Emit(Key::Char(ESC));
            }
            match digit {
                b'1' | b'7' => Step::Emit(Key::Nav(NavKey::Home)),
                b'3' => Step::Emit(Key::Nav(NavKey::Delete)),
                b'4' | b'8' => Step::Emit(Key::Nav(NavKey::End)),
                b'5' => Step::Emit(Key::Nav(NavKey::PageUp)),
                b'6' => Step::Emit(Key::Nav(NavKey::PageDown)),
                _ => Step::Emit(Key::Char(ESC)),
            }
        }
        State::Ss3 => match byte {
            b'H' => Step::Emit(Key::Nav(NavKey::Home)),
            b'F' => Step::Emit(Key::Nav(NavKey::End)),
            _ => Step::Emit(Key::Char(ESC)),
        },
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Helpers ───────────────────────────────────────────────────────

    /// Decode every key in `bytes`.
    fn decode_all(bytes: &[u8]) -> Vec<Key> {
        let mut decoder = KeyDecoder::new(bytes);
        let mut keys = Vec::new();
        while let Some(key) = decoder.poll_key().unwrap() {
            keys.push(key);
        }
        keys
    }

    /// Decode exactly one key and assert nothing follows.
    fn decode_one(bytes: &[u8]) -> Key {
        let keys = decode_all(bytes);
        assert_eq!(keys.len(), 1, "expected one key from {bytes:?}, got {keys:?}");
        keys[0]
    }

    const fn nav(k: NavKey) -> Key {
        Key::Nav(k)
    }

    /// Source that yields scripted results, then times out.
    struct Script(Vec<io::Result<Option<u8>>>);

    impl ByteSource for Script {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            if self.0.is_empty() {
                Ok(None)
            } else {
                self.0.remove(0)
            }
        }
    }

    // ── Single bytes ──────────────────────────────────────────────────

    #[test]
    fn printable_ascii() {
        assert_eq!(decode_one(b"a"), Key::Char(b'a'));
        assert_eq!(decode_one(b" "), Key::Char(b' '));
        assert_eq!(decode_one(b"~"), Key::Char(b'~'));
    }

    #[test]
    fn control_boundaries() {
        assert_eq!(decode_one(&[0x00]), Key::Control(0x00));
        assert_eq!(decode_one(&[0x1F]), Key::Control(0x1F));
        assert_eq!(decode_one(&[0x20]), Key::Char(0x20));
        assert_eq!(decode_one(&[0x7E]), Key::Char(0x7E));
        assert_eq!(decode_one(&[0x7F]), Key::Control(0x7F));
    }

    #[test]
    fn high_bytes_are_chars() {
        assert_eq!(decode_one(&[0x80]), Key::Char(0x80));
        assert_eq!(decode_one(&[0xFF]), Key::Char(0xFF));
    }

    #[test]
    fn ctrl_q_is_control() {
        assert_eq!(decode_one(&[ctrl_key(b'q')]), Key::Control(0x11));
    }

    #[test]
    fn ctrl_key_ignores_case() {
        assert_eq!(ctrl_key(b'q'), ctrl_key(b'Q'));
    }

    #[test]
    fn one_key_per_byte() {
        assert_eq!(
            decode_all(b"hi\r"),
            vec![Key::Char(b'h'), Key::Char(b'i'), Key::Control(b'\r')]
        );
    }

    // ── CSI letters ───────────────────────────────────────────────────

    #[test]
    fn arrows() {
        assert_eq!(decode_one(b"\x1b[A"), nav(NavKey::Up));
        assert_eq!(decode_one(b"\x1b[B"), nav(NavKey::Down));
        assert_eq!(decode_one(b"\x1b[C"), nav(NavKey::Right));
        assert_eq!(decode_one(b"\x1b[D"), nav(NavKey::Left));
    }

    #[test]
    fn csi_home_end() {
        assert_eq!(decode_one(b"\x1b[H"), nav(NavKey::Home));
        assert_eq!(decode_one(b"\x1b[F"), nav(NavKey::End));
    }

    #[test]
    fn csi_unknown_letter_is_escape() {
        assert_eq!(decode_one(b"\x1b[Z"), Key::Char(ESC));
    }

    // ── CSI tilde ─────────────────────────────────────────────────────

    #[test]
    fn tilde_keys() {
        assert_eq!(decode_one(b"\x1b[1~"), nav(NavKey::Home));
        assert_eq!(decode_one(b"\x1b[3~"), nav(NavKey::Delete));
        assert_eq!(decode_one(b"\x1b[4~"), nav(NavKey::End));
        assert_eq!(decode_one(b"\x1b[5~"), nav(NavKey::PageUp));
        assert_eq!(decode_one(b"\x1b[6~"), nav(NavKey::PageDown));
        assert_eq!(decode_one(b"\x1b[7~"), nav(NavKey::Home));
        assert_eq!(decode_one(b"\x1b[8~"), nav(NavKey::End));
    }

    #[test]
    fn tilde_unmapped_digit_is_escape() {
        assert_eq!(decode_one(b"\x1b[2~"), Key::Char(ESC));
        assert_eq!(decode_one(b"\x1b[9~"), Key::Char(ESC));
    }

    #[test]
    fn tilde_wrong_terminator_is_escape() {
        // The mismatched byte is consumed along with the sequence.
        assert_eq!(decode_all(b"\x1b[3xq"), vec![Key::Char(ESC), Key::Char(b'q')]);
    }

    #[test]
    fn tilde_missing_terminator_is_escape() {
        assert_eq!(decode_one(b"\x1b[5"), Key::Char(ESC));
    }

    // ── SS3 ───────────────────────────────────────────────────────────

    #[test]
    fn ss3_home_end() {
        assert_eq!(decode_one(b"\x1bOH"), nav(NavKey::Home));
        assert_eq!(decode_one(b"\x1bOF"), nav(NavKey::End));
    }

    #[test]
    fn ss3_other_is_escape() {
        assert_eq!(decode_one(b"\x1bOP"), Key::Char(ESC));
    }

    // ── Lone / broken escapes ─────────────────────────────────────────

    #[test]
    fn lone_escape() {
        assert_eq!(decode_one(b"\x1b"), Key::Char(ESC));
    }

    #[test]
    fn escape_then_timeout_after_introducer() {
        assert_eq!(decode_one(b"\x1b["), Key::Char(ESC));
        assert_eq!(decode_one(b"\x1bO"), Key::Char(ESC));
    }

    #[test]
    fn escape_unknown_introducer() {
        assert_eq!(decode_one(b"\x1bx"), Key::Char(ESC));
    }

    #[test]
    fn keys_after_sequence_continue() {
        assert_eq!(
            decode_all(b"\x1b[Aa\x1b[6~b"),
            vec![
                nav(NavKey::Up),
                Key::Char(b'a'),
                nav(NavKey::PageDown),
                Key::Char(b'b'),
            ]
        );
    }

    #[test]
    fn timeout_mid_sequence_then_more_input() {
        let mut decoder = KeyDecoder::new(Script(vec![
            Ok(Some(ESC)),
            Ok(None),
            Ok(Some(b'z')),
        ]));
        assert_eq!(decoder.poll_key().unwrap(), Some(Key::Char(ESC)));
        assert_eq!(decoder.poll_key().unwrap(), Some(Key::Char(b'z')));
    }

    // ── Source errors ─────────────────────────────────────────────────

    #[test]
    fn idle_timeout_is_none() {
        let mut decoder = KeyDecoder::new(&b""[..]);
        assert_eq!(decoder.poll_key().unwrap(), None);
    }

    #[test]
    fn would_block_is_idle() {
        let mut decoder = KeyDecoder::new(Script(vec![
            Err(io::ErrorKind::WouldBlock.into()),
            Ok(Some(b'k')),
        ]));
        assert_eq!(decoder.poll_key().unwrap(), None);
        assert_eq!(decoder.poll_key().unwrap(), Some(Key::Char(b'k')));
    }

    #[test]
    fn interrupted_is_idle() {
        let mut decoder =
            KeyDecoder::new(Script(vec![Err(io::ErrorKind::Interrupted.into())]));
        assert_eq!(decoder.poll_key().unwrap(), None);
    }

    #[test]
    fn hard_error_is_read_error() {
        let mut decoder = KeyDecoder::new(Script(vec![Err(io::Error::other("gone"))]));
        assert!(matches!(decoder.poll_key(), Err(TermError::Read(_))));
    }

    #[test]
    fn hard_error_mid_sequence_is_read_error() {
        let mut decoder = KeyDecoder::new(Script(vec![
            Ok(Some(ESC)),
            Ok(Some(b'[')),
            Err(io::Error::from_raw_os_error(libc::EIO)),
        ]));
        assert!(matches!(decoder.poll_key(), Err(TermError::Read(_))));
    }

    #[test]
    fn transient_classification() {
        assert!(is_transient(&io::ErrorKind::WouldBlock.into()));
        assert!(is_transient(&io::ErrorKind::Interrupted.into()));
        assert!(!is_transient(&io::ErrorKind::BrokenPipe.into()));
    }

    #[test]
    fn source_mut_reaches_remaining_bytes() {
        let mut decoder = KeyDecoder::new(&b"ab"[..]);
        decoder.poll_key().unwrap();
        assert_eq!(*decoder.source_mut(), &b"b"[..]);
    }
}
