//! Line store: the text the viewport shows.
//!
//! Rendering only needs to read lines, so it is written against the
//! [`LineStore`] trait: how many lines there are, and the bytes of each.
//! [`Buffer`] is the concrete store: a file split into byte lines.
//!
//! # Design choices
//!
//! - **Bytes, not chars.** Lines are `Vec<u8>` and lengths are byte counts.
//!   Rendering truncates at a byte column, so a multi-byte UTF-8 character
//!   at the edge can be cut.
//!
//! - **Line endings are stripped on load.** Trailing `\n` and `\r` bytes are
//!   removed from every line, so `\r\n` files display like `\n` files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

/// Read access to an ordered sequence of text lines.
pub trait LineStore {
    /// Number of lines.
    fn line_count(&self) -> usize;

    /// Bytes of line `idx`, without its line ending. `None` past the end.
    fn line(&self, idx: usize) -> Option<&[u8]>;

    /// Byte length of line `idx`, or `None` past the end.
    fn line_len(&self, idx: usize) -> Option<usize> {
        self.line(idx).map(<[u8]>::len)
    }

    /// True when there are no lines at all.
    fn is_empty(&self) -> bool {
        self.line_count() == 0
    }
}

/// A file's contents as byte lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    lines: Vec<Vec<u8>>,
    path: Option<PathBuf>,
}

impl Buffer {
    /// An empty buffer with no backing file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `bytes` into lines.
    ///
    /// A trailing newline does not start an extra empty line, and empty
    /// input has no lines at all.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        let lines = if bytes.is_empty() {
            Vec::new()
        } else {
            body.split(|&b| b == b'\n').map(trim_line_ending).collect()
        };
        Self { lines, path: None }
    }

    /// Load a buffer from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let mut buffer = Self::from_bytes(&bytes);
        buffer.path = Some(path.to_path_buf());
        debug!(
            "loaded {} lines ({} bytes) from {}",
            buffer.lines.len(),
            bytes.len(),
            path.display()
        );
        Ok(buffer)
    }

    /// The file this buffer was loaded from.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl LineStore for Buffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, idx: usize) -> Option<&[u8]> {
        self.lines.get(idx).map(Vec::as_slice)
    }
}

/// Drop any trailing `\r` / `\n` bytes.
fn trim_line_ending(line: &[u8]) -> Vec<u8> {
    let end = line
        .iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |i| i + 1);
    line[..end].to_vec()
}
