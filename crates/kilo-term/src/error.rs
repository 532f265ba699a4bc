// SPDX-License-Identifier: MIT
//
// Error taxonomy for the terminal core.
//
// Every variant is fatal: the editor restores cooked mode, prints the
// error, and exits. The only non-fatal condition, a read that returns no
// data before the timeout, never becomes an error at all.

use std::io;

use thiserror::Error;

/// A fatal terminal failure.
#[derive(Debug, Error)]
pub enum TermError {
    /// Getting or setting terminal attributes failed.
    ///
    /// `op` names the failing call (`tcgetattr`, `tcsetattr`) so the
    /// diagnostic reads like `tcsetattr: Inappropriate ioctl for device`.
    #[error("{op}: {source}")]
    TerminalIo {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Reading from the input stream failed for a reason other than
    /// "no data yet".
    #[error("read: {0}")]
    Read(#[source] io::Error),

    /// Neither `TIOCGWINSZ` nor the cursor-position probe produced a size.
    #[error("window size: neither TIOCGWINSZ nor the cursor probe answered")]
    WindowSize,

    /// Writing a frame or control sequence to the output stream failed.
    #[error("write: {0}")]
    Output(#[from] io::Error),
}

impl TermError {
    /// Wrap the current `errno` as a [`TermError::TerminalIo`] for `op`.
    #[must_use]
    pub fn last_os(op: &'static str) -> Self {
        Self::TerminalIo {
            op,
            source: io::Error::last_os_error(),
        }
    }
}
