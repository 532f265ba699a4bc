//! Editor options: the few knobs the viewer has.
//!
//! Values come from [`Options::default`]; the binary overrides nothing yet
//! beyond what its command line exposes.

use kilo_term::input::ctrl_key;

/// Display and key settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Banner shown one third of the way down an empty screen.
    pub welcome: String,
    /// Glyph drawn at the start of rows with no text.
    pub placeholder: u8,
    /// Byte that ends the session (Ctrl-Q by default).
    pub quit_key: u8,
}

impl Options {
    /// The default banner, `Kilo Editor -- Version <crate version>`.
    #[must_use]
    pub fn default_welcome() -> String {
        format!("Kilo Editor -- Version {}", env!("CARGO_PKG_VERSION"))
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            welcome: Self::default_welcome(),
            placeholder: b'|',
            quit_key: ctrl_key(b'q'),
        }
    }
}
