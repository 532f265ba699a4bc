// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Signal trapping.
//
// Handlers do the only thing that is async-signal-safe: set a bit in an
// atomic. The event loop drains the bits between reads, on the same thread
// that owns the terminal, so resizes and termination requests go through
// exactly the same code paths as keys.
//
// SIGWINCH is installed with SA_RESTART (a resize should not disturb a
// read in progress). The termination signals are not, so a blocked read
// comes back with EINTR and the loop reacts without waiting out VTIME.

use std::sync::atomic::{AtomicU8, Ordering};

use bitflags::bitflags;
use log::debug;

bitflags! {
    /// Signals received since the last [`take_pending`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pending: u8 {
        /// SIGWINCH: terminal resized.
        const RESIZE    = 0b0000_0001;
        /// SIGINT.
        const INTERRUPT = 0b0000_0010;
        /// SIGTERM.
        const TERMINATE = 0b0000_0100;
        /// SIGHUP: the terminal went away.
        const HANGUP    = 0b0000_1000;
    }
}

impl Pending {
    /// The signal number that should end the process, if any.
    ///
    /// Checked in severity order: hangup, terminate, interrupt.
    #[must_use]
    pub const fn exit_signal(self) -> Option<i32> {
        if self.contains(Self::HANGUP) {
            Some(libc::SIGHUP)
        } else if self.contains(Self::TERMINATE) {
            Some(libc::SIGTERM)
        } else if self.contains(Self::INTERRUPT) {
            Some(libc::SIGINT)
        } else {
            None
        }
    }
}

/// Bits set by the handlers.
static PENDING: AtomicU8 = AtomicU8::new(0);

/// Take and clear everything received so far.
#[must_use]
pub fn take_pending() -> Pending {
    Pending::from_bits_truncate(PENDING.swap(0, Ordering::Relaxed))
}

/// Mark a signal as received. Used by the handlers; public so tests and
/// embedders can inject events.
pub fn raise(flags: Pending) {
    PENDING.fetch_or(flags.bits(), Ordering::Relaxed);
}

extern "C" fn handler(sig: libc::c_int) {
    let flag = match sig {
        libc::SIGWINCH => Pending::RESIZE,
        libc::SIGINT => Pending::INTERRUPT,
        libc::SIGTERM => Pending::TERMINATE,
        libc::SIGHUP => Pending::HANGUP,
        _ => return,
    };
    PENDING.fetch_or(flag.bits(), Ordering::Relaxed);
}

fn install(sig: libc::c_int, flags: libc::c_int) {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = handler as *const () as usize;
        sa.sa_flags = flags;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(sig, &raw const sa, std::ptr::null_mut());
    }
}

/// Install handlers for SIGWINCH, SIGINT, SIGTERM and SIGHUP.
pub fn install_handlers() {
    install(libc::SIGWINCH, libc::SA_RESTART);
    install(libc::SIGINT, 0);
    install(libc::SIGTERM, 0);
    install(libc::SIGHUP, 0);
    debug!("signal handlers installed");
}

#[cfg(test)]
mod tests {
    use super::*;

    // The PENDING atomic is process-global, so every assertion that drains
    // it lives in one test to stay independent of test ordering.
    #[test]
    fn raise_and_take() {
        let _ = take_pending();

        raise(Pending::RESIZE);
        raise(Pending::INTERRUPT);
        let got = take_pending();
        assert!(got.contains(Pending::RESIZE | Pending::INTERRUPT));
        assert!(take_pending().is_empty());

        // The handler itself, called directly.
        handler(libc::SIGWINCH);
        handler(libc::SIGUSR1);
        assert_eq!(take_pending(), Pending::RESIZE);
    }

    #[test]
    fn exit_signal_priority() {
        assert_eq!(Pending::RESIZE.exit_signal(), None);
        assert_eq!(Pending::empty().exit_signal(), None);
        assert_eq!(Pending::INTERRUPT.exit_signal(), Some(libc::SIGINT));
        assert_eq!(
            (Pending::INTERRUPT | Pending::TERMINATE).exit_signal(),
            Some(libc::SIGTERM)
        );
        assert_eq!(
            (Pending::RESIZE | Pending::HANGUP | Pending::INTERRUPT).exit_signal(),
            Some(libc::SIGHUP)
        );
    }

    #[test]
    fn from_bits_truncate_drops_unknown() {
        assert_eq!(Pending::from_bits_truncate(0xF0), Pending::empty());
    }
}
