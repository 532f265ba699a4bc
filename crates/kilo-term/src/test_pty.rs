// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// A pseudo-terminal pair for tests that need a real tty.
//
// Opening is strict: when /dev/ptmx exists every step must succeed, so a
// broken pty setup fails the test instead of quietly skipping it. Only a
// system with no /dev/ptmx at all skips, and says so on stderr.

use std::io;
use std::os::unix::io::RawFd;
use std::path::Path;

/// Master/slave pair, closed on drop.
pub struct Pty {
    pub master: RawFd,
    pub slave: RawFd,
}

impl Pty {
    /// Open a fresh pair. `None` only when the system has no `/dev/ptmx`.
    pub fn open() -> Option<Self> {
        if !Path::new("/dev/ptmx").exists() {
            eprintln!("skipped: /dev/ptmx is not available");
            return None;
        }
        unsafe {
            let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            assert!(master >= 0, "posix_openpt: {}", io::Error::last_os_error());
            assert_eq!(libc::grantpt(master), 0, "grantpt: {}", io::Error::last_os_error());
            assert_eq!(libc::unlockpt(master), 0, "unlockpt: {}", io::Error::last_os_error());

            let mut name = [0 as libc::c_char; 128];
            assert_eq!(
                libc::ptsname_r(master, name.as_mut_ptr(), name.len()),
                0,
                "ptsname_r: {}",
                io::Error::last_os_error()
            );
            let slave = libc::open(name.as_ptr(), libc::O_RDWR | libc::O_NOCTTY);
            assert!(slave >= 0, "open slave: {}", io::Error::last_os_error());
            Some(Self { master, slave })
        }
    }

    /// Current termios of the slave side.
    pub fn termios(&self) -> libc::termios {
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        assert_eq!(unsafe { libc::tcgetattr(self.slave, &raw mut t) }, 0);
        t
    }

    /// Set the window size the slave reports through `TIOCGWINSZ`.
    pub fn set_size(&self, rows: u16, cols: u16) {
        let ws = libc::winsize {
            ws_row: rows,
            ws_col: cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        assert_eq!(
            unsafe { libc::ioctl(self.master, libc::TIOCSWINSZ, &raw const ws) },
            0
        );
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.slave);
            libc::close(self.master);
        }
    }
}
