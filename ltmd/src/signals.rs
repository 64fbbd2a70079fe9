//! Shutdown on SIGINT and SIGTERM
//!
//! The handler only raises a flag; the refresh loops poll it between groups
//! and leave the display reset and its pins released.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn request_shutdown(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Release);
}

/// Install the handlers and return the flag they raise
#[allow(unsafe_code)]
pub fn install() -> io::Result<&'static AtomicBool> {
    let handler = request_shutdown as extern "C" fn(libc::c_int) as libc::sighandler_t;

    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is
        // async-signal-safe.
        let previous = unsafe { libc::signal(signal, handler) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(&SHUTDOWN)
}
