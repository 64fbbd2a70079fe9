//! Real-time scheduling for the refresh thread
//!
//! Any scheduling hiccup on the refresh thread shows up as a visible flicker,
//! so the daemon moves that thread into the `SCHED_FIFO` class. This needs
//! `CAP_SYS_NICE` (or root); callers treat failure as non-fatal.

use std::io;

/// Move the calling thread to `SCHED_FIFO` at `priority` (1-99)
#[allow(unsafe_code)]
pub fn promote_current_thread(priority: i32) -> io::Result<()> {
    // SAFETY: sched_param is plain data; all-zero is a valid value and the
    // priority field is set before use.
    let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
    param.sched_priority = priority;

    // SAFETY: pthread_self() is always a valid handle for the calling thread
    // and `param` outlives the call.
    let rc = unsafe { libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param) };
    if rc != 0 {
        return Err(io::Error::from_raw_os_error(rc));
    }

    Ok(())
}
