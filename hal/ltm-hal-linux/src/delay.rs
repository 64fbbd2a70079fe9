//! Host delay primitive
//!
//! The kernel's sleep granularity is far coarser than the sub-microsecond
//! holds the wire protocol needs, so short delays spin on the monotonic
//! clock. Long delays sleep, and keep sleeping after an early wake-up until
//! the full time has passed.

use std::hint;
use std::thread;
use std::time::{Duration, Instant};

use ltm_hal::DelayNs;

/// Delays shorter than this busy-wait
pub const SPIN_THRESHOLD: Duration = Duration::from_micros(100);

/// Spin-or-sleep delay
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridDelay;

impl HybridDelay {
    /// Wait for at least `duration`
    pub fn wait(&self, duration: Duration) {
        let deadline = Instant::now() + duration;

        if duration < SPIN_THRESHOLD {
            while Instant::now() < deadline {
                hint::spin_loop();
            }
            return;
        }

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(deadline - now);
        }
    }
}

impl DelayNs for HybridDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.wait(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait(Duration::from_millis(u64::from(ms)));
    }
}
