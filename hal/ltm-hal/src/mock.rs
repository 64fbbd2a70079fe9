//! Recording GPIO port for host-side tests
//!
//! [`RecordingPort`] logs every call into a shared event list instead of
//! touching hardware. Clones share the same log, so a test can hand one clone
//! to a refresh thread and inspect the other. [`RecordingDelay`] writes its
//! requests into the same log, which lets tests check the ordering of pin
//! writes and hold times.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::gpio::{Direction, GpioError, GpioPort, Level, Pin};

/// One recorded call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// `init` was called
    Init,
    /// `export_pin`
    Export(Pin),
    /// `unexport_pin`
    Unexport(Pin),
    /// `set_direction`
    Direction(Pin, Direction),
    /// `write_pin`
    Write(Pin, Level),
    /// A delay of the given number of nanoseconds
    Delay(u32),
}

#[derive(Debug, Default)]
struct Shared {
    events: Vec<Event>,
    writes: usize,
    fail_init: bool,
    fail_export: BTreeSet<Pin>,
    fail_writes: BTreeSet<usize>,
}

/// GPIO port that records calls
#[derive(Debug, Clone, Default)]
pub struct RecordingPort {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingPort {
    /// Create a port with an empty log and no injected failures
    pub fn new() -> Self {
        Self::default()
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        // A panicking test thread must not hide the log from the others
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `init` fail
    pub fn fail_init(&self) {
        self.shared().fail_init = true;
    }

    /// Make `export_pin` fail for the given pin
    pub fn fail_export(&self, pin: Pin) {
        self.shared().fail_export.insert(pin);
    }

    /// Make the n-th `write_pin` call (0-based, counted from creation) fail
    pub fn fail_write_at(&self, index: usize) {
        self.shared().fail_writes.insert(index);
    }

    /// Number of `write_pin` calls so far, including failed ones
    pub fn write_count(&self) -> usize {
        self.shared().writes
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<Event> {
        self.shared().events.clone()
    }

    /// Discard recorded events (the write counter keeps running)
    pub fn clear_events(&self) {
        self.shared().events.clear();
    }

    /// Create a delay that records into this port's log
    pub fn delay(&self) -> RecordingDelay {
        RecordingDelay {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Data line level sampled at every rising edge of the clock line
    ///
    /// This is what the display controller latches, so tests can rebuild the
    /// transmitted bit stream from it.
    pub fn sampled_bits(&self, data: Pin, clock: Pin) -> Vec<bool> {
        let mut bits = Vec::new();
        let mut data_level = Level::Low;
        let mut clock_level = Level::Low;

        for event in self.shared().events.iter() {
            if let Event::Write(pin, level) = *event {
                if pin == data {
                    data_level = level;
                } else if pin == clock {
                    if clock_level == Level::Low && level == Level::High {
                        bits.push(data_level.is_high());
                    }
                    clock_level = level;
                }
            }
        }

        bits
    }
}

impl GpioPort for RecordingPort {
    fn init(&mut self) -> Result<(), GpioError> {
        let mut shared = self.shared();
        shared.events.push(Event::Init);
        if shared.fail_init {
            return Err(GpioError::Init);
        }
        Ok(())
    }

    fn export_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        let mut shared = self.shared();
        shared.events.push(Event::Export(pin));
        if shared.fail_export.contains(&pin) {
            return Err(GpioError::Export(pin));
        }
        Ok(())
    }

    fn unexport_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        self.shared().events.push(Event::Unexport(pin));
        Ok(())
    }

    fn set_direction(&mut self, pin: Pin, direction: Direction) -> Result<(), GpioError> {
        self.shared().events.push(Event::Direction(pin, direction));
        Ok(())
    }

    fn write_pin(&mut self, pin: Pin, level: Level) -> Result<(), GpioError> {
        let mut shared = self.shared();
        let index = shared.writes;
        shared.writes += 1;
        if shared.fail_writes.contains(&index) {
            return Err(GpioError::Write(pin));
        }
        shared.events.push(Event::Write(pin, level));
        Ok(())
    }
}

/// Delay that records requests instead of waiting
#[derive(Debug, Clone)]
pub struct RecordingDelay {
    shared: Arc<Mutex<Shared>>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .push(Event::Delay(ns));
    }
}

/// Delay that returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
