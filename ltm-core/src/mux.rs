//! Multiplexed refresh scheduler
//!
//! Only one group can be lit at a time, so the display has to be refreshed
//! continuously: send group 0, pause, send group 1, ..., wrap around. The
//! multiplexer owns the working frame buffer and the group cursor. Staged
//! frames and cancellation are only looked at between groups.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use ltm_hal::{DelayNs, GpioPort};

use crate::config::RefreshConfig;
use crate::error::DisplayError;
use crate::frame::{FrameBuffer, GROUP_COUNT};
use crate::handoff::{BufferHandoff, Snapshot};
use crate::wire::FrameEncoder;

/// Refresh scheduler state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiplexer {
    current_group: usize,
    working: FrameBuffer,
    generation: u64,
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplexer {
    /// Create a multiplexer with a blank frame, starting at group 0
    pub const fn new() -> Self {
        Self {
            current_group: 0,
            working: FrameBuffer::new(),
            generation: 0,
        }
    }

    /// Group sent by the next [`step`](Self::step)
    pub fn current_group(&self) -> usize {
        self.current_group
    }

    /// Frame being refreshed
    pub fn frame(&self) -> &FrameBuffer {
        &self.working
    }

    /// Mutable access to the working frame
    ///
    /// For single-threaded use, where updates are rendered straight into the
    /// live buffer between steps.
    pub fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.working
    }

    /// Generation of the frame being refreshed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the working frame with a complete snapshot
    pub fn adopt(&mut self, snapshot: Snapshot) {
        self.working = snapshot.frame;
        self.generation = snapshot.generation;
    }

    /// Transmit the current group and advance the cursor
    ///
    /// Returns the index of the group that was sent. On failure the cursor
    /// stays put.
    pub fn step<P: GpioPort, D: DelayNs>(
        &mut self,
        encoder: &mut FrameEncoder<P, D>,
    ) -> Result<usize, DisplayError> {
        let sent = self.current_group;
        encoder.transmit(&self.working.groups()[sent])?;
        self.current_group = (sent + 1) % GROUP_COUNT;
        Ok(sent)
    }

    /// Pause after a group at the cadence for the current content (µs)
    pub fn pause_us(&self, refresh: &RefreshConfig) -> u64 {
        if self.working.is_blank() {
            u64::from(refresh.idle_interval_ms) * 1_000
        } else {
            u64::from(refresh.group_interval_us)
        }
    }

    /// Refresh until `cancel` is set
    ///
    /// Takes staged snapshots from `handoff` between groups. While the frame
    /// is blank the idle pause is split into `idle_poll_ms` slices and cut
    /// short as soon as a snapshot is staged or `cancel` is set.
    pub fn run<P, D, M>(
        &mut self,
        encoder: &mut FrameEncoder<P, D>,
        handoff: &BufferHandoff<M>,
        cancel: &AtomicBool,
        refresh: &RefreshConfig,
    ) -> Result<(), DisplayError>
    where
        P: GpioPort,
        D: DelayNs,
        M: RawMutex,
    {
        while !cancel.load(Ordering::Acquire) {
            if let Some(snapshot) = handoff.take() {
                self.adopt(snapshot);
            }

            self.step(encoder)?;

            let delay = encoder.transport().delay();
            if self.working.is_blank() {
                idle_wait(delay, handoff, cancel, refresh);
            } else {
                delay.delay_us(refresh.group_interval_us);
            }
        }

        Ok(())
    }
}

fn idle_wait<D: DelayNs, M: RawMutex>(
    delay: &mut D,
    handoff: &BufferHandoff<M>,
    cancel: &AtomicBool,
    refresh: &RefreshConfig,
) {
    let slice = refresh.idle_poll_ms.max(1);
    let mut remaining = refresh.idle_interval_ms;

    while remaining > 0 {
        if handoff.is_staged() || cancel.load(Ordering::Acquire) {
            return;
        }
        let step = remaining.min(slice);
        delay.delay_ms(step);
        remaining -= step;
    }
}
