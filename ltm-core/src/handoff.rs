//! Frame hand-off between the update path and the refresh loop
//!
//! A single generation-tagged slot. The producer renders into its own buffer
//! and stages a complete snapshot; the refresh loop takes it at a group
//! boundary and the slot goes back to idle. Nothing is queued: if the
//! producer finds the slot still staged it waits a bounded time and then
//! defers, so intermediate generations can be dropped but never applied in
//! part.
//!
//! The lock is only held for a snapshot copy, so a non-realtime producer can
//! never stall the refresh loop for longer than that.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::blocking_mutex::Mutex;
use ltm_hal::DelayNs;

use crate::config::HandoffConfig;
use crate::frame::FrameBuffer;

/// A complete frame tagged with the generation that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    /// Monotonic producer counter
    pub generation: u64,
    /// Rendered frame
    pub frame: FrameBuffer,
}

/// Slot state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandoffState {
    /// Nothing waiting; the producer may stage
    Idle,
    /// A snapshot is waiting for the refresh loop
    Staged,
}

/// Result of a bounded staging attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StageOutcome {
    /// The snapshot is staged
    Published,
    /// The slot stayed staged for the whole back-off; nothing was written
    Deferred,
}

/// Single-slot hand-off
pub struct BufferHandoff<M: RawMutex = CriticalSectionRawMutex> {
    slot: Mutex<M, Cell<Option<Snapshot>>>,
}

impl<M: RawMutex> Default for BufferHandoff<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> BufferHandoff<M> {
    /// Create an idle hand-off
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Current slot state
    pub fn state(&self) -> HandoffState {
        if self.is_staged() {
            HandoffState::Staged
        } else {
            HandoffState::Idle
        }
    }

    /// Check whether a snapshot is waiting
    pub fn is_staged(&self) -> bool {
        self.slot.lock(|slot| slot.get().is_some())
    }

    /// Stage a snapshot if the slot is idle
    ///
    /// Returns the snapshot back if the slot is still staged.
    pub fn try_stage(&self, snapshot: Snapshot) -> Result<(), Snapshot> {
        self.slot.lock(|slot| {
            if slot.get().is_some() {
                Err(snapshot)
            } else {
                slot.set(Some(snapshot));
                Ok(())
            }
        })
    }

    /// Stage a snapshot, polling while the slot is staged
    ///
    /// Polls up to `config.max_polls` times, `config.poll_interval_us` apart.
    pub fn stage<D: DelayNs>(
        &self,
        snapshot: Snapshot,
        delay: &mut D,
        config: &HandoffConfig,
    ) -> StageOutcome {
        let mut polls = 0;
        loop {
            if self.try_stage(snapshot).is_ok() {
                return StageOutcome::Published;
            }
            if polls >= config.max_polls {
                return StageOutcome::Deferred;
            }
            polls += 1;
            delay.delay_us(config.poll_interval_us);
        }
    }

    /// Take the staged snapshot, leaving the slot idle
    ///
    /// Called by the refresh loop at group boundaries only.
    pub fn take(&self) -> Option<Snapshot> {
        self.slot.lock(|slot| slot.take())
    }
}
