//! Board-agnostic core logic for the LTM-Y2K19JF-03 display
//!
//! This crate contains everything that does not depend on a specific GPIO
//! backend:
//!
//! - Character to segment encoding
//! - Frame buffer layout and render operations
//! - Bit-serial wire protocol
//! - Multiplexed refresh state machine
//! - Tear-free buffer hand-off between the update path and the refresh loop
//! - Display session composition
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod handoff;
pub mod mux;
pub mod session;
pub mod wire;

pub use config::DisplayConfig;
pub use error::DisplayError;
pub use frame::{FrameBuffer, GroupFrame, GROUP_COUNT};
pub use handoff::{BufferHandoff, HandoffState, Snapshot, StageOutcome};
pub use mux::Multiplexer;
pub use session::{Content, DisplaySession, Refresher, Stager};
pub use wire::{BitTransport, FrameEncoder};
