//! ltm Hardware Abstraction Layer
//!
//! This crate defines the GPIO capability the display driver consumes. The
//! driver never touches pins directly; it is handed something that implements
//! [`GpioPort`] when the display session is composed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (ltmd, etc.)               │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ltm-core (codec, wire, multiplexer)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ltm-hal (this crate - traits)          │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ltm-hal-linux │       │ ltm-hal-linux │
//! │     cdev      │       │     sysfs     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::GpioPort`] - Pin export, direction and level control
//! - [`DelayNs`] - Timing primitive (re-exported from `embedded-hal`)

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

pub mod gpio;
#[cfg(feature = "mock")]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use embedded_hal::delay::DelayNs;
pub use gpio::{Direction, GpioError, GpioPort, Level, Pin};
