//! Linux platform HAL for the display driver
//!
//! Implements [`ltm_hal::GpioPort`] on top of the two GPIO interfaces the
//! kernel offers, plus the host timing and scheduling pieces:
//!
//! - [`CdevGpio`]: character device (`/dev/gpiochipN`), line handles held
//!   open, one ioctl per write
//! - [`SysfsGpio`]: `/sys/class/gpio` files, one open/write/close per write.
//!   Slow enough that the display visibly flickers
//! - [`GpioBackend`]: either of the above, picked at runtime from config
//! - [`HybridDelay`]: spin below 100 µs, sleep above
//! - [`sched::promote_current_thread`]: `SCHED_FIFO` for the refresh thread

#![deny(unsafe_code)]

pub mod backend;
pub mod cdev;
pub mod delay;
pub mod sched;
pub mod sysfs;

pub use backend::{BackendKind, GpioBackend, GpioSettings};
pub use cdev::CdevGpio;
pub use delay::HybridDelay;
pub use sysfs::SysfsGpio;
