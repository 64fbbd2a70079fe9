//! Sysfs GPIO backend
//!
//! Every operation opens an attribute file under the sysfs root, writes a
//! short string and closes it again. Works everywhere, but each bit costs a
//! handful of syscalls and the refresh rate drops far enough to flicker.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ltm_hal::{Direction, GpioError, GpioPort, Level, Pin};
use tracing::{debug, warn};

/// Default sysfs GPIO root
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// GPIO port driven through sysfs attribute files
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl SysfsGpio {
    /// Create a backend rooted at `root` (normally `/sys/class/gpio`)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pin_dir(&self, pin: Pin) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }

    fn write_attr(path: &Path, value: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;
        file.write_all(value.as_bytes())
    }
}

impl GpioPort for SysfsGpio {
    fn init(&mut self) -> Result<(), GpioError> {
        if self.root.join("export").exists() {
            Ok(())
        } else {
            warn!(root = %self.root.display(), "sysfs GPIO interface not found");
            Err(GpioError::Init)
        }
    }

    fn export_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        if self.pin_dir(pin).exists() {
            debug!(pin, "GPIO already exported");
            return Ok(());
        }

        Self::write_attr(&self.root.join("export"), &pin.to_string()).map_err(|e| {
            warn!(pin, error = %e, "failed to export GPIO");
            GpioError::Export(pin)
        })
    }

    fn unexport_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        Self::write_attr(&self.root.join("unexport"), &pin.to_string()).map_err(|e| {
            warn!(pin, error = %e, "failed to unexport GPIO");
            GpioError::Unexport(pin)
        })
    }

    fn set_direction(&mut self, pin: Pin, direction: Direction) -> Result<(), GpioError> {
        let value = match direction {
            Direction::Input => "in",
            Direction::Output => "out",
        };

        Self::write_attr(&self.pin_dir(pin).join("direction"), value).map_err(|e| {
            warn!(pin, error = %e, "failed to set GPIO direction");
            GpioError::Direction(pin)
        })
    }

    fn write_pin(&mut self, pin: Pin, level: Level) -> Result<(), GpioError> {
        let value = if level.is_high() { "1" } else { "0" };

        Self::write_attr(&self.pin_dir(pin).join("value"), value).map_err(|e| {
            debug!(pin, error = %e, "failed to write GPIO value");
            GpioError::Write(pin)
        })
    }
}
