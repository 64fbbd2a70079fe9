//! Character-device GPIO backend
//!
//! Opens the GPIO chip once and keeps a line handle per configured pin, so a
//! pin write is a single ioctl. This is the backend to use for a steady,
//! flicker-free display.

use std::collections::BTreeMap;
use std::path::PathBuf;

use embedded_hal::digital::OutputPin;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use ltm_hal::{Direction, GpioError, GpioPort, Level, Pin};
use tracing::{debug, warn};

/// Default GPIO character device
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Consumer label shown by `gpioinfo`
const CONSUMER: &str = "ltmd";

/// GPIO port driven through the GPIO character device
pub struct CdevGpio {
    path: PathBuf,
    chip: Option<Chip>,
    lines: BTreeMap<Pin, CdevPin>,
}

impl Default for CdevGpio {
    fn default() -> Self {
        Self::new(DEFAULT_CHIP)
    }
}

impl CdevGpio {
    /// Create a backend for the chip at `path`; opened by `init`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chip: None,
            lines: BTreeMap::new(),
        }
    }

    /// Check whether `pin` has a line handle
    pub fn is_configured(&self, pin: Pin) -> bool {
        self.lines.contains_key(&pin)
    }
}

impl GpioPort for CdevGpio {
    fn init(&mut self) -> Result<(), GpioError> {
        let chip = Chip::new(&self.path).map_err(|e| {
            warn!(chip = %self.path.display(), error = %e, "failed to open GPIO chip");
            GpioError::Init
        })?;
        debug!(chip = %self.path.display(), lines = chip.num_lines(), "GPIO chip opened");
        self.chip = Some(chip);
        Ok(())
    }

    fn export_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        // Lines need no export; just check the offset exists
        let chip = self.chip.as_mut().ok_or(GpioError::Export(pin))?;
        chip.get_line(u32::from(pin)).map_err(|e| {
            warn!(pin, error = %e, "GPIO line not available");
            GpioError::Export(pin)
        })?;
        Ok(())
    }

    fn unexport_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        // Dropping the handle releases the line
        self.lines.remove(&pin);
        Ok(())
    }

    fn set_direction(&mut self, pin: Pin, direction: Direction) -> Result<(), GpioError> {
        let chip = self.chip.as_mut().ok_or(GpioError::Direction(pin))?;

        // The kernel refuses a second request while the old handle is open
        self.lines.remove(&pin);

        let flags = match direction {
            Direction::Input => LineRequestFlags::INPUT,
            Direction::Output => LineRequestFlags::OUTPUT,
        };
        let handle = chip
            .get_line(u32::from(pin))
            .and_then(|line| line.request(flags, 0, CONSUMER))
            .map_err(|e| {
                warn!(pin, error = %e, "failed to request GPIO line");
                GpioError::Direction(pin)
            })?;
        let line = CdevPin::new(handle).map_err(|e| {
            warn!(pin, error = %e, "failed to wrap GPIO line");
            GpioError::Direction(pin)
        })?;

        self.lines.insert(pin, line);
        Ok(())
    }

    fn write_pin(&mut self, pin: Pin, level: Level) -> Result<(), GpioError> {
        let line = self
            .lines
            .get_mut(&pin)
            .ok_or(GpioError::NotConfigured(pin))?;

        let result = match level {
            Level::High => line.set_high(),
            Level::Low => line.set_low(),
        };
        result.map_err(|_| GpioError::Write(pin))
    }
}
