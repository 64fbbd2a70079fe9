//! Runtime backend selection
//!
//! The backend is chosen from configuration when the display is composed,
//! so one binary can run on both kinds of kernel setup.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use ltm_hal::{Direction, GpioError, GpioPort, Level, Pin};
use serde::{Deserialize, Serialize};

use crate::cdev::{CdevGpio, DEFAULT_CHIP};
use crate::sysfs::{SysfsGpio, DEFAULT_SYSFS_ROOT};

/// Which GPIO interface to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// GPIO character device
    #[default]
    Cdev,
    /// Sysfs attribute files (flicker-prone)
    Sysfs,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cdev => write!(f, "cdev"),
            BackendKind::Sysfs => write!(f, "sysfs"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cdev" => Ok(BackendKind::Cdev),
            "sysfs" => Ok(BackendKind::Sysfs),
            other => Err(format!("unknown GPIO backend '{}' (expected cdev or sysfs)", other)),
        }
    }
}

/// Backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpioSettings {
    /// Interface to use
    pub backend: BackendKind,
    /// Character device for the cdev backend
    pub chip: PathBuf,
    /// Sysfs root for the sysfs backend
    pub sysfs_root: PathBuf,
}

impl Default for GpioSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            chip: PathBuf::from(DEFAULT_CHIP),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

/// GPIO port backed by whichever interface was configured
pub enum GpioBackend {
    /// Character device
    Cdev(CdevGpio),
    /// Sysfs
    Sysfs(SysfsGpio),
}

impl GpioBackend {
    /// Build the configured backend; nothing is opened until `init`
    pub fn from_settings(settings: &GpioSettings) -> Self {
        match settings.backend {
            BackendKind::Cdev => GpioBackend::Cdev(CdevGpio::new(&settings.chip)),
            BackendKind::Sysfs => GpioBackend::Sysfs(SysfsGpio::new(&settings.sysfs_root)),
        }
    }

    /// Which interface this is
    pub fn kind(&self) -> BackendKind {
        match self {
            GpioBackend::Cdev(_) => BackendKind::Cdev,
            GpioBackend::Sysfs(_) => BackendKind::Sysfs,
        }
    }
}

impl GpioPort for GpioBackend {
    fn init(&mut self) -> Result<(), GpioError> {
        match self {
            GpioBackend::Cdev(gpio) => gpio.init(),
            GpioBackend::Sysfs(gpio) => gpio.init(),
        }
    }

    fn export_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        match self {
            GpioBackend::Cdev(gpio) => gpio.export_pin(pin),
            GpioBackend::Sysfs(gpio) => gpio.export_pin(pin),
        }
    }

    fn unexport_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        match self {
            GpioBackend::Cdev(gpio) => gpio.unexport_pin(pin),
            GpioBackend::Sysfs(gpio) => gpio.unexport_pin(pin),
        }
    }

    fn set_direction(&mut self, pin: Pin, direction: Direction) -> Result<(), GpioError> {
        match self {
            GpioBackend::Cdev(gpio) => gpio.set_direction(pin, direction),
            GpioBackend::Sysfs(gpio) => gpio.set_direction(pin, direction),
        }
    }

    fn write_pin(&mut self, pin: Pin, level: Level) -> Result<(), GpioError> {
        match self {
            GpioBackend::Cdev(gpio) => gpio.write_pin(pin, level),
            GpioBackend::Sysfs(gpio) => gpio.write_pin(pin, level),
        }
    }
}
