//! GPIO port abstraction
//!
//! The display only needs three output lines (data, clock, reset), but the
//! Linux backends address pins by number through a shared controller, so the
//! capability is modelled as a port rather than as individual pin objects.

use core::fmt;

/// GPIO pin number (BCM numbering on the Raspberry Pi)
pub type Pin = u8;

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Input (high impedance)
    Input,
    /// Push-pull output
    Output,
}

/// Output level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// Check if this is the high level
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Errors reported by a [`GpioPort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// The GPIO controller could not be opened
    Init,
    /// Exporting the pin failed
    Export(Pin),
    /// Unexporting the pin failed
    Unexport(Pin),
    /// Setting the pin direction failed
    Direction(Pin),
    /// Writing the pin level failed
    Write(Pin),
    /// The pin was never configured as an output
    NotConfigured(Pin),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioError::Init => write!(f, "GPIO controller initialization failed"),
            GpioError::Export(pin) => write!(f, "failed to export GPIO {}", pin),
            GpioError::Unexport(pin) => write!(f, "failed to unexport GPIO {}", pin),
            GpioError::Direction(pin) => write!(f, "failed to set direction of GPIO {}", pin),
            GpioError::Write(pin) => write!(f, "failed to write GPIO {}", pin),
            GpioError::NotConfigured(pin) => write!(f, "GPIO {} is not configured", pin),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GpioError {}

/// GPIO port capability
///
/// Both the fast character-device backend and the generic sysfs backend
/// implement this trait with the same contract:
///
/// - `init` must be called once before any other method
/// - a pin must be exported and set to [`Direction::Output`] before
///   `write_pin` is used on it
/// - `write_pin` must have taken effect on the line when it returns
pub trait GpioPort {
    /// Prepare the GPIO controller for use
    fn init(&mut self) -> Result<(), GpioError>;

    /// Make a pin available for use
    fn export_pin(&mut self, pin: Pin) -> Result<(), GpioError>;

    /// Release a previously exported pin
    fn unexport_pin(&mut self, pin: Pin) -> Result<(), GpioError>;

    /// Set the direction of an exported pin
    fn set_direction(&mut self, pin: Pin, direction: Direction) -> Result<(), GpioError>;

    /// Drive an output pin to the given level
    fn write_pin(&mut self, pin: Pin, level: Level) -> Result<(), GpioError>;
}

impl<T: GpioPort + ?Sized> GpioPort for &mut T {
    fn init(&mut self) -> Result<(), GpioError> {
        (**self).init()
    }

    fn export_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        (**self).export_pin(pin)
    }

    fn unexport_pin(&mut self, pin: Pin) -> Result<(), GpioError> {
        (**self).unexport_pin(pin)
    }

    fn set_direction(&mut self, pin: Pin, direction: Direction) -> Result<(), GpioError> {
        (**self).set_direction(pin, direction)
    }

    fn write_pin(&mut self, pin: Pin, level: Level) -> Result<(), GpioError> {
        (**self).write_pin(pin, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_bool() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert!(Level::High.is_high());
        assert!(!Level::Low.is_high());
    }

    struct CountingPort {
        writes: usize,
    }

    impl GpioPort for CountingPort {
        fn init(&mut self) -> Result<(), GpioError> {
            Ok(())
        }

        fn export_pin(&mut self, _pin: Pin) -> Result<(), GpioError> {
            Ok(())
        }

        fn unexport_pin(&mut self, _pin: Pin) -> Result<(), GpioError> {
            Ok(())
        }

        fn set_direction(&mut self, _pin: Pin, _direction: Direction) -> Result<(), GpioError> {
            Ok(())
        }

        fn write_pin(&mut self, _pin: Pin, _level: Level) -> Result<(), GpioError> {
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_port_through_mut_reference() {
        fn pulse<P: GpioPort>(mut port: P) {
            port.write_pin(17, Level::High).unwrap();
            port.write_pin(17, Level::Low).unwrap();
        }

        let mut port = CountingPort { writes: 0 };
        pulse(&mut port);
        assert_eq!(port.writes, 2);
    }
}
