//! Display driver errors

use core::fmt;

use ltm_hal::GpioError;

/// Errors raised by the display driver
///
/// Encoding never fails; unknown characters render as a placeholder glyph.
/// Only the GPIO transport can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// The GPIO lines could not be brought up; the display cannot be driven
    InitializationFailure(GpioError),
    /// A GPIO write failed while transmitting
    TransportError(GpioError),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailure(e) => {
                write!(f, "display initialization failed: {}", e)
            }
            DisplayError::TransportError(e) => write!(f, "display transport error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DisplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DisplayError::InitializationFailure(e) | DisplayError::TransportError(e) => Some(e),
        }
    }
}
