//! Display configuration types
//!
//! Defaults match the usual Raspberry Pi wiring: data on GPIO 22, clock on
//! GPIO 17 and reset on GPIO 27 (GPIO 21 on revision A boards).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use ltm_hal::Pin;

/// Minimum data setup time before the clock rises (ns)
pub const MIN_SETUP_NS: u32 = 300;

/// Minimum clock high time (ns)
pub const MIN_CLOCK_HIGH_NS: u32 = 950;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Two of the display lines share a GPIO
    DuplicatePin(Pin),
    /// A cadence or interval is zero
    ZeroInterval,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::DuplicatePin(pin) => {
                write!(f, "GPIO {} is assigned to more than one display line", pin)
            }
            ConfigError::ZeroInterval => write!(f, "refresh and hand-off intervals must be non-zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// GPIO lines wired to the display header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct DisplayPins {
    /// Serial data line
    pub data: Pin,
    /// Serial clock line
    pub clock: Pin,
    /// Controller reset line
    pub reset: Pin,
}

impl Default for DisplayPins {
    fn default() -> Self {
        Self {
            data: 22,
            clock: 17,
            reset: 27,
        }
    }
}

impl DisplayPins {
    /// All three lines, in initialization order
    pub const fn all(&self) -> [Pin; 3] {
        [self.data, self.clock, self.reset]
    }
}

/// Per-bit hold times on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct BitTiming {
    /// Data setup time before the clock rises (ns)
    pub setup_ns: u32,
    /// Clock high time (ns)
    pub clock_high_ns: u32,
}

impl Default for BitTiming {
    fn default() -> Self {
        Self {
            setup_ns: 1_000,
            clock_high_ns: 1_000,
        }
    }
}

impl BitTiming {
    /// Timing raised to the protocol minimums where needed
    pub fn clamped(self) -> Self {
        Self {
            setup_ns: self.setup_ns.max(MIN_SETUP_NS),
            clock_high_ns: self.clock_high_ns.max(MIN_CLOCK_HIGH_NS),
        }
    }
}

/// Refresh cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RefreshConfig {
    /// Pause after each group while content is lit (µs)
    pub group_interval_us: u32,
    /// Pause after each group while the display is blank (ms)
    pub idle_interval_ms: u32,
    /// Slice length for idle pauses; staged content and cancellation are
    /// checked between slices (ms)
    pub idle_poll_ms: u32,
    /// Reset pulse width on shutdown (µs)
    pub reset_hold_us: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            group_interval_us: 1_000,
            idle_interval_ms: 5_000,
            idle_poll_ms: 10,
            reset_hold_us: 1,
        }
    }
}

/// What to do when a GPIO write fails mid-transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TransportPolicy {
    /// Stop and report the error
    #[default]
    Abort,
    /// Send the whole bit again once, then abort
    RetryBit,
    /// Count the bit as skipped and carry on with the next one
    SkipBit,
}

/// Producer back-off while the hand-off slot is still staged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct HandoffConfig {
    /// Wait between polls of the slot (µs)
    pub poll_interval_us: u32,
    /// Polls before the producer gives up and defers publication
    pub max_polls: u32,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            poll_interval_us: 200,
            max_polls: 100,
        }
    }
}

/// Complete display configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct DisplayConfig {
    /// GPIO wiring
    pub pins: DisplayPins,
    /// Wire timing
    pub timing: BitTiming,
    /// Refresh cadence
    pub refresh: RefreshConfig,
    /// Write failure policy
    pub transport_policy: TransportPolicy,
    /// Hand-off back-off
    pub handoff: HandoffConfig,
}

impl DisplayConfig {
    /// Check the configuration for values the driver cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [data, clock, reset] = self.pins.all();
        if data == clock || data == reset {
            return Err(ConfigError::DuplicatePin(data));
        }
        if clock == reset {
            return Err(ConfigError::DuplicatePin(clock));
        }

        if self.refresh.group_interval_us == 0
            || self.refresh.idle_interval_ms == 0
            || self.refresh.idle_poll_ms == 0
            || self.handoff.poll_interval_us == 0
        {
            return Err(ConfigError::ZeroInterval);
        }

        Ok(())
    }
}
