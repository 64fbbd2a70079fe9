//! Bit-serial wire protocol to the display controller
//!
//! Wire format per group:
//! - START (1 bit): always 1
//! - DATA (40 bits): the group's 5 bytes, most significant bit first
//! - the low 6 bits of the last byte are stop bits and always go out as 0,
//!   which lets the controller resynchronize if a bit was lost
//!
//! Each bit is clocked as:
//!
//! ```text
//! clock ──┐           ┌──────────┐
//!         └───────────┘          └──
//! data  ════╳═══════════════════════
//!           │<-setup->│<-clk hi->│
//!             >=300ns    >=950ns
//! ```
//!
//! The controller latches the segments once all bits of a group are in.

use ltm_hal::{DelayNs, Direction, GpioError, GpioPort, Level, Pin};

use crate::config::{BitTiming, DisplayPins, TransportPolicy};
use crate::error::DisplayError;
use crate::frame::{GroupFrame, GROUP_BYTES, STOP_MASK};

/// Value of the start bit
pub const START_BIT: bool = true;

/// Bits sent per group transmission
pub const BITS_PER_GROUP: usize = 1 + GROUP_BYTES * 8;

/// Bit sequence for one group, start bit first
pub fn frame_bits(group: &GroupFrame) -> [bool; BITS_PER_GROUP] {
    let mut wire = *group;
    wire[GROUP_BYTES - 1] &= !STOP_MASK;

    let mut bits = [false; BITS_PER_GROUP];
    bits[0] = START_BIT;
    for (i, byte) in wire.iter().enumerate() {
        for j in 0..8 {
            bits[1 + i * 8 + j] = byte & (0x80 >> j) != 0;
        }
    }
    bits
}

/// Single-bit transport over three GPIO lines
///
/// Owns the GPIO port and the delay primitive. The delay primitive is the
/// only timing source; swap it for a hardware timer without touching the
/// protocol code.
pub struct BitTransport<P, D> {
    port: P,
    delay: D,
    pins: DisplayPins,
    timing: BitTiming,
}

impl<P: GpioPort, D: DelayNs> BitTransport<P, D> {
    /// Create a transport; timing below the protocol minimums is raised
    pub fn new(port: P, delay: D, pins: DisplayPins, timing: BitTiming) -> Self {
        Self {
            port,
            delay,
            pins,
            timing: timing.clamped(),
        }
    }

    /// Bring up the GPIO controller and configure all lines as outputs
    ///
    /// On failure the lines exported so far are unexported again before the
    /// error is returned.
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.port.init().map_err(DisplayError::InitializationFailure)?;

        let pins = self.pins.all();
        for (i, &pin) in pins.iter().enumerate() {
            if let Err(e) = self.port.export_pin(pin) {
                self.unexport_best_effort(&pins[..i]);
                return Err(DisplayError::InitializationFailure(e));
            }
            if let Err(e) = self.port.set_direction(pin, Direction::Output) {
                self.unexport_best_effort(&pins[..=i]);
                return Err(DisplayError::InitializationFailure(e));
            }
        }

        Ok(())
    }

    fn unexport_best_effort(&mut self, pins: &[Pin]) {
        for &pin in pins {
            // The init error is the one worth reporting
            let _ = self.port.unexport_pin(pin);
        }
    }

    /// Clock one bit out
    pub fn send_bit(&mut self, bit: bool) -> Result<(), GpioError> {
        // Failsafe: the clock must start low every time
        self.port.write_pin(self.pins.clock, Level::Low)?;
        self.port.write_pin(self.pins.data, Level::from(bit))?;
        self.delay.delay_ns(self.timing.setup_ns);

        self.port.write_pin(self.pins.clock, Level::High)?;
        self.delay.delay_ns(self.timing.clock_high_ns);

        self.port.write_pin(self.pins.clock, Level::Low)
    }

    /// Pulse the reset line: high, hold, low
    pub fn pulse_reset(&mut self, hold_us: u32) -> Result<(), GpioError> {
        self.port.write_pin(self.pins.reset, Level::High)?;
        self.delay.delay_us(hold_us);
        self.port.write_pin(self.pins.reset, Level::Low)
    }

    /// Unexport all display lines
    ///
    /// Every line is attempted; the first failure is reported.
    pub fn release(&mut self) -> Result<(), GpioError> {
        let mut result = Ok(());
        for pin in self.pins.all() {
            if let Err(e) = self.port.unexport_pin(pin) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Delay primitive, for callers pacing their own loops
    pub fn delay(&mut self) -> &mut D {
        &mut self.delay
    }
}

/// Group frame encoder
///
/// Sends one group as a complete wire frame and applies the configured
/// [`TransportPolicy`] to failed bits.
pub struct FrameEncoder<P, D> {
    transport: BitTransport<P, D>,
    policy: TransportPolicy,
    skipped_bits: u32,
}

impl<P: GpioPort, D: DelayNs> FrameEncoder<P, D> {
    /// Create an encoder on top of a transport
    pub fn new(transport: BitTransport<P, D>, policy: TransportPolicy) -> Self {
        Self {
            transport,
            policy,
            skipped_bits: 0,
        }
    }

    /// Transmit one group frame
    pub fn transmit(&mut self, group: &GroupFrame) -> Result<(), DisplayError> {
        for bit in frame_bits(group) {
            self.send(bit)?;
        }
        Ok(())
    }

    fn send(&mut self, bit: bool) -> Result<(), DisplayError> {
        let Err(e) = self.transport.send_bit(bit) else {
            return Ok(());
        };

        match self.policy {
            TransportPolicy::Abort => Err(DisplayError::TransportError(e)),
            TransportPolicy::RetryBit => self
                .transport
                .send_bit(bit)
                .map_err(DisplayError::TransportError),
            TransportPolicy::SkipBit => {
                // The stop bits let the controller resync on the next frame
                self.skipped_bits = self.skipped_bits.saturating_add(1);
                Ok(())
            }
        }
    }

    /// Bits dropped under [`TransportPolicy::SkipBit`]
    pub fn skipped_bits(&self) -> u32 {
        self.skipped_bits
    }

    /// Underlying transport
    pub fn transport(&mut self) -> &mut BitTransport<P, D> {
        &mut self.transport
    }
}
