//! Display session: the owner of all display state
//!
//! [`DisplaySession`] drives the display from one thread, rendering straight
//! into the live frame between refresh steps. For a dedicated refresh thread,
//! [`DisplaySession::split`] hands out a [`Stager`] for the update path and a
//! [`Refresher`] for the refresh loop, coupled through a [`BufferHandoff`].

use core::sync::atomic::AtomicBool;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;
use ltm_hal::{DelayNs, GpioPort};

use crate::config::{DisplayConfig, HandoffConfig, RefreshConfig};
use crate::error::DisplayError;
use crate::frame::{FrameBuffer, ALPHANUM_CELLS, GROUP_COUNT, NUMERIC_CELLS};
use crate::handoff::{BufferHandoff, Snapshot, StageOutcome};
use crate::mux::Multiplexer;
use crate::wire::{BitTransport, FrameEncoder};

const MAX_UTF8_LEN: usize = 4;

/// Text currently shown, truncated to what fits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    alphanumeric: String<{ ALPHANUM_CELLS * MAX_UTF8_LEN }>,
    numeric: String<{ NUMERIC_CELLS * MAX_UTF8_LEN }>,
}

impl Content {
    /// Alphanumeric text, at most 7 characters
    pub fn alphanumeric(&self) -> &str {
        &self.alphanumeric
    }

    /// Numeric text, at most 4 characters
    pub fn numeric(&self) -> &str {
        &self.numeric
    }

    /// Check if both regions are empty
    pub fn is_blank(&self) -> bool {
        self.alphanumeric.is_empty() && self.numeric.is_empty()
    }

    fn set_alphanumeric(&mut self, text: &str, frame: &mut FrameBuffer) {
        fill(&mut self.alphanumeric, text, ALPHANUM_CELLS);
        frame.render_alphanumeric(&self.alphanumeric);
    }

    fn set_numeric(&mut self, text: &str, frame: &mut FrameBuffer) {
        fill(&mut self.numeric, text, NUMERIC_CELLS);
        frame.render_numeric(&self.numeric);
    }

    fn clear(&mut self, frame: &mut FrameBuffer) {
        self.alphanumeric.clear();
        self.numeric.clear();
        frame.clear_all();
    }
}

fn fill<const N: usize>(dest: &mut String<N>, text: &str, cells: usize) {
    dest.clear();
    for c in text.chars().take(cells) {
        // Capacity covers `cells` characters of any width
        let _ = dest.push(c);
    }
}

/// Reset the display and release its pins
fn shutdown_display<P: GpioPort, D: DelayNs>(
    encoder: &mut FrameEncoder<P, D>,
    refresh: &RefreshConfig,
) -> Result<(), DisplayError> {
    let transport = encoder.transport();
    let reset = transport
        .pulse_reset(refresh.reset_hold_us)
        .map_err(DisplayError::TransportError);
    // Release even if the reset pulse failed
    let release = transport.release().map_err(DisplayError::TransportError);
    reset.and(release)
}

/// Single-threaded display session
pub struct DisplaySession<P, D> {
    encoder: FrameEncoder<P, D>,
    mux: Multiplexer,
    content: Content,
    refresh: RefreshConfig,
    handoff: HandoffConfig,
}

impl<P: GpioPort, D: DelayNs> DisplaySession<P, D> {
    /// Create a session; nothing is touched until [`start`](Self::start)
    pub fn new(port: P, delay: D, config: &DisplayConfig) -> Self {
        let transport = BitTransport::new(port, delay, config.pins, config.timing);
        Self {
            encoder: FrameEncoder::new(transport, config.transport_policy),
            mux: Multiplexer::new(),
            content: Content::default(),
            refresh: config.refresh,
            handoff: config.handoff,
        }
    }

    /// Configure the pins, reset the controller and blank the frame
    ///
    /// Nothing stays exported when this fails.
    pub fn start(&mut self) -> Result<(), DisplayError> {
        let transport = self.encoder.transport();
        transport.init()?;
        if let Err(e) = transport.pulse_reset(self.refresh.reset_hold_us) {
            let _ = transport.release();
            return Err(DisplayError::InitializationFailure(e));
        }
        self.clear_all();
        Ok(())
    }

    /// Show up to 7 characters in the alphanumeric region
    pub fn set_alphanumeric(&mut self, text: &str) {
        self.content.set_alphanumeric(text, self.mux.frame_mut());
    }

    /// Show up to 4 characters in the numeric region
    pub fn set_numeric(&mut self, text: &str) {
        self.content.set_numeric(text, self.mux.frame_mut());
    }

    /// Blank both regions
    pub fn clear_all(&mut self) {
        self.content.clear(self.mux.frame_mut());
    }

    /// Send one group of the current frame without moving the refresh cursor
    ///
    /// `index` wraps around the five groups.
    pub fn transmit_group(&mut self, index: usize) -> Result<(), DisplayError> {
        let group = self.mux.frame().groups()[index % GROUP_COUNT];
        self.encoder.transmit(&group)
    }

    /// Send the next group in refresh order
    pub fn refresh_step(&mut self) -> Result<usize, DisplayError> {
        self.mux.step(&mut self.encoder)
    }

    /// Pause due after the last refresh step (µs)
    pub fn pause_us(&self) -> u64 {
        self.mux.pause_us(&self.refresh)
    }

    /// Check if nothing is shown
    pub fn is_blank(&self) -> bool {
        self.content.is_blank()
    }

    /// Current text
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Live frame
    pub fn frame(&self) -> &FrameBuffer {
        self.mux.frame()
    }

    /// Bits dropped under the skip policy
    pub fn skipped_bits(&self) -> u32 {
        self.encoder.skipped_bits()
    }

    /// Reset the display and release the pins
    pub fn shutdown(&mut self) -> Result<(), DisplayError> {
        shutdown_display(&mut self.encoder, &self.refresh)
    }

    /// Split into an update half and a refresh half
    ///
    /// The stager starts from the session's current frame and waits on
    /// `delay` while backing off.
    pub fn split<M: RawMutex, S: DelayNs>(
        self,
        handoff: &BufferHandoff<M>,
        delay: S,
    ) -> (Stager<'_, M, S>, Refresher<P, D>) {
        let stager = Stager {
            handoff,
            delay,
            config: self.handoff,
            staging: *self.mux.frame(),
            content: self.content,
            generation: self.mux.generation(),
            pending: false,
        };
        let refresher = Refresher {
            encoder: self.encoder,
            mux: self.mux,
            refresh: self.refresh,
        };
        (stager, refresher)
    }
}

/// Update half: renders into a private buffer and stages snapshots
pub struct Stager<'h, M: RawMutex, D> {
    handoff: &'h BufferHandoff<M>,
    delay: D,
    config: HandoffConfig,
    staging: FrameBuffer,
    content: Content,
    generation: u64,
    pending: bool,
}

impl<'h, M: RawMutex, D: DelayNs> Stager<'h, M, D> {
    /// Create a stager with a blank staging buffer
    pub fn new(handoff: &'h BufferHandoff<M>, delay: D, config: HandoffConfig) -> Self {
        Self {
            handoff,
            delay,
            config,
            staging: FrameBuffer::new(),
            content: Content::default(),
            generation: 0,
            pending: false,
        }
    }

    /// Render the alphanumeric region and publish
    pub fn set_alphanumeric(&mut self, text: &str) -> StageOutcome {
        self.content.set_alphanumeric(text, &mut self.staging);
        self.publish_new()
    }

    /// Render the numeric region and publish
    pub fn set_numeric(&mut self, text: &str) -> StageOutcome {
        self.content.set_numeric(text, &mut self.staging);
        self.publish_new()
    }

    /// Blank both regions and publish
    pub fn clear_all(&mut self) -> StageOutcome {
        self.content.clear(&mut self.staging);
        self.publish_new()
    }

    /// Publish an arbitrary frame, dropping the tracked text
    pub fn show_frame(&mut self, frame: FrameBuffer) -> StageOutcome {
        self.content = Content::default();
        self.staging = frame;
        self.publish_new()
    }

    /// Retry a deferred publication
    pub fn flush(&mut self) -> StageOutcome {
        if self.pending {
            self.publish()
        } else {
            StageOutcome::Published
        }
    }

    /// Check if the latest frame is still waiting to be staged
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Generation of the latest rendered frame
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Latest rendered frame
    pub fn frame(&self) -> &FrameBuffer {
        &self.staging
    }

    /// Latest text
    pub fn content(&self) -> &Content {
        &self.content
    }

    fn publish_new(&mut self) -> StageOutcome {
        self.generation += 1;
        self.publish()
    }

    fn publish(&mut self) -> StageOutcome {
        let snapshot = Snapshot {
            generation: self.generation,
            frame: self.staging,
        };
        let outcome = self.handoff.stage(snapshot, &mut self.delay, &self.config);
        self.pending = outcome == StageOutcome::Deferred;
        outcome
    }
}

/// Refresh half: owns the wire and the working frame
pub struct Refresher<P, D> {
    encoder: FrameEncoder<P, D>,
    mux: Multiplexer,
    refresh: RefreshConfig,
}

impl<P: GpioPort, D: DelayNs> Refresher<P, D> {
    /// Refresh until `cancel` is set, adopting staged snapshots between groups
    pub fn run<M: RawMutex>(
        &mut self,
        handoff: &BufferHandoff<M>,
        cancel: &AtomicBool,
    ) -> Result<(), DisplayError> {
        self.mux.run(&mut self.encoder, handoff, cancel, &self.refresh)
    }

    /// Working frame
    pub fn frame(&self) -> &FrameBuffer {
        self.mux.frame()
    }

    /// Generation of the working frame
    pub fn generation(&self) -> u64 {
        self.mux.generation()
    }

    /// Bits dropped under the skip policy
    pub fn skipped_bits(&self) -> u32 {
        self.encoder.skipped_bits()
    }

    /// Reset the display and release the pins
    pub fn shutdown(&mut self) -> Result<(), DisplayError> {
        shutdown_display(&mut self.encoder, &self.refresh)
    }
}
