//! Single-threaded session behaviour as seen on the wire

use ltm_core::codec::{alphanum_code, numeric_code};
use ltm_core::config::DisplayPins;
use ltm_core::frame::{ALPHANUM_MASK, GROUP_COUNT, MUX_SELECT, NUMERIC_MASK};
use ltm_core::wire::{frame_bits, BITS_PER_GROUP};
use ltm_core::{DisplayConfig, DisplayError, DisplaySession, FrameBuffer};
use ltm_hal::mock::{Event, NoopDelay, RecordingPort};
use ltm_hal::{Direction, GpioError, Level};

fn started(port: &RecordingPort) -> DisplaySession<RecordingPort, NoopDelay> {
    let mut session = DisplaySession::new(port.clone(), NoopDelay, &DisplayConfig::default());
    session.start().unwrap();
    port.clear_events();
    session
}

#[test]
fn alphanumeric_then_clear_then_numeric() {
    let port = RecordingPort::new();
    let mut session = started(&port);

    session.set_alphanumeric("TESTING");
    session.set_alphanumeric("");
    session.set_numeric("12");

    let frame = session.frame();
    for (g, group) in frame.groups().iter().enumerate() {
        for (b, byte) in group.iter().enumerate() {
            assert_eq!(byte & ALPHANUM_MASK[g][b], 0, "alphanumeric bit left in group {} byte {}", g, b);
            assert_eq!(byte & MUX_SELECT[g][b], MUX_SELECT[g][b], "mux bit lost in group {} byte {}", g, b);
        }
    }

    let one = numeric_code('1');
    let two = numeric_code('2');
    assert_eq!(frame.groups()[1][1] & NUMERIC_MASK[1][1], (one & 0xC0) >> 6);
    assert_eq!(frame.groups()[1][2] & NUMERIC_MASK[1][2], (one & 0x3E) << 2);
    assert_eq!(frame.groups()[2][1] & NUMERIC_MASK[2][1], (two & 0xC0) >> 6);
    assert_eq!(frame.groups()[2][2] & NUMERIC_MASK[2][2], (two & 0x3E) << 2);
    assert_eq!(frame.groups()[1][3] & NUMERIC_MASK[1][3], 0);

    assert_eq!(session.content().alphanumeric(), "");
    assert_eq!(session.content().numeric(), "12");
    assert!(!session.is_blank());
}

#[test]
fn refresh_sends_all_groups_in_order() {
    let port = RecordingPort::new();
    let mut session = started(&port);
    session.set_alphanumeric("ABCDEFG");

    for expected in 0..GROUP_COUNT {
        assert_eq!(session.refresh_step().unwrap(), expected);
    }

    let pins = DisplayPins::default();
    let bits = port.sampled_bits(pins.data, pins.clock);
    assert_eq!(bits.len(), GROUP_COUNT * BITS_PER_GROUP);
    for (g, chunk) in bits.chunks(BITS_PER_GROUP).enumerate() {
        assert_eq!(chunk, frame_bits(&session.frame().groups()[g]));
    }

    // Cell 0 lives in group 0, high byte first
    assert_eq!(session.frame().groups()[0][0], (alphanum_code('A') >> 8) as u8);
}

#[test]
fn blank_display_uses_idle_cadence() {
    let port = RecordingPort::new();
    let mut session = started(&port);
    assert!(session.is_blank());
    assert_eq!(session.pause_us(), 5_000_000);

    session.set_numeric("0");
    assert_eq!(session.pause_us(), 1_000);

    session.clear_all();
    assert_eq!(session.frame(), &FrameBuffer::new());
}

#[test]
fn shutdown_pulses_reset_and_releases_pins() {
    let port = RecordingPort::new();
    let mut session = started(&port);
    session.set_alphanumeric("BYE");
    session.refresh_step().unwrap();
    port.clear_events();

    session.shutdown().unwrap();

    let events = port.events();
    assert_eq!(events.first(), Some(&Event::Write(27, Level::High)));
    assert_eq!(
        &events[events.len() - 4..],
        [
            Event::Write(27, Level::Low),
            Event::Unexport(22),
            Event::Unexport(17),
            Event::Unexport(27),
        ]
    );
}

#[test]
fn failed_start_leaves_no_pin_exported() {
    let port = RecordingPort::new();
    port.fail_export(27);
    let mut session = DisplaySession::new(port.clone(), NoopDelay, &DisplayConfig::default());

    assert_eq!(
        session.start(),
        Err(DisplayError::InitializationFailure(GpioError::Export(27)))
    );
    assert_eq!(
        port.events(),
        [
            Event::Init,
            Event::Export(22),
            Event::Direction(22, Direction::Output),
            Event::Export(17),
            Event::Direction(17, Direction::Output),
            Event::Export(27),
            Event::Unexport(22),
            Event::Unexport(17),
        ]
    );
}

#[test]
fn failed_reset_pulse_releases_pins() {
    let port = RecordingPort::new();
    // The first write of a start is the reset line going high
    port.fail_write_at(0);
    let mut session = DisplaySession::new(port.clone(), NoopDelay, &DisplayConfig::default());

    assert!(matches!(
        session.start(),
        Err(DisplayError::InitializationFailure(GpioError::Write(27)))
    ));
    let events = port.events();
    assert_eq!(
        &events[events.len() - 3..],
        [Event::Unexport(22), Event::Unexport(17), Event::Unexport(27)]
    );
}
