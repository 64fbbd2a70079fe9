//! Scheduling models
//!
//! - Cooperative: one loop sends a group, then waits on the command channel
//!   for the rest of the group's pause. Simple, but a slow command stalls
//!   the refresh.
//! - Threaded: a dedicated refresh thread at real-time priority, with
//!   commands rendered on the main thread and passed over as complete frames.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use ltm_core::handoff::StageOutcome;
use ltm_core::{BufferHandoff, DisplayError, DisplaySession, Refresher, Stager};
use ltm_hal::{DelayNs, GpioPort};
use ltm_hal_linux::sched;
use tracing::{debug, info, warn};

use crate::command::Command;

/// Wait on the command channel for up to `pause`
///
/// Waits in `slice`-sized steps so a shutdown request is seen promptly.
/// Returns as soon as a command arrives.
fn next_command(
    commands: &Receiver<Command>,
    pause: Duration,
    slice: Duration,
    shutdown: &AtomicBool,
) -> Option<Command> {
    let deadline = Instant::now() + pause;

    loop {
        let now = Instant::now();
        if now >= deadline || shutdown.load(Ordering::Acquire) {
            return None;
        }

        let wait = (deadline - now).min(slice);
        match commands.recv_timeout(wait) {
            Ok(command) => return Some(command),
            Err(RecvTimeoutError::Timeout) => {}
            // Input is gone; keep the display alive until told to stop
            Err(RecvTimeoutError::Disconnected) => thread::sleep(wait),
        }
    }
}

fn apply_to_session<P: GpioPort, D: DelayNs>(session: &mut DisplaySession<P, D>, command: Command) {
    match command {
        Command::Alpha(text) => session.set_alphanumeric(&text),
        Command::Num(text) => session.set_numeric(&text),
    }
    info!(
        alphanumeric = session.content().alphanumeric(),
        numeric = session.content().numeric(),
        "display updated"
    );
}

fn apply_to_stager<D: DelayNs>(stager: &mut Stager<'_, CriticalSectionRawMutex, D>, command: Command) {
    let outcome = match command {
        Command::Alpha(text) => stager.set_alphanumeric(&text),
        Command::Num(text) => stager.set_numeric(&text),
    };
    info!(
        alphanumeric = stager.content().alphanumeric(),
        numeric = stager.content().numeric(),
        generation = stager.generation(),
        "display updated"
    );
    if outcome == StageOutcome::Deferred {
        debug!(generation = stager.generation(), "refresh thread busy, frame deferred");
    }
}

/// Single-loop model
///
/// Runs until `shutdown` is raised or a transmission fails. The display is
/// not shut down here.
pub fn run_cooperative<P: GpioPort, D: DelayNs>(
    session: &mut DisplaySession<P, D>,
    commands: &Receiver<Command>,
    shutdown: &AtomicBool,
    slice: Duration,
) -> Result<(), DisplayError> {
    while !shutdown.load(Ordering::Acquire) {
        session.refresh_step()?;

        let pause = Duration::from_micros(session.pause_us());
        if let Some(command) = next_command(commands, pause, slice, shutdown) {
            apply_to_session(session, command);
        }
    }

    Ok(())
}

/// Log the bits dropped under the skip policy
///
/// Returns `true` when any were dropped.
pub fn report_skipped_bits(skipped: u32) -> bool {
    if skipped == 0 {
        return false;
    }
    warn!(skipped, "GPIO writes failed and bits were skipped; the display may have glitched");
    true
}

/// Start the refresh thread, promoted to `SCHED_FIFO` when `priority` is set
pub fn spawn_refresher<'scope, P, D>(
    scope: &'scope Scope<'scope, '_>,
    refresher: &'scope mut Refresher<P, D>,
    handoff: &'scope BufferHandoff,
    cancel: &'scope AtomicBool,
    priority: Option<i32>,
) -> io::Result<ScopedJoinHandle<'scope, Result<(), DisplayError>>>
where
    P: GpioPort + Send,
    D: DelayNs + Send,
{
    thread::Builder::new()
        .name("ltm-refresh".into())
        .spawn_scoped(scope, move || {
            if let Some(priority) = priority {
                match sched::promote_current_thread(priority) {
                    Ok(()) => debug!(priority, "refresh thread running as SCHED_FIFO"),
                    Err(e) => warn!(
                        priority,
                        error = %e,
                        "cannot switch refresh thread to SCHED_FIFO, expect flicker under load"
                    ),
                }
            }
            refresher.run(handoff, cancel)
        })
}

/// Join the refresh thread, turning a panic into an error
pub fn join_refresher(worker: ScopedJoinHandle<'_, Result<(), DisplayError>>) -> Result<()> {
    worker
        .join()
        .map_err(|_| anyhow!("refresh thread panicked"))?
        .context("refresh loop failed")
}

/// Threaded model
///
/// Returns the refresh half so the caller can shut the display down.
pub fn run_threaded<P, D, S>(
    session: DisplaySession<P, D>,
    commands: &Receiver<Command>,
    shutdown: &AtomicBool,
    stager_delay: S,
    priority: i32,
    slice: Duration,
) -> (Refresher<P, D>, Result<()>)
where
    P: GpioPort + Send,
    D: DelayNs + Send,
    S: DelayNs,
{
    let handoff: BufferHandoff = BufferHandoff::new();
    let (mut stager, mut refresher) = session.split(&handoff, stager_delay);
    let cancel = AtomicBool::new(false);

    let result = thread::scope(|s| {
        let worker = spawn_refresher(s, &mut refresher, &handoff, &cancel, Some(priority))
            .context("spawning refresh thread")?;

        while !shutdown.load(Ordering::Acquire) && !worker.is_finished() {
            if let Some(command) = next_command(commands, slice, slice, shutdown) {
                apply_to_stager(&mut stager, command);
            }
            if stager.is_pending() {
                stager.flush();
            }
        }

        cancel.store(true, Ordering::Release);
        join_refresher(worker)
    });

    (refresher, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltm_core::config::TransportPolicy;
    use ltm_core::DisplayConfig;
    use ltm_hal::mock::{NoopDelay, RecordingPort};
    use ltm_hal_linux::HybridDelay;
    use std::sync::mpsc;

    const SLICE: Duration = Duration::from_millis(1);

    fn session(port: &RecordingPort) -> DisplaySession<RecordingPort, NoopDelay> {
        let mut session = DisplaySession::new(port.clone(), NoopDelay, &DisplayConfig::default());
        session.start().unwrap();
        session
    }

    #[test]
    fn test_next_command_times_out() {
        let (_tx, rx) = mpsc::channel::<Command>();
        let start = Instant::now();
        let command = next_command(&rx, Duration::from_millis(5), SLICE, &AtomicBool::new(false));
        assert!(command.is_none());
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_next_command_returns_early() {
        let (tx, rx) = mpsc::channel();
        tx.send(Command::Num("1".into())).unwrap();
        let command = next_command(&rx, Duration::from_secs(5), SLICE, &AtomicBool::new(false));
        assert_eq!(command, Some(Command::Num("1".into())));
    }

    #[test]
    fn test_next_command_honours_shutdown() {
        let (_tx, rx) = mpsc::channel::<Command>();
        let start = Instant::now();
        let command = next_command(&rx, Duration::from_secs(5), SLICE, &AtomicBool::new(true));
        assert!(command.is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_cooperative_applies_commands() {
        let port = RecordingPort::new();
        let mut session = session(&port);
        let (tx, rx) = mpsc::channel();
        let shutdown = AtomicBool::new(false);

        tx.send(Command::Alpha("HELLO".into())).unwrap();
        tx.send(Command::Num("42".into())).unwrap();
        drop(tx);

        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(100));
                shutdown.store(true, Ordering::Release);
            });
            run_cooperative(&mut session, &rx, &shutdown, SLICE).unwrap();
        });

        assert_eq!(session.content().alphanumeric(), "HELLO");
        assert_eq!(session.content().numeric(), "42");
        assert!(port.write_count() > 0);
    }

    #[test]
    fn test_cooperative_stops_on_transport_error() {
        let port = RecordingPort::new();
        let mut session = session(&port);
        port.fail_write_at(port.write_count());
        let (_tx, rx) = mpsc::channel();

        let result = run_cooperative(&mut session, &rx, &AtomicBool::new(false), SLICE);
        assert!(matches!(result, Err(DisplayError::TransportError(_))));
    }

    #[test]
    fn test_skipped_bits_are_counted_and_reported() {
        let port = RecordingPort::new();
        let config = DisplayConfig {
            transport_policy: TransportPolicy::SkipBit,
            ..DisplayConfig::default()
        };
        let mut session = DisplaySession::new(port.clone(), NoopDelay, &config);
        session.start().unwrap();
        assert!(!report_skipped_bits(session.skipped_bits()));

        // Data write of the first bit of the next group
        port.fail_write_at(port.write_count() + 1);
        session.set_numeric("7");
        session.refresh_step().unwrap();

        assert_eq!(session.skipped_bits(), 1);
        assert!(report_skipped_bits(session.skipped_bits()));
    }

    #[test]
    fn test_threaded_hands_commands_to_refresher() {
        let port = RecordingPort::new();
        let session = session(&port);
        let (tx, rx) = mpsc::channel();
        let shutdown = AtomicBool::new(false);

        tx.send(Command::Alpha("THREAD".into())).unwrap();
        drop(tx);

        let (refresher, result) = thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(200));
                shutdown.store(true, Ordering::Release);
            });
            run_threaded(session, &rx, &shutdown, HybridDelay, 1, SLICE)
        });

        result.unwrap();
        let mut expected = ltm_core::FrameBuffer::new();
        expected.render_alphanumeric("THREAD");
        assert_eq!(refresher.frame(), &expected);
    }
}
