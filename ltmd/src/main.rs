//! ltmd - LTM-Y2K19JF-03 display daemon
//!
//! Keeps the display refreshed and updates it from `ALPHA`/`NUM` commands
//! written to a named pipe (`/run/ltmy2kd` by default):
//!
//! ```text
//! echo "ALPHA HELLO" > /run/ltmy2kd
//! echo "NUM 42" > /run/ltmy2kd
//! ```

#![deny(unsafe_code)]

mod command;
mod config;
mod input;
mod runner;
mod signals;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ltm_core::DisplaySession;
use ltm_hal_linux::{BackendKind, GpioBackend, HybridDelay};
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{DaemonConfig, Model};

#[derive(Parser)]
#[command(name = "ltmd")]
#[command(version, about = "LTM-Y2K19JF-03 display daemon", long_about = None)]
struct Cli {
    /// Configuration file (defaults to /etc/ltmd.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GPIO backend, overriding the config file
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the display from the command pipe (default)
    Run {
        /// Command pipe or file, `-` for standard input
        #[arg(long)]
        command_path: Option<PathBuf>,

        /// Scheduling model
        #[arg(short, long, value_enum)]
        model: Option<Model>,
    },

    /// Light every segment bit position in turn
    SegmentTest {
        /// Time to show each position, in milliseconds
        #[arg(short, long, default_value_t = 3000)]
        dwell_ms: u64,
    },
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .finish()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = DaemonConfig::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.gpio.backend = backend;
    }
    let command = cli.command.unwrap_or(Commands::Run {
        command_path: None,
        model: None,
    });
    if let Commands::Run { command_path, model } = &command {
        if let Some(path) = command_path {
            config.daemon.command_path = path.clone();
        }
        if let Some(model) = model {
            config.daemon.model = *model;
        }
    }

    let shutdown = signals::install().context("installing signal handlers")?;

    let gpio = GpioBackend::from_settings(&config.gpio);
    info!(backend = %gpio.kind(), "GPIO backend selected");
    if gpio.kind() == BackendKind::Sysfs {
        warn!("sysfs GPIO is slow; expect visible flicker");
    }

    let mut session = DisplaySession::new(gpio, HybridDelay, &config.display);
    session.start().context("initializing display")?;
    info!(pins = ?config.display.pins, "display initialized");

    let slice = Duration::from_millis(u64::from(config.display.refresh.idle_poll_ms));
    let priority = config.daemon.realtime_priority;

    let (result, skipped, stopped) = match command {
        Commands::Run { .. } => {
            let commands = input::spawn_reader(&config.daemon)?;
            info!(
                path = %config.daemon.command_path.display(),
                model = ?config.daemon.model,
                "waiting for commands"
            );

            match config.daemon.model {
                Model::Cooperative => {
                    let result = runner::run_cooperative(&mut session, &commands, shutdown, slice)
                        .context("refresh loop failed");
                    (result, session.skipped_bits(), session.shutdown())
                }
                Model::Threaded => {
                    let (mut refresher, result) =
                        runner::run_threaded(session, &commands, shutdown, HybridDelay, priority, slice);
                    (result, refresher.skipped_bits(), refresher.shutdown())
                }
            }
        }
        Commands::SegmentTest { dwell_ms } => {
            let (mut refresher, result) = segment_test::run(
                session,
                shutdown,
                HybridDelay,
                priority,
                Duration::from_millis(dwell_ms),
                slice,
            );
            (result, refresher.skipped_bits(), refresher.shutdown())
        }
    };

    runner::report_skipped_bits(skipped);
    match stopped {
        Ok(()) => info!("display reset, pins released"),
        Err(e) => warn!(error = %e, "display shutdown incomplete"),
    }

    result
}
