//! Daemon configuration
//!
//! Loaded from a TOML file with three tables:
//!
//! ```toml
//! [display]          # pins, timing, refresh cadence, failure policy
//! [gpio]             # backend = "cdev" | "sysfs", chip, sysfs_root
//! [daemon]           # command_path, model, realtime_priority
//! ```
//!
//! Every key is optional.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use ltm_core::DisplayConfig;
use ltm_hal_linux::GpioSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Config file read when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ltmd.toml";

/// Default command pipe
pub const DEFAULT_COMMAND_PATH: &str = "/run/ltmy2kd";

/// How refresh and command handling share the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// One loop alternates between refreshing and waiting for commands
    #[default]
    Cooperative,
    /// A real-time refresh thread, fed through the frame hand-off
    Threaded,
}

/// `[daemon]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonSettings {
    /// Command pipe or file; `-` reads standard input
    pub command_path: PathBuf,
    /// Create the pipe if it does not exist
    pub create_fifo: bool,
    /// Scheduling model
    pub model: Model,
    /// `SCHED_FIFO` priority for the refresh thread (threaded model)
    pub realtime_priority: i32,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            command_path: PathBuf::from(DEFAULT_COMMAND_PATH),
            create_fifo: true,
            model: Model::default(),
            realtime_priority: 1,
        }
    }
}

/// Complete daemon configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub display: DisplayConfig,
    pub gpio: GpioSettings,
    pub daemon: DaemonSettings,
}

impl DaemonConfig {
    /// Parse a TOML document
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        Ok(config)
    }

    /// Load and validate the configuration
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
    /// used if present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                Self::parse(&text).with_context(|| format!("in {}", path.display()))?
            }
            None => match fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(text) => Self::parse(&text).with_context(|| format!("in {}", DEFAULT_CONFIG_PATH))?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("no config file, using defaults");
                    Self::default()
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("reading config file {}", DEFAULT_CONFIG_PATH))
                }
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the daemon cannot run with
    pub fn validate(&self) -> Result<()> {
        self.display.validate().context("invalid [display] settings")?;

        if !(1..=99).contains(&self.daemon.realtime_priority) {
            bail!(
                "realtime_priority must be between 1 and 99, got {}",
                self.daemon.realtime_priority
            );
        }

        Ok(())
    }
}
