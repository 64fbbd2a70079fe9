//! Command input
//!
//! Commands arrive line by line on a named pipe (or standard input). A
//! reader thread parses them and forwards them over a channel, so neither
//! scheduling model ever blocks on the pipe. When the last writer closes a
//! pipe, the reader reopens it and waits for the next one.

use std::ffi::CString;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::command::{parse_command, Command, CommandError};
use crate::config::DaemonSettings;

/// Where commands come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSource {
    /// Standard input; ends at EOF
    Stdin,
    /// A named pipe (reopened at EOF) or a regular file (read once)
    Path(PathBuf),
}

impl CommandSource {
    /// `-` selects standard input
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            CommandSource::Stdin
        } else {
            CommandSource::Path(path.to_path_buf())
        }
    }
}

/// Create a named pipe at `path` unless something is already there
#[allow(unsafe_code)]
pub fn ensure_fifo(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Ok(());
    }

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o640) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        // Lost a race with another creator
        if err.kind() != io::ErrorKind::AlreadyExists {
            return Err(err);
        }
    }

    info!(path = %path.display(), "created command pipe");
    Ok(())
}

/// Forward every command in `reader` to `tx`
///
/// Returns `false` once the receiving side has gone away.
pub fn forward_commands<R: BufRead>(reader: R, tx: &Sender<Command>) -> bool {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to read command");
                break;
            }
        };

        match parse_command(&line) {
            Ok(command) => {
                debug!(?command, "command received");
                if tx.send(command).is_err() {
                    return false;
                }
            }
            Err(CommandError::Empty) => {}
            Err(e) => warn!(error = %e, "ignoring command"),
        }
    }
    true
}

fn read_source(source: CommandSource, tx: Sender<Command>) {
    match source {
        CommandSource::Stdin => {
            forward_commands(io::stdin().lock(), &tx);
            debug!("standard input closed");
        }
        CommandSource::Path(path) => loop {
            // Opening a pipe blocks until a writer shows up
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot open command source");
                    return;
                }
            };
            let is_fifo = file
                .metadata()
                .map(|m| m.file_type().is_fifo())
                .unwrap_or(false);

            if !forward_commands(BufReader::new(file), &tx) {
                return;
            }
            if !is_fifo {
                debug!(path = %path.display(), "command file fully read");
                return;
            }
        },
    }
}

/// Start the reader thread for the configured command path
pub fn spawn_reader(settings: &DaemonSettings) -> Result<Receiver<Command>> {
    let source = CommandSource::from_path(&settings.command_path);

    if let CommandSource::Path(path) = &source {
        if settings.create_fifo {
            ensure_fifo(path).with_context(|| format!("creating command pipe {}", path.display()))?;
        }
    }

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("ltm-commands".into())
        .spawn(move || read_source(source, tx))
        .context("spawning command reader")?;

    Ok(rx)
}
