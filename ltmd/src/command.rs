//! Command line grammar
//!
//! One command per line:
//!
//! ```text
//! ALPHA <text>    show up to 7 characters in the alphanumeric region
//! NUM <text>      show up to 4 characters in the numeric region
//! ```
//!
//! The text is everything after the single space following the verb, so
//! leading spaces are kept. A verb with no text clears its region.

use std::fmt;

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set the alphanumeric text
    Alpha(String),
    /// Set the numeric text
    Num(String),
}

/// Reasons a line is not a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line
    Empty,
    /// First word is not a known verb
    UnknownVerb(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::UnknownVerb(verb) => write!(f, "unknown command '{}'", verb),
        }
    }
}

impl std::error::Error for CommandError {}

/// Parse one line
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']).trim_start_matches(' ');
    if line.is_empty() {
        return Err(CommandError::Empty);
    }

    let (verb, text) = line.split_once(' ').unwrap_or((line, ""));
    match verb {
        "ALPHA" => Ok(Command::Alpha(text.to_string())),
        "NUM" => Ok(Command::Num(text.to_string())),
        other => Err(CommandError::UnknownVerb(other.to_string())),
    }
}
