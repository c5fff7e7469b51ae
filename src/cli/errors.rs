//! CLI error type.
//!
//! Inspection is a diagnostics consumer: unknown kinds degrade to an
//! "unknown" line and never land here. What does land here is fatal for
//! the tool: an unreadable or corrupt log, an access method this build
//! does not know, or a record that fails its own layout.

use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::frame::FrameError;
use crate::record::{DecodeError, LogPosition};

/// Failure of a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Frame-level read or corruption failure
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Unrecognized access method in the stream
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A known kind whose payload fails its layout
    #[error("record at position {position} is undecodable: {source}")]
    Decode {
        /// Log position of the bad record
        position: LogPosition,
        /// The decode failure
        source: DecodeError,
    },

    /// Output stream failure
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
