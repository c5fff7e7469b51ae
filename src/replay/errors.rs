//! Replay error types.
//!
//! Every replay error is FATAL: recovery stops entirely rather than
//! continuing past a record it cannot apply faithfully. There is no
//! partial-database mode; a log that cannot be replayed to the end
//! requires restoring from a prior backup or checkpoint.

use std::fmt;

use crate::dispatch::DispatchError;
use crate::frame::FrameError;
use crate::record::{LogPosition, PageAddress};

/// Severity of a replay error. Replay knows only one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recovery must halt immediately
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Replay error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayErrorCode {
    /// Log stream carries an access method this build does not know
    UnknownAccessMethod,
    /// Known access method, unknown record kind
    UnknownRecordKind,
    /// Frame-level corruption: checksum, framing, ordering
    LogCorruption,
    /// Record bytes inconsistent with their declared layout
    MalformedRecord,
    /// A page-level invariant would be violated by applying the record
    InvariantViolation,
    /// Any other unrecoverable replay failure
    ReplayFailed,
}

impl ReplayErrorCode {
    /// Stable string code for logs and operator tooling.
    pub fn code(&self) -> &'static str {
        match self {
            ReplayErrorCode::UnknownAccessMethod => "TREEWAL_UNKNOWN_ACCESS_METHOD",
            ReplayErrorCode::UnknownRecordKind => "TREEWAL_UNKNOWN_RECORD_KIND",
            ReplayErrorCode::LogCorruption => "TREEWAL_LOG_CORRUPTION",
            ReplayErrorCode::MalformedRecord => "TREEWAL_MALFORMED_RECORD",
            ReplayErrorCode::InvariantViolation => "TREEWAL_INVARIANT_VIOLATION",
            ReplayErrorCode::ReplayFailed => "TREEWAL_REPLAY_FAILED",
        }
    }

    /// Severity. Uniformly fatal.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for ReplayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A replay failure with its code and context.
#[derive(Debug)]
pub struct ReplayError {
    code: ReplayErrorCode,
    message: String,
    position: Option<LogPosition>,
}

impl ReplayError {
    /// Unknown access method in the stream: version mismatch, abort.
    pub fn unknown_access_method(tag: u8) -> Self {
        Self {
            code: ReplayErrorCode::UnknownAccessMethod,
            message: format!("access method tag {} is not recognized by this build", tag),
            position: None,
        }
    }

    /// Unknown kind under a recognized access method.
    pub fn unknown_kind(method: impl fmt::Display, kind_tag: u8) -> Self {
        Self {
            code: ReplayErrorCode::UnknownRecordKind,
            message: format!(
                "record kind {} is not recognized for access method {}",
                kind_tag, method
            ),
            position: None,
        }
    }

    /// Frame or ordering corruption.
    pub fn corruption(reason: impl Into<String>) -> Self {
        Self {
            code: ReplayErrorCode::LogCorruption,
            message: reason.into(),
            position: None,
        }
    }

    /// Record bytes disagree with their declared layout.
    pub fn malformed(position: LogPosition, reason: impl Into<String>) -> Self {
        Self {
            code: ReplayErrorCode::MalformedRecord,
            message: reason.into(),
            position: Some(position),
        }
    }

    /// Applying the record would violate a page-level invariant.
    pub fn invariant(position: LogPosition, reason: impl Into<String>) -> Self {
        Self {
            code: ReplayErrorCode::InvariantViolation,
            message: reason.into(),
            position: Some(position),
        }
    }

    /// A record addressed a page that does not exist.
    pub fn missing_page(position: LogPosition, addr: PageAddress) -> Self {
        Self {
            code: ReplayErrorCode::InvariantViolation,
            message: format!("target page {} does not exist", addr),
            position: Some(position),
        }
    }

    /// Any other unrecoverable failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            code: ReplayErrorCode::ReplayFailed,
            message: reason.into(),
            position: None,
        }
    }

    /// The error code.
    pub fn code(&self) -> ReplayErrorCode {
        self.code
    }

    /// The severity. Always `Fatal`.
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Log position of the offending record, when known.
    pub fn position(&self) -> Option<LogPosition> {
        self.position
    }

    /// True for every replay error.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code.code(), self.message)?;
        if let Some(position) = self.position {
            write!(f, " (record position {})", position)?;
        }
        Ok(())
    }
}

impl std::error::Error for ReplayError {}

impl From<DispatchError> for ReplayError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::UnknownAccessMethod(tag) => ReplayError::unknown_access_method(tag),
            DispatchError::UnknownKind { method, kind_tag } => {
                ReplayError::unknown_kind(method, kind_tag)
            }
        }
    }
}

impl From<FrameError> for ReplayError {
    fn from(e: FrameError) -> Self {
        ReplayError::corruption(e.to_string())
    }
}

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;
