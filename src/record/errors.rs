//! Decode error taxonomy.
//!
//! `Truncated` is expected only at the physical end of the log and is
//! treated by the recovery loop as a clean end, never mid-stream.
//! `Malformed` means the byte count disagrees with what the record's own
//! count fields declare; that is corruption and always fatal.

use thiserror::Error;

/// Failure to turn a raw record buffer into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes present than the kind's fixed header requires.
    #[error("record truncated: header needs {needed} bytes, have {have}")]
    Truncated {
        /// Fixed header size of the kind being decoded
        needed: usize,
        /// Bytes actually present
        have: usize,
    },

    /// Byte count inconsistent with the declared trailer length.
    #[error("record malformed: {reason}")]
    Malformed {
        /// What disagreed with what
        reason: String,
    },
}

impl DecodeError {
    /// Builds a `Malformed` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            reason: reason.into(),
        }
    }
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
