//! Log frame layer: the sequential transport that carries structural
//! records during recovery and inspection.
//!
//! Each record travels inside a frame:
//!
//! ```text
//! total_len (u32 LE) | access_method (u8) | kind (u8) |
//! position (u64 LE)  | payload (variable) | crc32 (u32 LE)
//! ```
//!
//! `total_len` covers the whole frame including itself and the checksum;
//! the checksum covers everything before it. The payload is the record
//! image the decoder understands. Frames are written in ascending
//! position order by a single writer and read back strictly
//! sequentially.
//!
//! A partial frame at the physical end of the file is a clean end of
//! log, not an error: the producer was cut off mid-append and the tail
//! never took effect. A checksum mismatch anywhere is fatal corruption.

mod checksum;
mod reader;
mod writer;

pub use checksum::{compute_checksum, verify_checksum};
pub use reader::FrameReader;
pub use writer::FrameWriter;

use thiserror::Error;

use crate::record::{LogPosition, LogRecord};

/// Fixed overhead of a frame: length + tags + position + checksum.
pub const FRAME_OVERHEAD: usize = 4 + 1 + 1 + 8 + 4;

/// Upper bound on a single frame; anything larger is corruption.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// One frame as read from or written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Log position the record was produced at; strictly ascending
    pub position: LogPosition,
    /// Raw access-method tag
    pub access_method: u8,
    /// Raw kind tag
    pub kind: u8,
    /// Record image, decoded separately
    pub payload: Vec<u8>,
}

impl Frame {
    /// Frames a producer-side record at a position.
    pub fn from_record(position: LogPosition, record: &LogRecord) -> Self {
        Self {
            position,
            access_method: record.access_method().as_u8(),
            kind: record.kind().kind_tag(),
            payload: record.encode(),
        }
    }

    /// Serializes the frame, checksum included.
    pub fn encode(&self) -> Vec<u8> {
        let total_len = FRAME_OVERHEAD + self.payload.len();
        let mut buf = Vec::with_capacity(total_len);
        buf.extend_from_slice(&(total_len as u32).to_le_bytes());
        buf.push(self.access_method);
        buf.push(self.kind);
        buf.extend_from_slice(&self.position.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        let crc = compute_checksum(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf
    }
}

/// Frame-layer failure. Corruption is fatal; recovery halts.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Underlying file error
    #[error("log i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural or checksum corruption at a byte offset
    #[error("log corruption at offset {offset}: {reason}")]
    Corruption {
        /// Byte offset of the corrupt frame
        offset: u64,
        /// What failed
        reason: String,
    },
}

impl FrameError {
    pub(crate) fn corruption(offset: u64, reason: impl Into<String>) -> Self {
        FrameError::Corruption {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for frame operations.
pub type FrameResult<T> = Result<T, FrameError>;
