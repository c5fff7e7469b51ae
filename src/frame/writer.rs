//! Frame writer: the producer side of the log stream.
//!
//! A single writer appends frames in ascending position order. The
//! replay core itself never writes frames; this exists for the
//! operations that produce structural records and for building log
//! streams in tests and tooling.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::record::{LogPosition, LogRecord};

use super::{Frame, FrameError, FrameResult};

/// Appending writer over a frame log file.
pub struct FrameWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    last_position: LogPosition,
}

impl FrameWriter {
    /// Opens (creating if absent) a log file for appending.
    pub fn open(path: &Path) -> FrameResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            last_position: 0,
        })
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one frame. Positions must be strictly ascending within a
    /// writer; the single-writer rule makes this a pure local check.
    pub fn append(&mut self, frame: &Frame) -> FrameResult<()> {
        if frame.position <= self.last_position {
            return Err(FrameError::corruption(
                0,
                format!(
                    "append position {} not above last written position {}",
                    frame.position, self.last_position
                ),
            ));
        }
        self.writer.write_all(&frame.encode())?;
        self.last_position = frame.position;
        Ok(())
    }

    /// Encodes and appends a record at a position.
    pub fn append_record(&mut self, position: LogPosition, record: &LogRecord) -> FrameResult<()> {
        self.append(&Frame::from_record(position, record))
    }

    /// Flushes buffered frames and syncs file data to disk.
    pub fn sync(&mut self) -> FrameResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }
}

impl Drop for FrameWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
