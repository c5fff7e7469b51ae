//! Frame reader: strictly sequential recovery-side streaming.
//!
//! Reads frames in file order, validating length sanity and checksum on
//! every frame before handing it out. A partial frame at the end of the
//! file is the clean end of the log; the bytes never fully reached disk
//! and are treated as if never written. Everything else that fails a
//! check is corruption and fatal.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::{checksum, Frame, FrameError, FrameResult, FRAME_OVERHEAD, MAX_FRAME_LEN};

/// Sequential reader over a frame log file.
pub struct FrameReader {
    path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    partial_tail: bool,
}

impl FrameReader {
    /// Opens a log file for sequential reading from the start.
    pub fn open(path: &Path) -> FrameResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            partial_tail: false,
        })
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next unread frame.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// True if the stream ended on a partial frame rather than a clean
    /// frame boundary. Informational: a partial tail is still a clean
    /// end of recovery.
    pub fn ended_with_partial_frame(&self) -> bool {
        self.partial_tail
    }

    /// Reads the next frame.
    ///
    /// Returns `Ok(Some(frame))` on success, `Ok(None)` at the end of
    /// the log (including a torn tail), and `Err` on corruption.
    pub fn read_next(&mut self) -> FrameResult<Option<Frame>> {
        let mut len_buf = [0u8; 4];
        match read_exact_or_eof(&mut self.reader, &mut len_buf)? {
            ReadOutcome::Complete => {}
            ReadOutcome::CleanEof => return Ok(None),
            ReadOutcome::PartialEof => {
                self.partial_tail = true;
                return Ok(None);
            }
        }

        let total_len = u32::from_le_bytes(len_buf) as usize;
        if total_len < FRAME_OVERHEAD || total_len > MAX_FRAME_LEN {
            return Err(FrameError::corruption(
                self.current_offset,
                format!("implausible frame length {}", total_len),
            ));
        }

        let mut rest = vec![0u8; total_len - 4];
        match read_exact_or_eof(&mut self.reader, &mut rest)? {
            ReadOutcome::Complete => {}
            ReadOutcome::CleanEof | ReadOutcome::PartialEof => {
                self.partial_tail = true;
                return Ok(None);
            }
        }

        let crc_offset = rest.len() - 4;
        let stored_crc = u32::from_le_bytes([
            rest[crc_offset],
            rest[crc_offset + 1],
            rest[crc_offset + 2],
            rest[crc_offset + 3],
        ]);
        let mut checked = Vec::with_capacity(total_len - 4);
        checked.extend_from_slice(&len_buf);
        checked.extend_from_slice(&rest[..crc_offset]);
        if !checksum::verify_checksum(&checked, stored_crc) {
            return Err(FrameError::corruption(
                self.current_offset,
                "frame checksum mismatch",
            ));
        }

        let access_method = rest[0];
        let kind = rest[1];
        let position = u64::from_le_bytes([
            rest[2], rest[3], rest[4], rest[5], rest[6], rest[7], rest[8], rest[9],
        ]);
        let payload = rest[10..crc_offset].to_vec();

        self.current_offset += total_len as u64;
        Ok(Some(Frame {
            position,
            access_method,
            kind,
            payload,
        }))
    }

    /// Reads every remaining frame. Convenience for inspection tooling.
    pub fn read_all(&mut self) -> FrameResult<Vec<Frame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.read_next()? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

enum ReadOutcome {
    Complete,
    CleanEof,
    PartialEof,
}

fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> FrameResult<ReadOutcome> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Ok(if filled == 0 {
                    ReadOutcome::CleanEof
                } else {
                    ReadOutcome::PartialEof
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::Io(e)),
        }
    }
    Ok(ReadOutcome::Complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameWriter;
    use std::fs;
    use tempfile::TempDir;

    fn sample_frame(position: u64, payload: Vec<u8>) -> Frame {
        Frame {
            position,
            access_method: 0,
            kind: 0,
            payload,
        }
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("structural.log");

        let frames = vec![
            sample_frame(1, vec![1, 2, 3]),
            sample_frame(2, vec![]),
            sample_frame(3, vec![9; 100]),
        ];
        {
            let mut writer = FrameWriter::open(&path).unwrap();
            for frame in &frames {
                writer.append(frame).unwrap();
            }
            writer.sync().unwrap();
        }

        let mut reader = FrameReader::open(&path).unwrap();
        let read = reader.read_all().unwrap();
        assert_eq!(read, frames);
        assert!(!reader.ended_with_partial_frame());
    }

    #[test]
    fn test_torn_tail_is_clean_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("structural.log");
        {
            let mut writer = FrameWriter::open(&path).unwrap();
            writer.append(&sample_frame(1, vec![1, 2, 3])).unwrap();
            writer.append(&sample_frame(2, vec![4, 5, 6])).unwrap();
            writer.sync().unwrap();
        }

        // Cut the second frame short, as a crash mid-append would.
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 5]).unwrap();

        let mut reader = FrameReader::open(&path).unwrap();
        let read = reader.read_all().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].position, 1);
        assert!(reader.ended_with_partial_frame());
    }

    #[test]
    fn test_corrupt_payload_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("structural.log");
        {
            let mut writer = FrameWriter::open(&path).unwrap();
            writer.append(&sample_frame(1, vec![1, 2, 3, 4, 5])).unwrap();
            writer.sync().unwrap();
        }

        let mut bytes = fs::read(&path).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let mut reader = FrameReader::open(&path).unwrap();
        let result = reader.read_next();
        assert!(matches!(result, Err(FrameError::Corruption { .. })));
    }

    #[test]
    fn test_implausible_length_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("structural.log");
        fs::write(&path, 3u32.to_le_bytes()).unwrap();

        let mut reader = FrameReader::open(&path).unwrap();
        let result = reader.read_next();
        assert!(matches!(result, Err(FrameError::Corruption { .. })));
    }

    #[test]
    fn test_empty_log_is_clean_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("structural.log");
        fs::write(&path, b"").unwrap();

        let mut reader = FrameReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_none());
        assert!(!reader.ended_with_partial_frame());
    }
}
