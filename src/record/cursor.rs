//! Bounds-checked field extraction over a raw record buffer.
//!
//! All reads are explicit and little-endian; a read past the end yields
//! `Truncated` instead of reinterpreting memory. The trailer check turns
//! a count-field/byte-count disagreement into `Malformed` before any
//! trailer element is read.

use super::errors::{DecodeError, DecodeResult};
use super::types::{ItemAddress, RelationLocator};

pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, width: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < width {
            return Err(DecodeError::Truncated {
                needed: self.pos + width,
                have: self.buf.len(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + width];
        self.pos += width;
        Ok(bytes)
    }

    pub(crate) fn read_u16(&mut self) -> DecodeResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u32(&mut self) -> DecodeResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_relation(&mut self) -> DecodeResult<RelationLocator> {
        Ok(RelationLocator {
            tablespace: self.read_u32()?,
            database: self.read_u32()?,
            relation: self.read_u32()?,
        })
    }

    pub(crate) fn read_item_address(&mut self) -> DecodeResult<ItemAddress> {
        Ok(ItemAddress {
            block: self.read_u32()?,
            offset: self.read_u16()?,
        })
    }

    /// Checks that exactly `count * element_width` bytes remain. Called
    /// after the fixed header is consumed, before the trailer is read.
    pub(crate) fn expect_trailer(&self, count: usize, element_width: usize) -> DecodeResult<()> {
        let expected = count * element_width;
        if self.remaining() != expected {
            return Err(DecodeError::malformed(format!(
                "trailer declares {} bytes ({} elements), buffer holds {}",
                expected,
                count,
                self.remaining()
            )));
        }
        Ok(())
    }

    /// Checks that the buffer is fully consumed; excess bytes after a
    /// fixed-layout record are corruption, not padding.
    pub(crate) fn expect_end(&self) -> DecodeResult<()> {
        if self.remaining() != 0 {
            return Err(DecodeError::malformed(format!(
                "{} unexpected bytes after record",
                self.remaining()
            )));
        }
        Ok(())
    }
}
