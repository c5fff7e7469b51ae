//! Record variants of the generalized hierarchical tree.

use serde::Serialize;

use super::cursor::Cursor;
use super::errors::DecodeResult;
use super::types::{BlockNumber, OffsetNumber, RelationLocator};

/// In-place update of one page: entries removed, entries added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageUpdateRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// Page being updated
    pub block: BlockNumber,
    /// Offsets removed from the page
    pub deleted: Vec<OffsetNumber>,
    /// Offsets added to the page
    pub inserted: Vec<OffsetNumber>,
}

impl PageUpdateRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        buf.extend_from_slice(&self.block.to_le_bytes());
        buf.extend_from_slice(&(self.deleted.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(self.inserted.len() as u16).to_le_bytes());
        for offset in self.deleted.iter().chain(&self.inserted) {
            buf.extend_from_slice(&offset.to_le_bytes());
        }
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        let relation = c.read_relation()?;
        let block = c.read_u32()?;
        let deleted_count = c.read_u16()? as usize;
        let inserted_count = c.read_u16()? as usize;
        c.expect_trailer(deleted_count + inserted_count, 2)?;
        let mut deleted = Vec::with_capacity(deleted_count);
        for _ in 0..deleted_count {
            deleted.push(c.read_u16()?);
        }
        let mut inserted = Vec::with_capacity(inserted_count);
        for _ in 0..inserted_count {
            inserted.push(c.read_u16()?);
        }
        Ok(Self {
            relation,
            block,
            deleted,
            inserted,
        })
    }
}

/// Split of one page into several. The trailer lists the produced pages;
/// the origin page is always the first entry and is rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSplitRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// The page that was split
    pub origin: BlockNumber,
    /// Produced pages, origin first
    pub pages: Vec<BlockNumber>,
}

impl PageSplitRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        buf.extend_from_slice(&self.origin.to_le_bytes());
        buf.extend_from_slice(&(self.pages.len() as u16).to_le_bytes());
        for block in &self.pages {
            buf.extend_from_slice(&block.to_le_bytes());
        }
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        let relation = c.read_relation()?;
        let origin = c.read_u32()?;
        let page_count = c.read_u16()? as usize;
        c.expect_trailer(page_count, 4)?;
        let mut pages = Vec::with_capacity(page_count);
        for _ in 0..page_count {
            pages.push(c.read_u32()?);
        }
        Ok(Self {
            relation,
            origin,
            pages,
        })
    }
}

/// Creation of a new empty index: the root page comes into existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateIndexRecord {
    /// Index relation
    pub relation: RelationLocator,
}

impl CreateIndexRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        Ok(Self {
            relation: c.read_relation()?,
        })
    }
}
