//! Record variants of the ordered balanced tree.
//!
//! Field sets are fixed per kind (see the catalog). Every struct here is
//! immutable once decoded and carries exactly the state replay needs to
//! reconstruct the affected pages without looking at neighboring records.

use serde::Serialize;

use super::cursor::Cursor;
use super::errors::DecodeResult;
use super::types::{
    BlockNumber, ItemAddress, OffsetNumber, RelationLocator, TransactionId,
};

/// Insertion of one entry, shared by the leaf / upper / meta kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// Where the entry landed
    pub target: ItemAddress,
}

impl InsertRecord {
    /// Creates an insert record.
    pub fn new(relation: RelationLocator, target: ItemAddress) -> Self {
        Self { relation, target }
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        self.target.encode_into(buf);
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        Ok(Self {
            relation: c.read_relation()?,
            target: c.read_item_address()?,
        })
    }
}

/// A page split. Four orientation variants share this layout; the trailer
/// lists the entries relocated to the new right sibling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// The page that was split (keeps the left half)
    pub left_sibling: BlockNumber,
    /// The new page holding the right half
    pub right_sibling: BlockNumber,
    /// The left page's right neighbor before the split
    pub next_right: BlockNumber,
    /// Tree level of the split page (0 = leaf)
    pub level: u32,
    /// First offset that moved to the right sibling
    pub first_right: OffsetNumber,
    /// Relocated entries, in order
    pub moved: Vec<ItemAddress>,
}

impl SplitRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        buf.extend_from_slice(&self.left_sibling.to_le_bytes());
        buf.extend_from_slice(&self.right_sibling.to_le_bytes());
        buf.extend_from_slice(&self.next_right.to_le_bytes());
        buf.extend_from_slice(&self.level.to_le_bytes());
        buf.extend_from_slice(&self.first_right.to_le_bytes());
        buf.extend_from_slice(&(self.moved.len() as u16).to_le_bytes());
        for item in &self.moved {
            item.encode_into(buf);
        }
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        let relation = c.read_relation()?;
        let left_sibling = c.read_u32()?;
        let right_sibling = c.read_u32()?;
        let next_right = c.read_u32()?;
        let level = c.read_u32()?;
        let first_right = c.read_u16()?;
        let moved_count = c.read_u16()?;
        c.expect_trailer(moved_count as usize, ItemAddress::ENCODED_LEN)?;
        let mut moved = Vec::with_capacity(moved_count as usize);
        for _ in 0..moved_count {
            moved.push(c.read_item_address()?);
        }
        Ok(Self {
            relation,
            left_sibling,
            right_sibling,
            next_right,
            level,
            first_right,
            moved,
        })
    }
}

/// Removal of dead entries from one page during vacuum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VacuumRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// Page being vacuumed
    pub block: BlockNumber,
    /// Highest block already vacuumed in this pass
    pub last_vacuumed: BlockNumber,
    /// Offsets removed from the page
    pub deleted: Vec<OffsetNumber>,
}

impl VacuumRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        buf.extend_from_slice(&self.block.to_le_bytes());
        buf.extend_from_slice(&self.last_vacuumed.to_le_bytes());
        encode_offsets(buf, &self.deleted);
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        let relation = c.read_relation()?;
        let block = c.read_u32()?;
        let last_vacuumed = c.read_u32()?;
        let deleted = decode_offsets(c)?;
        Ok(Self {
            relation,
            block,
            last_vacuumed,
            deleted,
        })
    }
}

/// Removal of entries whose heap rows are gone. Carries the heap relation
/// for diagnostics; replay mutates only the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// Index page the entries are removed from
    pub block: BlockNumber,
    /// Heap relation the dead rows lived in
    pub heap_relation: RelationLocator,
    /// Offsets removed from the page
    pub deleted: Vec<OffsetNumber>,
}

impl DeleteRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        buf.extend_from_slice(&self.block.to_le_bytes());
        self.heap_relation.encode_into(buf);
        encode_offsets(buf, &self.deleted);
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        let relation = c.read_relation()?;
        let block = c.read_u32()?;
        let heap_relation = c.read_relation()?;
        let deleted = decode_offsets(c)?;
        Ok(Self {
            relation,
            block,
            heap_relation,
            deleted,
        })
    }
}

/// Marks a leaf page half-dead: the parent downlink at `target` goes away
/// and the leaf waits for its unlink record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HalfDeadRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// Downlink being removed from the parent page
    pub target: ItemAddress,
    /// Top of the to-be-deleted chain (the pending downlink removal)
    pub top_parent: BlockNumber,
    /// The leaf page going half-dead
    pub leaf: BlockNumber,
    /// Leaf's left sibling
    pub left: BlockNumber,
    /// Leaf's right sibling
    pub right: BlockNumber,
}

impl HalfDeadRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        self.target.encode_into(buf);
        buf.extend_from_slice(&self.top_parent.to_le_bytes());
        buf.extend_from_slice(&self.leaf.to_le_bytes());
        buf.extend_from_slice(&self.left.to_le_bytes());
        buf.extend_from_slice(&self.right.to_le_bytes());
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        Ok(Self {
            relation: c.read_relation()?,
            target: c.read_item_address()?,
            top_parent: c.read_u32()?,
            leaf: c.read_u32()?,
            left: c.read_u32()?,
            right: c.read_u32()?,
        })
    }
}

/// Unlinks a half-dead page from the sibling chain. The `leaf_*` fields
/// carry the half-dead leaf's rewritten linkage for the case where the
/// dead page is an internal page of the chain, so the record's
/// precondition stays self-contained after a crash between records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlinkRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// The page leaving the tree
    pub dead: BlockNumber,
    /// Dead page's left sibling
    pub left_sibling: BlockNumber,
    /// Dead page's right sibling
    pub right_sibling: BlockNumber,
    /// Transactions at or above this id may still see the old contents
    pub removal_horizon: TransactionId,
    /// The half-dead leaf of the chain
    pub leaf: BlockNumber,
    /// Leaf's rewritten left sibling
    pub leaf_left: BlockNumber,
    /// Leaf's rewritten right sibling
    pub leaf_right: BlockNumber,
    /// Remaining top of the to-be-deleted chain
    pub top_parent: BlockNumber,
}

impl UnlinkRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        buf.extend_from_slice(&self.dead.to_le_bytes());
        buf.extend_from_slice(&self.left_sibling.to_le_bytes());
        buf.extend_from_slice(&self.right_sibling.to_le_bytes());
        buf.extend_from_slice(&self.removal_horizon.to_le_bytes());
        buf.extend_from_slice(&self.leaf.to_le_bytes());
        buf.extend_from_slice(&self.leaf_left.to_le_bytes());
        buf.extend_from_slice(&self.leaf_right.to_le_bytes());
        buf.extend_from_slice(&self.top_parent.to_le_bytes());
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        Ok(Self {
            relation: c.read_relation()?,
            dead: c.read_u32()?,
            left_sibling: c.read_u32()?,
            right_sibling: c.read_u32()?,
            removal_horizon: c.read_u32()?,
            leaf: c.read_u32()?,
            leaf_left: c.read_u32()?,
            leaf_right: c.read_u32()?,
            top_parent: c.read_u32()?,
        })
    }
}

/// Installs a new root above exactly the two children named here. The
/// record is authoritative about the expected tree shape; replay checks
/// the children rather than inferring them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRootRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// Block of the new root page
    pub root: BlockNumber,
    /// Level of the new root
    pub level: u32,
    /// Left child (the page that was split)
    pub left_child: BlockNumber,
    /// Right child (the new sibling)
    pub right_child: BlockNumber,
}

impl NewRootRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        buf.extend_from_slice(&self.root.to_le_bytes());
        buf.extend_from_slice(&self.level.to_le_bytes());
        buf.extend_from_slice(&self.left_child.to_le_bytes());
        buf.extend_from_slice(&self.right_child.to_le_bytes());
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        Ok(Self {
            relation: c.read_relation()?,
            root: c.read_u32()?,
            level: c.read_u32()?,
            left_child: c.read_u32()?,
            right_child: c.read_u32()?,
        })
    }
}

/// Makes an unlinked page available for reuse, guarded by the removal
/// horizon recorded at its deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReuseRecord {
    /// Index relation
    pub relation: RelationLocator,
    /// The block being made reusable
    pub block: BlockNumber,
    /// No transaction older than this may still be active
    pub removal_horizon: TransactionId,
}

impl ReuseRecord {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        self.relation.encode_into(buf);
        buf.extend_from_slice(&self.block.to_le_bytes());
        buf.extend_from_slice(&self.removal_horizon.to_le_bytes());
    }

    pub(crate) fn decode(c: &mut Cursor<'_>) -> DecodeResult<Self> {
        Ok(Self {
            relation: c.read_relation()?,
            block: c.read_u32()?,
            removal_horizon: c.read_u32()?,
        })
    }
}

pub(crate) fn encode_offsets(buf: &mut Vec<u8>, offsets: &[OffsetNumber]) {
    buf.extend_from_slice(&(offsets.len() as u16).to_le_bytes());
    for offset in offsets {
        buf.extend_from_slice(&offset.to_le_bytes());
    }
}

pub(crate) fn decode_offsets(c: &mut Cursor<'_>) -> DecodeResult<Vec<OffsetNumber>> {
    let count = c.read_u16()?;
    c.expect_trailer(count as usize, 2)?;
    let mut offsets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        offsets.push(c.read_u16()?);
    }
    Ok(offsets)
}
