//! Core identifier types shared by every structural log record.
//!
//! These are plain fixed-width values. A relation is addressed by a
//! three-part locator, a page by (locator, block number), and an entry
//! within a page by (block number, offset number). All of them are
//! immutable once assigned and carry no behavior beyond encoding and
//! display.

use std::fmt;

use serde::Serialize;

/// Block number within a relation.
pub type BlockNumber = u32;

/// Sentinel for "no block" (end of a sibling chain, absent neighbor).
pub const NO_BLOCK: BlockNumber = 0xFFFF_FFFF;

/// Offset of an entry within a page.
pub type OffsetNumber = u16;

/// Transaction identifier. Removal-horizon values are of this type.
pub type TransactionId = u32;

/// Monotonically increasing position of a record in the append-only log.
///
/// `0` is reserved: a fresh page header carries `0` as "no record has
/// ever been applied here", so every real record position is `> 0`.
pub type LogPosition = u64;

/// Physical identity of a relation: (tablespace, database, relation).
///
/// Stable for the lifetime of the relation. The replay core carries the
/// locator through; it never asks the relation metadata provider to
/// validate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelationLocator {
    /// Tablespace identifier
    pub tablespace: u32,
    /// Database identifier
    pub database: u32,
    /// Relation identifier
    pub relation: u32,
}

impl RelationLocator {
    /// Encoded width in bytes: three little-endian u32 fields.
    pub const ENCODED_LEN: usize = 12;

    /// Creates a locator from its three parts.
    pub fn new(tablespace: u32, database: u32, relation: u32) -> Self {
        Self {
            tablespace,
            database,
            relation,
        }
    }

    /// Appends the encoded form (tablespace, database, relation; LE).
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.tablespace.to_le_bytes());
        buf.extend_from_slice(&self.database.to_le_bytes());
        buf.extend_from_slice(&self.relation.to_le_bytes());
    }
}

impl fmt::Display for RelationLocator {
    /// Renders as `spc/db/rel`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tablespace, self.database, self.relation)
    }
}

/// Address of one entry within a page: (block, offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ItemAddress {
    /// Block number of the page holding the entry
    pub block: BlockNumber,
    /// Offset of the entry within the page
    pub offset: OffsetNumber,
}

impl ItemAddress {
    /// Encoded width in bytes: u32 block + u16 offset.
    pub const ENCODED_LEN: usize = 6;

    /// Creates an item address.
    pub fn new(block: BlockNumber, offset: OffsetNumber) -> Self {
        Self { block, offset }
    }

    /// Appends the encoded form (block, offset; LE).
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.block.to_le_bytes());
        buf.extend_from_slice(&self.offset.to_le_bytes());
    }
}

impl fmt::Display for ItemAddress {
    /// Renders as `block/offset`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.block, self.offset)
    }
}

/// Address of one page: (relation locator, block number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PageAddress {
    /// The relation the page belongs to
    pub relation: RelationLocator,
    /// Block number within the relation
    pub block: BlockNumber,
}

impl PageAddress {
    /// Creates a page address.
    pub fn new(relation: RelationLocator, block: BlockNumber) -> Self {
        Self { relation, block }
    }
}

impl fmt::Display for PageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blk {}", self.relation, self.block)
    }
}

/// The two access methods whose structural records this core understands.
///
/// The set is closed and versioned with the on-disk format; it never
/// changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum AccessMethod {
    /// Ordered balanced tree
    Ordered = 0,
    /// Generalized hierarchical tree
    Hierarchical = 1,
}

impl AccessMethod {
    /// Convert from the wire tag, `None` for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AccessMethod::Ordered),
            1 => Some(AccessMethod::Hierarchical),
            _ => None,
        }
    }

    /// Convert to the wire tag.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Short lowercase name used in diagnostics output.
    pub fn name(self) -> &'static str {
        match self {
            AccessMethod::Ordered => "ordered",
            AccessMethod::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Record kinds of the ordered balanced tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum OrderedKind {
    /// Insert an entry into a leaf page
    InsertLeaf = 0,
    /// Insert a downlink into an upper page
    InsertUpper = 1,
    /// Insert that also updates the meta page
    InsertMeta = 2,
    /// Split, new entry went to the left half
    SplitLeft = 3,
    /// Split, new entry went to the right half
    SplitRight = 4,
    /// Split of the root, new entry left
    SplitLeftRoot = 5,
    /// Split of the root, new entry right
    SplitRightRoot = 6,
    /// Remove dead entries from a page during vacuum
    VacuumPage = 7,
    /// Remove entries whose heap rows are gone
    DeleteEntries = 8,
    /// Mark a leaf page half-dead, removing its parent downlink
    MarkPageHalfDead = 9,
    /// Unlink a half-dead page from the sibling chain
    UnlinkPage = 10,
    /// Unlink that also updates the meta page
    UnlinkPageMeta = 11,
    /// Install a new root above two existing children
    NewRoot = 12,
    /// Make an unlinked page available for reuse
    ReusePage = 13,
}

impl OrderedKind {
    /// Every ordered-tree kind, in tag order.
    pub const ALL: [OrderedKind; 14] = [
        OrderedKind::InsertLeaf,
        OrderedKind::InsertUpper,
        OrderedKind::InsertMeta,
        OrderedKind::SplitLeft,
        OrderedKind::SplitRight,
        OrderedKind::SplitLeftRoot,
        OrderedKind::SplitRightRoot,
        OrderedKind::VacuumPage,
        OrderedKind::DeleteEntries,
        OrderedKind::MarkPageHalfDead,
        OrderedKind::UnlinkPage,
        OrderedKind::UnlinkPageMeta,
        OrderedKind::NewRoot,
        OrderedKind::ReusePage,
    ];

    /// Convert from the wire tag, `None` for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Convert to the wire tag.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Record kinds of the generalized hierarchical tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum HierarchicalKind {
    /// In-place page update (entries removed and added)
    UpdatePage = 0,
    /// Split of one page into several
    SplitPage = 1,
    /// Creation of a new empty index
    CreateIndex = 2,
}

impl HierarchicalKind {
    /// Every hierarchical-tree kind, in tag order.
    pub const ALL: [HierarchicalKind; 3] = [
        HierarchicalKind::UpdatePage,
        HierarchicalKind::SplitPage,
        HierarchicalKind::CreateIndex,
    ];

    /// Convert from the wire tag, `None` for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Convert to the wire tag.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A fully resolved (access method, kind) pair.
///
/// Resolution from raw tags happens in the dispatcher; everything past
/// that point works with this closed type and has no unknown case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A kind of the ordered balanced tree
    Ordered(OrderedKind),
    /// A kind of the generalized hierarchical tree
    Hierarchical(HierarchicalKind),
}

impl RecordKind {
    /// Resolve raw tags into a typed kind, `None` if the kind tag is not
    /// in the closed enumeration for the access method.
    pub fn resolve(method: AccessMethod, kind_tag: u8) -> Option<Self> {
        match method {
            AccessMethod::Ordered => OrderedKind::from_u8(kind_tag).map(RecordKind::Ordered),
            AccessMethod::Hierarchical => {
                HierarchicalKind::from_u8(kind_tag).map(RecordKind::Hierarchical)
            }
        }
    }

    /// The access method this kind belongs to.
    pub fn access_method(self) -> AccessMethod {
        match self {
            RecordKind::Ordered(_) => AccessMethod::Ordered,
            RecordKind::Hierarchical(_) => AccessMethod::Hierarchical,
        }
    }

    /// The wire tag of the kind.
    pub fn kind_tag(self) -> u8 {
        match self {
            RecordKind::Ordered(k) => k.as_u8(),
            RecordKind::Hierarchical(k) => k.as_u8(),
        }
    }
}
