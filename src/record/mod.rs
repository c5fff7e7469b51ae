//! Structural log records: data model, catalog, and decoding.
//!
//! A record is created exactly once at the moment of a structural edit
//! and consumed arbitrarily many times afterwards: by replay, by
//! diagnostics, by audits. Records are immutable and append-only; the
//! only retirement path is external log retention, which is outside this
//! core.
//!
//! # Decoding
//!
//! `decode` turns a raw payload plus a resolved (access method, kind)
//! pair into a typed `LogRecord` variant. Decoding is pure, read-only,
//! and reentrant: no ambient state, no interior mutability. Short
//! buffers yield `Truncated` (expected only at the physical end of the
//! log); count-field inconsistencies yield `Malformed` (always fatal).
//! Every field is extracted with explicit bounds checks; nothing is
//! reinterpreted in place.

mod catalog;
mod cursor;
mod errors;
mod hierarchical;
mod ordered;
mod types;

pub use catalog::{layout_of, schema_for, FieldLayout, FieldSpec, TrailerSpec};
pub use errors::{DecodeError, DecodeResult};
pub use hierarchical::{CreateIndexRecord, PageSplitRecord, PageUpdateRecord};
pub use ordered::{
    DeleteRecord, HalfDeadRecord, InsertRecord, NewRootRecord, ReuseRecord, SplitRecord,
    UnlinkRecord, VacuumRecord,
};
pub use types::{
    AccessMethod, BlockNumber, HierarchicalKind, ItemAddress, LogPosition, OffsetNumber,
    OrderedKind, PageAddress, RecordKind, RelationLocator, TransactionId, NO_BLOCK,
};

use cursor::Cursor;
use serde::Serialize;

/// One decoded structural log record: a tagged union with one variant
/// per (access method, kind) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LogRecord {
    /// Ordered tree: insert into a leaf page
    InsertLeaf(InsertRecord),
    /// Ordered tree: insert into an upper page
    InsertUpper(InsertRecord),
    /// Ordered tree: insert that also updates the meta page
    InsertMeta(InsertRecord),
    /// Ordered tree: split, new entry on the left half
    SplitLeft(SplitRecord),
    /// Ordered tree: split, new entry on the right half
    SplitRight(SplitRecord),
    /// Ordered tree: root split, new entry on the left half
    SplitLeftRoot(SplitRecord),
    /// Ordered tree: root split, new entry on the right half
    SplitRightRoot(SplitRecord),
    /// Ordered tree: vacuum removals from one page
    VacuumPage(VacuumRecord),
    /// Ordered tree: delete entries with dead heap rows
    DeleteEntries(DeleteRecord),
    /// Ordered tree: mark a leaf page half-dead
    MarkPageHalfDead(HalfDeadRecord),
    /// Ordered tree: unlink a half-dead page
    UnlinkPage(UnlinkRecord),
    /// Ordered tree: unlink that also updates the meta page
    UnlinkPageMeta(UnlinkRecord),
    /// Ordered tree: install a new root
    NewRoot(NewRootRecord),
    /// Ordered tree: make an unlinked page reusable
    ReusePage(ReuseRecord),
    /// Hierarchical tree: in-place page update
    PageUpdate(PageUpdateRecord),
    /// Hierarchical tree: split one page into several
    PageSplit(PageSplitRecord),
    /// Hierarchical tree: create a new index
    CreateIndex(CreateIndexRecord),
}

impl LogRecord {
    /// The resolved kind of this record.
    pub fn kind(&self) -> RecordKind {
        match self {
            LogRecord::InsertLeaf(_) => RecordKind::Ordered(OrderedKind::InsertLeaf),
            LogRecord::InsertUpper(_) => RecordKind::Ordered(OrderedKind::InsertUpper),
            LogRecord::InsertMeta(_) => RecordKind::Ordered(OrderedKind::InsertMeta),
            LogRecord::SplitLeft(_) => RecordKind::Ordered(OrderedKind::SplitLeft),
            LogRecord::SplitRight(_) => RecordKind::Ordered(OrderedKind::SplitRight),
            LogRecord::SplitLeftRoot(_) => RecordKind::Ordered(OrderedKind::SplitLeftRoot),
            LogRecord::SplitRightRoot(_) => RecordKind::Ordered(OrderedKind::SplitRightRoot),
            LogRecord::VacuumPage(_) => RecordKind::Ordered(OrderedKind::VacuumPage),
            LogRecord::DeleteEntries(_) => RecordKind::Ordered(OrderedKind::DeleteEntries),
            LogRecord::MarkPageHalfDead(_) => RecordKind::Ordered(OrderedKind::MarkPageHalfDead),
            LogRecord::UnlinkPage(_) => RecordKind::Ordered(OrderedKind::UnlinkPage),
            LogRecord::UnlinkPageMeta(_) => RecordKind::Ordered(OrderedKind::UnlinkPageMeta),
            LogRecord::NewRoot(_) => RecordKind::Ordered(OrderedKind::NewRoot),
            LogRecord::ReusePage(_) => RecordKind::Ordered(OrderedKind::ReusePage),
            LogRecord::PageUpdate(_) => RecordKind::Hierarchical(HierarchicalKind::UpdatePage),
            LogRecord::PageSplit(_) => RecordKind::Hierarchical(HierarchicalKind::SplitPage),
            LogRecord::CreateIndex(_) => RecordKind::Hierarchical(HierarchicalKind::CreateIndex),
        }
    }

    /// The access method this record belongs to.
    pub fn access_method(&self) -> AccessMethod {
        self.kind().access_method()
    }

    /// The relation the record addresses.
    pub fn relation(&self) -> RelationLocator {
        match self {
            LogRecord::InsertLeaf(r) | LogRecord::InsertUpper(r) | LogRecord::InsertMeta(r) => {
                r.relation
            }
            LogRecord::SplitLeft(r)
            | LogRecord::SplitRight(r)
            | LogRecord::SplitLeftRoot(r)
            | LogRecord::SplitRightRoot(r) => r.relation,
            LogRecord::VacuumPage(r) => r.relation,
            LogRecord::DeleteEntries(r) => r.relation,
            LogRecord::MarkPageHalfDead(r) => r.relation,
            LogRecord::UnlinkPage(r) | LogRecord::UnlinkPageMeta(r) => r.relation,
            LogRecord::NewRoot(r) => r.relation,
            LogRecord::ReusePage(r) => r.relation,
            LogRecord::PageUpdate(r) => r.relation,
            LogRecord::PageSplit(r) => r.relation,
            LogRecord::CreateIndex(r) => r.relation,
        }
    }

    /// Producer-side encoding: the on-disk byte image of this record,
    /// fixed header first, trailer after, all little-endian.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(layout_of(self.kind()).header_size());
        match self {
            LogRecord::InsertLeaf(r) | LogRecord::InsertUpper(r) | LogRecord::InsertMeta(r) => {
                r.encode_into(&mut buf)
            }
            LogRecord::SplitLeft(r)
            | LogRecord::SplitRight(r)
            | LogRecord::SplitLeftRoot(r)
            | LogRecord::SplitRightRoot(r) => r.encode_into(&mut buf),
            LogRecord::VacuumPage(r) => r.encode_into(&mut buf),
            LogRecord::DeleteEntries(r) => r.encode_into(&mut buf),
            LogRecord::MarkPageHalfDead(r) => r.encode_into(&mut buf),
            LogRecord::UnlinkPage(r) | LogRecord::UnlinkPageMeta(r) => r.encode_into(&mut buf),
            LogRecord::NewRoot(r) => r.encode_into(&mut buf),
            LogRecord::ReusePage(r) => r.encode_into(&mut buf),
            LogRecord::PageUpdate(r) => r.encode_into(&mut buf),
            LogRecord::PageSplit(r) => r.encode_into(&mut buf),
            LogRecord::CreateIndex(r) => r.encode_into(&mut buf),
        }
        buf
    }
}

/// Decodes a raw record payload for a resolved kind.
///
/// The minimum-length check comes from the catalog, so a buffer shorter
/// than the kind's fixed header is `Truncated` before any field is read.
/// Records without a trailer must consume the buffer exactly; records
/// with one must match their count field exactly. Anything else is
/// `Malformed`.
pub fn decode(bytes: &[u8], kind: RecordKind) -> DecodeResult<LogRecord> {
    let layout = layout_of(kind);
    if bytes.len() < layout.header_size() {
        return Err(DecodeError::Truncated {
            needed: layout.header_size(),
            have: bytes.len(),
        });
    }

    let mut c = Cursor::new(bytes);
    let record = match kind {
        RecordKind::Ordered(k) => match k {
            OrderedKind::InsertLeaf => LogRecord::InsertLeaf(InsertRecord::decode(&mut c)?),
            OrderedKind::InsertUpper => LogRecord::InsertUpper(InsertRecord::decode(&mut c)?),
            OrderedKind::InsertMeta => LogRecord::InsertMeta(InsertRecord::decode(&mut c)?),
            OrderedKind::SplitLeft => LogRecord::SplitLeft(SplitRecord::decode(&mut c)?),
            OrderedKind::SplitRight => LogRecord::SplitRight(SplitRecord::decode(&mut c)?),
            OrderedKind::SplitLeftRoot => LogRecord::SplitLeftRoot(SplitRecord::decode(&mut c)?),
            OrderedKind::SplitRightRoot => LogRecord::SplitRightRoot(SplitRecord::decode(&mut c)?),
            OrderedKind::VacuumPage => LogRecord::VacuumPage(VacuumRecord::decode(&mut c)?),
            OrderedKind::DeleteEntries => LogRecord::DeleteEntries(DeleteRecord::decode(&mut c)?),
            OrderedKind::MarkPageHalfDead => {
                LogRecord::MarkPageHalfDead(HalfDeadRecord::decode(&mut c)?)
            }
            OrderedKind::UnlinkPage => LogRecord::UnlinkPage(UnlinkRecord::decode(&mut c)?),
            OrderedKind::UnlinkPageMeta => LogRecord::UnlinkPageMeta(UnlinkRecord::decode(&mut c)?),
            OrderedKind::NewRoot => LogRecord::NewRoot(NewRootRecord::decode(&mut c)?),
            OrderedKind::ReusePage => LogRecord::ReusePage(ReuseRecord::decode(&mut c)?),
        },
        RecordKind::Hierarchical(k) => match k {
            HierarchicalKind::UpdatePage => LogRecord::PageUpdate(PageUpdateRecord::decode(&mut c)?),
            HierarchicalKind::SplitPage => LogRecord::PageSplit(PageSplitRecord::decode(&mut c)?),
            HierarchicalKind::CreateIndex => {
                LogRecord::CreateIndex(CreateIndexRecord::decode(&mut c)?)
            }
        },
    };
    c.expect_end()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel() -> RelationLocator {
        RelationLocator::new(1663, 12345, 67890)
    }

    fn sample_records() -> Vec<LogRecord> {
        let insert = InsertRecord::new(rel(), ItemAddress::new(42, 3));
        let split = SplitRecord {
            relation: rel(),
            left_sibling: 10,
            right_sibling: 11,
            next_right: 12,
            level: 0,
            first_right: 4,
            moved: vec![ItemAddress::new(10, 4), ItemAddress::new(10, 5)],
        };
        let unlink = UnlinkRecord {
            relation: rel(),
            dead: 20,
            left_sibling: 19,
            right_sibling: 21,
            removal_horizon: 900,
            leaf: 20,
            leaf_left: 19,
            leaf_right: 21,
            top_parent: 5,
        };
        vec![
            LogRecord::InsertLeaf(insert.clone()),
            LogRecord::InsertUpper(insert.clone()),
            LogRecord::InsertMeta(insert),
            LogRecord::SplitLeft(split.clone()),
            LogRecord::SplitRight(split.clone()),
            LogRecord::SplitLeftRoot(split.clone()),
            LogRecord::SplitRightRoot(split),
            LogRecord::VacuumPage(VacuumRecord {
                relation: rel(),
                block: 7,
                last_vacuumed: 6,
                deleted: vec![2, 5, 9],
            }),
            LogRecord::DeleteEntries(DeleteRecord {
                relation: rel(),
                block: 8,
                heap_relation: RelationLocator::new(1663, 12345, 22222),
                deleted: vec![1, 4],
            }),
            LogRecord::MarkPageHalfDead(HalfDeadRecord {
                relation: rel(),
                target: ItemAddress::new(5, 2),
                top_parent: 5,
                leaf: 20,
                left: 19,
                right: 21,
            }),
            LogRecord::UnlinkPage(unlink.clone()),
            LogRecord::UnlinkPageMeta(unlink),
            LogRecord::NewRoot(NewRootRecord {
                relation: rel(),
                root: 30,
                level: 1,
                left_child: 1,
                right_child: 2,
            }),
            LogRecord::ReusePage(ReuseRecord {
                relation: rel(),
                block: 20,
                removal_horizon: 900,
            }),
            LogRecord::PageUpdate(PageUpdateRecord {
                relation: rel(),
                block: 3,
                deleted: vec![1],
                inserted: vec![7, 8],
            }),
            LogRecord::PageSplit(PageSplitRecord {
                relation: rel(),
                origin: 3,
                pages: vec![3, 9, 10],
            }),
            LogRecord::CreateIndex(CreateIndexRecord { relation: rel() }),
        ]
    }

    #[test]
    fn test_roundtrip_every_kind() {
        for record in sample_records() {
            let bytes = record.encode();
            let decoded = decode(&bytes, record.kind()).unwrap();
            assert_eq!(record, decoded, "{:?}", record.kind());
        }
    }

    #[test]
    fn test_encode_matches_catalog_header_size() {
        // Kinds without a trailer encode to exactly the catalog header size.
        let record = LogRecord::InsertLeaf(InsertRecord::new(rel(), ItemAddress::new(42, 3)));
        assert_eq!(record.encode().len(), layout_of(record.kind()).header_size());

        let record = LogRecord::CreateIndex(CreateIndexRecord { relation: rel() });
        assert_eq!(record.encode().len(), layout_of(record.kind()).header_size());
    }

    #[test]
    fn test_truncated_header() {
        for record in sample_records() {
            let bytes = record.encode();
            let header = layout_of(record.kind()).header_size();
            let short = &bytes[..header - 1];
            match decode(short, record.kind()) {
                Err(DecodeError::Truncated { needed, have }) => {
                    assert_eq!(needed, header);
                    assert_eq!(have, header - 1);
                }
                other => panic!("expected Truncated, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_buffer_is_truncated() {
        let result = decode(&[], RecordKind::Ordered(OrderedKind::InsertLeaf));
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_excess_bytes_are_malformed() {
        let record = LogRecord::InsertLeaf(InsertRecord::new(rel(), ItemAddress::new(42, 3)));
        let mut bytes = record.encode();
        bytes.push(0xAA);
        let result = decode(&bytes, record.kind());
        assert!(matches!(result, Err(DecodeError::Malformed { .. })));
    }

    #[test]
    fn test_trailer_count_mismatch_is_malformed() {
        let record = LogRecord::SplitLeft(SplitRecord {
            relation: rel(),
            left_sibling: 10,
            right_sibling: 11,
            next_right: 12,
            level: 0,
            first_right: 4,
            moved: vec![ItemAddress::new(10, 4)],
        });
        let mut bytes = record.encode();
        // One trailer element declared, none present.
        bytes.truncate(bytes.len() - ItemAddress::ENCODED_LEN);
        let result = decode(&bytes, record.kind());
        assert!(matches!(result, Err(DecodeError::Malformed { .. })));

        // Two elements present, one declared.
        let mut bytes = record.encode();
        bytes.extend_from_slice(&record.encode()[32..]);
        let result = decode(&bytes, record.kind());
        assert!(matches!(result, Err(DecodeError::Malformed { .. })));
    }

    #[test]
    fn test_update_page_split_counts() {
        let record = LogRecord::PageUpdate(PageUpdateRecord {
            relation: rel(),
            block: 3,
            deleted: vec![1, 2],
            inserted: vec![9],
        });
        let bytes = record.encode();
        let decoded = decode(&bytes, record.kind()).unwrap();
        match decoded {
            LogRecord::PageUpdate(r) => {
                assert_eq!(r.deleted, vec![1, 2]);
                assert_eq!(r.inserted, vec![9]);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        for record in sample_records() {
            let bytes = record.encode();
            let first = decode(&bytes, record.kind()).unwrap();
            let second = decode(&bytes, record.kind()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_kind_tags_are_stable() {
        // On-disk tags are part of the format; a renumbering is a format break.
        assert_eq!(
            RecordKind::Ordered(OrderedKind::InsertLeaf).kind_tag(),
            0
        );
        assert_eq!(RecordKind::Ordered(OrderedKind::ReusePage).kind_tag(), 13);
        assert_eq!(
            RecordKind::Hierarchical(HierarchicalKind::CreateIndex).kind_tag(),
            2
        );
    }
}
