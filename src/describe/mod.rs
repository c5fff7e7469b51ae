//! Diagnostics descriptors for structural log records.
//!
//! `identify` names a kind; `format` renders a decoded record as one
//! stable human-readable line. Both are pure and deterministic: no
//! ambient state, same input, same output, safe for concurrent use by
//! any number of observers. Nothing here affects replay.
//!
//! Unknown kinds are not an error on this path: `identify` returns
//! `None` and the caller renders a clearly marked "unknown" line. An
//! inspection tool keeps going where the replay engine must abort.

use crate::record::{
    AccessMethod, DeleteRecord, HalfDeadRecord, HierarchicalKind, InsertRecord, LogRecord,
    NewRootRecord, OrderedKind, PageSplitRecord, PageUpdateRecord, RecordKind, ReuseRecord,
    SplitRecord, UnlinkRecord, VacuumRecord,
};

/// Name of a kind tag under an access method; `None` exactly for tags
/// outside the closed enumeration.
pub fn identify(method: AccessMethod, kind_tag: u8) -> Option<&'static str> {
    RecordKind::resolve(method, kind_tag).map(identify_kind)
}

/// `identify` restricted to the ordered tree, for registry tables.
pub fn identify_ordered(kind_tag: u8) -> Option<&'static str> {
    identify(AccessMethod::Ordered, kind_tag)
}

/// `identify` restricted to the hierarchical tree, for registry tables.
pub fn identify_hierarchical(kind_tag: u8) -> Option<&'static str> {
    identify(AccessMethod::Hierarchical, kind_tag)
}

/// Name of a resolved kind. Total: resolved kinds are never unknown.
pub fn identify_kind(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Ordered(k) => match k {
            OrderedKind::InsertLeaf => "INSERT_LEAF",
            OrderedKind::InsertUpper => "INSERT_UPPER",
            OrderedKind::InsertMeta => "INSERT_META",
            OrderedKind::SplitLeft => "SPLIT_L",
            OrderedKind::SplitRight => "SPLIT_R",
            OrderedKind::SplitLeftRoot => "SPLIT_L_ROOT",
            OrderedKind::SplitRightRoot => "SPLIT_R_ROOT",
            OrderedKind::VacuumPage => "VACUUM",
            OrderedKind::DeleteEntries => "DELETE",
            OrderedKind::MarkPageHalfDead => "MARK_PAGE_HALFDEAD",
            OrderedKind::UnlinkPage => "UNLINK_PAGE",
            OrderedKind::UnlinkPageMeta => "UNLINK_PAGE_META",
            OrderedKind::NewRoot => "NEWROOT",
            OrderedKind::ReusePage => "REUSE_PAGE",
        },
        RecordKind::Hierarchical(k) => match k {
            HierarchicalKind::UpdatePage => "PAGE_UPDATE",
            HierarchicalKind::SplitPage => "PAGE_SPLIT",
            HierarchicalKind::CreateIndex => "CREATE_INDEX",
        },
    }
}

/// Renders a decoded record as one line. Relation locators appear as
/// `spc/db/rel`, item addresses as `block/offset`, and every
/// structurally distinguishing field of the kind is included.
pub fn format(record: &LogRecord) -> String {
    match record {
        LogRecord::InsertLeaf(r) | LogRecord::InsertUpper(r) | LogRecord::InsertMeta(r) => {
            format_insert(r)
        }
        LogRecord::SplitLeft(r)
        | LogRecord::SplitRight(r)
        | LogRecord::SplitLeftRoot(r)
        | LogRecord::SplitRightRoot(r) => format_split(r),
        LogRecord::VacuumPage(r) => format_vacuum(r),
        LogRecord::DeleteEntries(r) => format_delete(r),
        LogRecord::MarkPageHalfDead(r) => format_half_dead(r),
        LogRecord::UnlinkPage(r) | LogRecord::UnlinkPageMeta(r) => format_unlink(r),
        LogRecord::NewRoot(r) => format_new_root(r),
        LogRecord::ReusePage(r) => format_reuse(r),
        LogRecord::PageUpdate(r) => format_page_update(r),
        LogRecord::PageSplit(r) => format_page_split(r),
        LogRecord::CreateIndex(r) => format!("rel {}", r.relation),
    }
}

fn format_insert(r: &InsertRecord) -> String {
    format!("rel {}; tid {}", r.relation, r.target)
}

fn format_split(r: &SplitRecord) -> String {
    format!(
        "rel {} left {}, right {}, next {}, level {}, firstright {}",
        r.relation, r.left_sibling, r.right_sibling, r.next_right, r.level, r.first_right
    )
}

fn format_vacuum(r: &VacuumRecord) -> String {
    format!(
        "rel {}; blk {}, lastBlockVacuumed {}",
        r.relation, r.block, r.last_vacuumed
    )
}

fn format_delete(r: &DeleteRecord) -> String {
    format!(
        "index {}; iblk {}, heap {};",
        r.relation, r.block, r.heap_relation
    )
}

fn format_half_dead(r: &HalfDeadRecord) -> String {
    format!(
        "rel {}; tid {}; topparent {}; leaf {}; left {}; right {}",
        r.relation, r.target, r.top_parent, r.leaf, r.left, r.right
    )
}

fn format_unlink(r: &UnlinkRecord) -> String {
    format!(
        "rel {}; dead {}; left {}; right {}; horizon {}; leaf {}; leafleft {}; leafright {}; topparent {}",
        r.relation,
        r.dead,
        r.left_sibling,
        r.right_sibling,
        r.removal_horizon,
        r.leaf,
        r.leaf_left,
        r.leaf_right,
        r.top_parent
    )
}

fn format_new_root(r: &NewRootRecord) -> String {
    format!(
        "rel {}; root {} lev {}; left {}; right {}",
        r.relation, r.root, r.level, r.left_child, r.right_child
    )
}

fn format_reuse(r: &ReuseRecord) -> String {
    format!(
        "rel {}; blk {}; horizon {}",
        r.relation, r.block, r.removal_horizon
    )
}

fn format_page_update(r: &PageUpdateRecord) -> String {
    format!("rel {}; block number {}", r.relation, r.block)
}

fn format_page_split(r: &PageSplitRecord) -> String {
    format!(
        "page_split: rel {}; block number {} splits to {} pages",
        r.relation,
        r.origin,
        r.pages.len()
    )
}
