//! Replay invariant tests over full log streams.
//!
//! These drive the real pipeline end to end: producer-side records are
//! framed into a file, streamed back through the frame reader, resolved
//! by the registry, decoded, and applied by the engine. Invariants under
//! test:
//!
//! - the leaf sibling chain stays a singly linked, ordered list after
//!   page deletion (half-dead then unlink)
//! - page reuse is gated by the removal horizon against the oldest
//!   active transaction
//! - replay is idempotent and resumable (re-running a replayed stream
//!   mutates nothing)
//! - an unknown kind under a known access method is fatal for replay
//!   but only "unknown" for diagnostics

use treewal::describe;
use treewal::dispatch::Registry;
use treewal::frame::{Frame, FrameReader, FrameWriter};
use treewal::record::{
    AccessMethod, HalfDeadRecord, InsertRecord, ItemAddress, LogRecord, NewRootRecord,
    PageAddress, RelationLocator, ReuseRecord, SplitRecord, UnlinkRecord, NO_BLOCK,
};
use treewal::replay::{
    MemoryPageStore, Page, PageState, PageStore, ReplayContext, ReplayEngine, ReplayErrorCode,
    Replayer, META_BLOCK,
};

use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn rel() -> RelationLocator {
    RelationLocator::new(1663, 12345, 67890)
}

fn addr(block: u32) -> PageAddress {
    PageAddress::new(rel(), block)
}

fn leaf_with_items(items: &[u16]) -> Page {
    let mut page = Page::new(0);
    for item in items {
        page.insert_item(*item);
    }
    page
}

/// Three chained leaves 19 <-> 20 <-> 21 under parent 5, plus the meta
/// page. The starting point for the page-deletion scenarios.
fn chained_store() -> MemoryPageStore {
    let mut store = MemoryPageStore::new();
    store.put(addr(META_BLOCK), Page::new(0));

    let mut parent = Page::new(1);
    parent.insert_item(1);
    parent.insert_item(2);
    parent.insert_item(3);
    store.put(addr(5), parent);

    let mut left = leaf_with_items(&[1, 2]);
    left.right_link = 20;
    store.put(addr(19), left);

    let mut middle = leaf_with_items(&[3]);
    middle.left_link = 19;
    middle.right_link = 21;
    store.put(addr(20), middle);

    let mut right = leaf_with_items(&[4, 5]);
    right.left_link = 20;
    store.put(addr(21), right);

    store
}

fn half_dead_then_unlink() -> Vec<LogRecord> {
    vec![
        LogRecord::MarkPageHalfDead(HalfDeadRecord {
            relation: rel(),
            target: ItemAddress::new(5, 2),
            top_parent: 5,
            leaf: 20,
            left: 19,
            right: 21,
        }),
        LogRecord::UnlinkPage(UnlinkRecord {
            relation: rel(),
            dead: 20,
            left_sibling: 19,
            right_sibling: 21,
            removal_horizon: 900,
            leaf: 20,
            leaf_left: 19,
            leaf_right: 21,
            top_parent: 5,
        }),
    ]
}

fn write_log(path: &Path, records: &[LogRecord]) {
    let mut writer = FrameWriter::open(path).expect("open log for writing");
    for (i, record) in records.iter().enumerate() {
        writer
            .append_record((i + 1) as u64, record)
            .expect("append record");
    }
    writer.sync().expect("sync log");
}

fn replay_log(
    path: &Path,
    store: MemoryPageStore,
    context: ReplayContext,
) -> Result<(MemoryPageStore, treewal::replay::ReplayStats), treewal::replay::ReplayError> {
    let mut reader = FrameReader::open(path).expect("open log for reading");
    let mut engine = ReplayEngine::new(store, context);
    let stats = Replayer::new(Registry::new()).replay(&mut reader, &mut engine)?;
    Ok((engine.into_store(), stats))
}

// =============================================================================
// Sibling-chain integrity across page deletion
// =============================================================================

/// After mark-half-dead then unlink-page on block 20 (top parent 5,
/// left 19, right 21): page 19's right link is 21, page 21's left link
/// is 19, and block 20 is unreachable from the chain.
#[test]
fn test_sibling_chain_integrity_after_deletion() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("structural.log");
    write_log(&path, &half_dead_then_unlink());

    let (store, stats) = replay_log(&path, chained_store(), ReplayContext::new()).unwrap();
    assert_eq!(stats.records, 2);
    assert_eq!(stats.half_deads, 1);
    assert_eq!(stats.unlinks, 1);

    let left = store.get(&addr(19)).unwrap();
    assert_eq!(left.right_link, 21);
    let right = store.get(&addr(21)).unwrap();
    assert_eq!(right.left_link, 19);

    // Walk the chain from the left edge: block 20 never appears.
    let mut block = 19;
    let mut visited = Vec::new();
    while block != NO_BLOCK {
        visited.push(block);
        block = store.get(&addr(block)).unwrap().right_link;
    }
    assert_eq!(visited, vec![19, 21]);

    let dead = store.get(&addr(20)).unwrap();
    assert_eq!(dead.state, PageState::Unlinked);
    assert_eq!(dead.removal_horizon, Some(900));

    // The parent's downlink to the dead leaf is gone.
    assert!(!store.get(&addr(5)).unwrap().contains_item(2));
}

/// A crash between the two records leaves the tree where the unlink's
/// own precondition still holds: replaying the second half alone from
/// the intermediate state succeeds.
#[test]
fn test_crash_between_chain_records_is_resumable() {
    let dir = TempDir::new().unwrap();
    let records = half_dead_then_unlink();

    // First run sees only the half-dead record, as after a crash.
    let prefix_path = dir.path().join("prefix.log");
    write_log(&prefix_path, &records[..1]);
    let (store, _) = replay_log(&prefix_path, chained_store(), ReplayContext::new()).unwrap();
    assert_eq!(store.get(&addr(20)).unwrap().state, PageState::HalfDead);

    // Second run streams the full log over the intermediate state.
    let full_path = dir.path().join("full.log");
    write_log(&full_path, &records);
    let (store, stats) = replay_log(&full_path, store, ReplayContext::new()).unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(store.get(&addr(20)).unwrap().state, PageState::Unlinked);
    assert_eq!(store.get(&addr(19)).unwrap().right_link, 21);
}

// =============================================================================
// Reuse horizon guard
// =============================================================================

fn reuse_log(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("reuse.log");
    let mut records = half_dead_then_unlink();
    records.push(LogRecord::ReusePage(ReuseRecord {
        relation: rel(),
        block: 20,
        removal_horizon: 900,
    }));
    write_log(&path, &records);
    path
}

/// A reuse record with horizon 900 is rejected while a transaction
/// older than 900 is active, and accepted otherwise.
#[test]
fn test_reuse_guard() {
    // Oldest active transaction predates the horizon: fatal.
    let dir = TempDir::new().unwrap();
    let path = reuse_log(&dir);
    let err = replay_log(&path, chained_store(), ReplayContext::with_oldest_active(850))
        .unwrap_err();
    assert_eq!(err.code(), ReplayErrorCode::InvariantViolation);
    assert!(err.is_fatal());

    // Oldest active transaction at the horizon: accepted.
    let (store, _) =
        replay_log(&path, chained_store(), ReplayContext::with_oldest_active(900)).unwrap();
    assert_eq!(store.get(&addr(20)).unwrap().state, PageState::Reusable);

    // No active transactions: accepted.
    let (store, _) = replay_log(&path, chained_store(), ReplayContext::new()).unwrap();
    assert_eq!(store.get(&addr(20)).unwrap().state, PageState::Reusable);
}

// =============================================================================
// Idempotency and resumability over full streams
// =============================================================================

/// Replaying an already-replayed stream mutates nothing and errors
/// nothing: every record is a skipped no-op.
#[test]
fn test_second_replay_is_pure_noop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("structural.log");

    let records = vec![
        LogRecord::InsertLeaf(InsertRecord::new(rel(), ItemAddress::new(19, 7))),
        LogRecord::InsertLeaf(InsertRecord::new(rel(), ItemAddress::new(21, 8))),
    ];
    write_log(&path, &records);

    let (store, first) = replay_log(&path, chained_store(), ReplayContext::new()).unwrap();
    assert_eq!(first.applied, 2);

    let snapshot: Vec<_> = store
        .addresses()
        .iter()
        .map(|a| (*a, store.get(a).unwrap().clone()))
        .collect();

    let (store, second) = replay_log(&path, store, ReplayContext::new()).unwrap();
    assert_eq!(second.applied, 0);
    assert_eq!(second.skipped, 2);
    for (a, page) in &snapshot {
        assert_eq!(store.get(a).unwrap(), page);
    }
}

/// Same log, same starting pages, same final pages: replay is a pure
/// function of the stream.
#[test]
fn test_replay_determinism() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("structural.log");
    write_log(&path, &half_dead_then_unlink());

    let (store1, stats1) = replay_log(&path, chained_store(), ReplayContext::new()).unwrap();
    let (store2, stats2) = replay_log(&path, chained_store(), ReplayContext::new()).unwrap();

    assert_eq!(stats1, stats2);
    assert_eq!(store1.addresses(), store2.addresses());
    for a in store1.addresses() {
        assert_eq!(store1.get(&a), store2.get(&a));
    }
}

// =============================================================================
// Split and root install as one multi-record unit
// =============================================================================

/// A root split is two records: the split itself, then the new root
/// install whose child identities the record carries. Replay of the
/// pair produces the recorded shape.
#[test]
fn test_root_split_then_new_root_install() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("structural.log");

    let mut store = MemoryPageStore::new();
    store.put(addr(META_BLOCK), Page::new(0));
    store.put(addr(1), leaf_with_items(&[1, 2, 3, 4]));

    let records = vec![
        LogRecord::SplitRightRoot(SplitRecord {
            relation: rel(),
            left_sibling: 1,
            right_sibling: 2,
            next_right: NO_BLOCK,
            level: 0,
            first_right: 3,
            moved: vec![ItemAddress::new(1, 3), ItemAddress::new(1, 4)],
        }),
        LogRecord::NewRoot(NewRootRecord {
            relation: rel(),
            root: 3,
            level: 1,
            left_child: 1,
            right_child: 2,
        }),
    ];
    write_log(&path, &records);

    let (store, stats) = replay_log(&path, store, ReplayContext::new()).unwrap();
    assert_eq!(stats.splits, 1);
    assert_eq!(stats.new_roots, 1);

    let left = store.get(&addr(1)).unwrap();
    assert_eq!(left.items().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(left.right_link, 2);

    let right = store.get(&addr(2)).unwrap();
    assert_eq!(right.items().collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(right.left_link, 1);

    let root = store.get(&addr(3)).unwrap();
    assert_eq!(root.level, 1);
    assert_eq!(store.get(&addr(META_BLOCK)).unwrap().root_hint, Some(3));
}

// =============================================================================
// Unknown kinds: replay vs diagnostics
// =============================================================================

/// An unknown kind tag under a known access method: `identify` reports
/// unknown; replay of the same stream is fatal.
#[test]
fn test_unknown_kind_fatal_for_replay_unknown_for_diagnostics() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("structural.log");
    {
        let mut writer = FrameWriter::open(&path).unwrap();
        writer
            .append(&Frame {
                position: 1,
                access_method: AccessMethod::Ordered.as_u8(),
                kind: 99,
                payload: vec![],
            })
            .unwrap();
        writer.sync().unwrap();
    }

    assert_eq!(describe::identify(AccessMethod::Ordered, 99), None);
    let registry = Registry::new();
    assert_eq!(registry.identify(0, 99).unwrap(), None);

    let err = replay_log(&path, chained_store(), ReplayContext::new()).unwrap_err();
    assert_eq!(err.code(), ReplayErrorCode::UnknownRecordKind);
}
