//! treewal - structural-change log records and crash-recovery replay
//! for page-organized tree indexes.
//!
//! Two access methods mutate multi-page on-disk structures: an ordered
//! balanced tree and a generalized hierarchical tree. Splits, merges,
//! deletions, and root replacement each append a compact,
//! self-describing log record; after an unclean shutdown, replaying the
//! records in log order deterministically reconstructs every affected
//! page.
//!
//! # Subsystems
//!
//! - [`record`]: the data model, the closed record catalog, and the
//!   bounds-checked decoder
//! - [`describe`]: pure diagnostics rendering of decoded records
//! - [`dispatch`]: the immutable (access method, kind) registry
//! - [`frame`]: the checksummed sequential log transport
//! - [`replay`]: the page state machine and the idempotent, resumable
//!   replay engine
//! - [`cli`]: the `treewal inspect` tool
//!
//! # Design principles
//!
//! - Correctness over throughput: recovery is bounded and infrequent
//! - Explicit failure over silent divergence: every replay error is
//!   fatal
//! - Determinism: same log, same pages, every time

pub mod cli;
pub mod describe;
pub mod dispatch;
pub mod frame;
pub mod observability;
pub mod record;
pub mod replay;
