//! Crash-recovery replay for structural log records.
//!
//! # Contract
//!
//! - Replay is single-threaded and strictly sequential in ascending
//!   log-position order.
//! - Each record is applied as one indivisible unit; interruption
//!   happens only at record boundaries.
//! - Applying a record whose position a page has already seen is a
//!   no-op, which makes replay idempotent and resumable.
//! - Every failure is fatal: there is no partial-database mode. A log
//!   that cannot replay to the end means restoring from a prior backup
//!   or checkpoint.
//!
//! # Page state machine
//!
//! `Normal -> HalfDead -> Unlinked -> Reusable -> Normal` (the last
//! transition via the next allocation). Half-dead pages must not be
//! split or reused; unlinked pages are unreachable from the root;
//! reuse is gated by the removal-horizon check against the oldest
//! active transaction.

mod adapters;
mod engine;
mod errors;
mod page;
mod replayer;

pub use engine::{ApplyOutcome, ReplayContext, ReplayEngine};
pub use errors::{ReplayError, ReplayErrorCode, ReplayResult, Severity};
pub use page::{MemoryPageStore, Page, PageState, PageStore, META_BLOCK};
pub use replayer::{LogRead, Replayer, ReplayStats};
