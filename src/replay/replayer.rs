//! The sequential replay loop.
//!
//! Replay is single-threaded and strictly sequential in ascending
//! log-position order: each record's precondition may depend on the
//! cumulative effect of every prior record, so out-of-order or
//! concurrent application is disallowed by construction. Interruption
//! happens only at record boundaries; restarting over the same stream
//! is a no-op prefix thanks to the engine's idempotency rule, which is
//! what makes recovery resumable from an arbitrary checkpoint.

use crate::dispatch::Registry;
use crate::frame::Frame;
use crate::observability::{log_event, Event};
use crate::record::{self, LogPosition, LogRecord};

use super::engine::{ApplyOutcome, ReplayEngine};
use super::errors::{ReplayError, ReplayResult};
use super::page::PageStore;

/// Source of frames for replay. The frame reader implements this; tests
/// substitute in-memory streams.
pub trait LogRead {
    /// The next frame, `None` at the clean end of the log.
    fn read_next(&mut self) -> ReplayResult<Option<Frame>>;
}

/// Counters accumulated over one replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records seen
    pub records: u64,
    /// Records that mutated at least one page
    pub applied: u64,
    /// Records skipped as already-applied no-ops
    pub skipped: u64,
    /// Ordered-tree inserts (leaf, upper, meta)
    pub inserts: u64,
    /// Ordered-tree splits (all four orientations)
    pub splits: u64,
    /// Vacuum page records
    pub vacuums: u64,
    /// Delete-entries records
    pub entry_deletes: u64,
    /// Half-dead marks
    pub half_deads: u64,
    /// Unlinks (plain and meta)
    pub unlinks: u64,
    /// New-root installs
    pub new_roots: u64,
    /// Page reuses
    pub reuses: u64,
    /// Hierarchical page updates
    pub page_updates: u64,
    /// Hierarchical page splits
    pub page_splits: u64,
    /// Hierarchical index creations
    pub index_creates: u64,
    /// Position of the last record processed
    pub final_position: LogPosition,
}

impl ReplayStats {
    fn count(&mut self, record: &LogRecord) {
        match record {
            LogRecord::InsertLeaf(_) | LogRecord::InsertUpper(_) | LogRecord::InsertMeta(_) => {
                self.inserts += 1
            }
            LogRecord::SplitLeft(_)
            | LogRecord::SplitRight(_)
            | LogRecord::SplitLeftRoot(_)
            | LogRecord::SplitRightRoot(_) => self.splits += 1,
            LogRecord::VacuumPage(_) => self.vacuums += 1,
            LogRecord::DeleteEntries(_) => self.entry_deletes += 1,
            LogRecord::MarkPageHalfDead(_) => self.half_deads += 1,
            LogRecord::UnlinkPage(_) | LogRecord::UnlinkPageMeta(_) => self.unlinks += 1,
            LogRecord::NewRoot(_) => self.new_roots += 1,
            LogRecord::ReusePage(_) => self.reuses += 1,
            LogRecord::PageUpdate(_) => self.page_updates += 1,
            LogRecord::PageSplit(_) => self.page_splits += 1,
            LogRecord::CreateIndex(_) => self.index_creates += 1,
        }
    }
}

/// Drives frames through the registry, the decoder, and the engine.
pub struct Replayer {
    registry: Registry,
}

impl Replayer {
    /// A replayer over an explicitly constructed registry.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Replays a log stream to the end, or to the first fatal error.
    pub fn replay<L: LogRead, S: PageStore>(
        &self,
        log: &mut L,
        engine: &mut ReplayEngine<S>,
    ) -> ReplayResult<ReplayStats> {
        log_event(Event::ReplayStart, &[]);
        match self.replay_inner(log, engine) {
            Ok(stats) => {
                log_event(
                    Event::ReplayComplete,
                    &[
                        ("records", &stats.records.to_string()),
                        ("applied", &stats.applied.to_string()),
                        ("skipped", &stats.skipped.to_string()),
                        ("final_position", &stats.final_position.to_string()),
                    ],
                );
                Ok(stats)
            }
            Err(e) => {
                log_event(
                    Event::ReplayAborted,
                    &[("code", e.code().code()), ("reason", e.message())],
                );
                Err(e)
            }
        }
    }

    fn replay_inner<L: LogRead, S: PageStore>(
        &self,
        log: &mut L,
        engine: &mut ReplayEngine<S>,
    ) -> ReplayResult<ReplayStats> {
        let mut stats = ReplayStats::default();
        let mut last_position: LogPosition = 0;

        loop {
            let frame = match log.read_next()? {
                Some(frame) => frame,
                None => break,
            };

            if frame.position <= last_position {
                return Err(ReplayError::corruption(format!(
                    "log position {} not above previous position {}",
                    frame.position, last_position
                )));
            }

            let kind = self.registry.resolve(frame.access_method, frame.kind)?;
            // A short payload inside an intact frame is not the
            // end-of-log case; the frame length lied about it. Both
            // decode failures are corruption here.
            let record = record::decode(&frame.payload, kind)
                .map_err(|e| ReplayError::malformed(frame.position, e.to_string()))?;

            match engine.apply(frame.position, &record)? {
                ApplyOutcome::Applied => stats.applied += 1,
                ApplyOutcome::Skipped => stats.skipped += 1,
            }
            stats.records += 1;
            stats.count(&record);
            stats.final_position = frame.position;
            last_position = frame.position;
        }

        Ok(stats)
    }
}
