//! Observable replay events.
//!
//! Events are explicit and typed; one log line per event. The replay
//! core emits only recovery-lifecycle events. There is no metrics layer
//! here; replay counters live in `ReplayStats` and are reported once in
//! the completion event's fields.

use std::fmt;

/// Events emitted by the replay subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Replay begins
    ReplayStart,
    /// Replay reached the end of the log cleanly
    ReplayComplete,
    /// Replay stopped on a fatal error
    ReplayAborted,
    /// The log ended on a torn frame; the tail never took effect
    TornTailDiscarded,
}

impl Event {
    /// Stable event name for structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ReplayStart => "REPLAY_START",
            Event::ReplayComplete => "REPLAY_COMPLETE",
            Event::ReplayAborted => "REPLAY_ABORTED",
            Event::TornTailDiscarded => "TORN_TAIL_DISCARDED",
        }
    }

    /// True for events that accompany a fatal halt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ReplayAborted)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
