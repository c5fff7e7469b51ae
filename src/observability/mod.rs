//! Observability for the replay subsystem.
//!
//! # Principles
//!
//! 1. Observability is read-only: no side effects on replay
//! 2. No async or background threads
//! 3. Deterministic output (stable key ordering)
//! 4. One log line = one event

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Logs a lifecycle event with fields. Fatal events go to stderr.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    if event.is_fatal() {
        Logger::log_stderr(Severity::Fatal, event.as_str(), fields);
    } else {
        Logger::log(Severity::Info, event.as_str(), fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::ReplayStart, &[]);
        log_event(Event::ReplayComplete, &[("records", "0")]);
        log_event(Event::ReplayAborted, &[("code", "TREEWAL_LOG_CORRUPTION")]);
    }
}
