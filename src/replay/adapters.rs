//! Adapters binding the frame layer to the replay loop.
//!
//! The frame reader speaks `FrameError`; the replay loop speaks
//! `ReplayError`. A torn tail stays a clean end of log on the way
//! through and is surfaced as an event, not an error.

use crate::frame::{Frame, FrameReader};
use crate::observability::{log_event, Event};

use super::replayer::LogRead;
use super::ReplayResult;

impl LogRead for FrameReader {
    fn read_next(&mut self) -> ReplayResult<Option<Frame>> {
        let frame = FrameReader::read_next(self)?;
        if frame.is_none() && self.ended_with_partial_frame() {
            log_event(
                Event::TornTailDiscarded,
                &[("offset", &self.current_offset().to_string())],
            );
        }
        Ok(frame)
    }
}
