// crates/reelsync-engine/src/seek.rs
//
// C4 — Seek Orchestrator: resolves every public seek variant (by time, by
// frame, by timecode, relative, to-end) down to a target frame index, then
// hands it to the frame-sync engine. Overlapping seeks cancel the one in
// flight via the same breaker-slot pattern as `worker.rs`'s scrub request
// slot — the newest seek always wins.

use reelsync_core::error::{InvalidInput, PlayerError, PlayerResult};
use reelsync_core::media::Video;
use reelsync_core::timecode::TimecodeObject;
use tracing::info;

use crate::breaker::BreakerSlot;
use crate::collaborator::MediaElement;
use crate::config::PlayerConfig;
use crate::frame_sync::{ConvergenceOutcome, FrameSyncEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekTarget {
    Frame(u64),
    /// Forward/backward by a signed frame delta from the current frame.
    RelativeFrames(i64),
    End,
}

pub struct SeekOrchestrator {
    breaker: BreakerSlot,
}

impl SeekOrchestrator {
    pub fn new() -> Self {
        Self { breaker: BreakerSlot::new() }
    }

    pub fn resolve_time(&self, video: &Video, time: f64) -> PlayerResult<u64> {
        if !time.is_finite() || time < 0.0 {
            return Err(InvalidInput::InvalidDuration(time).into());
        }
        Ok(video.frame_rate_context().time_to_frame(time.min(video.effective_duration())))
    }

    pub fn resolve_timecode(&self, video: &Video, tc: &TimecodeObject) -> PlayerResult<u64> {
        video.frame_rate_context().timecode_to_frame(tc)
    }

    pub fn resolve(&self, video: &Video, current_frame: u64, target: SeekTarget) -> u64 {
        let last_frame = video.total_frames.saturating_sub(1);
        match target {
            SeekTarget::Frame(f) => f.min(last_frame),
            SeekTarget::RelativeFrames(delta) => {
                if delta >= 0 {
                    current_frame.saturating_add(delta as u64).min(last_frame)
                } else {
                    current_frame.saturating_sub((-delta) as u64)
                }
            }
            SeekTarget::End => last_frame,
        }
    }

    /// Cancels any seek currently in flight and drives convergence to
    /// `target_frame`. Returns `Cancelled` if a newer seek superseded this
    /// one before it finished — the caller should simply drop the result and
    /// let the newer call publish the eventual `Seeked` event.
    pub fn dispatch(&self, element: &dyn MediaElement, video: &Video, config: &PlayerConfig, target_frame: u64) -> ConvergenceOutcome {
        let breaker = self.breaker.supersede();
        info!(target_frame, "seek dispatched");
        let ctx = video.frame_rate_context();
        let engine = FrameSyncEngine::new(element, ctx, config);
        engine.converge(target_frame, &breaker)
    }

    pub fn cancel_in_flight(&self) {
        self.breaker.trip_current();
    }
}

impl Default for SeekOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsync_core::rational::Rational;

    fn video() -> Video {
        Video::new("a.mp4", Rational::new(24000, 1001), false, 10.0, false).unwrap()
    }

    #[test]
    fn relative_forward_clamped_to_last_frame() {
        let o = SeekOrchestrator::new();
        let v = video();
        let last = v.total_frames - 1;
        assert_eq!(o.resolve(&v, last - 1, SeekTarget::RelativeFrames(10)), last);
    }

    #[test]
    fn relative_backward_saturates_at_zero() {
        let o = SeekOrchestrator::new();
        let v = video();
        assert_eq!(o.resolve(&v, 2, SeekTarget::RelativeFrames(-10)), 0);
    }

    #[test]
    fn end_resolves_to_last_frame() {
        let o = SeekOrchestrator::new();
        let v = video();
        assert_eq!(o.resolve(&v, 0, SeekTarget::End), v.total_frames - 1);
    }

    #[test]
    fn resolve_time_clamps_to_effective_duration() {
        let o = SeekOrchestrator::new();
        let v = video();
        let frame = o.resolve_time(&v, 999.0).unwrap();
        assert_eq!(frame, v.frame_rate_context().time_to_frame(v.effective_duration()));
    }
}
