// crates/reelsync-engine/src/frame_sync.rs
//
// C3 — Frame Sync Engine. The convergence algorithm (§4.3) is split the same
// way the playback state machine is (`reelsync_core::state`): a pure `step`
// function the tests exercise directly, and a thin driver
// (`FrameSyncEngine::converge`) that feeds it real `MediaElement` events.
// Platform seeks are not exact — the element may land a frame or two off the
// requested time — so convergence re-seeks up to `convergence_iteration_bound`
// times before giving up and accepting the nearest frame it reached.

use std::time::Duration;

use reelsync_core::timecode::FrameRateContext;
use tracing::{debug, warn};

use crate::breaker::Breaker;
use crate::collaborator::{FramePresentation, MediaElement, MediaElementEvent};
use crate::config::PlayerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvergenceStep {
    Converged { frame: u64 },
    Retry { iteration: u32 },
    GiveUp { last_frame: u64 },
}

/// One step of the convergence algorithm (§4.3): reconciles two
/// independently observed clocks against `target_frame` — `cf`, the frame
/// derived from the element's `currentTime`, and `mf`, the frame derived
/// from the most recent frame-presentation callback's `mediaTime` (when the
/// platform delivers one). Right after a seek the two can disagree by a
/// frame or two while the renderer catches up to the reported position, so
/// this only calls it converged once both agree with the target — if only
/// `cf` is available (no presentation sample yet), it alone decides. Pure —
/// no I/O, no seeking — so it's fully unit-testable.
pub fn step(
    observed_time: f64,
    presentation: Option<FramePresentation>,
    target_frame: u64,
    ctx: &FrameRateContext,
    iteration: u32,
    bound: u32,
) -> ConvergenceStep {
    let cf = ctx.time_to_frame(observed_time);
    let mf = presentation.map(|p| ctx.time_to_frame(p.media_time));

    let converged = match mf {
        Some(mf) => cf == target_frame && mf == target_frame,
        None => cf == target_frame,
    };
    if converged {
        return ConvergenceStep::Converged { frame: target_frame };
    }
    if iteration >= bound {
        return ConvergenceStep::GiveUp { last_frame: cf };
    }
    ConvergenceStep::Retry { iteration: iteration + 1 }
}

pub struct FrameSyncEngine<'a> {
    element: &'a dyn MediaElement,
    ctx: FrameRateContext,
    bound: u32,
    event_timeout: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvergenceOutcome {
    Converged { frame: u64 },
    GaveUp { last_frame: u64 },
    Cancelled,
}

impl<'a> FrameSyncEngine<'a> {
    pub fn new(element: &'a dyn MediaElement, ctx: FrameRateContext, config: &PlayerConfig) -> Self {
        Self { element, ctx, bound: config.convergence_iteration_bound, event_timeout: config.pause_sync_timeout }
    }

    /// Drives the element toward `target_frame`, re-seeking on drift until
    /// converged or the iteration bound is hit. Blocks on the element's event
    /// stream, so this runs on a background thread (§5). `breaker` is
    /// checked at every yield point so a superseding seek can cancel this one
    /// without it publishing a stale convergence result.
    pub fn converge(&self, target_frame: u64, breaker: &Breaker) -> ConvergenceOutcome {
        if breaker.is_tripped() {
            return ConvergenceOutcome::Cancelled;
        }
        let target_time = self.ctx.frame_to_time(target_frame);
        if self.element.seek(target_time).is_err() {
            return ConvergenceOutcome::GaveUp { last_frame: self.ctx.time_to_frame(self.element.current_time()) };
        }

        let events = self.element.events();
        let mut iteration = 0u32;

        loop {
            if breaker.is_tripped() {
                return ConvergenceOutcome::Cancelled;
            }

            let observed = match events.recv_timeout(self.event_timeout) {
                Ok(MediaElementEvent::Seeked) | Ok(MediaElementEvent::CanPlay) => self.element.current_time(),
                Ok(MediaElementEvent::TimeUpdate { time }) => time,
                Ok(_) => continue,
                Err(_) => self.element.current_time(),
            };

            if breaker.is_tripped() {
                return ConvergenceOutcome::Cancelled;
            }

            let presentation = self.element.frame_presentation();
            debug!(iteration, observed, target_frame, ?presentation, "frame-sync convergence step");

            match step(observed, presentation, target_frame, &self.ctx, iteration, self.bound) {
                ConvergenceStep::Converged { frame } => return ConvergenceOutcome::Converged { frame },
                ConvergenceStep::GiveUp { last_frame } => {
                    warn!(target_frame, last_frame, bound = self.bound, "frame-sync convergence bound exceeded");
                    return ConvergenceOutcome::GaveUp { last_frame };
                }
                ConvergenceStep::Retry { iteration: next } => {
                    iteration = next;
                    let nudged = self.nudge(target_time, target_frame, presentation);
                    if self.element.seek(nudged).is_err() {
                        return ConvergenceOutcome::GaveUp { last_frame: self.ctx.time_to_frame(observed) };
                    }
                }
            }
        }
    }

    /// Biases the next re-seek by a hair (§4.3's ε-nudge) when the
    /// frame-presentation clock disagrees with the target in a known
    /// direction, so a pair of clocks that are one rounding step apart don't
    /// just oscillate between the same two re-seeks forever.
    fn nudge(&self, base_time: f64, target_frame: u64, presentation: Option<FramePresentation>) -> f64 {
        let epsilon = self.ctx.spill_epsilon_secs;
        match presentation.map(|p| self.ctx.time_to_frame(p.media_time)) {
            Some(mf) if mf < target_frame => base_time + epsilon,
            Some(mf) if mf > target_frame => (base_time - epsilon).max(0.0),
            _ => base_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsync_core::rational::Rational;

    fn ctx() -> FrameRateContext {
        FrameRateContext::new(Rational::new(24000, 1001), false).unwrap()
    }

    #[test]
    fn converges_immediately_on_exact_landing() {
        let ctx = ctx();
        let target = 120u64;
        let observed = ctx.frame_to_time(target);
        assert_eq!(step(observed, None, target, &ctx, 0, 5), ConvergenceStep::Converged { frame: target });
    }

    #[test]
    fn retries_while_under_bound() {
        let ctx = ctx();
        let observed = ctx.frame_to_time(119);
        assert_eq!(step(observed, None, 120, &ctx, 2, 5), ConvergenceStep::Retry { iteration: 3 });
    }

    #[test]
    fn gives_up_at_bound() {
        let ctx = ctx();
        let observed = ctx.frame_to_time(119);
        assert_eq!(step(observed, None, 120, &ctx, 5, 5), ConvergenceStep::GiveUp { last_frame: 119 });
    }

    #[test]
    fn presentation_clock_must_also_agree_to_converge() {
        let ctx = ctx();
        let target = 120u64;
        let observed = ctx.frame_to_time(target);
        let lagging = FramePresentation { media_time: ctx.frame_to_time(119), frame_number: 119, presented_frames: 119 };
        assert_eq!(
            step(observed, Some(lagging), target, &ctx, 0, 5),
            ConvergenceStep::Retry { iteration: 1 }
        );
        let caught_up = FramePresentation { media_time: observed, frame_number: 120, presented_frames: 120 };
        assert_eq!(
            step(observed, Some(caught_up), target, &ctx, 0, 5),
            ConvergenceStep::Converged { frame: target }
        );
    }
}
