// crates/reelsync-core/src/events.rs
//
// C9 — Event Fabric type vocabulary. §9's design notes mandate two distinct
// stream shapes instead of one undifferentiated event bus:
//
//   - `LatestValue<T>`: a "latest-wins" slot — subscribers only ever see the
//     newest value, never a backlog (`current_time`, `playback_rate`, peak
//     meters — anything a UI polls or redraws from, where missed
//     intermediate values are meaningless).
//   - `EventSource<T>`: an ordered, lossless stream — every occurrence
//     matters (`paused`, `ended`, `seeked`, errors).
//
// The channel plumbing that actually implements these traits (crossbeam
// queues, a `Condvar`-backed latest-wins cell) lives in
// `reelsync_engine::fabric`; this module only fixes the wire vocabulary and
// the trait shapes so core stays thread-free.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PlayerError;
use crate::router::PeakValues;
use crate::sidecar::SidecarStatus;
use crate::state::PlaybackState;

/// Every event the public controller can emit (§4.9). Tagged so a consumer
/// can match on `kind()` without constructing the full payload, and so the
/// switchable controller (§6) can re-tag events from whichever concrete
/// controller is currently active without the UI noticing the switch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ControllerEvent {
    StateChanged(PlaybackState),
    Paused,
    Ended,
    Seeked { time: f64 },
    TimeUpdate { time: f64 },
    FrameUpdate { frame: u64 },
    DurationChange { duration: f64 },
    VolumeChange { volume: f32 },
    RateChange { rate: f64 },
    Waiting { waiting: bool },
    RouterConnectionsChanged,
    SoloChanged,
    MuteChanged,
    PeakMeter(PeakValues),
    SidecarStatusChanged { id: Uuid, status: SidecarStatus },
    AudioTracksChanged,
    SubtitlesTracksChanged,
    DetachedStateChanged { detached: bool },
    Error(PlayerError),
}

/// Coarse classification used for the filtered per-kind views §9 calls for
/// (e.g. a UI that only wants errors, or only wants meter updates).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Playback,
    Audio,
    Subtitles,
    Detached,
    Error,
}

impl ControllerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ControllerEvent::StateChanged(_)
            | ControllerEvent::Paused
            | ControllerEvent::Ended
            | ControllerEvent::Seeked { .. }
            | ControllerEvent::TimeUpdate { .. }
            | ControllerEvent::FrameUpdate { .. }
            | ControllerEvent::DurationChange { .. }
            | ControllerEvent::RateChange { .. }
            | ControllerEvent::Waiting { .. } => EventKind::Playback,

            ControllerEvent::RouterConnectionsChanged
            | ControllerEvent::SoloChanged
            | ControllerEvent::MuteChanged
            | ControllerEvent::PeakMeter(_)
            | ControllerEvent::SidecarStatusChanged { .. }
            | ControllerEvent::AudioTracksChanged
            | ControllerEvent::VolumeChange { .. } => EventKind::Audio,

            ControllerEvent::SubtitlesTracksChanged => EventKind::Subtitles,
            ControllerEvent::DetachedStateChanged { .. } => EventKind::Detached,
            ControllerEvent::Error(_) => EventKind::Error,
        }
    }
}

/// A "latest-wins" value slot: subscribers read the current value, never a
/// history of past ones. Implemented over a `Condvar`-gated cell in
/// `reelsync_engine::fabric`.
pub trait LatestValue<T: Clone> {
    fn current(&self) -> T;
    /// Blocks until the value changes from `previous`, then returns the new
    /// one — the primitive a redraw-on-change UI loop polls on.
    fn wait_for_change(&self, previous: &T) -> T;
}

/// An ordered, lossless event stream. Implemented over a `crossbeam_channel`
/// in `reelsync_engine::fabric`.
pub trait EventSource<T> {
    fn try_recv(&self) -> Option<T>;
    fn recv(&self) -> Option<T>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classification_covers_playback_and_audio() {
        assert_eq!(ControllerEvent::Paused.kind(), EventKind::Playback);
        assert_eq!(ControllerEvent::SoloChanged.kind(), EventKind::Audio);
        assert_eq!(ControllerEvent::SubtitlesTracksChanged.kind(), EventKind::Subtitles);
        assert_eq!(ControllerEvent::DetachedStateChanged { detached: true }.kind(), EventKind::Detached);
    }
}
