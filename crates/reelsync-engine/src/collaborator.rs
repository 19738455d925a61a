// crates/reelsync-engine/src/collaborator.rs
//
// §6 collaborator traits. The DOM/media element, the audio-graph factory,
// the network loader and the detached-window transport are all external to
// this crate by design (§1 Non-goals) — this is the seam the embedder
// implements against, the way the teacher treats `LiveDecoder`/`encode::*`
// as internals behind `MediaWorker` but a real GUI would implement its own
// rendering against `MediaWorker`'s public channels. Here, the "GUI" is
// whatever embeds `reelsync-engine`.

use crossbeam_channel::Receiver;
use reelsync_core::error::PlayerResult;
use reelsync_core::media::Video;
use reelsync_core::router::PeakValues;

use crate::detached::DetachedMessage;

/// Events a `MediaElement` implementation pushes as they occur. Mirrors the
/// `<video>` element event set the spec's §4 component descriptions assume.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaElementEvent {
    Playing,
    Paused,
    Seeking,
    Seeked,
    Ended,
    Waiting,
    CanPlay,
    TimeUpdate { time: f64 },
    DurationChange { duration: f64 },
    RateChange { rate: f64 },
    VolumeChange { volume: f32 },
    Error { message: String },
}

/// One delivery of the element's frame-presentation callback (the
/// `requestVideoFrameCallback`-shaped clock §4.3 calls `mf`'s source):
/// the media time the most recently *presented* frame corresponds to, its
/// frame number, and a running count of presented frames. This is
/// independent of `currentTime` — it reflects what has actually been
/// rendered, not merely requested — which is what makes it useful as a
/// second clock for the frame-sync engine to reconcile against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePresentation {
    pub media_time: f64,
    pub frame_number: u64,
    pub presented_frames: u64,
}

/// The playable element itself: commands are fire-and-forget from this
/// trait's point of view — the caller observes the effect through
/// `events()`, never through a synchronous return value, matching how a real
/// `<video>` element works.
pub trait MediaElement: Send + Sync {
    fn play(&self) -> PlayerResult<()>;
    fn pause(&self) -> PlayerResult<()>;
    fn seek(&self, time: f64) -> PlayerResult<()>;
    fn set_playback_rate(&self, rate: f64) -> PlayerResult<()>;
    fn set_volume(&self, volume: f32) -> PlayerResult<()>;
    fn set_muted(&self, muted: bool) -> PlayerResult<()>;
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    /// Returns a *fresh* broadcast subscription: every call gets its own
    /// receiver that sees every event independently. The event pump and the
    /// frame-sync engine each hold their own subscription concurrently, so
    /// implementations must fan events out (e.g. back this with
    /// `reelsync_engine::fabric::EventFabric`) rather than handing out a
    /// single shared single-consumer channel.
    fn events(&self) -> Receiver<MediaElementEvent>;
    /// The most recent frame-presentation sample, if the platform supports
    /// the callback and one has arrived since the last poll. `None` means
    /// no second clock is available right now — `step()` falls back to
    /// `currentTime` alone in that case.
    fn frame_presentation(&self) -> Option<FramePresentation>;
}

/// A single built audio graph instance (one per `AudioRouterState` the core
/// model tracks) — gain/connection changes are pushed here once the core
/// state has already validated them.
pub trait AudioGraphHandle: Send + Sync {
    fn apply_connections(&self, cells: &[(u16, u16, bool)]) -> PlayerResult<()>;
    fn set_input_silent(&self, input: u16, silent: bool) -> PlayerResult<()>;
    fn peak_values(&self) -> PeakValues;
}

/// Builds `AudioGraphHandle`s and reports the platform's hardware output
/// ceiling, the way `velocut-media`'s `encode::EncodeSpec` caller probes
/// hardware before committing to an encode profile.
pub trait AudioGraphFactory: Send + Sync {
    fn hardware_max_outputs(&self) -> u16;
    fn build(&self, inputs: u16, outputs: u16) -> PlayerResult<Box<dyn AudioGraphHandle>>;
}

/// Resolved metadata for a URL the loader accepted (§4.10).
pub struct LoadedMedia {
    pub video: Video,
}

/// The network/probe collaborator. `reelsync-engine::loader` decides native
/// vs. segmented *strategy*; this trait is what each strategy calls through
/// to actually fetch bytes and probe metadata.
pub trait Loader: Send + Sync {
    fn load(&self, url: &str) -> PlayerResult<LoadedMedia>;
}

/// The detached-window side channel (§6). `reelsync-engine::detached` drives
/// the heartbeat/handshake logic; this is the raw pipe it drives it over.
pub trait BroadcastTransport: Send + Sync {
    fn send(&self, message: DetachedMessage) -> PlayerResult<()>;
    fn events(&self) -> Receiver<DetachedMessage>;
}
