//! The playback runtime: background threads, collaborator traits and the
//! public `VideoController` that drives a `MediaElement` according to the
//! rules `reelsync-core` defines. Everything here is I/O-adjacent — the
//! actual decoding, rendering and network transport are owned by whatever
//! embeds this crate and implements the collaborator traits in
//! [`collaborator`].

pub mod audio_rt;
pub mod breaker;
pub mod collaborator;
pub mod config;
pub mod controller;
pub mod detached;
pub mod fabric;
pub mod frame_sync;
pub mod loader;
pub mod seek;
pub mod sidecar_rt;
pub mod subtitles_rt;
pub mod tick;

pub use collaborator::{
    AudioGraphFactory, AudioGraphHandle, BroadcastTransport, FramePresentation, Loader, MediaElement, MediaElementEvent,
};
pub use config::PlayerConfig;
pub use controller::VideoController;
pub use fabric::{SwitchableController, VideoControllerLike};
