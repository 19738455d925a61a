// crates/reelsync-core/src/error.rs
//
// Error taxonomy per spec §7. Each top-level group is its own nested enum so
// call sites can match precisely (`PlayerError::InvalidInput(InvalidInput::InvalidUrl)`)
// instead of one flat bag of fifty variants.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidInput {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid frame rate: {0}/{1}")]
    InvalidFrameRate(i64, i64),
    #[error("drop-frame timecode is not supported at this frame rate")]
    InvalidDropFrame,
    #[error("timecode is incompatible with the loaded video")]
    InvalidTimecode,
    #[error("invalid duration: {0}")]
    InvalidDuration(f64),
    #[error("invalid volume: {0}")]
    InvalidVolume(f32),
    #[error("invalid playback rate: {0}")]
    InvalidPlaybackRate(f64),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateViolation {
    #[error("no video is loaded")]
    VideoNotLoaded,
    #[error("controller cannot be detached")]
    NotDetachable,
    #[error("controller cannot be attached")]
    NotAttachable,
    #[error("picture-in-picture is not supported on this platform")]
    PiPUnsupported,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoaderFailure {
    #[error("unrecognized protocol for url: {0}")]
    UnrecognizedProtocol(String),
    #[error("load failed: {message}")]
    LoadFailed { message: String },
    #[error("media load timed out")]
    MediaLoadTimeout,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioFailure {
    #[error("audio context is not ready")]
    AudioContextNotReady,
    #[error("router has not been created")]
    RouterNotCreated,
    #[error("sidecar not found: {0}")]
    SidecarNotFound(uuid::Uuid),
    #[error("sidecar failed to load: {0}")]
    SidecarLoadFailed(String),
    #[error("an effects-graph install is already in flight for this slot")]
    ConcurrentEffectsInstall,
    #[error("slot is not supported")]
    SlotNotSupported,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlatformPermission {
    #[error("playback was not allowed by the platform")]
    PlaybackNotAllowed,
    #[error("fullscreen was not allowed by the platform")]
    FullscreenNotAllowed,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WindowPlayback {
    #[error("detached window could not perform operation: {op}")]
    VideoWindowPlaybackError { op: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlayerError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error(transparent)]
    StateViolation(#[from] StateViolation),
    #[error(transparent)]
    LoaderFailure(#[from] LoaderFailure),
    #[error(transparent)]
    AudioFailure(#[from] AudioFailure),
    #[error(transparent)]
    PlatformPermission(#[from] PlatformPermission),
    #[error(transparent)]
    WindowPlayback(#[from] WindowPlayback),
}

pub type PlayerResult<T> = Result<T, PlayerError>;
