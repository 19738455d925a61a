// crates/reelsync-core/src/media.rs
//
// §3 Data Model — the parts that are immutable/descriptive rather than
// behavioral (behavior for the router/sidecar/subtitles lives in their own
// modules). Mirrors the shape of `velocut-core::state` (plain serde structs,
// no runtime handles) but for playback metadata instead of an editor
// timeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InvalidInput, PlayerError};
use crate::rational::Rational;
use crate::timecode::{supports_drop_frame, FrameRateContext, TimecodeObject};

/// Immutable-after-load video descriptor (§3 `Video`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Video {
    pub source_url: String,
    pub frame_rate: Rational,
    pub drop_frame: bool,
    pub duration: f64,
    pub total_frames: u64,
    pub audio_only: bool,
    pub ffom_timecode: Option<TimecodeObject>,
    /// Refined from element feedback once playback has actually run; see
    /// `Video::effective_duration`.
    pub corrected_duration: Option<f64>,
}

impl Video {
    pub fn new(
        source_url: impl Into<String>,
        frame_rate: Rational,
        drop_frame: bool,
        duration: f64,
        audio_only: bool,
    ) -> Result<Self, PlayerError> {
        let url = source_url.into();
        if url.trim().is_empty() {
            return Err(InvalidInput::InvalidUrl(url).into());
        }
        if frame_rate.num() <= 0 || frame_rate.den() <= 0 {
            return Err(InvalidInput::InvalidFrameRate(frame_rate.num(), frame_rate.den()).into());
        }
        if drop_frame && !supports_drop_frame(frame_rate) {
            return Err(InvalidInput::InvalidDropFrame.into());
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(InvalidInput::InvalidDuration(duration).into());
        }

        let total_frames = (duration * frame_rate.to_f64()).floor() as u64;

        Ok(Self {
            source_url: url,
            frame_rate,
            drop_frame,
            duration,
            total_frames,
            audio_only,
            ffom_timecode: None,
            corrected_duration: None,
        })
    }

    pub fn frame_duration(&self) -> Rational {
        self.frame_rate.recip()
    }

    /// The duration used for end-of-stream seeks and clamping — the
    /// corrected value when known, else the loader-reported one (§4.4
    /// `seek_to_end`, §4.10 step 7).
    pub fn effective_duration(&self) -> f64 {
        self.corrected_duration.unwrap_or(self.duration)
    }

    pub fn frame_rate_context(&self) -> FrameRateContext {
        // Validated at construction time, so this cannot fail.
        FrameRateContext::new(self.frame_rate, self.drop_frame)
            .expect("Video invariants guarantee a valid frame-rate context")
            .with_ffom(self.ffom_timecode.as_ref())
    }
}

/// §3 `OmpAudioTrack`. Mains are `embedded=true`; sidecars `embedded=false`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OmpAudioTrack {
    pub id: Uuid,
    pub label: String,
    pub language: Option<String>,
    pub src: Option<String>,
    pub embedded: bool,
    pub active: bool,
    pub channel_count: Option<u16>,
}

/// §3 `SubtitlesVttTrack`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubtitlesVttTrack {
    pub id: Uuid,
    pub label: String,
    pub language: String,
    pub url: String,
    pub default: bool,
    pub hidden: bool,
}
