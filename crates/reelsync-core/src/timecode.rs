// crates/reelsync-core/src/timecode.rs
//
// C1 — Timecode & Frame Math.
//
// The SMPTE drop-frame conversions are pure integer arithmetic (see
// `drop_frame_frame_to_count` / `drop_frame_count_to_frame`) so they never
// pick up the float drift the spec's design notes warn about. Only the
// seconds<->frame boundary touches f64, because the platform's
// `currentTime` is an f64 by contract (§6) and there is no getting around
// that at the edge.

use serde::{Deserialize, Serialize};

use crate::error::{InvalidInput, PlayerError};
use crate::rational::Rational;

/// Frames skipped at the start of each non-exempt minute for 29.97 drop-frame.
const DROP_29_97: i64 = 2;
/// Frames skipped at the start of each non-exempt minute for 59.94 drop-frame.
const DROP_59_94: i64 = 4;

/// Tolerance applied before flooring `time * frame_rate`, so a `currentTime`
/// that lands a hair past a frame boundary (platform rounding) still maps to
/// that frame rather than spilling into the next one.
pub const DEFAULT_SPILL_EPSILON_SECS: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimecodeObject {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
    pub drop_frame: bool,
}

impl TimecodeObject {
    pub fn new(hours: u32, minutes: u32, seconds: u32, frames: u32, drop_frame: bool) -> Self {
        Self { hours, minutes, seconds, frames, drop_frame }
    }

    /// `(hours, minutes, seconds, frames)` as a single sortable key. Drop-frame
    /// omits frame *numbers*, never reorders them, so this tuple is a valid
    /// total order for timecodes sharing the same rate/drop-frame flag —
    /// which is the only comparison the spec asks for (§3: "total ordering
    /// by wall-clock position").
    fn sort_key(&self) -> (u32, u32, u32, u32) {
        (self.hours, self.minutes, self.seconds, self.frames)
    }
}

impl PartialOrd for TimecodeObject {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimecodeObject {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl std::fmt::Display for TimecodeObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sep = if self.drop_frame { ';' } else { ':' };
        write!(f, "{:02}:{:02}:{:02}{}{:02}", self.hours, self.minutes, self.seconds, sep, self.frames)
    }
}

/// Frame-rate and duration metadata needed to convert between seconds,
/// frame indices and timecodes. A thin view so callers don't need the full
/// `Video` (`media::Video`) to do frame math in isolation — `media::Video`
/// implements `Into<FrameRateContext>`.
#[derive(Clone, Copy, Debug)]
pub struct FrameRateContext {
    pub frame_rate: Rational,
    pub drop_frame: bool,
    pub spill_epsilon_secs: f64,
    /// Frame offset from this context's frame 0 to wall timecode
    /// `00:00:00:00` (§4.1 ffom — "first frame of moment"): media that
    /// doesn't start at zero timecode shifts every `frame_to_timecode`/
    /// `timecode_to_frame` call by this amount. Seconds<->frame math is
    /// untouched — the ffom only reshapes how frames are labeled, not how
    /// many seconds a frame spans.
    pub ffom_frame: i64,
}

impl FrameRateContext {
    pub fn new(frame_rate: Rational, drop_frame: bool) -> Result<Self, PlayerError> {
        if drop_frame && !supports_drop_frame(frame_rate) {
            return Err(InvalidInput::InvalidDropFrame.into());
        }
        Ok(Self { frame_rate, drop_frame, spill_epsilon_secs: DEFAULT_SPILL_EPSILON_SECS, ffom_frame: 0 })
    }

    /// Applies an ffom (§4.1): subsequent timecode conversions treat this
    /// context's frame 0 as `ffom` instead of `00:00:00:00`. A mismatched
    /// drop-frame flag on `ffom` is ignored (leaves the offset at zero)
    /// rather than failing, so this stays infallible for callers like
    /// `media::Video::frame_rate_context` that can't propagate an error here.
    pub fn with_ffom(mut self, ffom: Option<&TimecodeObject>) -> Self {
        if let Some(tc) = ffom {
            if tc.drop_frame == self.drop_frame {
                if let Ok(frame) = self.timecode_to_frame(tc) {
                    self.ffom_frame = frame as i64;
                }
            }
        }
        self
    }

    /// The nominal integer frame count used as the timecode's frames-field
    /// modulus and per-second frame multiplier (e.g. 30 for 29.97, 24 for
    /// 23.976) — SMPTE timecode always counts against the rounded rate, not
    /// the exact fractional one.
    fn nominal_fps(&self) -> i64 {
        self.frame_rate.to_f64().round() as i64
    }

    pub fn frame_duration(&self) -> Rational {
        self.frame_rate.recip()
    }

    pub fn time_to_frame(&self, time: f64) -> u64 {
        let adjusted = (time + self.spill_epsilon_secs).max(0.0);
        let f = (adjusted * self.frame_rate.to_f64()).floor();
        if f.is_sign_negative() || !f.is_finite() { 0 } else { f as u64 }
    }

    pub fn frame_to_time(&self, frame: u64) -> f64 {
        frame as f64 / self.frame_rate.to_f64()
    }

    pub fn time_to_timecode(&self, time: f64) -> TimecodeObject {
        self.frame_to_timecode(self.time_to_frame(time))
    }

    pub fn timecode_to_time(&self, tc: &TimecodeObject) -> Result<f64, PlayerError> {
        Ok(self.frame_to_time(self.timecode_to_frame(tc)?))
    }

    pub fn frame_to_timecode(&self, frame: u64) -> TimecodeObject {
        let nominal = self.nominal_fps();
        let shifted = frame as i64 + self.ffom_frame;
        let total_frames = if self.drop_frame {
            drop_frame_count_to_frame(shifted, nominal, drop_count_for(nominal))
        } else {
            shifted
        };

        let frames = (total_frames % nominal) as u32;
        let total_secs = total_frames / nominal;
        let seconds = (total_secs % 60) as u32;
        let minutes = ((total_secs / 60) % 60) as u32;
        let hours = (total_secs / 3600) as u32;

        TimecodeObject { hours, minutes, seconds, frames, drop_frame: self.drop_frame }
    }

    pub fn timecode_to_frame(&self, tc: &TimecodeObject) -> Result<u64, PlayerError> {
        if tc.drop_frame != self.drop_frame {
            return Err(InvalidInput::InvalidTimecode.into());
        }
        let nominal = self.nominal_fps();
        let raw = (tc.hours as i64 * 3600 + tc.minutes as i64 * 60 + tc.seconds as i64) * nominal
            + tc.frames as i64;

        let total_frames = if self.drop_frame {
            drop_frame_frame_to_count(tc.hours, tc.minutes, raw, nominal, drop_count_for(nominal))
        } else {
            raw
        };

        Ok((total_frames - self.ffom_frame).max(0) as u64)
    }
}

pub fn supports_drop_frame(frame_rate: Rational) -> bool {
    let r = frame_rate.to_f64();
    (r - 29.97).abs() < 0.01 || (r - 59.94).abs() < 0.01
}

fn drop_count_for(nominal_fps: i64) -> i64 {
    if nominal_fps >= 50 { DROP_59_94 } else { DROP_29_97 }
}

/// SMPTE drop-frame: subtract the frames that were skipped before this
/// timecode's minute boundary. `total_minutes - total_minutes/10` is the
/// count of non-exempt minutes (every 10th minute keeps its two frames).
fn drop_frame_frame_to_count(hours: u32, minutes: u32, raw_frame_number: i64, nominal_fps: i64, drop: i64) -> i64 {
    let _ = nominal_fps;
    let total_minutes = 60 * hours as i64 + minutes as i64;
    raw_frame_number - drop * (total_minutes - total_minutes / 10)
}

/// Inverse of `drop_frame_frame_to_count`: re-insert the skipped frame
/// numbers to recover the raw (non-drop-equivalent) frame count used for
/// the HH:MM:SS:FF breakdown.
fn drop_frame_count_to_frame(frame_number: i64, nominal_fps: i64, drop: i64) -> i64 {
    let frames_per_minute = nominal_fps * 60 - drop;
    let frames_per_10min = nominal_fps * 60 * 10 - drop * 9;

    let d = frame_number / frames_per_10min;
    let m = frame_number % frames_per_10min;

    if m > drop {
        frame_number + drop * 9 * d + drop * ((m - drop) / frames_per_minute)
    } else {
        frame_number + drop * 9 * d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_2997_df() -> FrameRateContext {
        FrameRateContext::new(Rational::new(30000, 1001), true).unwrap()
    }

    fn ctx_2997_ndf() -> FrameRateContext {
        FrameRateContext::new(Rational::new(30000, 1001), false).unwrap()
    }

    fn ctx_23976() -> FrameRateContext {
        FrameRateContext::new(Rational::new(24000, 1001), false).unwrap()
    }

    #[test]
    fn rejects_drop_frame_on_unsupported_rate() {
        let err = FrameRateContext::new(Rational::new(24000, 1001), true).unwrap_err();
        assert_eq!(err, InvalidInput::InvalidDropFrame.into());
    }

    #[test]
    fn drop_frame_one_hour_boundary() {
        // §8 invariant 5: timecode("01:00:00;00") -> frame == 107892, and back.
        let ctx = ctx_2997_df();
        let tc = TimecodeObject::new(1, 0, 0, 0, true);
        let frame = ctx.timecode_to_frame(&tc).unwrap();
        assert_eq!(frame, 107892);
        let back = ctx.frame_to_timecode(frame);
        assert_eq!(back, tc);
    }

    #[test]
    fn drop_frame_skips_frame_numbers_except_every_tenth_minute() {
        let ctx = ctx_2997_df();
        // Frame 1798 is the last frame of minute 0 (00:00:59;29 at 30fps would
        // be frame 1799, but drop-frame minute 1 starts two frames early at
        // the non-exempt minute boundary).
        let at_59_29 = TimecodeObject::new(0, 0, 59, 29, true);
        let f = ctx.timecode_to_frame(&at_59_29).unwrap();
        let next = ctx.frame_to_timecode(f + 1);
        assert_eq!(next, TimecodeObject::new(0, 1, 0, 2, true));

        // Minute 10 is exempt: no skip, 00:10:00;00 follows immediately after
        // 00:09:59;29.
        let at_9_59_29 = TimecodeObject::new(0, 9, 59, 29, true);
        let f2 = ctx.timecode_to_frame(&at_9_59_29).unwrap();
        let next2 = ctx.frame_to_timecode(f2 + 1);
        assert_eq!(next2, TimecodeObject::new(0, 10, 0, 0, true));
    }

    #[test]
    fn non_drop_round_trip_is_identity_on_frame_aligned_times() {
        let ctx = ctx_2997_ndf();
        for frame in [0u64, 1, 30, 120, 3600, 100_000] {
            let t = ctx.frame_to_time(frame);
            assert_eq!(ctx.time_to_frame(t), frame);
            let tc = ctx.frame_to_timecode(frame);
            assert_eq!(ctx.timecode_to_frame(&tc).unwrap(), frame);
            let t2 = ctx.timecode_to_time(&tc).unwrap();
            assert_eq!(ctx.time_to_frame(t2), frame);
        }
    }

    #[test]
    fn timecode_drop_flag_mismatch_fails() {
        let ctx = ctx_2997_ndf();
        let tc = TimecodeObject::new(0, 1, 0, 2, true);
        let err = ctx.timecode_to_frame(&tc).unwrap_err();
        assert_eq!(err, InvalidInput::InvalidTimecode.into());
    }

    #[test]
    fn scenario_a_frame_accurate_seek_on_23976() {
        // §8 scenario A: 240-frame 24000/1001 clip, non-drop. seek_to_timecode
        // "00:00:05:00" lands on frame 120 at to_time ~= 5.005.
        let ctx = ctx_23976();
        let tc = TimecodeObject::new(0, 0, 5, 0, false);
        let frame = ctx.timecode_to_frame(&tc).unwrap();
        assert_eq!(frame, 120);
        let t = ctx.frame_to_time(frame);
        assert!((t - 5.005).abs() < 0.001);
    }

    #[test]
    fn ffom_shifts_timecode_conversions_but_not_seconds_math() {
        // §4.1: media whose frame 0 is actually timecode 01:00:00:00.
        let ctx = ctx_23976().with_ffom(Some(&TimecodeObject::new(1, 0, 0, 0, false)));
        assert_eq!(ctx.frame_to_timecode(0), TimecodeObject::new(1, 0, 0, 0, false));

        let tc = TimecodeObject::new(1, 0, 5, 0, false);
        assert_eq!(ctx.timecode_to_frame(&tc).unwrap(), 120);

        // frame<->seconds math is unaffected by the offset.
        assert_eq!(ctx.frame_to_time(120), ctx_23976().frame_to_time(120));
    }

    #[test]
    fn ffom_with_mismatched_drop_frame_flag_is_ignored() {
        let ctx = ctx_23976().with_ffom(Some(&TimecodeObject::new(1, 0, 0, 0, true)));
        assert_eq!(ctx.ffom_frame, 0);
    }

    #[test]
    fn spill_over_epsilon_tolerates_tiny_overshoot() {
        let ctx = ctx_2997_ndf();
        let exact = ctx.frame_to_time(100);
        // A hair past the boundary (simulating platform rounding) still maps
        // to frame 100, not 101.
        assert_eq!(ctx.time_to_frame(exact + 0.0001), 100);
    }
}
