// crates/reelsync-engine/src/config.rs
//
// Tunables the spec's design notes call out with concrete defaults. A plain
// struct constructed with `Default` and overridden field-by-field — this
// crate does not own config *persistence* (reading a file, env vars); that's
// the embedding application's job, same as the teacher's `EncodeSpec` is
// just handed to `encode_timeline` rather than loaded internally.

use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct PlayerConfig {
    /// Bound on the frame-sync convergence loop's iteration count (§4.3, `L`).
    pub convergence_iteration_bound: u32,
    /// Tolerance added before flooring a `currentTime` to a frame index.
    pub frame_spill_epsilon_secs: f64,
    /// Period of the sync-tick / stall-watchdog thread (§4.5).
    pub stall_watchdog_period: Duration,
    /// How long `pause()` waits for the pause-sync forward step before giving up.
    pub pause_sync_timeout: Duration,
    /// Detached-window heartbeat interval and timeout (§6).
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub heartbeat_missed_limit: u32,
    /// Inclusive clamp range for `set_playback_rate`.
    pub playback_rate_min: f64,
    pub playback_rate_max: f64,
    /// How long a volume change is echoed back before being treated as stale
    /// (§4.9 volume echo suppression window).
    pub volume_echo_timeout: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            convergence_iteration_bound: 5,
            frame_spill_epsilon_secs: 0.001,
            stall_watchdog_period: Duration::from_millis(700),
            pause_sync_timeout: Duration::from_millis(500),
            heartbeat_interval: Duration::from_millis(1000),
            heartbeat_timeout: Duration::from_millis(2000),
            heartbeat_missed_limit: 3,
            playback_rate_min: 0.1,
            playback_rate_max: 16.0,
            volume_echo_timeout: Duration::from_secs(60),
        }
    }
}
