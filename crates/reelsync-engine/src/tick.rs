// crates/reelsync-engine/src/tick.rs
//
// C5 — Sync Tick / Stall Watchdog. A background thread, same shutdown-flag
// shape as the teacher's decode threads (`Arc<AtomicBool>` checked each
// loop), that periodically samples the element's reported time and the
// active sidecars' load status, then (a) reports a stall if playback time
// hasn't advanced in over two watchdog periods while the element claims to
// be playing, and (b) toggles `waiting_synced_media` while any active
// sidecar is still buffering (§8 scenario D).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::warn;

use reelsync_core::sidecar::SidecarAudioState;

use crate::collaborator::MediaElement;
use crate::config::PlayerConfig;
use crate::fabric::EventPublisher;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickSignal {
    Stalled { stalled_for: Duration },
    WaitingSyncedMedia(bool),
}

/// Pure evaluation step: given the last time the element's reported position
/// actually changed, decide whether that counts as a stall right now.
pub fn evaluate_stall(last_progress_at: Instant, now: Instant, period: Duration, is_playing: bool) -> Option<TickSignal> {
    if !is_playing {
        return None;
    }
    let elapsed = now.duration_since(last_progress_at);
    if elapsed >= period * 2 {
        Some(TickSignal::Stalled { stalled_for: elapsed })
    } else {
        None
    }
}

pub struct StallWatchdog {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StallWatchdog {
    pub fn spawn(
        element: Arc<dyn MediaElement>,
        sidecars: Arc<Mutex<SidecarAudioState>>,
        is_playing: Arc<AtomicBool>,
        config: PlayerConfig,
        publisher: EventPublisher<TickSignal>,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::spawn(move || {
            let mut last_time = element.current_time();
            let mut last_progress_at = Instant::now();
            let mut was_waiting_sync = false;

            while !thread_shutdown.load(Ordering::Relaxed) {
                thread::sleep(config.stall_watchdog_period);

                let now_time = element.current_time();
                let now = Instant::now();
                if (now_time - last_time).abs() > f64::EPSILON {
                    last_time = now_time;
                    last_progress_at = now;
                }

                if let Some(signal @ TickSignal::Stalled { stalled_for }) =
                    evaluate_stall(last_progress_at, now, config.stall_watchdog_period, is_playing.load(Ordering::Relaxed))
                {
                    warn!(?stalled_for, "playback stall detected");
                    publisher.publish(signal);
                }

                let waiting_sync = sidecars.lock().any_active_loading();
                if waiting_sync != was_waiting_sync {
                    was_waiting_sync = waiting_sync;
                    publisher.publish(TickSignal::WaitingSyncedMedia(waiting_sync));
                }
            }
        });

        Self { shutdown, handle: Some(handle) }
    }

    pub fn stop(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for StallWatchdog {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}
