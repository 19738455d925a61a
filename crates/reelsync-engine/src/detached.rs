// crates/reelsync-engine/src/detached.rs
//
// §6 detached-window protocol. The wire format between the main window and a
// detached playback window is explicitly out of scope (the embedder owns the
// actual transport — postMessage, IPC, whatever); what's in scope is the
// handshake/heartbeat *shape* this crate drives through `BroadcastTransport`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Messages exchanged with a detached window over whatever transport the
/// embedder's `BroadcastTransport` wraps. `Serialize`/`Deserialize` so the
/// embedder can put these directly on a `postMessage`/IPC wire without its
/// own shadow protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DetachedMessage {
    /// Sent periodically by whichever side owns playback so the other side
    /// can detect a dead window.
    Heartbeat { seq: u64 },
    /// A command forwarded to the detached window's media element.
    Command(DetachedCommand),
    /// Acknowledges a `Command`.
    Ack { seq: u64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DetachedCommand {
    Play,
    Pause,
    Seek { time: f64 },
    SetRate { rate: f64 },
    SetVolume { volume: f32 },
}

/// Tracks consecutive missed heartbeats so the owning side can declare the
/// peer window gone (`heartbeat_missed_limit`, §1 ambient config).
#[derive(Debug)]
pub struct HeartbeatMonitor {
    interval: Duration,
    timeout: Duration,
    missed_limit: u32,
    last_seen: Instant,
    consecutive_misses: u32,
}

impl HeartbeatMonitor {
    pub fn new(interval: Duration, timeout: Duration, missed_limit: u32) -> Self {
        Self { interval, timeout, missed_limit, last_seen: Instant::now(), consecutive_misses: 0 }
    }

    pub fn on_heartbeat(&mut self) {
        self.last_seen = Instant::now();
        self.consecutive_misses = 0;
    }

    /// Called roughly every `interval`; returns true once the peer should be
    /// considered lost.
    pub fn tick(&mut self) -> bool {
        if self.last_seen.elapsed() >= self.timeout {
            self.consecutive_misses += 1;
        }
        self.consecutive_misses >= self.missed_limit
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_resets_miss_counter() {
        let mut m = HeartbeatMonitor::new(Duration::from_millis(10), Duration::from_millis(0), 3);
        assert!(!m.tick());
        assert!(!m.tick());
        m.on_heartbeat();
        assert_eq!(m.consecutive_misses, 0);
        assert!(!m.tick());
    }

    #[test]
    fn declares_lost_after_missed_limit() {
        let mut m = HeartbeatMonitor::new(Duration::from_millis(10), Duration::from_millis(0), 3);
        assert!(!m.tick());
        assert!(!m.tick());
        assert!(m.tick());
    }
}
