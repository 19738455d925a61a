// crates/reelsync-engine/src/breaker.rs
//
// §5 breaker tokens: single-shot cancellation signals scoped to a video
// load, a seek, a pause-sync wait, or the whole controller's lifetime.
// Dispatching a new operation of the same kind trips the previous token;
// anything still running checks `is_tripped()` at its yield points and bails
// out quietly rather than publishing stale results. Same shape as the
// teacher's per-job `encode_cancels: Arc<Mutex<HashMap<Uuid, Arc<AtomicBool>>>>`
// (`worker.rs`), reduced to the single-slot case since these operations are
// latest-wins rather than keyed by job id.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone, Default)]
pub struct Breaker {
    tripped: Arc<AtomicBool>,
}

impl Breaker {
    pub fn new() -> Self {
        Self { tripped: Arc::new(AtomicBool::new(false)) }
    }

    pub fn trip(&self) {
        self.tripped.store(true, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

/// Holds the currently-active breaker for one operation kind. `supersede`
/// trips whatever was active and installs a fresh breaker, returning it —
/// the pattern every "latest request wins, cancel the rest" slot in this
/// crate uses (seek, video load, pause-sync wait).
#[derive(Default)]
pub struct BreakerSlot {
    current: Mutex<Option<Breaker>>,
}

impl BreakerSlot {
    pub fn new() -> Self {
        Self { current: Mutex::new(None) }
    }

    pub fn supersede(&self) -> Breaker {
        let mut guard = self.current.lock();
        if let Some(prev) = guard.take() {
            prev.trip();
        }
        let fresh = Breaker::new();
        *guard = Some(fresh.clone());
        fresh
    }

    pub fn trip_current(&self) {
        if let Some(b) = self.current.lock().take() {
            b.trip();
        }
    }
}
