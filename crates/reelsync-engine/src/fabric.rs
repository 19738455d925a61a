// crates/reelsync-engine/src/fabric.rs
//
// C9 plumbing: concrete channel types backing the `LatestValue<T>` /
// `EventSource<T>` traits `reelsync-core::events` only declares the shape
// of. `LatestValueCell` is the same `Mutex` + `Condvar` "latest-wins slot"
// pattern as the teacher's `frame_req` in `MediaWorker` (§ worker.rs), here
// generalized from a scrub-frame request to any polled value
// (`current_time`, playback rate, peak meters). `EventChannel` is a plain
// `crossbeam_channel`, same as the teacher's `MediaResult` channel, used for
// anything that must never coalesce (`paused`, `ended`, errors).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use reelsync_core::error::PlayerResult;
use reelsync_core::events::{ControllerEvent, EventSource, LatestValue};
use reelsync_core::router::PeakValues;
use reelsync_core::state::PlaybackState;

/// Cloneable handle onto a latest-wins value slot.
pub struct LatestValueCell<T> {
    inner: Arc<(Mutex<T>, Condvar)>,
}

impl<T> Clone for LatestValueCell<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Clone + PartialEq> LatestValueCell<T> {
    pub fn new(initial: T) -> Self {
        Self { inner: Arc::new((Mutex::new(initial), Condvar::new())) }
    }

    pub fn set(&self, value: T) {
        let (lock, cvar) = &*self.inner;
        let mut guard = lock.lock();
        if *guard != value {
            *guard = value;
            cvar.notify_all();
        }
    }
}

impl<T: Clone + PartialEq> LatestValue<T> for LatestValueCell<T> {
    fn current(&self) -> T {
        let (lock, _) = &*self.inner;
        lock.lock().clone()
    }

    fn wait_for_change(&self, previous: &T) -> T {
        let (lock, cvar) = &*self.inner;
        let mut guard = lock.lock();
        while &*guard == previous {
            cvar.wait(&mut guard);
        }
        guard.clone()
    }
}

/// Publisher side of an ordered event stream.
pub struct EventPublisher<T> {
    tx: Sender<T>,
}

impl<T> Clone for EventPublisher<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T> EventPublisher<T> {
    /// Never blocks the caller on a full channel: the spec treats the event
    /// fabric as best-effort toward any subscriber that stopped draining,
    /// same as `MediaWorker`'s `let _ = tx.send(...)` call sites.
    pub fn publish(&self, event: T) {
        let _ = self.tx.send(event);
    }
}

/// Subscriber side; wraps `crossbeam_channel::Receiver` so
/// `EventSource<T>` (declared in `reelsync-core`) can be implemented on a
/// type local to this crate.
pub struct EventSubscriber<T> {
    rx: Receiver<T>,
}

impl<T> EventSource<T> for EventSubscriber<T> {
    fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }
}

pub fn event_channel<T>() -> (EventPublisher<T>, EventSubscriber<T>) {
    let (tx, rx) = unbounded();
    (EventPublisher { tx }, EventSubscriber { rx })
}

/// Fans one published event out to every current subscriber — the shape §9
/// means by "event fabric": any number of UI-side listeners, each with its
/// own ordered, lossless view, none of them draining into each other's way.
pub struct EventFabric<T> {
    subscribers: Mutex<Vec<Sender<T>>>,
}

impl<T> Default for EventFabric<T> {
    fn default() -> Self {
        Self { subscribers: Mutex::new(Vec::new()) }
    }
}

impl<T: Clone> EventFabric<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> EventSubscriber<T> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        EventSubscriber { rx }
    }

    /// Drops any subscriber whose receiver has gone away.
    pub fn publish(&self, event: T) {
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// The minimal surface the Switchable Controller facade (§4.9) needs from
/// whichever concrete controller is currently active — small enough that
/// any future controller implementation (e.g. a detached-window stand-in)
/// can satisfy it alongside `reelsync_engine::controller::VideoController`.
pub trait VideoControllerLike: Send + Sync {
    fn subscribe(&self) -> EventSubscriber<ControllerEvent>;
    fn playback_state(&self) -> PlaybackState;
    fn peak_values(&self) -> PlayerResult<PeakValues>;
}

/// §1/§4.9 Switchable Controller: a facade over whichever concrete
/// controller is currently active, so a caller can hold one stable
/// subscription across a handoff (e.g. main window <-> detached window)
/// instead of resubscribing itself every time the backing controller
/// changes. Every event from the current inner controller is relayed onto
/// this facade's own fabric; `replace()` tears down the old relay, installs
/// the new inner controller, and replays its current `LatestValue` state
/// (playback state, peak meter) so subscribers see the handoff immediately
/// instead of waiting on the new controller's next natural event.
pub struct SwitchableController {
    inner: Mutex<Arc<dyn VideoControllerLike>>,
    fabric: Arc<EventFabric<ControllerEvent>>,
    relay_shutdown: Mutex<Option<Arc<AtomicBool>>>,
    relay_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SwitchableController {
    pub fn new(inner: Arc<dyn VideoControllerLike>) -> Arc<Self> {
        let facade = Arc::new(Self {
            inner: Mutex::new(Arc::clone(&inner)),
            fabric: Arc::new(EventFabric::new()),
            relay_shutdown: Mutex::new(None),
            relay_handle: Mutex::new(None),
        });
        facade.spawn_relay(inner);
        facade.replay_latest();
        facade
    }

    /// A stable subscription that survives any number of `replace()` calls.
    pub fn subscribe(&self) -> EventSubscriber<ControllerEvent> {
        self.fabric.subscribe()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.inner.lock().playback_state()
    }

    /// Swaps the active inner controller: stops relaying the old one's
    /// events, starts relaying the new one's, and immediately replays its
    /// current playback/peak state so subscribers don't see a gap.
    pub fn replace(&self, inner: Arc<dyn VideoControllerLike>) {
        self.stop_relay();
        *self.inner.lock() = Arc::clone(&inner);
        self.spawn_relay(inner);
        self.replay_latest();
    }

    /// Replays `LatestValue`-shaped state explicitly rather than waiting for
    /// the new controller to emit it on its own — the peak-meter stream in
    /// particular only updates while audio is flowing, so a silent swap
    /// would otherwise leave subscribers on a stale reading.
    fn replay_latest(&self) {
        let inner = self.inner.lock().clone();
        self.fabric.publish(ControllerEvent::StateChanged(inner.playback_state()));
        if let Ok(peak) = inner.peak_values() {
            self.fabric.publish(ControllerEvent::PeakMeter(peak));
        }
    }

    fn spawn_relay(&self, inner: Arc<dyn VideoControllerLike>) {
        let shutdown = Arc::new(AtomicBool::new(false));
        *self.relay_shutdown.lock() = Some(Arc::clone(&shutdown));
        let sub = inner.subscribe();
        let fabric = Arc::clone(&self.fabric);
        let handle = thread::spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                match sub.try_recv() {
                    Some(event) => fabric.publish(event),
                    None => thread::sleep(Duration::from_millis(20)),
                }
            }
        });
        *self.relay_handle.lock() = Some(handle);
    }

    fn stop_relay(&self) {
        if let Some(shutdown) = self.relay_shutdown.lock().take() {
            shutdown.store(true, Ordering::Relaxed);
        }
        if let Some(handle) = self.relay_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SwitchableController {
    fn drop(&mut self) {
        self.stop_relay();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_value_cell_coalesces_and_reports_current() {
        let cell = LatestValueCell::new(0u64);
        cell.set(1);
        cell.set(2);
        assert_eq!(cell.current(), 2);
    }

    #[test]
    fn event_channel_delivers_every_event_in_order() {
        let (tx, rx) = event_channel::<u32>();
        tx.publish(1);
        tx.publish(2);
        tx.publish(3);
        assert_eq!(rx.try_recv(), Some(1));
        assert_eq!(rx.try_recv(), Some(2));
        assert_eq!(rx.try_recv(), Some(3));
        assert_eq!(rx.try_recv(), None);
    }
}
