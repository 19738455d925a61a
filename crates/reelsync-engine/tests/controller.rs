// End-to-end tests against mock collaborators, covering the §8 scenarios
// the controller's testable properties describe. No real `<video>` element,
// audio hardware or network loader is involved — everything it would talk to
// is a hand-rolled double living in this file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use reelsync_core::error::PlayerResult;
use reelsync_core::events::{ControllerEvent, EventSource};
use reelsync_core::media::{OmpAudioTrack, Video};
use reelsync_core::rational::Rational;
use reelsync_core::router::PeakValues;

use reelsync_engine::collaborator::{
    AudioGraphFactory, AudioGraphHandle, FramePresentation, LoadedMedia, Loader, MediaElement, MediaElementEvent,
};
use reelsync_engine::config::PlayerConfig;
use reelsync_engine::fabric::EventSubscriber;
use reelsync_engine::VideoController;

/// Minimal fan-out broadcaster backing `MockMediaElement::events()` — every
/// subscriber sees every event independently, same contract `MediaElement`
/// documents for a real implementation.
struct Broadcaster<T> {
    subs: Mutex<Vec<crossbeam_channel::Sender<T>>>,
}

impl<T: Clone> Broadcaster<T> {
    fn new() -> Self {
        Self { subs: Mutex::new(Vec::new()) }
    }

    fn subscribe(&self) -> crossbeam_channel::Receiver<T> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subs.lock().push(tx);
        rx
    }

    fn publish(&self, event: T) {
        let mut subs = self.subs.lock();
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// A `MediaElement` double whose `seek` lands exactly on the requested time
/// unless `stall` is set, so frame-sync convergence is deterministic.
struct MockMediaElement {
    current_time: Mutex<f64>,
    duration: f64,
    events: Broadcaster<MediaElementEvent>,
    stall: AtomicBool,
    rate_calls: Mutex<Vec<f64>>,
    mute_calls: Mutex<Vec<bool>>,
}

impl MockMediaElement {
    fn new(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            current_time: Mutex::new(0.0),
            duration,
            events: Broadcaster::new(),
            stall: AtomicBool::new(false),
            rate_calls: Mutex::new(Vec::new()),
            mute_calls: Mutex::new(Vec::new()),
        })
    }

    fn set_current_time(&self, t: f64) {
        *self.current_time.lock() = t;
    }

    fn set_stall(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }
}

impl MediaElement for MockMediaElement {
    fn play(&self) -> PlayerResult<()> {
        self.events.publish(MediaElementEvent::Playing);
        Ok(())
    }

    fn pause(&self) -> PlayerResult<()> {
        self.events.publish(MediaElementEvent::Paused);
        Ok(())
    }

    fn seek(&self, time: f64) -> PlayerResult<()> {
        if self.stall.load(Ordering::SeqCst) {
            return Ok(());
        }
        *self.current_time.lock() = time;
        self.events.publish(MediaElementEvent::Seeked);
        Ok(())
    }

    fn set_playback_rate(&self, rate: f64) -> PlayerResult<()> {
        self.rate_calls.lock().push(rate);
        Ok(())
    }

    fn set_volume(&self, _volume: f32) -> PlayerResult<()> {
        Ok(())
    }

    fn set_muted(&self, muted: bool) -> PlayerResult<()> {
        self.mute_calls.lock().push(muted);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        *self.current_time.lock()
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn events(&self) -> crossbeam_channel::Receiver<MediaElementEvent> {
        self.events.subscribe()
    }

    fn frame_presentation(&self) -> Option<FramePresentation> {
        None
    }
}

struct MockAudioGraphHandle {
    connections: Mutex<Vec<(u16, u16, bool)>>,
    silenced: Arc<Mutex<Vec<(u16, bool)>>>,
}

impl AudioGraphHandle for MockAudioGraphHandle {
    fn apply_connections(&self, cells: &[(u16, u16, bool)]) -> PlayerResult<()> {
        *self.connections.lock() = cells.to_vec();
        Ok(())
    }

    fn set_input_silent(&self, input: u16, silent: bool) -> PlayerResult<()> {
        self.silenced.lock().push((input, silent));
        Ok(())
    }

    fn peak_values(&self) -> PeakValues {
        PeakValues { peak_values_per_channel: vec![0.0, 0.0] }
    }
}

/// Records every `set_input_silent` call across the handles it builds, so a
/// test can assert on solo/mute fan-out without reaching into the
/// controller's private router state.
struct MockAudioGraphFactory {
    silenced: Arc<Mutex<Vec<(u16, bool)>>>,
}

impl MockAudioGraphFactory {
    fn new() -> (Arc<Self>, Arc<Mutex<Vec<(u16, bool)>>>) {
        let silenced = Arc::new(Mutex::new(Vec::new()));
        (Arc::new(Self { silenced: Arc::clone(&silenced) }), silenced)
    }
}

impl AudioGraphFactory for MockAudioGraphFactory {
    fn hardware_max_outputs(&self) -> u16 {
        2
    }

    fn build(&self, _inputs: u16, _outputs: u16) -> PlayerResult<Box<dyn AudioGraphHandle>> {
        Ok(Box::new(MockAudioGraphHandle { connections: Mutex::new(Vec::new()), silenced: Arc::clone(&self.silenced) }))
    }
}

/// Resolves to a fixed video, optionally blocking on `gate` first — used to
/// hold a sidecar in `Loading` until the test is ready to release it.
struct MockLoader {
    video: Video,
    gate: Option<crossbeam_channel::Receiver<()>>,
}

impl MockLoader {
    fn immediate(video: Video) -> Arc<Self> {
        Arc::new(Self { video, gate: None })
    }

    fn gated(video: Video, gate: crossbeam_channel::Receiver<()>) -> Arc<Self> {
        Arc::new(Self { video, gate: Some(gate) })
    }
}

impl Loader for MockLoader {
    fn load(&self, _url: &str) -> PlayerResult<LoadedMedia> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        Ok(LoadedMedia { video: self.video.clone() })
    }
}

fn video_23_976() -> Video {
    Video::new("https://host/a.mp4", Rational::new(24000, 1001), false, 10.0, false).unwrap()
}

fn make_controller(element: Arc<MockMediaElement>) -> Arc<VideoController> {
    let (factory, _silenced) = MockAudioGraphFactory::new();
    make_controller_with_factory(element, factory)
}

fn make_controller_with_factory(element: Arc<MockMediaElement>, audio: Arc<dyn AudioGraphFactory>) -> Arc<VideoController> {
    let loader = MockLoader::immediate(video_23_976());
    VideoController::new(element, audio, loader.clone(), loader.clone(), loader, PlayerConfig::default())
}

fn wait_for(sub: &EventSubscriber<ControllerEvent>, timeout: Duration, mut pred: impl FnMut(&ControllerEvent) -> bool) -> Option<ControllerEvent> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(event) = sub.try_recv() {
            if pred(&event) {
                return Some(event);
            }
        } else if Instant::now() >= deadline {
            return None;
        } else {
            thread::sleep(Duration::from_millis(5));
        }
    }
}

fn wait_until(timeout: Duration, mut poll: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if poll() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn scenario_a_frame_accurate_seek_on_23976() {
    let element = MockMediaElement::new(10.0);
    let controller = make_controller(Arc::clone(&element));
    controller.load("https://host/a.mp4").unwrap();

    let sub = controller.subscribe();
    let tc = reelsync_core::timecode::TimecodeObject::new(0, 0, 5, 0, false);
    controller.seek_to_timecode(&tc).unwrap();

    let event = wait_for(&sub, Duration::from_secs(2), |e| matches!(e, ControllerEvent::Seeked { .. }));
    assert!(event.is_some(), "expected a Seeked event after seek_to_timecode");

    let video = controller.video().unwrap();
    let ctx = video.frame_rate_context();
    assert_eq!(ctx.time_to_frame(element.current_time()), 120);
}

#[test]
fn scenario_b_pause_lands_on_whole_frame() {
    let element = MockMediaElement::new(10.0);
    let controller = make_controller(Arc::clone(&element));
    controller.load("https://host/a.mp4").unwrap();

    let video = controller.video().unwrap();
    let ctx = video.frame_rate_context();
    element.set_current_time(ctx.frame_to_time(10));

    controller.play().unwrap();
    assert!(wait_until(Duration::from_secs(1), || controller.playback_state().playing));

    controller.pause().unwrap();
    assert!(wait_until(Duration::from_secs(1), || controller.playback_state().paused));

    assert_eq!(ctx.time_to_frame(element.current_time()), 11);
}

#[test]
fn scenario_c_seek_cancel_via_breaker() {
    use reelsync_engine::frame_sync::ConvergenceOutcome;
    use reelsync_engine::seek::SeekOrchestrator;

    let element = MockMediaElement::new(10.0);
    element.set_stall(true);
    let video = video_23_976();
    let config = PlayerConfig { pause_sync_timeout: Duration::from_millis(150), ..PlayerConfig::default() };
    let orchestrator = Arc::new(SeekOrchestrator::new());

    let o = Arc::clone(&orchestrator);
    let el = Arc::clone(&element);
    let v = video.clone();
    let handle = thread::spawn(move || o.dispatch(el.as_ref(), &v, &config, 50));

    thread::sleep(Duration::from_millis(30));
    orchestrator.cancel_in_flight();

    let outcome = handle.join().unwrap();
    assert_eq!(outcome, ConvergenceOutcome::Cancelled);
}

#[test]
fn scenario_d_sidecar_loading_stalls_until_ready() {
    use reelsync_core::sidecar::{AudioPlayMode, SidecarStatus};
    use reelsync_engine::fabric::event_channel;
    use reelsync_engine::sidecar_rt::SidecarManager;

    let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
    let loader = MockLoader::gated(video_23_976(), gate_rx);
    let (publisher, sub) = event_channel::<ControllerEvent>();
    let manager = SidecarManager::new(AudioPlayMode::Single, loader, publisher);

    let track = OmpAudioTrack {
        id: Uuid::new_v4(),
        label: "commentary".into(),
        language: None,
        src: Some("https://host/a.mp3".into()),
        embedded: false,
        active: false,
        channel_count: None,
    };
    let id = manager.add(track);
    manager.activate(id).unwrap();
    assert!(manager.state().lock().any_active_loading());
    assert!(matches!(sub.recv(), Some(ControllerEvent::AudioTracksChanged)));

    gate_tx.send(()).unwrap();

    let event = sub.recv();
    match event {
        Some(ControllerEvent::SidecarStatusChanged { id: eid, status }) => {
            assert_eq!(eid, id);
            assert_eq!(status, SidecarStatus::Ready);
        }
        other => panic!("expected SidecarStatusChanged(Ready), got {other:?}"),
    }
    assert!(!manager.state().lock().any_active_loading());
}

#[test]
fn scenario_e_solo_silences_other_inputs() {
    use reelsync_core::router::{EffectsGraphDef, EffectsSlot};

    let (factory, silenced) = MockAudioGraphFactory::new();
    let element = MockMediaElement::new(10.0);
    let controller = make_controller_with_factory(element, factory);
    controller.load("https://host/a.mp4").unwrap();
    controller.create_main_audio_router(2, Some(2)).unwrap();

    let sub = controller.subscribe();
    controller.toggle_solo(0).unwrap();
    assert!(wait_for(&sub, Duration::from_secs(1), |e| matches!(e, ControllerEvent::SoloChanged)).is_some());

    let mut calls = silenced.lock().clone();
    calls.sort_by_key(|(i, _)| *i);
    assert_eq!(calls, vec![(0, false), (1, true)]);

    let def = EffectsGraphDef { id: Uuid::new_v4(), description: "noise-gate".into() };
    assert!(controller.set_effects_graph(EffectsSlot::Router, def).is_ok());
}

#[test]
fn playback_rate_clamps_instead_of_erroring() {
    let element = MockMediaElement::new(10.0);
    let controller = make_controller(Arc::clone(&element));
    controller.load("https://host/a.mp4").unwrap();

    controller.set_playback_rate(0.001).unwrap();
    controller.set_playback_rate(1000.0).unwrap();
    controller.set_playback_rate(2.0).unwrap();

    assert_eq!(*element.rate_calls.lock(), vec![0.1, 16.0, 2.0]);
    assert!(controller.set_playback_rate(f64::NAN).is_err());
}

#[test]
fn seek_convergence_publishes_exactly_one_seeked_event() {
    let element = MockMediaElement::new(10.0);
    let controller = make_controller(Arc::clone(&element));
    controller.load("https://host/a.mp4").unwrap();

    let sub = controller.subscribe();
    controller.seek_to_frame(50).unwrap();

    // Drain every event delivered within the window; exactly one `Seeked`
    // should appear even though the element fires one per internal re-seek.
    let mut seeked_count = 0;
    let deadline = Instant::now() + Duration::from_millis(500);
    while Instant::now() < deadline {
        if let Some(ControllerEvent::Seeked { .. }) = sub.try_recv() {
            seeked_count += 1;
        } else {
            thread::sleep(Duration::from_millis(5));
        }
    }
    assert_eq!(seeked_count, 1, "frame-sync convergence must publish exactly one public Seeked event");
}

#[test]
fn single_mode_sidecar_activation_mutes_and_deactivation_restores() {
    let element = MockMediaElement::new(10.0);
    let controller = make_controller(Arc::clone(&element));
    controller.load("https://host/a.mp4").unwrap();

    let sub = controller.subscribe();
    let track = OmpAudioTrack {
        id: Uuid::new_v4(),
        label: "commentary".into(),
        language: None,
        src: Some("https://host/a.mp3".into()),
        embedded: false,
        active: false,
        channel_count: None,
    };
    let id = controller.add_sidecar_track(track);
    let ready = wait_for(&sub, Duration::from_secs(1), |e| matches!(e, ControllerEvent::SidecarStatusChanged { .. }));
    assert!(ready.is_some(), "expected the sidecar probe to resolve");

    controller.activate_sidecar(id).unwrap();
    assert_eq!(*element.mute_calls.lock(), vec![true]);

    controller.deactivate_sidecar(id).unwrap();
    assert_eq!(*element.mute_calls.lock(), vec![true, false]);
}
