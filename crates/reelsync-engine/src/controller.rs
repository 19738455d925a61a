// crates/reelsync-engine/src/controller.rs
//
// `VideoController` — the public API surface from §6, owning every other
// component. One background "event pump" thread translates raw
// `MediaElementEvent`s into state-machine commands and fans the resulting
// `ControllerEvent`s out through the event fabric; every public method here
// is a thin, validated wrapper that either talks to the element directly or
// hands off to one of the C3–C10 components.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, info_span};
use uuid::Uuid;

use reelsync_core::error::{AudioFailure, InvalidInput, PlayerResult, StateViolation};
use reelsync_core::events::{ControllerEvent, EventKind, EventSource};
use reelsync_core::media::{OmpAudioTrack, SubtitlesVttTrack, Video};
use reelsync_core::rational::Rational;
use reelsync_core::router::{self, AudioRouterState, EffectsGraphDef, EffectsSlot, PeakValues};
use reelsync_core::sidecar::AudioPlayMode;
use reelsync_core::state::{reduce, PlaybackCommand, PlaybackState, ReduceGuards, StateDelta};
use reelsync_core::timecode::TimecodeObject;

use crate::breaker::BreakerSlot;
use crate::collaborator::{AudioGraphFactory, AudioGraphHandle, Loader, MediaElement, MediaElementEvent};
use crate::config::PlayerConfig;
use crate::fabric::{EventFabric, VideoControllerLike};
use crate::frame_sync::ConvergenceOutcome;
use crate::loader::LoaderDispatch;
use crate::seek::{SeekOrchestrator, SeekTarget};
use crate::sidecar_rt::SidecarManager;
use crate::subtitles_rt::SubtitlesManager;
use crate::tick::StallWatchdog;

pub struct VideoController {
    element: Arc<dyn MediaElement>,
    config: PlayerConfig,
    video: Mutex<Option<Video>>,
    state: Mutex<PlaybackState>,
    seek: SeekOrchestrator,
    load_breaker: BreakerSlot,
    audio_factory: Arc<dyn AudioGraphFactory>,
    router_state: Mutex<Option<AudioRouterState>>,
    router_handle: Mutex<Option<Box<dyn AudioGraphHandle>>>,
    sidecars: Arc<SidecarManager>,
    subtitles: Arc<SubtitlesManager>,
    loader: LoaderDispatch,
    fabric: Arc<EventFabric<ControllerEvent>>,
    is_playing: Arc<AtomicBool>,
    watchdog: Mutex<Option<StallWatchdog>>,
    pump_shutdown: Arc<AtomicBool>,
    pump: Mutex<Option<JoinHandle<()>>>,
    destroyed: AtomicBool,
    /// Count of convergence operations (seeks, the `seek_to_end` dance)
    /// currently in flight — while nonzero the event pump suppresses the raw
    /// `Seeked` events it observes instead of republishing each one (§4.4
    /// step 5): the dispatching thread publishes the single public `Seeked`
    /// event once convergence actually concludes.
    seek_converging: Arc<AtomicU32>,
    /// Set while main playback was auto-paused for `waiting_synced_media`
    /// (§8 scenario D), so the matching auto-resume only fires if *we*
    /// paused it — not if the user paused separately in the meantime.
    sync_auto_paused: AtomicBool,
    volume: Mutex<f32>,
    muted: Mutex<bool>,
    fullscreen: AtomicBool,
    safe_zones: Mutex<HashSet<Uuid>>,
    help_menu_groups: Mutex<Vec<String>>,
    active_event_streams: Mutex<Vec<EventKind>>,
    thumbnail_vtt_url: Mutex<Option<String>>,
}

impl VideoController {
    pub fn new(
        element: Arc<dyn MediaElement>,
        audio_factory: Arc<dyn AudioGraphFactory>,
        native_loader: Arc<dyn Loader>,
        segmented_loader: Arc<dyn Loader>,
        sidecar_loader: Arc<dyn Loader>,
        config: PlayerConfig,
    ) -> Arc<Self> {
        let fabric = Arc::new(EventFabric::new());
        let sidecars = Arc::new(SidecarManager::new(AudioPlayMode::Single, sidecar_loader, publisher_for(&fabric)));
        let subtitles = Arc::new(SubtitlesManager::new(publisher_for(&fabric)));
        let loader = LoaderDispatch::new(native_loader, segmented_loader, Duration::from_secs(30));

        let controller = Arc::new(Self {
            element,
            config,
            video: Mutex::new(None),
            state: Mutex::new(PlaybackState::idle()),
            seek: SeekOrchestrator::new(),
            load_breaker: BreakerSlot::new(),
            audio_factory,
            router_state: Mutex::new(None),
            router_handle: Mutex::new(None),
            sidecars,
            subtitles,
            loader,
            fabric,
            is_playing: Arc::new(AtomicBool::new(false)),
            watchdog: Mutex::new(None),
            pump_shutdown: Arc::new(AtomicBool::new(false)),
            pump: Mutex::new(None),
            destroyed: AtomicBool::new(false),
            seek_converging: Arc::new(AtomicU32::new(0)),
            sync_auto_paused: AtomicBool::new(false),
            volume: Mutex::new(1.0),
            muted: Mutex::new(false),
            fullscreen: AtomicBool::new(false),
            safe_zones: Mutex::new(HashSet::new()),
            help_menu_groups: Mutex::new(Vec::new()),
            active_event_streams: Mutex::new(Vec::new()),
            thumbnail_vtt_url: Mutex::new(None),
        });

        controller.spawn_pump();
        controller.spawn_watchdog();
        controller
    }

    fn guards(&self) -> ReduceGuards {
        ReduceGuards { video_loaded: self.video.lock().is_some() }
    }

    fn apply(&self, cmd: PlaybackCommand) {
        let mut state = self.state.lock();
        let (next, deltas) = reduce(*state, cmd, self.guards());
        *state = next;
        drop(state);
        for delta in deltas {
            match delta {
                StateDelta::StateChanged(s) => self.fabric.publish(ControllerEvent::StateChanged(s)),
                StateDelta::Paused => self.fabric.publish(ControllerEvent::Paused),
                StateDelta::Ended => self.fabric.publish(ControllerEvent::Ended),
            }
        }
    }

    fn spawn_watchdog(self: &Arc<Self>) {
        let w = StallWatchdog::spawn(
            Arc::clone(&self.element),
            self.sidecars.state(),
            Arc::clone(&self.is_playing),
            self.config,
            tick_publisher(self),
        );
        *self.watchdog.lock() = Some(w);
    }

    fn spawn_pump(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        let shutdown = Arc::clone(&self.pump_shutdown);
        let events = self.element.events();

        let handle = thread::spawn(move || {
            let span = info_span!("event_pump");
            let _enter = span.enter();
            let mut pending_pause_sync = false;

            while !shutdown.load(Ordering::Relaxed) {
                let event = match events.recv_timeout(Duration::from_millis(500)) {
                    Ok(e) => e,
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                };

                match event {
                    MediaElementEvent::Playing => {
                        controller.apply(PlaybackCommand::ElementPlaying);
                        controller.is_playing.store(true, Ordering::Relaxed);
                    }
                    MediaElementEvent::Paused => {
                        let pausing = controller.state.lock().pausing;
                        if pausing && !pending_pause_sync {
                            pending_pause_sync = true;
                            controller.nudge_pause_sync();
                        }
                    }
                    MediaElementEvent::Seeking => {
                        controller.apply(PlaybackCommand::SeekStarted);
                    }
                    MediaElementEvent::Seeked => {
                        if pending_pause_sync {
                            pending_pause_sync = false;
                            controller.apply(PlaybackCommand::PauseSyncComplete);
                            controller.is_playing.store(false, Ordering::Relaxed);
                        } else if controller.seek_converging.load(Ordering::Relaxed) > 0 {
                            // Intermediate re-seek during frame-sync convergence
                            // (§4.3/§4.4) — the dispatching thread publishes the
                            // one public `Seeked` event once convergence
                            // actually finishes, not the pump.
                        } else {
                            controller.apply(PlaybackCommand::ElementSeeked);
                            controller.fabric.publish(ControllerEvent::Seeked { time: controller.element.current_time() });
                        }
                    }
                    MediaElementEvent::Ended => {
                        controller.apply(PlaybackCommand::Ended);
                        controller.is_playing.store(false, Ordering::Relaxed);
                    }
                    MediaElementEvent::Waiting => controller.apply(PlaybackCommand::SetWaiting(true)),
                    MediaElementEvent::CanPlay => controller.apply(PlaybackCommand::SetWaiting(false)),
                    MediaElementEvent::TimeUpdate { time } => {
                        controller.fabric.publish(ControllerEvent::TimeUpdate { time });
                        if let Some(video) = controller.video.lock().as_ref() {
                            let frame = video.frame_rate_context().time_to_frame(time);
                            controller.fabric.publish(ControllerEvent::FrameUpdate { frame });
                        }
                    }
                    MediaElementEvent::DurationChange { duration } => {
                        if let Some(video) = controller.video.lock().as_mut() {
                            video.corrected_duration = Some(duration);
                        }
                        controller.fabric.publish(ControllerEvent::DurationChange { duration });
                    }
                    MediaElementEvent::RateChange { rate } => {
                        controller.fabric.publish(ControllerEvent::RateChange { rate });
                    }
                    MediaElementEvent::VolumeChange { volume } => {
                        controller.fabric.publish(ControllerEvent::VolumeChange { volume });
                    }
                    MediaElementEvent::Error { message } => {
                        controller.fabric.publish(ControllerEvent::Error(
                            reelsync_core::error::LoaderFailure::LoadFailed { message }.into(),
                        ));
                    }
                }
            }
        });

        *self.pump.lock() = Some(handle);
    }

    /// §4.4 pause-sync forward step: after the element reports PAUSE, nudge
    /// forward by exactly one frame so the settled position always lands on
    /// a frame boundary rather than wherever the platform's pause happened
    /// to land mid-frame; the small forward overshoot this introduces is the
    /// accepted tradeoff (kept rather than a zero-frame step, since a
    /// zero-frame step can settle a fraction of a frame short and read back
    /// as the *previous* frame).
    fn nudge_pause_sync(&self) {
        let Some(video) = self.video.lock().clone() else {
            self.apply(PlaybackCommand::PauseSyncComplete);
            return;
        };
        let ctx = video.frame_rate_context();
        let current_frame = ctx.time_to_frame(self.element.current_time());
        let target = (current_frame + 1).min(video.total_frames.saturating_sub(1));
        let _ = self.element.seek(ctx.frame_to_time(target));
    }

    // ── Loading ────────────────────────────────────────────────────────────

    pub fn load(self: &Arc<Self>, url: &str) -> PlayerResult<()> {
        let breaker = self.load_breaker.supersede();
        let span = info_span!("load_video", url);
        let _enter = span.enter();

        let loaded = self.loader.load(url)?;
        if breaker.is_tripped() {
            return Ok(());
        }

        *self.video.lock() = Some(loaded.video.clone());
        *self.state.lock() = PlaybackState::idle();
        info!(url, duration = loaded.video.duration, "video loaded");
        self.fabric.publish(ControllerEvent::DurationChange { duration: loaded.video.duration });
        Ok(())
    }

    pub fn video(&self) -> Option<Video> {
        self.video.lock().clone()
    }

    pub fn playback_state(&self) -> PlaybackState {
        *self.state.lock()
    }

    pub fn subscribe(&self) -> crate::fabric::EventSubscriber<ControllerEvent> {
        self.fabric.subscribe()
    }

    // ── Transport ──────────────────────────────────────────────────────────

    pub fn play(&self) -> PlayerResult<()> {
        self.require_loaded()?;
        self.element.play()
    }

    pub fn pause(&self) -> PlayerResult<()> {
        self.require_loaded()?;
        self.apply(PlaybackCommand::PauseRequested);
        self.element.pause()
    }

    fn require_loaded(&self) -> PlayerResult<Video> {
        self.video.lock().clone().ok_or_else(|| StateViolation::VideoNotLoaded.into())
    }

    pub fn seek_to_time(self: &Arc<Self>, time: f64) -> PlayerResult<()> {
        let video = self.require_loaded()?;
        let frame = self.seek.resolve_time(&video, time)?;
        self.dispatch_seek(video, frame);
        Ok(())
    }

    pub fn seek_to_timecode(self: &Arc<Self>, tc: &TimecodeObject) -> PlayerResult<()> {
        let video = self.require_loaded()?;
        let frame = self.seek.resolve_timecode(&video, tc)?;
        self.dispatch_seek(video, frame);
        Ok(())
    }

    pub fn seek_to_frame(self: &Arc<Self>, frame: u64) -> PlayerResult<()> {
        let video = self.require_loaded()?;
        let resolved = self.seek.resolve(&video, frame, SeekTarget::Frame(frame));
        self.dispatch_seek(video, resolved);
        Ok(())
    }

    pub fn seek_forward_frames(self: &Arc<Self>, count: u32) -> PlayerResult<()> {
        self.seek_relative(count as i64)
    }

    pub fn seek_backward_frames(self: &Arc<Self>, count: u32) -> PlayerResult<()> {
        self.seek_relative(-(count as i64))
    }

    fn seek_relative(self: &Arc<Self>, delta: i64) -> PlayerResult<()> {
        let video = self.require_loaded()?;
        let current = video.frame_rate_context().time_to_frame(self.element.current_time());
        let resolved = self.seek.resolve(&video, current, SeekTarget::RelativeFrames(delta));
        self.dispatch_seek(video, resolved);
        Ok(())
    }

    /// §4.4 end-of-stream dance: seek to the best-known duration, then to
    /// `duration - 0.1 * frameDuration` (just short of it), then back to
    /// duration. Many platforms won't reliably fire `ended` from a seek that
    /// lands exactly on duration; settling just short first primes the
    /// element to recognize end-of-stream on the final seek.
    pub fn seek_to_end(self: &Arc<Self>) -> PlayerResult<()> {
        let video = self.require_loaded()?;
        let controller = Arc::clone(self);
        thread::spawn(move || {
            controller.apply(PlaybackCommand::SeekStarted);
            controller.seek_converging.fetch_add(1, Ordering::Relaxed);

            let duration = video.effective_duration();
            let frame_duration = video.frame_duration().to_f64();
            let near_end = (duration - 0.1 * frame_duration).max(0.0);

            let _ = controller.element.seek(duration);
            let _ = controller.element.seek(near_end);
            let _ = controller.element.seek(duration);

            controller.seek_converging.fetch_sub(1, Ordering::Relaxed);
            controller.apply(PlaybackCommand::ElementSeeked);
            controller.fabric.publish(ControllerEvent::Seeked { time: controller.element.current_time() });
        });
        Ok(())
    }

    pub fn seek_to_percent(self: &Arc<Self>, percent: f64) -> PlayerResult<()> {
        let video = self.require_loaded()?;
        self.seek_to_time(percent.clamp(0.0, 1.0) * video.effective_duration())
    }

    fn dispatch_seek(self: &Arc<Self>, video: Video, target_frame: u64) {
        let controller = Arc::clone(self);
        thread::spawn(move || {
            controller.apply(PlaybackCommand::SeekStarted);
            controller.seek_converging.fetch_add(1, Ordering::Relaxed);
            let outcome = controller.seek.dispatch(controller.element.as_ref(), &video, &controller.config, target_frame);
            controller.seek_converging.fetch_sub(1, Ordering::Relaxed);

            match outcome {
                ConvergenceOutcome::Converged { .. } => {
                    controller.apply(PlaybackCommand::ElementSeeked);
                    controller.fabric.publish(ControllerEvent::Seeked { time: controller.element.current_time() });
                }
                ConvergenceOutcome::GaveUp { last_frame } => {
                    tracing::warn!(target_frame, last_frame, "seek did not converge within the iteration bound");
                    controller.apply(PlaybackCommand::ElementSeeked);
                    controller.fabric.publish(ControllerEvent::Seeked { time: controller.element.current_time() });
                }
                // Superseded by a newer seek; the newer dispatch publishes
                // the eventual settled `Seeked` event instead.
                ConvergenceOutcome::Cancelled => {}
            }
        });
    }

    /// §8 boundary behavior: out-of-range rates clamp rather than error
    /// (`set_playback_rate(0.05)` clamps to `playback_rate_min`, etc.).
    pub fn set_playback_rate(&self, rate: f64) -> PlayerResult<()> {
        if !rate.is_finite() {
            return Err(InvalidInput::InvalidPlaybackRate(rate).into());
        }
        let clamped = rate.clamp(self.config.playback_rate_min, self.config.playback_rate_max);
        self.element.set_playback_rate(clamped)
    }

    pub fn set_volume(&self, volume: f32) -> PlayerResult<()> {
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(InvalidInput::InvalidVolume(volume).into());
        }
        self.element.set_volume(volume)?;
        *self.volume.lock() = volume;
        Ok(())
    }

    pub fn get_volume(&self) -> f32 {
        *self.volume.lock()
    }

    pub fn set_muted(&self, muted: bool) -> PlayerResult<()> {
        self.element.set_muted(muted)?;
        *self.muted.lock() = muted;
        Ok(())
    }

    pub fn is_muted(&self) -> bool {
        *self.muted.lock()
    }

    pub fn mute(&self) -> PlayerResult<()> {
        self.set_muted(true)
    }

    pub fn unmute(&self) -> PlayerResult<()> {
        self.set_muted(false)
    }

    pub fn toggle_mute_unmute(&self) -> PlayerResult<()> {
        let next = !self.is_muted();
        self.set_muted(next)
    }

    pub fn toggle_play_pause(&self) -> PlayerResult<()> {
        if self.playback_state().playing {
            self.pause()
        } else {
            self.play()
        }
    }

    // ── Sync getters ──────────────────────────────────────────────────────

    pub fn get_current_time(&self) -> f64 {
        self.element.current_time()
    }

    pub fn get_current_frame(&self) -> Option<u64> {
        self.video.lock().as_ref().map(|v| v.frame_rate_context().time_to_frame(self.element.current_time()))
    }

    pub fn get_current_timecode(&self) -> Option<TimecodeObject> {
        self.video.lock().as_ref().map(|v| v.frame_rate_context().time_to_timecode(self.element.current_time()))
    }

    pub fn get_duration(&self) -> Option<f64> {
        self.video.lock().as_ref().map(|v| v.effective_duration())
    }

    pub fn get_total_frames(&self) -> Option<u64> {
        self.video.lock().as_ref().map(|v| v.total_frames)
    }

    pub fn get_frame_rate(&self) -> Option<Rational> {
        self.video.lock().as_ref().map(|v| v.frame_rate)
    }

    // ── Audio router (C6) ────────────────────────────────────────────────

    pub fn create_main_audio_router(&self, inputs: u16, outputs: Option<u16>) -> PlayerResult<()> {
        let hardware_max = self.audio_factory.hardware_max_outputs();
        let resolved_outputs = router::resolve_output_count(outputs, hardware_max);
        let handle = self.audio_factory.build(inputs, resolved_outputs)?;
        let state = AudioRouterState::new(inputs, resolved_outputs);
        handle.apply_connections(&state.connections())?;
        *self.router_state.lock() = Some(state);
        *self.router_handle.lock() = Some(handle);
        self.fabric.publish(ControllerEvent::RouterConnectionsChanged);
        Ok(())
    }

    pub fn update_connections(&self, cells: Vec<(u16, u16, bool)>) -> PlayerResult<()> {
        let mut guard = self.router_state.lock();
        let state = guard.as_mut().ok_or(AudioFailure::RouterNotCreated)?;
        state.update_connections(cells);
        let snapshot = state.connections();
        drop(guard);
        self.with_router_handle(|h| h.apply_connections(&snapshot))?;
        self.fabric.publish(ControllerEvent::RouterConnectionsChanged);
        Ok(())
    }

    pub fn toggle_solo(&self, input: u16) -> PlayerResult<()> {
        self.toggle_router(input, |s, i| s.toggle_solo(i), ControllerEvent::SoloChanged)
    }

    pub fn toggle_mute(&self, input: u16) -> PlayerResult<()> {
        self.toggle_router(input, |s, i| s.toggle_mute(i), ControllerEvent::MuteChanged)
    }

    fn toggle_router(&self, input: u16, op: impl FnOnce(&mut AudioRouterState, u16), event: ControllerEvent) -> PlayerResult<()> {
        let mut guard = self.router_state.lock();
        let state = guard.as_mut().ok_or(AudioFailure::RouterNotCreated)?;
        op(state, input);
        let silences: Vec<(u16, bool)> = (0..state.inputs()).map(|i| (i, state.is_silent(i))).collect();
        drop(guard);
        self.with_router_handle(|h| {
            for (i, silent) in &silences {
                h.set_input_silent(*i, *silent)?;
            }
            Ok(())
        })?;
        self.fabric.publish(event);
        Ok(())
    }

    pub fn set_effects_graph(&self, slot: EffectsSlot, def: EffectsGraphDef) -> PlayerResult<()> {
        let mut guard = self.router_state.lock();
        let state = guard.as_mut().ok_or(AudioFailure::RouterNotCreated)?;
        state.set_effects_graph(slot, def);
        Ok(())
    }

    pub fn peak_values(&self) -> PlayerResult<PeakValues> {
        self.with_router_handle(|h| Ok(h.peak_values()))
    }

    fn with_router_handle<R>(&self, f: impl FnOnce(&dyn AudioGraphHandle) -> PlayerResult<R>) -> PlayerResult<R> {
        let guard = self.router_handle.lock();
        let handle = guard.as_deref().ok_or(AudioFailure::RouterNotCreated)?;
        f(handle)
    }

    // ── Sidecar audio (C7) ───────────────────────────────────────────────

    pub fn add_sidecar_track(&self, track: OmpAudioTrack) -> Uuid {
        self.sidecars.add(track)
    }

    pub fn remove_sidecar_track(&self, id: Uuid) -> PlayerResult<()> {
        self.sidecars.remove(id)
    }

    /// §4.7: in `Single` mode, activating any sidecar deactivates main audio
    /// (and every other sidecar, already handled by `SidecarAudioState`).
    pub fn activate_sidecar(&self, id: Uuid) -> PlayerResult<()> {
        self.sidecars.activate(id)?;
        if self.sidecars.state().lock().play_mode() == AudioPlayMode::Single {
            let _ = self.element.set_muted(true);
        }
        Ok(())
    }

    /// Restores main audio once no sidecar remains active under `Single`
    /// mode (§4.7's inverse).
    pub fn deactivate_sidecar(&self, id: Uuid) -> PlayerResult<()> {
        self.sidecars.deactivate(id)?;
        let state = self.sidecars.state();
        let guard = state.lock();
        let restore_main = guard.play_mode() == AudioPlayMode::Single && guard.active_ids().is_empty();
        drop(guard);
        if restore_main {
            let _ = self.element.set_muted(false);
        }
        Ok(())
    }

    pub fn get_audio_tracks(&self) -> Vec<OmpAudioTrack> {
        self.sidecars.tracks()
    }

    pub fn get_active_audio_track(&self) -> Option<OmpAudioTrack> {
        self.sidecars.active_track()
    }

    pub fn set_active_audio_track(&self, id: Uuid) -> PlayerResult<()> {
        self.activate_sidecar(id)
    }

    pub fn set_sidecar_volume(&self, id: Uuid, volume: f32) -> PlayerResult<()> {
        self.sidecars.set_volume(id, volume)
    }

    pub fn set_sidecar_muted(&self, id: Uuid, muted: bool) -> PlayerResult<()> {
        self.sidecars.set_muted(id, muted)
    }

    // ── Subtitles (C8) ───────────────────────────────────────────────────

    pub fn add_subtitles_track(&self, track: SubtitlesVttTrack) -> Uuid {
        self.subtitles.add(track)
    }

    pub fn remove_subtitles_track(&self, id: Uuid) {
        self.subtitles.remove(id);
    }

    pub fn remove_all_subtitles_tracks(&self) {
        self.subtitles.remove_all();
    }

    pub fn show_subtitles_track(&self, id: Uuid) {
        self.subtitles.show(id);
    }

    pub fn hide_subtitles_track(&self, id: Uuid) {
        self.subtitles.hide(id);
    }

    pub fn get_subtitles_tracks(&self) -> Vec<SubtitlesVttTrack> {
        self.subtitles.tracks()
    }

    pub fn get_shown_subtitles_track(&self) -> Option<SubtitlesVttTrack> {
        self.subtitles.shown()
    }

    // ── Misc (§6 Misc, PiP, safe zones, help menu) ──────────────────────

    /// Re-loads the currently loaded video's own source URL.
    pub fn reload_video(self: &Arc<Self>) -> PlayerResult<()> {
        let video = self.require_loaded()?;
        self.load(&video.source_url)
    }

    /// Loads a synthetic blank video descriptor in place of real media —
    /// used to clear the screen without tearing down the controller.
    pub fn load_black_video(&self) -> PlayerResult<()> {
        let frame_rate = self.video.lock().as_ref().map(|v| v.frame_rate).unwrap_or(Rational::new(30, 1));
        let video = Video::new("about:black", frame_rate, false, 0.0, false)?;
        let duration = video.duration;
        *self.video.lock() = Some(video);
        *self.state.lock() = PlaybackState::idle();
        self.fabric.publish(ControllerEvent::DurationChange { duration });
        Ok(())
    }

    pub fn load_thumbnail_vtt_url(&self, url: impl Into<String>) {
        *self.thumbnail_vtt_url.lock() = Some(url.into());
    }

    pub fn get_thumbnail_vtt_url(&self) -> Option<String> {
        self.thumbnail_vtt_url.lock().clone()
    }

    /// Picture-in-picture is out of scope for this crate (§1 Non-goals) —
    /// this is the `PiPUnsupported` surface SPEC_FULL.md itself commits to
    /// providing rather than a real windowing call.
    pub fn enable_pip(&self) -> PlayerResult<()> {
        Err(StateViolation::PiPUnsupported.into())
    }

    pub fn disable_pip(&self) -> PlayerResult<()> {
        Err(StateViolation::PiPUnsupported.into())
    }

    /// Fullscreen windowing is owned by the embedder; this only tracks
    /// intent so the embedder's UI and this controller agree on state.
    pub fn toggle_fullscreen(&self) -> bool {
        let next = !self.fullscreen.load(Ordering::Relaxed);
        self.fullscreen.store(next, Ordering::Relaxed);
        next
    }

    pub fn add_safe_zone(&self, id: Uuid) {
        self.safe_zones.lock().insert(id);
    }

    pub fn remove_safe_zone(&self, id: Uuid) {
        self.safe_zones.lock().remove(&id);
    }

    pub fn clear_safe_zone(&self) {
        self.safe_zones.lock().clear();
    }

    pub fn append_help_menu_group(&self, group: impl Into<String>) {
        self.help_menu_groups.lock().push(group.into());
    }

    pub fn prepend_help_menu_group(&self, group: impl Into<String>) {
        self.help_menu_groups.lock().insert(0, group.into());
    }

    pub fn clear_help_menu_group(&self) {
        self.help_menu_groups.lock().clear();
    }

    pub fn get_help_menu_groups(&self) -> Vec<String> {
        self.help_menu_groups.lock().clone()
    }

    /// Tells the engine which event categories (§9 `EventKind`) a subscriber
    /// currently cares about, e.g. so the embedder can skip subscribing to
    /// peak-meter updates while no audio meter UI is visible.
    pub fn update_active_named_event_streams(&self, streams: Vec<EventKind>) {
        *self.active_event_streams.lock() = streams;
    }

    pub fn active_named_event_streams(&self) -> Vec<EventKind> {
        self.active_event_streams.lock().clone()
    }

    // ── Lifecycle (C11) ──────────────────────────────────────────────────

    /// Ordered teardown: stop accepting new seeks, cancel any in flight, stop
    /// the watchdog, stop the event pump, then drop the audio graph. Order
    /// matters — tearing down the audio graph before the pump stops could
    /// have the pump observe a now-dangling router handle mid-callback.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.seek.cancel_in_flight();
        self.load_breaker.trip_current();

        if let Some(w) = self.watchdog.lock().take() {
            w.stop();
        }

        self.pump_shutdown.store(true, Ordering::Relaxed);
        if let Some(h) = self.pump.lock().take() {
            let _ = h.join();
        }

        self.router_handle.lock().take();
        self.router_state.lock().take();
    }
}

impl Drop for VideoController {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl VideoControllerLike for VideoController {
    fn subscribe(&self) -> crate::fabric::EventSubscriber<ControllerEvent> {
        self.subscribe()
    }

    fn playback_state(&self) -> PlaybackState {
        self.playback_state()
    }

    fn peak_values(&self) -> PlayerResult<PeakValues> {
        self.peak_values()
    }
}

fn publisher_for(fabric: &Arc<EventFabric<ControllerEvent>>) -> crate::fabric::EventPublisher<ControllerEvent> {
    // `SidecarManager`/`SubtitlesManager` want a plain publish handle, not a
    // subscription; bridge by forwarding through a tiny relay channel into
    // the fabric's broadcast so every controller subscriber still sees these
    // events.
    let (tx, rx) = crate::fabric::event_channel::<ControllerEvent>();
    let fanout = Arc::clone(fabric);
    thread::spawn(move || {
        while let Some(event) = rx.recv() {
            fanout.publish(event);
        }
    });
    tx
}

fn tick_publisher(controller: &Arc<VideoController>) -> crate::fabric::EventPublisher<crate::tick::TickSignal> {
    let (tx, rx) = crate::fabric::event_channel::<crate::tick::TickSignal>();
    let controller = Arc::clone(controller);
    thread::spawn(move || {
        while let Some(signal) = rx.recv() {
            match signal {
                crate::tick::TickSignal::Stalled { .. } => {
                    controller.fabric.publish(ControllerEvent::Waiting { waiting: true });
                }
                crate::tick::TickSignal::WaitingSyncedMedia(w) => {
                    controller.apply(PlaybackCommand::SetWaitingSyncedMedia(w));
                    if w {
                        if controller.is_playing.load(Ordering::Relaxed) {
                            controller.sync_auto_paused.store(true, Ordering::Relaxed);
                            let _ = controller.element.pause();
                        }
                    } else if controller.sync_auto_paused.swap(false, Ordering::Relaxed) {
                        let _ = controller.element.play();
                    }
                }
            }
        }
    });
    tx
}
