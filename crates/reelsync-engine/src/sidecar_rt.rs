// crates/reelsync-engine/src/sidecar_rt.rs
//
// C7 runtime half: wraps `reelsync_core::sidecar::SidecarAudioState` with the
// background fetch that resolves a newly-added sidecar from `Loading` to
// `Ready`/`Error`, and republishes every mutation as a `ControllerEvent`.
// One thread per add, same fire-and-forget shape as the teacher's probe
// threads in `worker.rs` (bounded by nothing here since sidecar adds are rare
// compared to probe-on-import).

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{info_span, warn};
use uuid::Uuid;

use reelsync_core::error::PlayerResult;
use reelsync_core::events::ControllerEvent;
use reelsync_core::media::OmpAudioTrack;
use reelsync_core::sidecar::{AudioPlayMode, SidecarAudioState};

use crate::collaborator::Loader;
use crate::fabric::EventPublisher;

pub struct SidecarManager {
    state: Arc<Mutex<SidecarAudioState>>,
    loader: Arc<dyn Loader>,
    publisher: EventPublisher<ControllerEvent>,
}

impl SidecarManager {
    pub fn new(play_mode: AudioPlayMode, loader: Arc<dyn Loader>, publisher: EventPublisher<ControllerEvent>) -> Self {
        Self { state: Arc::new(Mutex::new(SidecarAudioState::new(play_mode))), loader, publisher }
    }

    pub fn state(&self) -> Arc<Mutex<SidecarAudioState>> {
        Arc::clone(&self.state)
    }

    /// Registers `track` and kicks off a background probe; the sidecar
    /// transitions to `Ready`/`Error` once the loader resolves its URL.
    pub fn add(&self, track: OmpAudioTrack) -> Uuid {
        let url = track.src.clone().unwrap_or_default();
        let id = self.state.lock().add(track);

        let state = Arc::clone(&self.state);
        let loader = Arc::clone(&self.loader);
        let publisher = self.publisher.clone();

        thread::spawn(move || {
            let span = info_span!("sidecar_load", sidecar_id = %id);
            let _enter = span.enter();
            let result = loader.load(&url);

            let mut s = state.lock();
            match result {
                Ok(_) => {
                    if s.mark_ready(id).is_ok() {
                        publisher.publish(ControllerEvent::SidecarStatusChanged {
                            id,
                            status: reelsync_core::sidecar::SidecarStatus::Ready,
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, "sidecar load failed");
                    let message = e.to_string();
                    if s.mark_error(id, message.clone()).is_ok() {
                        publisher.publish(ControllerEvent::SidecarStatusChanged {
                            id,
                            status: reelsync_core::sidecar::SidecarStatus::Error(message),
                        });
                    }
                }
            }
        });

        id
    }

    pub fn remove(&self, id: Uuid) -> PlayerResult<()> {
        self.state.lock().remove(id);
        self.publisher.publish(ControllerEvent::AudioTracksChanged);
        Ok(())
    }

    pub fn activate(&self, id: Uuid) -> PlayerResult<()> {
        self.state.lock().activate(id)?;
        self.publisher.publish(ControllerEvent::AudioTracksChanged);
        Ok(())
    }

    pub fn deactivate(&self, id: Uuid) -> PlayerResult<()> {
        self.state.lock().deactivate(id)?;
        self.publisher.publish(ControllerEvent::AudioTracksChanged);
        Ok(())
    }

    pub fn tracks(&self) -> Vec<OmpAudioTrack> {
        self.state.lock().entries().map(|e| e.track.clone()).collect()
    }

    pub fn active_track(&self) -> Option<OmpAudioTrack> {
        self.state.lock().entries().find(|e| e.active).map(|e| e.track.clone())
    }

    pub fn set_volume(&self, id: Uuid, volume: f32) -> PlayerResult<()> {
        self.state.lock().set_volume(id, volume)?;
        self.publisher.publish(ControllerEvent::AudioTracksChanged);
        Ok(())
    }

    pub fn set_muted(&self, id: Uuid, muted: bool) -> PlayerResult<()> {
        self.state.lock().set_muted(id, muted)?;
        self.publisher.publish(ControllerEvent::AudioTracksChanged);
        Ok(())
    }
}
