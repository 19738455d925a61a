// crates/reelsync-engine/src/subtitles_rt.rs
//
// C8 runtime half: a thin `Mutex`-guarded wrapper over
// `reelsync_core::subtitles::SubtitlesState` that republishes every mutation
// as a `ControllerEvent`. No background work is needed here — cue parsing
// and rendering are both Non-goals, so registering a track is just
// bookkeeping plus the default-track auto-show rule the core model already
// implements.

use parking_lot::Mutex;
use uuid::Uuid;

use reelsync_core::events::ControllerEvent;
use reelsync_core::media::SubtitlesVttTrack;
use reelsync_core::subtitles::SubtitlesState;

use crate::fabric::EventPublisher;

pub struct SubtitlesManager {
    state: Mutex<SubtitlesState>,
    publisher: EventPublisher<ControllerEvent>,
}

impl SubtitlesManager {
    pub fn new(publisher: EventPublisher<ControllerEvent>) -> Self {
        Self { state: Mutex::new(SubtitlesState::new()), publisher }
    }

    pub fn add(&self, track: SubtitlesVttTrack) -> Uuid {
        let id = self.state.lock().add(track);
        self.publisher.publish(ControllerEvent::SubtitlesTracksChanged);
        id
    }

    pub fn remove(&self, id: Uuid) {
        self.state.lock().remove(id);
        self.publisher.publish(ControllerEvent::SubtitlesTracksChanged);
    }

    pub fn remove_all(&self) {
        self.state.lock().remove_all();
        self.publisher.publish(ControllerEvent::SubtitlesTracksChanged);
    }

    pub fn show(&self, id: Uuid) {
        self.state.lock().show(id);
        self.publisher.publish(ControllerEvent::SubtitlesTracksChanged);
    }

    pub fn hide(&self, id: Uuid) {
        self.state.lock().hide(id);
        self.publisher.publish(ControllerEvent::SubtitlesTracksChanged);
    }

    pub fn shown(&self) -> Option<SubtitlesVttTrack> {
        self.state.lock().shown().cloned()
    }

    pub fn tracks(&self) -> Vec<SubtitlesVttTrack> {
        self.state.lock().tracks().cloned().collect()
    }
}
