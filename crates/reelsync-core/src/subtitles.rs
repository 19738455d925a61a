// crates/reelsync-core/src/subtitles.rs
//
// C8 — Subtitles Manager: registry of `SubtitlesVttTrack`s plus the single
// currently-shown track, if any. Parsing/rendering the actual cues is out of
// scope (the surrounding UI owns a `<track>`-like element); this only tracks
// which track is registered and which one is visible, including the
// default-track auto-show rule.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media::SubtitlesVttTrack;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubtitlesState {
    tracks: HashMap<Uuid, SubtitlesVttTrack>,
    shown: Option<Uuid>,
}

impl SubtitlesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `track`. If it's marked `default`, it is shown immediately,
    /// demoting whatever was previously shown — including a track shown by
    /// this same rule or by an explicit `show()` (§4.8: the last `default`
    /// track registered wins).
    pub fn add(&mut self, mut track: SubtitlesVttTrack) -> Uuid {
        let id = track.id;
        if track.default {
            if let Some(prev) = self.shown.take() {
                if let Some(prev_track) = self.tracks.get_mut(&prev) {
                    prev_track.hidden = true;
                }
            }
            track.hidden = false;
            self.tracks.insert(id, track);
            self.shown = Some(id);
        } else {
            track.hidden = true;
            self.tracks.insert(id, track);
        }
        id
    }

    pub fn remove(&mut self, id: Uuid) -> Option<SubtitlesVttTrack> {
        if self.shown == Some(id) {
            self.shown = None;
        }
        self.tracks.remove(&id)
    }

    /// Idempotent: clearing an already-empty registry is a no-op.
    pub fn remove_all(&mut self) {
        self.tracks.clear();
        self.shown = None;
    }

    pub fn get(&self, id: Uuid) -> Option<&SubtitlesVttTrack> {
        self.tracks.get(&id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &SubtitlesVttTrack> {
        self.tracks.values()
    }

    pub fn shown(&self) -> Option<&SubtitlesVttTrack> {
        self.shown.and_then(|id| self.tracks.get(&id))
    }

    /// Showing an unknown id is a no-op (caller surfaces this, if at all, as
    /// a no-op rather than an error — subtitle visibility is advisory).
    pub fn show(&mut self, id: Uuid) {
        if !self.tracks.contains_key(&id) {
            return;
        }
        if let Some(prev) = self.shown {
            if let Some(prev_track) = self.tracks.get_mut(&prev) {
                prev_track.hidden = true;
            }
        }
        if let Some(track) = self.tracks.get_mut(&id) {
            track.hidden = false;
        }
        self.shown = Some(id);
    }

    /// Hiding a track that isn't currently shown is a no-op.
    pub fn hide(&mut self, id: Uuid) {
        if self.shown != Some(id) {
            return;
        }
        if let Some(track) = self.tracks.get_mut(&id) {
            track.hidden = true;
        }
        self.shown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(label: &str, default: bool) -> SubtitlesVttTrack {
        SubtitlesVttTrack {
            id: Uuid::new_v4(),
            label: label.into(),
            language: "en".into(),
            url: "https://example.com/a.vtt".into(),
            default,
            hidden: true,
        }
    }

    #[test]
    fn default_track_auto_shows_when_registry_empty() {
        let mut s = SubtitlesState::new();
        let id = s.add(track("English", true));
        assert_eq!(s.shown().unwrap().id, id);
        assert!(!s.shown().unwrap().hidden);
    }

    #[test]
    fn second_default_demotes_first() {
        let mut s = SubtitlesState::new();
        let first = s.add(track("English", true));
        let second = s.add(track("French", true));
        assert_eq!(s.shown().unwrap().id, second);
        assert!(s.get(first).unwrap().hidden);
    }

    #[test]
    fn show_demotes_previous() {
        let mut s = SubtitlesState::new();
        let a = s.add(track("English", false));
        let b = s.add(track("French", false));
        s.show(a);
        assert_eq!(s.shown().unwrap().id, a);
        s.show(b);
        assert_eq!(s.shown().unwrap().id, b);
        assert!(s.get(a).unwrap().hidden);
    }

    #[test]
    fn hide_only_affects_currently_shown() {
        let mut s = SubtitlesState::new();
        let a = s.add(track("English", false));
        let b = s.add(track("French", false));
        s.show(a);
        s.hide(b); // no-op, b isn't shown
        assert_eq!(s.shown().unwrap().id, a);
        s.hide(a);
        assert!(s.shown().is_none());
    }

    #[test]
    fn remove_all_is_idempotent() {
        let mut s = SubtitlesState::new();
        s.remove_all();
        s.add(track("English", true));
        s.remove_all();
        s.remove_all();
        assert!(s.shown().is_none());
    }

    #[test]
    fn remove_shown_track_clears_shown() {
        let mut s = SubtitlesState::new();
        let a = s.add(track("English", true));
        s.remove(a);
        assert!(s.shown().is_none());
    }
}
