// crates/reelsync-core/src/sidecar.rs
//
// C7 — Sidecar Audio Manager: bookkeeping for externally-loaded (non-embedded)
// `OmpAudioTrack`s. `single` mode mirrors how a main video's embedded track
// behaves — exactly one sidecar audible at a time; `multiple` lets every
// `active` sidecar play concurrently (e.g. a mix of VO + music sidecars).
// Actually pulling bytes over the network and feeding a decoder is the
// loader's job (C10) — this module only tracks per-sidecar load status so
// the frame-sync engine (C3) knows whether a sidecar that's still buffering
// should stall the main video (§8 scenario D).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AudioFailure, PlayerError};
use crate::media::OmpAudioTrack;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioPlayMode {
    /// At most one sidecar active; activating a new one deactivates the rest.
    Single,
    /// Any number of sidecars may be active simultaneously.
    Multiple,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SidecarStatus {
    Loading,
    Ready,
    Error(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SidecarEntry {
    pub track: OmpAudioTrack,
    pub status: SidecarStatus,
    pub active: bool,
    pub volume: f32,
    pub muted: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SidecarAudioState {
    entries: HashMap<Uuid, SidecarEntry>,
    play_mode: AudioPlayMode,
}

impl Default for AudioPlayMode {
    fn default() -> Self {
        AudioPlayMode::Single
    }
}

impl SidecarAudioState {
    pub fn new(play_mode: AudioPlayMode) -> Self {
        Self { entries: HashMap::new(), play_mode }
    }

    pub fn play_mode(&self) -> AudioPlayMode {
        self.play_mode
    }

    pub fn set_play_mode(&mut self, mode: AudioPlayMode) {
        self.play_mode = mode;
    }

    /// Registers a sidecar in `Loading` status; it becomes audible only once
    /// `mark_ready` runs and an activation follows.
    pub fn add(&mut self, track: OmpAudioTrack) -> Uuid {
        let id = track.id;
        self.entries.insert(
            id,
            SidecarEntry { track, status: SidecarStatus::Loading, active: false, volume: 1.0, muted: false },
        );
        id
    }

    pub fn remove(&mut self, id: Uuid) -> Option<SidecarEntry> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&SidecarEntry> {
        self.entries.get(&id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &SidecarEntry> {
        self.entries.values()
    }

    pub fn set_volume(&mut self, id: Uuid, volume: f32) -> Result<(), PlayerError> {
        let entry = self.entries.get_mut(&id).ok_or(AudioFailure::SidecarNotFound(id))?;
        entry.volume = volume;
        Ok(())
    }

    pub fn set_muted(&mut self, id: Uuid, muted: bool) -> Result<(), PlayerError> {
        let entry = self.entries.get_mut(&id).ok_or(AudioFailure::SidecarNotFound(id))?;
        entry.muted = muted;
        Ok(())
    }

    pub fn mark_ready(&mut self, id: Uuid) -> Result<(), PlayerError> {
        let entry = self.entries.get_mut(&id).ok_or(AudioFailure::SidecarNotFound(id))?;
        entry.status = SidecarStatus::Ready;
        Ok(())
    }

    pub fn mark_error(&mut self, id: Uuid, message: impl Into<String>) -> Result<(), PlayerError> {
        let entry = self.entries.get_mut(&id).ok_or(AudioFailure::SidecarNotFound(id))?;
        entry.status = SidecarStatus::Error(message.into());
        entry.active = false;
        Ok(())
    }

    /// Activates `id`. In `Single` mode every other sidecar is deactivated
    /// first so only one is ever audible.
    pub fn activate(&mut self, id: Uuid) -> Result<(), PlayerError> {
        if !self.entries.contains_key(&id) {
            return Err(AudioFailure::SidecarNotFound(id).into());
        }
        if self.play_mode == AudioPlayMode::Single {
            for (other, entry) in self.entries.iter_mut() {
                entry.active = *other == id;
            }
        } else {
            self.entries.get_mut(&id).unwrap().active = true;
        }
        Ok(())
    }

    pub fn deactivate(&mut self, id: Uuid) -> Result<(), PlayerError> {
        let entry = self.entries.get_mut(&id).ok_or(AudioFailure::SidecarNotFound(id))?;
        entry.active = false;
        Ok(())
    }

    pub fn active_ids(&self) -> Vec<Uuid> {
        self.entries.iter().filter(|(_, e)| e.active).map(|(id, _)| *id).collect()
    }

    /// True while any *active* sidecar is still `Loading` — the frame-sync
    /// engine holds the main video in `waiting_synced_media` until this
    /// clears (§8 scenario D).
    pub fn any_active_loading(&self) -> bool {
        self.entries.values().any(|e| e.active && e.status == SidecarStatus::Loading)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(label: &str) -> OmpAudioTrack {
        OmpAudioTrack {
            id: Uuid::new_v4(),
            label: label.into(),
            language: None,
            src: Some("https://example.com/a.aac".into()),
            embedded: false,
            active: false,
            channel_count: Some(2),
        }
    }

    #[test]
    fn single_mode_activation_deactivates_others() {
        let mut s = SidecarAudioState::new(AudioPlayMode::Single);
        let a = s.add(track("vo"));
        let b = s.add(track("music"));
        s.mark_ready(a).unwrap();
        s.mark_ready(b).unwrap();

        s.activate(a).unwrap();
        assert_eq!(s.active_ids(), vec![a]);

        s.activate(b).unwrap();
        assert_eq!(s.active_ids(), vec![b]);
    }

    #[test]
    fn multiple_mode_allows_concurrent_activation() {
        let mut s = SidecarAudioState::new(AudioPlayMode::Multiple);
        let a = s.add(track("vo"));
        let b = s.add(track("music"));
        s.mark_ready(a).unwrap();
        s.mark_ready(b).unwrap();
        s.activate(a).unwrap();
        s.activate(b).unwrap();

        let mut ids = s.active_ids();
        ids.sort();
        let mut expect = vec![a, b];
        expect.sort();
        assert_eq!(ids, expect);
    }

    #[test]
    fn active_loading_sidecar_reports_stall() {
        let mut s = SidecarAudioState::new(AudioPlayMode::Single);
        let a = s.add(track("vo"));
        s.activate(a).unwrap();
        assert!(s.any_active_loading());
        s.mark_ready(a).unwrap();
        assert!(!s.any_active_loading());
    }

    #[test]
    fn error_clears_active_flag() {
        let mut s = SidecarAudioState::new(AudioPlayMode::Single);
        let a = s.add(track("vo"));
        s.activate(a).unwrap();
        s.mark_error(a, "network error").unwrap();
        assert!(s.active_ids().is_empty());
    }

    #[test]
    fn volume_and_mute_are_tracked_per_sidecar() {
        let mut s = SidecarAudioState::new(AudioPlayMode::Multiple);
        let a = s.add(track("vo"));
        s.set_volume(a, 0.5).unwrap();
        s.set_muted(a, true).unwrap();
        let entry = s.get(a).unwrap();
        assert_eq!(entry.volume, 0.5);
        assert!(entry.muted);
    }

    #[test]
    fn unknown_sidecar_is_an_error() {
        let mut s = SidecarAudioState::new(AudioPlayMode::Single);
        let err = s.activate(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, PlayerError::AudioFailure(AudioFailure::SidecarNotFound(_))));
    }
}
