// crates/reelsync-core/src/state.rs
//
// C2 — Playback State Machine, built the way §9's design notes insist on:
// "a single state type mutated only via reducer functions from a small set
// of commands; emit state deltas after the reducer returns." This removes
// the cyclic event coupling the spec calls out (state changes driving more
// state changes re-entrantly) — callers run `reduce`, get back the new
// state plus the list of deltas to publish, and publish them themselves.

use serde::{Deserialize, Serialize};

/// §3 `PlaybackState`. Invariant: at most one of `{playing, paused, ended}`
/// is true — enforced by construction, never by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub playing: bool,
    pub paused: bool,
    pub seeking: bool,
    pub waiting: bool,
    pub ended: bool,
    pub pausing: bool,
    pub waiting_synced_media: bool,
}

impl PlaybackState {
    pub fn idle() -> Self {
        Self::default()
    }

    fn with_primary(mut self, playing: bool, paused: bool, ended: bool) -> Self {
        debug_assert!([playing, paused, ended].iter().filter(|b| **b).count() <= 1);
        self.playing = playing;
        self.paused = paused;
        self.ended = ended;
        self
    }
}

/// The events/requests the reducer understands. Every transition in the
/// §4.2 table is one arm of `reduce`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// `play()` observed the element transition to PLAYING.
    ElementPlaying,
    /// Public `pause()` call — arms the pause-sync timer (`pausing = true`).
    PauseRequested,
    /// The element reported PAUSE and the pause-sync forward-step (§4.4)
    /// has completed — the public `paused` event may now fire.
    PauseSyncComplete,
    /// A seek has been dispatched; `seeking` goes up until SEEKED.
    SeekStarted,
    /// The element reported SEEKED.
    ElementSeeked,
    /// The element reported ENDED, or a seek landed at/after duration while
    /// not playing.
    Ended,
    /// A seek backward was issued from the `Ended` state.
    SeekBackwardFromEnded,
    SetWaiting(bool),
    SetWaitingSyncedMedia(bool),
}

/// A published change resulting from a reducer call. Downstream code (the
/// event fabric, C9) turns these into public events; the reducer itself
/// never touches a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateDelta {
    StateChanged(PlaybackState),
    Paused,
    Ended,
}

/// Guard context the reducer needs but does not own (§4.2 guards reference
/// "video loaded" and "not ended past duration").
#[derive(Clone, Copy, Debug)]
pub struct ReduceGuards {
    pub video_loaded: bool,
}

/// Applies one command to `state`, returning the new state and the deltas to
/// publish. Commands that violate a guard (e.g. `ElementPlaying` with no
/// video loaded) are silently no-ops — guard failures are reported by the
/// caller (the public `play()` wrapper) as a `PlayerError`, not smuggled
/// through the state machine.
pub fn reduce(state: PlaybackState, cmd: PlaybackCommand, guards: ReduceGuards) -> (PlaybackState, Vec<StateDelta>) {
    let mut next = state;
    let mut deltas = Vec::new();

    match cmd {
        PlaybackCommand::ElementPlaying => {
            if !guards.video_loaded {
                return (state, deltas);
            }
            next = next.with_primary(true, false, false);
            next.pausing = false;
        }
        PlaybackCommand::PauseRequested => {
            if next.playing {
                next.pausing = true;
            }
        }
        PlaybackCommand::PauseSyncComplete => {
            if next.pausing || next.playing {
                next = next.with_primary(false, true, false);
                next.pausing = false;
                deltas.push(StateDelta::Paused);
            }
        }
        PlaybackCommand::SeekStarted => {
            next.seeking = true;
        }
        PlaybackCommand::ElementSeeked => {
            next.seeking = false;
            next.waiting = false;
        }
        PlaybackCommand::Ended => {
            next = next.with_primary(false, false, true);
            next.pausing = false;
            deltas.push(StateDelta::Ended);
        }
        PlaybackCommand::SeekBackwardFromEnded => {
            if next.ended {
                next = next.with_primary(false, true, false);
            }
        }
        PlaybackCommand::SetWaiting(w) => {
            next.waiting = w;
        }
        PlaybackCommand::SetWaitingSyncedMedia(w) => {
            next.waiting_synced_media = w;
        }
    }

    if next != state {
        deltas.insert(0, StateDelta::StateChanged(next));
    }
    (next, deltas)
}
