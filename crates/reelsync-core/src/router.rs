// crates/reelsync-core/src/router.rs
//
// C6 — Audio Router: the pure I x O connection-matrix model, solo/mute
// discipline and the effects-insert slot bookkeeping. Building the actual
// audio graph (gain nodes, channel splitters/mergers) is a runtime concern
// (`reelsync_engine::audio_rt`); this module only owns the *decisions* —
// which cells are connected, who's soloed, what each slot's effects def is —
// so they can be unit tested without any audio hardware.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{AudioFailure, PlayerError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectsSlot {
    Source,
    Router,
    Destination,
}

/// Opaque description of a user-defined effects chain. The router only
/// stores and replaces these; constructing the underlying audio graph from
/// one is the runtime layer's job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectsGraphDef {
    pub id: uuid::Uuid,
    pub description: String,
}

/// A single sampled peak-meter reading (§4.6 "Peak processor").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakValues {
    pub peak_values_per_channel: Vec<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioRouterState {
    inputs: u16,
    outputs: u16,
    connections: BTreeSet<(u16, u16)>,
    solo: BTreeSet<u16>,
    mute: BTreeSet<u16>,
    /// Captured mute set from the moment the first input was soloed; restored
    /// when the solo set empties out again (§4.6 solo/mute semantics).
    restored_mute: Option<BTreeSet<u16>>,
    effect_slots: HashMap<EffectsSlot, EffectsGraphDef>,
}

impl AudioRouterState {
    /// `create(inputs, outputs)` — outputs is resolved by the caller (via a
    /// hardware-max resolver, §4.6) before this is constructed.
    pub fn new(inputs: u16, outputs: u16) -> Self {
        Self {
            inputs,
            outputs,
            connections: default_routing(inputs, outputs),
            solo: BTreeSet::new(),
            mute: BTreeSet::new(),
            restored_mute: None,
            effect_slots: HashMap::new(),
        }
    }

    pub fn inputs(&self) -> u16 { self.inputs }
    pub fn outputs(&self) -> u16 { self.outputs }

    /// All `(input, output, connected)` cells, connected or not — the full
    /// I x O grid (§8 invariant 6 compares this modulo ordering).
    pub fn connections(&self) -> Vec<(u16, u16, bool)> {
        let mut out = Vec::with_capacity(self.inputs as usize * self.outputs as usize);
        for i in 0..self.inputs {
            for o in 0..self.outputs {
                out.push((i, o, self.connections.contains(&(i, o))));
            }
        }
        out
    }

    pub fn is_connected(&self, input: u16, output: u16) -> bool {
        self.connections.contains(&(input, output))
    }

    pub fn update_connections(&mut self, cells: impl IntoIterator<Item = (u16, u16, bool)>) {
        for (i, o, connected) in cells {
            if i >= self.inputs || o >= self.outputs {
                continue;
            }
            if connected {
                self.connections.insert((i, o));
            } else {
                self.connections.remove(&(i, o));
            }
        }
    }

    pub fn solo_set(&self) -> &BTreeSet<u16> { &self.solo }
    pub fn mute_set(&self) -> &BTreeSet<u16> { &self.mute }

    /// Solo overrides mute: non-soloed inputs are silent whenever any input
    /// is soloed, regardless of their own mute flag. With nothing soloed,
    /// each input's mute flag applies individually.
    pub fn is_silent(&self, input: u16) -> bool {
        if !self.solo.is_empty() {
            !self.solo.contains(&input)
        } else {
            self.mute.contains(&input)
        }
    }

    /// Toggling solo while none are soloed snapshots the current mute set;
    /// the toggle that empties the solo set again restores it verbatim.
    pub fn toggle_solo(&mut self, input: u16) {
        if self.solo.is_empty() {
            self.restored_mute = Some(self.mute.clone());
        }
        if !self.solo.remove(&input) {
            self.solo.insert(input);
        }
        if self.solo.is_empty() {
            if let Some(restored) = self.restored_mute.take() {
                self.mute = restored;
            }
        }
    }

    pub fn toggle_mute(&mut self, input: u16) {
        if !self.mute.remove(&input) {
            self.mute.insert(input);
        }
    }

    pub fn effects_graph(&self, slot: EffectsSlot) -> Option<&EffectsGraphDef> {
        self.effect_slots.get(&slot)
    }

    /// Atomically replaces the previous graph for `slot`, if any. The
    /// "only one concurrent install per slot" rule (`ConcurrentEffectsInstall`)
    /// is enforced by the runtime layer around the actual async build/connect
    /// step; this just swaps the description once that step completes.
    pub fn set_effects_graph(&mut self, slot: EffectsSlot, def: EffectsGraphDef) -> Option<EffectsGraphDef> {
        self.effect_slots.insert(slot, def)
    }

    pub fn remove_effects_graph(&mut self, slot: EffectsSlot) -> Option<EffectsGraphDef> {
        self.effect_slots.remove(&slot)
    }
}

/// Diagonal routing up to `min(inputs, outputs)`, plus the mono->stereo
/// duplicate heuristic for the single most common mismatch (§4.6 "common
/// downmix heuristics for mismatched counts").
fn default_routing(inputs: u16, outputs: u16) -> BTreeSet<(u16, u16)> {
    let mut set = BTreeSet::new();
    if inputs == 1 && outputs >= 2 {
        set.insert((0, 0));
        set.insert((0, 1));
        return set;
    }
    for i in 0..inputs.min(outputs) {
        set.insert((i, i));
    }
    set
}

/// Resolves the output count when the caller doesn't pin one explicitly
/// (`create_main_audio_router(inputs, outputs?)`), capped at the hardware
/// maximum the audio graph factory reports.
pub fn resolve_output_count(requested: Option<u16>, hardware_max: u16) -> u16 {
    requested.unwrap_or(hardware_max.min(2)).min(hardware_max).max(1)
}

pub fn require_router(state: Option<&AudioRouterState>) -> Result<&AudioRouterState, PlayerError> {
    state.ok_or_else(|| AudioFailure::RouterNotCreated.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_diagonal_routing() {
        let r = AudioRouterState::new(2, 2);
        assert!(r.is_connected(0, 0));
        assert!(r.is_connected(1, 1));
        assert!(!r.is_connected(0, 1));
    }

    #[test]
    fn mono_to_stereo_duplicates() {
        let r = AudioRouterState::new(1, 2);
        assert!(r.is_connected(0, 0));
        assert!(r.is_connected(0, 1));
    }

    #[test]
    fn update_connections_round_trips() {
        let mut r = AudioRouterState::new(6, 2);
        let target: Vec<(u16, u16, bool)> = vec![(3, 0, true), (3, 1, true), (0, 0, false)];
        r.update_connections(target.clone());
        let got = r.connections();
        for (i, o, c) in target {
            assert_eq!(got.iter().find(|(gi, go, _)| *gi == i && *go == o).unwrap().2, c);
        }
    }

    #[test]
    fn solo_overrides_mute_and_restores_on_solo_off() {
        // §8 scenario E: 6x2 router, default diagonal, solo input 3.
        let mut r = AudioRouterState::new(6, 2);
        r.toggle_mute(1); // input 1 individually muted beforehand
        assert!(r.is_silent(1));
        assert!(!r.is_silent(0));

        r.toggle_solo(3);
        assert_eq!(r.solo_set().iter().copied().collect::<Vec<_>>(), vec![3]);
        for input in 0..6 {
            assert_eq!(r.is_silent(input), input != 3);
        }

        r.toggle_solo(3);
        assert!(r.solo_set().is_empty());
        // Restores exactly the pre-solo mute state.
        assert!(r.is_silent(1));
        assert!(!r.is_silent(0));
    }

    #[test]
    fn effects_graph_replace_is_atomic_swap() {
        let mut r = AudioRouterState::new(2, 2);
        let def1 = EffectsGraphDef { id: uuid::Uuid::new_v4(), description: "eq".into() };
        let def2 = EffectsGraphDef { id: uuid::Uuid::new_v4(), description: "comp".into() };
        assert!(r.set_effects_graph(EffectsSlot::Router, def1.clone()).is_none());
        let prev = r.set_effects_graph(EffectsSlot::Router, def2.clone());
        assert_eq!(prev, Some(def1));
        assert_eq!(r.effects_graph(EffectsSlot::Router), Some(&def2));
    }
}
