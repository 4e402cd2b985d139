//! Per-slide load bookkeeping.
//!
//! Each URL handed to the loader gets a slot that moves
//! `Idle → Loading → {Loaded, Failed}` and never moves again. `begin` is
//! the idempotence gate: whichever caller wins the transition out of
//! `Idle` owns the load, every later attempt is a no-op.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Shared load-state table, one slot per URL.
#[derive(Debug)]
pub struct LoadState {
    phases: Mutex<Vec<Phase>>,
}

impl LoadState {
    pub fn new(count: usize) -> LoadState {
        LoadState {
            phases: Mutex::new(vec![Phase::Idle; count]),
        }
    }

    /// Drop all slots and start over with `count` idle ones.
    pub fn reset(&self, count: usize) {
        *self.phases.lock().unwrap() = vec![Phase::Idle; count];
    }

    pub fn len(&self) -> usize {
        self.phases.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.lock().unwrap().is_empty()
    }

    /// Claim slot `index` for loading. Returns `false` when the slot is
    /// already loading, loaded, or failed — the caller must not load it.
    pub fn begin(&self, index: usize) -> bool {
        let mut phases = self.phases.lock().unwrap();
        match phases.get(index) {
            Some(Phase::Idle) => {
                phases[index] = Phase::Loading;
                true
            }
            _ => false,
        }
    }

    /// Settle a loading slot. Ignored unless the slot is `Loading`, so a
    /// stale completion can never overwrite a settled state.
    pub fn finish(&self, index: usize, ok: bool) {
        let mut phases = self.phases.lock().unwrap();
        if phases.get(index) == Some(&Phase::Loading) {
            phases[index] = if ok { Phase::Loaded } else { Phase::Failed };
        }
    }

    pub fn phase(&self, index: usize) -> Option<Phase> {
        self.phases.lock().unwrap().get(index).copied()
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.phase(index) == Some(Phase::Loaded)
    }

    pub fn is_failed(&self, index: usize) -> bool {
        self.phase(index) == Some(Phase::Failed)
    }

    /// Whether the first slot has finished loading successfully. The
    /// advance gate keys off this.
    pub fn is_first_loaded(&self) -> bool {
        self.is_loaded(0)
    }

    pub fn loaded_count(&self) -> usize {
        self.phases
            .lock()
            .unwrap()
            .iter()
            .filter(|p| **p == Phase::Loaded)
            .count()
    }
}
