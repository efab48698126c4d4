//! Reentrancy gate for reconciliation passes.
//!
//! Host events fire as interleaved callbacks and may re-enter the engine
//! while a pass for the same (actor, family) is still mid-flight across a
//! persisted-state write. The gate serializes those passes with a
//! drain-to-quiescence loop: an overlapping call marks the slot dirty
//! instead of running, and the in-flight pass keeps looping until no
//! further dirtiness arrives. Different actors and different families
//! never block each other.

use rustc_hash::FxHashMap;

use crate::catalog::ModifierFamily;
use crate::core::ActorId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GateState {
    Running,
    RunningDirty,
}

/// Per-(actor, family) serialization state.
#[derive(Debug, Default)]
pub struct SyncGate {
    slots: FxHashMap<(ActorId, ModifierFamily), GateState>,
}

impl SyncGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to start a pass. Returns false when one is already running, in
    /// which case the slot is marked dirty and the running pass will loop.
    pub fn try_enter(&mut self, actor: ActorId, family: ModifierFamily) -> bool {
        match self.slots.get_mut(&(actor, family)) {
            None => {
                self.slots.insert((actor, family), GateState::Running);
                true
            }
            Some(state) => {
                *state = GateState::RunningDirty;
                false
            }
        }
    }

    /// After a pass finishes: consume any dirtiness marked meanwhile.
    /// Returns true when the holder must run another pass.
    pub fn take_dirty(&mut self, actor: ActorId, family: ModifierFamily) -> bool {
        match self.slots.get_mut(&(actor, family)) {
            Some(state @ GateState::RunningDirty) => {
                *state = GateState::Running;
                true
            }
            _ => false,
        }
    }

    /// Release the slot once drained.
    pub fn release(&mut self, actor: ActorId, family: ModifierFamily) {
        self.slots.remove(&(actor, family));
    }
}
