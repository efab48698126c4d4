//! Evaluation context.

use rustc_hash::FxHashSet;

use crate::catalog::{DamageType, Subject};
use crate::core::{ActorId, ItemId};

/// The situational inputs a condition is evaluated against.
///
/// Built per event by the hook layer: the holder is always present, the
/// rest is filled in as far as the event knows it. Conditions that need a
/// missing piece evaluate to false, except damage-type gates which stay
/// indeterminate-true until damage context exists.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalContext {
    /// The effect holder.
    pub actor: ActorId,
    /// The contextual opposing actor (roll target or inferred attacker).
    pub target: Option<ActorId>,
    /// The item the current action is performed with.
    pub acting_item: Option<ItemId>,
    /// Union of incoming damage-type tags, once damage is in flight.
    pub incoming_types: Option<FxHashSet<DamageType>>,
}

impl EvalContext {
    #[must_use]
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            target: None,
            acting_item: None,
            incoming_types: None,
        }
    }

    /// Set the opposing actor (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the acting item (builder pattern).
    #[must_use]
    pub fn with_item(mut self, item: ItemId) -> Self {
        self.acting_item = Some(item);
        self
    }

    /// Set the incoming damage-type tags (builder pattern).
    #[must_use]
    pub fn with_incoming_types(mut self, types: FxHashSet<DamageType>) -> Self {
        self.incoming_types = Some(types);
        self
    }

    /// Resolve a condition subject to an actor, `None` when the context
    /// lacks one.
    #[must_use]
    pub fn resolve(&self, subject: Subject) -> Option<ActorId> {
        match subject {
            Subject::SelfActor => Some(self.actor),
            Subject::Target => self.target,
        }
    }
}
