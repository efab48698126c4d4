//! Effect definitions: condition + modifier + duration.

use serde::{Deserialize, Serialize};

use crate::core::DefinitionId;

use super::condition::Condition;
use super::duration::EffectDuration;
use super::modifier::{Modifier, ModifierKind};

/// An author-created conditional effect.
///
/// Invariant: exactly one condition variant and one modifier variant per
/// definition (enforced by the types). `enabled` is the global on/off
/// switch; scene overrides are layered on top by the assignment resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub id: DefinitionId,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub condition: Condition,
    pub modifier: Modifier,
    pub duration: EffectDuration,
}

impl EffectDefinition {
    /// Create an enabled, permanent, unconditional definition.
    ///
    /// The ID is a placeholder until the definition is registered with the
    /// catalog (`EffectCatalog::create` assigns the real one).
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ModifierKind) -> Self {
        Self {
            id: DefinitionId::new(0),
            name: name.into(),
            description: String::new(),
            enabled: true,
            condition: Condition::Always,
            modifier: Modifier::new(kind),
            duration: EffectDuration::Permanent,
        }
    }

    /// Set the condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Set the duration (builder pattern).
    #[must_use]
    pub fn with_duration(mut self, duration: EffectDuration) -> Self {
        self.duration = duration;
        self
    }

    /// Replace the whole modifier (builder pattern).
    #[must_use]
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }

    /// Set the description (builder pattern).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Disable the definition (builder pattern).
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
