//! In-flight roll computation.
//!
//! The host builds a [`RollState`] when a duality/attack roll starts and
//! passes it mutably through the pre-roll hook. Transient roll-type
//! modifiers (flat bonus, advantage, disadvantage) are applied here and
//! leave no persistent record.

use serde::{Deserialize, Serialize};

use crate::catalog::{ActionFilter, TraitId};
use crate::core::{ActorId, ItemId, TokenId};

/// Advantage state of a roll. Advantage always wins over disadvantage when
/// both would apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvantageMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl AdvantageMode {
    /// Grant advantage. Unconditional: advantage dominates.
    pub fn grant_advantage(&mut self) {
        *self = Self::Advantage;
    }

    /// Force disadvantage, unless advantage already applies.
    pub fn force_disadvantage(&mut self) {
        if *self != Self::Advantage {
            *self = Self::Disadvantage;
        }
    }
}

/// What kind of roll is being made.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollKind {
    #[default]
    Action,
    Reaction,
}

impl ActionFilter {
    /// Whether a roll of the given kind passes this filter.
    #[must_use]
    pub fn matches(self, kind: RollKind) -> bool {
        match self {
            Self::Any => true,
            Self::Action => kind == RollKind::Action,
            Self::Reaction => kind == RollKind::Reaction,
        }
    }
}

/// A labeled flat modifier pushed onto the roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollModifier {
    pub label: String,
    pub value: i64,
}

/// A resolved target of the roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollTarget {
    pub actor: ActorId,
    pub token: Option<TokenId>,
    /// Defense value snapshotted by the host before the async persistent
    /// sync can land; the pre-roll hook patches this number directly so the
    /// synchronous hit check sees boosted defenses.
    pub defense: Option<i64>,
    /// Filled in by the host once the hit/miss check resolves.
    pub hit: Option<bool>,
}

impl RollTarget {
    #[must_use]
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            token: None,
            defense: None,
            hit: None,
        }
    }

    #[must_use]
    pub fn with_defense(mut self, defense: i64) -> Self {
        self.defense = Some(defense);
        self
    }
}

/// Outcome tier of a resolved duality roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollOutcome {
    /// Hope die dominated.
    WithHope,
    /// Fear die dominated.
    WithFear,
    /// Critical success.
    Critical,
}

/// The mutable roll computation passed by reference into hooks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RollState {
    /// The acting actor.
    pub actor: ActorId,
    /// The item (weapon) the action uses, if any.
    pub item: Option<ItemId>,
    pub kind: RollKind,
    /// The trait the roll is made with, if any.
    pub rolled_trait: Option<TraitId>,
    pub advantage: AdvantageMode,
    pub modifiers: Vec<RollModifier>,
    pub targets: Vec<RollTarget>,
    /// Set by the host after the dice land; read by the post-roll hook.
    pub outcome: Option<RollOutcome>,
}

impl RollState {
    /// Create a roll with no targets or modifiers.
    #[must_use]
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            item: None,
            kind: RollKind::Action,
            rolled_trait: None,
            advantage: AdvantageMode::Normal,
            modifiers: Vec::new(),
            targets: Vec::new(),
            outcome: None,
        }
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item = Some(item);
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: RollKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_trait(mut self, rolled: TraitId) -> Self {
        self.rolled_trait = Some(rolled);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: RollTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Push a labeled flat modifier.
    pub fn push_modifier(&mut self, label: impl Into<String>, value: i64) {
        self.modifiers.push(RollModifier {
            label: label.into(),
            value,
        });
    }

    /// Sum of all flat modifiers.
    #[must_use]
    pub fn modifier_total(&self) -> i64 {
        self.modifiers.iter().map(|m| m.value).sum()
    }
}
