//! The modifier grammar.
//!
//! A modifier is what an effect *does* once its condition holds. The
//! vocabulary is closed. Persistent kinds (defense, thresholds,
//! proficiency, status-while-condition-holds) are reconciled into
//! applied-modifier records by the sync loops; transient kinds mutate the
//! in-flight roll or damage computation and leave no record.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::DefinitionId;

use super::condition::{StatusId, TraitId};

/// Whether a modifier affects its holder's own outgoing rolls/damage or an
/// opponent's incoming rolls/damage against the holder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplyTo {
    #[default]
    SelfActor,
    Incoming,
}

/// Outgoing damage-type filter for damage bonuses.
///
/// `Physical` and `Magical` are *broad categories*: they apply to any
/// hit-points-targeting damage part regardless of the part's own tags.
/// This permissiveness is a deliberate policy carry-over (see DESIGN.md).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Any,
    Physical,
    Magical,
    PrimaryWeapon,
    SecondaryWeapon,
}

impl DamageType {
    /// Broadly-compatible types apply to any hit-points part.
    #[must_use]
    pub fn is_broad(self) -> bool {
        matches!(
            self,
            Self::Any | Self::Physical | Self::Magical | Self::PrimaryWeapon | Self::SecondaryWeapon
        )
    }

    /// Whether this type should be merged into a part's tag collection when
    /// the bonus applies (concrete categories only).
    #[must_use]
    pub fn merges_into_tags(self) -> bool {
        matches!(self, Self::Physical | Self::Magical)
    }
}

/// Trait filter gating roll-type modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitFilter {
    #[default]
    Any,
    Only(TraitId),
}

impl TraitFilter {
    #[must_use]
    pub fn matches(self, rolled: Option<TraitId>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(t) => rolled == Some(t),
        }
    }
}

/// Action-kind filter gating roll-type modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionFilter {
    #[default]
    Any,
    Action,
    Reaction,
}

/// The modifier families backed by applied-modifier records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierFamily {
    /// Flat defense (evasion / difficulty) bonus.
    Defense,
    /// Damage-threshold (major/severe) bonus.
    Threshold,
    /// Proficiency bonus while the condition holds.
    Proficiency,
    /// Status applied to the subject while the condition holds.
    Status,
}

impl ModifierFamily {
    /// All reconciled families.
    pub const ALL: [ModifierFamily; 4] = [
        Self::Defense,
        Self::Threshold,
        Self::Proficiency,
        Self::Status,
    ];
}

/// Incoming damage-type filter on defender-side modifiers.
pub use super::condition::IncomingKind;

/// What a modifier does. One variant per definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Append dice and/or a flat bonus to matching damage-roll parts.
    DamageBonus {
        dice: String,
        bonus: i64,
        damage_type: DamageType,
    },

    /// Multiply matching incoming damage parts (rounded up).
    DamageMultiplier {
        factor: f64,
        incoming: IncomingKind,
    },

    /// Raise the major/severe damage thresholds. Persistent.
    ThresholdBonus { major: i64, severe: i64 },

    /// Flat defense bonus. Persistent.
    DefenseBonus { bonus: i64 },

    /// Proficiency bonus while the condition holds. Persistent.
    ProficiencyBonus { bonus: i64 },

    /// Status held on the subject while the condition holds. Persistent.
    ApplyStatus { status: StatusId },

    /// Apply a status to every hit target (confirmation-gated).
    StatusOnHit { status: StatusId },

    /// Apply stress to every hit target (confirmation-gated).
    StressOnHit { amount: i64 },

    /// Flat bonus on the in-flight roll.
    RollBonus {
        bonus: i64,
        trait_filter: TraitFilter,
        action_filter: ActionFilter,
    },

    /// Grant advantage on the in-flight roll. Advantage beats disadvantage.
    Advantage {
        trait_filter: TraitFilter,
        action_filter: ActionFilter,
    },

    /// Force disadvantage on the in-flight roll.
    Disadvantage {
        trait_filter: TraitFilter,
        action_filter: ActionFilter,
    },
}

impl ModifierKind {
    /// The reconciled family this kind belongs to, if it is persistent.
    #[must_use]
    pub fn family(&self) -> Option<ModifierFamily> {
        match self {
            Self::DefenseBonus { .. } => Some(ModifierFamily::Defense),
            Self::ThresholdBonus { .. } => Some(ModifierFamily::Threshold),
            Self::ProficiencyBonus { .. } => Some(ModifierFamily::Proficiency),
            Self::ApplyStatus { .. } => Some(ModifierFamily::Status),
            _ => None,
        }
    }

    /// Whether this kind mutates the in-flight roll computation.
    #[must_use]
    pub fn is_roll_type(&self) -> bool {
        matches!(
            self,
            Self::RollBonus { .. } | Self::Advantage { .. } | Self::Disadvantage { .. }
        )
    }

    /// The persistent-record payload for this kind, or `None` when the
    /// magnitude is zero/empty (zero-magnitude modifiers never produce a
    /// record).
    #[must_use]
    pub fn payload(&self) -> Option<AppliedPayload> {
        match self {
            Self::DefenseBonus { bonus } if *bonus != 0 => {
                Some(AppliedPayload::Defense { bonus: *bonus })
            }
            Self::ThresholdBonus { major, severe } if *major != 0 || *severe != 0 => {
                Some(AppliedPayload::Thresholds {
                    major: *major,
                    severe: *severe,
                })
            }
            Self::ProficiencyBonus { bonus } if *bonus != 0 => {
                Some(AppliedPayload::Proficiency { bonus: *bonus })
            }
            Self::ApplyStatus { status } if !status.as_str().is_empty() => {
                Some(AppliedPayload::Status {
                    status: status.clone(),
                })
            }
            _ => None,
        }
    }
}

/// The payload carried by an applied-modifier record.
///
/// Records match their desired state exactly; a payload difference forces
/// delete-and-recreate during reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppliedPayload {
    Defense { bonus: i64 },
    Thresholds { major: i64, severe: i64 },
    Proficiency { bonus: i64 },
    Status { status: StatusId },
}

impl AppliedPayload {
    /// The family a payload belongs to.
    #[must_use]
    pub fn family(&self) -> ModifierFamily {
        match self {
            Self::Defense { .. } => ModifierFamily::Defense,
            Self::Thresholds { .. } => ModifierFamily::Threshold,
            Self::Proficiency { .. } => ModifierFamily::Proficiency,
            Self::Status { .. } => ModifierFamily::Status,
        }
    }
}

/// A modifier plus its application side and chained follow-up effects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub apply_to: ApplyTo,
    /// Effect definitions fired after this one applies. Order is
    /// insignificant; depth is bounded by the chain processor.
    #[serde(default)]
    pub chain: SmallVec<[DefinitionId; 4]>,
}

impl Modifier {
    /// Create a self-applying modifier with no chain.
    #[must_use]
    pub fn new(kind: ModifierKind) -> Self {
        Self {
            kind,
            apply_to: ApplyTo::SelfActor,
            chain: SmallVec::new(),
        }
    }

    /// Set the application side (builder pattern).
    #[must_use]
    pub fn applying_to(mut self, apply_to: ApplyTo) -> Self {
        self.apply_to = apply_to;
        self
    }

    /// Append a chained definition (builder pattern).
    #[must_use]
    pub fn with_chain(mut self, id: DefinitionId) -> Self {
        self.chain.push(id);
        self
    }
}
