//! The condition grammar.
//!
//! Conditions are a closed vocabulary: every authored definition carries
//! exactly one variant. Evaluation lives in [`crate::condition`]; this
//! module only defines the shapes.
//!
//! Unknown or malformed data can never reach evaluation: the grammar is a
//! proper sum type, so "unknown condition type evaluates to false" is a
//! compile-time impossibility rather than a silent runtime fallback.

use serde::{Deserialize, Serialize};

/// Whose state a condition inspects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// The holder of the effect.
    #[default]
    SelfActor,
    /// The contextual opposing actor.
    Target,
}

/// Comparison operator for attribute conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
}

impl CompareOp {
    /// Apply the operator.
    #[must_use]
    pub fn compare(self, value: i64, threshold: i64) -> bool {
        match self {
            Self::AtLeast => value >= threshold,
            Self::AtMost => value <= threshold,
            Self::Equal => value == threshold,
            Self::Greater => value > threshold,
            Self::Less => value < threshold,
        }
    }
}

/// The six core character traits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitId {
    Agility,
    Strength,
    Finesse,
    Instinct,
    Presence,
    Knowledge,
}

/// Typed attribute identifiers readable from an actor.
///
/// This is the whole surface of the read adapter (`Host::attribute`): the
/// loosely-shaped host document is translated once, here, into numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeId {
    /// Hope resource, current value.
    Hope,
    /// Hope as a rounded percentage of max.
    HopePct,
    /// Stress resource, current value.
    Stress,
    /// Stress as a rounded percentage of max.
    StressPct,
    /// Hit points, current value.
    HitPoints,
    /// Hit points, maximum.
    HitPointsMax,
    /// Hit points as a rounded percentage of max.
    HitPointsPct,
    /// Derived evasion score.
    Evasion,
    /// Proficiency value.
    Proficiency,
    /// Current armor resource value.
    ArmorScore,
    /// One of the six core traits.
    Trait(TraitId),
}

impl AttributeId {
    /// Whether this attribute reads a current resource value the engine may
    /// also write (used by the attribute-nudge consumption strategy).
    #[must_use]
    pub fn is_writable_resource(self) -> bool {
        matches!(self, Self::Hope | Self::Stress | Self::HitPoints)
    }
}

/// A status flag identifier (host-defined open set: "vulnerable",
/// "hidden", "poison", ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusId(pub String);

impl StatusId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StatusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatusId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The five ordered distance bands, closest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RangeBand {
    Melee,
    VeryClose,
    Close,
    Far,
    /// Unbounded outermost band.
    VeryFar,
}

impl RangeBand {
    /// All bands in distance order.
    pub const ALL: [RangeBand; 5] = [
        Self::Melee,
        Self::VeryClose,
        Self::Close,
        Self::Far,
        Self::VeryFar,
    ];

    /// The next-closer band, if any.
    #[must_use]
    pub fn closer(self) -> Option<RangeBand> {
        match self {
            Self::Melee => None,
            Self::VeryClose => Some(Self::Melee),
            Self::Close => Some(Self::VeryClose),
            Self::Far => Some(Self::Close),
            Self::VeryFar => Some(Self::Far),
        }
    }
}

/// How a range condition compares distance against its band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeMode {
    /// At the band's distance or closer.
    Within,
    /// Exactly inside the band (not closer, not further).
    At,
    /// Strictly further than the band.
    Beyond,
}

/// Which tokens a range condition measures against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeSubject {
    /// Currently targeted tokens, falling back to the contextual target.
    /// ALL candidates must satisfy the predicate.
    Target,
    /// The contextual opposing actor; only valid when one is supplied.
    /// ALL of that actor's tokens must satisfy the predicate.
    Attacker,
    /// Same-disposition tokens scene-wide; at least `count` must satisfy.
    Friends,
    /// Different-disposition tokens scene-wide; at least `count` must satisfy.
    Enemies,
}

/// Weapon slot filter for conditions gated on the acting weapon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponSlot {
    #[default]
    Any,
    /// First equipped weapon.
    Primary,
    /// Second equipped weapon.
    Secondary,
}

/// Ordered damage-threshold tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThresholdTier {
    Minor,
    Major,
    Severe,
}

/// One-shot trigger flags set by game events and cleared on consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Subject's last duality roll came up on the fear die.
    RolledFear,
    /// Subject rolled a critical success.
    RolledCritical,
    /// Subject spent hope (resource decrease observed).
    SpentHope,
    /// Subject marked an armor slot (absorption resource increase observed).
    ArmorSlotMarked,
    /// Subject took damage at or above a threshold tier.
    TookThreshold(ThresholdTier),
    /// Subject inflicted damage at or above a threshold tier.
    InflictedThreshold(ThresholdTier),
}

impl TriggerKind {
    /// Stable flag-store key for this trigger kind.
    #[must_use]
    pub fn flag_key(self) -> String {
        match self {
            Self::RolledFear => "rolledFear".to_string(),
            Self::RolledCritical => "rolledCritical".to_string(),
            Self::SpentHope => "spentHope".to_string(),
            Self::ArmorSlotMarked => "armorSlotMarked".to_string(),
            Self::TookThreshold(t) => format!("tookThreshold.{t:?}"),
            Self::InflictedThreshold(t) => format!("inflictedThreshold.{t:?}"),
        }
    }
}

/// Incoming damage-type filter used by damage-gated conditions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncomingKind {
    #[default]
    Any,
    Physical,
    Magical,
}

/// A declarative condition attached to an effect definition.
///
/// Exactly one variant per definition. Evaluation semantics are documented
/// on [`crate::condition::evaluate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Unconditional.
    Always,

    /// Subject currently has the named status flag.
    Status { subject: Subject, status: StatusId },

    /// Numeric attribute comparison on the subject.
    Attribute {
        subject: Subject,
        attribute: AttributeId,
        operator: CompareOp,
        value: i64,
    },

    /// Proximity check against on-board token positions.
    Range {
        mode: RangeMode,
        band: RangeBand,
        subject: RangeSubject,
        /// Minimum satisfying candidates for `Friends`/`Enemies`.
        count: u32,
    },

    /// The acting item occupies the given weapon slot.
    Weapon { slot: WeaponSlot },

    /// Incoming damage carries a matching type tag. Indeterminate-true when
    /// the context does not yet carry damage types.
    DamageType { incoming: IncomingKind },

    /// A one-shot trigger flag is set for the subject.
    Trigger { subject: Subject, kind: TriggerKind },

    /// Subject has an armor resource with max > 0 and every slot marked.
    NoArmorRemaining { subject: Subject },
}

impl Condition {
    /// Whether this condition consumes a one-shot trigger flag when an
    /// effect gated on it applies.
    #[must_use]
    pub fn trigger_kind(&self) -> Option<(Subject, TriggerKind)> {
        match self {
            Self::Trigger { subject, kind } => Some((*subject, *kind)),
            _ => None,
        }
    }

    /// The subject the condition inspects, where one exists.
    #[must_use]
    pub fn subject(&self) -> Option<Subject> {
        match self {
            Self::Status { subject, .. }
            | Self::Attribute { subject, .. }
            | Self::Trigger { subject, .. }
            | Self::NoArmorRemaining { subject } => Some(*subject),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_ops() {
        assert!(CompareOp::AtLeast.compare(3, 3));
        assert!(CompareOp::AtMost.compare(3, 3));
        assert!(!CompareOp::Greater.compare(3, 3));
        assert!(!CompareOp::Less.compare(3, 3));
        assert!(CompareOp::Equal.compare(3, 3));
    }

    #[test]
    fn band_ordering() {
        assert!(RangeBand::Melee < RangeBand::VeryFar);
        assert_eq!(RangeBand::VeryClose.closer(), Some(RangeBand::Melee));
        assert_eq!(RangeBand::Melee.closer(), None);
    }
}
