//! Mutable in-flight computation objects the host passes into hooks.

pub mod damage;
pub mod roll;

pub use damage::{DamagePart, DamagePool, DamageState, DamageTags, DamageTargetRef};
pub use roll::{AdvantageMode, RollKind, RollModifier, RollOutcome, RollState, RollTarget};
