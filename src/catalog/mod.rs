//! Effect catalog: definitions, the condition/modifier/duration grammars,
//! and the preset library.
//!
//! The catalog is pure data. Deciding which definitions are in scope for an
//! actor is [`crate::scope`]'s job; deciding whether they hold right now is
//! [`crate::condition`]'s.

pub mod condition;
pub mod definition;
pub mod duration;
pub mod modifier;
pub mod presets;
pub mod registry;

pub use condition::{
    AttributeId, CompareOp, Condition, IncomingKind, RangeBand, RangeMode, RangeSubject, StatusId,
    Subject, ThresholdTier, TraitId, TriggerKind, WeaponSlot,
};
pub use definition::EffectDefinition;
pub use duration::{ApplicationKind, EffectDuration, TickEvent};
pub use modifier::{
    ActionFilter, AppliedPayload, ApplyTo, DamageType, Modifier, ModifierFamily, ModifierKind,
    TraitFilter,
};
pub use presets::presets;
pub use registry::EffectCatalog;
