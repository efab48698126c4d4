//! # effect-forge
//!
//! A conditional-effect reconciliation engine for virtual tabletops:
//! author-created rules of the form "while/when <condition>, apply
//! <modifier>, for <duration>" are continuously reconciled against live
//! actor state.
//!
//! ## Design Principles
//!
//! 1. **Desired-state reconciliation**: persistent modifiers are never
//!    pushed imperatively. Each sync pass computes the desired record set
//!    from scope + conditions + duration budgets and diffs it against the
//!    live records, emitting minimal create/delete operations.
//!
//! 2. **Closed grammars**: conditions, modifiers, and durations are sum
//!    types. A malformed or future-version definition cannot reach
//!    evaluation; persisted flag payloads that fail to decode degrade to
//!    "absent" instead of wedging the actor.
//!
//! 3. **One translation boundary**: the engine reads and writes the host
//!    exclusively through the [`host::Host`] trait. No path-string
//!    document access leaks past it.
//!
//! 4. **Failures never escape a hook**: every [`hooks::Engine`] entry
//!    point catches and logs; the observable failure mode is always
//!    "effect did not apply this time".
//!
//! ## Modules
//!
//! - `core`: IDs, configuration, error taxonomy
//! - `catalog`: effect definitions, the condition/modifier/duration
//!   grammars, the preset library
//! - `scope`: assignment resolution and scene overrides
//! - `condition`: condition evaluation (status, attributes, range
//!   geometry, triggers)
//! - `state`: persisted trigger flags and duration entries
//! - `sync`: the reconciliation pass, reentrancy gate, move debounce
//! - `chain`: bounded-depth chained-effect processing
//! - `action`: in-flight roll and damage computations
//! - `host`: the host boundary trait and the in-memory test host
//! - `hooks`: the engine facade wired into host lifecycle events

pub mod action;
pub mod catalog;
pub mod chain;
pub mod condition;
pub mod core;
pub mod hooks;
pub mod host;
pub mod scope;
pub mod state;
pub mod sync;

// Re-export commonly used types
pub use crate::core::{
    ActorClass, ActorId, CombatId, DefinitionId, Disposition, EngineConfig, EngineError, HostError,
    ItemId, RangeBandThresholds, RecordId, TokenId,
};

pub use crate::catalog::{
    AppliedPayload, ApplyTo, AttributeId, CompareOp, Condition, DamageType, EffectCatalog,
    EffectDefinition, EffectDuration, IncomingKind, Modifier, ModifierFamily, ModifierKind,
    RangeBand, RangeMode, RangeSubject, StatusId, Subject, ThresholdTier, TickEvent, TraitId,
    TriggerKind, WeaponSlot,
};

pub use crate::action::{DamagePart, DamagePool, DamageState, DamageTags, RollOutcome, RollState};
pub use crate::condition::EvalContext;
pub use crate::hooks::Engine;
pub use crate::host::{AppliedRecord, DocRef, FlagWrite, Host, MemoryHost};
