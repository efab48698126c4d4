//! Reconciliation: desired-state diffing of applied-modifier records,
//! serialized per (actor, family) and debounced for movement bursts.

pub mod debounce;
pub mod gate;
pub mod reconcile;

pub use debounce::MoveDebouncer;
pub use gate::SyncGate;
pub use reconcile::{sync_family, PrevConditions, SyncOutcome};
