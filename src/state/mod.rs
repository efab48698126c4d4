//! Persisted per-actor consumable state: trigger flags and duration
//! entries, both stored as namespaced actor flags.

pub mod duration;
pub mod trigger;

pub use duration::DurationEntry;
