//! The event hook layer: one entry point per host lifecycle event, plus
//! the cross-event caches (attacker inference, spend-inference snapshots).

pub mod attacker;
pub mod engine;

pub use attacker::AttackerCache;
pub use engine::Engine;
