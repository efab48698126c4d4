//! Core types: IDs, configuration, and the error taxonomy.
//!
//! Everything here is host-agnostic. The host is only ever addressed
//! through the opaque IDs defined in [`ids`].

pub mod config;
pub mod error;
pub mod ids;

pub use config::{EngineConfig, RangeBandThresholds};
pub use error::{EngineError, HostError};
pub use ids::{
    ActorClass, ActorId, CombatId, DefinitionId, Disposition, ItemId, RecordId, TokenId,
};
