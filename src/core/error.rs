//! Error taxonomy.
//!
//! Every failure below the hook entry points is an [`EngineError`] carried
//! through `Result`. The entry points themselves catch, log, and return:
//! nothing propagates into the host's event-dispatch loop (a thrown error
//! there would break the host for every other consumer).

use crate::core::{ActorId, DefinitionId, RecordId};

/// Errors surfaced by host document access.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The targeted applied-modifier record no longer exists. Recoverable:
    /// the caller schedules a follow-up resync instead of failing.
    #[error("applied record {record} on {actor} already removed")]
    StaleRecord { actor: ActorId, record: RecordId },

    /// The addressed actor does not exist (deleted mid-flight).
    #[error("actor {0} not found")]
    MissingActor(ActorId),

    /// A flag or resource write failed in the host's document store.
    #[error("host write failed: {0}")]
    WriteFailed(String),

    /// No active scene, where one is required.
    #[error("no active scene")]
    NoActiveScene,
}

/// Errors surfaced by the engine itself.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Host(#[from] HostError),

    /// A chain or scope reference points at a definition the catalog no
    /// longer contains. Treated as skip-this-entry by callers.
    #[error("unknown definition {0}")]
    UnknownDefinition(DefinitionId),

    /// A persisted flag payload failed to decode. The entry is treated as
    /// absent for this cycle; the next reconciliation rewrites it.
    #[error("malformed flag payload under {key}: {source}")]
    MalformedFlag {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Whether this failure is the benign stale-record race: the work
    /// was already done by someone else, only a follow-up resync is owed.
    #[must_use]
    pub fn is_stale_record(&self) -> bool {
        matches!(self, Self::Host(HostError::StaleRecord { .. }))
    }
}
