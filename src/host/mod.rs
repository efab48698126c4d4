//! The host boundary.
//!
//! Everything the engine reads from or writes to the surrounding virtual
//! tabletop goes through the [`Host`] trait: typed attribute reads, status
//! flags, carried items, scene tokens, combat identity, namespaced
//! key-value flags (with atomic multi-key writes), applied-modifier
//! records, and the user-confirmation prompt.
//!
//! The host's documents are loosely shaped; this trait is the single
//! translation boundary. Path-string access never leaks past it.

pub mod memory;

use serde_json::Value;

use crate::catalog::{AppliedPayload, AttributeId, StatusId};
use crate::core::{
    ActorClass, ActorId, CombatId, DefinitionId, Disposition, HostError, ItemId, RecordId, TokenId,
};

pub use memory::MemoryHost;

/// Flag-store keys. One namespace per carrier document.
pub mod flags {
    /// Item flag: definition IDs assigned via this item.
    pub const ASSIGNED: &str = "assignedEffects";
    /// Actor flag: definition IDs assigned directly to the actor.
    pub const ACTOR_ASSIGNED: &str = "actorEffects";
    /// Scene flag: definition IDs force-disabled in this scene.
    pub const SCENE_DISABLED: &str = "sceneDisabled";
    /// Scene flag: definition IDs toggled on for all player characters.
    pub const PC_TOGGLES: &str = "pcToggles";
    /// Scene flag: definition IDs toggled on for all adversaries.
    pub const NPC_TOGGLES: &str = "npcToggles";
    /// Legacy scene flag: defId -> bool override map. Honored until the
    /// newer per-class lists exist, then ignored.
    pub const LEGACY_OVERRIDES: &str = "sceneOverrides";
    /// Actor flag prefix: per-definition duration state.
    pub const DURATION_PREFIX: &str = "durations";
    /// Actor flag prefix: one-shot trigger flags.
    pub const TRIGGER_PREFIX: &str = "triggers";
}

/// Kinds of carried items, as far as scope resolution cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Weapon,
    Armor,
    /// Consumable-card item; active unless vaulted.
    DomainCard,
    /// Passive feature; always active.
    Feature,
    Other,
}

/// Snapshot of a carried item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub kind: ItemKind,
    pub equipped: bool,
    pub vaulted: bool,
}

impl ItemSnapshot {
    /// Whether the item currently contributes its assigned effects.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self.kind {
            ItemKind::Weapon | ItemKind::Armor => self.equipped,
            ItemKind::DomainCard => !self.vaulted,
            ItemKind::Feature => true,
            ItemKind::Other => false,
        }
    }
}

/// Snapshot of a token on the active scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TokenSnapshot {
    pub id: TokenId,
    pub actor: Option<ActorId>,
    pub x: f64,
    pub y: f64,
    pub disposition: Disposition,
}

impl TokenSnapshot {
    /// Center-to-center distance to another token, in scene units.
    #[must_use]
    pub fn distance_to(&self, other: &TokenSnapshot) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A live applied-modifier record on an actor.
///
/// Created and deleted exclusively by the sync loops; at most one record
/// per (actor, definition) for a given family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedRecord {
    pub id: RecordId,
    pub source: DefinitionId,
    pub payload: AppliedPayload,
}

/// Which document a flag lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocRef {
    Actor(ActorId),
    Item(ItemId),
    /// The active scene.
    Scene,
}

/// One mutation in an atomic multi-key flag write.
///
/// `Remove` is a true key deletion; a shallow-merge write cannot delete a
/// key, which was an observed bug class in duration cleanup.
#[derive(Clone, Debug, PartialEq)]
pub enum FlagWrite {
    Set { key: String, value: Value },
    Remove { key: String },
}

impl FlagWrite {
    #[must_use]
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        Self::Set {
            key: key.into(),
            value,
        }
    }

    #[must_use]
    pub fn remove(key: impl Into<String>) -> Self {
        Self::Remove { key: key.into() }
    }
}

/// The host collaborator: event source and mutable snapshot provider.
pub trait Host {
    // ── Read accessors ──────────────────────────────────────────────────

    /// Read a numeric attribute from an actor. `None` when absent.
    fn attribute(&self, actor: ActorId, attribute: AttributeId) -> Option<i64>;

    /// Whether the actor currently has the named status flag.
    fn has_status(&self, actor: ActorId, status: &StatusId) -> bool;

    /// The actor's class, `None` if the actor does not exist.
    fn actor_class(&self, actor: ActorId) -> Option<ActorClass>;

    /// All actors known to the host.
    fn all_actors(&self) -> Vec<ActorId>;

    /// Items carried by the actor.
    fn items(&self, actor: ActorId) -> Vec<ItemSnapshot>;

    /// Armor-slot usage as `(used, max)`, `None` when the actor has no
    /// armor resource.
    fn armor_marks(&self, actor: ActorId) -> Option<(u32, u32)>;

    /// The actor's damage thresholds as `(major, severe)`.
    fn damage_thresholds(&self, actor: ActorId) -> Option<(i64, i64)>;

    /// All tokens on the active scene.
    fn scene_tokens(&self) -> Vec<TokenSnapshot>;

    /// Tokens currently targeted by the acting user.
    fn user_targets(&self) -> Vec<TokenSnapshot>;

    /// The active combat encounter, if one is running.
    fn active_combat(&self) -> Option<CombatId>;

    // ── Flag store ──────────────────────────────────────────────────────

    /// Read a namespaced flag.
    fn get_flag(&self, doc: DocRef, key: &str) -> Option<Value>;

    /// All flag keys on a document starting with a prefix.
    fn flag_keys(&self, doc: DocRef, prefix: &str) -> Vec<String>;

    /// Apply a batch of flag mutations atomically (single combined update;
    /// sequential writes can race and lose concurrent toggles).
    fn write_flags(&mut self, doc: DocRef, writes: &[FlagWrite]) -> Result<(), HostError>;

    // ── Applied-modifier records ────────────────────────────────────────

    /// Live applied-modifier records on an actor.
    fn applied_records(&self, actor: ActorId) -> Vec<AppliedRecord>;

    /// Create a record; the host allocates the ID.
    fn create_record(
        &mut self,
        actor: ActorId,
        source: DefinitionId,
        payload: AppliedPayload,
    ) -> Result<RecordId, HostError>;

    /// Delete a record. Fails with [`HostError::StaleRecord`] when the
    /// record already vanished through an unrelated path.
    fn delete_record(&mut self, actor: ActorId, record: RecordId) -> Result<(), HostError>;

    // ── Write accessors ─────────────────────────────────────────────────

    /// Write a current resource value (hope, stress, hit points).
    fn set_resource(
        &mut self,
        actor: ActorId,
        attribute: AttributeId,
        value: i64,
    ) -> Result<(), HostError>;

    /// Apply stress to an actor (clamped at the actor's max).
    fn apply_stress(&mut self, actor: ActorId, amount: i64) -> Result<(), HostError>;

    /// Toggle a status flag on an actor.
    fn toggle_status(
        &mut self,
        actor: ActorId,
        status: &StatusId,
        active: bool,
    ) -> Result<(), HostError>;

    // ── User interaction ────────────────────────────────────────────────

    /// Show a confirmation prompt. A `false` answer skips the application;
    /// it is not an error. May suspend indefinitely on a real host.
    fn confirm(&mut self, title: &str, message: &str) -> bool;

    // ── Convenience (default impls over write_flags) ────────────────────

    /// Set a single flag.
    fn set_flag(&mut self, doc: DocRef, key: &str, value: Value) -> Result<(), HostError> {
        self.write_flags(doc, &[FlagWrite::set(key, value)])
    }

    /// Remove a single flag (true key deletion).
    fn remove_flag(&mut self, doc: DocRef, key: &str) -> Result<(), HostError> {
        self.write_flags(doc, &[FlagWrite::remove(key)])
    }
}
