//! Catalog registry: definition storage and lookup.
//!
//! Pure data with CRUD; no reconciliation behavior lives here. The
//! authoring UI drives `create`/`update`/`remove`; the engine only reads.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::DefinitionId;

use super::definition::EffectDefinition;

/// Registry of effect definitions.
///
/// ## Example
///
/// ```
/// use effect_forge::catalog::{EffectCatalog, EffectDefinition, ModifierKind};
///
/// let mut catalog = EffectCatalog::new();
/// let id = catalog.create(EffectDefinition::new(
///     "Shield Wall",
///     ModifierKind::DefenseBonus { bonus: 1 },
/// ));
/// assert_eq!(catalog.get(id).unwrap().name, "Shield Wall");
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EffectCatalog {
    definitions: FxHashMap<DefinitionId, EffectDefinition>,
    next_id: u32,
}

impl EffectCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with the preset library.
    #[must_use]
    pub fn with_presets() -> Self {
        let mut catalog = Self::new();
        for preset in super::presets::presets() {
            catalog.create(preset);
        }
        catalog
    }

    /// Register a definition, assigning it a fresh ID. Returns the ID.
    pub fn create(&mut self, mut definition: EffectDefinition) -> DefinitionId {
        let id = DefinitionId::new(self.next_id);
        self.next_id += 1;
        definition.id = id;
        self.definitions.insert(id, definition);
        id
    }

    /// Look up a definition by ID.
    #[must_use]
    pub fn get(&self, id: DefinitionId) -> Option<&EffectDefinition> {
        self.definitions.get(&id)
    }

    /// Replace an existing definition in place. Returns false if the ID is
    /// unknown (the update is dropped, not inserted).
    pub fn update(&mut self, id: DefinitionId, definition: EffectDefinition) -> bool {
        match self.definitions.get_mut(&id) {
            Some(slot) => {
                *slot = EffectDefinition { id, ..definition };
                true
            }
            None => false,
        }
    }

    /// Remove a definition. Assignments referencing it become dangling and
    /// are ignored by the resolver.
    pub fn remove(&mut self, id: DefinitionId) -> Option<EffectDefinition> {
        self.definitions.remove(&id)
    }

    /// Iterate all definitions (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.definitions.values()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
