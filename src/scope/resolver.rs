//! Assignment resolution.
//!
//! Gathers the definitions in scope for an actor from three sources:
//! scene-wide class toggles, flags on the actor's active items, and the
//! actor's own assignment flag. Dangling IDs (definition deleted after
//! assignment) and scene-disabled definitions drop out silently.

use rustc_hash::FxHashSet;

use crate::catalog::{EffectCatalog, EffectDefinition};
use crate::core::{ActorId, DefinitionId, EngineError};
use crate::host::{flags, DocRef, Host};

use super::overrides::{read_id_list, SceneOverrides};

/// IDs assigned via an item's flag.
pub fn item_assignments<H: Host>(host: &H, item: crate::core::ItemId) -> FxHashSet<DefinitionId> {
    read_id_list(host, DocRef::Item(item), flags::ASSIGNED)
}

/// IDs assigned directly on the actor's flag.
pub fn actor_assignments<H: Host>(host: &H, actor: ActorId) -> FxHashSet<DefinitionId> {
    read_id_list(host, DocRef::Actor(actor), flags::ACTOR_ASSIGNED)
}

/// Assign or unassign a definition directly on an actor.
pub fn set_actor_assignment<H: Host>(
    host: &mut H,
    actor: ActorId,
    id: DefinitionId,
    assigned: bool,
) -> Result<(), EngineError> {
    let mut list = actor_assignments(host, actor);
    if assigned {
        list.insert(id);
    } else {
        list.remove(&id);
    }
    write_id_list(host, DocRef::Actor(actor), flags::ACTOR_ASSIGNED, &list)
}

/// Assign or unassign a definition on an item.
pub fn set_item_assignment<H: Host>(
    host: &mut H,
    item: crate::core::ItemId,
    id: DefinitionId,
    assigned: bool,
) -> Result<(), EngineError> {
    let mut list = item_assignments(host, item);
    if assigned {
        list.insert(id);
    } else {
        list.remove(&id);
    }
    write_id_list(host, DocRef::Item(item), flags::ASSIGNED, &list)
}

fn write_id_list<H: Host>(
    host: &mut H,
    doc: DocRef,
    key: &str,
    ids: &FxHashSet<DefinitionId>,
) -> Result<(), EngineError> {
    let mut raw: Vec<u32> = ids.iter().map(|id| id.raw()).collect();
    raw.sort_unstable();
    host.set_flag(doc, key, serde_json::json!(raw))?;
    Ok(())
}

/// All effect definitions currently in scope for an actor.
///
/// An item contributes its assignments only while active: weapons and
/// armor must be equipped, domain cards must not be vaulted, features
/// always contribute. The union is deduplicated, then filtered through
/// [`SceneOverrides::is_active`].
pub fn resolve_in_scope<H: Host>(
    host: &H,
    catalog: &EffectCatalog,
    actor: ActorId,
) -> Vec<EffectDefinition> {
    let overrides = SceneOverrides::read(host);

    let mut ids: FxHashSet<DefinitionId> = FxHashSet::default();
    if let Some(class) = host.actor_class(actor) {
        ids.extend(overrides.toggles_for(class).iter().copied());
    }
    for item in host.items(actor) {
        if item.is_active() {
            ids.extend(item_assignments(host, item.id));
        }
    }
    ids.extend(actor_assignments(host, actor));

    let mut defs: Vec<EffectDefinition> = ids
        .into_iter()
        .filter_map(|id| catalog.get(id))
        .filter(|def| overrides.is_active(def.id, def.enabled))
        .cloned()
        .collect();
    // Deterministic order keeps downstream diffs and logs stable.
    defs.sort_by_key(|def| def.id);
    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EffectDefinition, ModifierKind};
    use crate::core::ActorClass;
    use crate::host::{ItemKind, MemoryHost};

    #[test]
    fn unequipped_weapon_contributes_nothing() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(ActorClass::Character);
        let sword = host.add_item(actor, ItemKind::Weapon);

        let mut catalog = EffectCatalog::new();
        let id = catalog.create(EffectDefinition::new(
            "Keen Edge",
            ModifierKind::DefenseBonus { bonus: 1 },
        ));
        set_item_assignment(&mut host, sword, id, true).unwrap();

        assert!(resolve_in_scope(&host, &catalog, actor).is_empty());

        host.set_equipped(sword, true);
        assert_eq!(resolve_in_scope(&host, &catalog, actor).len(), 1);
    }

    #[test]
    fn dangling_assignment_is_ignored() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(ActorClass::Character);
        set_actor_assignment(&mut host, actor, DefinitionId::new(99), true).unwrap();

        let catalog = EffectCatalog::new();
        assert!(resolve_in_scope(&host, &catalog, actor).is_empty());
    }
}
