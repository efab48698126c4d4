//! Scene override state.
//!
//! Per-scene layers over the catalog's global `enabled` switch: a
//! force-disable list (wins over everything), per-class toggle lists that
//! put a definition in scope for every character or adversary on the
//! scene, and a legacy defId -> bool override map honored only until the
//! newer per-class lists exist.

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{json, Value};

use crate::core::{ActorClass, DefinitionId, EngineError};
use crate::host::{flags, DocRef, FlagWrite, Host};

/// Parse a flag value as a list of definition IDs. Malformed entries are
/// skipped rather than failing the whole read.
pub(crate) fn read_id_list<H: Host>(host: &H, doc: DocRef, key: &str) -> FxHashSet<DefinitionId> {
    let Some(Value::Array(items)) = host.get_flag(doc, key) else {
        return FxHashSet::default();
    };
    items
        .iter()
        .filter_map(|v| v.as_u64())
        .filter_map(|v| u32::try_from(v).ok())
        .map(DefinitionId::new)
        .collect()
}

fn id_list_value(ids: &FxHashSet<DefinitionId>) -> Value {
    let mut raw: Vec<u32> = ids.iter().map(|id| id.raw()).collect();
    raw.sort_unstable();
    json!(raw)
}

/// Snapshot of a scene's override flags.
#[derive(Clone, Debug, Default)]
pub struct SceneOverrides {
    pub disabled: FxHashSet<DefinitionId>,
    pub pc_toggles: FxHashSet<DefinitionId>,
    pub npc_toggles: FxHashSet<DefinitionId>,
    legacy: FxHashMap<DefinitionId, bool>,
    /// Whether either per-class list flag exists (even empty). When true,
    /// the legacy map is ignored entirely.
    has_class_lists: bool,
}

impl SceneOverrides {
    /// Read the active scene's override flags.
    pub fn read<H: Host>(host: &H) -> Self {
        let has_class_lists = host.get_flag(DocRef::Scene, flags::PC_TOGGLES).is_some()
            || host.get_flag(DocRef::Scene, flags::NPC_TOGGLES).is_some();

        let mut legacy = FxHashMap::default();
        if !has_class_lists {
            if let Some(Value::Object(map)) = host.get_flag(DocRef::Scene, flags::LEGACY_OVERRIDES)
            {
                for (key, value) in map {
                    if let (Ok(raw), Some(enabled)) = (key.parse::<u32>(), value.as_bool()) {
                        legacy.insert(DefinitionId::new(raw), enabled);
                    }
                }
            }
        }

        Self {
            disabled: read_id_list(host, DocRef::Scene, flags::SCENE_DISABLED),
            pc_toggles: read_id_list(host, DocRef::Scene, flags::PC_TOGGLES),
            npc_toggles: read_id_list(host, DocRef::Scene, flags::NPC_TOGGLES),
            legacy,
            has_class_lists,
        }
    }

    /// The scene-wide toggle set for an actor class.
    #[must_use]
    pub fn toggles_for(&self, class: ActorClass) -> &FxHashSet<DefinitionId> {
        match class {
            ActorClass::Character => &self.pc_toggles,
            ActorClass::Adversary => &self.npc_toggles,
        }
    }

    /// Whether a definition is active after scene layering.
    ///
    /// Force-disable wins over everything; the legacy override map applies
    /// only while no per-class list exists; otherwise the global switch.
    #[must_use]
    pub fn is_active(&self, id: DefinitionId, globally_enabled: bool) -> bool {
        if self.disabled.contains(&id) {
            return false;
        }
        if !self.has_class_lists {
            if let Some(overridden) = self.legacy.get(&id) {
                return *overridden;
            }
        }
        globally_enabled
    }
}

/// Toggle force-disable for a definition on the active scene.
pub fn set_scene_disabled<H: Host>(
    host: &mut H,
    id: DefinitionId,
    disabled: bool,
) -> Result<(), EngineError> {
    let mut list = read_id_list(host, DocRef::Scene, flags::SCENE_DISABLED);
    if disabled {
        list.insert(id);
    } else {
        list.remove(&id);
    }
    host.set_flag(DocRef::Scene, flags::SCENE_DISABLED, id_list_value(&list))?;
    Ok(())
}

/// Toggle a scene-wide effect for a whole actor class.
pub fn set_class_toggle<H: Host>(
    host: &mut H,
    class: ActorClass,
    id: DefinitionId,
    enabled: bool,
) -> Result<(), EngineError> {
    let key = match class {
        ActorClass::Character => flags::PC_TOGGLES,
        ActorClass::Adversary => flags::NPC_TOGGLES,
    };
    let mut list = read_id_list(host, DocRef::Scene, key);
    if enabled {
        list.insert(id);
    } else {
        list.remove(&id);
    }
    host.set_flag(DocRef::Scene, key, id_list_value(&list))?;
    Ok(())
}

/// Clear every scene override flag in a single atomic write.
///
/// Sequential single-key removals can race with concurrent toggles and
/// leave stale flags behind.
pub fn clear_scene_overrides<H: Host>(host: &mut H) -> Result<(), EngineError> {
    host.write_flags(
        DocRef::Scene,
        &[
            FlagWrite::remove(flags::SCENE_DISABLED),
            FlagWrite::remove(flags::PC_TOGGLES),
            FlagWrite::remove(flags::NPC_TOGGLES),
            FlagWrite::remove(flags::LEGACY_OVERRIDES),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ActorClass;
    use crate::host::MemoryHost;

    #[test]
    fn legacy_map_ignored_once_class_lists_exist() {
        let mut host = MemoryHost::new();
        host.set_flag(
            DocRef::Scene,
            flags::LEGACY_OVERRIDES,
            json!({"3": false}),
        )
        .unwrap();

        let overrides = SceneOverrides::read(&host);
        assert!(!overrides.is_active(DefinitionId::new(3), true));

        // Creating a per-class list supersedes the legacy map.
        set_class_toggle(&mut host, ActorClass::Character, DefinitionId::new(9), true).unwrap();
        let overrides = SceneOverrides::read(&host);
        assert!(overrides.is_active(DefinitionId::new(3), true));
    }

    #[test]
    fn force_disable_wins() {
        let mut host = MemoryHost::new();
        set_class_toggle(&mut host, ActorClass::Character, DefinitionId::new(1), true).unwrap();
        set_scene_disabled(&mut host, DefinitionId::new(1), true).unwrap();
        let overrides = SceneOverrides::read(&host);
        assert!(!overrides.is_active(DefinitionId::new(1), true));
    }
}
