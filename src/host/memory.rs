//! In-memory host implementation.
//!
//! A complete, deterministic stand-in for the real tabletop host. Every
//! integration test drives the engine against this fixture: documents are
//! im-backed (cheap snapshots), prompts are scripted, and write failures
//! can be injected to exercise the degraded paths.

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use std::collections::VecDeque;

use crate::catalog::{AppliedPayload, AttributeId, StatusId, TraitId};
use crate::core::{
    ActorClass, ActorId, CombatId, DefinitionId, Disposition, HostError, ItemId, RecordId, TokenId,
};

use super::{AppliedRecord, DocRef, FlagWrite, Host, ItemKind, ItemSnapshot, TokenSnapshot};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Resource {
    value: i64,
    max: i64,
}

impl Resource {
    fn pct(self) -> Option<i64> {
        if self.max > 0 {
            Some(((self.value as f64 / self.max as f64) * 100.0).round() as i64)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ActorDoc {
    class: ActorClass,
    hope: Resource,
    stress: Resource,
    hit_points: Resource,
    evasion: i64,
    proficiency: i64,
    traits: FxHashMap<TraitId, i64>,
    /// (marked slots, total slots); `None` when the actor has no armor.
    armor: Option<(u32, u32)>,
    /// (major, severe) damage thresholds.
    thresholds: (i64, i64),
    statuses: FxHashSet<StatusId>,
    flags: im::HashMap<String, Value>,
    records: Vec<AppliedRecord>,
    items: Vec<ItemId>,
}

#[derive(Clone, Debug)]
struct ItemDoc {
    owner: ActorId,
    kind: ItemKind,
    equipped: bool,
    vaulted: bool,
    flags: im::HashMap<String, Value>,
}

#[derive(Clone, Copy, Debug)]
struct TokenDoc {
    actor: Option<ActorId>,
    x: f64,
    y: f64,
    disposition: Disposition,
}

/// Deterministic in-memory [`Host`].
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    actors: FxHashMap<ActorId, ActorDoc>,
    items: FxHashMap<ItemId, ItemDoc>,
    tokens: FxHashMap<TokenId, TokenDoc>,
    token_order: Vec<TokenId>,
    user_targets: Vec<TokenId>,
    scene_flags: im::HashMap<String, Value>,
    combat: Option<CombatId>,
    next_actor: u32,
    next_item: u32,
    next_token: u32,
    next_record: u64,
    /// Scripted answers for `confirm`; falls back to `default_confirm`.
    confirm_script: VecDeque<bool>,
    default_confirm: bool,
    /// Prompt titles shown, for assertions.
    prompts_shown: Vec<String>,
    /// When set, the next flag/resource write fails (then resets).
    fail_next_write: bool,
    /// When set, the next record delete races with an external removal
    /// (then resets).
    stale_next_delete: bool,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_confirm: true,
            ..Self::default()
        }
    }

    // ── Fixture builders ────────────────────────────────────────────────

    pub fn add_actor(&mut self, class: ActorClass) -> ActorId {
        let id = ActorId::new(self.next_actor);
        self.next_actor += 1;
        self.actors.insert(
            id,
            ActorDoc {
                class,
                hope: Resource { value: 2, max: 6 },
                stress: Resource { value: 0, max: 6 },
                hit_points: Resource { value: 6, max: 6 },
                evasion: 10,
                proficiency: 1,
                thresholds: (5, 10),
                ..ActorDoc::default()
            },
        );
        id
    }

    pub fn set_hope(&mut self, actor: ActorId, value: i64, max: i64) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.hope = Resource { value, max };
        }
    }

    pub fn set_stress(&mut self, actor: ActorId, value: i64, max: i64) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.stress = Resource { value, max };
        }
    }

    pub fn set_hit_points(&mut self, actor: ActorId, value: i64, max: i64) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.hit_points = Resource { value, max };
        }
    }

    pub fn set_evasion(&mut self, actor: ActorId, value: i64) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.evasion = value;
        }
    }

    pub fn set_proficiency(&mut self, actor: ActorId, value: i64) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.proficiency = value;
        }
    }

    pub fn set_trait(&mut self, actor: ActorId, trait_id: TraitId, value: i64) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.traits.insert(trait_id, value);
        }
    }

    /// Set armor slots as `(marked, total)`.
    pub fn set_armor(&mut self, actor: ActorId, marked: u32, total: u32) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.armor = Some((marked, total));
        }
    }

    /// Set damage thresholds as `(major, severe)`.
    pub fn set_thresholds(&mut self, actor: ActorId, major: i64, severe: i64) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.thresholds = (major, severe);
        }
    }

    pub fn set_status(&mut self, actor: ActorId, status: impl Into<StatusId>, active: bool) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            let status = status.into();
            if active {
                doc.statuses.insert(status);
            } else {
                doc.statuses.remove(&status);
            }
        }
    }

    pub fn add_item(&mut self, owner: ActorId, kind: ItemKind) -> ItemId {
        let id = ItemId::new(self.next_item);
        self.next_item += 1;
        self.items.insert(
            id,
            ItemDoc {
                owner,
                kind,
                equipped: false,
                vaulted: false,
                flags: im::HashMap::new(),
            },
        );
        if let Some(doc) = self.actors.get_mut(&owner) {
            doc.items.push(id);
        }
        id
    }

    pub fn set_equipped(&mut self, item: ItemId, equipped: bool) {
        if let Some(doc) = self.items.get_mut(&item) {
            doc.equipped = equipped;
        }
    }

    pub fn set_vaulted(&mut self, item: ItemId, vaulted: bool) {
        if let Some(doc) = self.items.get_mut(&item) {
            doc.vaulted = vaulted;
        }
    }

    pub fn place_token(
        &mut self,
        actor: ActorId,
        x: f64,
        y: f64,
        disposition: Disposition,
    ) -> TokenId {
        let id = TokenId::new(self.next_token);
        self.next_token += 1;
        self.tokens.insert(
            id,
            TokenDoc {
                actor: Some(actor),
                x,
                y,
                disposition,
            },
        );
        self.token_order.push(id);
        id
    }

    pub fn move_token(&mut self, token: TokenId, x: f64, y: f64) {
        if let Some(doc) = self.tokens.get_mut(&token) {
            doc.x = x;
            doc.y = y;
        }
    }

    pub fn remove_token(&mut self, token: TokenId) {
        self.tokens.remove(&token);
        self.token_order.retain(|t| *t != token);
        self.user_targets.retain(|t| *t != token);
    }

    pub fn set_user_targets(&mut self, targets: Vec<TokenId>) {
        self.user_targets = targets;
    }

    pub fn start_combat(&mut self, id: CombatId) {
        self.combat = Some(id);
    }

    pub fn end_combat(&mut self) {
        self.combat = None;
    }

    /// Queue a scripted answer for the next confirmation prompt.
    pub fn script_confirm(&mut self, answer: bool) {
        self.confirm_script.push_back(answer);
    }

    /// Prompt titles shown so far.
    #[must_use]
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    /// Make the next flag/resource write fail with an I/O error.
    pub fn fail_next_write(&mut self) {
        self.fail_next_write = true;
    }

    /// Remove a record through a path the engine does not own, simulating
    /// an external deletion (stale-record race).
    pub fn remove_record_externally(&mut self, actor: ActorId, record: RecordId) {
        if let Some(doc) = self.actors.get_mut(&actor) {
            doc.records.retain(|r| r.id != record);
        }
    }

    /// Make the next `delete_record` race with an external removal: the
    /// record vanishes out from under the engine and the delete reports
    /// stale.
    pub fn script_stale_delete(&mut self) {
        self.stale_next_delete = true;
    }

    fn take_write_failure(&mut self) -> Result<(), HostError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(HostError::WriteFailed("injected failure".to_string()));
        }
        Ok(())
    }

    fn token_snapshot(&self, id: TokenId, doc: &TokenDoc) -> TokenSnapshot {
        TokenSnapshot {
            id,
            actor: doc.actor,
            x: doc.x,
            y: doc.y,
            disposition: doc.disposition,
        }
    }
}

impl Host for MemoryHost {
    fn attribute(&self, actor: ActorId, attribute: AttributeId) -> Option<i64> {
        let doc = self.actors.get(&actor)?;
        match attribute {
            AttributeId::Hope => Some(doc.hope.value),
            AttributeId::HopePct => doc.hope.pct(),
            AttributeId::Stress => Some(doc.stress.value),
            AttributeId::StressPct => doc.stress.pct(),
            AttributeId::HitPoints => Some(doc.hit_points.value),
            AttributeId::HitPointsMax => Some(doc.hit_points.max),
            AttributeId::HitPointsPct => doc.hit_points.pct(),
            AttributeId::Evasion => Some(doc.evasion),
            AttributeId::Proficiency => Some(doc.proficiency),
            AttributeId::ArmorScore => doc
                .armor
                .map(|(marked, total)| i64::from(total.saturating_sub(marked))),
            AttributeId::Trait(t) => doc.traits.get(&t).copied(),
        }
    }

    fn has_status(&self, actor: ActorId, status: &StatusId) -> bool {
        self.actors
            .get(&actor)
            .is_some_and(|doc| doc.statuses.contains(status))
    }

    fn actor_class(&self, actor: ActorId) -> Option<ActorClass> {
        self.actors.get(&actor).map(|doc| doc.class)
    }

    fn all_actors(&self) -> Vec<ActorId> {
        let mut ids: Vec<_> = self.actors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn items(&self, actor: ActorId) -> Vec<ItemSnapshot> {
        let Some(doc) = self.actors.get(&actor) else {
            return Vec::new();
        };
        doc.items
            .iter()
            .filter_map(|id| {
                self.items.get(id).map(|item| ItemSnapshot {
                    id: *id,
                    kind: item.kind,
                    equipped: item.equipped,
                    vaulted: item.vaulted,
                })
            })
            .collect()
    }

    fn armor_marks(&self, actor: ActorId) -> Option<(u32, u32)> {
        self.actors.get(&actor).and_then(|doc| doc.armor)
    }

    fn damage_thresholds(&self, actor: ActorId) -> Option<(i64, i64)> {
        self.actors.get(&actor).map(|doc| doc.thresholds)
    }

    fn scene_tokens(&self) -> Vec<TokenSnapshot> {
        self.token_order
            .iter()
            .filter_map(|id| self.tokens.get(id).map(|doc| self.token_snapshot(*id, doc)))
            .collect()
    }

    fn user_targets(&self) -> Vec<TokenSnapshot> {
        self.user_targets
            .iter()
            .filter_map(|id| self.tokens.get(id).map(|doc| self.token_snapshot(*id, doc)))
            .collect()
    }

    fn active_combat(&self) -> Option<CombatId> {
        self.combat
    }

    fn get_flag(&self, doc: DocRef, key: &str) -> Option<Value> {
        let flags = match doc {
            DocRef::Actor(id) => &self.actors.get(&id)?.flags,
            DocRef::Item(id) => &self.items.get(&id)?.flags,
            DocRef::Scene => &self.scene_flags,
        };
        flags.get(key).cloned()
    }

    fn flag_keys(&self, doc: DocRef, prefix: &str) -> Vec<String> {
        let flags = match doc {
            DocRef::Actor(id) => match self.actors.get(&id) {
                Some(doc) => &doc.flags,
                None => return Vec::new(),
            },
            DocRef::Item(id) => match self.items.get(&id) {
                Some(doc) => &doc.flags,
                None => return Vec::new(),
            },
            DocRef::Scene => &self.scene_flags,
        };
        let mut keys: Vec<String> = flags
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort_unstable();
        keys
    }

    fn write_flags(&mut self, doc: DocRef, writes: &[FlagWrite]) -> Result<(), HostError> {
        self.take_write_failure()?;
        let flags = match doc {
            DocRef::Actor(id) => {
                &mut self
                    .actors
                    .get_mut(&id)
                    .ok_or(HostError::MissingActor(id))?
                    .flags
            }
            DocRef::Item(id) => {
                &mut self
                    .items
                    .get_mut(&id)
                    .ok_or_else(|| HostError::WriteFailed(format!("no item {id}")))?
                    .flags
            }
            DocRef::Scene => &mut self.scene_flags,
        };
        for write in writes {
            match write {
                FlagWrite::Set { key, value } => {
                    flags.insert(key.clone(), value.clone());
                }
                FlagWrite::Remove { key } => {
                    flags.remove(key);
                }
            }
        }
        Ok(())
    }

    fn applied_records(&self, actor: ActorId) -> Vec<AppliedRecord> {
        self.actors
            .get(&actor)
            .map(|doc| doc.records.clone())
            .unwrap_or_default()
    }

    fn create_record(
        &mut self,
        actor: ActorId,
        source: DefinitionId,
        payload: AppliedPayload,
    ) -> Result<RecordId, HostError> {
        self.take_write_failure()?;
        let doc = self
            .actors
            .get_mut(&actor)
            .ok_or(HostError::MissingActor(actor))?;
        let id = RecordId::new(self.next_record);
        self.next_record += 1;
        doc.records.push(AppliedRecord {
            id,
            source,
            payload,
        });
        Ok(id)
    }

    fn delete_record(&mut self, actor: ActorId, record: RecordId) -> Result<(), HostError> {
        let doc = self
            .actors
            .get_mut(&actor)
            .ok_or(HostError::MissingActor(actor))?;
        if self.stale_next_delete {
            self.stale_next_delete = false;
            doc.records.retain(|r| r.id != record);
            return Err(HostError::StaleRecord { actor, record });
        }
        let before = doc.records.len();
        doc.records.retain(|r| r.id != record);
        if doc.records.len() == before {
            return Err(HostError::StaleRecord { actor, record });
        }
        Ok(())
    }

    fn set_resource(
        &mut self,
        actor: ActorId,
        attribute: AttributeId,
        value: i64,
    ) -> Result<(), HostError> {
        self.take_write_failure()?;
        let doc = self
            .actors
            .get_mut(&actor)
            .ok_or(HostError::MissingActor(actor))?;
        let resource = match attribute {
            AttributeId::Hope => &mut doc.hope,
            AttributeId::Stress => &mut doc.stress,
            AttributeId::HitPoints => &mut doc.hit_points,
            other => {
                return Err(HostError::WriteFailed(format!(
                    "attribute {other:?} is not a writable resource"
                )))
            }
        };
        resource.value = value.clamp(0, resource.max);
        Ok(())
    }

    fn apply_stress(&mut self, actor: ActorId, amount: i64) -> Result<(), HostError> {
        let current = self
            .attribute(actor, AttributeId::Stress)
            .ok_or(HostError::MissingActor(actor))?;
        self.set_resource(actor, AttributeId::Stress, current + amount)
    }

    fn toggle_status(
        &mut self,
        actor: ActorId,
        status: &StatusId,
        active: bool,
    ) -> Result<(), HostError> {
        self.take_write_failure()?;
        let doc = self
            .actors
            .get_mut(&actor)
            .ok_or(HostError::MissingActor(actor))?;
        if active {
            doc.statuses.insert(status.clone());
        } else {
            doc.statuses.remove(status);
        }
        Ok(())
    }

    fn confirm(&mut self, title: &str, _message: &str) -> bool {
        self.prompts_shown.push(title.to_string());
        self.confirm_script
            .pop_front()
            .unwrap_or(self.default_confirm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_attributes_round() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(ActorClass::Character);
        host.set_hit_points(actor, 1, 3);
        assert_eq!(host.attribute(actor, AttributeId::HitPointsPct), Some(33));
    }

    #[test]
    fn flag_removal_truly_deletes() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(ActorClass::Character);
        let doc = DocRef::Actor(actor);
        host.set_flag(doc, "k", Value::Bool(true)).unwrap();
        assert!(host.get_flag(doc, "k").is_some());
        host.remove_flag(doc, "k").unwrap();
        assert!(host.get_flag(doc, "k").is_none());
    }

    #[test]
    fn deleting_missing_record_is_stale() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(ActorClass::Character);
        let err = host.delete_record(actor, RecordId::new(9)).unwrap_err();
        assert!(matches!(err, HostError::StaleRecord { .. }));
    }
}
