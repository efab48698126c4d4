//! Per-actor duration state.
//!
//! A duration entry exists only once an effect has actually been consumed
//! at least once (or ticked, for countdowns); absence means the full
//! template budget is still available. Entries are removed with true key
//! deletion. A shallow-merge write cannot delete a key and silently leaves
//! exhausted entries behind, which is exactly the stale-cleanup bug this
//! store exists to prevent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::{
    ApplicationKind, CompareOp, Condition, EffectDefinition, EffectDuration, ModifierKind, Subject,
    TickEvent,
};
use crate::core::{ActorId, CombatId, DefinitionId, EngineError};
use crate::host::{flags, DocRef, FlagWrite, Host};

/// Persisted per-(actor, definition) duration state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationEntry {
    /// Remaining applications/ticks for counted modes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    /// The owning encounter for `EndOfCombat`, bound lazily on first use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combat: Option<CombatId>,
}

fn key(def: DefinitionId) -> String {
    format!("{}.{}", flags::DURATION_PREFIX, def.raw())
}

fn id_from_key(key: &str) -> Option<DefinitionId> {
    let raw = key.strip_prefix(flags::DURATION_PREFIX)?.strip_prefix('.')?;
    raw.parse::<u32>().ok().map(DefinitionId::new)
}

/// Read an actor's duration entry for a definition. Malformed flag data is
/// logged and treated as absent so one bad entry cannot wedge the actor.
pub fn entry<H: Host>(host: &H, actor: ActorId, def: DefinitionId) -> Option<DurationEntry> {
    let value = host.get_flag(DocRef::Actor(actor), &key(def))?;
    match serde_json::from_value::<DurationEntry>(value) {
        Ok(entry) => Some(entry),
        Err(source) => {
            warn!(%actor, %def, %source, "malformed duration entry, treating as absent");
            None
        }
    }
}

/// Write an actor's duration entry.
pub fn set_entry<H: Host>(
    host: &mut H,
    actor: ActorId,
    def: DefinitionId,
    entry: &DurationEntry,
) -> Result<(), EngineError> {
    let value = serde_json::to_value(entry).map_err(|source| EngineError::MalformedFlag {
        key: key(def),
        source,
    })?;
    host.set_flag(DocRef::Actor(actor), &key(def), value)?;
    Ok(())
}

/// Remove an actor's duration entry (re-arm).
pub fn remove_entry<H: Host>(
    host: &mut H,
    actor: ActorId,
    def: DefinitionId,
) -> Result<(), EngineError> {
    host.remove_flag(DocRef::Actor(actor), &key(def))?;
    Ok(())
}

/// Whether a definition's duration budget still permits application.
pub fn can_apply<H: Host>(host: &H, actor: ActorId, def: &EffectDefinition) -> bool {
    match def.duration {
        EffectDuration::Permanent => true,
        EffectDuration::EndOfCombat => match entry(host, actor, def.id).and_then(|e| e.combat) {
            // Lazy-bind: unbound entries apply and get stamped on use.
            None => true,
            Some(combat) => host.active_combat() == Some(combat),
        },
        EffectDuration::Once
        | EffectDuration::Uses(_)
        | EffectDuration::NextRoll
        | EffectDuration::NextDamage => match entry(host, actor, def.id).and_then(|e| e.remaining) {
            None => true,
            Some(remaining) => remaining > 0,
        },
        EffectDuration::Countdown { ticks, .. } => {
            match entry(host, actor, def.id).and_then(|e| e.remaining) {
                None => ticks > 0,
                Some(remaining) => remaining > 0,
            }
        }
    }
}

/// Consume one application of a definition's duration budget.
///
/// No-op for `Permanent` and for the persistent-status modifier type,
/// which tracks condition truth rather than usage. Countdowns consume via
/// [`tick_countdowns`], not per application. `EndOfCombat` stamps the
/// current encounter on first use instead of counting.
///
/// Attribute-gated effects on the holder's own writable resources consume
/// by nudging the resource just past the comparison threshold, so the
/// condition itself turns false and re-arms naturally when the resource
/// moves again. Everything else decrements `remaining`.
pub fn consume<H: Host>(
    host: &mut H,
    actor: ActorId,
    def: &EffectDefinition,
    kind: ApplicationKind,
) -> Result<(), EngineError> {
    if matches!(def.modifier.kind, ModifierKind::ApplyStatus { .. }) {
        return Ok(());
    }
    match def.duration {
        EffectDuration::Permanent | EffectDuration::Countdown { .. } => Ok(()),
        EffectDuration::EndOfCombat => {
            let mut state = entry(host, actor, def.id).unwrap_or_default();
            if state.combat.is_none() {
                if let Some(combat) = host.active_combat() {
                    state.combat = Some(combat);
                    set_entry(host, actor, def.id, &state)?;
                }
            }
            Ok(())
        }
        EffectDuration::Once
        | EffectDuration::Uses(_)
        | EffectDuration::NextRoll
        | EffectDuration::NextDamage => {
            if !def.duration.consumes_on(kind) {
                return Ok(());
            }
            if nudge_attribute(host, actor, def)? {
                return Ok(());
            }
            let mut state = entry(host, actor, def.id).unwrap_or_default();
            let remaining = state
                .remaining
                .or_else(|| def.duration.initial_remaining())
                .unwrap_or(1);
            state.remaining = Some(remaining.saturating_sub(1));
            debug!(%actor, def = %def.id, remaining = state.remaining, "consumed duration");
            set_entry(host, actor, def.id, &state)
        }
    }
}

/// Nudge a self writable-resource attribute just past its comparison
/// threshold so the gating condition turns false. Returns whether the
/// nudge strategy applied.
fn nudge_attribute<H: Host>(
    host: &mut H,
    actor: ActorId,
    def: &EffectDefinition,
) -> Result<bool, EngineError> {
    let Condition::Attribute {
        subject: Subject::SelfActor,
        attribute,
        operator,
        value,
    } = &def.condition
    else {
        return Ok(false);
    };
    let (attribute, operator, value) = (*attribute, *operator, *value);
    if !attribute.is_writable_resource() {
        return Ok(false);
    }
    let nudged = match operator {
        CompareOp::AtLeast => value - 1,
        CompareOp::AtMost | CompareOp::Equal => value + 1,
        CompareOp::Greater | CompareOp::Less => value,
    }
    .max(0);
    debug!(%actor, def = %def.id, ?attribute, nudged, "consuming via attribute nudge");
    host.set_resource(actor, attribute, nudged)?;
    Ok(true)
}

/// Tick every in-scope countdown whose tick event matches.
///
/// First tick initializes `remaining` from the template, then each tick
/// decrements by one, floored at zero. Returns the definitions that
/// changed so the caller can resync the persistent families.
pub fn tick_countdowns<H: Host>(
    host: &mut H,
    actor: ActorId,
    event: TickEvent,
    in_scope: &[EffectDefinition],
) -> Result<Vec<DefinitionId>, EngineError> {
    let mut changed = Vec::new();
    for def in in_scope {
        let EffectDuration::Countdown { ticks, tick_on } = def.duration else {
            continue;
        };
        if tick_on != event {
            continue;
        }
        let mut state = entry(host, actor, def.id).unwrap_or_default();
        let remaining = state.remaining.unwrap_or(ticks);
        if remaining == 0 {
            continue;
        }
        state.remaining = Some(remaining - 1);
        set_entry(host, actor, def.id, &state)?;
        changed.push(def.id);
    }
    Ok(changed)
}

/// Every definition ID with a persisted duration entry on the actor.
pub fn tracked_definitions<H: Host>(host: &H, actor: ActorId) -> Vec<DefinitionId> {
    host.flag_keys(DocRef::Actor(actor), flags::DURATION_PREFIX)
        .iter()
        .filter_map(|k| id_from_key(k))
        .collect()
}

/// Delete duration entries for definitions that left assignment scope.
pub fn prune_out_of_scope<H: Host>(
    host: &mut H,
    actor: ActorId,
    in_scope: impl Fn(DefinitionId) -> bool,
) -> Result<(), EngineError> {
    let removals: Vec<FlagWrite> = tracked_definitions(host, actor)
        .into_iter()
        .filter(|id| !in_scope(*id))
        .map(|id| FlagWrite::remove(key(id)))
        .collect();
    if !removals.is_empty() {
        host.write_flags(DocRef::Actor(actor), &removals)?;
    }
    Ok(())
}

/// Delete `EndOfCombat` entries bound to an encounter other than the
/// current one (or to any, when no encounter runs). Returns whether
/// anything was removed, so the caller knows to resync.
pub fn expire_combat_entries<H: Host>(
    host: &mut H,
    actor: ActorId,
    current: Option<CombatId>,
) -> Result<bool, EngineError> {
    let doc = DocRef::Actor(actor);
    let mut removals = Vec::new();
    for flag_key in host.flag_keys(doc, flags::DURATION_PREFIX) {
        let Some(Value::Object(map)) = host.get_flag(doc, &flag_key) else {
            continue;
        };
        let Some(bound) = map.get("combat").and_then(Value::as_u64) else {
            continue;
        };
        let bound = u32::try_from(bound).ok().map(CombatId::new);
        if bound != current {
            removals.push(FlagWrite::remove(flag_key));
        }
    }
    if removals.is_empty() {
        return Ok(false);
    }
    host.write_flags(doc, &removals)?;
    Ok(true)
}
