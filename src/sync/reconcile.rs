//! The reconciliation pass.
//!
//! For one (actor, modifier family): compute the desired applied-modifier
//! set from scope, conditions, and duration budgets, diff it against the
//! live records, and emit the minimal delete/create operations. Records
//! that already match are left untouched to avoid churn.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::catalog::{
    AppliedPayload, ApplyTo, EffectCatalog, EffectDefinition, EffectDuration, ModifierFamily,
};
use crate::condition::{evaluate, EvalContext};
use crate::core::{ActorId, DefinitionId, EngineConfig, EngineError, HostError};
use crate::host::Host;
use crate::scope::resolve_in_scope;
use crate::state::duration;

/// Per-(actor, family) condition results from the previous pass, used by
/// the re-arm rule to spot false-to-true transitions.
pub type PrevConditions = FxHashMap<(ActorId, ModifierFamily), FxHashMap<DefinitionId, bool>>;

/// What a pass did, for logging and follow-up scheduling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub created: usize,
    pub deleted: usize,
    /// A deletion raced with an external removal; the caller owes the
    /// actor a follow-up resync.
    pub needs_followup: bool,
}

impl SyncOutcome {
    /// Whether the pass changed anything.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.created > 0 || self.deleted > 0
    }
}

/// Run one reconciliation pass for an actor and family.
///
/// `attacker` supplies the contextual opposing actor during an active
/// roll: it enables `Incoming`-applying definitions and resolves
/// attacker-subject range conditions. Outside a roll it is `None` and
/// incoming definitions simply reconcile away.
pub fn sync_family<H: Host>(
    host: &mut H,
    catalog: &EffectCatalog,
    config: &EngineConfig,
    prev: &mut PrevConditions,
    actor: ActorId,
    family: ModifierFamily,
    attacker: Option<ActorId>,
) -> Result<SyncOutcome, EngineError> {
    let in_scope = resolve_in_scope(host, catalog, actor);
    let scope_ids: FxHashSet<DefinitionId> = in_scope.iter().map(|d| d.id).collect();
    duration::prune_out_of_scope(host, actor, |id| scope_ids.contains(&id))?;

    let family_defs: Vec<&EffectDefinition> = in_scope
        .iter()
        .filter(|def| def.modifier.kind.family() == Some(family))
        .filter(|def| match def.modifier.apply_to {
            ApplyTo::SelfActor => true,
            ApplyTo::Incoming => attacker.is_some(),
        })
        .collect();

    let mut ctx = EvalContext::new(actor);
    ctx.target = attacker;

    // Conditions are evaluated for every in-scope definition, not just
    // this family's: the re-arm rule also resets exhausted transient
    // effects, which belong to no family.
    let mut condition_met: FxHashMap<DefinitionId, bool> = FxHashMap::default();
    for def in &in_scope {
        condition_met.insert(def.id, evaluate(host, &config.bands, &def.condition, &ctx));
    }

    let existing = host.applied_records(actor);
    let live_sources: FxHashSet<DefinitionId> = existing.iter().map(|r| r.source).collect();

    rearm(
        host,
        actor,
        family,
        &in_scope,
        &condition_met,
        &live_sources,
        prev.get(&(actor, family)),
    )?;

    let mut desired: FxHashMap<DefinitionId, AppliedPayload> = FxHashMap::default();
    for def in &family_defs {
        if !condition_met[&def.id] {
            continue;
        }
        if !duration::can_apply(host, actor, def) {
            continue;
        }
        // Zero-magnitude modifiers have no payload and never materialize.
        if let Some(payload) = def.modifier.kind.payload() {
            desired.insert(def.id, payload);
        }
    }

    let mut outcome = SyncOutcome::default();
    let mut seen: FxHashSet<DefinitionId> = FxHashSet::default();
    for record in existing.iter().filter(|r| r.payload.family() == family) {
        // One record per source; duplicates and mismatches are deleted,
        // exact matches are kept untouched.
        let keep = desired.get(&record.source) == Some(&record.payload)
            && seen.insert(record.source);
        if keep {
            continue;
        }
        match host.delete_record(actor, record.id) {
            Ok(()) => outcome.deleted += 1,
            Err(HostError::StaleRecord { .. }) => {
                warn!(%actor, record = %record.id, "record vanished mid-sync, scheduling followup");
                outcome.needs_followup = true;
            }
            Err(err) => return Err(err.into()),
        }
    }

    for (def_id, payload) in &desired {
        if seen.contains(def_id) {
            continue;
        }
        host.create_record(actor, *def_id, payload.clone())?;
        outcome.created += 1;
    }

    stamp_combat(host, actor, &family_defs, &desired)?;

    prev.insert((actor, family), condition_met);
    if outcome.changed() {
        debug!(
            %actor,
            ?family,
            created = outcome.created,
            deleted = outcome.deleted,
            "reconciled"
        );
    }
    Ok(outcome)
}

/// Delete exhausted duration entries that qualify for re-arm, so the
/// effect can fire again. An exhausted entry re-arms when the definition's
/// condition turned false, or when the condition holds but no live record
/// backs it (it was consumed while the condition stayed continuously
/// true), or on a false-to-true transition since the previous pass.
fn rearm<H: Host>(
    host: &mut H,
    actor: ActorId,
    family: ModifierFamily,
    defs: &[EffectDefinition],
    condition_met: &FxHashMap<DefinitionId, bool>,
    live_sources: &FxHashSet<DefinitionId>,
    prev: Option<&FxHashMap<DefinitionId, bool>>,
) -> Result<(), EngineError> {
    for def in defs {
        if matches!(def.duration, EffectDuration::Permanent | EffectDuration::EndOfCombat) {
            continue;
        }
        let Some(entry) = duration::entry(host, actor, def.id) else {
            continue;
        };
        if entry.remaining != Some(0) {
            continue;
        }
        let met = condition_met[&def.id];
        let was_met = prev.and_then(|p| p.get(&def.id)).copied();
        let rearm = !met
            || !live_sources.contains(&def.id)
            || was_met == Some(false);
        if rearm {
            debug!(%actor, def = %def.id, ?family, "re-arming exhausted duration");
            duration::remove_entry(host, actor, def.id)?;
        }
    }
    Ok(())
}

/// Retroactively bind the active encounter onto desired-and-live
/// `EndOfCombat` definitions that predate combat start.
fn stamp_combat<H: Host>(
    host: &mut H,
    actor: ActorId,
    defs: &[&EffectDefinition],
    desired: &FxHashMap<DefinitionId, AppliedPayload>,
) -> Result<(), EngineError> {
    let Some(combat) = host.active_combat() else {
        return Ok(());
    };
    for def in defs {
        if def.duration != EffectDuration::EndOfCombat || !desired.contains_key(&def.id) {
            continue;
        }
        if duration::entry(host, actor, def.id).is_none() {
            duration::set_entry(
                host,
                actor,
                def.id,
                &duration::DurationEntry {
                    remaining: None,
                    combat: Some(combat),
                },
            )?;
        }
    }
    Ok(())
}
