//! Chain processing.
//!
//! After a parent effect applies, its chained definitions are evaluated
//! against the same context and applied in turn. Chains may reference each
//! other; a depth bound makes cycles and runaway graphs terminate instead
//! of recursing forever. Chained application is fire-and-forget: on-hit
//! status/stress effects skip the confirmation prompt a primary on-hit
//! effect would show.

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::action::RollState;
use crate::catalog::{ApplicationKind, EffectCatalog, EffectDefinition, ModifierKind};
use crate::condition::{evaluate, EvalContext};
use crate::core::{ActorId, EngineConfig, EngineError};
use crate::host::Host;
use crate::state::{duration, trigger};

/// Fire a parent definition's chain.
///
/// Each chained definition is independent: declared order is walked but
/// has no semantic significance, and one failing link does not stop its
/// siblings. Actors whose persistent families were touched are collected
/// into `resync` for the caller to reconcile afterwards.
pub fn process_chains<H: Host>(
    host: &mut H,
    catalog: &EffectCatalog,
    config: &EngineConfig,
    actor: ActorId,
    parent: &EffectDefinition,
    ctx: &EvalContext,
    kind: ApplicationKind,
    roll: Option<&mut RollState>,
    resync: &mut FxHashSet<ActorId>,
) -> Result<(), EngineError> {
    process_at_depth(host, catalog, config, actor, parent, ctx, kind, roll, resync, 0)
}

#[allow(clippy::too_many_arguments)]
fn process_at_depth<H: Host>(
    host: &mut H,
    catalog: &EffectCatalog,
    config: &EngineConfig,
    actor: ActorId,
    parent: &EffectDefinition,
    ctx: &EvalContext,
    kind: ApplicationKind,
    mut roll: Option<&mut RollState>,
    resync: &mut FxHashSet<ActorId>,
    depth: u8,
) -> Result<(), EngineError> {
    if depth >= config.max_chain_depth {
        warn!(%actor, parent = %parent.id, depth, "chain depth limit reached, stopping");
        return Ok(());
    }
    for chained_id in &parent.modifier.chain {
        let Some(def) = catalog.get(*chained_id) else {
            debug!(%actor, def = %chained_id, "chained definition no longer exists, skipping");
            continue;
        };
        if !def.enabled || !duration::can_apply(host, actor, def) {
            continue;
        }
        if !evaluate(host, &config.bands, &def.condition, ctx) {
            continue;
        }

        apply_chained(host, actor, def, ctx, roll.as_deref_mut(), resync)?;

        duration::consume(host, actor, def, kind)?;
        if let Some((subject, trigger_kind)) = def.condition.trigger_kind() {
            if let Some(subject_actor) = ctx.resolve(subject) {
                trigger::clear(host, subject_actor, trigger_kind)?;
            }
        }

        process_at_depth(
            host,
            catalog,
            config,
            actor,
            def,
            ctx,
            kind,
            roll.as_deref_mut(),
            resync,
            depth + 1,
        )?;
    }
    Ok(())
}

/// Apply one chained definition's modifier immediately.
fn apply_chained<H: Host>(
    host: &mut H,
    actor: ActorId,
    def: &EffectDefinition,
    ctx: &EvalContext,
    roll: Option<&mut RollState>,
    resync: &mut FxHashSet<ActorId>,
) -> Result<(), EngineError> {
    match &def.modifier.kind {
        ModifierKind::RollBonus {
            bonus,
            trait_filter,
            action_filter,
        } => {
            if let Some(roll) = roll {
                if trait_filter.matches(roll.rolled_trait) && action_filter.matches(roll.kind) {
                    roll.push_modifier(def.name.clone(), *bonus);
                }
            }
        }
        ModifierKind::Advantage {
            trait_filter,
            action_filter,
        } => {
            if let Some(roll) = roll {
                if trait_filter.matches(roll.rolled_trait) && action_filter.matches(roll.kind) {
                    roll.advantage.grant_advantage();
                }
            }
        }
        ModifierKind::Disadvantage {
            trait_filter,
            action_filter,
        } => {
            if let Some(roll) = roll {
                if trait_filter.matches(roll.rolled_trait) && action_filter.matches(roll.kind) {
                    roll.advantage.force_disadvantage();
                }
            }
        }
        // Fire-and-forget on the contextual target, no prompt.
        ModifierKind::StatusOnHit { status } => {
            if let Some(target) = ctx.target {
                host.toggle_status(target, status, true)?;
            }
        }
        ModifierKind::StressOnHit { amount } => {
            if let Some(target) = ctx.target {
                host.apply_stress(target, *amount)?;
            }
        }
        // Persistent kinds reconcile through their family's sync loop.
        ModifierKind::DefenseBonus { .. }
        | ModifierKind::ThresholdBonus { .. }
        | ModifierKind::ProficiencyBonus { .. }
        | ModifierKind::ApplyStatus { .. } => {
            resync.insert(actor);
        }
        // Damage-formula kinds need an in-flight damage computation, which
        // a chain fired outside damage resolution does not have.
        ModifierKind::DamageBonus { .. } | ModifierKind::DamageMultiplier { .. } => {
            debug!(%actor, def = %def.id, "chained damage modifier outside damage resolution, skipping");
        }
    }
    Ok(())
}
