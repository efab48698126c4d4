//! The engine facade.
//!
//! [`Engine`] owns the catalog, the reconciliation machinery, and all
//! cross-event caches, and exposes one entry point per host lifecycle
//! event. Every entry point catches and logs its own failures: a panic or
//! propagated error inside a host event dispatch would break the host for
//! every other consumer, so the worst allowed outcome is "effect did not
//! apply this time".

use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error};

use crate::action::{DamagePool, DamageState, RollOutcome, RollState};
use crate::catalog::{
    ApplicationKind, AppliedPayload, ApplyTo, AttributeId, Condition, DamageType, EffectCatalog,
    EffectDefinition, ModifierFamily, ModifierKind, ThresholdTier, TickEvent, TriggerKind,
};
use crate::chain::process_chains;
use crate::condition::{evaluate, EvalContext};
use crate::core::{ActorId, EngineConfig, EngineError};
use crate::host::Host;
use crate::scope::resolve_in_scope;
use crate::state::{duration, trigger};
use crate::sync::{sync_family, MoveDebouncer, PrevConditions, SyncGate};

use super::attacker::AttackerCache;

/// Pre-update snapshot used by the resource-spend inference pair.
#[derive(Clone, Copy, Debug)]
struct BeforeSnapshot {
    hope: Option<i64>,
    armor_marked: Option<u32>,
}

/// The reconciliation engine, wired between a host and an effect catalog.
pub struct Engine<H: Host> {
    host: H,
    catalog: EffectCatalog,
    config: EngineConfig,
    gate: SyncGate,
    prev: PrevConditions,
    attackers: AttackerCache,
    before: FxHashMap<ActorId, BeforeSnapshot>,
    debounce: MoveDebouncer,
    /// Targets given an attacker-aware resync during the current roll;
    /// reverted to attacker-less evaluation in the post-roll hook.
    attacker_synced: Vec<ActorId>,
}

impl<H: Host> Engine<H> {
    #[must_use]
    pub fn new(host: H, catalog: EffectCatalog) -> Self {
        Self::with_config(host, catalog, EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(host: H, catalog: EffectCatalog, config: EngineConfig) -> Self {
        Self {
            host,
            catalog,
            gate: SyncGate::new(),
            prev: PrevConditions::default(),
            attackers: AttackerCache::new(config.attacker_window),
            before: FxHashMap::default(),
            debounce: MoveDebouncer::new(config.move_debounce),
            attacker_synced: Vec::new(),
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    /// Mutable catalog access for the authoring layer. Definition edits
    /// take effect on the next reconciliation.
    pub fn catalog_mut(&mut self) -> &mut EffectCatalog {
        &mut self.catalog
    }

    /// The definitions currently in scope for an actor.
    #[must_use]
    pub fn in_scope(&self, actor: ActorId) -> Vec<EffectDefinition> {
        resolve_in_scope(&self.host, &self.catalog, actor)
    }

    /// Evaluate a condition in an ad-hoc context (authoring preview).
    #[must_use]
    pub fn evaluate_condition(&self, condition: &Condition, ctx: &EvalContext) -> bool {
        evaluate(&self.host, &self.config.bands, condition, ctx)
    }

    // ── Hook entry points ───────────────────────────────────────────────

    /// An attack/duality roll is being assembled.
    pub fn pre_roll(&mut self, roll: &mut RollState) {
        if let Err(err) = self.try_pre_roll(roll) {
            error!(%err, actor = %roll.actor, "pre-roll hook failed");
        }
    }

    /// The roll's dice have landed and hit/miss is resolved.
    pub fn post_roll(&mut self, roll: &RollState) {
        if let Err(err) = self.try_post_roll(roll) {
            error!(%err, actor = %roll.actor, "post-roll hook failed");
        }
    }

    /// Damage formula assembly: append bonus dice to matching parts.
    pub fn pre_damage_roll(&mut self, damage: &mut DamageState) {
        if let Err(err) = self.try_pre_damage_roll(damage) {
            error!(%err, "damage-formula hook failed");
        }
    }

    /// Defender is about to take the rolled damage: apply multipliers.
    pub fn pre_take_damage(&mut self, defender: ActorId, damage: &mut DamageState) {
        if let Err(err) = self.try_pre_take_damage(defender, damage) {
            error!(%err, %defender, "pre-take-damage hook failed");
        }
    }

    /// Damage has been applied to the defender's pools.
    pub fn post_take_damage(&mut self, defender: ActorId, hp_loss: i64) {
        self.post_take_damage_at(defender, hp_loss, Instant::now());
    }

    /// Clock-injectable variant of [`Self::post_take_damage`].
    pub fn post_take_damage_at(&mut self, defender: ActorId, hp_loss: i64, now: Instant) {
        if let Err(err) = self.try_post_take_damage(defender, hp_loss, now) {
            error!(%err, %defender, "post-take-damage hook failed");
        }
    }

    /// Hit application finished: fire on-hit effects and remember the
    /// attacker for later damage attribution.
    pub fn post_apply_damage(&mut self, damage: &DamageState) {
        self.post_apply_damage_at(damage, Instant::now());
    }

    /// Clock-injectable variant of [`Self::post_apply_damage`].
    pub fn post_apply_damage_at(&mut self, damage: &DamageState, now: Instant) {
        if let Err(err) = self.try_post_apply_damage(damage, now) {
            error!(%err, "post-apply-damage hook failed");
        }
    }

    /// A combat encounter started: activate newly-eligible effects.
    pub fn combat_started(&mut self) {
        for actor in self.host.all_actors() {
            if let Err(err) = self.resync_all(actor) {
                error!(%err, %actor, "combat-start resync failed");
            }
        }
    }

    /// A combat encounter changed or ended: expire bound durations.
    pub fn combat_changed(&mut self) {
        let current = self.host.active_combat();
        for actor in self.host.all_actors() {
            let result = duration::expire_combat_entries(&mut self.host, actor, current)
                .and_then(|expired| if expired { self.resync_all(actor) } else { Ok(()) });
            if let Err(err) = result {
                error!(%err, %actor, "combat-change cleanup failed");
            }
        }
    }

    /// The named actor's combat turn started.
    pub fn turn_advanced(&mut self, actor: ActorId) {
        if let Err(err) = self.tick_and_resync(actor, TickEvent::RoundStart) {
            error!(%err, %actor, "turn-advance hook failed");
        }
    }

    /// Pre half of the actor-update pair: snapshot spend-inference inputs.
    pub fn actor_pre_update(&mut self, actor: ActorId) {
        let snapshot = BeforeSnapshot {
            hope: self.host.attribute(actor, AttributeId::Hope),
            armor_marked: self.host.armor_marks(actor).map(|(marked, _)| marked),
        };
        self.before.insert(actor, snapshot);
    }

    /// Post half of the actor-update pair: infer spend/mark triggers and
    /// resync (attribute conditions may have flipped).
    pub fn actor_updated(&mut self, actor: ActorId) {
        if let Err(err) = self.try_actor_updated(actor) {
            error!(%err, %actor, "actor-update hook failed");
        }
    }

    /// An item's equip/vault state changed; its owner's scope may differ.
    pub fn item_updated(&mut self, owner: ActorId) {
        if let Err(err) = self.resync_all(owner) {
            error!(%err, %owner, "item-update resync failed");
        }
    }

    /// An applied-modifier record was deleted outside the sync loops.
    pub fn active_effect_deleted(&mut self, actor: ActorId) {
        if let Err(err) = self.resync_all(actor) {
            error!(%err, %actor, "external record deletion resync failed");
        }
    }

    /// A token moved on the active scene.
    pub fn token_moved(&mut self, now: Instant) {
        self.debounce.note(now);
    }

    /// The user's target selection changed.
    pub fn targets_changed(&mut self, now: Instant) {
        self.debounce.note(now);
    }

    /// Flush the movement debounce if its quiet window elapsed, rescanning
    /// only actors that carry at least one range-conditioned definition.
    pub fn process_pending_moves(&mut self, now: Instant) {
        if !self.debounce.flush_due(now) {
            return;
        }
        for actor in self.host.all_actors() {
            let has_range = self
                .in_scope(actor)
                .iter()
                .any(|def| matches!(def.condition, Condition::Range { .. }));
            if !has_range {
                continue;
            }
            if let Err(err) = self.resync_all(actor) {
                error!(%err, %actor, "movement rescan failed");
            }
        }
    }

    // ── Pre-roll ────────────────────────────────────────────────────────

    fn try_pre_roll(&mut self, roll: &mut RollState) -> Result<(), EngineError> {
        let actor = roll.actor;
        let mut ctx = EvalContext::new(actor);
        ctx.target = roll.targets.first().map(|t| t.actor);
        ctx.acting_item = roll.item;
        let mut resync: FxHashSet<ActorId> = FxHashSet::default();

        let defs = self.in_scope(actor);
        for def in &defs {
            if def.modifier.apply_to == ApplyTo::SelfActor && def.modifier.kind.is_roll_type() {
                self.apply_roll_modifier(actor, def, &ctx, roll, &mut resync)?;
            }
        }

        // Incoming roll-type modifiers held by each target, roles swapped.
        let target_actors: Vec<ActorId> = roll.targets.iter().map(|t| t.actor).collect();
        for target in &target_actors {
            let held = self.in_scope(*target);
            let swapped = EvalContext::new(*target).with_target(actor);
            for def in &held {
                if def.modifier.apply_to == ApplyTo::Incoming && def.modifier.kind.is_roll_type() {
                    self.apply_roll_modifier(*target, def, &swapped, roll, &mut resync)?;
                }
            }
        }

        // Non-roll definitions whose condition independently holds still
        // fire their chains during the roll.
        for def in &defs {
            if def.modifier.kind.is_roll_type() || def.modifier.chain.is_empty() {
                continue;
            }
            if duration::can_apply(&self.host, actor, def)
                && evaluate(&self.host, &self.config.bands, &def.condition, &ctx)
            {
                let (host, catalog, config) = (&mut self.host, &self.catalog, &self.config);
                process_chains(
                    host,
                    catalog,
                    config,
                    actor,
                    def,
                    &ctx,
                    ApplicationKind::Roll,
                    Some(roll),
                    &mut resync,
                )?;
            }
        }

        // Attacker-aware resync on each target, plus a direct defense
        // patch: the host's hit check runs synchronously, before the
        // record reconciliation could possibly land.
        for target in roll.targets.iter_mut() {
            let delta = self.defense_delta(target.actor, actor);
            if delta != 0 {
                if let Some(defense) = target.defense.as_mut() {
                    debug!(target = %target.actor, delta, "patching snapshotted defense");
                    *defense += delta;
                }
            }
        }
        for target in &target_actors {
            for family in ModifierFamily::ALL {
                self.resync_family(*target, family, Some(actor))?;
            }
            self.attacker_synced.push(*target);
        }

        for touched in resync {
            self.resync_all(touched)?;
        }
        Ok(())
    }

    /// Apply one roll-type modifier held by `holder` to the in-flight roll.
    fn apply_roll_modifier(
        &mut self,
        holder: ActorId,
        def: &EffectDefinition,
        ctx: &EvalContext,
        roll: &mut RollState,
        resync: &mut FxHashSet<ActorId>,
    ) -> Result<(), EngineError> {
        if !duration::can_apply(&self.host, holder, def) {
            return Ok(());
        }
        if !evaluate(&self.host, &self.config.bands, &def.condition, ctx) {
            return Ok(());
        }
        let applied = match &def.modifier.kind {
            ModifierKind::RollBonus {
                bonus,
                trait_filter,
                action_filter,
            } => {
                let fits = *bonus != 0
                    && trait_filter.matches(roll.rolled_trait)
                    && action_filter.matches(roll.kind);
                if fits {
                    roll.push_modifier(def.name.clone(), *bonus);
                }
                fits
            }
            ModifierKind::Advantage {
                trait_filter,
                action_filter,
            } => {
                let fits =
                    trait_filter.matches(roll.rolled_trait) && action_filter.matches(roll.kind);
                if fits {
                    roll.advantage.grant_advantage();
                }
                fits
            }
            ModifierKind::Disadvantage {
                trait_filter,
                action_filter,
            } => {
                let fits =
                    trait_filter.matches(roll.rolled_trait) && action_filter.matches(roll.kind);
                if fits {
                    roll.advantage.force_disadvantage();
                }
                fits
            }
            _ => false,
        };
        if !applied {
            return Ok(());
        }
        duration::consume(&mut self.host, holder, def, ApplicationKind::Roll)?;
        self.clear_condition_trigger(def, ctx)?;
        process_chains(
            &mut self.host,
            &self.catalog,
            &self.config,
            holder,
            def,
            ctx,
            ApplicationKind::Roll,
            Some(roll),
            resync,
        )
    }

    /// Difference between the defense bonus the target should have under
    /// attacker-aware evaluation and the bonus its live records carry.
    fn defense_delta(&self, target: ActorId, attacker: ActorId) -> i64 {
        let ctx = EvalContext::new(target).with_target(attacker);
        let mut desired = 0;
        for def in self.in_scope(target) {
            if def.modifier.kind.family() != Some(ModifierFamily::Defense) {
                continue;
            }
            if !duration::can_apply(&self.host, target, &def) {
                continue;
            }
            if !evaluate(&self.host, &self.config.bands, &def.condition, &ctx) {
                continue;
            }
            if let Some(AppliedPayload::Defense { bonus }) = def.modifier.kind.payload() {
                desired += bonus;
            }
        }
        let live: i64 = self
            .host
            .applied_records(target)
            .iter()
            .filter_map(|r| match r.payload {
                AppliedPayload::Defense { bonus } => Some(bonus),
                _ => None,
            })
            .sum();
        desired - live
    }

    // ── Post-roll ───────────────────────────────────────────────────────

    fn try_post_roll(&mut self, roll: &RollState) -> Result<(), EngineError> {
        let actor = roll.actor;
        match roll.outcome {
            Some(RollOutcome::WithFear) => {
                trigger::mark(&mut self.host, actor, TriggerKind::RolledFear, 1)?;
            }
            Some(RollOutcome::Critical) => {
                trigger::mark(&mut self.host, actor, TriggerKind::RolledCritical, 1)?;
            }
            _ => {}
        }

        // The hit/miss check is resolved: consume defense bonuses that
        // gated it on each target.
        for target in roll.targets.iter().map(|t| t.actor) {
            let ctx = EvalContext::new(target).with_target(actor);
            for def in self.in_scope(target) {
                if def.modifier.kind.family() != Some(ModifierFamily::Defense) {
                    continue;
                }
                if duration::can_apply(&self.host, target, &def)
                    && evaluate(&self.host, &self.config.bands, &def.condition, &ctx)
                {
                    duration::consume(&mut self.host, target, &def, ApplicationKind::Roll)?;
                }
            }
        }

        // Revert attacker-aware syncs so transient proximity-to-attacker
        // effects do not linger past the roll.
        let synced = std::mem::take(&mut self.attacker_synced);
        for target in synced {
            self.resync_all(target)?;
        }

        self.tick_and_resync(actor, TickEvent::OnRoll)?;
        // Freshly-marked triggers may satisfy persistent conditions.
        self.resync_all(actor)
    }

    // ── Damage pipeline ─────────────────────────────────────────────────

    fn try_pre_damage_roll(&mut self, damage: &mut DamageState) -> Result<(), EngineError> {
        let Some(attacker) = damage.source else {
            return Ok(());
        };
        let mut resync: FxHashSet<ActorId> = FxHashSet::default();

        let ctx = {
            let mut ctx = EvalContext::new(attacker);
            ctx.target = damage.targets.first().map(|t| t.actor);
            ctx
        };
        let defs = self.in_scope(attacker);
        for def in &defs {
            if def.modifier.apply_to == ApplyTo::SelfActor {
                self.apply_damage_bonus(attacker, def, &ctx, damage, &mut resync)?;
            }
        }

        // Incoming damage bonuses (vulnerabilities) held by the targets.
        let target_actors: Vec<ActorId> = damage.targets.iter().map(|t| t.actor).collect();
        for target in target_actors {
            let swapped = EvalContext::new(target)
                .with_target(attacker)
                .with_incoming_types(damage.all_types());
            let held = self.in_scope(target);
            for def in &held {
                if def.modifier.apply_to == ApplyTo::Incoming {
                    self.apply_damage_bonus(target, def, &swapped, damage, &mut resync)?;
                }
            }
        }

        for touched in resync {
            self.resync_all(touched)?;
        }
        Ok(())
    }

    /// Append one damage bonus to every matching part. Duration is
    /// consumed once per resolution even when several parts matched.
    fn apply_damage_bonus(
        &mut self,
        holder: ActorId,
        def: &EffectDefinition,
        ctx: &EvalContext,
        damage: &mut DamageState,
        resync: &mut FxHashSet<ActorId>,
    ) -> Result<(), EngineError> {
        let ModifierKind::DamageBonus {
            dice,
            bonus,
            damage_type,
        } = &def.modifier.kind
        else {
            return Ok(());
        };
        let Some(formula) = bonus_formula(dice, *bonus) else {
            return Ok(());
        };
        if !duration::can_apply(&self.host, holder, def) {
            return Ok(());
        }
        if !evaluate(&self.host, &self.config.bands, &def.condition, ctx) {
            return Ok(());
        }
        let mut applied = false;
        for part in damage.parts.iter_mut() {
            if !bonus_matches_part(*damage_type, part.pool, &part.tags) {
                continue;
            }
            part.append_formula(&formula);
            // Surface the bonus type to later type-conditional incoming
            // effects, preserving the collection's shape.
            if damage_type.merges_into_tags() {
                part.tags.merge(*damage_type);
            }
            applied = true;
        }
        if !applied {
            return Ok(());
        }
        debug!(%holder, def = %def.id, formula, "damage bonus applied");
        duration::consume(&mut self.host, holder, def, ApplicationKind::Damage)?;
        self.clear_condition_trigger(def, ctx)?;
        process_chains(
            &mut self.host,
            &self.catalog,
            &self.config,
            holder,
            def,
            ctx,
            ApplicationKind::Damage,
            None,
            resync,
        )
    }

    fn try_pre_take_damage(
        &mut self,
        defender: ActorId,
        damage: &mut DamageState,
    ) -> Result<(), EngineError> {
        let attacker = damage.source;
        let mut resync: FxHashSet<ActorId> = FxHashSet::default();
        let defs = self.in_scope(defender);
        for def in &defs {
            let ModifierKind::DamageMultiplier { factor, incoming } = def.modifier.kind else {
                continue;
            };
            if (factor - 1.0).abs() < f64::EPSILON {
                continue;
            }
            if !duration::can_apply(&self.host, defender, def) {
                continue;
            }
            let mut applied = false;
            for part in damage.parts.iter_mut() {
                let mut ctx = EvalContext::new(defender).with_incoming_types(part.tags.as_set());
                ctx.target = attacker;
                if !evaluate(&self.host, &self.config.bands, &def.condition, &ctx) {
                    continue;
                }
                if !incoming.matches(&part.tags) {
                    continue;
                }
                let multiplied = (part.total as f64 * factor).ceil() as i64;
                debug!(%defender, def = %def.id, from = part.total, to = multiplied, "damage multiplied");
                part.total = multiplied;
                applied = true;
            }
            if !applied {
                continue;
            }
            duration::consume(&mut self.host, defender, def, ApplicationKind::Damage)?;
            let mut chain_ctx =
                EvalContext::new(defender).with_incoming_types(damage.all_types());
            chain_ctx.target = attacker;
            self.clear_condition_trigger(def, &chain_ctx)?;
            process_chains(
                &mut self.host,
                &self.catalog,
                &self.config,
                defender,
                def,
                &chain_ctx,
                ApplicationKind::Damage,
                None,
                &mut resync,
            )?;
        }
        for touched in resync {
            self.resync_all(touched)?;
        }
        Ok(())
    }

    fn try_post_take_damage(
        &mut self,
        defender: ActorId,
        hp_loss: i64,
        now: Instant,
    ) -> Result<(), EngineError> {
        if let Some(tier) = self.classify_threshold(defender, hp_loss) {
            for marked in tiers_up_to(tier) {
                trigger::mark(
                    &mut self.host,
                    defender,
                    TriggerKind::TookThreshold(marked),
                    hp_loss,
                )?;
            }
            if let Some(attacker) = self.attackers.take(defender, now) {
                for marked in tiers_up_to(tier) {
                    trigger::mark(
                        &mut self.host,
                        attacker,
                        TriggerKind::InflictedThreshold(marked),
                        hp_loss,
                    )?;
                }
                self.resync_all(attacker)?;
            }
        }

        // Threshold bonuses gated this hit's classification; consume them.
        let ctx = EvalContext::new(defender);
        for def in self.in_scope(defender) {
            if def.modifier.kind.family() != Some(ModifierFamily::Threshold) {
                continue;
            }
            if duration::can_apply(&self.host, defender, &def)
                && evaluate(&self.host, &self.config.bands, &def.condition, &ctx)
            {
                duration::consume(&mut self.host, defender, &def, ApplicationKind::Damage)?;
            }
        }

        let scope = self.in_scope(defender);
        duration::tick_countdowns(&mut self.host, defender, TickEvent::OnDamage, &scope)?;
        duration::tick_countdowns(&mut self.host, defender, TickEvent::OnAttacked, &scope)?;
        self.resync_all(defender)
    }

    fn try_post_apply_damage(
        &mut self,
        damage: &DamageState,
        now: Instant,
    ) -> Result<(), EngineError> {
        let Some(attacker) = damage.source else {
            return Ok(());
        };
        let hits: Vec<ActorId> = damage.hit_targets().collect();
        for hit in &hits {
            self.attackers.note(*hit, attacker, now);
        }
        if hits.is_empty() {
            return Ok(());
        }

        let mut resync: FxHashSet<ActorId> = FxHashSet::default();
        let ctx = EvalContext::new(attacker)
            .with_target(hits[0])
            .with_incoming_types(damage.all_types());
        for def in self.in_scope(attacker) {
            if def.modifier.apply_to != ApplyTo::SelfActor {
                continue;
            }
            let application: Option<OnHit> = match &def.modifier.kind {
                ModifierKind::StatusOnHit { status } => Some(OnHit::Status(status.clone())),
                ModifierKind::StressOnHit { amount } if *amount != 0 => {
                    Some(OnHit::Stress(*amount))
                }
                _ => None,
            };
            let Some(application) = application else {
                continue;
            };
            if !duration::can_apply(&self.host, attacker, &def) {
                continue;
            }
            if !evaluate(&self.host, &self.config.bands, &def.condition, &ctx) {
                continue;
            }
            // A declined prompt skips this application entirely: no side
            // effects, no duration consumed.
            if !self.host.confirm(&def.name, &def.description) {
                continue;
            }
            for hit in &hits {
                match &application {
                    OnHit::Status(status) => self.host.toggle_status(*hit, status, true)?,
                    OnHit::Stress(amount) => self.host.apply_stress(*hit, *amount)?,
                }
                resync.insert(*hit);
            }
            duration::consume(&mut self.host, attacker, &def, ApplicationKind::Damage)?;
            self.clear_condition_trigger(&def, &ctx)?;
            process_chains(
                &mut self.host,
                &self.catalog,
                &self.config,
                attacker,
                &def,
                &ctx,
                ApplicationKind::Damage,
                None,
                &mut resync,
            )?;
        }
        for touched in resync {
            self.resync_all(touched)?;
        }
        Ok(())
    }

    // ── Actor/item updates ──────────────────────────────────────────────

    fn try_actor_updated(&mut self, actor: ActorId) -> Result<(), EngineError> {
        if let Some(before) = self.before.remove(&actor) {
            let hope_now = self.host.attribute(actor, AttributeId::Hope);
            if let (Some(was), Some(is)) = (before.hope, hope_now) {
                if is < was {
                    trigger::mark(&mut self.host, actor, TriggerKind::SpentHope, was - is)?;
                }
            }
            let marked_now = self.host.armor_marks(actor).map(|(marked, _)| marked);
            if let (Some(was), Some(is)) = (before.armor_marked, marked_now) {
                if is > was {
                    trigger::mark(
                        &mut self.host,
                        actor,
                        TriggerKind::ArmorSlotMarked,
                        i64::from(is - was),
                    )?;
                }
            }
        }
        self.resync_all(actor)
    }

    // ── Shared plumbing ─────────────────────────────────────────────────

    /// Clear the one-shot trigger a condition consumed, if any.
    fn clear_condition_trigger(
        &mut self,
        def: &EffectDefinition,
        ctx: &EvalContext,
    ) -> Result<(), EngineError> {
        if let Some((subject, kind)) = def.condition.trigger_kind() {
            if let Some(actor) = ctx.resolve(subject) {
                trigger::clear(&mut self.host, actor, kind)?;
            }
        }
        Ok(())
    }

    fn classify_threshold(&self, defender: ActorId, hp_loss: i64) -> Option<ThresholdTier> {
        if hp_loss <= 0 {
            return None;
        }
        let (major, severe) = self.host.damage_thresholds(defender)?;
        Some(if hp_loss >= severe {
            ThresholdTier::Severe
        } else if hp_loss >= major {
            ThresholdTier::Major
        } else {
            ThresholdTier::Minor
        })
    }

    fn tick_and_resync(&mut self, actor: ActorId, event: TickEvent) -> Result<(), EngineError> {
        let scope = self.in_scope(actor);
        let changed = duration::tick_countdowns(&mut self.host, actor, event, &scope)?;
        if !changed.is_empty() {
            self.resync_all(actor)?;
        }
        Ok(())
    }

    /// Reconcile every persistent family for an actor.
    pub fn resync_all(&mut self, actor: ActorId) -> Result<(), EngineError> {
        for family in ModifierFamily::ALL {
            self.resync_family(actor, family, None)?;
        }
        Ok(())
    }

    /// Reconcile one family, serialized through the reentrancy gate and
    /// drained to quiescence.
    pub fn resync_family(
        &mut self,
        actor: ActorId,
        family: ModifierFamily,
        attacker: Option<ActorId>,
    ) -> Result<(), EngineError> {
        if !self.gate.try_enter(actor, family) {
            // A pass is mid-flight; it will loop for us.
            return Ok(());
        }
        let mut followups: u8 = 0;
        let result = loop {
            match sync_family(
                &mut self.host,
                &self.catalog,
                &self.config,
                &mut self.prev,
                actor,
                family,
                attacker,
            ) {
                Ok(outcome) => {
                    if outcome.needs_followup && followups < 3 {
                        followups += 1;
                        continue;
                    }
                    if self.gate.take_dirty(actor, family) {
                        continue;
                    }
                    break Ok(());
                }
                Err(err) => break Err(err),
            }
        };
        self.gate.release(actor, family);
        result
    }
}

/// One on-hit application, resolved before prompting.
enum OnHit {
    Status(crate::catalog::StatusId),
    Stress(i64),
}

/// The formula fragment a damage bonus appends, `None` when both parts are
/// zero-magnitude.
fn bonus_formula(dice: &str, bonus: i64) -> Option<String> {
    match (dice.is_empty(), bonus) {
        (true, 0) => None,
        (true, b) => Some(b.to_string()),
        (false, 0) => Some(dice.to_string()),
        (false, b) => Some(format!("{dice} + {b}")),
    }
}

/// Whether a damage bonus of `ty` applies to a part.
///
/// Every current type is a broad category (weapon-slot and physical/
/// magical bonuses deliberately apply to any hit-points part); the
/// narrow-tag path stays for host systems that add concrete types.
fn bonus_matches_part(ty: DamageType, pool: DamagePool, tags: &crate::action::DamageTags) -> bool {
    if pool != DamagePool::HitPoints {
        return false;
    }
    ty.is_broad() || tags.is_empty() || tags.contains(ty)
}

/// The classified tier and every tier below it.
fn tiers_up_to(tier: ThresholdTier) -> impl Iterator<Item = ThresholdTier> {
    [
        ThresholdTier::Minor,
        ThresholdTier::Major,
        ThresholdTier::Severe,
    ]
    .into_iter()
    .filter(move |t| *t <= tier)
}
