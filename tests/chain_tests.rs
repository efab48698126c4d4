//! Chain processor integration tests: depth bound, fire-and-forget on-hit
//! behavior, and persistent-kind resync collection.

use rustc_hash::FxHashSet;

use effect_forge::action::RollState;
use effect_forge::catalog::{
    ApplicationKind, Condition, EffectCatalog, EffectDefinition, Modifier, ModifierFamily,
    ModifierKind, StatusId, Subject,
};
use effect_forge::chain::process_chains;
use effect_forge::condition::EvalContext;
use effect_forge::core::{ActorClass, ActorId, DefinitionId, EngineConfig};
use effect_forge::host::{Host, MemoryHost};
use effect_forge::scope::set_actor_assignment;
use effect_forge::sync::{sync_family, PrevConditions};

fn roll_bonus(bonus: i64) -> ModifierKind {
    ModifierKind::RollBonus {
        bonus,
        trait_filter: Default::default(),
        action_filter: Default::default(),
    }
}

fn fire(
    host: &mut MemoryHost,
    catalog: &EffectCatalog,
    actor: ActorId,
    parent: DefinitionId,
    roll: Option<&mut RollState>,
) -> FxHashSet<ActorId> {
    let mut resync = FxHashSet::default();
    let parent = catalog.get(parent).unwrap().clone();
    process_chains(
        host,
        catalog,
        &EngineConfig::default(),
        actor,
        &parent,
        &EvalContext::new(actor),
        ApplicationKind::Roll,
        roll,
        &mut resync,
    )
    .unwrap();
    resync
}

#[test]
fn empty_chain_is_a_no_op() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let parent = catalog.create(EffectDefinition::new("Solo", roll_bonus(1)));

    let mut roll = RollState::new(actor);
    let resync = fire(&mut host, &catalog, actor, parent, Some(&mut roll));
    assert!(roll.modifiers.is_empty());
    assert!(resync.is_empty());
}

/// Links past the depth limit are refused: with the default limit of 3, a
/// four-link chain applies exactly three bonuses.
#[test]
fn chain_depth_is_bounded() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();

    let c4 = catalog.create(EffectDefinition::new("Link 4", roll_bonus(8)));
    let c3 = catalog.create(
        EffectDefinition::new("Link 3", roll_bonus(4))
            .with_modifier(Modifier::new(roll_bonus(4)).with_chain(c4)),
    );
    let c2 = catalog.create(
        EffectDefinition::new("Link 2", roll_bonus(2))
            .with_modifier(Modifier::new(roll_bonus(2)).with_chain(c3)),
    );
    let c1 = catalog.create(
        EffectDefinition::new("Link 1", roll_bonus(1))
            .with_modifier(Modifier::new(roll_bonus(1)).with_chain(c2)),
    );
    let parent = catalog.create(
        EffectDefinition::new("Opener", roll_bonus(0))
            .with_modifier(Modifier::new(roll_bonus(0)).with_chain(c1)),
    );

    let mut roll = RollState::new(actor);
    fire(&mut host, &catalog, actor, parent, Some(&mut roll));
    assert_eq!(roll.modifiers.len(), 3);
    assert_eq!(roll.modifier_total(), 1 + 2 + 4);
}

/// A cycle terminates at the depth bound instead of recursing forever.
#[test]
fn chain_cycle_terminates() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();

    let a = catalog.create(EffectDefinition::new("A", roll_bonus(1)));
    let b = catalog.create(
        EffectDefinition::new("B", roll_bonus(1))
            .with_modifier(Modifier::new(roll_bonus(1)).with_chain(a)),
    );
    let mut def_a = catalog.get(a).unwrap().clone();
    def_a.modifier = Modifier::new(roll_bonus(1)).with_chain(b);
    catalog.update(a, def_a);

    let mut roll = RollState::new(actor);
    fire(&mut host, &catalog, actor, a, Some(&mut roll));
    assert_eq!(roll.modifiers.len(), 3);
}

/// Chained on-hit effects apply to the contextual target without a prompt.
#[test]
fn chained_on_hit_skips_prompt() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let target = host.add_actor(ActorClass::Adversary);
    let mut catalog = EffectCatalog::new();

    let burn = catalog.create(EffectDefinition::new(
        "Searing Follow-up",
        ModifierKind::StatusOnHit {
            status: StatusId::new("burning"),
        },
    ));
    let parent = catalog.create(
        EffectDefinition::new("Flame Strike", roll_bonus(1))
            .with_modifier(Modifier::new(roll_bonus(1)).with_chain(burn)),
    );

    let mut resync = FxHashSet::default();
    let parent_def = catalog.get(parent).unwrap().clone();
    process_chains(
        &mut host,
        &catalog,
        &EngineConfig::default(),
        actor,
        &parent_def,
        &EvalContext::new(actor).with_target(target),
        ApplicationKind::Roll,
        None,
        &mut resync,
    )
    .unwrap();

    assert!(host.has_status(target, &StatusId::new("burning")));
    assert!(host.prompts_shown().is_empty());
}

/// Chained persistent kinds are deferred to the sync loop via the resync
/// set rather than applied inline.
#[test]
fn chained_persistent_kind_requests_resync() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();

    let ward = catalog.create(EffectDefinition::new(
        "Ward",
        ModifierKind::DefenseBonus { bonus: 2 },
    ));
    set_actor_assignment(&mut host, actor, ward, true).unwrap();
    let parent = catalog.create(
        EffectDefinition::new("Opener", roll_bonus(1))
            .with_modifier(Modifier::new(roll_bonus(1)).with_chain(ward)),
    );

    let mut roll = RollState::new(actor);
    let resync = fire(&mut host, &catalog, actor, parent, Some(&mut roll));
    assert!(resync.contains(&actor));
    assert!(host.applied_records(actor).is_empty());

    sync_family(
        &mut host,
        &catalog,
        &EngineConfig::default(),
        &mut PrevConditions::default(),
        actor,
        ModifierFamily::Defense,
        None,
    )
    .unwrap();
    assert_eq!(host.applied_records(actor).len(), 1);
}

/// Disabled and condition-false links are skipped without stopping their
/// siblings.
#[test]
fn gated_links_are_skipped() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();

    let off = catalog.create(EffectDefinition::new("Off", roll_bonus(10)).disabled());
    let gated = catalog.create(EffectDefinition::new("Gated", roll_bonus(20)).with_condition(
        Condition::Status {
            subject: Subject::SelfActor,
            status: StatusId::new("bless"),
        },
    ));
    let live = catalog.create(EffectDefinition::new("Live", roll_bonus(3)));
    let parent = catalog.create(
        EffectDefinition::new("Opener", roll_bonus(0)).with_modifier(
            Modifier::new(roll_bonus(0))
                .with_chain(off)
                .with_chain(gated)
                .with_chain(live),
        ),
    );

    let mut roll = RollState::new(actor);
    fire(&mut host, &catalog, actor, parent, Some(&mut roll));
    assert_eq!(roll.modifier_total(), 3);
}

/// A dangling chain reference is skipped quietly.
#[test]
fn dangling_link_is_skipped() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();

    let ghost = catalog.create(EffectDefinition::new("Ghost", roll_bonus(5)));
    catalog.remove(ghost);
    let parent = catalog.create(
        EffectDefinition::new("Opener", roll_bonus(0))
            .with_modifier(Modifier::new(roll_bonus(0)).with_chain(ghost)),
    );

    let mut roll = RollState::new(actor);
    fire(&mut host, &catalog, actor, parent, Some(&mut roll));
    assert!(roll.modifiers.is_empty());
}
