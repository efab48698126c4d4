//! Reconciliation integration tests.
//!
//! Drive the sync pass directly against the in-memory host and verify the
//! live applied-modifier records always converge on the desired set.

use effect_forge::catalog::{
    AppliedPayload, Condition, EffectCatalog, EffectDefinition, ModifierFamily, ModifierKind,
    StatusId, Subject,
};
use effect_forge::core::{ActorClass, ActorId, DefinitionId, EngineConfig};
use effect_forge::host::{Host, MemoryHost};
use effect_forge::scope::{set_actor_assignment, set_scene_disabled};
use effect_forge::sync::{sync_family, PrevConditions};
use effect_forge::Engine;

fn defense_records(host: &MemoryHost, actor: ActorId) -> Vec<(DefinitionId, AppliedPayload)> {
    host.applied_records(actor)
        .into_iter()
        .filter(|r| r.payload.family() == ModifierFamily::Defense)
        .map(|r| (r.source, r.payload))
        .collect()
}

fn sync_defense(
    host: &mut MemoryHost,
    catalog: &EffectCatalog,
    prev: &mut PrevConditions,
    actor: ActorId,
) -> effect_forge::sync::SyncOutcome {
    sync_family(
        host,
        catalog,
        &EngineConfig::default(),
        prev,
        actor,
        ModifierFamily::Defense,
        None,
    )
    .unwrap()
}

/// Unconditional +1 defense assigned directly: exactly one record after
/// sync, zero after unassignment.
#[test]
fn assignment_creates_exactly_one_record() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(EffectDefinition::new(
        "Shield Wall",
        ModifierKind::DefenseBonus { bonus: 1 },
    ));
    set_actor_assignment(&mut host, actor, id, true).unwrap();

    let mut prev = PrevConditions::default();
    let outcome = sync_defense(&mut host, &catalog, &mut prev, actor);
    assert_eq!(outcome.created, 1);
    assert_eq!(
        defense_records(&host, actor),
        vec![(id, AppliedPayload::Defense { bonus: 1 })]
    );

    set_actor_assignment(&mut host, actor, id, false).unwrap();
    let outcome = sync_defense(&mut host, &catalog, &mut prev, actor);
    assert_eq!(outcome.deleted, 1);
    assert!(defense_records(&host, actor).is_empty());
}

/// A second pass with no state change is a no-op.
#[test]
fn sync_is_idempotent() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(EffectDefinition::new(
        "Ward",
        ModifierKind::DefenseBonus { bonus: 2 },
    ));
    set_actor_assignment(&mut host, actor, id, true).unwrap();

    let mut prev = PrevConditions::default();
    assert!(sync_defense(&mut host, &catalog, &mut prev, actor).changed());
    let second = sync_defense(&mut host, &catalog, &mut prev, actor);
    assert_eq!(second.created, 0);
    assert_eq!(second.deleted, 0);
}

/// A magnitude change forces delete-and-recreate, not an in-place edit.
#[test]
fn payload_mismatch_recreates_record() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(EffectDefinition::new(
        "Ward",
        ModifierKind::DefenseBonus { bonus: 1 },
    ));
    set_actor_assignment(&mut host, actor, id, true).unwrap();

    let mut prev = PrevConditions::default();
    sync_defense(&mut host, &catalog, &mut prev, actor);
    let first_id = host.applied_records(actor)[0].id;

    catalog.update(
        id,
        EffectDefinition::new("Ward", ModifierKind::DefenseBonus { bonus: 3 }),
    );
    let outcome = sync_defense(&mut host, &catalog, &mut prev, actor);
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.created, 1);
    let records = host.applied_records(actor);
    assert_eq!(records.len(), 1);
    assert_ne!(records[0].id, first_id);
    assert_eq!(records[0].payload, AppliedPayload::Defense { bonus: 3 });
}

/// Zero-magnitude modifiers never materialize a record.
#[test]
fn zero_magnitude_creates_nothing() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(EffectDefinition::new(
        "Null Ward",
        ModifierKind::DefenseBonus { bonus: 0 },
    ));
    set_actor_assignment(&mut host, actor, id, true).unwrap();

    let mut prev = PrevConditions::default();
    let outcome = sync_defense(&mut host, &catalog, &mut prev, actor);
    assert!(!outcome.changed());
    assert!(host.applied_records(actor).is_empty());
}

/// Condition transitions create and remove the record automatically.
#[test]
fn condition_drives_record_lifecycle() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(
        EffectDefinition::new("Blessed Guard", ModifierKind::DefenseBonus { bonus: 1 })
            .with_condition(Condition::Status {
                subject: Subject::SelfActor,
                status: StatusId::new("bless"),
            }),
    );
    set_actor_assignment(&mut host, actor, id, true).unwrap();

    let mut prev = PrevConditions::default();
    sync_defense(&mut host, &catalog, &mut prev, actor);
    assert!(defense_records(&host, actor).is_empty());

    host.set_status(actor, "bless", true);
    sync_defense(&mut host, &catalog, &mut prev, actor);
    assert_eq!(defense_records(&host, actor).len(), 1);

    host.set_status(actor, "bless", false);
    sync_defense(&mut host, &catalog, &mut prev, actor);
    assert!(defense_records(&host, actor).is_empty());
}

/// A record that vanishes mid-sync is flagged for follow-up instead of
/// failing the pass.
#[test]
fn stale_deletion_is_best_effort() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(
        EffectDefinition::new("Guard", ModifierKind::DefenseBonus { bonus: 1 }).with_condition(
            Condition::Status {
                subject: Subject::SelfActor,
                status: StatusId::new("bless"),
            },
        ),
    );
    set_actor_assignment(&mut host, actor, id, true).unwrap();
    host.set_status(actor, "bless", true);

    let mut prev = PrevConditions::default();
    sync_defense(&mut host, &catalog, &mut prev, actor);
    assert_eq!(defense_records(&host, actor).len(), 1);

    // The condition drops, and the delete the pass issues races with an
    // external removal of the same record.
    host.set_status(actor, "bless", false);
    host.script_stale_delete();
    let outcome = sync_defense(&mut host, &catalog, &mut prev, actor);
    assert!(outcome.needs_followup);
    assert!(defense_records(&host, actor).is_empty());

    // The scheduled follow-up pass finds a quiescent state.
    let followup = sync_defense(&mut host, &catalog, &mut prev, actor);
    assert!(!followup.changed());
    assert!(!followup.needs_followup);
}

/// The engine's follow-up loop drains a stale-delete race to quiescence
/// within one entry.
#[test]
fn followup_resync_converges_after_stale_delete() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(
        EffectDefinition::new("Guard", ModifierKind::DefenseBonus { bonus: 1 }).with_condition(
            Condition::Status {
                subject: Subject::SelfActor,
                status: StatusId::new("bless"),
            },
        ),
    );
    set_actor_assignment(&mut host, actor, id, true).unwrap();
    host.set_status(actor, "bless", true);
    let mut engine = Engine::new(host, catalog);
    engine
        .resync_family(actor, ModifierFamily::Defense, None)
        .unwrap();
    assert_eq!(defense_records(engine.host(), actor).len(), 1);

    engine.host_mut().set_status(actor, "bless", false);
    engine.host_mut().script_stale_delete();
    engine
        .resync_family(actor, ModifierFamily::Defense, None)
        .unwrap();
    assert!(defense_records(engine.host(), actor).is_empty());
}

/// Scene force-disable wins over assignment: the record is deleted on the
/// next sync.
#[test]
fn scene_disable_removes_live_record() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(EffectDefinition::new(
        "Guard",
        ModifierKind::DefenseBonus { bonus: 1 },
    ));
    set_actor_assignment(&mut host, actor, id, true).unwrap();

    let mut prev = PrevConditions::default();
    sync_defense(&mut host, &catalog, &mut prev, actor);
    assert_eq!(defense_records(&host, actor).len(), 1);

    set_scene_disabled(&mut host, id, true).unwrap();
    sync_defense(&mut host, &catalog, &mut prev, actor);
    assert!(defense_records(&host, actor).is_empty());
}

/// Duplicate records for one source collapse back to exactly one.
#[test]
fn duplicate_records_are_pruned() {
    let mut host = MemoryHost::new();
    let actor = host.add_actor(ActorClass::Character);
    let mut catalog = EffectCatalog::new();
    let id = catalog.create(EffectDefinition::new(
        "Guard",
        ModifierKind::DefenseBonus { bonus: 1 },
    ));
    set_actor_assignment(&mut host, actor, id, true).unwrap();

    // Two records for the same source, created outside the sync loop.
    host.create_record(actor, id, AppliedPayload::Defense { bonus: 1 })
        .unwrap();
    host.create_record(actor, id, AppliedPayload::Defense { bonus: 1 })
        .unwrap();

    let mut prev = PrevConditions::default();
    sync_defense(&mut host, &catalog, &mut prev, actor);
    assert_eq!(defense_records(&host, actor).len(), 1);
}
