//! Condition evaluator integration tests, including the range-band
//! boundary properties.

use effect_forge::catalog::{
    AttributeId, CompareOp, Condition, IncomingKind, RangeBand, RangeMode, RangeSubject, Subject,
};
use effect_forge::condition::{evaluate, EvalContext};
use effect_forge::core::{ActorClass, Disposition, RangeBandThresholds};
use effect_forge::host::MemoryHost;
use proptest::prelude::*;

fn range(mode: RangeMode, band: RangeBand, subject: RangeSubject, count: u32) -> Condition {
    Condition::Range {
        mode,
        band,
        subject,
        count,
    }
}

/// A token exactly at a band's threshold is within that band, beyond the
/// next-closer band, and not beyond itself.
#[test]
fn band_threshold_boundaries() {
    let bands = RangeBandThresholds::default();
    for band in [
        RangeBand::Melee,
        RangeBand::VeryClose,
        RangeBand::Close,
        RangeBand::Far,
    ] {
        let d = bands.threshold(band).unwrap();
        let mut host = MemoryHost::new();
        let hero = host.add_actor(ActorClass::Character);
        let foe = host.add_actor(ActorClass::Adversary);
        host.place_token(hero, 0.0, 0.0, Disposition::Friendly);
        host.place_token(foe, d, 0.0, Disposition::Hostile);
        let ctx = EvalContext::new(hero).with_target(foe);

        let check = |mode, band| {
            evaluate(
                &host,
                &bands,
                &range(mode, band, RangeSubject::Attacker, 0),
                &ctx,
            )
        };
        assert!(check(RangeMode::Within, band), "{band:?} within");
        assert!(!check(RangeMode::Beyond, band), "{band:?} not beyond self");
        if let Some(closer) = band.closer() {
            assert!(check(RangeMode::Beyond, closer), "{band:?} beyond closer");
        }
    }
}

proptest! {
    /// Within/Beyond partition every distance, and At matches exactly the
    /// classified band.
    #[test]
    fn within_beyond_partition(distance in 0.0f64..200.0) {
        let bands = RangeBandThresholds::default();
        let mut host = MemoryHost::new();
        let hero = host.add_actor(ActorClass::Character);
        let foe = host.add_actor(ActorClass::Adversary);
        host.place_token(hero, 0.0, 0.0, Disposition::Friendly);
        host.place_token(foe, distance, 0.0, Disposition::Hostile);
        let ctx = EvalContext::new(hero).with_target(foe);

        for band in RangeBand::ALL {
            let within = evaluate(&host, &bands, &range(RangeMode::Within, band, RangeSubject::Attacker, 0), &ctx);
            let beyond = evaluate(&host, &bands, &range(RangeMode::Beyond, band, RangeSubject::Attacker, 0), &ctx);
            prop_assert_ne!(within, beyond, "band {:?} at {}", band, distance);

            let at = evaluate(&host, &bands, &range(RangeMode::At, band, RangeSubject::Attacker, 0), &ctx);
            prop_assert_eq!(at, bands.band_of(distance) == band);
        }
    }
}

/// All targets must satisfy the predicate for target/attacker subjects.
#[test]
fn target_subject_uses_and_semantics() {
    let bands = RangeBandThresholds::default();
    let mut host = MemoryHost::new();
    let hero = host.add_actor(ActorClass::Character);
    let near = host.add_actor(ActorClass::Adversary);
    let far = host.add_actor(ActorClass::Adversary);
    host.place_token(hero, 0.0, 0.0, Disposition::Friendly);
    let near_token = host.place_token(near, 3.0, 0.0, Disposition::Hostile);
    let far_token = host.place_token(far, 100.0, 0.0, Disposition::Hostile);

    let ctx = EvalContext::new(hero);
    let cond = range(RangeMode::Within, RangeBand::Melee, RangeSubject::Target, 0);

    host.set_user_targets(vec![near_token]);
    assert!(evaluate(&host, &bands, &cond, &ctx));

    host.set_user_targets(vec![near_token, far_token]);
    assert!(!evaluate(&host, &bands, &cond, &ctx));

    // No user targets and no contextual target: nothing to measure.
    host.set_user_targets(vec![]);
    assert!(!evaluate(&host, &bands, &cond, &ctx));
}

/// Counting semantics for enemies: a third hostile token entering the band
/// flips the condition (advantage-at-2-enemies scenario).
#[test]
fn enemy_count_flips_at_threshold() {
    let bands = RangeBandThresholds::default();
    let mut host = MemoryHost::new();
    let hero = host.add_actor(ActorClass::Character);
    host.place_token(hero, 0.0, 0.0, Disposition::Friendly);
    let a = host.add_actor(ActorClass::Adversary);
    let b = host.add_actor(ActorClass::Adversary);
    host.place_token(a, 10.0, 0.0, Disposition::Hostile);
    let b_token = host.place_token(b, 200.0, 0.0, Disposition::Hostile);

    let ctx = EvalContext::new(hero);
    let cond = range(RangeMode::Within, RangeBand::Close, RangeSubject::Enemies, 2);
    assert!(!evaluate(&host, &bands, &cond, &ctx));

    host.move_token(b_token, 20.0, 0.0);
    assert!(evaluate(&host, &bands, &cond, &ctx));
}

/// Attribute comparisons read through the typed adapter; absent attributes
/// evaluate false.
#[test]
fn absent_attribute_is_false() {
    let mut host = MemoryHost::new();
    let hero = host.add_actor(ActorClass::Character);
    let bands = RangeBandThresholds::default();
    // No armor resource: ArmorScore is absent.
    let cond = Condition::Attribute {
        subject: Subject::SelfActor,
        attribute: AttributeId::ArmorScore,
        operator: CompareOp::AtLeast,
        value: 0,
    };
    assert!(!evaluate(&host, &bands, &cond, &EvalContext::new(hero)));

    host.set_armor(hero, 1, 3);
    assert!(evaluate(&host, &bands, &cond, &EvalContext::new(hero)));
}

/// Damage-type gates defer until damage context exists, then filter.
#[test]
fn damage_type_gate_filters_once_context_exists() {
    let mut host = MemoryHost::new();
    let hero = host.add_actor(ActorClass::Character);
    let bands = RangeBandThresholds::default();
    let cond = Condition::DamageType {
        incoming: IncomingKind::Magical,
    };

    let early = EvalContext::new(hero);
    assert!(evaluate(&host, &bands, &cond, &early));

    let physical = EvalContext::new(hero).with_incoming_types(
        [effect_forge::catalog::DamageType::Physical]
            .into_iter()
            .collect(),
    );
    assert!(!evaluate(&host, &bands, &cond, &physical));

    let magical = EvalContext::new(hero).with_incoming_types(
        [effect_forge::catalog::DamageType::Magical]
            .into_iter()
            .collect(),
    );
    assert!(evaluate(&host, &bands, &cond, &magical));
}
