//! Condition evaluation.

use crate::catalog::{Condition, WeaponSlot};
use crate::core::config::RangeBandThresholds;
use crate::host::{Host, ItemKind};
use crate::state::trigger;

use super::context::EvalContext;
use super::range::check_range;

/// Evaluate a condition against the current host state.
///
/// Evaluation is pure with respect to the host: nothing is consumed or
/// written here, even for trigger conditions (consumption happens when the
/// gated effect actually applies).
///
/// Missing context resolves pessimistically: a `Target`-subject condition
/// without a contextual target is false, as is a range condition for an
/// actor with no token. The one optimistic case is `DamageType` before any
/// damage is in flight, which stays true so persistent defender-side
/// effects can pre-apply and be narrowed later.
pub fn evaluate<H: Host>(
    host: &H,
    bands: &RangeBandThresholds,
    condition: &Condition,
    ctx: &EvalContext,
) -> bool {
    match condition {
        Condition::Always => true,

        Condition::Status { subject, status } => ctx
            .resolve(*subject)
            .is_some_and(|actor| host.has_status(actor, status)),

        Condition::Attribute {
            subject,
            attribute,
            operator,
            value,
        } => ctx
            .resolve(*subject)
            .and_then(|actor| host.attribute(actor, *attribute))
            .is_some_and(|current| operator.compare(current, *value)),

        Condition::Range {
            mode,
            band,
            subject,
            count,
        } => check_range(host, bands, *mode, *band, *subject, *count, ctx),

        Condition::Weapon { slot } => check_weapon(host, *slot, ctx),

        Condition::DamageType { incoming } => match &ctx.incoming_types {
            None => true,
            Some(types) => incoming.matches_types(types),
        },

        Condition::Trigger { subject, kind } => ctx
            .resolve(*subject)
            .is_some_and(|actor| trigger::is_marked(host, actor, *kind)),

        Condition::NoArmorRemaining { subject } => ctx
            .resolve(*subject)
            .and_then(|actor| host.armor_marks(actor))
            .is_some_and(|(marked, total)| total > 0 && marked >= total),
    }
}

/// Slot check for the acting weapon.
///
/// Permissive without an acting item: a weapon-gated effect on a roll that
/// carries no item (a raw trait roll) still applies. With an item, the
/// slot is the item's position among the holder's equipped weapons.
fn check_weapon<H: Host>(host: &H, slot: WeaponSlot, ctx: &EvalContext) -> bool {
    let Some(item) = ctx.acting_item else {
        return true;
    };
    if slot == WeaponSlot::Any {
        return true;
    }
    let equipped: Vec<_> = host
        .items(ctx.actor)
        .into_iter()
        .filter(|i| i.kind == ItemKind::Weapon && i.equipped)
        .map(|i| i.id)
        .collect();
    let wanted = match slot {
        WeaponSlot::Primary => equipped.first(),
        WeaponSlot::Secondary => equipped.get(1),
        WeaponSlot::Any => unreachable!(),
    };
    wanted == Some(&item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeId, CompareOp, IncomingKind, Subject};
    use crate::core::ActorClass;
    use crate::host::MemoryHost;

    #[test]
    fn target_subject_without_target_is_false() {
        let mut host = MemoryHost::new();
        let hero = host.add_actor(ActorClass::Character);
        let bands = RangeBandThresholds::default();
        let condition = Condition::Status {
            subject: Subject::Target,
            status: "vulnerable".into(),
        };
        assert!(!evaluate(&host, &bands, &condition, &EvalContext::new(hero)));
    }

    #[test]
    fn attribute_percentage_comparison() {
        let mut host = MemoryHost::new();
        let hero = host.add_actor(ActorClass::Character);
        host.set_hit_points(hero, 2, 8);
        let bands = RangeBandThresholds::default();
        let condition = Condition::Attribute {
            subject: Subject::SelfActor,
            attribute: AttributeId::HitPointsPct,
            operator: CompareOp::AtMost,
            value: 25,
        };
        assert!(evaluate(&host, &bands, &condition, &EvalContext::new(hero)));
    }

    #[test]
    fn damage_type_is_indeterminate_true_without_damage() {
        let mut host = MemoryHost::new();
        let hero = host.add_actor(ActorClass::Character);
        let bands = RangeBandThresholds::default();
        let condition = Condition::DamageType {
            incoming: IncomingKind::Magical,
        };
        assert!(evaluate(&host, &bands, &condition, &EvalContext::new(hero)));
    }

    #[test]
    fn secondary_weapon_slot() {
        let mut host = MemoryHost::new();
        let hero = host.add_actor(ActorClass::Character);
        let sword = host.add_item(hero, ItemKind::Weapon);
        let dagger = host.add_item(hero, ItemKind::Weapon);
        host.set_equipped(sword, true);
        host.set_equipped(dagger, true);
        let bands = RangeBandThresholds::default();
        let condition = Condition::Weapon {
            slot: WeaponSlot::Secondary,
        };
        let ctx = EvalContext::new(hero).with_item(dagger);
        assert!(evaluate(&host, &bands, &condition, &ctx));
        let ctx = EvalContext::new(hero).with_item(sword);
        assert!(!evaluate(&host, &bands, &condition, &ctx));
    }

    #[test]
    fn no_armor_remaining_requires_slots() {
        let mut host = MemoryHost::new();
        let hero = host.add_actor(ActorClass::Character);
        let bands = RangeBandThresholds::default();
        let condition = Condition::NoArmorRemaining {
            subject: Subject::SelfActor,
        };
        // No armor resource at all.
        assert!(!evaluate(&host, &bands, &condition, &EvalContext::new(hero)));
        host.set_armor(hero, 3, 3);
        assert!(evaluate(&host, &bands, &condition, &EvalContext::new(hero)));
        host.set_armor(hero, 2, 3);
        assert!(!evaluate(&host, &bands, &condition, &EvalContext::new(hero)));
    }
}
