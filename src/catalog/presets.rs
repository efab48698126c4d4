//! Ready-made effect definitions.
//!
//! A small library of common rules a GM would otherwise author by hand.
//! Pure data; `EffectCatalog::with_presets` registers them.

use super::condition::{
    AttributeId, CompareOp, Condition, StatusId, Subject, ThresholdTier, TriggerKind,
};
use super::definition::EffectDefinition;
use super::duration::{EffectDuration, TickEvent};
use super::modifier::{
    ActionFilter, ApplyTo, DamageType, IncomingKind, Modifier, ModifierKind, TraitFilter,
};

fn roll_filters() -> (TraitFilter, ActionFilter) {
    (TraitFilter::Any, ActionFilter::Any)
}

/// The preset library.
pub fn presets() -> Vec<EffectDefinition> {
    let (tf, af) = roll_filters();
    vec![
        // ── Status-based ────────────────────────────────────────────────
        EffectDefinition::new(
            "Vulnerable — Advantage on Attacks",
            ModifierKind::Advantage {
                trait_filter: tf,
                action_filter: af,
            },
        )
        .with_description("Attacks against a Vulnerable target have advantage.")
        .with_condition(Condition::Status {
            subject: Subject::Target,
            status: StatusId::new("vulnerable"),
        }),
        EffectDefinition::new(
            "Hidden — Disadvantage on Attacks",
            ModifierKind::Disadvantage {
                trait_filter: tf,
                action_filter: af,
            },
        )
        .with_description("Attacks against a Hidden target have disadvantage.")
        .with_condition(Condition::Status {
            subject: Subject::SelfActor,
            status: StatusId::new("hidden"),
        })
        .with_modifier(
            Modifier::new(ModifierKind::Disadvantage {
                trait_filter: tf,
                action_filter: af,
            })
            .applying_to(ApplyTo::Incoming),
        ),
        EffectDefinition::new(
            "Blessed — Threshold +2",
            ModifierKind::ThresholdBonus { major: 2, severe: 2 },
        )
        .with_description("Blessed increases damage thresholds by +2.")
        .with_condition(Condition::Status {
            subject: Subject::SelfActor,
            status: StatusId::new("bless"),
        }),
        EffectDefinition::new(
            "Poisoned — Extra Damage Taken",
            ModifierKind::DamageMultiplier {
                factor: 1.5,
                incoming: IncomingKind::Any,
            },
        )
        .with_description("Poisoned targets take 1.5x incoming damage.")
        .with_condition(Condition::Status {
            subject: Subject::SelfActor,
            status: StatusId::new("poison"),
        }),
        // ── Attribute-based ─────────────────────────────────────────────
        EffectDefinition::new(
            "Low HP Rage",
            ModifierKind::DamageBonus {
                dice: "1d6".to_string(),
                bonus: 0,
                damage_type: DamageType::Any,
            },
        )
        .with_description("Below 25% HP: +1d6 damage bonus.")
        .with_condition(Condition::Attribute {
            subject: Subject::SelfActor,
            attribute: AttributeId::HitPointsPct,
            operator: CompareOp::AtMost,
            value: 25,
        }),
        EffectDefinition::new(
            "Hope Surge",
            ModifierKind::RollBonus {
                bonus: 2,
                trait_filter: tf,
                action_filter: af,
            },
        )
        .with_description("High Hope (5+): +2 to all rolls.")
        .with_condition(Condition::Attribute {
            subject: Subject::SelfActor,
            attribute: AttributeId::Hope,
            operator: CompareOp::AtLeast,
            value: 5,
        }),
        EffectDefinition::new(
            "No Armor — Evasion Penalty",
            ModifierKind::DefenseBonus { bonus: -2 },
        )
        .with_description("No armor remaining: -2 Evasion.")
        .with_condition(Condition::NoArmorRemaining {
            subject: Subject::SelfActor,
        }),
        // ── Trigger-based ───────────────────────────────────────────────
        EffectDefinition::new(
            "Fear-Fueled",
            ModifierKind::DamageBonus {
                dice: "1d4".to_string(),
                bonus: 0,
                damage_type: DamageType::Any,
            },
        )
        .with_description("Rolled with Fear: +1d4 on next damage.")
        .with_condition(Condition::Trigger {
            subject: Subject::SelfActor,
            kind: TriggerKind::RolledFear,
        })
        .with_duration(EffectDuration::NextDamage),
        EffectDefinition::new(
            "Critical Momentum",
            ModifierKind::StatusOnHit {
                status: StatusId::new("vulnerable"),
            },
        )
        .with_description("On Critical: target becomes Vulnerable.")
        .with_condition(Condition::Trigger {
            subject: Subject::SelfActor,
            kind: TriggerKind::RolledCritical,
        })
        .with_duration(EffectDuration::Once),
        EffectDefinition::new(
            "Hope Spent — +1 Roll Bonus",
            ModifierKind::RollBonus {
                bonus: 1,
                trait_filter: tf,
                action_filter: af,
            },
        )
        .with_description("After spending Hope: +1 to next roll.")
        .with_condition(Condition::Trigger {
            subject: Subject::SelfActor,
            kind: TriggerKind::SpentHope,
        })
        .with_duration(EffectDuration::NextRoll),
        EffectDefinition::new(
            "Armor Break — Evasion -1",
            ModifierKind::DefenseBonus { bonus: -1 },
        )
        .with_description("Armor slot marked: -1 Evasion until combat ends.")
        .with_condition(Condition::Trigger {
            subject: Subject::SelfActor,
            kind: TriggerKind::ArmorSlotMarked,
        })
        .with_duration(EffectDuration::EndOfCombat),
        EffectDefinition::new("Took Major — Stress on Hit", ModifierKind::StressOnHit { amount: 1 })
            .with_description("After taking Major damage: apply 1 Stress on next hit.")
            .with_condition(Condition::Trigger {
                subject: Subject::SelfActor,
                kind: TriggerKind::TookThreshold(ThresholdTier::Major),
            })
            .with_duration(EffectDuration::Once),
        // ── Combat utility ──────────────────────────────────────────────
        EffectDefinition::new("Aura of Protection", ModifierKind::DefenseBonus { bonus: 1 })
            .with_description("Unconditional +1 to Evasion."),
        EffectDefinition::new(
            "Enchanted Weapon",
            ModifierKind::DamageBonus {
                dice: "1d4".to_string(),
                bonus: 0,
                damage_type: DamageType::Magical,
            },
        )
        .with_description("+1d4 magical damage."),
        EffectDefinition::new("Proficiency +1", ModifierKind::ProficiencyBonus { bonus: 1 })
            .with_description("+1 to Proficiency."),
        EffectDefinition::new(
            "3-Round Advantage",
            ModifierKind::Advantage {
                trait_filter: tf,
                action_filter: af,
            },
        )
        .with_description("Advantage for 3 rounds.")
        .with_duration(EffectDuration::Countdown {
            ticks: 3,
            tick_on: TickEvent::RoundStart,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_well_formed() {
        let all = presets();
        assert!(!all.is_empty());
        for def in &all {
            assert!(def.enabled);
            assert!(!def.name.is_empty());
        }
    }
}
