//! One-shot trigger flags.
//!
//! Trigger lifecycle is explicitly mark then consume: an event hook marks
//! a flag the moment its event resolves, and the flag is cleared when a
//! condition gated on it is successfully applied. There is no time-based
//! expiry.

use serde_json::json;
use tracing::debug;

use crate::catalog::TriggerKind;
use crate::core::{ActorId, EngineError};
use crate::host::{flags, DocRef, FlagWrite, Host};

fn key(kind: TriggerKind) -> String {
    format!("{}.{}", flags::TRIGGER_PREFIX, kind.flag_key())
}

/// Mark a trigger on an actor with an associated magnitude (resource delta,
/// slots marked). Magnitude 1 for plain boolean triggers.
pub fn mark<H: Host>(
    host: &mut H,
    actor: ActorId,
    kind: TriggerKind,
    amount: i64,
) -> Result<(), EngineError> {
    debug!(%actor, trigger = %kind.flag_key(), amount, "marking trigger");
    host.set_flag(DocRef::Actor(actor), &key(kind), json!({ "amount": amount }))?;
    Ok(())
}

/// Whether the trigger is currently marked.
pub fn is_marked<H: Host>(host: &H, actor: ActorId, kind: TriggerKind) -> bool {
    host.get_flag(DocRef::Actor(actor), &key(kind)).is_some()
}

/// The magnitude stored with a marked trigger, if any.
pub fn marked_amount<H: Host>(host: &H, actor: ActorId, kind: TriggerKind) -> Option<i64> {
    host.get_flag(DocRef::Actor(actor), &key(kind))?
        .get("amount")?
        .as_i64()
}

/// Clear a consumed trigger (true key removal).
pub fn clear<H: Host>(host: &mut H, actor: ActorId, kind: TriggerKind) -> Result<(), EngineError> {
    host.remove_flag(DocRef::Actor(actor), &key(kind))?;
    Ok(())
}

/// Clear every trigger flag on an actor in one atomic write.
pub fn clear_all<H: Host>(host: &mut H, actor: ActorId) -> Result<(), EngineError> {
    let doc = DocRef::Actor(actor);
    let prefix = format!("{}.", flags::TRIGGER_PREFIX);
    let removals: Vec<FlagWrite> = host
        .flag_keys(doc, &prefix)
        .into_iter()
        .map(FlagWrite::remove)
        .collect();
    if !removals.is_empty() {
        host.write_flags(doc, &removals)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ThresholdTier;
    use crate::core::ActorClass;
    use crate::host::MemoryHost;

    #[test]
    fn mark_consume_lifecycle() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(ActorClass::Character);
        assert!(!is_marked(&host, actor, TriggerKind::RolledCritical));

        mark(&mut host, actor, TriggerKind::RolledCritical, 1).unwrap();
        assert!(is_marked(&host, actor, TriggerKind::RolledCritical));
        assert_eq!(
            marked_amount(&host, actor, TriggerKind::RolledCritical),
            Some(1)
        );

        clear(&mut host, actor, TriggerKind::RolledCritical).unwrap();
        assert!(!is_marked(&host, actor, TriggerKind::RolledCritical));
    }

    #[test]
    fn tiers_are_independent_keys() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(ActorClass::Character);
        mark(
            &mut host,
            actor,
            TriggerKind::TookThreshold(ThresholdTier::Major),
            1,
        )
        .unwrap();
        assert!(!is_marked(
            &host,
            actor,
            TriggerKind::TookThreshold(ThresholdTier::Severe)
        ));
        clear_all(&mut host, actor).unwrap();
        assert!(!is_marked(
            &host,
            actor,
            TriggerKind::TookThreshold(ThresholdTier::Major)
        ));
    }
}
