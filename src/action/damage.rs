//! In-flight damage computation.
//!
//! A [`DamageState`] is assembled by the host during damage resolution and
//! passed mutably through the damage hooks: formula assembly appends bonus
//! dice to matching parts, the defender-side hook multiplies part totals,
//! and the post-apply hook reads the hit list for on-hit effects.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::catalog::{DamageType, IncomingKind};
use crate::core::ActorId;

/// Which pool a damage part drains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamagePool {
    #[default]
    HitPoints,
    Stress,
}

/// A damage part's type-tag collection.
///
/// Host systems store damage types in different shapes (a set, a list, or a
/// keyed map). The engine preserves whatever shape the part arrived with so
/// downstream consumers keep seeing the collection they expect; membership
/// and merge semantics are identical across shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DamageTags {
    Set(FxHashSet<DamageType>),
    List(Vec<DamageType>),
    Keyed(FxHashMap<String, DamageType>),
}

impl Default for DamageTags {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl DamageTags {
    /// An empty list-shaped collection.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set-shaped collection from types.
    #[must_use]
    pub fn set_of(types: impl IntoIterator<Item = DamageType>) -> Self {
        Self::Set(types.into_iter().collect())
    }

    /// Build a list-shaped collection from types.
    #[must_use]
    pub fn list_of(types: impl IntoIterator<Item = DamageType>) -> Self {
        Self::List(types.into_iter().collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Set(s) => s.is_empty(),
            Self::List(l) => l.is_empty(),
            Self::Keyed(m) => m.is_empty(),
        }
    }

    #[must_use]
    pub fn contains(&self, ty: DamageType) -> bool {
        match self {
            Self::Set(s) => s.contains(&ty),
            Self::List(l) => l.contains(&ty),
            Self::Keyed(m) => m.values().any(|t| *t == ty),
        }
    }

    /// Merge a type in, preserving the collection shape. No-op when already
    /// present.
    pub fn merge(&mut self, ty: DamageType) {
        if self.contains(ty) {
            return;
        }
        match self {
            Self::Set(s) => {
                s.insert(ty);
            }
            Self::List(l) => l.push(ty),
            Self::Keyed(m) => {
                m.insert(format!("{ty:?}").to_lowercase(), ty);
            }
        }
    }

    /// Flatten to a plain set for condition evaluation.
    #[must_use]
    pub fn as_set(&self) -> FxHashSet<DamageType> {
        match self {
            Self::Set(s) => s.clone(),
            Self::List(l) => l.iter().copied().collect(),
            Self::Keyed(m) => m.values().copied().collect(),
        }
    }
}

impl IncomingKind {
    /// Whether an incoming filter matches a part's tag collection.
    ///
    /// An untagged part matches everything (the part declares no types to
    /// disagree with).
    #[must_use]
    pub fn matches(self, tags: &DamageTags) -> bool {
        match self {
            Self::Any => true,
            Self::Physical => tags.is_empty() || tags.contains(DamageType::Physical),
            Self::Magical => tags.is_empty() || tags.contains(DamageType::Magical),
        }
    }

    /// Same check against a flattened union of tags (condition evaluation).
    #[must_use]
    pub fn matches_types(self, types: &FxHashSet<DamageType>) -> bool {
        match self {
            Self::Any => true,
            Self::Physical => types.is_empty() || types.contains(&DamageType::Physical),
            Self::Magical => types.is_empty() || types.contains(&DamageType::Magical),
        }
    }
}

/// One part of a damage roll.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamagePart {
    pub pool: DamagePool,
    pub tags: DamageTags,
    /// Extra dice/flat formula appended by damage bonuses, e.g. `1d6 + 2`.
    pub extra_formula: String,
    /// Rolled total, present once dice have landed (defender-side hooks).
    pub total: i64,
}

impl DamagePart {
    #[must_use]
    pub fn new(pool: DamagePool, tags: DamageTags) -> Self {
        Self {
            pool,
            tags,
            extra_formula: String::new(),
            total: 0,
        }
    }

    #[must_use]
    pub fn with_total(mut self, total: i64) -> Self {
        self.total = total;
        self
    }

    /// Append a bonus formula fragment.
    pub fn append_formula(&mut self, formula: &str) {
        if self.extra_formula.is_empty() {
            self.extra_formula = formula.to_string();
        } else {
            self.extra_formula = format!("{} + {}", self.extra_formula, formula);
        }
    }
}

/// A target of the damage action and whether the attack hit it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTargetRef {
    pub actor: ActorId,
    pub hit: bool,
}

/// The mutable damage computation passed by reference into hooks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageState {
    /// The attacking actor, when known.
    pub source: Option<ActorId>,
    pub parts: Vec<DamagePart>,
    pub targets: Vec<DamageTargetRef>,
}

impl DamageState {
    #[must_use]
    pub fn new(source: Option<ActorId>) -> Self {
        Self {
            source,
            parts: Vec::new(),
            targets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_part(mut self, part: DamagePart) -> Self {
        self.parts.push(part);
        self
    }

    #[must_use]
    pub fn with_target(mut self, actor: ActorId, hit: bool) -> Self {
        self.targets.push(DamageTargetRef { actor, hit });
        self
    }

    /// Union of all parts' damage-type tags.
    #[must_use]
    pub fn all_types(&self) -> FxHashSet<DamageType> {
        let mut set = FxHashSet::default();
        for part in &self.parts {
            set.extend(part.tags.as_set());
        }
        set
    }

    /// Actors the attack actually hit.
    pub fn hit_targets(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.targets.iter().filter(|t| t.hit).map(|t| t.actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_preserves_shape() {
        let mut set = DamageTags::set_of([DamageType::Physical]);
        set.merge(DamageType::Magical);
        assert!(matches!(set, DamageTags::Set(ref s) if s.len() == 2));

        let mut list = DamageTags::list_of([DamageType::Physical]);
        list.merge(DamageType::Magical);
        list.merge(DamageType::Magical);
        assert!(matches!(list, DamageTags::List(ref l) if l.len() == 2));

        let mut keyed = DamageTags::Keyed(FxHashMap::default());
        keyed.merge(DamageType::Physical);
        assert!(keyed.contains(DamageType::Physical));
    }

    #[test]
    fn untagged_part_matches_any_incoming_filter() {
        let tags = DamageTags::empty();
        assert!(IncomingKind::Physical.matches(&tags));
        assert!(IncomingKind::Magical.matches(&tags));
        assert!(IncomingKind::Any.matches(&tags));
    }
}
