//! Identifier newtypes for host-owned documents.
//!
//! The engine never dereferences host documents directly; it addresses them
//! through these opaque IDs and the [`Host`](crate::host::Host) accessors.
//! IDs are allocated by the host (or by the catalog for definitions) and
//! carry no internal structure.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident($raw:ty)) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $raw);

        impl $name {
            /// Create a new ID from a raw value.
            #[must_use]
            pub const fn new(id: $raw) -> Self {
                Self(id)
            }

            /// Get the raw ID value.
            #[must_use]
            pub const fn raw(self) -> $raw {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

id_type! {
    /// Unique identifier for an effect definition in the catalog.
    DefinitionId(u32)
}

id_type! {
    /// Unique identifier for an actor (character or adversary).
    ActorId(u32)
}

id_type! {
    /// Unique identifier for an item carried by an actor.
    ItemId(u32)
}

id_type! {
    /// Unique identifier for a token placed on the active scene.
    TokenId(u32)
}

id_type! {
    /// Identity of a combat encounter.
    CombatId(u32)
}

id_type! {
    /// Unique identifier for an applied-modifier record.
    ///
    /// Allocated by the host when a record is created; records are addressed
    /// by this ID for deletion.
    RecordId(u64)
}

/// Broad actor classification used by scene-wide toggles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorClass {
    /// A player character.
    #[default]
    Character,
    /// A GM-controlled adversary.
    Adversary,
}

/// Token disposition relative to the party, as placed on the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    Friendly,
    Neutral,
    Hostile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip() {
        let id = DefinitionId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.to_string(), "DefinitionId(7)");
    }
}
