//! Type-safe identifier wrappers around the server's numeric ids.
//!
//! The game server hands out plain integers for every entity. Wrapping them
//! keeps an equipment archetype id from being passed where a crew id is
//! expected. All wrappers serialize transparently as the bare number so the
//! wire format is unchanged.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the inner numeric value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// Whether this is the zero id the server uses for "none".
            pub const fn is_zero(self) -> bool {
                self.0 == 0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of an equipment archetype (an item template).
    ArchetypeId
}

define_id! {
    /// Identifier of a crew archetype; roster entries and avatars share it.
    CrewId
}

define_id! {
    /// Identifier of an inventory item instance.
    ItemId
}

define_id! {
    /// Identifier of an owned ship. Unowned schematic ships carry zero.
    ShipId
}

define_id! {
    /// Identifier of a mission (or the first mission of a dispute episode).
    MissionId
}

define_id! {
    /// Identifier of a quest inside a mission.
    QuestId
}

define_id! {
    /// Identifier of a fleet (guild). Zero means "not in a fleet".
    FleetId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&ArchetypeId(42)).ok();
        assert_eq!(json.as_deref(), Some("42"));

        let restored: Result<CrewId, _> = serde_json::from_str("7");
        assert_eq!(restored.ok(), Some(CrewId(7)));
    }

    #[test]
    fn zero_fleet_means_none() {
        assert!(FleetId::default().is_zero());
        assert!(!FleetId(3).is_zero());
    }

    #[test]
    fn id_display_matches_number() {
        assert_eq!(QuestId(1234).to_string(), "1234");
    }
}
