//! Equipment archetypes, recipe demands, and the digest-keyed cache entry.

use serde::{Deserialize, Serialize};

use crate::common::Icon;
use crate::ids::ArchetypeId;

/// One ingredient line of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDemand {
    /// The archetype consumed by the recipe.
    pub archetype_id: ArchetypeId,
    /// How many units are consumed.
    #[serde(default)]
    pub count: u32,
}

/// Recipe describing how an archetype is built from other archetypes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Ordered ingredient list.
    #[serde(default)]
    pub demands: Vec<RecipeDemand>,
}

/// Static template for one equipment item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentArchetype {
    /// Unique archetype id within a working set.
    pub id: ArchetypeId,
    /// Internal symbol name.
    #[serde(default)]
    pub symbol: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Rarity tier (0 = basic).
    #[serde(default)]
    pub rarity: u8,
    /// Item type discriminator sent by the server.
    #[serde(default, rename = "type")]
    pub item_type: u32,
    /// Icon asset, if the server provided one.
    #[serde(default)]
    pub icon: Option<Icon>,
    /// Recipe, absent for base components.
    #[serde(default)]
    pub recipe: Option<Recipe>,
    /// Resolved icon URL, filled in by the equipment image fan-out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl EquipmentArchetype {
    /// Iterate the archetype ids this archetype's recipe demands.
    pub fn demands(&self) -> impl Iterator<Item = ArchetypeId> + '_ {
        self.recipe
            .iter()
            .flat_map(|recipe| recipe.demands.iter().map(|demand| demand.archetype_id))
    }
}

/// Opaque fingerprint of the server's current recipe tree.
///
/// Only ever compared for equality; a changed digest invalidates every
/// cached [`EquipmentCacheEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeDigest(pub String);

impl RecipeDigest {
    /// Wrap a digest string.
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Borrow the digest string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RecipeDigest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted result of one successful closure resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentCacheEntry {
    /// Digest the archetype list was resolved against.
    pub digest: RecipeDigest,
    /// The complete closure at the time of resolution.
    pub archetype_cache: Vec<EquipmentArchetype>,
}

/// The `item_archetype_cache` block the server embeds in several responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemArchetypeCache {
    /// Archetypes known to the server response.
    #[serde(default)]
    pub archetypes: Vec<EquipmentArchetype>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demands_iterates_recipe_in_order() {
        let archetype = EquipmentArchetype {
            id: ArchetypeId(1),
            recipe: Some(Recipe {
                demands: vec![
                    RecipeDemand { archetype_id: ArchetypeId(5), count: 2 },
                    RecipeDemand { archetype_id: ArchetypeId(3), count: 1 },
                ],
            }),
            ..EquipmentArchetype::default()
        };
        let ids: Vec<ArchetypeId> = archetype.demands().collect();
        assert_eq!(ids, vec![ArchetypeId(5), ArchetypeId(3)]);
    }

    #[test]
    fn archetype_without_recipe_has_no_demands() {
        let archetype = EquipmentArchetype { id: ArchetypeId(9), ..EquipmentArchetype::default() };
        assert_eq!(archetype.demands().count(), 0);
    }

    #[test]
    fn archetype_parses_server_shape() {
        let json = r#"{
            "id": 77, "symbol": "phaser", "name": "Phaser", "rarity": 2, "type": 2,
            "icon": {"file": "/items/equipment/phaser"},
            "recipe": {"demands": [{"archetype_id": 12, "count": 3}], "validity_hash": "x"}
        }"#;
        let parsed: Result<EquipmentArchetype, _> = serde_json::from_str(json);
        assert!(parsed.is_ok());
        let parsed = parsed.unwrap_or_default();
        assert_eq!(parsed.id, ArchetypeId(77));
        assert_eq!(parsed.demands().collect::<Vec<_>>(), vec![ArchetypeId(12)]);
        assert!(parsed.icon_url.is_none());
    }
}
