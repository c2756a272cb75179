//! Inventory items.

use serde::{Deserialize, Serialize};

use crate::common::Icon;
use crate::ids::{ArchetypeId, ItemId};

/// An item in the player's inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item instance id.
    pub id: ItemId,
    /// Archetype of the item.
    #[serde(default)]
    pub archetype_id: ArchetypeId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Stack size.
    #[serde(default)]
    pub quantity: u32,
    /// Rarity tier.
    #[serde(default)]
    pub rarity: u8,
    /// Icon asset.
    #[serde(default)]
    pub icon: Icon,
    /// Item category derived from the icon path.
    #[serde(default)]
    pub type_name: String,
    /// Item symbol derived from the icon path.
    #[serde(default)]
    pub symbol: String,
    /// Resolved icon URL, filled in by the item image fan-out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Item {
    /// Derive `type_name` and `symbol` from the icon path.
    ///
    /// `/items/equipment/phaser` becomes type `equipment`, symbol `phaser`.
    /// Missing segments leave the fields empty.
    pub fn derive_names_from_icon(&mut self) {
        let trimmed = self.icon.file.replace("/items", "");
        let mut segments = trimmed.split('/').skip(1);
        segments.next().unwrap_or_default().clone_into(&mut self.type_name);
        segments.next().unwrap_or_default().clone_into(&mut self.symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_come_from_icon_path() {
        let mut item = Item {
            icon: Icon::new("/items/equipment/phaser_type2"),
            ..Item::default()
        };
        item.derive_names_from_icon();
        assert_eq!(item.type_name, "equipment");
        assert_eq!(item.symbol, "phaser_type2");
    }

    #[test]
    fn short_icon_path_leaves_symbol_empty() {
        let mut item = Item {
            icon: Icon::new("/items/schematics"),
            ..Item::default()
        };
        item.derive_names_from_icon();
        assert_eq!(item.type_name, "schematics");
        assert!(item.symbol.is_empty());
    }
}
