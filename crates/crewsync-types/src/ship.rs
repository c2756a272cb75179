//! Ships and ship schematics.

use serde::{Deserialize, Serialize};

use crate::common::Icon;
use crate::ids::ShipId;

/// A ship, owned or known only from its schematic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    /// Owned ship id; zero for ships the player does not own.
    #[serde(default)]
    pub id: ShipId,
    /// Ship name; the key ships are matched by.
    #[serde(default)]
    pub name: String,
    /// Internal symbol.
    #[serde(default)]
    pub symbol: String,
    /// Current level; zero for unowned ships.
    #[serde(default)]
    pub level: u32,
    /// Maximum level.
    #[serde(default)]
    pub max_level: u32,
    /// Rarity tier.
    #[serde(default)]
    pub rarity: u8,
    /// Antimatter capacity, the base of voyage ship scoring.
    #[serde(default)]
    pub antimatter: u32,
    /// Visible trait keys.
    #[serde(default)]
    pub traits: Vec<String>,
    /// Hidden trait keys.
    #[serde(default)]
    pub traits_hidden: Vec<String>,
    /// Icon asset.
    #[serde(default)]
    pub icon: Option<Icon>,
    /// Display trait names, comma separated.
    #[serde(default)]
    pub trait_names: String,
    /// Resolved icon URL, filled in by the ship image fan-out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Ship {
    /// Whether the player owns this ship.
    pub const fn is_owned(&self) -> bool {
        !self.id.is_zero()
    }
}

/// A ship schematic from the static catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipSchematic {
    /// Schematic id.
    #[serde(default)]
    pub id: u64,
    /// The catalogue version of the ship.
    pub ship: Ship,
}
