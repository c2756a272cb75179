//! The player record, fleet and starbase data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crew::{OwnedCrew, StoredImmortal};
use crate::item::Item;
use crate::ids::FleetId;
use crate::mission::{CadetSchedule, Dispute, MissionRef};
use crate::ship::Ship;

/// Fleet membership reference on the player record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetRef {
    /// Fleet id; zero when the player is in no fleet.
    #[serde(default)]
    pub id: FleetId,
    /// Fleet rank of the player.
    #[serde(default)]
    pub rank: String,
}

/// Voyage currently offered to the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoyageDescription {
    /// Ship trait that earns the voyage antimatter bonus.
    #[serde(default)]
    pub ship_trait: String,
}

/// The player's character: crew, ships, items, missions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Character id.
    #[serde(default)]
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Active crew.
    #[serde(default)]
    pub crew: Vec<OwnedCrew>,
    /// Frozen crew.
    #[serde(default)]
    pub stored_immortals: Vec<StoredImmortal>,
    /// Owned ships.
    #[serde(default)]
    pub ships: Vec<Ship>,
    /// Inventory items.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Accepted missions.
    #[serde(default)]
    pub accepted_missions: Vec<MissionRef>,
    /// Cadet challenge schedule.
    #[serde(default)]
    pub cadet_schedule: CadetSchedule,
    /// Dispute (episode) histories.
    #[serde(default)]
    pub dispute_histories: Vec<Dispute>,
    /// Voyages currently offered.
    #[serde(default)]
    pub voyage_descriptions: Vec<VoyageDescription>,
}

/// The player record returned by `player`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player id.
    #[serde(default)]
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Character data.
    #[serde(default)]
    pub character: Character,
    /// Fleet membership.
    #[serde(default)]
    pub fleet: Option<FleetRef>,
}

impl Player {
    /// The player's fleet id, if they belong to a fleet.
    pub fn fleet_id(&self) -> Option<FleetId> {
        self.fleet
            .as_ref()
            .map(|fleet| fleet.id)
            .filter(|id| !id.is_zero())
    }
}

/// A member of the player's fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetMember {
    /// Member database id.
    #[serde(default)]
    pub dbid: u64,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Fleet rank.
    #[serde(default)]
    pub rank: String,
    /// Player level.
    #[serde(default)]
    pub level: u32,
}

/// A squad inside the player's fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSquad {
    /// Squad id.
    #[serde(default)]
    pub id: u64,
    /// Squad name.
    #[serde(default)]
    pub name: String,
}

/// Fleet summary returned by `fleet/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    /// Fleet id.
    #[serde(default)]
    pub id: FleetId,
    /// Fleet name.
    #[serde(default)]
    pub name: String,
    /// Message of the day.
    #[serde(default)]
    pub motd: Option<String>,
    /// Current member count.
    #[serde(default)]
    pub cursize: u32,
}

/// A starbase room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarbaseRoom {
    /// Room id.
    #[serde(default)]
    pub id: u64,
    /// Room name.
    #[serde(default)]
    pub name: String,
    /// Upgrade level.
    #[serde(default)]
    pub level: u32,
}

/// Everything the fleet stage loads, present only for fleet members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetData {
    /// Fleet summary.
    pub fleet: Fleet,
    /// Fleet members.
    pub members: Vec<FleetMember>,
    /// Fleet squads.
    pub squads: Vec<FleetSquad>,
    /// Starbase rooms.
    pub starbase_rooms: Vec<StarbaseRoom>,
}

/// Display names for crew and ship traits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Crew trait key to display name.
    #[serde(default)]
    pub trait_names: BTreeMap<String, String>,
    /// Ship trait key to display name.
    #[serde(default)]
    pub ship_trait_names: BTreeMap<String, String>,
}

impl PlatformConfig {
    /// Display name of a crew trait, falling back to the key.
    pub fn trait_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.trait_names.get(key).map_or(key, String::as_str)
    }

    /// Display name of a ship trait, falling back to the key.
    pub fn ship_trait_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.ship_trait_names.get(key).map_or(key, String::as_str)
    }
}
