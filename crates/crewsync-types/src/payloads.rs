//! Per-endpoint response payloads.
//!
//! Every server response is deserialized into one of these structs before
//! any field is read. Fields the client cannot work without are `Option`s so
//! that their absence can be reported as a data-shape error naming the
//! endpoint, instead of a generic deserialization failure.

use serde::{Deserialize, Serialize};

use crate::crew::{CrewAvatar, OwnedCrew};
use crate::equipment::{ItemArchetypeCache, RecipeDigest};
use crate::mission::{MasteryLevel, MissionInfo, Challenge};
use crate::player::{Fleet, FleetMember, FleetSquad, PlatformConfig, Player, StarbaseRoom};
use crate::ship::ShipSchematic;

/// `character/get_avatar_crew_archetypes`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CrewAvatarsResponse {
    /// The full crew catalogue.
    pub crew_avatars: Option<Vec<CrewAvatar>>,
}

/// `recipe_tree` block of the server config.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecipeTree {
    /// Version fingerprint of the recipe tree.
    pub digest: Option<RecipeDigest>,
}

/// `craft_config` block of the server config.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CraftConfig {
    /// Recipe tree metadata.
    pub recipe_tree: Option<RecipeTree>,
}

/// `config` block of the server config.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfigBody {
    /// Crafting configuration.
    pub craft_config: Option<CraftConfig>,
}

/// `config`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfigResponse {
    /// Server configuration.
    pub config: Option<ServerConfigBody>,
}

impl ServerConfigResponse {
    /// The recipe digest, if every enclosing block is present.
    pub fn digest(&self) -> Option<&RecipeDigest> {
        self.config
            .as_ref()
            .and_then(|config| config.craft_config.as_ref())
            .and_then(|craft| craft.recipe_tree.as_ref())
            .and_then(|tree| tree.digest.as_ref())
    }
}

/// `config/platform`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlatformConfigResponse {
    /// Trait display names.
    pub config: Option<PlatformConfig>,
}

/// `ship_schematic`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShipSchematicsResponse {
    /// Ship catalogue.
    pub schematics: Option<Vec<ShipSchematic>>,
}

/// `player`, `player/resync_currency`, `player/inspect/{id}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerResponse {
    /// The player record.
    pub player: Option<Player>,
    /// Archetypes the server already knows the player needs.
    #[serde(default)]
    pub item_archetype_cache: ItemArchetypeCache,
}

/// `fleet/complete_member_info`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FleetMembersResponse {
    /// Fleet members.
    pub members: Option<Vec<FleetMember>>,
    /// Fleet squads.
    #[serde(default)]
    pub squads: Vec<FleetSquad>,
}

/// `fleet/{id}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FleetResponse {
    /// Fleet summary.
    pub fleet: Option<Fleet>,
}

/// Character block of one `starbase/get` entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StarbaseCharacter {
    /// Starbase rooms.
    #[serde(default)]
    pub starbase_rooms: Vec<StarbaseRoom>,
}

/// One element of the `starbase/get` array.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StarbaseEntry {
    /// Character block.
    #[serde(default)]
    pub character: StarbaseCharacter,
}

/// `stasis_vault/immortal_restore_info`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FrozenCrewResponse {
    /// Restored crew details.
    pub crew: Option<OwnedCrew>,
}

/// `item/description`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ItemDescriptionResponse {
    /// Described archetypes; absent when none of the ids were valid.
    pub item_archetype_cache: Option<ItemArchetypeCache>,
}

/// Character block of `mission/info`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MissionInfoCharacter {
    /// Missions with quest details.
    pub accepted_missions: Option<Vec<MissionInfo>>,
}

/// `mission/info`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MissionInfoResponse {
    /// Character block.
    pub character: Option<MissionInfoCharacter>,
}

/// `quest/conflict_info`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConflictInfoResponse {
    /// Quest description.
    #[serde(default)]
    pub description: Option<String>,
    /// Challenges.
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    /// Mastery levels; their absence marks an invalid reply.
    pub mastery_levels: Option<Vec<MasteryLevel>>,
    /// Cadet flag.
    #[serde(default)]
    pub cadet: Option<bool>,
    /// Cadet crew requirement.
    #[serde(default)]
    pub crew_requirement: Option<serde_json::Value>,
}
