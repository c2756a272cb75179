//! Typed game-server endpoints.
//!
//! [`GameApi`] wraps a [`Transport`], attaches credentials to every request,
//! and validates each reply into a payload struct from `crewsync_types`.
//! A reply that decodes but lacks a field the client cannot do without is a
//! [`SyncError::DataShape`] naming the endpoint.

use crewsync_cache::QuestRecord;
use crewsync_types::{
    ConflictInfoResponse, CrewAvatar, CrewAvatarsResponse, EquipmentArchetype, Fleet,
    FleetId, FleetMember, FleetMembersResponse, FleetResponse, FleetSquad, FrozenCrewResponse,
    ItemDescriptionResponse, MissionId, MissionInfo, MissionInfoResponse, OwnedCrew,
    PlatformConfig, PlatformConfigResponse, Player, PlayerResponse, QuestId, RecipeDigest,
    ServerConfigResponse, ShipSchematic, ShipSchematicsResponse, StarbaseEntry, StarbaseRoom,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::{CLIENT_API_VERSION, CLIENT_PLATFORM, CLIENT_VERSION};
use crate::error::SyncError;
use crate::transport::{Query, Transport};

/// The player record together with the archetypes the server sent alongside it.
#[derive(Debug, Clone, Default)]
pub struct PlayerData {
    /// The player.
    pub player: Player,
    /// Equipment archetypes already described by the player endpoint.
    pub archetypes: Vec<EquipmentArchetype>,
}

/// Fleet members and squads from `fleet/complete_member_info`.
#[derive(Debug, Clone, Default)]
pub struct FleetMembers {
    /// Members.
    pub members: Vec<FleetMember>,
    /// Squads.
    pub squads: Vec<FleetSquad>,
}

/// Typed client for the game server.
pub struct GameApi<T> {
    transport: T,
    access_token: Option<String>,
}

impl<T: Transport> GameApi<T> {
    /// Create a client; requests fail with [`SyncError::NotAuthorized`]
    /// until a token is present.
    pub const fn new(transport: T, access_token: Option<String>) -> Self {
        Self {
            transport,
            access_token,
        }
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether an access token is configured.
    pub const fn is_logged_in(&self) -> bool {
        self.access_token.is_some()
    }

    fn token(&self) -> Result<&str, SyncError> {
        self.access_token.as_deref().ok_or(SyncError::NotAuthorized)
    }

    /// GET with `client_api` and `access_token` attached, decoded into `R`.
    async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: Query,
        what: &str,
    ) -> Result<R, SyncError> {
        let token = self.token()?;
        let query = query
            .with("client_api", &CLIENT_API_VERSION)
            .with("access_token", token);
        let body = self.transport.get(path, &query).await?;
        decode(body, what)
    }

    /// Form POST with `client_api` and the bearer token, decoded into `R`.
    async fn post<R: DeserializeOwned>(
        &self,
        path: &str,
        form: Query,
        what: &str,
    ) -> Result<R, SyncError> {
        let token = self.token()?;
        let form = form.with("client_api", &CLIENT_API_VERSION);
        let body = self.transport.post(path, &form, Some(token)).await?;
        decode(body, what)
    }

    /// `character/get_avatar_crew_archetypes`: the crew catalogue.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `crew_avatars` is absent.
    pub async fn load_crew_avatars(&self) -> Result<Vec<CrewAvatar>, SyncError> {
        let reply: CrewAvatarsResponse = self
            .get("character/get_avatar_crew_archetypes", Query::new(), "crew avatars")
            .await?;
        reply
            .crew_avatars
            .ok_or_else(|| SyncError::data_shape("crew avatars"))
    }

    /// `config`: the server configuration, reduced to the recipe digest.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `config.craft_config.recipe_tree.digest`
    /// is absent.
    pub async fn load_server_config(&self) -> Result<RecipeDigest, SyncError> {
        let query = Query::new()
            .with("platform", "WebGLPlayer")
            .with("device_type", "Desktop")
            .with("client_version", CLIENT_VERSION)
            .with("platform_folder", CLIENT_PLATFORM);
        let reply: ServerConfigResponse = self.get("config", query, "server config").await?;
        reply
            .digest()
            .cloned()
            .ok_or_else(|| SyncError::data_shape("server config"))
    }

    /// `config/platform`: trait display names.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `config` is absent.
    pub async fn load_platform_config(&self) -> Result<PlatformConfig, SyncError> {
        let reply: PlatformConfigResponse = self
            .get("config/platform", Query::new(), "platform config")
            .await?;
        reply
            .config
            .ok_or_else(|| SyncError::data_shape("platform config"))
    }

    /// `ship_schematic`: the ship catalogue.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `schematics` is absent.
    pub async fn load_ship_schematics(&self) -> Result<Vec<ShipSchematic>, SyncError> {
        let reply: ShipSchematicsResponse = self
            .get("ship_schematic", Query::new(), "ship schematics")
            .await?;
        reply
            .schematics
            .ok_or_else(|| SyncError::data_shape("ship schematics"))
    }

    /// `player`: the player record.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `player` is absent.
    pub async fn load_player_data(&self) -> Result<PlayerData, SyncError> {
        let reply: PlayerResponse = self.get("player", Query::new(), "player data").await?;
        let player = reply
            .player
            .ok_or_else(|| SyncError::data_shape("player data"))?;
        Ok(PlayerData {
            player,
            archetypes: reply.item_archetype_cache.archetypes,
        })
    }

    /// `player/resync_currency`: a fresh player record with current balances.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `player` is absent.
    pub async fn resync_currency(&self) -> Result<Player, SyncError> {
        let reply: PlayerResponse = self
            .get("player/resync_currency", Query::new(), "currency resync")
            .await?;
        reply
            .player
            .ok_or_else(|| SyncError::data_shape("currency resync"))
    }

    /// `player/inspect/{id}`: another player's public record.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `player` is absent.
    pub async fn inspect_player(&self, player_id: u64) -> Result<Player, SyncError> {
        let reply: PlayerResponse = self
            .get(&format!("player/inspect/{player_id}"), Query::new(), "player inspect")
            .await?;
        reply
            .player
            .ok_or_else(|| SyncError::data_shape("player inspect"))
    }

    /// `fleet/complete_member_info`: members and squads of a fleet.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `members` is absent.
    pub async fn load_fleet_members(&self, fleet_id: FleetId) -> Result<FleetMembers, SyncError> {
        let form = Query::new().with("guild_id", &fleet_id);
        let reply: FleetMembersResponse = self
            .post("fleet/complete_member_info", form, "fleet members")
            .await?;
        let members = reply
            .members
            .ok_or_else(|| SyncError::data_shape("fleet members"))?;
        Ok(FleetMembers {
            members,
            squads: reply.squads,
        })
    }

    /// `fleet/{id}`: fleet summary.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `fleet` is absent.
    pub async fn load_fleet(&self, fleet_id: FleetId) -> Result<Fleet, SyncError> {
        let reply: FleetResponse = self
            .get(&format!("fleet/{fleet_id}"), Query::new(), "fleet")
            .await?;
        reply.fleet.ok_or_else(|| SyncError::data_shape("fleet"))
    }

    /// `starbase/get`: rooms of the fleet starbase.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if the body is not an array.
    pub async fn load_starbase(&self) -> Result<Vec<StarbaseRoom>, SyncError> {
        let entries: Vec<StarbaseEntry> = self.get("starbase/get", Query::new(), "starbase").await?;
        Ok(entries
            .into_iter()
            .flat_map(|entry| entry.character.starbase_rooms)
            .collect())
    }

    /// `stasis_vault/immortal_restore_info`: details of a frozen crew member.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `crew` is absent.
    pub async fn load_frozen_crew(&self, symbol: &str) -> Result<OwnedCrew, SyncError> {
        let form = Query::new().with("symbol", symbol);
        let reply: FrozenCrewResponse = self
            .post("stasis_vault/immortal_restore_info", form, "frozen crew")
            .await?;
        reply.crew.ok_or_else(|| SyncError::data_shape("frozen crew"))
    }

    /// `item/description`: archetypes for up to one batch of ids.
    ///
    /// An absent archetype cache means none of the ids were described and
    /// yields an empty list.
    ///
    /// # Errors
    ///
    /// Transport failures only.
    pub async fn load_item_descriptions<I>(
        &self,
        ids: I,
    ) -> Result<Vec<EquipmentArchetype>, SyncError>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let query = Query::new().with_list("ids", ids);
        let reply: ItemDescriptionResponse = self
            .get("item/description", query, "item descriptions")
            .await?;
        Ok(reply
            .item_archetype_cache
            .map(|cache| cache.archetypes)
            .unwrap_or_default())
    }

    /// `mission/info`: details of the given missions.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `character.accepted_missions` is absent.
    pub async fn load_mission_info(
        &self,
        ids: &[MissionId],
    ) -> Result<Vec<MissionInfo>, SyncError> {
        let query = Query::new().with_list("ids", ids.iter());
        let reply: MissionInfoResponse = self.get("mission/info", query, "mission info").await?;
        reply
            .character
            .and_then(|character| character.accepted_missions)
            .ok_or_else(|| SyncError::data_shape("mission info"))
    }

    /// `quest/conflict_info`: challenge details of a conflict quest.
    ///
    /// # Errors
    ///
    /// [`SyncError::DataShape`] if `mastery_levels` is absent.
    pub async fn load_conflict_info(&self, quest_id: QuestId) -> Result<QuestRecord, SyncError> {
        let query = Query::new().with("id", &quest_id);
        let reply: ConflictInfoResponse = self
            .get("quest/conflict_info", query, "conflict info")
            .await?;
        let mastery_levels = reply
            .mastery_levels
            .ok_or_else(|| SyncError::data_shape("conflict info"))?;
        Ok(QuestRecord {
            id: quest_id,
            description: reply.description,
            challenges: reply.challenges,
            mastery_levels,
            cadet: reply.cadet,
            crew_requirement: reply.crew_requirement,
        })
    }
}

/// Decode a reply body, reporting a mismatch as a data-shape error.
fn decode<R: DeserializeOwned>(body: Value, what: &str) -> Result<R, SyncError> {
    serde_json::from_value(body).map_err(|e| {
        debug!(endpoint = what, error = %e, "reply did not match expected shape");
        SyncError::data_shape(what)
    })
}
