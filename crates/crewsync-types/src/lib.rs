//! Shared type definitions for the crewsync game-data client.
//!
//! This crate is the single source of truth for the entities the client
//! synchronizes (crew, ships, items, equipment, missions) and for the
//! payload of every server endpoint it calls. It performs no I/O.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for the server's numeric ids
//! - [`common`] -- Small shared value types (icons)
//! - [`equipment`] -- Equipment archetypes, recipes, digest and cache entry
//! - [`crew`] -- Crew avatars, owned crew, skills and roster entries
//! - [`ship`] -- Ships and schematics
//! - [`item`] -- Inventory items
//! - [`mission`] -- Missions, quests, challenges and disputes
//! - [`player`] -- Player record, fleet and starbase data, platform config
//! - [`success`] -- Challenge scoring results and the crew complement
//! - [`payloads`] -- Per-endpoint response structs

pub mod common;
pub mod crew;
pub mod equipment;
pub mod ids;
pub mod item;
pub mod mission;
pub mod payloads;
pub mod player;
pub mod ship;
pub mod success;

// Re-export all public types at crate root for convenience.
pub use common::Icon;
pub use crew::{
    CrewAvatar, CrewSkills, EquipmentSlot, OwnedCrew, RosterEntry, Skill, SkillRange,
    StoredImmortal, WireEquipmentSlot, WireSkill,
};
pub use equipment::{
    EquipmentArchetype, EquipmentCacheEntry, ItemArchetypeCache, Recipe, RecipeDemand,
    RecipeDigest,
};
pub use ids::{ArchetypeId, CrewId, FleetId, ItemId, MissionId, QuestId, ShipId};
pub use item::Item;
pub use mission::{
    CONFLICT_QUEST, CadetSchedule, Challenge, Dispute, MasteryLevel, Mission, MissionInfo,
    MissionRef, Quest, TUTORIAL_DISPUTE_SYMBOL, TUTORIAL_MISSION_SYMBOL, TraitBonus,
};
pub use payloads::{
    ConflictInfoResponse, CraftConfig, CrewAvatarsResponse, FleetMembersResponse, FleetResponse,
    FrozenCrewResponse, ItemDescriptionResponse, MissionInfoCharacter, MissionInfoResponse,
    PlatformConfigResponse, PlayerResponse, RecipeTree, ServerConfigBody, ServerConfigResponse,
    ShipSchematicsResponse, StarbaseCharacter, StarbaseEntry,
};
pub use player::{
    Character, Fleet, FleetData, FleetMember, FleetRef, FleetSquad, PlatformConfig, Player,
    StarbaseRoom, VoyageDescription,
};
pub use ship::{Ship, ShipSchematic};
pub use success::{ChallengeSuccess, ComplementResult, CrewSuccess};
