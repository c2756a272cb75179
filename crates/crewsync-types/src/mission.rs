//! Missions, quests, challenges and dispute episodes.

use serde::{Deserialize, Serialize};

use crate::ids::{MissionId, QuestId};

/// Symbol of the tutorial mission, never loaded.
pub const TUTORIAL_MISSION_SYMBOL: &str = "mission_npev2";

/// Symbol of the tutorial dispute, never loaded.
pub const TUTORIAL_DISPUTE_SYMBOL: &str = "dispute_logic_under_fire_NPE";

/// Quest type string of skill-check quests.
pub const CONFLICT_QUEST: &str = "ConflictQuest";

/// A mission reference as listed on the player's character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionRef {
    /// Mission id.
    pub id: MissionId,
    /// Internal symbol.
    #[serde(default)]
    pub symbol: String,
    /// Whether the mission belongs to the main story line.
    #[serde(default)]
    pub main_story: bool,
}

/// Cadet challenge schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadetSchedule {
    /// Currently scheduled cadet missions.
    #[serde(default)]
    pub missions: Vec<MissionRef>,
}

/// A dispute (episode) history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Dispute id.
    #[serde(default)]
    pub id: u64,
    /// Internal symbol.
    #[serde(default)]
    pub symbol: String,
    /// Episode name.
    #[serde(default)]
    pub name: String,
    /// Episode number.
    #[serde(default)]
    pub episode: u32,
    /// Missions making up the episode.
    #[serde(default)]
    pub mission_ids: Vec<MissionId>,
    /// Stars earned so far.
    #[serde(default)]
    pub stars_earned: u32,
    /// Stars available.
    #[serde(default)]
    pub total_stars: u32,
    /// Quests collected from `mission/info`, filled in by the mission loader.
    #[serde(default)]
    pub quests: Vec<Quest>,
}

impl Dispute {
    /// Whether this is the tutorial dispute.
    pub fn is_tutorial(&self) -> bool {
        self.symbol == TUTORIAL_DISPUTE_SYMBOL
    }
}

/// Trait bonus applying to a challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitBonus {
    /// Trait key.
    #[serde(rename = "trait")]
    pub trait_name: String,
    /// Bonus per mastery level.
    #[serde(default)]
    pub bonuses: Vec<u32>,
}

/// One skill check node of a conflict quest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge id, unique within the quest.
    pub id: u32,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Skill key tested by the challenge.
    #[serde(default)]
    pub skill: String,
    /// Difficulty per mastery level.
    #[serde(default)]
    pub difficulty_by_mastery: Vec<u32>,
    /// Trait bonuses.
    #[serde(default)]
    pub trait_bonuses: Vec<TraitBonus>,
}

/// A mastery level of a quest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryLevel {
    /// Mastery index.
    #[serde(default)]
    pub id: u32,
}

/// A quest inside a mission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Quest id.
    pub id: QuestId,
    /// Display name; unnamed quests are skipped.
    #[serde(default)]
    pub name: Option<String>,
    /// Quest type, e.g. [`CONFLICT_QUEST`].
    #[serde(default)]
    pub quest_type: String,
    /// Whether the quest is still locked.
    #[serde(default)]
    pub locked: bool,
    /// Description, or `Ship battle` for non-conflict quests.
    #[serde(default)]
    pub description: Option<String>,
    /// Challenges of a conflict quest.
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    /// Mastery levels of a conflict quest.
    #[serde(default)]
    pub mastery_levels: Vec<MasteryLevel>,
    /// Whether this is a cadet challenge.
    #[serde(default)]
    pub cadet: Option<bool>,
    /// Cadet crew requirement (passed through untouched).
    #[serde(default)]
    pub crew_requirement: Option<serde_json::Value>,
}

impl Quest {
    /// Whether the quest is a skill-check conflict quest.
    pub fn is_conflict(&self) -> bool {
        self.quest_type == CONFLICT_QUEST
    }
}

/// A mission as returned by `mission/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionInfo {
    /// Mission id.
    pub id: MissionId,
    /// Internal symbol.
    #[serde(default)]
    pub symbol: String,
    /// Episode title; absent for missions that belong to a dispute.
    #[serde(default)]
    pub episode_title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Stars earned so far.
    #[serde(default)]
    pub stars_earned: u32,
    /// Stars available.
    #[serde(default)]
    pub total_stars: u32,
    /// Quests of the mission.
    #[serde(default)]
    pub quests: Vec<Quest>,
}

/// A mission (or dispute episode presented as one) with its loaded quests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    /// Mission id (first mission id for episodes).
    pub id: MissionId,
    /// Episode title.
    pub episode_title: String,
    /// Description.
    pub description: String,
    /// Stars earned so far.
    pub stars_earned: u32,
    /// Stars available.
    pub total_stars: u32,
    /// Unlocked, named quests.
    pub quests: Vec<Quest>,
}

impl Mission {
    /// Whether every star of the mission has been earned.
    pub const fn is_complete(&self) -> bool {
        self.stars_earned == self.total_stars
    }
}
