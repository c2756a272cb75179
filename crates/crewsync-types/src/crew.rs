//! Crew avatars (the static catalogue), owned crew as the server sends them,
//! and the merged [`RosterEntry`] the client works with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::Icon;
use crate::ids::{ArchetypeId, CrewId};

/// The six crew skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    /// `command_skill`
    #[serde(rename = "command_skill")]
    Command,
    /// `science_skill`
    #[serde(rename = "science_skill")]
    Science,
    /// `security_skill`
    #[serde(rename = "security_skill")]
    Security,
    /// `engineering_skill`
    #[serde(rename = "engineering_skill")]
    Engineering,
    /// `diplomacy_skill`
    #[serde(rename = "diplomacy_skill")]
    Diplomacy,
    /// `medicine_skill`
    #[serde(rename = "medicine_skill")]
    Medicine,
}

impl Skill {
    /// All skills in display order.
    pub const ALL: [Self; 6] = [
        Self::Command,
        Self::Science,
        Self::Security,
        Self::Engineering,
        Self::Diplomacy,
        Self::Medicine,
    ];

    /// The key the server uses for this skill.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Command => "command_skill",
            Self::Science => "science_skill",
            Self::Security => "security_skill",
            Self::Engineering => "engineering_skill",
            Self::Diplomacy => "diplomacy_skill",
            Self::Medicine => "medicine_skill",
        }
    }

    /// Three-letter abbreviation.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Command => "CMD",
            Self::Science => "SCI",
            Self::Security => "SEC",
            Self::Engineering => "ENG",
            Self::Diplomacy => "DIP",
            Self::Medicine => "MED",
        }
    }

    /// Parse a server skill key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|skill| skill.key() == key)
    }
}

/// Core value plus the proficiency roll range of one skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRange {
    /// Guaranteed base value.
    pub core: u32,
    /// Minimum proficiency roll.
    pub min: u32,
    /// Maximum proficiency roll.
    pub max: u32,
}

impl SkillRange {
    /// Expected value of a skill check: `core + (min + max) / 2`, floored.
    pub const fn average(self) -> u32 {
        self.core
            .saturating_add(self.min.saturating_add(self.max) / 2)
    }
}

/// Skill block of a roster entry, one [`SkillRange`] per [`Skill`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewSkills {
    /// Command.
    pub command_skill: SkillRange,
    /// Science.
    pub science_skill: SkillRange,
    /// Security.
    pub security_skill: SkillRange,
    /// Engineering.
    pub engineering_skill: SkillRange,
    /// Diplomacy.
    pub diplomacy_skill: SkillRange,
    /// Medicine.
    pub medicine_skill: SkillRange,
}

impl CrewSkills {
    /// Read one skill.
    pub const fn get(&self, skill: Skill) -> SkillRange {
        match skill {
            Skill::Command => self.command_skill,
            Skill::Science => self.science_skill,
            Skill::Security => self.security_skill,
            Skill::Engineering => self.engineering_skill,
            Skill::Diplomacy => self.diplomacy_skill,
            Skill::Medicine => self.medicine_skill,
        }
    }

    /// Mutable access to one skill.
    pub const fn get_mut(&mut self, skill: Skill) -> &mut SkillRange {
        match skill {
            Skill::Command => &mut self.command_skill,
            Skill::Science => &mut self.science_skill,
            Skill::Security => &mut self.security_skill,
            Skill::Engineering => &mut self.engineering_skill,
            Skill::Diplomacy => &mut self.diplomacy_skill,
            Skill::Medicine => &mut self.medicine_skill,
        }
    }
}

/// Catalogue entry for a crew member, owned or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewAvatar {
    /// Crew archetype id.
    pub id: CrewId,
    /// Full name.
    #[serde(default)]
    pub name: String,
    /// Short name.
    #[serde(default)]
    pub short_name: String,
    /// Highest rarity this crew can reach.
    #[serde(default)]
    pub max_rarity: u8,
    /// Internal symbol, also the key of the immortals cache.
    #[serde(default)]
    pub symbol: String,
    /// Portrait asset.
    #[serde(default)]
    pub portrait: Icon,
    /// Full-body asset.
    #[serde(default)]
    pub full_body: Icon,
    /// Resolved portrait URL, filled in by the avatar image fan-out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Skill as it appears on an owned crew record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSkill {
    /// Base value.
    #[serde(default)]
    pub core: u32,
    /// Minimum roll.
    #[serde(default)]
    pub range_min: u32,
    /// Maximum roll.
    #[serde(default)]
    pub range_max: u32,
}

/// Equipment slot as it appears on an owned crew record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEquipmentSlot {
    /// Level at which the slot unlocks.
    #[serde(default)]
    pub level: u32,
    /// Archetype that fills the slot.
    pub archetype: ArchetypeId,
}

/// Owned (or restored frozen) crew member as the server sends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCrew {
    /// Instance id of this crew member.
    #[serde(default)]
    pub id: u64,
    /// Crew archetype id (matches [`CrewAvatar::id`]).
    #[serde(default)]
    pub archetype_id: CrewId,
    /// Internal symbol.
    #[serde(default)]
    pub symbol: String,
    /// Current level.
    #[serde(default)]
    pub level: u32,
    /// Current rarity.
    #[serde(default)]
    pub rarity: u8,
    /// Whether the crew sits in the buy-back list.
    #[serde(default)]
    pub in_buy_back_state: bool,
    /// Active assignment id, if any.
    #[serde(default)]
    pub active_id: Option<u64>,
    /// Skills keyed by server skill key.
    #[serde(default)]
    pub skills: BTreeMap<String, WireSkill>,
    /// Equipment slots in unlock order.
    #[serde(default)]
    pub equipment_slots: Vec<WireEquipmentSlot>,
    /// Equipped items; the first element of each entry is the slot index.
    #[serde(default)]
    pub equipment: Vec<Vec<u64>>,
    /// Visible traits.
    #[serde(default)]
    pub traits: Vec<String>,
    /// Hidden traits.
    #[serde(default)]
    pub traits_hidden: Vec<String>,
    /// Ship battle stats (passed through untouched).
    #[serde(default)]
    pub ship_battle: serde_json::Value,
    /// Ship battle action (passed through untouched).
    #[serde(default)]
    pub action: serde_json::Value,
    /// Flavor text.
    #[serde(default)]
    pub flavor: String,
}

/// A frozen crew member stored in the stasis vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImmortal {
    /// Crew archetype id.
    pub id: CrewId,
    /// Number of frozen copies.
    #[serde(default)]
    pub quantity: u32,
}

/// One equipment slot of a roster entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentSlot {
    /// Archetype that fills the slot; a closure-resolver seed.
    pub archetype_id: ArchetypeId,
    /// Level at which the slot unlocks.
    pub level: u32,
    /// Whether the crew member currently has the item equipped.
    pub have: bool,
}

/// A crew member of the player's roster, merged from avatar and owned data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Crew archetype id.
    pub id: CrewId,
    /// Full name.
    pub name: String,
    /// Short name.
    pub short_name: String,
    /// Internal symbol.
    pub symbol: String,
    /// Highest reachable rarity.
    pub max_rarity: u8,
    /// Current level.
    pub level: u32,
    /// Current rarity.
    pub rarity: u8,
    /// Number of frozen copies (0 for active crew).
    pub frozen: u32,
    /// Whether the crew sits in the buy-back list.
    pub buyback: bool,
    /// Owned instance id.
    pub crew_id: Option<u64>,
    /// Active assignment id.
    pub active_id: Option<u64>,
    /// Skill values.
    pub skills: CrewSkills,
    /// Display trait names, comma separated.
    pub traits: String,
    /// Raw trait keys (visible and hidden).
    pub raw_traits: Vec<String>,
    /// Portrait asset.
    pub portrait: Icon,
    /// Full-body asset.
    pub full_body: Icon,
    /// Equipment slots.
    pub equipment_slots: Vec<EquipmentSlot>,
    /// Ship battle stats.
    pub ship_battle: serde_json::Value,
    /// Ship battle action.
    pub action: serde_json::Value,
    /// Flavor text.
    pub flavor: String,
    /// Resolved portrait URL.
    pub icon_url: Option<String>,
    /// Resolved full-body URL.
    pub icon_body_url: Option<String>,
}

impl RosterEntry {
    /// Default roster entry for a crew avatar, before owned data is applied.
    pub fn from_avatar(avatar: &CrewAvatar) -> Self {
        Self {
            id: avatar.id,
            name: avatar.name.clone(),
            short_name: avatar.short_name.clone(),
            symbol: avatar.symbol.clone(),
            max_rarity: avatar.max_rarity,
            portrait: avatar.portrait.clone(),
            full_body: avatar.full_body.clone(),
            ..Self::default()
        }
    }
}
