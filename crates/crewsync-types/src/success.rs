//! Challenge scoring results and the minimal crew complement.

use serde::{Deserialize, Serialize};

use crate::ids::{CrewId, MissionId, QuestId};

/// One crew candidate's chance of passing a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrewSuccess {
    /// Crew archetype id.
    pub crew_id: CrewId,
    /// Success score (percent, 0 to 100).
    pub success: f64,
}

/// Scored crew candidates for a single challenge.
///
/// `crew` is sorted by descending `success`; the first candidate is the
/// challenge's best pick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSuccess {
    /// Mission the challenge belongs to.
    pub mission_id: MissionId,
    /// Quest the challenge belongs to.
    pub quest_id: QuestId,
    /// Challenge id within the quest.
    pub challenge_id: u32,
    /// Skill key tested.
    pub skill: String,
    /// Candidates, best first.
    pub crew: Vec<CrewSuccess>,
}

impl ChallengeSuccess {
    /// Build an entry from unsorted candidates, sorting them best first.
    pub fn sorted(
        mission_id: MissionId,
        quest_id: QuestId,
        challenge_id: u32,
        skill: impl Into<String>,
        mut crew: Vec<CrewSuccess>,
    ) -> Self {
        crew.sort_by(|a, b| b.success.total_cmp(&a.success));
        Self {
            mission_id,
            quest_id,
            challenge_id,
            skill: skill.into(),
            crew,
        }
    }
}

/// Partition of every observed crew id into needed and unneeded crew.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplementResult {
    /// Crew that must be kept to reproduce every challenge's best score.
    pub needed_crew: Vec<CrewId>,
    /// Crew whose removal changes no challenge's best score.
    pub unneeded_crew: Vec<CrewId>,
}
