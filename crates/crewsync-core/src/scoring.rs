//! Mission success scoring.
//!
//! A [`SuccessScorer`] turns the roster and the loaded missions into one
//! [`ChallengeSuccess`] entry per conflict challenge, candidates best first.
//! [`SkillScorer`] is the built-in scorer.

use std::collections::HashMap;

use crewsync_types::{
    Challenge, ChallengeSuccess, CrewId, CrewSuccess, Mission, RosterEntry, Skill,
};

/// Highest success a crew member can reach on a challenge.
pub const MAX_SUCCESS: f64 = 100.0;

/// Scores crew against mission challenges.
pub trait SuccessScorer: Send + Sync {
    /// One entry per scored challenge, candidates sorted best first.
    fn score(&self, roster: &[RosterEntry], missions: &[Mission]) -> Vec<ChallengeSuccess>;
}

/// Scores a crew member by the challenge skill's expected value plus the
/// best matching trait bonus, against the hardest mastery difficulty.
///
/// `success = min(100, 100 * value / difficulty)`. Crew with zero success
/// are dropped, and each crew id keeps its best roster entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillScorer;

impl SkillScorer {
    /// Success of one roster entry on one challenge.
    pub fn crew_success(entry: &RosterEntry, skill: Skill, challenge: &Challenge) -> f64 {
        let Some(difficulty) = challenge.difficulty_by_mastery.iter().copied().max() else {
            return 0.0;
        };
        if difficulty == 0 {
            return 0.0;
        }
        let value = entry
            .skills
            .get(skill)
            .average()
            .saturating_add(trait_bonus(entry, challenge));
        (MAX_SUCCESS * f64::from(value) / f64::from(difficulty)).min(MAX_SUCCESS)
    }
}

/// Best bonus among the challenge's trait bonuses the crew member has.
fn trait_bonus(entry: &RosterEntry, challenge: &Challenge) -> u32 {
    challenge
        .trait_bonuses
        .iter()
        .filter(|bonus| entry.raw_traits.contains(&bonus.trait_name))
        .filter_map(|bonus| bonus.bonuses.iter().copied().max())
        .max()
        .unwrap_or(0)
}

impl SuccessScorer for SkillScorer {
    fn score(&self, roster: &[RosterEntry], missions: &[Mission]) -> Vec<ChallengeSuccess> {
        let mut entries = Vec::new();
        for mission in missions {
            for quest in mission.quests.iter().filter(|quest| quest.is_conflict()) {
                for challenge in &quest.challenges {
                    let Some(skill) = Skill::from_key(&challenge.skill) else {
                        continue;
                    };
                    let mut best: HashMap<CrewId, f64> = HashMap::new();
                    let mut order = Vec::new();
                    for entry in roster {
                        let success = Self::crew_success(entry, skill, challenge);
                        if success <= 0.0 {
                            continue;
                        }
                        let slot = best.entry(entry.id).or_insert_with(|| {
                            order.push(entry.id);
                            0.0
                        });
                        *slot = slot.max(success);
                    }
                    let crew = order
                        .into_iter()
                        .filter_map(|crew_id| {
                            best.get(&crew_id)
                                .map(|&success| CrewSuccess { crew_id, success })
                        })
                        .collect();
                    entries.push(ChallengeSuccess::sorted(
                        mission.id,
                        quest.id,
                        challenge.id,
                        challenge.skill.clone(),
                        crew,
                    ));
                }
            }
        }
        entries
    }
}
