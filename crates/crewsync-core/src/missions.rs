//! Mission loading.
//!
//! Builds the mission list from the player's accepted missions, cadet
//! schedule and episode (dispute) history, then loads the challenge details
//! of every conflict quest.

use std::collections::{HashMap, HashSet};

use crewsync_cache::{CacheStore, QuestRecord, Table};
use crewsync_types::{
    Character, Dispute, Mission, MissionId, MissionInfo, Quest, QuestId, TUTORIAL_MISSION_SYMBOL,
};
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::api::GameApi;
use crate::error::SyncError;
use crate::transport::Transport;

/// Description given to quests that are not skill checks.
pub const SHIP_BATTLE_DESCRIPTION: &str = "Ship battle";

/// Load every mission the player can see, with conflict quest details.
///
/// Only main-story accepted missions are considered. Episodes become missions
/// titled `Episode N : name`, appended after the regular missions.
///
/// # Errors
///
/// Returns a [`SyncError`] if mission info or any conflict quest fails to
/// load; a single failed quest fails the whole stage.
pub async fn load_missions<T, C>(
    api: &GameApi<T>,
    cache: &C,
    character: &Character,
) -> Result<Vec<Mission>, SyncError>
where
    T: Transport,
    C: CacheStore + ?Sized,
{
    let mut disputes: Vec<Dispute> = character
        .dispute_histories
        .iter()
        .filter(|dispute| !dispute.is_tutorial())
        .cloned()
        .collect();

    let ids = mission_ids(character, &disputes);
    let infos = api.load_mission_info(&ids).await?;

    let mut missions = Vec::new();
    let mut pending: Vec<(QuestId, bool)> = Vec::new();
    for info in infos {
        if info.symbol == TUTORIAL_MISSION_SYMBOL {
            continue;
        }
        match info.episode_title.clone() {
            Some(episode_title) => {
                let completed = info.stars_earned == info.total_stars;
                let quests = playable_quests(info.quests)
                    .inspect(|quest| queue_details(quest, completed, &mut pending))
                    .collect();
                missions.push(Mission {
                    id: info.id,
                    episode_title,
                    description: info.description,
                    stars_earned: info.stars_earned,
                    total_stars: info.total_stars,
                    quests,
                });
            }
            None => attach_to_disputes(&info, &mut disputes, &mut pending),
        }
    }

    let details = load_quest_details(api, cache, pending).await?;
    for dispute in disputes {
        missions.push(Mission {
            id: dispute.mission_ids.first().copied().unwrap_or_default(),
            episode_title: format!("Episode {} : {}", dispute.episode, dispute.name),
            description: format!("Episode {}", dispute.episode),
            stars_earned: dispute.stars_earned,
            total_stars: dispute.total_stars,
            quests: dispute.quests,
        });
    }
    for quest in missions.iter_mut().flat_map(|mission| mission.quests.iter_mut()) {
        if let Some(record) = details.get(&quest.id) {
            apply_details(quest, record);
        } else if !quest.is_conflict() {
            quest.description = Some(SHIP_BATTLE_DESCRIPTION.to_owned());
        }
    }

    debug!(missions = missions.len(), quests = details.len(), "missions loaded");
    Ok(missions)
}

/// Cadet and main-story accepted missions, then every episode's missions.
fn mission_ids(character: &Character, disputes: &[Dispute]) -> Vec<MissionId> {
    let mut seen = HashSet::new();
    character
        .cadet_schedule
        .missions
        .iter()
        .chain(character.accepted_missions.iter().filter(|m| m.main_story))
        .filter(|mission| mission.symbol != TUTORIAL_MISSION_SYMBOL)
        .map(|mission| mission.id)
        .chain(disputes.iter().flat_map(|d| d.mission_ids.iter().copied()))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Unlocked quests that have a name.
fn playable_quests(quests: Vec<Quest>) -> impl Iterator<Item = Quest> {
    quests
        .into_iter()
        .filter(|quest| !quest.locked && quest.name.as_deref().is_some_and(|n| !n.is_empty()))
}

fn queue_details(quest: &Quest, completed: bool, pending: &mut Vec<(QuestId, bool)>) {
    if quest.is_conflict() && !pending.iter().any(|(id, _)| *id == quest.id) {
        pending.push((quest.id, completed));
    }
}

/// Add an untitled mission's quests to every episode that lists it.
fn attach_to_disputes(
    info: &MissionInfo,
    disputes: &mut [Dispute],
    pending: &mut Vec<(QuestId, bool)>,
) {
    for dispute in disputes
        .iter_mut()
        .filter(|dispute| dispute.mission_ids.contains(&info.id))
    {
        let completed = dispute.stars_earned == dispute.total_stars;
        for quest in playable_quests(info.quests.clone()) {
            if dispute.quests.iter().any(|known| known.id == quest.id) {
                continue;
            }
            queue_details(&quest, completed, pending);
            dispute.quests.push(quest);
        }
    }
}

/// Load the details of every queued conflict quest concurrently.
async fn load_quest_details<T, C>(
    api: &GameApi<T>,
    cache: &C,
    pending: Vec<(QuestId, bool)>,
) -> Result<HashMap<QuestId, QuestRecord>, SyncError>
where
    T: Transport,
    C: CacheStore + ?Sized,
{
    let records = try_join_all(
        pending
            .into_iter()
            .map(|(id, completed)| quest_details(api, cache, id, completed)),
    )
    .await?;
    Ok(records.into_iter().map(|record| (record.id, record)).collect())
}

/// Details of one conflict quest.
///
/// Quests of fully starred missions no longer change, so they are read from
/// the `quests` table when present. Everything else is fetched and cached.
async fn quest_details<T, C>(
    api: &GameApi<T>,
    cache: &C,
    quest_id: QuestId,
    completed: bool,
) -> Result<QuestRecord, SyncError>
where
    T: Transport,
    C: CacheStore + ?Sized,
{
    let key = quest_id.to_string();
    if completed {
        match cache.lookup::<QuestRecord>(Table::Quests, &key).await {
            Ok(Some(record)) => return Ok(record),
            Ok(None) => {}
            Err(e) => warn!(quest_id = %quest_id, error = %e, "quest cache read failed"),
        }
    }

    let record = api.load_conflict_info(quest_id).await?;
    if let Err(e) = cache.upsert(Table::Quests, &key, &record).await {
        warn!(quest_id = %quest_id, error = %e, "failed to cache quest details");
    }
    Ok(record)
}

fn apply_details(quest: &mut Quest, record: &QuestRecord) {
    quest.description.clone_from(&record.description);
    quest.challenges.clone_from(&record.challenges);
    quest.mastery_levels.clone_from(&record.mastery_levels);
    quest.cadet = record.cadet;
    quest.crew_requirement.clone_from(&record.crew_requirement);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use crewsync_cache::MemoryCache;
    use crewsync_types::{CadetSchedule, MissionRef};
    use serde_json::json;

    use super::*;
    use crate::testing::{FullDisk, ScriptedTransport, logged_in};

    fn mission_ref(id: u64, symbol: &str, main_story: bool) -> MissionRef {
        MissionRef {
            id: MissionId(id),
            symbol: symbol.to_owned(),
            main_story,
        }
    }

    fn character() -> Character {
        Character {
            accepted_missions: vec![
                mission_ref(1, "mission_a", true),
                mission_ref(2, "mission_side", false),
                mission_ref(3, "mission_npev2", true),
            ],
            cadet_schedule: CadetSchedule {
                missions: vec![mission_ref(4, "cadet_a", false)],
            },
            dispute_histories: vec![
                Dispute {
                    id: 1,
                    symbol: "dispute_logic_under_fire_NPE".to_owned(),
                    mission_ids: vec![MissionId(90)],
                    ..Dispute::default()
                },
                Dispute {
                    id: 2,
                    symbol: "dispute_one".to_owned(),
                    name: "Tempus".to_owned(),
                    episode: 2,
                    mission_ids: vec![MissionId(20), MissionId(21)],
                    stars_earned: 3,
                    total_stars: 3,
                    ..Dispute::default()
                },
            ],
            ..Character::default()
        }
    }

    fn mission_info() -> serde_json::Value {
        json!({"character": {"accepted_missions": [
            {"id": 1, "symbol": "mission_a", "episode_title": "Away", "description": "d",
             "stars_earned": 1, "total_stars": 3, "quests": [
                {"id": 100, "name": "Fight", "quest_type": "ConflictQuest", "locked": false},
                {"id": 101, "name": "Sail", "quest_type": "ShipBattleQuest", "locked": false},
                {"id": 102, "name": "Later", "quest_type": "ConflictQuest", "locked": true}
            ]},
            {"id": 20, "symbol": "ep_a", "stars_earned": 0, "total_stars": 0, "quests": [
                {"id": 200, "name": "Talk", "quest_type": "ConflictQuest", "locked": false}
            ]},
            {"id": 21, "symbol": "ep_b", "stars_earned": 0, "total_stars": 0, "quests": [
                {"id": 200, "name": "Talk", "quest_type": "ConflictQuest", "locked": false},
                {"id": 201, "quest_type": "ConflictQuest", "locked": false}
            ]}
        ]}})
    }

    fn conflict_info() -> serde_json::Value {
        json!({"description": "Negotiate", "mastery_levels": [{"id": 0}, {"id": 1}, {"id": 2}],
               "challenges": [{"id": 0, "name": "c", "skill": "diplomacy_skill",
                               "difficulty_by_mastery": [100, 200, 300]}]})
    }

    #[test]
    fn tutorial_and_side_missions_are_left_out() {
        let character = character();
        let disputes: Vec<Dispute> = character
            .dispute_histories
            .iter()
            .filter(|d| !d.is_tutorial())
            .cloned()
            .collect();
        let ids = mission_ids(&character, &disputes);
        assert_eq!(ids, vec![MissionId(4), MissionId(1), MissionId(20), MissionId(21)]);
    }

    #[tokio::test]
    async fn missions_and_episodes_are_built() {
        let api = logged_in(
            ScriptedTransport::default()
                .reply("mission/info", mission_info())
                .reply("quest/conflict_info", conflict_info()),
        );
        let cache = MemoryCache::new();

        let missions = load_missions(&api, &cache, &character()).await.unwrap();

        assert_eq!(missions.len(), 2);
        let away = &missions[0];
        assert_eq!(away.episode_title, "Away");
        assert_eq!(away.quests.len(), 2);
        assert_eq!(away.quests[0].description.as_deref(), Some("Negotiate"));
        assert_eq!(away.quests[0].challenges.len(), 1);
        assert_eq!(away.quests[1].description.as_deref(), Some(SHIP_BATTLE_DESCRIPTION));

        let episode = &missions[1];
        assert_eq!(episode.episode_title, "Episode 2 : Tempus");
        assert_eq!(episode.description, "Episode 2");
        assert_eq!(episode.id, MissionId(20));
        assert_eq!(episode.quests.len(), 1);

        // Quests 100 and 200.
        assert_eq!(api.transport().count("quest/conflict_info"), 2);
        assert_eq!(cache.len(Table::Quests).unwrap(), 2);
    }

    #[tokio::test]
    async fn unwritable_cache_still_yields_quest_details() {
        let api = logged_in(
            ScriptedTransport::default()
                .reply("mission/info", mission_info())
                .reply("quest/conflict_info", conflict_info()),
        );

        let missions = load_missions(&api, &FullDisk, &character()).await.unwrap();

        assert_eq!(missions.len(), 2);
        assert_eq!(missions[0].quests[0].description.as_deref(), Some("Negotiate"));
    }

    #[tokio::test]
    async fn completed_episode_quests_come_from_cache() {
        let api = logged_in(
            ScriptedTransport::default()
                .reply("mission/info", mission_info())
                .reply("quest/conflict_info", conflict_info()),
        );
        let cache = MemoryCache::new();
        load_missions(&api, &cache, &character()).await.unwrap();

        load_missions(&api, &cache, &character()).await.unwrap();

        // Quest 100 belongs to an unfinished mission and is fetched both
        // times; quest 200 belongs to a fully starred episode.
        assert_eq!(api.transport().count("quest/conflict_info"), 3);
    }

    #[tokio::test]
    async fn invalid_conflict_info_fails_the_stage() {
        let api = logged_in(
            ScriptedTransport::default()
                .reply("mission/info", mission_info())
                .reply("quest/conflict_info", json!({"description": "x"})),
        );
        let cache = MemoryCache::new();

        let result = load_missions(&api, &cache, &character()).await;
        assert!(matches!(result, Err(SyncError::DataShape { .. })));
    }
}
