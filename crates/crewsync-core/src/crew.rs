//! Crew matching: owned and frozen crew joined with the crew catalogue.

use std::collections::HashMap;
use std::fmt::Write as _;

use crewsync_cache::{CacheStore, ImmortalRecord, Table};
use crewsync_types::{
    Character, CrewAvatar, CrewId, EquipmentSlot, OwnedCrew, PlatformConfig, RosterEntry, Skill,
    SkillRange,
};
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::api::GameApi;
use crate::error::SyncError;
use crate::transport::Transport;

/// Raw trait replaced by [`ALIEN_TRAIT`] so searches find it.
const NONHUMAN_TRAIT: &str = "nonhuman";
const ALIEN_TRAIT: &str = "alien";

/// Level of every frozen crew member.
pub const FROZEN_LEVEL: u32 = 100;

/// Build the roster from the character's owned and frozen crew.
///
/// Owned crew come first, in server order, followed by frozen crew. Crew
/// whose archetype is missing from the catalogue are logged and skipped.
/// Frozen crew details come from the `immortals` table, or from the server
/// on a miss (and are then cached); all frozen lookups run concurrently.
///
/// # Errors
///
/// Returns a [`SyncError`] if a frozen crew member cannot be loaded.
pub async fn match_crew<T, C>(
    api: &GameApi<T>,
    cache: &C,
    character: &Character,
    avatars: &[CrewAvatar],
    platform: &PlatformConfig,
) -> Result<Vec<RosterEntry>, SyncError>
where
    T: Transport,
    C: CacheStore + ?Sized,
{
    let by_id: HashMap<CrewId, &CrewAvatar> =
        avatars.iter().map(|avatar| (avatar.id, avatar)).collect();

    let mut roster: Vec<RosterEntry> = character
        .crew
        .iter()
        .filter_map(|crew| {
            let Some(avatar) = by_id.get(&crew.archetype_id) else {
                warn!(archetype_id = %crew.archetype_id, "no crew avatar for owned crew");
                return None;
            };
            let mut entry = RosterEntry::from_avatar(avatar);
            apply_owned(&mut entry, crew, platform);
            Some(entry)
        })
        .collect();

    let mut frozen: Vec<RosterEntry> = character
        .stored_immortals
        .iter()
        .filter_map(|immortal| {
            let Some(avatar) = by_id.get(&immortal.id) else {
                warn!(archetype_id = %immortal.id, "no crew avatar for frozen crew");
                return None;
            };
            let mut entry = RosterEntry::from_avatar(avatar);
            entry.frozen = immortal.quantity;
            entry.level = FROZEN_LEVEL;
            entry.rarity = entry.max_rarity;
            Some(entry)
        })
        .collect();

    let details = try_join_all(
        frozen
            .iter()
            .map(|entry| frozen_details(api, cache, &entry.symbol)),
    )
    .await?;
    for (entry, crew) in frozen.iter_mut().zip(&details) {
        apply_owned(entry, crew, platform);
    }

    debug!(
        owned = roster.len(),
        frozen = frozen.len(),
        "crew matched"
    );
    roster.append(&mut frozen);
    Ok(roster)
}

/// Details of a frozen crew member, from cache or server.
async fn frozen_details<T, C>(
    api: &GameApi<T>,
    cache: &C,
    symbol: &str,
) -> Result<OwnedCrew, SyncError>
where
    T: Transport,
    C: CacheStore + ?Sized,
{
    match cache.lookup::<ImmortalRecord>(Table::Immortals, symbol).await {
        Ok(Some(record)) => return Ok(record.crew),
        Ok(None) => {}
        Err(e) => warn!(symbol, error = %e, "immortals cache read failed"),
    }

    let crew = api.load_frozen_crew(symbol).await?;
    let record = ImmortalRecord::new(symbol, crew);
    if let Err(e) = cache.upsert(Table::Immortals, symbol, &record).await {
        warn!(symbol, error = %e, "failed to cache frozen crew");
    }
    Ok(record.crew)
}

/// Copy owned-crew state onto a roster entry.
pub fn apply_owned(entry: &mut RosterEntry, crew: &OwnedCrew, platform: &PlatformConfig) {
    entry.level = crew.level;
    entry.rarity = crew.rarity;
    entry.buyback = crew.in_buy_back_state;
    entry.crew_id = Some(crew.id);
    entry.active_id = crew.active_id;

    for (key, wire) in &crew.skills {
        if let Some(skill) = Skill::from_key(key) {
            *entry.skills.get_mut(skill) = SkillRange {
                core: wire.core,
                min: wire.range_min,
                max: wire.range_max,
            };
        }
    }

    entry.ship_battle = crew.ship_battle.clone();
    entry.action = crew.action.clone();
    entry.flavor = crew.flavor.clone();

    entry.equipment_slots = crew
        .equipment_slots
        .iter()
        .map(|slot| EquipmentSlot {
            archetype_id: slot.archetype,
            level: slot.level,
            have: false,
        })
        .collect();
    // Each equipped item is `[slot index, ...]`.
    for equipped in &crew.equipment {
        let slot = equipped
            .first()
            .and_then(|&index| usize::try_from(index).ok())
            .and_then(|index| entry.equipment_slots.get_mut(index));
        if let Some(slot) = slot {
            slot.have = true;
        }
    }

    let raw: Vec<String> = crew
        .traits
        .iter()
        .chain(&crew.traits_hidden)
        .cloned()
        .collect();
    entry.traits = raw
        .iter()
        .map(|key| platform.trait_name(key))
        .collect::<Vec<_>>()
        .join(",");
    entry.raw_traits = raw;
    if let Some(position) = entry.raw_traits.iter().position(|t| t == NONHUMAN_TRAIT) {
        entry.raw_traits.remove(position);
        entry.raw_traits.push(ALIEN_TRAIT.to_owned());
    }
}

/// One-line skill summary, e.g. `CMD (1012) DIP (845) `.
///
/// Skills with no core value are left out; each value is
/// `core + (min + max) / 2`, floored.
pub fn format_crew_stats(entry: &RosterEntry) -> String {
    Skill::ALL
        .into_iter()
        .map(|skill| (skill, entry.skills.get(skill)))
        .filter(|(_, range)| range.core > 0)
        .fold(String::new(), |mut out, (skill, range)| {
            let _ = write!(out, "{} ({}) ", skill.short_name(), range.average());
            out
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeMap;

    use crewsync_cache::MemoryCache;
    use crewsync_types::{ArchetypeId, StoredImmortal, WireEquipmentSlot, WireSkill};
    use serde_json::{Value, json};

    use super::*;
    use crate::transport::{Query, TransportError};

    /// Answers frozen-crew requests with a fixed crew and counts them.
    #[derive(Default)]
    struct Vault {
        posts: std::sync::atomic::AtomicUsize,
    }

    impl Transport for Vault {
        async fn get(&self, _path: &str, _query: &Query) -> Result<Value, TransportError> {
            Err(TransportError::status(404, "unexpected GET"))
        }

        async fn post(
            &self,
            path: &str,
            form: &Query,
            _token: Option<&str>,
        ) -> Result<Value, TransportError> {
            self.posts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            assert_eq!(path, "stasis_vault/immortal_restore_info");
            Ok(json!({"crew": {
                "id": 900,
                "archetype_id": 2,
                "symbol": form.get("symbol").unwrap_or_default(),
                "level": 100,
                "rarity": 4,
                "skills": {"science_skill": {"core": 700, "range_min": 100, "range_max": 300}},
                "traits": ["vulcan"],
            }}))
        }
    }

    fn avatar(id: u64, symbol: &str, max_rarity: u8) -> CrewAvatar {
        CrewAvatar {
            id: CrewId(id),
            name: symbol.to_owned(),
            symbol: symbol.to_owned(),
            max_rarity,
            ..CrewAvatar::default()
        }
    }

    fn platform() -> PlatformConfig {
        PlatformConfig {
            trait_names: BTreeMap::from([
                ("human".to_owned(), "Human".to_owned()),
                ("nonhuman".to_owned(), "Non-Human".to_owned()),
            ]),
            ..PlatformConfig::default()
        }
    }

    fn owned(archetype_id: u64) -> OwnedCrew {
        OwnedCrew {
            id: 500,
            archetype_id: CrewId(archetype_id),
            level: 80,
            rarity: 3,
            skills: BTreeMap::from([(
                "command_skill".to_owned(),
                WireSkill {
                    core: 500,
                    range_min: 50,
                    range_max: 101,
                },
            )]),
            equipment_slots: vec![
                WireEquipmentSlot { level: 1, archetype: ArchetypeId(10) },
                WireEquipmentSlot { level: 10, archetype: ArchetypeId(11) },
            ],
            equipment: vec![vec![1]],
            traits: vec!["nonhuman".to_owned()],
            traits_hidden: vec!["human".to_owned()],
            ..OwnedCrew::default()
        }
    }

    #[test]
    fn owned_crew_state_is_applied() {
        let mut entry = RosterEntry::from_avatar(&avatar(1, "kirk_crew", 5));
        apply_owned(&mut entry, &owned(1), &platform());

        assert_eq!(entry.level, 80);
        assert_eq!(entry.crew_id, Some(500));
        assert_eq!(entry.skills.get(Skill::Command), SkillRange { core: 500, min: 50, max: 101 });
        assert!(!entry.equipment_slots[0].have);
        assert!(entry.equipment_slots[1].have);
        assert_eq!(entry.traits, "Non-Human,Human");
        assert_eq!(entry.raw_traits, vec!["human".to_owned(), "alien".to_owned()]);
    }

    #[test]
    fn out_of_range_equipment_index_is_ignored() {
        let mut crew = owned(1);
        crew.equipment = vec![vec![7], vec![]];
        let mut entry = RosterEntry::default();
        apply_owned(&mut entry, &crew, &platform());
        assert!(entry.equipment_slots.iter().all(|slot| !slot.have));
    }

    #[test]
    fn stats_line_skips_empty_skills() {
        let mut entry = RosterEntry::default();
        *entry.skills.get_mut(Skill::Command) = SkillRange { core: 500, min: 50, max: 101 };
        *entry.skills.get_mut(Skill::Medicine) = SkillRange { core: 10, min: 1, max: 2 };
        assert_eq!(format_crew_stats(&entry), "CMD (575) MED (11) ");
    }

    #[tokio::test]
    async fn unknown_archetypes_are_skipped() {
        let api = GameApi::new(Vault::default(), Some("t".to_owned()));
        let cache = MemoryCache::new();
        let character = Character {
            crew: vec![owned(1), owned(99)],
            ..Character::default()
        };

        let roster = match_crew(&api, &cache, &character, &[avatar(1, "kirk_crew", 5)], &platform())
            .await
            .unwrap();

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].symbol, "kirk_crew");
    }

    #[tokio::test]
    async fn frozen_crew_are_fetched_once_then_cached() {
        let api = GameApi::new(Vault::default(), Some("t".to_owned()));
        let cache = MemoryCache::new();
        let character = Character {
            crew: vec![owned(1)],
            stored_immortals: vec![StoredImmortal { id: CrewId(2), quantity: 3 }],
            ..Character::default()
        };
        let avatars = [avatar(1, "kirk_crew", 5), avatar(2, "spock_crew", 5)];

        let roster = match_crew(&api, &cache, &character, &avatars, &platform()).await.unwrap();
        assert_eq!(roster.len(), 2);
        let spock = &roster[1];
        assert_eq!(spock.frozen, 3);
        assert_eq!(spock.skills.get(Skill::Science).core, 700);
        assert_eq!(cache.len(Table::Immortals).unwrap(), 1);

        match_crew(&api, &cache, &character, &avatars, &platform()).await.unwrap();
        assert_eq!(api.transport().posts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
