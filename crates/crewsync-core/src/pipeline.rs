//! The synchronization pipeline.
//!
//! A [`SyncSession`] owns everything one synchronization needs: the typed
//! game API, the cache, the image resolver, the success scorer and the
//! client configuration. [`SyncSession::run`] walks the stages in order,
//! each one starting only after the previous one has fully settled:
//!
//! ```text
//! CoreResources -> FleetResources? -> CrewMatch -> CrewImageFanout
//!   -> AvatarImageFanout -> ShipMatch -> ItemImageFanout
//!   -> EquipmentClosureResolve -> EquipmentImageFanout -> SpriteFanout
//!   -> MissionLoad? -> MissionSuccessScore?
//! ```
//!
//! Transport and data-shape errors abort the run. Image and equipment
//! failures are collected in the [`SyncReport`] and the run carries on.

use std::collections::BTreeMap;

use crewsync_cache::CacheStore;
use crewsync_types::{
    ArchetypeId, ChallengeSuccess, CrewAvatar, EquipmentArchetype, FleetData, FleetId, Item,
    Mission, PlatformConfig, Player, RecipeDigest, RosterEntry, Ship,
};
use serde::Serialize;
use tracing::{Instrument as _, info, info_span};
use uuid::Uuid;

use crate::api::GameApi;
use crate::complement::{ComplementHandle, ComplementRequest, ComplementTask};
use crate::config::ClientConfig;
use crate::crew::match_crew;
use crate::equipment::{ClosureResolver, ResolutionFault};
use crate::error::SyncError;
use crate::images::{AssetKind, EntityKey, FanoutReport, ImageJob, ImageResolver, SPRITES, fan_out};
use crate::missions::load_missions;
use crate::progress::{Progress, ProgressSink};
use crate::scoring::SuccessScorer;
use crate::ships::match_ships;
use crate::transport::Transport;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Crew catalogue, server and platform config, ship catalogue, player.
    CoreResources,
    /// Fleet members, fleet summary and starbase (fleet members only).
    FleetResources,
    /// Roster construction.
    CrewMatch,
    /// Roster portraits and full-body pictures.
    CrewImageFanout,
    /// Catalogue portraits.
    AvatarImageFanout,
    /// Ship list construction and ship pictures.
    ShipMatch,
    /// Inventory item pictures.
    ItemImageFanout,
    /// Equipment closure.
    EquipmentClosureResolve,
    /// Equipment pictures.
    EquipmentImageFanout,
    /// Interface sprites.
    SpriteFanout,
    /// Missions and conflict quests (opt-in).
    MissionLoad,
    /// Challenge scoring and complement submission (opt-in).
    MissionSuccessScore,
}

impl Stage {
    /// Stage name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoreResources => "core_resources",
            Self::FleetResources => "fleet_resources",
            Self::CrewMatch => "crew_match",
            Self::CrewImageFanout => "crew_image_fanout",
            Self::AvatarImageFanout => "avatar_image_fanout",
            Self::ShipMatch => "ship_match",
            Self::ItemImageFanout => "item_image_fanout",
            Self::EquipmentClosureResolve => "equipment_closure_resolve",
            Self::EquipmentImageFanout => "equipment_image_fanout",
            Self::SpriteFanout => "sprite_fanout",
            Self::MissionLoad => "mission_load",
            Self::MissionSuccessScore => "mission_success_score",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Load missions, score challenges and submit the complement task.
    pub load_missions: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            load_missions: true,
        }
    }
}

impl From<&ClientConfig> for SyncOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            load_missions: config.load_missions,
        }
    }
}

/// What went right and wrong during a run, stage by stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Stages that ran, in order.
    pub stages: Vec<Stage>,
    /// Roster portraits and full-body pictures.
    pub crew_images: FanoutReport,
    /// Catalogue portraits.
    pub avatar_images: FanoutReport,
    /// Ship pictures.
    pub ship_images: FanoutReport,
    /// Inventory item pictures.
    pub item_images: FanoutReport,
    /// Equipment pictures.
    pub equipment_images: FanoutReport,
    /// Interface sprites.
    pub sprite_images: FanoutReport,
    /// Equipment ids left out of the closure.
    pub resolution_faults: Vec<ResolutionFault>,
    /// Equipment description requests issued.
    pub equipment_fetches: usize,
    /// Whether the equipment closure started from a cached entry.
    pub equipment_from_cache: bool,
}

impl SyncReport {
    /// Total image faults across all stages.
    pub fn image_faults(&self) -> usize {
        [
            &self.crew_images,
            &self.avatar_images,
            &self.ship_images,
            &self.item_images,
            &self.equipment_images,
            &self.sprite_images,
        ]
        .iter()
        .map(|report| report.faults.len())
        .sum()
    }
}

/// Everything a run loaded.
#[derive(Debug, Clone, Default)]
pub struct SyncSnapshot {
    /// Run identifier, also attached to the run's log span.
    pub run_id: Uuid,
    /// The player.
    pub player: Player,
    /// Owned and frozen crew.
    pub roster: Vec<RosterEntry>,
    /// The crew catalogue.
    pub crew_avatars: Vec<CrewAvatar>,
    /// Every ship, owned or not.
    pub ships: Vec<Ship>,
    /// Inventory items.
    pub items: Vec<Item>,
    /// The equipment closure.
    pub archetypes: Vec<EquipmentArchetype>,
    /// Sprite URLs by sprite name.
    pub sprites: BTreeMap<String, String>,
    /// Trait display names.
    pub platform: PlatformConfig,
    /// Fleet data, for fleet members.
    pub fleet: Option<FleetData>,
    /// Recipe digest the closure was resolved against.
    pub digest: RecipeDigest,
    /// Missions, when loaded.
    pub missions: Vec<Mission>,
    /// Scored challenges, when missions were loaded.
    pub mission_success: Vec<ChallengeSuccess>,
    /// Run report.
    pub report: SyncReport,
}

/// Result of a run: the snapshot, and the complement computation still
/// running in the background when missions were loaded.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Loaded state.
    pub snapshot: SyncSnapshot,
    /// Pending crew complement.
    pub complement: Option<ComplementHandle>,
}

/// Per-run context for the synchronization pipeline.
pub struct SyncSession<T, C, R, S> {
    api: GameApi<T>,
    cache: C,
    images: R,
    scorer: S,
    config: ClientConfig,
}

impl<T, C, R, S> SyncSession<T, C, R, S>
where
    T: Transport,
    C: CacheStore,
    R: ImageResolver,
    S: SuccessScorer,
{
    /// Assemble a session.
    pub const fn new(api: GameApi<T>, cache: C, images: R, scorer: S, config: ClientConfig) -> Self {
        Self {
            api,
            cache,
            images,
            scorer,
            config,
        }
    }

    /// The game API.
    pub const fn api(&self) -> &GameApi<T> {
        &self.api
    }

    /// The cache.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// The image resolver.
    pub const fn images(&self) -> &R {
        &self.images
    }

    /// The configuration.
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run every stage and return the loaded snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first stage-level [`SyncError`]; no partial snapshot is
    /// returned.
    pub async fn run<P>(&self, options: SyncOptions, progress: &P) -> Result<SyncOutcome, SyncError>
    where
        P: ProgressSink + ?Sized,
    {
        let run_id = Uuid::now_v7();
        let span = info_span!("sync", run_id = %run_id);
        async {
            info!(load_missions = options.load_missions, "synchronization started");
            let outcome = self.run_stages(run_id, options, &Progress::new(progress)).await;
            match &outcome {
                Ok(done) => info!(
                    roster = done.snapshot.roster.len(),
                    ships = done.snapshot.ships.len(),
                    archetypes = done.snapshot.archetypes.len(),
                    image_faults = done.snapshot.report.image_faults(),
                    resolution_faults = done.snapshot.report.resolution_faults.len(),
                    "synchronization finished"
                ),
                Err(e) => tracing::error!(error = %e, "synchronization aborted"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    #[allow(clippy::too_many_lines)] // One block per stage, in order.
    async fn run_stages<P>(
        &self,
        run_id: Uuid,
        options: SyncOptions,
        progress: &Progress<'_, P>,
    ) -> Result<SyncOutcome, SyncError>
    where
        P: ProgressSink + ?Sized,
    {
        let mut report = SyncReport::default();
        let concurrency = self.config.fanout_concurrency;

        // Core resources
        enter(&mut report, Stage::CoreResources);
        progress.say("Loading crew information...");
        let mut crew_avatars = self.api.load_crew_avatars().await?;
        progress.say("Loading server configuration...");
        let digest = self.api.load_server_config().await?;
        progress.say("Loading platform configuration...");
        let platform = self.api.load_platform_config().await?;
        progress.say("Loading ship information...");
        let schematics = self.api.load_ship_schematics().await?;
        progress.say("Loading player data...");
        let player_data = self.api.load_player_data().await?;
        let player = player_data.player;

        // Fleet resources
        let fleet = match player.fleet_id() {
            Some(fleet_id) => {
                enter(&mut report, Stage::FleetResources);
                Some(self.load_fleet(fleet_id, progress).await?)
            }
            None => None,
        };

        // Crew
        enter(&mut report, Stage::CrewMatch);
        progress.say("Analyzing crew...");
        let mut roster =
            match_crew(&self.api, &self.cache, &player.character, &crew_avatars, &platform).await?;

        enter(&mut report, Stage::CrewImageFanout);
        let label = "Caching crew images";
        let jobs = roster
            .iter()
            .flat_map(|entry| {
                let id = entry.id.into_inner();
                [
                    ImageJob::asset(EntityKey::Id(id), AssetKind::CrewPortrait, &entry.portrait.file),
                    ImageJob::asset(EntityKey::FullBody(id), AssetKind::CrewBody, &entry.full_body.file),
                ]
            })
            .collect();
        report.crew_images = fan_out(&self.images, jobs, progress, label, concurrency).await;
        apply_urls(
            &mut roster,
            &report.crew_images,
            |e| EntityKey::Id(e.id.into_inner()),
            |e| &mut e.icon_url,
        );
        apply_urls(
            &mut roster,
            &report.crew_images,
            |e| EntityKey::FullBody(e.id.into_inner()),
            |e| &mut e.icon_body_url,
        );

        enter(&mut report, Stage::AvatarImageFanout);
        let jobs = crew_avatars
            .iter()
            .map(|avatar| {
                ImageJob::asset(EntityKey::Id(avatar.id.into_inner()), AssetKind::CrewPortrait, &avatar.portrait.file)
            })
            .collect();
        report.avatar_images = fan_out(&self.images, jobs, progress, label, concurrency).await;
        apply_urls(
            &mut crew_avatars,
            &report.avatar_images,
            |a| EntityKey::Id(a.id.into_inner()),
            |a| &mut a.icon_url,
        );

        // Ships
        enter(&mut report, Stage::ShipMatch);
        progress.say("Loading ships...");
        let mut ships = match_ships(&schematics, &player.character.ships, &platform);
        let jobs = ships
            .iter()
            .filter_map(|ship| {
                let icon = ship.icon.as_ref()?;
                Some(ImageJob::asset(EntityKey::Name(ship.name.clone()), AssetKind::Ship, &icon.file))
            })
            .collect();
        report.ship_images = fan_out(&self.images, jobs, progress, "Caching ship images", concurrency).await;
        apply_urls(
            &mut ships,
            &report.ship_images,
            |s| EntityKey::Name(s.name.clone()),
            |s| &mut s.icon_url,
        );

        // Items
        enter(&mut report, Stage::ItemImageFanout);
        progress.say("Caching item images...");
        let mut items = player.character.items.clone();
        for item in &mut items {
            item.derive_names_from_icon();
        }
        let jobs = items
            .iter()
            .map(|item| ImageJob::asset(EntityKey::Id(item.id.into_inner()), AssetKind::Item, &item.icon.file))
            .collect();
        report.item_images = fan_out(&self.images, jobs, progress, "Caching item images", concurrency).await;
        apply_urls(
            &mut items,
            &report.item_images,
            |i| EntityKey::Id(i.id.into_inner()),
            |i| &mut i.icon_url,
        );

        // Equipment
        enter(&mut report, Stage::EquipmentClosureResolve);
        progress.say("Loading equipment...");
        let seeds: Vec<ArchetypeId> = roster
            .iter()
            .flat_map(|entry| entry.equipment_slots.iter().map(|slot| slot.archetype_id))
            .collect();
        let closure = ClosureResolver::new(&self.api, &self.cache)
            .with_batch_size(self.config.equipment_batch_size)
            .with_max_rounds(self.config.max_resolution_rounds)
            .resolve(&digest, player_data.archetypes, &seeds, progress)
            .await;
        let mut archetypes = closure.archetypes;
        report.resolution_faults = closure.faults;
        report.equipment_fetches = closure.fetches;
        report.equipment_from_cache = closure.from_cache;

        enter(&mut report, Stage::EquipmentImageFanout);
        progress.say("Caching images...");
        let jobs = archetypes
            .iter()
            .filter_map(|archetype| {
                let icon = archetype.icon.as_ref()?;
                Some(ImageJob::asset(
                    EntityKey::Id(archetype.id.into_inner()),
                    AssetKind::Item,
                    &icon.file,
                ))
            })
            .collect();
        report.equipment_images =
            fan_out(&self.images, jobs, progress, "Caching equipment images", concurrency).await;
        apply_urls(
            &mut archetypes,
            &report.equipment_images,
            |a| EntityKey::Id(a.id.into_inner()),
            |a| &mut a.icon_url,
        );

        enter(&mut report, Stage::SpriteFanout);
        let jobs = SPRITES.iter().map(ImageJob::sprite).collect();
        report.sprite_images = fan_out(&self.images, jobs, progress, "Caching misc images", concurrency).await;
        let sprites = report
            .sprite_images
            .resolved
            .iter()
            .map(|found| (found.key.to_string(), found.url.clone()))
            .collect();

        // Missions
        let (missions, mission_success, complement) = if options.load_missions {
            enter(&mut report, Stage::MissionLoad);
            progress.say("Loading missions and quests...");
            let missions = load_missions(&self.api, &self.cache, &player.character).await?;

            enter(&mut report, Stage::MissionSuccessScore);
            progress.say("Calculating mission success stats for crew...");
            let mission_success = self.scorer.score(&roster, &missions);
            let complement = ComplementTask::submit(ComplementRequest {
                entries: mission_success.clone(),
            });
            (missions, mission_success, Some(complement))
        } else {
            (Vec::new(), Vec::new(), None)
        };

        Ok(SyncOutcome {
            snapshot: SyncSnapshot {
                run_id,
                player,
                roster,
                crew_avatars,
                ships,
                items,
                archetypes,
                sprites,
                platform,
                fleet,
                digest,
                missions,
                mission_success,
                report,
            },
            complement,
        })
    }

    async fn load_fleet<P>(
        &self,
        fleet_id: FleetId,
        progress: &Progress<'_, P>,
    ) -> Result<FleetData, SyncError>
    where
        P: ProgressSink + ?Sized,
    {
        progress.say("Loading fleet members...");
        let members = self.api.load_fleet_members(fleet_id).await?;
        progress.say("Loading fleet data...");
        let fleet = self.api.load_fleet(fleet_id).await?;
        progress.say("Loading starbase data...");
        let starbase_rooms = self.api.load_starbase().await?;
        Ok(FleetData {
            fleet,
            members: members.members,
            squads: members.squads,
            starbase_rooms,
        })
    }
}

fn enter(report: &mut SyncReport, stage: Stage) {
    info!(stage = %stage, "stage started");
    report.stages.push(stage);
}

/// Write resolved URLs onto every entity whose key has one.
fn apply_urls<E>(
    entities: &mut [E],
    report: &FanoutReport,
    key: impl Fn(&E) -> EntityKey,
    url: impl Fn(&mut E) -> &mut Option<String>,
) {
    let urls = report.urls();
    for entity in entities {
        if let Some(found) = urls.get(&key(entity)) {
            *url(entity) = Some((*found).to_owned());
        }
    }
}
