//! `crewsync` entry point.
//!
//! Runs one synchronization against the game server and prints what was
//! loaded.
//!
//! # Architecture
//!
//! ```text
//! ClientConfig --> HttpTransport --> GameApi --+
//!              --> CacheBackend -------------- +--> SyncSession::run --> summary
//!              --> AssetImageResolver ---------+
//! ```
//!
//! Configuration comes from `CREWSYNC_*` environment variables, or from the
//! YAML file named by the first argument (with environment overrides).

mod assets;
mod backend;

use std::path::Path;

use anyhow::Context as _;
use crewsync_cache::{CacheStore, ConfigRecord, Table};
use crewsync_core::{
    ClientConfig, GameApi, HttpTransport, SkillScorer, SyncOptions, SyncSession, SyncSnapshot,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::assets::AssetImageResolver;
use crate::backend::CacheBackend;

/// Cache key of the last run's report.
const LAST_SYNC_KEY: &str = "last_sync";

/// Application entry point.
///
/// Initializes logging, loads configuration, wires the transport, cache
/// and image resolver into a session, runs it once and prints a summary.
///
/// # Errors
///
/// Returns an error if configuration, the cache connection, or any
/// pipeline stage fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("crewsync starting");

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::from_file(Path::new(&path))
            .with_context(|| format!("loading config from {path}"))?,
        None => ClientConfig::from_env().context("loading config from environment")?,
    };
    info!(
        server_url = config.server_url,
        asset_url = config.asset_url,
        dragonfly = config.dragonfly_url.is_some(),
        equipment_batch_size = config.equipment_batch_size,
        max_resolution_rounds = config.max_resolution_rounds,
        fanout_concurrency = ?config.fanout_concurrency,
        load_missions = config.load_missions,
        "configuration loaded"
    );

    let api = GameApi::new(
        HttpTransport::new(config.server_url.clone()),
        config.access_token.clone(),
    );
    if !api.is_logged_in() {
        anyhow::bail!("no access token configured (set CREWSYNC_ACCESS_TOKEN)");
    }
    let cache = CacheBackend::connect(config.dragonfly_url.as_deref())
        .await
        .context("connecting cache backend")?;
    let images = AssetImageResolver::new(&config.asset_url);
    let options = SyncOptions::from(&config);
    let session = SyncSession::new(api, cache, images, SkillScorer, config);

    let report_progress = |message: &str| info!(progress = message);
    let outcome = session.run(options, &report_progress).await?;
    print_summary(&outcome.snapshot);

    let record = ConfigRecord {
        key: LAST_SYNC_KEY.to_owned(),
        value: serde_json::to_value(&outcome.snapshot.report)?,
    };
    if let Err(e) = session.cache().upsert(Table::Config, LAST_SYNC_KEY, &record).await {
        warn!(error = %e, "failed to store sync report");
    }

    if let Some(handle) = outcome.complement {
        let complement = handle.wait().await?;
        println!(
            "Crew complement over {} challenges: {} needed, {} unneeded",
            complement.entries,
            complement.result.needed_crew.len(),
            complement.result.unneeded_crew.len(),
        );
    }

    Ok(())
}

fn print_summary(snapshot: &SyncSnapshot) {
    let report = &snapshot.report;
    println!("Run {}", snapshot.run_id);
    println!(
        "Player {} ({} crew, {} ships, {} items)",
        snapshot.player.display_name,
        snapshot.roster.len(),
        snapshot.ships.iter().filter(|ship| ship.is_owned()).count(),
        snapshot.items.len(),
    );
    if let Some(fleet) = &snapshot.fleet {
        println!("Fleet {} ({} members)", fleet.fleet.name, fleet.members.len());
    }
    println!(
        "Equipment: {} archetypes, {} unresolved, {} requests{}",
        snapshot.archetypes.len(),
        report.resolution_faults.len(),
        report.equipment_fetches,
        if report.equipment_from_cache { " (cached)" } else { "" },
    );
    println!(
        "Images: {} resolved, {} missing",
        [
            &report.crew_images,
            &report.avatar_images,
            &report.ship_images,
            &report.item_images,
            &report.equipment_images,
            &report.sprite_images,
        ]
        .iter()
        .map(|stage| stage.resolved.len())
        .sum::<usize>(),
        report.image_faults(),
    );
    if !snapshot.missions.is_empty() {
        println!(
            "Missions: {} ({} scored challenges)",
            snapshot.missions.len(),
            snapshot.mission_success.len(),
        );
    }
}
