//! Image resolver seam and the per-stage fan-out.
//!
//! Every image stage of the pipeline turns its entities into [`ImageJob`]s
//! and hands them to [`fan_out`]. Cache hits are counted immediately; misses
//! are resolved concurrently and each outcome lands in a [`FanoutReport`].
//! A failed resolution is an [`ImageFault`] in the report and never aborts
//! the stage. The pipeline writes the resolved URLs back onto its entities
//! by key once the stage has settled.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use futures::StreamExt as _;
use futures::stream;
use serde::Serialize;
use tracing::{debug, warn};

use crate::progress::{Progress, ProgressSink};

/// Which picture of an entity is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Crew head shot.
    CrewPortrait,
    /// Crew full-body picture.
    CrewBody,
    /// Ship.
    Ship,
    /// Inventory item or equipment archetype.
    Item,
}

/// An image asset: its kind and the icon file path from the game data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AssetRef {
    /// Picture kind.
    pub kind: AssetKind,
    /// Icon file path, e.g. `/crew_portraits/cm_picard_sm`.
    pub file: String,
}

impl AssetRef {
    /// Build an asset reference.
    pub fn new(kind: AssetKind, file: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
        }
    }
}

/// Identifies the entity an image belongs to.
///
/// Crew and items are matched by numeric id; ships and sprites by name.
/// A crew member's full-body picture has its own key so it can share a
/// fan-out with the portrait.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EntityKey {
    /// Numeric entity id.
    Id(u64),
    /// Entity name.
    Name(String),
    /// Full-body picture of the crew member with this id.
    FullBody(u64),
}

impl core::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
            Self::FullBody(id) => write!(f, "{id}/body"),
        }
    }
}

/// A resolved image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundImage {
    /// The entity the image belongs to.
    pub key: EntityKey,
    /// Resolved URL.
    pub url: String,
}

/// Why a single image could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum ImageError {
    /// The asset server has no image for the asset.
    #[error("image not found: {0}")]
    NotFound(String),
    /// The lookup itself failed.
    #[error("image lookup failed: {0}")]
    Lookup(String),
}

/// An image that could not be resolved, kept in the stage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFault {
    /// The entity left without an image.
    pub key: EntityKey,
    /// What went wrong.
    pub error: ImageError,
}

/// Resolves entity images to URLs.
pub trait ImageResolver: Send + Sync {
    /// URL of an already cached image, if any.
    fn cached_url(&self, asset: &AssetRef) -> Option<String>;

    /// Find the image for `asset`, cache it, and return its URL tagged with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] if the image cannot be found or fetched.
    fn resolve(
        &self,
        asset: &AssetRef,
        key: EntityKey,
    ) -> impl Future<Output = Result<FoundImage, ImageError>> + Send;

    /// Resolve a named sprite from an asset bundle (`asset` may be empty).
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] if the sprite cannot be found or fetched.
    fn resolve_sprite(
        &self,
        asset: &str,
        name: &str,
        key: EntityKey,
    ) -> impl Future<Output = Result<FoundImage, ImageError>> + Send;
}

/// What a job resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// An entity asset; the resolver cache is consulted first.
    Asset(AssetRef),
    /// A named sprite; always resolved.
    Sprite {
        /// Asset bundle, empty for loose images.
        asset: String,
        /// Sprite name.
        name: String,
    },
}

/// One image to resolve for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    /// Entity the result is written back to.
    pub key: EntityKey,
    /// What to resolve.
    pub source: ImageSource,
}

impl ImageJob {
    /// A job for an entity asset.
    pub fn asset(key: EntityKey, kind: AssetKind, file: impl Into<String>) -> Self {
        Self {
            key,
            source: ImageSource::Asset(AssetRef::new(kind, file)),
        }
    }

    /// A job for a sprite, keyed by its name.
    pub fn sprite(sprite: &Sprite) -> Self {
        Self {
            key: EntityKey::Name(sprite.name.to_owned()),
            source: ImageSource::Sprite {
                asset: sprite.asset.to_owned(),
                name: sprite.name.to_owned(),
            },
        }
    }
}

/// Outcome of one image stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FanoutReport {
    /// Every image that has a URL, cache hits included.
    pub resolved: Vec<FoundImage>,
    /// How many of `resolved` came from the resolver cache.
    pub cached: usize,
    /// Images that could not be resolved.
    pub faults: Vec<ImageFault>,
}

impl FanoutReport {
    /// Resolved URLs by entity key.
    pub fn urls(&self) -> HashMap<&EntityKey, &str> {
        self.resolved
            .iter()
            .map(|found| (&found.key, found.url.as_str()))
            .collect()
    }
}

/// Resolve every job, counting progress under `label`.
///
/// Jobs with the same key are resolved once. Cache hits are counted without
/// a progress report; each successful resolution reports the running count.
/// At most `concurrency` resolutions are in flight; `None` starts them all.
pub async fn fan_out<R, P>(
    resolver: &R,
    jobs: Vec<ImageJob>,
    progress: &Progress<'_, P>,
    label: &str,
    concurrency: Option<usize>,
) -> FanoutReport
where
    R: ImageResolver + ?Sized,
    P: ProgressSink + ?Sized,
{
    let mut seen = HashSet::new();
    let jobs: Vec<ImageJob> = jobs
        .into_iter()
        .filter(|job| seen.insert(job.key.clone()))
        .collect();

    progress.add_total(jobs.len());
    progress.show(label);

    let mut report = FanoutReport::default();
    let mut pending = Vec::new();
    for job in jobs {
        let hit = match &job.source {
            ImageSource::Asset(asset) => resolver.cached_url(asset),
            ImageSource::Sprite { .. } => None,
        };
        match hit {
            Some(url) if !url.is_empty() => {
                progress.tick_quiet();
                report.cached = report.cached.saturating_add(1);
                report.resolved.push(FoundImage { key: job.key, url });
            }
            _ => pending.push(job),
        }
    }
    progress.show(label);

    let limit = concurrency.unwrap_or(pending.len()).max(1);
    let mut outcomes = stream::iter(pending)
        .map(|job| async move {
            let outcome = match &job.source {
                ImageSource::Asset(asset) => resolver.resolve(asset, job.key.clone()).await,
                ImageSource::Sprite { asset, name } => {
                    resolver.resolve_sprite(asset, name, job.key.clone()).await
                }
            };
            (job.key, outcome)
        })
        .buffer_unordered(limit);

    while let Some((key, outcome)) = outcomes.next().await {
        match outcome {
            Ok(found) => {
                progress.tick(label);
                report.resolved.push(found);
            }
            Err(error) => {
                debug!(key = %key, error = %error, "image resolution failed");
                report.faults.push(ImageFault { key, error });
            }
        }
    }

    if !report.faults.is_empty() {
        warn!(
            stage = label,
            faults = report.faults.len(),
            "some images could not be resolved"
        );
    }
    report
}

// ---------------------------------------------------------------------------
// Sprite table
// ---------------------------------------------------------------------------

/// A fixed user-interface sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    /// Sprite name.
    pub name: &'static str,
    /// Asset bundle holding the sprite, empty for loose images.
    pub asset: &'static str,
}

const ICONS: &str = "atlas_stt_icons";

const fn icon(name: &'static str) -> Sprite {
    Sprite { name, asset: ICONS }
}

const fn loose(name: &'static str) -> Sprite {
    Sprite { name, asset: "" }
}

/// The sprites resolved by every synchronization run.
pub const SPRITES: [Sprite; 28] = [
    icon("mastery_highest_icon"),
    icon("mastery_medium_icon"),
    icon("mastery_lowest_icon"),
    icon("star_reward"),
    icon("star_reward_inactive"),
    icon("fleet_rank_admiral_icon"),
    icon("fleet_rank_captain_icon"),
    icon("fleet_rank_ensign_icon"),
    icon("fleet_rank_lt_icon"),
    icon("honor_currency"),
    icon("icon_command_skill"),
    icon("icon_diplomacy_skill"),
    icon("icon_engineering_skill"),
    icon("icon_medicine_skill"),
    icon("icon_science_skill"),
    icon("icon_security_skill"),
    icon("icon_shuttle_lg"),
    icon("node_icon"),
    icon("pe_currency_icon"),
    icon("pp_currency_icon"),
    icon("soft_currency_icon"),
    icon("victory_point_icon"),
    // chronitons
    icon("energy_icon"),
    icon("cadet_icon"),
    // honor, merits, dilithium, credits
    loose("images_currency_honor_currency_0"),
    loose("images_currency_pe_currency_0"),
    loose("images_currency_pp_currency_0"),
    loose("images_currency_sc_currency_0"),
];
