//! Equipment closure resolver.
//!
//! Starting from the archetypes already loaded and the archetype ids the
//! roster has equipped, fetch archetype descriptions until every id demanded
//! by any known recipe is known, or is recorded as a [`ResolutionFault`].
//!
//! # Algorithm
//!
//! 1. Merge the cached closure for the current recipe digest, if any.
//!    Archetypes already in the working set win over cached ones.
//! 2. `missing = seeds + demands of known archetypes - known - faulted`.
//! 3. Empty: store the working set under the digest and stop.
//! 4. Otherwise request the missing ids in batches. A failing batch is split
//!    in two (left half rounded up) until the culprit is a single id, which
//!    becomes a fault. Ids a successful reply leaves out become faults too.
//! 5. Back to 2, at most `max_rounds` times. When the rounds run out, every
//!    id still missing is a fault and nothing is cached.
//!
//! Known and faulted ids are never requested again, so a recipe cycle among
//! known ids cannot keep the loop going.

use std::collections::HashSet;
use std::future::Future;

use crewsync_cache::{CacheStore, Table};
use crewsync_types::{ArchetypeId, EquipmentArchetype, EquipmentCacheEntry, RecipeDigest};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::GameApi;
use crate::config::{DEFAULT_EQUIPMENT_BATCH_SIZE, DEFAULT_MAX_RESOLUTION_ROUNDS};
use crate::error::SyncError;
use crate::progress::{Progress, ProgressSink};
use crate::transport::Transport;

/// Describes equipment archetypes by id.
pub trait ArchetypeSource: Send + Sync {
    /// Fetch descriptions for `ids`. The reply may omit ids.
    ///
    /// # Errors
    ///
    /// Any error fails the whole batch.
    fn describe(
        &self,
        ids: &[ArchetypeId],
    ) -> impl Future<Output = Result<Vec<EquipmentArchetype>, SyncError>> + Send;
}

impl<T: Transport> ArchetypeSource for GameApi<T> {
    async fn describe(&self, ids: &[ArchetypeId]) -> Result<Vec<EquipmentArchetype>, SyncError> {
        self.load_item_descriptions(ids.iter()).await
    }
}

/// Why an archetype id is absent from the closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FaultReason {
    /// Requesting the id on its own failed.
    FetchFailed {
        /// The error of the singleton request.
        error: String,
    },
    /// The server answered but did not describe the id.
    NotReturned,
    /// The round limit was reached before the id was requested.
    RoundLimit,
}

/// An archetype id left out of the closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionFault {
    /// The unresolved id.
    pub archetype_id: ArchetypeId,
    /// Why it is unresolved.
    pub reason: FaultReason,
}

/// Result of one resolution run.
#[derive(Debug, Clone, Default)]
pub struct ClosureOutcome {
    /// The closed archetype set, in load order.
    pub archetypes: Vec<EquipmentArchetype>,
    /// Ids that could not be resolved.
    pub faults: Vec<ResolutionFault>,
    /// Description requests issued, bisection retries included.
    pub fetches: usize,
    /// Rounds that issued requests.
    pub rounds: usize,
    /// Whether a cached closure for the digest was merged.
    pub from_cache: bool,
}

/// Working archetype set; ids are unique and the first archetype wins.
#[derive(Default)]
struct ArchetypeSet {
    archetypes: Vec<EquipmentArchetype>,
    ids: HashSet<ArchetypeId>,
}

impl ArchetypeSet {
    fn insert(&mut self, archetype: EquipmentArchetype) {
        if self.ids.insert(archetype.id) {
            self.archetypes.push(archetype);
        }
    }

    fn extend(&mut self, archetypes: impl IntoIterator<Item = EquipmentArchetype>) {
        for archetype in archetypes {
            self.insert(archetype);
        }
    }

    fn contains(&self, id: ArchetypeId) -> bool {
        self.ids.contains(&id)
    }

    /// Seeds first, then recipe demands; deduplicated, in encounter order.
    fn missing(&self, seeds: &[ArchetypeId], faulted: &HashSet<ArchetypeId>) -> Vec<ArchetypeId> {
        let mut seen = HashSet::new();
        seeds
            .iter()
            .copied()
            .chain(self.archetypes.iter().flat_map(EquipmentArchetype::demands))
            .filter(|id| !self.contains(*id) && !faulted.contains(id))
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Per-run resolution state.
#[derive(Default)]
struct Resolution {
    set: ArchetypeSet,
    faulted: HashSet<ArchetypeId>,
    faults: Vec<ResolutionFault>,
    fetches: usize,
}

impl Resolution {
    fn fault(&mut self, archetype_id: ArchetypeId, reason: FaultReason) {
        if self.faulted.insert(archetype_id) {
            debug!(archetype_id = %archetype_id, reason = ?reason, "archetype unresolved");
            self.faults.push(ResolutionFault {
                archetype_id,
                reason,
            });
        }
    }
}

/// Resolves the equipment closure against an [`ArchetypeSource`] and the
/// `equipment` cache table.
pub struct ClosureResolver<'a, S: ?Sized, C: ?Sized> {
    source: &'a S,
    cache: &'a C,
    batch_size: usize,
    max_rounds: usize,
}

impl<'a, S, C> ClosureResolver<'a, S, C>
where
    S: ArchetypeSource + ?Sized,
    C: CacheStore + ?Sized,
{
    /// Create a resolver with the default batch size and round limit.
    pub const fn new(source: &'a S, cache: &'a C) -> Self {
        Self {
            source,
            cache,
            batch_size: DEFAULT_EQUIPMENT_BATCH_SIZE,
            max_rounds: DEFAULT_MAX_RESOLUTION_ROUNDS,
        }
    }

    /// Set the maximum ids per description request (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the round limit.
    #[must_use]
    pub const fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Resolve the closure of `known` plus `seeds` for `digest`.
    ///
    /// Item-level failures become faults in the outcome. A failed cache
    /// write is logged and the closure is still returned.
    pub async fn resolve<P>(
        &self,
        digest: &RecipeDigest,
        known: Vec<EquipmentArchetype>,
        seeds: &[ArchetypeId],
        progress: &Progress<'_, P>,
    ) -> ClosureOutcome
    where
        P: ProgressSink + ?Sized,
    {
        let mut state = Resolution::default();
        state.set.extend(known);

        let from_cache = self.merge_cached(digest, &mut state.set).await;
        let mut rounds = 0_usize;

        loop {
            let missing = state.set.missing(seeds, &state.faulted);
            progress.say(&format!("Loading equipment... ({} remaining)", missing.len()));

            if missing.is_empty() {
                let entry = EquipmentCacheEntry {
                    digest: digest.clone(),
                    archetype_cache: state.set.archetypes,
                };
                if let Err(e) = self
                    .cache
                    .upsert(Table::Equipment, digest.as_str(), &entry)
                    .await
                {
                    warn!(digest = %digest, error = %e, "failed to cache equipment closure");
                }
                info!(
                    digest = %digest,
                    archetypes = entry.archetype_cache.len(),
                    faults = state.faults.len(),
                    fetches = state.fetches,
                    rounds,
                    "equipment closure resolved"
                );
                return ClosureOutcome {
                    archetypes: entry.archetype_cache,
                    faults: state.faults,
                    fetches: state.fetches,
                    rounds,
                    from_cache,
                };
            }

            if rounds >= self.max_rounds {
                warn!(
                    digest = %digest,
                    remaining = missing.len(),
                    max_rounds = self.max_rounds,
                    "equipment resolution round limit reached, closure not cached"
                );
                for id in missing {
                    state.fault(id, FaultReason::RoundLimit);
                }
                return ClosureOutcome {
                    archetypes: state.set.archetypes,
                    faults: state.faults,
                    fetches: state.fetches,
                    rounds,
                    from_cache,
                };
            }
            rounds = rounds.saturating_add(1);

            for batch in missing.chunks(self.batch_size) {
                self.fetch_bisecting(batch, &mut state).await;
            }
        }
    }

    /// Merge the cached closure for `digest`; read failures count as a miss.
    async fn merge_cached(&self, digest: &RecipeDigest, set: &mut ArchetypeSet) -> bool {
        match self
            .cache
            .lookup::<EquipmentCacheEntry>(Table::Equipment, digest.as_str())
            .await
        {
            Ok(Some(entry)) if entry.digest == *digest => {
                debug!(digest = %digest, cached = entry.archetype_cache.len(), "merging cached equipment");
                set.extend(entry.archetype_cache);
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(digest = %digest, error = %e, "equipment cache read failed, resolving from scratch");
                false
            }
        }
    }

    /// Fetch one batch, splitting failed batches until single ids remain.
    async fn fetch_bisecting(&self, batch: &[ArchetypeId], state: &mut Resolution) {
        let mut work: Vec<&[ArchetypeId]> = vec![batch];

        while let Some(ids) = work.pop() {
            state.fetches = state.fetches.saturating_add(1);
            match self.source.describe(ids).await {
                Ok(archetypes) => {
                    state.set.extend(archetypes);
                    for &id in ids {
                        if !state.set.contains(id) {
                            state.fault(id, FaultReason::NotReturned);
                        }
                    }
                }
                Err(e) if ids.len() == 1 => {
                    for &id in ids {
                        warn!(archetype_id = %id, error = %e, "equipment description fails to load");
                        state.fault(id, FaultReason::FetchFailed { error: e.to_string() });
                    }
                }
                Err(e) => {
                    debug!(batch = ids.len(), error = %e, "equipment batch failed, bisecting");
                    let (left, right) = ids.split_at(ids.len().div_ceil(2));
                    work.push(right);
                    work.push(left);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crewsync_cache::MemoryCache;
    use crewsync_types::{Recipe, RecipeDemand};

    use super::*;
    use crate::progress::NoProgress;
    use crate::testing::FullDisk;
    use crate::transport::TransportError;

    fn archetype(id: u64, demands: &[u64]) -> EquipmentArchetype {
        EquipmentArchetype {
            id: ArchetypeId(id),
            name: format!("item {id}"),
            recipe: (!demands.is_empty()).then(|| Recipe {
                demands: demands
                    .iter()
                    .map(|&d| RecipeDemand {
                        archetype_id: ArchetypeId(d),
                        count: 1,
                    })
                    .collect(),
            }),
            ..EquipmentArchetype::default()
        }
    }

    fn ids(raw: &[u64]) -> Vec<ArchetypeId> {
        raw.iter().copied().map(ArchetypeId).collect()
    }

    /// Describes catalogue ids; any batch holding a poisoned id fails.
    #[derive(Default)]
    struct Catalogue {
        archetypes: HashMap<ArchetypeId, EquipmentArchetype>,
        poisoned: HashSet<ArchetypeId>,
        requests: Mutex<Vec<Vec<ArchetypeId>>>,
    }

    impl Catalogue {
        fn with(mut self, archetype: EquipmentArchetype) -> Self {
            self.archetypes.insert(archetype.id, archetype);
            self
        }

        fn poison(mut self, id: u64) -> Self {
            self.poisoned.insert(ArchetypeId(id));
            self
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl ArchetypeSource for Catalogue {
        async fn describe(
            &self,
            ids: &[ArchetypeId],
        ) -> Result<Vec<EquipmentArchetype>, SyncError> {
            self.requests.lock().unwrap().push(ids.to_vec());
            if ids.iter().any(|id| self.poisoned.contains(id)) {
                return Err(TransportError::status(500, "server choked").into());
            }
            Ok(ids
                .iter()
                .filter_map(|id| self.archetypes.get(id).cloned())
                .collect())
        }
    }

    fn digest(value: &str) -> RecipeDigest {
        RecipeDigest::new(value)
    }

    #[tokio::test]
    async fn single_poisoned_id_is_isolated() {
        let mut catalogue = Catalogue::default().poison(5);
        for id in 1..=8 {
            catalogue = catalogue.with(archetype(id, &[]));
        }
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache);

        let outcome = resolver
            .resolve(&digest("d1"), Vec::new(), &ids(&[1, 2, 3, 4, 5, 6, 7, 8]), &Progress::new(&NoProgress))
            .await;

        assert_eq!(outcome.archetypes.len(), 7);
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(outcome.faults[0].archetype_id, ArchetypeId(5));
        assert!(matches!(outcome.faults[0].reason, FaultReason::FetchFailed { .. }));
        assert!(outcome.archetypes.iter().all(|a| a.id != ArchetypeId(5)));
        // 8, then 4 + 4, then 2 + 2 under the failing half, then 1 + 1
        assert_eq!(outcome.fetches, 7);
    }

    #[tokio::test]
    async fn bisection_takes_the_larger_half_first() {
        let mut catalogue = Catalogue::default().poison(3);
        for id in 1..=5 {
            catalogue = catalogue.with(archetype(id, &[]));
        }
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache);

        resolver
            .resolve(&digest("d1"), Vec::new(), &ids(&[1, 2, 3, 4, 5]), &Progress::new(&NoProgress))
            .await;

        let requests = catalogue.requests.lock().unwrap();
        assert_eq!(requests[0], ids(&[1, 2, 3, 4, 5]));
        assert_eq!(requests[1], ids(&[1, 2, 3]));
    }

    #[tokio::test]
    async fn transitive_demands_are_closed() {
        let catalogue = Catalogue::default()
            .with(archetype(1, &[2, 3]))
            .with(archetype(2, &[]))
            .with(archetype(3, &[4]))
            .with(archetype(4, &[5]));
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache);

        let outcome = resolver
            .resolve(&digest("d1"), Vec::new(), &ids(&[1]), &Progress::new(&NoProgress))
            .await;

        let mut resolved: Vec<u64> = outcome.archetypes.iter().map(|a| a.id.into_inner()).collect();
        resolved.sort_unstable();
        assert_eq!(resolved, vec![1, 2, 3, 4]);
        // 5 is demanded but the server never describes it.
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(outcome.faults[0].archetype_id, ArchetypeId(5));
        assert_eq!(outcome.faults[0].reason, FaultReason::NotReturned);
        assert_eq!(cache.writes(), 1);
    }

    #[tokio::test]
    async fn demands_of_already_known_archetypes_are_seeds() {
        let catalogue = Catalogue::default().with(archetype(9, &[]));
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache);

        let outcome = resolver
            .resolve(&digest("d1"), vec![archetype(8, &[9])], &[], &Progress::new(&NoProgress))
            .await;

        assert_eq!(outcome.archetypes.len(), 2);
        assert!(outcome.faults.is_empty());
    }

    #[tokio::test]
    async fn unchanged_digest_issues_no_requests() {
        let catalogue = Catalogue::default()
            .with(archetype(1, &[2]))
            .with(archetype(2, &[]));
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache);
        let progress = Progress::new(&NoProgress);

        let first = resolver.resolve(&digest("d1"), Vec::new(), &ids(&[1]), &progress).await;
        assert!(first.fetches > 0);
        let before = catalogue.request_count();

        let second = resolver.resolve(&digest("d1"), Vec::new(), &ids(&[1]), &progress).await;
        assert_eq!(second.fetches, 0);
        assert!(second.from_cache);
        assert_eq!(catalogue.request_count(), before);
        assert_eq!(second.archetypes.len(), 2);
    }

    #[tokio::test]
    async fn failed_cache_write_keeps_the_closure() {
        let catalogue = Catalogue::default()
            .with(archetype(1, &[2]))
            .with(archetype(2, &[]));
        let resolver = ClosureResolver::new(&catalogue, &FullDisk);

        let outcome = resolver
            .resolve(&digest("d1"), Vec::new(), &ids(&[1]), &Progress::new(&NoProgress))
            .await;

        assert_eq!(outcome.archetypes.len(), 2);
        assert!(outcome.faults.is_empty());
        assert!(!outcome.from_cache);
    }

    #[tokio::test]
    async fn changed_digest_resolves_again() {
        let catalogue = Catalogue::default().with(archetype(1, &[]));
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache);
        let progress = Progress::new(&NoProgress);

        resolver.resolve(&digest("old"), Vec::new(), &ids(&[1]), &progress).await;
        let second = resolver.resolve(&digest("new"), Vec::new(), &ids(&[1]), &progress).await;

        assert!(!second.from_cache);
        assert_eq!(second.fetches, 1);
        assert_eq!(cache.len(Table::Equipment).unwrap(), 2);
    }

    #[tokio::test]
    async fn loaded_archetypes_beat_cached_ones() {
        let catalogue = Catalogue::default();
        let cache = MemoryCache::new();
        let stale = EquipmentCacheEntry {
            digest: digest("d1"),
            archetype_cache: vec![EquipmentArchetype {
                name: "stale".to_owned(),
                ..archetype(1, &[])
            }],
        };
        cache.upsert(Table::Equipment, "d1", &stale).await.unwrap();
        let resolver = ClosureResolver::new(&catalogue, &cache);

        let fresh = EquipmentArchetype {
            name: "fresh".to_owned(),
            ..archetype(1, &[])
        };
        let outcome = resolver
            .resolve(&digest("d1"), vec![fresh], &[], &Progress::new(&NoProgress))
            .await;

        assert_eq!(outcome.archetypes.len(), 1);
        assert_eq!(outcome.archetypes[0].name, "fresh");
    }

    #[tokio::test]
    async fn round_limit_faults_the_remainder_without_caching() {
        let mut catalogue = Catalogue::default();
        for id in 1..10 {
            catalogue = catalogue.with(archetype(id, &[id + 1]));
        }
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache).with_max_rounds(3);

        let outcome = resolver
            .resolve(&digest("d1"), Vec::new(), &ids(&[1]), &Progress::new(&NoProgress))
            .await;

        assert_eq!(outcome.rounds, 3);
        assert_eq!(outcome.archetypes.len(), 3);
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(outcome.faults[0].reason, FaultReason::RoundLimit);
        assert_eq!(cache.writes(), 0);
    }

    #[tokio::test]
    async fn batches_respect_the_size_limit() {
        let mut catalogue = Catalogue::default();
        let seeds: Vec<u64> = (1..=45).collect();
        for &id in &seeds {
            catalogue = catalogue.with(archetype(id, &[]));
        }
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache);

        let outcome = resolver
            .resolve(&digest("d1"), Vec::new(), &ids(&seeds), &Progress::new(&NoProgress))
            .await;

        assert_eq!(outcome.archetypes.len(), 45);
        let sizes: Vec<usize> = catalogue.requests.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
    }

    #[tokio::test]
    async fn cyclic_recipes_terminate() {
        let catalogue = Catalogue::default()
            .with(archetype(1, &[2]))
            .with(archetype(2, &[1]));
        let cache = MemoryCache::new();
        let resolver = ClosureResolver::new(&catalogue, &cache);

        let outcome = resolver
            .resolve(&digest("d1"), Vec::new(), &ids(&[1]), &Progress::new(&NoProgress))
            .await;

        assert_eq!(outcome.archetypes.len(), 2);
        assert!(outcome.faults.is_empty());
    }
}
