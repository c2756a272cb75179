//! Shared fixtures for the pipeline integration tests: an in-memory game
//! server and an image resolver with scripted failures.

#![allow(dead_code, clippy::unwrap_used, clippy::indexing_slicing, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crewsync_cache::{CacheError, CacheStore, Table};
use crewsync_core::transport::Query;
use crewsync_core::{AssetRef, EntityKey, FoundImage, ImageError, ImageResolver, Transport, TransportError};
use serde_json::{Value, json};

/// Digest the fake server reports.
pub const DIGEST: &str = "digest-1";

/// Game server double: fixed replies per path, a described-archetype
/// catalogue behind `item/description`, and a request log.
pub struct FakeServer {
    replies: HashMap<String, Value>,
    catalogue: HashMap<u64, Value>,
    rejected: HashSet<u64>,
    requests: Mutex<Vec<String>>,
}

impl FakeServer {
    /// A server answering every endpoint of a minimal successful run.
    pub fn new() -> Self {
        let replies = [
            ("character/get_avatar_crew_archetypes", json!({ "crew_avatars": [] })),
            (
                "config",
                json!({ "config": { "craft_config": { "recipe_tree": { "digest": DIGEST } } } }),
            ),
            ("config/platform", json!({ "config": { "trait_names": {} } })),
            ("ship_schematic", json!({ "schematics": [] })),
            ("player", player(json!({}), None)),
            ("mission/info", json!({ "character": { "accepted_missions": [] } })),
        ]
        .into_iter()
        .map(|(path, body)| (path.to_owned(), body))
        .collect();
        Self {
            replies,
            catalogue: HashMap::new(),
            rejected: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replace the reply for `path`.
    pub fn reply(mut self, path: &str, body: Value) -> Self {
        self.replies.insert(path.to_owned(), body);
        self
    }

    /// Make `path` answer 404.
    pub fn without(mut self, path: &str) -> Self {
        self.replies.remove(path);
        self
    }

    /// Archetypes `item/description` can describe.
    pub fn describing(mut self, archetypes: Vec<Value>) -> Self {
        for archetype in archetypes {
            let id = archetype["id"].as_u64().unwrap();
            self.catalogue.insert(id, archetype);
        }
        self
    }

    /// Fail every `item/description` batch that asks for `id`.
    pub fn rejecting(mut self, id: u64) -> Self {
        self.rejected.insert(id);
        self
    }

    /// Paths requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Whether `path` was requested.
    pub fn requested(&self, path: &str) -> bool {
        self.requests().iter().any(|p| p == path)
    }

    fn answer(&self, path: &str, params: &Query) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(path.to_owned());
        if path == "item/description" {
            let ids: Vec<u64> = params
                .list("ids")
                .iter()
                .filter_map(|id| id.parse::<u64>().ok())
                .collect();
            if ids.iter().any(|id| self.rejected.contains(id)) {
                return Err(TransportError::status(500, "description failed"));
            }
            let archetypes: Vec<Value> = ids
                .iter()
                .filter_map(|id| self.catalogue.get(id).cloned())
                .collect();
            return Ok(json!({ "item_archetype_cache": { "archetypes": archetypes } }));
        }
        self.replies
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::status(404, "not found"))
    }
}

impl Transport for FakeServer {
    async fn get(&self, path: &str, query: &Query) -> Result<Value, TransportError> {
        self.answer(path, query)
    }

    async fn post(
        &self,
        path: &str,
        form: &Query,
        _token: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.answer(path, form)
    }
}

/// A `player` reply around `character`, optionally in fleet `fleet_id`.
pub fn player(character: Value, fleet_id: Option<u64>) -> Value {
    let mut player = json!({ "id": 1, "display_name": "Tester", "character": character });
    if let Some(id) = fleet_id {
        player["fleet"] = json!({ "id": id, "rank": "LEADER" });
    }
    json!({ "player": player })
}

/// Crew catalogue entry `id` with portrait `/crew/p{id}` and body `/crew/b{id}`.
pub fn avatar(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("Crew {id}"),
        "short_name": format!("C{id}"),
        "symbol": format!("crew_{id}"),
        "max_rarity": 5,
        "portrait": { "file": format!("/crew/p{id}") },
        "full_body": { "file": format!("/crew/b{id}") },
    })
}

/// Owned copy of avatar `id`.
pub fn owned(id: u64) -> Value {
    json!({
        "id": id.saturating_add(1000),
        "archetype_id": id,
        "symbol": format!("crew_{id}"),
        "level": 50,
        "rarity": 3,
    })
}

/// Resolves every asset to `https://img.test{file}.png`, except files listed
/// as broken, which fail, and files listed as cached, which are hits.
#[derive(Default)]
pub struct FakeImages {
    broken: HashSet<String>,
    cached: HashSet<String>,
}

impl FakeImages {
    /// Fail these files.
    pub fn broken<I: IntoIterator<Item = String>>(mut self, files: I) -> Self {
        self.broken.extend(files);
        self
    }

    /// Serve these files from cache.
    pub fn cached<I: IntoIterator<Item = String>>(mut self, files: I) -> Self {
        self.cached.extend(files);
        self
    }
}

impl ImageResolver for FakeImages {
    fn cached_url(&self, asset: &AssetRef) -> Option<String> {
        self.cached
            .contains(&asset.file)
            .then(|| format!("cache://{}", asset.file))
    }

    async fn resolve(&self, asset: &AssetRef, key: EntityKey) -> Result<FoundImage, ImageError> {
        if self.broken.contains(&asset.file) {
            return Err(ImageError::NotFound(asset.file.clone()));
        }
        Ok(FoundImage {
            key,
            url: format!("https://img.test{}.png", asset.file),
        })
    }

    async fn resolve_sprite(
        &self,
        asset: &str,
        name: &str,
        key: EntityKey,
    ) -> Result<FoundImage, ImageError> {
        Ok(FoundImage {
            key,
            url: format!("https://img.test/{asset}/{name}.png"),
        })
    }
}

/// A cache that is always empty and refuses every write.
pub struct FullDisk;

impl CacheStore for FullDisk {
    async fn get_raw(&self, _table: Table, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn put_raw(&self, _table: Table, _key: &str, _value: String) -> Result<(), CacheError> {
        Err(CacheError::Config("disk full".to_owned()))
    }
}
