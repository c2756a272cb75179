//! Image resolver backed by the game's asset server.
//!
//! Every asset lives at `{asset_url}/{file}.png`; sprites at
//! `{asset_url}/{bundle}/{name}.png`, or `{asset_url}/{name}.png` for loose
//! sprites. A URL is handed out only after a HEAD request confirms it, and
//! confirmed URLs are remembered for the rest of the process.

use std::collections::HashMap;
use std::sync::Mutex;

use crewsync_core::{AssetRef, EntityKey, FoundImage, ImageError, ImageResolver};
use tracing::debug;

/// Resolves images by probing the asset server.
pub struct AssetImageResolver {
    client: reqwest::Client,
    asset_url: String,
    found: Mutex<HashMap<String, String>>,
}

impl AssetImageResolver {
    /// A resolver for the asset server at `asset_url`.
    pub fn new(asset_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            asset_url: asset_url.trim_end_matches('/').to_owned(),
            found: Mutex::new(HashMap::new()),
        }
    }

    fn asset_location(&self, file: &str) -> String {
        format!("{}/{}.png", self.asset_url, file.trim_start_matches('/'))
    }

    fn sprite_location(&self, asset: &str, name: &str) -> String {
        if asset.is_empty() {
            format!("{}/{name}.png", self.asset_url)
        } else {
            format!("{}/{asset}/{name}.png", self.asset_url)
        }
    }

    fn remember(&self, file: &str, url: &str) {
        if let Ok(mut found) = self.found.lock() {
            found.insert(file.to_owned(), url.to_owned());
        }
    }

    /// HEAD `url` and accept it on any success status.
    async fn confirm(&self, url: String, key: EntityKey) -> Result<FoundImage, ImageError> {
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| ImageError::Lookup(format!("HEAD {url} failed: {e}")))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ImageError::NotFound(url));
        }
        if !status.is_success() {
            return Err(ImageError::Lookup(format!("HEAD {url} returned {status}")));
        }
        debug!(url = url, "asset confirmed");
        Ok(FoundImage { key, url })
    }
}

impl ImageResolver for AssetImageResolver {
    fn cached_url(&self, asset: &AssetRef) -> Option<String> {
        self.found.lock().ok()?.get(&asset.file).cloned()
    }

    async fn resolve(&self, asset: &AssetRef, key: EntityKey) -> Result<FoundImage, ImageError> {
        if asset.file.is_empty() {
            return Err(ImageError::NotFound(format!("{key} has no icon file")));
        }
        let found = self.confirm(self.asset_location(&asset.file), key).await?;
        self.remember(&asset.file, &found.url);
        Ok(found)
    }

    async fn resolve_sprite(
        &self,
        asset: &str,
        name: &str,
        key: EntityKey,
    ) -> Result<FoundImage, ImageError> {
        self.confirm(self.sprite_location(asset, name), key).await
    }
}
