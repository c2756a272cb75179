//! Cache backend selection.
//!
//! [`CacheStore`] has async methods and so cannot be a trait object. The
//! binary picks its backend at startup and dispatches through an enum.

use crewsync_cache::{CacheError, CacheStore, DragonflyCache, MemoryCache, Table};
use tracing::info;

/// The cache backend chosen for this run.
pub enum CacheBackend {
    /// In-process tables, gone when the process exits.
    Memory(MemoryCache),
    /// Dragonfly (Redis-compatible) server.
    Dragonfly(DragonflyCache),
}

impl CacheBackend {
    /// Connect to Dragonfly when a URL is configured, else use memory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the Dragonfly URL is invalid or the server
    /// is unreachable.
    pub async fn connect(dragonfly_url: Option<&str>) -> Result<Self, CacheError> {
        let backend = match dragonfly_url {
            Some(url) => Self::Dragonfly(DragonflyCache::connect(url).await?),
            None => Self::Memory(MemoryCache::new()),
        };
        info!(backend = backend.name(), "cache backend ready");
        Ok(backend)
    }

    /// Backend name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Dragonfly(_) => "dragonfly",
        }
    }
}

impl CacheStore for CacheBackend {
    async fn get_raw(&self, table: Table, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            Self::Memory(cache) => cache.get_raw(table, key).await,
            Self::Dragonfly(cache) => cache.get_raw(table, key).await,
        }
    }

    async fn put_raw(&self, table: Table, key: &str, value: String) -> Result<(), CacheError> {
        match self {
            Self::Memory(cache) => cache.put_raw(table, key, value).await,
            Self::Dragonfly(cache) => cache.put_raw(table, key, value).await,
        }
    }
}
