//! `Dragonfly` (Redis-compatible) cache backend.
//!
//! Every table record is a JSON string stored at `crewsync:{table}:{key}`.
//! Records never expire; a newer upsert overwrites the old value.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `crewsync:equipment:{digest}` | JSON | Resolved equipment closure |
//! | `crewsync:immortals:{symbol}` | JSON | Restored frozen crew |
//! | `crewsync:quests:{id}` | JSON | Conflict quest details |
//! | `crewsync:config:{key}` | JSON | Client setting |

use fred::prelude::*;

use crate::error::CacheError;
use crate::store::{CacheStore, Table};

/// Prefix shared by every key this client writes.
const KEY_PREFIX: &str = "crewsync";

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
///
/// Wraps a [`fred::prelude::Client`]; cheap to clone.
#[derive(Clone)]
pub struct DragonflyCache {
    client: Client,
}

impl DragonflyCache {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the URL cannot be parsed.
    /// Returns [`CacheError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let config = Config::from_url(url)
            .map_err(|e| CacheError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Storage key of a table record.
    pub fn record_key(table: Table, key: &str) -> String {
        format!("{KEY_PREFIX}:{table}:{key}")
    }

    /// Flush all keys from the `Dragonfly` instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Dragonfly`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), CacheError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }
}

impl CacheStore for DragonflyCache {
    async fn get_raw(&self, table: Table, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = self.client.get(Self::record_key(table, key)).await?;
        Ok(value)
    }

    async fn put_raw(&self, table: Table, key: &str, value: String) -> Result<(), CacheError> {
        let record_key = Self::record_key(table, key);
        let _: () = self
            .client
            .set(record_key.as_str(), value.as_str(), None, None, false)
            .await?;
        tracing::debug!(key = record_key, "cache record stored");
        Ok(())
    }
}
