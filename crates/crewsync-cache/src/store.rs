//! The [`CacheStore`] seam and the records kept in each table.
//!
//! The cache is a handful of keyed tables. Backends only move raw JSON
//! strings in and out; typed [`lookup`](CacheStore::lookup) and
//! [`upsert`](CacheStore::upsert) are provided on top. Nothing in the
//! client ever deletes a record: entries are superseded by a newer upsert
//! under the same key, or simply stop matching (a stale recipe digest).
//!
//! # Tables
//!
//! | Table | Key | Record |
//! |-------|-----|--------|
//! | `equipment` | recipe digest | [`EquipmentCacheEntry`] |
//! | `immortals` | crew symbol | [`ImmortalRecord`] |
//! | `quests` | quest id | [`QuestRecord`] |
//! | `config` | config key | [`ConfigRecord`] |
//!
//! [`EquipmentCacheEntry`]: crewsync_types::EquipmentCacheEntry

use std::future::Future;

use chrono::{DateTime, Utc};
use crewsync_types::{Challenge, MasteryLevel, OwnedCrew, QuestId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// The cache tables used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// Resolved equipment closures keyed by recipe digest.
    Equipment,
    /// Restored frozen crew keyed by crew symbol.
    Immortals,
    /// Conflict quest details keyed by quest id.
    Quests,
    /// Small client settings keyed by name.
    Config,
}

impl Table {
    /// Table name used in storage keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Immortals => "immortals",
            Self::Quests => "quests",
            Self::Config => "config",
        }
    }
}

impl core::fmt::Display for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyed key-value store holding the client's cache tables.
///
/// Implementations must be shareable across the concurrent tasks of a
/// fan-out, hence the `Send + Sync` bound and `Send` futures.
pub trait CacheStore: Send + Sync {
    /// Read the raw JSON stored under `key` in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend read fails.
    fn get_raw(
        &self,
        table: Table,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, CacheError>> + Send;

    /// Store raw JSON under `key` in `table`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend write fails.
    fn put_raw(
        &self,
        table: Table,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Point lookup of a typed record.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the read fails or the stored JSON does not
    /// match `T`.
    fn lookup<T: DeserializeOwned + Send>(
        &self,
        table: Table,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, CacheError>> + Send {
        async move {
            let raw = self.get_raw(table, key).await?;
            raw.map(|json| serde_json::from_str(&json))
                .transpose()
                .map_err(CacheError::from)
        }
    }

    /// Insert or replace a typed record.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if serialization or the write fails.
    fn upsert<T: Serialize + Sync>(
        &self,
        table: Table,
        key: &str,
        record: &T,
    ) -> impl Future<Output = Result<(), CacheError>> + Send {
        let encoded = serde_json::to_string(record);
        async move { self.put_raw(table, key, encoded?).await }
    }
}

/// A frozen crew member's restored details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmortalRecord {
    /// Crew symbol (the table key).
    pub symbol: String,
    /// Restored crew details.
    pub crew: OwnedCrew,
    /// When the record was written.
    pub stored_at: DateTime<Utc>,
}

impl ImmortalRecord {
    /// Build a record stamped with the current time.
    pub fn new(symbol: impl Into<String>, crew: OwnedCrew) -> Self {
        Self {
            symbol: symbol.into(),
            crew,
            stored_at: Utc::now(),
        }
    }
}

/// Details of a conflict quest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRecord {
    /// Quest id (the table key).
    pub id: QuestId,
    /// Quest description.
    pub description: Option<String>,
    /// Challenges.
    pub challenges: Vec<Challenge>,
    /// Mastery levels.
    pub mastery_levels: Vec<MasteryLevel>,
    /// Cadet flag.
    pub cadet: Option<bool>,
    /// Cadet crew requirement.
    pub crew_requirement: Option<serde_json::Value>,
}

/// A named client setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Setting name (the table key).
    pub key: String,
    /// Setting value.
    pub value: serde_json::Value,
}
