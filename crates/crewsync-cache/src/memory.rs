//! In-process cache backend.
//!
//! Holds every table in a single map behind a read-write lock. Used by the
//! CLI when no Dragonfly URL is configured and by tests, which also read the
//! access counters to assert how often the cache was consulted.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::CacheError;
use crate::store::{CacheStore, Table};

/// A [`CacheStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<(Table, String), String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get_raw` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `put_raw` calls served so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of records currently stored in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if a writer panicked.
    pub fn len(&self, table: Table) -> Result<usize, CacheError> {
        let entries = self.entries.read().map_err(|_poison| CacheError::Poisoned)?;
        Ok(entries.keys().filter(|(t, _)| *t == table).count())
    }
}

impl CacheStore for MemoryCache {
    async fn get_raw(&self, table: Table, key: &str) -> Result<Option<String>, CacheError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let entries = self.entries.read().map_err(|_poison| CacheError::Poisoned)?;
        Ok(entries.get(&(table, key.to_owned())).cloned())
    }

    async fn put_raw(&self, table: Table, key: &str, value: String) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.write().map_err(|_poison| CacheError::Poisoned)?;
        entries.insert((table, key.to_owned()), value);
        tracing::debug!(table = %table, key = key, "cache record stored");
        Ok(())
    }
}
