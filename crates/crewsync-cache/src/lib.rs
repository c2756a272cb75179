//! Persistent cache tables for the crewsync client.
//!
//! The synchronization pipeline keeps a few expensive server answers across
//! runs: the resolved equipment closure (valid while the recipe digest is
//! unchanged), restored frozen crew, and conflict quest details. This crate
//! defines the [`CacheStore`] seam and two backends.
//!
//! # Architecture
//!
//! ```text
//! Sync pipeline
//!     |
//!     +-- lookup / upsert --> CacheStore
//!                               |-- MemoryCache     (in-process, tests, no-infra runs)
//!                               +-- DragonflyCache  (Dragonfly / Redis, survives restarts)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`CacheStore`] trait, table names and record types
//! - [`memory`] -- In-process backend with access counters
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) backend
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyCache;
pub use error::CacheError;
pub use memory::MemoryCache;
pub use store::{CacheStore, ConfigRecord, ImmortalRecord, QuestRecord, Table};
