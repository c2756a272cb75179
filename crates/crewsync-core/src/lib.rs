//! Synchronization pipeline for the crewsync game-data client.
//!
//! This crate talks to the game server, merges what it returns into a
//! working snapshot (roster, ships, items, equipment closure, missions),
//! resolves an image URL for every entity, and computes which crew a
//! player actually needs to keep for mission challenges.
//!
//! # Architecture
//!
//! ```text
//! SyncSession::run
//!     |
//!     +-- GameApi<T: Transport> ----> game server (HttpTransport)
//!     +-- CacheStore ---------------> equipment / immortals / quests tables
//!     +-- ImageResolver ------------> per-entity image URLs (fan_out)
//!     +-- ClosureResolver ----------> equipment recipe closure
//!     +-- SuccessScorer ------------> ChallengeSuccess per challenge
//!     +-- ComplementTask -----------> minimal crew set (blocking pool)
//! ```
//!
//! # Modules
//!
//! - [`transport`] -- HTTP seam, query strings, status-carrying errors
//! - [`api`] -- Typed endpoints on top of a transport
//! - [`config`] -- Client configuration from YAML and environment
//! - [`error`] -- Pipeline error type
//! - [`progress`] -- Progress sink and running counter
//! - [`images`] -- Image resolver seam, concurrent fan-out and sprites
//! - [`crew`] -- Roster construction
//! - [`ships`] -- Ship list construction and voyage ranking
//! - [`equipment`] -- Equipment closure resolver
//! - [`missions`] -- Mission and conflict quest loading
//! - [`scoring`] -- Challenge success scoring
//! - [`complement`] -- Minimal crew complement
//! - [`pipeline`] -- The staged synchronization run

pub mod api;
pub mod complement;
pub mod config;
pub mod crew;
pub mod equipment;
pub mod error;
pub mod images;
pub mod missions;
pub mod pipeline;
pub mod progress;
pub mod scoring;
pub mod ships;
pub mod transport;

#[cfg(test)]
mod testing;

pub use api::GameApi;
pub use complement::{ComplementHandle, ComplementTask, minimal_complement};
pub use config::ClientConfig;
pub use equipment::ClosureResolver;
pub use error::SyncError;
pub use images::{AssetKind, AssetRef, EntityKey, FoundImage, ImageError, ImageResolver};
pub use pipeline::{Stage, SyncOptions, SyncOutcome, SyncReport, SyncSession, SyncSnapshot};
pub use progress::{NoProgress, ProgressSink};
pub use scoring::{SkillScorer, SuccessScorer};
pub use transport::{HttpTransport, Transport, TransportError};
