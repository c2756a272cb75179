//! Error types for the cache layer.
//!
//! All backends report failures through [`CacheError`], which wraps the
//! underlying [`fred`] and [`serde_json`] errors.

/// Errors that can occur reading or writing a cache table.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A record could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The in-process store's lock was poisoned by a panicking writer.
    #[error("cache lock poisoned")]
    Poisoned,
}
