//! Error types for the synchronization client.
//!
//! Stage-level failures ([`SyncError`]) abort the whole synchronization run
//! and surface as a single rejected operation. Cache failures never abort a
//! run: reads degrade to a miss and failed writes are logged.
//!
//! Item-level failures are not errors at this level: a failed equipment id
//! becomes a [`ResolutionFault`](crate::equipment::ResolutionFault) and a
//! failed image an [`ImageFault`](crate::images::ImageFault), both collected
//! in reports.

use crate::transport::TransportError;

/// Errors that abort a synchronization run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The transport failed (network error or non-success HTTP status).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A successful response lacked a required field or had the wrong shape.
    #[error("invalid data for {what}")]
    DataShape {
        /// The endpoint or record that was malformed.
        what: String,
    },

    /// No access token is configured.
    #[error("not logged in")]
    NotAuthorized,

    /// The complement worker went away before answering.
    #[error("complement worker failed: {0}")]
    Minimizer(String),
}

impl SyncError {
    /// Shorthand for a [`SyncError::DataShape`].
    pub fn data_shape(what: impl Into<String>) -> Self {
        Self::DataShape { what: what.into() }
    }
}
