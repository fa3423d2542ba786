//! Error types for church search.

use steeple_core::ValidationError;
use thiserror::Error;

use crate::backend::BackendOperation;

/// Failure of the single outbound backend call. Never retried.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request could not be sent or the response body not read.
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: BackendOperation,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success HTTP status.
    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: BackendOperation,
        status: u16,
        body: String,
    },

    /// The response body did not decode into church rows.
    #[error("{operation} returned malformed rows: {source}")]
    Malformed {
        operation: BackendOperation,
        #[source]
        source: serde_json::Error,
    },

    /// The backend answered successfully but with an error object instead of rows.
    #[error("{operation} reported an error: {reason}")]
    Rejected {
        operation: BackendOperation,
        reason: String,
    },

    /// The backend client could not be configured.
    #[error("backend configuration error: {reason}")]
    Configuration { reason: String },
}

impl BackendError {
    /// Operation that failed, when the failure happened during a call.
    pub fn operation(&self) -> Option<BackendOperation> {
        match self {
            Self::Transport { operation, .. }
            | Self::Status { operation, .. }
            | Self::Malformed { operation, .. }
            | Self::Rejected { operation, .. } => Some(*operation),
            Self::Configuration { .. } => None,
        }
    }
}

/// Everything a search request can fail with.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Caller supplied malformed or incomplete input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The data backend failed; details stay server-side.
    #[error("search backend failure: {0}")]
    Backend(#[from] BackendError),

    /// No church carries the requested identifier.
    #[error("church '{id}' not found")]
    NotFound { id: String },
}
