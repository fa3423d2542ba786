//! Translation of search failures into HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use steeple_core::ValidationError;
use steeple_search::SearchError;
use thiserror::Error;

/// Message returned for every backend failure; causes are only logged.
pub const BACKEND_FAILURE_MESSAGE: &str = "search backend unavailable";

/// Error returned by API handlers. Every variant renders as `{ "error": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure raised by the search pipeline.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// No route matched the request.
    #[error("no route for {path}")]
    RouteNotFound {
        /// Requested path
        path: String,
    },

    /// The path exists but does not accept this method.
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Request method
        method: String,
        /// Requested path
        path: String,
    },
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::Search(SearchError::Validation(error))
    }
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Search(SearchError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Search(SearchError::NotFound { .. }) | Self::RouteNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::Search(SearchError::Backend(_)) => StatusCode::BAD_GATEWAY,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Search(SearchError::Validation(e)) => json!({
                "error": e.message,
                "kind": e.kind,
                "field": e.field,
            }),
            Self::Search(SearchError::Backend(e)) => {
                tracing::error!(
                    error = %e,
                    operation = ?e.operation(),
                    "Search request failed at the backend"
                );
                json!({ "error": BACKEND_FAILURE_MESSAGE })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
