//! API handlers for church search

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{Method, Uri, header};
use axum::response::IntoResponse;
use serde_json::json;
use steeple_core::{ChurchRecord, OutputMode};
use steeple_search::ShapedResults;

use super::error::ApiError;
use super::utils::parse_payload;
use crate::server::AppState;

/// Media type for GeoJSON bodies (RFC 7946).
pub const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";

/// `POST /api/search` - variant from `_variant`, shape from `_output`.
///
/// # Errors
/// - `ApiError` - Invalid body (400) or backend failure (502)
pub async fn api_search(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, ApiError> {
    let payload = parse_payload(&body)?;
    let results = state.search_service.search_payload(&payload, None).await?;
    Ok(render(results))
}

/// `POST /api/search/geojson` - any variant, always a `FeatureCollection`.
///
/// # Errors
/// - `ApiError` - Invalid body (400) or backend failure (502)
pub async fn api_search_geojson(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, ApiError> {
    let payload = parse_payload(&body)?;
    let results = state
        .search_service
        .search_payload(&payload, Some(OutputMode::GeoJson))
        .await?;
    Ok(render(results))
}

/// `GET /api/churches/{id}` - single church record.
///
/// # Errors
/// - `ApiError` - Unknown id (404), blank id (400) or backend failure (502)
pub async fn api_church(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChurchRecord>, ApiError> {
    Ok(Json(state.search_service.church(&id).await?))
}

/// `GET /api/health` - liveness plus the active backend.
pub async fn api_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "mode": state.mode.to_string(),
        "backend": state.search_service.backend_name(),
        "uptime_secs": state.server_started_at.elapsed().as_secs(),
    }))
}

/// Fallback for unmatched routes, keeping the `{ "error": ... }` body shape.
pub async fn api_not_found(uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        path: uri.path().to_string(),
    }
}

/// Fallback for known paths hit with an unsupported method.
pub async fn api_method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

fn render(results: ShapedResults) -> axum::response::Response {
    if matches!(results, ShapedResults::GeoJson(_)) {
        ([(header::CONTENT_TYPE, GEOJSON_CONTENT_TYPE)], Json(results)).into_response()
    } else {
        Json(results).into_response()
    }
}
