//! JSON API server for Steeple
//!
//! Stateless per request: the only shared state is the search service,
//! which holds configuration and the backend handle but no request data.

use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use steeple_core::{RuntimeMode, SteepleConfig};
use steeple_search::SearchService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{
    api_church, api_health, api_method_not_allowed, api_not_found, api_search,
    api_search_geojson,
};

/// App state shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Search pipeline over the configured backend
    pub search_service: SearchService,
    /// Runtime mode the server was started in
    pub mode: RuntimeMode,
    /// Server start time, for uptime reporting
    pub server_started_at: Instant,
}

impl AppState {
    /// Creates state around an existing search service.
    pub fn new(search_service: SearchService, mode: RuntimeMode) -> Self {
        Self {
            search_service,
            mode,
            server_started_at: Instant::now(),
        }
    }
}

/// Builds the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/search", post(api_search))
        .route("/api/search/geojson", post(api_search_geojson))
        .route("/api/churches/{id}", get(api_church))
        .fallback(api_not_found)
        .method_not_allowed_fallback(api_method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the API server until Ctrl-C.
///
/// # Errors
/// - `Box<dyn std::error::Error>` - Backend client setup, bind or serve failure
pub async fn run_server(config: SteepleConfig) -> Result<(), Box<dyn std::error::Error>> {
    let search_service = SearchService::from_config(&config)?;
    let state = AppState::new(search_service, config.mode);
    let app = build_router(state);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        "Steeple search API running on http://{} (mode={}, backend={})",
        listener.local_addr()?,
        config.mode,
        if config.mode.is_production() {
            config.backend.base_url.as_str()
        } else {
            "in-memory demo"
        }
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Steeple search API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use steeple_core::QueryLimits;
    use steeple_search::backend::RecordingBackend;
    use tower::ServiceExt;

    use super::*;

    fn router_with(backend: RecordingBackend) -> Router {
        let service = SearchService::new(Arc::new(backend), QueryLimits::default());
        build_router(AppState::new(service, RuntimeMode::Development))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let request = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, body) = send(router_with(RecordingBackend::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "recording");
        assert_eq!(body["mode"], "development");
    }

    #[tokio::test]
    async fn test_empty_result_is_success() {
        let (status, body) = send(
            router_with(RecordingBackend::returning(Vec::new())),
            post("/api/search", json!({"q": "nothing"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"results": [], "count": 0}));
    }

    #[tokio::test]
    async fn test_unknown_route_keeps_error_shape() {
        let request = Request::get("/api/nope").body(Body::empty()).unwrap();
        let (status, body) = send(router_with(RecordingBackend::default()), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("/api/nope"));
    }

    #[tokio::test]
    async fn test_wrong_method_keeps_error_shape() {
        let backend = RecordingBackend::default();
        let request = Request::get("/api/search").body(Body::empty()).unwrap();
        let (status, body) = send(router_with(backend.clone()), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "method GET not allowed for /api/search"}));
        assert_eq!(backend.call_count(), 0);

        let request = Request::delete("/api/churches/1").body(Body::empty()).unwrap();
        let (status, body) = send(router_with(RecordingBackend::default()), request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(body["error"].is_string());
    }
}
