//! PostgREST client tests against a local fake gateway.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use parking_lot::Mutex;
use serde_json::{Value, json};
use steeple_core::{BackendConfig, QueryLimits};
use steeple_search::{
    BackendError, BackendOperation, PostgrestBackend, RadiusParams, SearchBackend, SearchError,
    SearchService, ShapedResults,
};
use tokio::net::TcpListener;

/// Canned answer for every request the gateway receives.
#[derive(Clone)]
enum Reply {
    Rows(Value),
    Status(StatusCode, String),
    Garbage,
}

#[derive(Debug, Clone)]
struct SeenRequest {
    path: String,
    query: Option<String>,
    apikey: Option<String>,
    authorization: Option<String>,
    body: Option<Value>,
}

#[derive(Clone)]
struct FakeGateway {
    reply: Reply,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl FakeGateway {
    fn record(&self, uri: &Uri, headers: &HeaderMap, body: Option<Value>) -> Response {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().push(SeenRequest {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            apikey: header("apikey"),
            authorization: header("authorization"),
            body,
        });

        match self.reply {
            Reply::Rows(ref rows) => axum::Json(rows.clone()).into_response(),
            Reply::Status(status, ref body) => (status, body.clone()).into_response(),
            Reply::Garbage => (StatusCode::OK, "<html>gateway</html>").into_response(),
        }
    }

    fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }
}

async fn rpc(
    State(gateway): State<FakeGateway>,
    Path(_name): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gateway.record(&uri, &headers, serde_json::from_slice(&body).ok())
}

async fn table(State(gateway): State<FakeGateway>, uri: Uri, headers: HeaderMap) -> Response {
    gateway.record(&uri, &headers, None)
}

async fn start_gateway(reply: Reply) -> (FakeGateway, String) {
    let gateway = FakeGateway {
        reply,
        seen: Arc::default(),
    };
    let app = Router::new()
        .route("/rest/v1/rpc/{name}", post(rpc))
        .route("/rest/v1/churches", get(table))
        .with_state(gateway.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (gateway, format!("http://{address}"))
}

fn backend_for(base_url: &str) -> PostgrestBackend {
    PostgrestBackend::new(&BackendConfig {
        base_url: base_url.to_string(),
        api_key: Some("anon-key".to_string()),
        request_timeout: Duration::from_secs(5),
        ..BackendConfig::default()
    })
    .unwrap()
}

fn radius_params() -> RadiusParams {
    RadiusParams {
        lng: -0.1,
        lat: 51.5,
        radius_m: 2_000.0,
        lim: 200,
    }
}

#[tokio::test]
async fn test_rpc_rows_decode() {
    let (gateway, url) = start_gateway(Reply::Rows(json!([
        {"id": 6, "name": "St Paul's Cathedral", "lng": -0.0984, "lat": 51.5138,
         "locality": "London", "country": "GB", "belief_type": "anglican",
         "service_languages": ["en"], "distance": 171.2},
        {"id": "b3c1", "name": "Unmapped Chapel", "longitude": null, "latitude": null,
         "service_languages": null},
    ])))
    .await;

    let rows = backend_for(&url).within_radius(&radius_params()).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "6");
    assert_eq!(rows[0].coordinates(), Some((-0.0984, 51.5138)));
    assert_eq!(rows[0].distance_m, Some(171.2));
    assert_eq!(rows[1].id, "b3c1");
    assert!(!rows[1].is_plottable());
    assert!(rows[1].service_languages.is_empty());

    let seen = gateway.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/rest/v1/rpc/churches_within_radius");
    assert_eq!(
        seen[0].body,
        Some(json!({"lng": -0.1, "lat": 51.5, "radius_m": 2000.0, "lim": 200}))
    );
}

#[tokio::test]
async fn test_credentials_are_forwarded() {
    let (gateway, url) = start_gateway(Reply::Rows(json!([]))).await;

    backend_for(&url).within_radius(&radius_params()).await.unwrap();

    let seen = gateway.seen();
    assert_eq!(seen[0].apikey.as_deref(), Some("anon-key"));
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer anon-key"));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let long_body = "x".repeat(4_000);
    let (_gateway, url) =
        start_gateway(Reply::Status(StatusCode::SERVICE_UNAVAILABLE, long_body)).await;

    let error = backend_for(&url)
        .within_radius(&radius_params())
        .await
        .unwrap_err();

    match error {
        BackendError::Status {
            operation,
            status,
            body,
        } => {
            assert_eq!(operation, BackendOperation::WithinRadius);
            assert_eq!(status, 503);
            assert!(body.len() <= 512);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let (_gateway, url) = start_gateway(Reply::Garbage).await;

    let error = backend_for(&url)
        .within_radius(&radius_params())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        BackendError::Malformed {
            operation: BackendOperation::WithinRadius,
            ..
        }
    ));
}

#[tokio::test]
async fn test_error_object_with_success_status_is_rejected() {
    let (_gateway, url) = start_gateway(Reply::Rows(json!({
        "code": "22023", "message": "radius must be positive", "details": null, "hint": null,
    })))
    .await;

    let error = backend_for(&url)
        .within_radius(&radius_params())
        .await
        .unwrap_err();

    match error {
        BackendError::Rejected { operation, reason } => {
            assert_eq!(operation, BackendOperation::WithinRadius);
            assert_eq!(reason, "22023: radius must be positive");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_gateway_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let error = backend_for(&format!("http://{address}"))
        .within_radius(&radius_params())
        .await
        .unwrap_err();

    assert!(matches!(error, BackendError::Transport { .. }));
}

#[tokio::test]
async fn test_fetch_church_queries_table() {
    let (gateway, url) = start_gateway(Reply::Rows(json!([
        {"id": 6, "name": "St Paul's Cathedral", "lng": -0.0984, "lat": 51.5138},
    ])))
    .await;

    let record = backend_for(&url).fetch_church("6").await.unwrap().unwrap();
    assert_eq!(record.name, "St Paul's Cathedral");

    let seen = gateway.seen();
    assert_eq!(seen[0].path, "/rest/v1/churches");
    assert_eq!(seen[0].query.as_deref(), Some("id=eq.6&select=*"));
}

#[tokio::test]
async fn test_fetch_church_without_rows_is_none() {
    let (_gateway, url) = start_gateway(Reply::Rows(json!([]))).await;
    assert!(backend_for(&url).fetch_church("404").await.unwrap().is_none());
}

#[tokio::test]
async fn test_service_over_gateway_shapes_geojson() {
    let (gateway, url) = start_gateway(Reply::Rows(json!([
        {"id": 1, "name": "Grace Cathedral", "longitude": -122.413, "latitude": 37.7919},
        {"id": 2, "name": "Unmapped", "longitude": -122.4, "latitude": null},
    ])))
    .await;
    let service = SearchService::new(Arc::new(backend_for(&url)), QueryLimits::default());

    let payload = json!({
        "_variant": "bbox", "minLng": -123, "minLat": 37, "maxLng": -122, "maxLat": 38,
    });
    let results = service
        .search_payload(payload.as_object().unwrap(), Some(steeple_core::OutputMode::GeoJson))
        .await
        .unwrap();

    let ShapedResults::GeoJson(collection) = results else {
        panic!("expected a feature collection");
    };
    assert_eq!(collection.features.len(), 1);

    let seen = gateway.seen();
    assert_eq!(seen[0].path, "/rest/v1/rpc/churches_in_bbox");
    assert_eq!(
        seen[0].body,
        Some(json!({"min_lng": -123.0, "min_lat": 37.0, "max_lng": -122.0, "max_lat": 38.0, "lim": 500}))
    );
}

#[tokio::test]
async fn test_service_surfaces_gateway_failure_as_backend_error() {
    let (_gateway, url) = start_gateway(Reply::Status(
        StatusCode::INTERNAL_SERVER_ERROR,
        "function churches_nearby does not exist".to_string(),
    ))
    .await;
    let service = SearchService::new(Arc::new(backend_for(&url)), QueryLimits::default());

    let payload = json!({"_variant": "nearby", "lng": 0, "lat": 0});
    let error = service
        .search_payload(payload.as_object().unwrap(), None)
        .await
        .unwrap_err();

    assert!(matches!(error, SearchError::Backend(BackendError::Status { status: 500, .. })));
}
