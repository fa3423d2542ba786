//! HTTP boundary tests
//!
//! Drive the router end to end with a recording backend and check status
//! codes, body shapes and exactly which backend calls were made.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use steeple_core::{BeliefType, ChurchRecord, QueryLimits, RuntimeMode};
use steeple_search::SearchService;
use steeple_search::backend::{BackendCall, RecordedCall, RecordingBackend};
use steeple_web::{AppState, build_router};
use tower::ServiceExt;

fn church(id: &str, coordinates: Option<(f64, f64)>, distance_m: Option<f64>) -> ChurchRecord {
    ChurchRecord {
        id: id.to_string(),
        name: format!("Church {id}"),
        longitude: coordinates.map(|(lng, _)| lng),
        latitude: coordinates.map(|(_, lat)| lat),
        locality: Some("London".to_string()),
        region: Some("England".to_string()),
        country: Some("GB".to_string()),
        website: None,
        belief_type: Some(BeliefType::Anglican),
        service_languages: vec!["en".to_string()],
        distance_m,
    }
}

fn sample_rows() -> Vec<ChurchRecord> {
    vec![
        church("10", Some((-0.0984, 51.5138)), Some(120.5)),
        church("11", None, None),
        church("12", Some((-0.1922, 51.5128)), Some(6_500.0)),
    ]
}

fn router_over(backend: &RecordingBackend) -> Router {
    let service = SearchService::new(Arc::new(backend.clone()), QueryLimits::default());
    build_router(AppState::new(service, RuntimeMode::Production))
}

async fn post_raw(router: Router, uri: &str, body: &str) -> (StatusCode, Option<String>, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, _, body) = post_raw(router, uri, &body.to_string()).await;
    (status, body)
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn only_dispatch(backend: &RecordingBackend) -> BackendCall {
    let calls = backend.calls();
    assert_eq!(calls.len(), 1, "expected exactly one backend call: {calls:?}");
    match calls.into_iter().next() {
        Some(RecordedCall::Dispatch(call)) => call,
        other => panic!("expected a search dispatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_required_field_is_rejected_without_backend_call() {
    let backend = RecordingBackend::returning(sample_rows());
    let (status, body) = post_json(
        router_over(&backend),
        "/api/search",
        json!({"_variant": "radius", "lng": -0.1, "radius_m": 1000}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "lat");
    assert_eq!(body["kind"], "missing");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_inputs_never_reach_backend() {
    let cases = [
        (r#"{"_variant": "circle"}"#, "_variant"),
        (r#"{"_output": "csv"}"#, "_output"),
        (r#"{"_variant": "radius", "lng": 0, "lat": 0, "radius_m": -5}"#, "radius_m"),
        (r#"{"_variant": "radius", "lng": 0, "lat": 0, "radius_m": 100001}"#, "radius_m"),
        (r#"{"_variant": "radius", "lng": "abc", "lat": 0, "radius_m": 10}"#, "lng"),
        (r#"{"_variant": "nearby", "lng": 0, "lat": 91}"#, "lat"),
        (r#"{"_variant": "nearby", "lng": 181, "lat": 0}"#, "lng"),
        (
            r#"{"_variant": "bbox", "minLng": 2, "minLat": 0, "maxLng": 1, "maxLat": 1}"#,
            "minLng",
        ),
        (
            r#"{"_variant": "bbox", "minLng": 0, "minLat": 5, "maxLng": 1, "maxLat": 1}"#,
            "minLat",
        ),
        (r#"{"q": "abbey", "limit": 0}"#, "limit"),
        (r#"{"q": "abbey", "limit": 2001}"#, "limit"),
        (r#"{"q": "abbey", "limit": 2.5}"#, "limit"),
        (r#"{"belief_type": "druid"}"#, "belief_type"),
        ("[1, 2]", "body"),
        ("{not json", "body"),
    ];

    for (body, field) in cases {
        let backend = RecordingBackend::returning(sample_rows());
        let (status, _, response) = post_raw(router_over(&backend), "/api/search", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(response["field"], field, "body {body}");
        assert!(response["error"].is_string(), "body {body}");
        assert_eq!(backend.call_count(), 0, "body {body}");
    }
}

#[tokio::test]
async fn test_backend_failure_is_generic() {
    let backend = RecordingBackend::failing("permission denied for table churches_private");
    let (status, _, body) = post_raw(
        router_over(&backend),
        "/api/search",
        r#"{"_variant": "nearby", "lng": -0.1, "lat": 51.5}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "search backend unavailable"}));
    assert!(!body.to_string().contains("churches_private"));
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_absent_variant_means_text() {
    let implicit = RecordingBackend::returning(Vec::new());
    let explicit = RecordingBackend::returning(Vec::new());

    let (status, _) = post_json(
        router_over(&implicit),
        "/api/search",
        json!({"q": "st mary", "country": "GB"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json(
        router_over(&explicit),
        "/api/search",
        json!({"_variant": "text", "q": "st mary", "country": "GB"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(implicit.calls(), explicit.calls());
    assert!(matches!(only_dispatch(&implicit), BackendCall::Search(_)));
}

#[tokio::test]
async fn test_default_limits_reach_backend() {
    let cases = [
        (json!({}), 1000),
        (json!({"_variant": "radius", "lng": 0, "lat": 0, "radius_m": 500}), 200),
        (
            json!({"_variant": "bbox", "minLng": -1, "minLat": -1, "maxLng": 1, "maxLat": 1}),
            500,
        ),
        (json!({"_variant": "nearby", "lng": 0, "lat": 0}), 50),
    ];

    for (body, expected) in cases {
        let backend = RecordingBackend::returning(Vec::new());
        let (status, _) = post_json(router_over(&backend), "/api/search", body.clone()).await;
        assert_eq!(status, StatusCode::OK, "body {body}");

        let limit = match only_dispatch(&backend) {
            BackendCall::Search(params) => params.lim,
            BackendCall::WithinRadius(params) => params.lim,
            BackendCall::InBBox(params) => params.lim,
            BackendCall::Nearby(params) => params.lim,
        };
        assert_eq!(limit, expected, "body {body}");
    }
}

#[tokio::test]
async fn test_explicit_limit_and_offset_pass_through() {
    let backend = RecordingBackend::returning(Vec::new());
    post_json(
        router_over(&backend),
        "/api/search",
        json!({"q": "abbey", "limit": "25", "offset": 50}),
    )
    .await;

    let BackendCall::Search(params) = only_dispatch(&backend) else {
        panic!("expected text search");
    };
    assert_eq!(params.lim, 25);
    assert_eq!(params.off, 50);
    assert_eq!(params.q.as_deref(), Some("abbey"));
}

#[tokio::test]
async fn test_list_keeps_backend_order_and_distance_for_radius() {
    let backend = RecordingBackend::returning(sample_rows());
    let (status, body) = post_json(
        router_over(&backend),
        "/api/search",
        json!({"_variant": "radius", "lng": -0.1, "lat": 51.5, "radius_m": 10000}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let ids: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["10", "11", "12"]);
    assert_eq!(body["results"][0]["distance_m"], 120.5);
}

#[tokio::test]
async fn test_text_list_omits_distance() {
    let backend = RecordingBackend::returning(sample_rows());
    let (_, body) = post_json(router_over(&backend), "/api/search", json!({"q": "church"})).await;

    for row in body["results"].as_array().unwrap() {
        assert!(row.get("distance_m").is_none(), "unexpected distance in {row}");
    }
}

#[tokio::test]
async fn test_pins_exclude_unplottable_records() {
    let backend = RecordingBackend::returning(sample_rows());
    let (status, body) = post_json(
        router_over(&backend),
        "/api/search",
        json!({"_variant": "bbox", "_output": "pins",
               "minLng": -1, "minLat": 51, "maxLng": 0, "maxLat": 52}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    for pin in body["results"].as_array().unwrap() {
        assert!(pin["longitude"].is_f64());
        assert!(pin["latitude"].is_f64());
    }
}

#[tokio::test]
async fn test_geojson_endpoint_uses_lng_lat_order() {
    let backend = RecordingBackend::returning(sample_rows());
    let (status, content_type, body) = post_raw(
        router_over(&backend),
        "/api/search/geojson",
        r#"{"_variant": "nearby", "lng": -0.1, "lat": 51.5, "_output": "list"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/geo+json"));
    assert_eq!(body["type"], "FeatureCollection");

    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["id"], "10");
    assert_eq!(features[0]["geometry"]["type"], "Point");
    assert_eq!(features[0]["geometry"]["coordinates"], json!([-0.0984, 51.5138]));
    assert_eq!(features[0]["properties"]["name"], "Church 10");
    assert_eq!(features[0]["properties"]["distance_m"], 120.5);
    assert!(features[0]["properties"].get("longitude").is_none());
}

#[tokio::test]
async fn test_geojson_empty_result_is_empty_collection() {
    let backend = RecordingBackend::returning(Vec::new());
    let (status, _, body) = post_raw(router_over(&backend), "/api/search/geojson", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");
    assert_eq!(body["features"], json!([]));
}

#[tokio::test]
async fn test_church_lookup() {
    let backend = RecordingBackend::returning(sample_rows());

    let (status, body) = get_json(router_over(&backend), "/api/churches/12").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "12");
    assert!(body.get("distance_m").is_none());

    let (status, body) = get_json(router_over(&backend), "/api/churches/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "church '42' not found"}));

    assert_eq!(
        backend.calls(),
        vec![
            RecordedCall::Fetch("12".to_string()),
            RecordedCall::Fetch("42".to_string()),
        ]
    );
}
