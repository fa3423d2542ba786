//! Geometric contracts of the demo directory, checked through the service.

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use steeple_core::OutputMode;
use steeple_search::{DemoBackend, SearchService, ShapedResults};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn payload(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn list_rows(results: ShapedResults) -> Vec<steeple_core::ChurchRecord> {
    match results {
        ShapedResults::List(page) => page.results,
        other => panic!("expected list output, got {other:?}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn radius_rows_stay_inside_radius(
        lng in -123.0f64..24.0,
        lat in 30.0f64..55.0,
        radius_m in 1.0f64..100_000.0,
        limit in 1u32..10,
    ) {
        let service = SearchService::new_demo();
        let body = payload(json!({
            "_variant": "radius", "lng": lng, "lat": lat, "radius_m": radius_m, "limit": limit,
        }));
        let rows = list_rows(runtime().block_on(service.search_payload(&body, None)).unwrap());

        prop_assert!(rows.len() <= limit as usize);
        let distances: Vec<f64> = rows.iter().map(|row| row.distance_m.unwrap()).collect();
        prop_assert!(distances.iter().all(|&d| d <= radius_m));
        prop_assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn bbox_rows_match_containment(
        lng_a in -180.0f64..180.0,
        lng_b in -180.0f64..180.0,
        lat_a in -90.0f64..90.0,
        lat_b in -90.0f64..90.0,
    ) {
        let (min_lng, max_lng) = (lng_a.min(lng_b), lng_a.max(lng_b));
        let (min_lat, max_lat) = (lat_a.min(lat_b), lat_a.max(lat_b));
        let service = SearchService::new_demo();
        let body = payload(json!({
            "_variant": "bbox",
            "minLng": min_lng, "minLat": min_lat, "maxLng": max_lng, "maxLat": max_lat,
        }));
        let rows = list_rows(runtime().block_on(service.search_payload(&body, None)).unwrap());

        let inside = |lng: f64, lat: f64| {
            lng >= min_lng && lng <= max_lng && lat >= min_lat && lat <= max_lat
        };
        let expected = DemoBackend::new()
            .records()
            .iter()
            .filter(|record| record.coordinates().is_some_and(|(lng, lat)| inside(lng, lat)))
            .count();

        prop_assert_eq!(rows.len(), expected);
        for row in &rows {
            let (lng, lat) = row.coordinates().unwrap();
            prop_assert!(inside(lng, lat));
            prop_assert!(row.distance_m.is_none());
        }
    }
}

#[tokio::test]
async fn test_bbox_edges_are_inclusive() {
    let service = SearchService::new_demo();
    let body = payload(json!({
        "_variant": "bbox",
        "minLng": -0.0984, "minLat": 51.5138, "maxLng": -0.0984, "maxLat": 51.5138,
    }));
    let rows = list_rows(service.search_payload(&body, None).await.unwrap());

    let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids, ["6"]);
}

#[tokio::test]
async fn test_nearby_geojson_skips_ungeocoded_church() {
    let service = SearchService::new_demo();
    let body = payload(json!({"_variant": "nearby", "lng": -3.18, "lat": 51.48, "limit": 50}));
    let results = service
        .search_payload(&body, Some(OutputMode::GeoJson))
        .await
        .unwrap();

    let ShapedResults::GeoJson(collection) = results else {
        panic!("expected a feature collection");
    };
    assert_eq!(collection.features.len(), 7);
    assert!(collection.features.iter().all(|feature| {
        feature.id != Some(geojson::feature::Id::String("8".to_string()))
    }));
}

#[tokio::test]
async fn test_text_search_without_term_lists_every_church() {
    let service = SearchService::new_demo();
    let rows = list_rows(service.search_payload(&Map::new(), None).await.unwrap());

    assert_eq!(rows.len(), 8);
    assert!(rows.windows(2).all(|pair| pair[0].name <= pair[1].name));
}

#[tokio::test]
async fn test_text_filters_combine() {
    let service = SearchService::new_demo();
    let body = payload(json!({"belief_type": "Orthodox", "languages": ["EL"], "country": "gr"}));
    let rows = list_rows(service.search_payload(&body, None).await.unwrap());

    let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids, ["7"]);
}
