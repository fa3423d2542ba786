//! Backend access patterns for church search.
//!
//! The data backend exposes four remote search operations plus a plain
//! record lookup. Parameter structs serialize to the exact JSON argument
//! shapes those operations accept.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use steeple_core::{BeliefType, ChurchRecord, SearchCriteria};

use crate::errors::BackendError;

pub mod demo;
pub mod postgrest;
#[cfg(any(test, feature = "test-utils"))]
pub mod recording;

pub use demo::DemoBackend;
pub use postgrest::PostgrestBackend;
#[cfg(any(test, feature = "test-utils"))]
pub use recording::{RecordedCall, RecordingBackend};

/// Named remote operations of the data backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    Search,
    WithinRadius,
    InBBox,
    Nearby,
    FetchChurch,
}

impl BackendOperation {
    /// Remote procedure (or table) name on the backend.
    pub fn remote_name(self) -> &'static str {
        match self {
            Self::Search => "search_churches",
            Self::WithinRadius => "churches_within_radius",
            Self::InBBox => "churches_in_bbox",
            Self::Nearby => "churches_nearby",
            Self::FetchChurch => "churches",
        }
    }
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_name())
    }
}

/// Arguments of the generic full-text/filter search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSearchParams {
    pub q: Option<String>,
    pub belief_type: Option<BeliefType>,
    pub languages: Option<Vec<String>>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub locality: Option<String>,
    pub lim: u32,
    pub off: u32,
}

/// Arguments of the radius lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadiusParams {
    pub lng: f64,
    pub lat: f64,
    pub radius_m: f64,
    pub lim: u32,
}

/// Arguments of the bounding-box lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BBoxParams {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
    pub lim: u32,
}

/// Arguments of the nearest-churches lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyParams {
    pub lng: f64,
    pub lat: f64,
    pub lim: u32,
}

/// Exactly one backend call, derived from validated criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Search(TextSearchParams),
    WithinRadius(RadiusParams),
    InBBox(BBoxParams),
    Nearby(NearbyParams),
}

impl BackendCall {
    /// Maps criteria onto their access pattern. The table is closed: one
    /// criteria variant, one operation.
    pub fn for_criteria(criteria: &SearchCriteria) -> Self {
        match criteria {
            SearchCriteria::Text(text) => Self::Search(TextSearchParams {
                q: text.term.clone(),
                belief_type: text.filters.belief_type,
                languages: (!text.filters.languages.is_empty())
                    .then(|| text.filters.languages.clone()),
                country: text.filters.country.clone(),
                region: text.filters.region.clone(),
                locality: text.filters.locality.clone(),
                lim: text.limit,
                off: text.offset,
            }),
            SearchCriteria::Radius(radius) => Self::WithinRadius(RadiusParams {
                lng: radius.center.lng,
                lat: radius.center.lat,
                radius_m: radius.radius_m,
                lim: radius.limit,
            }),
            SearchCriteria::BBox(bbox) => Self::InBBox(BBoxParams {
                min_lng: bbox.bounds.min_lng,
                min_lat: bbox.bounds.min_lat,
                max_lng: bbox.bounds.max_lng,
                max_lat: bbox.bounds.max_lat,
                lim: bbox.limit,
            }),
            SearchCriteria::Nearby(nearby) => Self::Nearby(NearbyParams {
                lng: nearby.center.lng,
                lat: nearby.center.lat,
                lim: nearby.limit,
            }),
        }
    }

    pub fn operation(&self) -> BackendOperation {
        match self {
            Self::Search(_) => BackendOperation::Search,
            Self::WithinRadius(_) => BackendOperation::WithinRadius,
            Self::InBBox(_) => BackendOperation::InBBox,
            Self::Nearby(_) => BackendOperation::Nearby,
        }
    }
}

/// Trait for church data backends.
///
/// Implementations provide the remote operations through different
/// transports (PostgREST over HTTP, the in-memory demo directory, a
/// recording backend for tests). A successful call with zero rows is a
/// valid empty result, never an error.
#[async_trait]
pub trait SearchBackend: Send + Sync + fmt::Debug {
    /// Short label for logs and health output.
    fn name(&self) -> &'static str;

    /// Free text plus filters.
    ///
    /// # Errors
    /// - `BackendError` - The remote call failed or returned malformed rows
    async fn search(&self, params: &TextSearchParams) -> Result<Vec<ChurchRecord>, BackendError>;

    /// Churches within `radius_m` of a point, each carrying its distance.
    ///
    /// # Errors
    /// - `BackendError` - The remote call failed or returned malformed rows
    async fn within_radius(&self, params: &RadiusParams)
    -> Result<Vec<ChurchRecord>, BackendError>;

    /// Churches inside a bounding box.
    ///
    /// # Errors
    /// - `BackendError` - The remote call failed or returned malformed rows
    async fn in_bbox(&self, params: &BBoxParams) -> Result<Vec<ChurchRecord>, BackendError>;

    /// Closest churches to a point, each carrying its distance.
    ///
    /// # Errors
    /// - `BackendError` - The remote call failed or returned malformed rows
    async fn nearby(&self, params: &NearbyParams) -> Result<Vec<ChurchRecord>, BackendError>;

    /// Single record by identifier; `Ok(None)` when nothing matches.
    ///
    /// # Errors
    /// - `BackendError` - The remote call failed or returned malformed rows
    async fn fetch_church(&self, id: &str) -> Result<Option<ChurchRecord>, BackendError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use steeple_core::{OutputMode, QueryNormalizer};

    use super::*;

    fn call_for(body: serde_json::Value) -> BackendCall {
        let payload = body.as_object().cloned().unwrap();
        let query = QueryNormalizer::default()
            .normalize_request(&payload, Some(OutputMode::List))
            .unwrap();
        BackendCall::for_criteria(&query.criteria)
    }

    #[test]
    fn test_variant_table_is_closed() {
        assert_eq!(
            call_for(json!({})).operation(),
            BackendOperation::Search
        );
        assert_eq!(
            call_for(json!({"_variant": "radius", "lng": 1, "lat": 2, "radius_m": 3}))
                .operation(),
            BackendOperation::WithinRadius
        );
        assert_eq!(
            call_for(json!({"_variant": "bbox", "minLng": 0, "minLat": 0, "maxLng": 1, "maxLat": 1}))
                .operation(),
            BackendOperation::InBBox
        );
        assert_eq!(
            call_for(json!({"_variant": "nearby", "lng": 1, "lat": 2})).operation(),
            BackendOperation::Nearby
        );
    }

    #[test]
    fn test_text_params_shape() {
        let BackendCall::Search(params) = call_for(json!({
            "q": "st mary",
            "languages": "en,cy",
            "limit": 10,
        })) else {
            panic!("expected search call");
        };

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "q": "st mary",
                "belief_type": null,
                "languages": ["en", "cy"],
                "country": null,
                "region": null,
                "locality": null,
                "lim": 10,
                "off": 0,
            })
        );
    }

    #[test]
    fn test_bbox_params_use_snake_case_bounds() {
        let call = call_for(json!({
            "_variant": "bbox", "minLng": -3.5, "minLat": 51.0, "maxLng": -2.5, "maxLat": 52.0
        }));
        let BackendCall::InBBox(params) = call else {
            panic!("expected bbox call");
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"min_lng": -3.5, "min_lat": 51.0, "max_lng": -2.5, "max_lat": 52.0, "lim": 500})
        );
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(BackendOperation::WithinRadius.to_string(), "churches_within_radius");
        assert_eq!(BackendOperation::InBBox.remote_name(), "churches_in_bbox");
        assert_eq!(BackendOperation::Nearby.remote_name(), "churches_nearby");
    }
}
