//! Canonical search queries.
//!
//! A [`SearchQuery`] pairs *what to select* ([`SearchCriteria`]) with *how to
//! shape the answer* ([`OutputMode`]). Keeping the two axes independent lets
//! every selection variant be rendered as rows, map pins or GeoJSON.

mod fields;
mod normalize;

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

pub use normalize::QueryNormalizer;

use crate::errors::ValidationError;
use crate::record::BeliefType;

/// Payload key carrying the variant discriminator.
pub const VARIANT_FIELD: &str = "_variant";
/// Payload key carrying the requested output mode.
pub const OUTPUT_FIELD: &str = "_output";

/// Default result cap for free-text searches.
pub const DEFAULT_TEXT_LIMIT: u32 = 1000;
/// Default result cap for radius lookups.
pub const DEFAULT_RADIUS_LIMIT: u32 = 200;
/// Default result cap for bounding-box lookups.
pub const DEFAULT_BBOX_LIMIT: u32 = 500;
/// Default result cap for nearest-church lookups.
pub const DEFAULT_NEARBY_LIMIT: u32 = 50;

/// Search intent selected by the `_variant` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Free text plus filters
    #[default]
    Text,
    /// Everything within a distance of a point
    Radius,
    /// Everything inside a longitude/latitude box
    BBox,
    /// The closest churches to a point, without a distance bound
    Nearby,
}

impl Variant {
    /// Wire name of the variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Radius => "radius",
            Self::BBox => "bbox",
            Self::Nearby => "nearby",
        }
    }

    /// Result cap applied when the payload carries no `limit`.
    pub fn default_limit(self) -> u32 {
        match self {
            Self::Text => DEFAULT_TEXT_LIMIT,
            Self::Radius => DEFAULT_RADIUS_LIMIT,
            Self::BBox => DEFAULT_BBOX_LIMIT,
            Self::Nearby => DEFAULT_NEARBY_LIMIT,
        }
    }

    /// Reads the discriminator from a raw payload; absence means [`Variant::Text`].
    ///
    /// # Errors
    /// - `ValidationError` - `_variant` is not a string or names no known variant
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ValidationError> {
        match payload.get(VARIANT_FIELD) {
            None | Some(Value::Null) => Ok(Self::Text),
            Some(Value::String(name)) => name
                .parse()
                .map_err(|reason: String| ValidationError::invalid_value(VARIANT_FIELD, reason)),
            Some(_) => Err(ValidationError::invalid_type(VARIANT_FIELD, "a string")),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "radius" => Ok(Self::Radius),
            "bbox" => Ok(Self::BBox),
            "nearby" => Ok(Self::Nearby),
            _ => Err(format!(
                "unknown variant '{s}', expected one of: text, radius, bbox, nearby"
            )),
        }
    }
}

/// Shape of the response handed back to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputMode {
    /// Tabular rows for list views
    #[default]
    List,
    /// Minimal map-marker projection
    Pins,
    /// GeoJSON `FeatureCollection`
    GeoJson,
}

impl OutputMode {
    /// Wire name of the output mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Pins => "pins",
            Self::GeoJson => "geojson",
        }
    }

    /// Reads `_output` from a raw payload; absence means [`OutputMode::List`].
    ///
    /// # Errors
    /// - `ValidationError` - `_output` is not a string or names no known mode
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ValidationError> {
        match payload.get(OUTPUT_FIELD) {
            None | Some(Value::Null) => Ok(Self::List),
            Some(Value::String(name)) => name
                .parse()
                .map_err(|reason: String| ValidationError::invalid_value(OUTPUT_FIELD, reason)),
            Some(_) => Err(ValidationError::invalid_type(OUTPUT_FIELD, "a string")),
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "list" => Ok(Self::List),
            "pins" | "map" => Ok(Self::Pins),
            "geojson" => Ok(Self::GeoJson),
            _ => Err(format!(
                "unknown output '{s}', expected one of: list, pins, geojson"
            )),
        }
    }
}

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude in [-180, 180]
    pub lng: f64,
    /// Latitude in [-90, 90]
    pub lat: f64,
}

/// Axis-aligned longitude/latitude box. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western edge
    pub min_lng: f64,
    /// Southern edge
    pub min_lat: f64,
    /// Eastern edge, never less than `min_lng`
    pub max_lng: f64,
    /// Northern edge, never less than `min_lat`
    pub max_lat: f64,
}

impl BoundingBox {
    /// Whether the position lies inside the box or on its edge.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        (self.min_lng..=self.max_lng).contains(&lng) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}

/// Optional narrowing applied to free-text searches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextFilters {
    /// Exact classification match
    pub belief_type: Option<BeliefType>,
    /// Service languages; lowercased, de-duplicated, in first-seen order
    pub languages: Vec<String>,
    /// Country code or name
    pub country: Option<String>,
    /// Region, state or province
    pub region: Option<String>,
    /// City, town or village
    pub locality: Option<String>,
}

impl TextFilters {
    /// True when no filter narrows the search.
    pub fn is_empty(&self) -> bool {
        self.belief_type.is_none()
            && self.languages.is_empty()
            && self.country.is_none()
            && self.region.is_none()
            && self.locality.is_none()
    }
}

/// Free text plus filters, paginated.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCriteria {
    /// Trimmed search term; `None` browses the whole directory
    pub term: Option<String>,
    /// Narrowing filters
    pub filters: TextFilters,
    /// Result cap
    pub limit: u32,
    /// Rows skipped before the first returned row
    pub offset: u32,
}

/// Churches within a distance of a point.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusCriteria {
    /// Query center
    pub center: GeoPoint,
    /// Search radius in meters, greater than zero
    pub radius_m: f64,
    /// Result cap
    pub limit: u32,
}

/// Churches inside a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct BBoxCriteria {
    /// Box to search, edges inclusive
    pub bounds: BoundingBox,
    /// Result cap
    pub limit: u32,
}

/// Closest churches to a point, regardless of distance.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyCriteria {
    /// Query center
    pub center: GeoPoint,
    /// Result cap
    pub limit: u32,
}

/// Validated selection criteria, one per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCriteria {
    /// Free-text search
    Text(TextCriteria),
    /// Radius lookup
    Radius(RadiusCriteria),
    /// Bounding-box lookup
    BBox(BBoxCriteria),
    /// Nearest-churches lookup
    Nearby(NearbyCriteria),
}

impl SearchCriteria {
    /// Variant these criteria were normalized from.
    pub fn variant(&self) -> Variant {
        match self {
            Self::Text(_) => Variant::Text,
            Self::Radius(_) => Variant::Radius,
            Self::BBox(_) => Variant::BBox,
            Self::Nearby(_) => Variant::Nearby,
        }
    }

    /// Result cap forwarded to the backend.
    pub fn limit(&self) -> u32 {
        match self {
            Self::Text(text) => text.limit,
            Self::Radius(radius) => radius.limit,
            Self::BBox(bbox) => bbox.limit,
            Self::Nearby(nearby) => nearby.limit,
        }
    }

    /// Whether rows carry a distance from a query center.
    pub fn is_distance_bearing(&self) -> bool {
        matches!(self, Self::Radius(_) | Self::Nearby(_))
    }
}

/// A fully validated, request-scoped search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// What to select
    pub criteria: SearchCriteria,
    /// How to shape the rows
    pub output: OutputMode,
}

impl SearchQuery {
    /// Pairs criteria with an output shape.
    pub fn new(criteria: SearchCriteria, output: OutputMode) -> Self {
        Self { criteria, output }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_variant_defaults_to_text() {
        assert_eq!(Variant::from_payload(&payload(json!({}))).unwrap(), Variant::Text);
        assert_eq!(
            Variant::from_payload(&payload(json!({"_variant": null}))).unwrap(),
            Variant::Text
        );
        assert_eq!(
            Variant::from_payload(&payload(json!({"_variant": "BBOX"}))).unwrap(),
            Variant::BBox
        );
    }

    #[test]
    fn test_unknown_variant_names_the_discriminator() {
        let error = Variant::from_payload(&payload(json!({"_variant": "polygon"}))).unwrap_err();
        assert_eq!(error.field, VARIANT_FIELD);

        let error = Variant::from_payload(&payload(json!({"_variant": 3}))).unwrap_err();
        assert_eq!(error.field, VARIANT_FIELD);
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!(OutputMode::from_payload(&payload(json!({}))).unwrap(), OutputMode::List);
        assert_eq!(
            OutputMode::from_payload(&payload(json!({"_output": "geojson"}))).unwrap(),
            OutputMode::GeoJson
        );
        assert!(OutputMode::from_payload(&payload(json!({"_output": "csv"}))).is_err());
    }

    #[test]
    fn test_default_limits_per_variant() {
        assert_eq!(Variant::Text.default_limit(), 1000);
        assert_eq!(Variant::Radius.default_limit(), 200);
        assert_eq!(Variant::BBox.default_limit(), 500);
        assert_eq!(Variant::Nearby.default_limit(), 50);
    }

    #[test]
    fn test_bounding_box_edges_are_inclusive() {
        let bounds = BoundingBox {
            min_lng: -10.0,
            min_lat: 40.0,
            max_lng: 5.0,
            max_lat: 50.0,
        };
        assert!(bounds.contains(-10.0, 50.0));
        assert!(bounds.contains(0.0, 45.0));
        assert!(!bounds.contains(5.1, 45.0));
    }
}
