//! Result shaping for list, map-pin and GeoJSON consumers.
//!
//! Backend order is preserved in every mode; nothing is re-sorted here.

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde::Serialize;
use steeple_core::{BeliefType, ChurchRecord, OutputMode, SearchCriteria};

/// Minimal map-marker projection of a church.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurchPin {
    pub id: String,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub belief_type: Option<BeliefType>,
    pub service_languages: Vec<String>,
}

impl ChurchPin {
    /// Pin for a record, or `None` when either coordinate is missing.
    pub fn from_record(record: ChurchRecord) -> Option<Self> {
        let (longitude, latitude) = record.coordinates()?;
        Some(Self {
            id: record.id,
            name: record.name,
            longitude,
            latitude,
            locality: record.locality,
            region: record.region,
            country: record.country,
            website: record.website,
            belief_type: record.belief_type,
            service_languages: record.service_languages,
        })
    }
}

/// Row envelope used by list and pin responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage<T> {
    pub results: Vec<T>,
    pub count: usize,
}

impl<T> ResultPage<T> {
    fn new(results: Vec<T>) -> Self {
        let count = results.len();
        Self { results, count }
    }
}

/// Shaped search output, serialized without a variant tag.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ShapedResults {
    List(ResultPage<ChurchRecord>),
    Pins(ResultPage<ChurchPin>),
    GeoJson(FeatureCollection),
}

impl ShapedResults {
    /// Number of rows, pins or features.
    pub fn len(&self) -> usize {
        match self {
            Self::List(page) => page.count,
            Self::Pins(page) => page.count,
            Self::GeoJson(collection) => collection.features.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts backend rows into the shape requested by `output`.
///
/// Distances survive only for distance-bearing criteria (radius, nearby).
/// Pin and GeoJSON output drop records lacking either coordinate.
pub fn shape(
    rows: Vec<ChurchRecord>,
    criteria: &SearchCriteria,
    output: OutputMode,
) -> ShapedResults {
    let keep_distance = criteria.is_distance_bearing();
    let rows = rows.into_iter().map(|mut record| {
        if !keep_distance {
            record.distance_m = None;
        }
        record
    });

    match output {
        OutputMode::List => ShapedResults::List(ResultPage::new(rows.collect())),
        OutputMode::Pins => {
            ShapedResults::Pins(ResultPage::new(rows.filter_map(ChurchPin::from_record).collect()))
        }
        OutputMode::GeoJson => ShapedResults::GeoJson(FeatureCollection {
            bbox: None,
            features: rows.filter_map(feature).collect(),
            foreign_members: None,
        }),
    }
}

/// Point feature with `[longitude, latitude]` geometry; `None` without coordinates.
fn feature(record: ChurchRecord) -> Option<Feature> {
    let (lng, lat) = record.coordinates()?;
    let id = record.id.clone();

    let mut properties = match serde_json::to_value(&record) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => JsonObject::new(),
    };
    properties.remove("longitude");
    properties.remove("latitude");

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::Point(vec![lng, lat]))),
        id: Some(Id::String(id)),
        properties: Some(properties),
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use steeple_core::{GeoPoint, RadiusCriteria, TextCriteria, TextFilters};

    use super::*;

    fn record(id: &str, coordinates: Option<(f64, f64)>, distance: Option<f64>) -> ChurchRecord {
        ChurchRecord {
            id: id.to_string(),
            name: format!("Church {id}"),
            longitude: coordinates.map(|c| c.0),
            latitude: coordinates.map(|c| c.1),
            locality: Some("San Francisco".to_string()),
            region: None,
            country: Some("US".to_string()),
            website: None,
            belief_type: Some(BeliefType::Protestant),
            service_languages: vec!["en".to_string()],
            distance_m: distance,
        }
    }

    fn text_criteria() -> SearchCriteria {
        SearchCriteria::Text(TextCriteria {
            term: None,
            filters: TextFilters::default(),
            limit: 1000,
            offset: 0,
        })
    }

    fn radius_criteria() -> SearchCriteria {
        SearchCriteria::Radius(RadiusCriteria {
            center: GeoPoint {
                lng: -122.4,
                lat: 37.8,
            },
            radius_m: 1000.0,
            limit: 200,
        })
    }

    #[test]
    fn test_geojson_axis_order_is_lng_lat() {
        let shaped = shape(
            vec![record("1", Some((-122.4, 37.8)), None)],
            &text_criteria(),
            OutputMode::GeoJson,
        );
        let json = serde_json::to_value(&shaped).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(
            json["features"][0]["geometry"],
            json!({"type": "Point", "coordinates": [-122.4, 37.8]})
        );
        assert_eq!(json["features"][0]["id"], "1");
        let properties = &json["features"][0]["properties"];
        assert_eq!(properties["name"], "Church 1");
        assert!(properties.get("longitude").is_none());
        assert!(properties.get("latitude").is_none());
    }

    #[test]
    fn test_map_outputs_exclude_partial_coordinates() {
        let rows = vec![
            record("1", Some((1.0, 2.0)), None),
            ChurchRecord {
                latitude: None,
                ..record("2", Some((3.0, 4.0)), None)
            },
            record("3", None, None),
        ];

        let ShapedResults::Pins(pins) = shape(rows.clone(), &text_criteria(), OutputMode::Pins)
        else {
            panic!("expected pins");
        };
        assert_eq!(pins.count, 1);
        assert_eq!(pins.results[0].id, "1");

        let ShapedResults::GeoJson(collection) =
            shape(rows.clone(), &text_criteria(), OutputMode::GeoJson)
        else {
            panic!("expected geojson");
        };
        assert_eq!(collection.features.len(), 1);
        assert!(collection.features.iter().all(|f| f.geometry.is_some()));

        let ShapedResults::List(list) = shape(rows, &text_criteria(), OutputMode::List) else {
            panic!("expected list");
        };
        assert_eq!(list.count, 3);
    }

    #[test]
    fn test_distance_only_for_distance_bearing_criteria() {
        let rows = vec![record("1", Some((1.0, 2.0)), Some(12.5))];

        let json = serde_json::to_value(shape(rows.clone(), &text_criteria(), OutputMode::List))
            .unwrap();
        assert!(json["results"][0].get("distance_m").is_none());

        let json = serde_json::to_value(shape(rows, &radius_criteria(), OutputMode::List)).unwrap();
        assert_eq!(json["results"][0]["distance_m"], 12.5);
    }

    #[test]
    fn test_backend_order_preserved() {
        let rows = vec![
            record("b", Some((0.0, 0.0)), Some(30.0)),
            record("a", Some((0.0, 0.0)), Some(10.0)),
        ];
        let ShapedResults::List(list) = shape(rows, &radius_criteria(), OutputMode::List) else {
            panic!("expected list");
        };
        let ids: Vec<&str> = list.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_empty_rows_give_empty_collections() {
        let shaped = shape(Vec::new(), &text_criteria(), OutputMode::GeoJson);
        assert!(shaped.is_empty());
        let json = serde_json::to_value(&shaped).unwrap();
        assert_eq!(json["features"], json!([]));

        let json = serde_json::to_value(shape(Vec::new(), &text_criteria(), OutputMode::List))
            .unwrap();
        assert_eq!(json, json!({"results": [], "count": 0}));
    }
}
