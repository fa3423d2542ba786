//! In-memory directory for development and offline use.
//!
//! Honors the same contracts as the remote backend: radius and nearby rows
//! carry their haversine distance and come back closest first, bounding
//! boxes include their edges, and every operation respects its cap.

use std::cmp::Ordering;

use async_trait::async_trait;
use geo::{Distance, Haversine, Point};
use steeple_core::{BeliefType, BoundingBox, ChurchRecord};

use super::{BBoxParams, NearbyParams, RadiusParams, SearchBackend, TextSearchParams};
use crate::errors::BackendError;

/// Backend answering from a fixed set of records.
#[derive(Debug, Clone)]
pub struct DemoBackend {
    records: Vec<ChurchRecord>,
}

impl DemoBackend {
    /// Demo backend seeded with a small worldwide directory.
    pub fn new() -> Self {
        Self::with_records(seed_directory())
    }

    /// Demo backend over caller-supplied records.
    pub fn with_records(records: Vec<ChurchRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ChurchRecord] {
        &self.records
    }

    /// Plottable records with their distance from `center`, closest first.
    fn by_distance(&self, center: Point<f64>) -> Vec<ChurchRecord> {
        let mut rows: Vec<ChurchRecord> = self
            .records
            .iter()
            .filter_map(|record| {
                let (lng, lat) = record.coordinates()?;
                let mut row = record.clone();
                row.distance_m = Some(Haversine.distance(center, Point::new(lng, lat)));
                Some(row)
            })
            .collect();

        rows.sort_by(|a, b| {
            a.distance_m
                .partial_cmp(&b.distance_m)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        rows
    }

    fn matches_text(record: &ChurchRecord, params: &TextSearchParams) -> bool {
        if let Some(ref term) = params.q {
            let term = term.to_lowercase();
            let haystacks = [
                Some(&record.name),
                record.locality.as_ref(),
                record.region.as_ref(),
                record.country.as_ref(),
            ];
            let found = haystacks
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term));
            if !found {
                return false;
            }
        }

        if params.belief_type.is_some() && record.belief_type != params.belief_type {
            return false;
        }

        if let Some(ref languages) = params.languages {
            let offered = languages.iter().any(|wanted| {
                record
                    .service_languages
                    .iter()
                    .any(|language| language.eq_ignore_ascii_case(wanted))
            });
            if !offered {
                return false;
            }
        }

        let same = |filter: &Option<String>, value: &Option<String>| match filter {
            None => true,
            Some(wanted) => value
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(wanted)),
        };

        same(&params.country, &record.country)
            && same(&params.region, &record.region)
            && same(&params.locality, &record.locality)
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for DemoBackend {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn search(&self, params: &TextSearchParams) -> Result<Vec<ChurchRecord>, BackendError> {
        let mut rows: Vec<ChurchRecord> = self
            .records
            .iter()
            .filter(|record| Self::matches_text(record, params))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Ok(rows
            .into_iter()
            .skip(params.off as usize)
            .take(params.lim as usize)
            .collect())
    }

    async fn within_radius(
        &self,
        params: &RadiusParams,
    ) -> Result<Vec<ChurchRecord>, BackendError> {
        Ok(self
            .by_distance(Point::new(params.lng, params.lat))
            .into_iter()
            .take_while(|row| row.distance_m.is_some_and(|d| d <= params.radius_m))
            .take(params.lim as usize)
            .collect())
    }

    async fn in_bbox(&self, params: &BBoxParams) -> Result<Vec<ChurchRecord>, BackendError> {
        let bounds = BoundingBox {
            min_lng: params.min_lng,
            min_lat: params.min_lat,
            max_lng: params.max_lng,
            max_lat: params.max_lat,
        };

        let mut rows: Vec<ChurchRecord> = self
            .records
            .iter()
            .filter(|record| {
                record
                    .coordinates()
                    .is_some_and(|(lng, lat)| bounds.contains(lng, lat))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        rows.truncate(params.lim as usize);
        Ok(rows)
    }

    async fn nearby(&self, params: &NearbyParams) -> Result<Vec<ChurchRecord>, BackendError> {
        let mut rows = self.by_distance(Point::new(params.lng, params.lat));
        rows.truncate(params.lim as usize);
        Ok(rows)
    }

    async fn fetch_church(&self, id: &str) -> Result<Option<ChurchRecord>, BackendError> {
        Ok(self.records.iter().find(|record| record.id == id).cloned())
    }
}

#[allow(clippy::too_many_arguments)]
fn church(
    id: &str,
    name: &str,
    coordinates: Option<(f64, f64)>,
    locality: &str,
    region: &str,
    country: &str,
    belief_type: Option<BeliefType>,
    languages: &[&str],
) -> ChurchRecord {
    ChurchRecord {
        id: id.to_string(),
        name: name.to_string(),
        longitude: coordinates.map(|(lng, _)| lng),
        latitude: coordinates.map(|(_, lat)| lat),
        locality: Some(locality.to_string()),
        region: Some(region.to_string()),
        country: Some(country.to_string()),
        website: None,
        belief_type,
        service_languages: languages.iter().map(|l| l.to_string()).collect(),
        distance_m: None,
    }
}

fn seed_directory() -> Vec<ChurchRecord> {
    let mut records = vec![
        church(
            "1",
            "Grace Cathedral",
            Some((-122.4130, 37.7919)),
            "San Francisco",
            "California",
            "US",
            Some(BeliefType::Anglican),
            &["en"],
        ),
        church(
            "2",
            "Holy Trinity Orthodox Cathedral",
            Some((-122.4245, 37.7983)),
            "San Francisco",
            "California",
            "US",
            Some(BeliefType::Orthodox),
            &["en", "ru"],
        ),
        church(
            "3",
            "Mission Dolores Basilica",
            Some((-122.4271, 37.7643)),
            "San Francisco",
            "California",
            "US",
            Some(BeliefType::RomanCatholic),
            &["en", "es"],
        ),
        church(
            "4",
            "Glide Memorial Church",
            Some((-122.4114, 37.7853)),
            "San Francisco",
            "California",
            "US",
            Some(BeliefType::Protestant),
            &["en"],
        ),
        church(
            "5",
            "St. Sophia Cathedral",
            Some((-0.1922, 51.5128)),
            "London",
            "England",
            "GB",
            Some(BeliefType::Orthodox),
            &["el", "en"],
        ),
        church(
            "6",
            "St Paul's Cathedral",
            Some((-0.0984, 51.5138)),
            "London",
            "England",
            "GB",
            Some(BeliefType::Anglican),
            &["en"],
        ),
        church(
            "7",
            "Metropolitan Cathedral of Athens",
            Some((23.7300, 37.9755)),
            "Athens",
            "Attica",
            "GR",
            Some(BeliefType::Orthodox),
            &["el"],
        ),
        church(
            "8",
            "St. Mary's Chapel",
            None,
            "Cardiff",
            "Wales",
            "GB",
            Some(BeliefType::Other),
            &["cy", "en"],
        ),
    ];
    records[0].website = Some("https://gracecathedral.org".to_string());
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(q: Option<&str>) -> TextSearchParams {
        TextSearchParams {
            q: q.map(str::to_string),
            belief_type: None,
            languages: None,
            country: None,
            region: None,
            locality: None,
            lim: 1000,
            off: 0,
        }
    }

    #[tokio::test]
    async fn test_radius_rows_within_radius_and_sorted() {
        let backend = DemoBackend::new();
        let rows = backend
            .within_radius(&RadiusParams {
                lng: -122.4194,
                lat: 37.7749,
                radius_m: 5_000.0,
                lim: 200,
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 4);
        let distances: Vec<f64> = rows.iter().map(|row| row.distance_m.unwrap()).collect();
        assert!(distances.iter().all(|&d| d <= 5_000.0));
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn test_bbox_contains_only_inside_records() {
        let backend = DemoBackend::new();
        let rows = backend
            .in_bbox(&BBoxParams {
                min_lng: -1.0,
                min_lat: 51.0,
                max_lng: 0.0,
                max_lat: 52.0,
                lim: 500,
            })
            .await
            .unwrap();

        let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["6", "5"]);
    }

    #[tokio::test]
    async fn test_text_search_with_filters_and_paging() {
        let backend = DemoBackend::new();

        let rows = backend.search(&text(Some("cathedral"))).await.unwrap();
        assert_eq!(rows.len(), 5);

        let mut params = text(None);
        params.belief_type = Some(BeliefType::Orthodox);
        params.languages = Some(vec!["en".to_string()]);
        let rows = backend.search(&params).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "5"]);

        let mut params = text(None);
        params.country = Some("gb".to_string());
        params.off = 1;
        params.lim = 1;
        let rows = backend.search(&params).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_nearby_skips_ungeocoded_records() {
        let backend = DemoBackend::new();
        let rows = backend
            .nearby(&NearbyParams {
                lng: -3.18,
                lat: 51.48,
                lim: 50,
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|row| row.id != "8"));
        assert_eq!(rows[0].country.as_deref(), Some("GB"));
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let backend = DemoBackend::new();
        let rows = backend.search(&text(Some("no such church"))).await.unwrap();
        assert!(rows.is_empty());
        assert!(backend.fetch_church("999").await.unwrap().is_none());
    }
}
