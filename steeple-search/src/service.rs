//! Church search service
//!
//! Runs the whole pipeline for one request: normalize the payload, dispatch
//! a single backend call, shape the rows. Holds no per-request state, so one
//! instance is shared by every handler.

use std::sync::Arc;

use serde_json::{Map, Value};
use steeple_core::{
    ChurchRecord, OutputMode, QueryLimits, QueryNormalizer, RuntimeMode, SearchQuery,
    SteepleConfig, ValidationError,
};
use tracing::debug;

use crate::backend::{DemoBackend, PostgrestBackend, SearchBackend};
use crate::dispatcher::VariantDispatcher;
use crate::errors::{BackendError, SearchError};
use crate::shaper::{ShapedResults, shape};

/// Search service shared across requests.
#[derive(Debug, Clone)]
pub struct SearchService {
    normalizer: QueryNormalizer,
    dispatcher: VariantDispatcher,
}

impl SearchService {
    /// Creates a service over an explicit backend.
    pub fn new(backend: Arc<dyn SearchBackend>, limits: QueryLimits) -> Self {
        Self {
            normalizer: QueryNormalizer::new(limits),
            dispatcher: VariantDispatcher::new(backend),
        }
    }

    /// Creates a service with the backend matching the configured runtime mode.
    ///
    /// # Errors
    /// - `BackendError::Configuration` - The production backend client could not be built
    pub fn from_config(config: &SteepleConfig) -> Result<Self, BackendError> {
        let backend: Arc<dyn SearchBackend> = match config.mode {
            RuntimeMode::Production => Arc::new(PostgrestBackend::new(&config.backend)?),
            RuntimeMode::Development => Arc::new(DemoBackend::new()),
        };
        Ok(Self::new(backend, config.limits))
    }

    /// Creates a service answering from the seeded demo directory.
    pub fn new_demo() -> Self {
        Self::new(Arc::new(DemoBackend::new()), QueryLimits::default())
    }

    pub fn backend_name(&self) -> &'static str {
        self.dispatcher.backend().name()
    }

    /// Normalizes and runs a raw request body.
    ///
    /// `forced_output` pins the response shape regardless of `_output`.
    ///
    /// # Errors
    /// - `SearchError::Validation` - The payload is malformed; no backend call was made
    /// - `SearchError::Backend` - The backend call failed
    pub async fn search_payload(
        &self,
        payload: &Map<String, Value>,
        forced_output: Option<OutputMode>,
    ) -> Result<ShapedResults, SearchError> {
        let query = self
            .normalizer
            .normalize_request(payload, forced_output)
            .inspect_err(|e| debug!(field = %e.field, kind = %e.kind, "Rejected search payload"))?;
        self.execute(&query).await
    }

    /// Runs an already validated query.
    ///
    /// # Errors
    /// - `SearchError::Backend` - The backend call failed
    pub async fn execute(&self, query: &SearchQuery) -> Result<ShapedResults, SearchError> {
        let rows = self.dispatcher.dispatch(&query.criteria).await?;
        Ok(shape(rows, &query.criteria, query.output))
    }

    /// Looks up one church.
    ///
    /// # Errors
    /// - `SearchError::Validation` - The identifier is blank
    /// - `SearchError::NotFound` - No church has this identifier
    /// - `SearchError::Backend` - The lookup call failed
    pub async fn church(&self, id: &str) -> Result<ChurchRecord, SearchError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::invalid_value("id", "must not be blank").into());
        }

        let mut record = self
            .dispatcher
            .fetch(id)
            .await?
            .ok_or_else(|| SearchError::NotFound { id: id.to_string() })?;
        record.distance_m = None;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::RecordingBackend;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_invalid_payload_makes_no_backend_call() {
        let backend = RecordingBackend::returning(Vec::new());
        let service = SearchService::new(Arc::new(backend.clone()), QueryLimits::default());

        for body in [
            json!({"_variant": "radius", "lng": 0, "lat": 0, "radius_m": -5}),
            json!({"_variant": "bbox", "minLng": 5, "minLat": 0, "maxLng": 1, "maxLat": 1}),
            json!({"_variant": "teleport"}),
        ] {
            let error = service.search_payload(&payload(body), None).await.unwrap_err();
            assert!(matches!(error, SearchError::Validation(_)));
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_demo_radius_search_end_to_end() {
        let service = SearchService::new_demo();
        let shaped = service
            .search_payload(
                &payload(json!({
                    "_variant": "radius",
                    "lng": "-122.4194",
                    "lat": "37.7749",
                    "radius_m": 1500,
                    "_output": "list"
                })),
                None,
            )
            .await
            .unwrap();

        let ShapedResults::List(page) = shaped else {
            panic!("expected list output");
        };
        assert!(page.count > 0);
        assert!(
            page.results
                .iter()
                .all(|row| row.distance_m.is_some_and(|d| d <= 1500.0))
        );
    }

    #[tokio::test]
    async fn test_church_lookup() {
        let service = SearchService::new_demo();

        let record = service.church("5").await.unwrap();
        assert_eq!(record.name, "St. Sophia Cathedral");

        assert!(matches!(
            service.church("404").await,
            Err(SearchError::NotFound { .. })
        ));
        assert!(matches!(
            service.church("  ").await,
            Err(SearchError::Validation(_))
        ));
    }

    #[test]
    fn test_from_config_selects_backend_by_mode() {
        let mut config = SteepleConfig::for_testing();
        assert_eq!(SearchService::from_config(&config).unwrap().backend_name(), "demo");

        config.mode = RuntimeMode::Production;
        assert_eq!(
            SearchService::from_config(&config).unwrap().backend_name(),
            "postgrest"
        );
    }
}
