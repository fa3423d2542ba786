//! Routes validated criteria to exactly one backend operation.

use std::sync::Arc;

use steeple_core::{ChurchRecord, SearchCriteria};
use tracing::{debug, error};

use crate::backend::{BackendCall, SearchBackend};
use crate::errors::BackendError;

/// Issues one backend call per query and hands back the rows untouched.
///
/// There is no caching and no retry: a failure is returned to the caller
/// as-is so latency stays predictable while the backend is degraded.
#[derive(Debug, Clone)]
pub struct VariantDispatcher {
    backend: Arc<dyn SearchBackend>,
}

impl VariantDispatcher {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Runs the backend call matching `criteria`.
    ///
    /// Zero rows is a valid, successful result.
    ///
    /// # Errors
    /// - `BackendError` - The single backend call failed
    pub async fn dispatch(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<ChurchRecord>, BackendError> {
        let call = BackendCall::for_criteria(criteria);
        let operation = call.operation();
        debug!(
            backend = self.backend.name(),
            %operation,
            limit = criteria.limit(),
            "Dispatching search"
        );

        let result = match call {
            BackendCall::Search(ref params) => self.backend.search(params).await,
            BackendCall::WithinRadius(ref params) => self.backend.within_radius(params).await,
            BackendCall::InBBox(ref params) => self.backend.in_bbox(params).await,
            BackendCall::Nearby(ref params) => self.backend.nearby(params).await,
        };

        match result {
            Ok(rows) => {
                debug!(%operation, rows = rows.len(), "Search completed");
                Ok(rows)
            }
            Err(e) => {
                error!(%operation, error = %e, "Search backend call failed");
                Err(e)
            }
        }
    }

    /// Looks up a single church by identifier.
    ///
    /// # Errors
    /// - `BackendError` - The lookup call failed
    pub async fn fetch(&self, id: &str) -> Result<Option<ChurchRecord>, BackendError> {
        debug!(backend = self.backend.name(), id, "Fetching church");
        self.backend.fetch_church(id).await.inspect_err(|e| {
            error!(id, error = %e, "Church lookup failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use steeple_core::{OutputMode, QueryNormalizer};

    use super::*;
    use crate::backend::{RecordedCall, RecordingBackend};
    use crate::errors::BackendError;

    fn criteria(body: serde_json::Value) -> SearchCriteria {
        QueryNormalizer::default()
            .normalize_request(body.as_object().unwrap(), Some(OutputMode::List))
            .unwrap()
            .criteria
    }

    #[tokio::test]
    async fn test_one_call_per_dispatch() {
        let backend = RecordingBackend::returning(Vec::new());
        let dispatcher = VariantDispatcher::new(Arc::new(backend.clone()));

        let rows = dispatcher
            .dispatch(&criteria(json!({"_variant": "radius", "lng": 2.35, "lat": 48.85, "radius_m": 800})))
            .await
            .unwrap();

        assert!(rows.is_empty());
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        let RecordedCall::Dispatch(BackendCall::WithinRadius(ref params)) = calls[0] else {
            panic!("expected a radius call, got {:?}", calls[0]);
        };
        assert_eq!(params.radius_m, 800.0);
        assert_eq!(params.lim, 200);
    }

    #[tokio::test]
    async fn test_backend_failure_is_not_retried() {
        let backend = RecordingBackend::failing("connection reset");
        let dispatcher = VariantDispatcher::new(Arc::new(backend.clone()));

        let error = dispatcher.dispatch(&criteria(json!({"q": "abbey"}))).await.unwrap_err();

        assert!(matches!(error, BackendError::Rejected { .. }));
        assert_eq!(backend.call_count(), 1);
    }
}
