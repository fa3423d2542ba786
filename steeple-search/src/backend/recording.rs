//! Recording backend for tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use steeple_core::ChurchRecord;

use super::{
    BBoxParams, BackendCall, BackendOperation, NearbyParams, RadiusParams, SearchBackend,
    TextSearchParams,
};
use crate::errors::BackendError;

/// One call observed by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Dispatch(BackendCall),
    Fetch(String),
}

/// Backend returning canned rows (or a canned failure) and recording calls.
///
/// Clones share the same call log, so a test can keep a handle while the
/// service owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    rows: Vec<ChurchRecord>,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingBackend {
    /// Every search operation returns `rows` verbatim, in order.
    pub fn returning(rows: Vec<ChurchRecord>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Every operation fails with [`BackendError::Rejected`].
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn answer(&self, call: BackendCall) -> Result<Vec<ChurchRecord>, BackendError> {
        let operation = call.operation();
        self.calls.lock().push(RecordedCall::Dispatch(call));
        self.outcome(operation).map(|()| self.rows.clone())
    }

    fn outcome(&self, operation: BackendOperation) -> Result<(), BackendError> {
        match self.failure {
            Some(ref reason) => Err(BackendError::Rejected {
                operation,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SearchBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn search(&self, params: &TextSearchParams) -> Result<Vec<ChurchRecord>, BackendError> {
        self.answer(BackendCall::Search(params.clone()))
    }

    async fn within_radius(
        &self,
        params: &RadiusParams,
    ) -> Result<Vec<ChurchRecord>, BackendError> {
        self.answer(BackendCall::WithinRadius(params.clone()))
    }

    async fn in_bbox(&self, params: &BBoxParams) -> Result<Vec<ChurchRecord>, BackendError> {
        self.answer(BackendCall::InBBox(params.clone()))
    }

    async fn nearby(&self, params: &NearbyParams) -> Result<Vec<ChurchRecord>, BackendError> {
        self.answer(BackendCall::Nearby(params.clone()))
    }

    async fn fetch_church(&self, id: &str) -> Result<Option<ChurchRecord>, BackendError> {
        self.calls.lock().push(RecordedCall::Fetch(id.to_string()));
        self.outcome(BackendOperation::FetchChurch)?;
        Ok(self.rows.iter().find(|record| record.id == id).cloned())
    }
}
