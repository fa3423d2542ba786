//! PostgREST backend for production use.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use steeple_core::{BackendConfig, ChurchRecord};
use url::Url;

use super::{
    BBoxParams, BackendOperation, NearbyParams, RadiusParams, SearchBackend, TextSearchParams,
};
use crate::errors::BackendError;

/// Longest slice of an error body kept for logs.
const MAX_ERROR_BODY: usize = 512;

/// Error object PostgREST sends in place of rows.
#[derive(Debug, Deserialize)]
struct ReportedError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Remote data backend reached through PostgREST remote procedure calls.
///
/// Each operation is a single `POST /rest/v1/rpc/<name>` with a JSON argument
/// object. Timeouts come from the HTTP client configuration; nothing here
/// retries.
#[derive(Debug, Clone)]
pub struct PostgrestBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl PostgrestBackend {
    /// Builds the HTTP client from backend configuration.
    ///
    /// # Errors
    /// - `BackendError::Configuration` - Invalid base URL, API key or client settings
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut base_url =
            Url::parse(&config.base_url).map_err(|e| BackendError::Configuration {
                reason: format!("invalid backend URL '{}': {e}", config.base_url),
            })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(ref key) = config.api_key {
            let invalid = |_| BackendError::Configuration {
                reason: "API key contains characters not allowed in headers".to_string(),
            };
            headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid)?);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Configuration {
                reason: format!("HTTP client could not be built: {e}"),
            })?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Configuration {
                reason: format!("invalid endpoint '{path}': {e}"),
            })
    }

    async fn rpc<P: Serialize + Sync>(
        &self,
        operation: BackendOperation,
        params: &P,
    ) -> Result<Vec<ChurchRecord>, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{}", operation.remote_name()))?;

        let response = self
            .client
            .post(url)
            .json(params)
            .send()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        Self::decode_rows(operation, response).await
    }

    async fn decode_rows(
        operation: BackendOperation,
        response: reqwest::Response,
    ) -> Result<Vec<ChurchRecord>, BackendError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        if !status.is_success() {
            return Err(BackendError::Status {
                operation,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect(),
            });
        }

        Self::decode_body(operation, &body)
    }

    /// Rows from a success body. An error object in place of rows is
    /// `Rejected`; anything else that does not decode is `Malformed`.
    fn decode_body(
        operation: BackendOperation,
        body: &[u8],
    ) -> Result<Vec<ChurchRecord>, BackendError> {
        serde_json::from_slice(body).map_err(|source| {
            match serde_json::from_slice::<ReportedError>(body) {
                Ok(reported) => BackendError::Rejected {
                    operation,
                    reason: match reported.code {
                        Some(code) => format!("{code}: {}", reported.message),
                        None => reported.message,
                    },
                },
                Err(_) => BackendError::Malformed { operation, source },
            }
        })
    }
}

#[async_trait]
impl SearchBackend for PostgrestBackend {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    async fn search(&self, params: &TextSearchParams) -> Result<Vec<ChurchRecord>, BackendError> {
        self.rpc(BackendOperation::Search, params).await
    }

    async fn within_radius(
        &self,
        params: &RadiusParams,
    ) -> Result<Vec<ChurchRecord>, BackendError> {
        self.rpc(BackendOperation::WithinRadius, params).await
    }

    async fn in_bbox(&self, params: &BBoxParams) -> Result<Vec<ChurchRecord>, BackendError> {
        self.rpc(BackendOperation::InBBox, params).await
    }

    async fn nearby(&self, params: &NearbyParams) -> Result<Vec<ChurchRecord>, BackendError> {
        self.rpc(BackendOperation::Nearby, params).await
    }

    async fn fetch_church(&self, id: &str) -> Result<Option<ChurchRecord>, BackendError> {
        let operation = BackendOperation::FetchChurch;
        let url = self.endpoint(&format!("rest/v1/{}", operation.remote_name()))?;

        let response = self
            .client
            .get(url)
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
            .send()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        let rows = Self::decode_rows(operation, response).await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> BackendConfig {
        BackendConfig {
            base_url: base_url.to_string(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let backend = PostgrestBackend::new(&config("https://db.example.org/gateway")).unwrap();
        let url = backend.endpoint("rest/v1/rpc/churches_in_bbox").unwrap();
        assert_eq!(
            url.as_str(),
            "https://db.example.org/gateway/rest/v1/rpc/churches_in_bbox"
        );
    }

    #[test]
    fn test_decode_body() {
        let rows = PostgrestBackend::decode_body(
            BackendOperation::Search,
            br#"[{"id": 3, "name": "Mission Dolores Basilica"}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "3");

        let error = PostgrestBackend::decode_body(
            BackendOperation::WithinRadius,
            br#"{"code": "P0001", "message": "radius too large", "details": null}"#,
        )
        .unwrap_err();
        match error {
            BackendError::Rejected { operation, reason } => {
                assert_eq!(operation, BackendOperation::WithinRadius);
                assert_eq!(reason, "P0001: radius too large");
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        assert!(matches!(
            PostgrestBackend::decode_body(BackendOperation::InBBox, b"<html></html>"),
            Err(BackendError::Malformed { .. })
        ));
    }

    #[test]
    fn test_invalid_configuration_is_reported() {
        assert!(matches!(
            PostgrestBackend::new(&config("not a url")),
            Err(BackendError::Configuration { .. })
        ));

        let mut bad_key = config("http://localhost:54321");
        bad_key.api_key = Some("line\nbreak".to_string());
        assert!(matches!(
            PostgrestBackend::new(&bad_key),
            Err(BackendError::Configuration { .. })
        ));
    }
}
