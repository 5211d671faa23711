//! HTTP export backend
//!
//! Implements ExportBackend over the export REST API.
//!
//! ## Security
//!
//! Path parameters (collection keys, task ids) are validated before they are
//! placed in a URL. Only alphanumeric characters, hyphens, underscores and
//! periods are allowed, and values may not start with a period.

use super::types::{
    ExecuteResponse, ExportStatus, FieldSuggestionsResponse, RelationshipsResponse,
    ValidationResponse,
};
use super::{ExportApiError, ExportBackend};
use crate::auth::RequestContext;
use crate::config::ClientConfig;
use crate::export::BackendExportPayload;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Maximum allowed length for path parameters
const MAX_PATH_PARAM_LENGTH: usize = 128;

/// Validate a collection key or task id for safe use in API paths.
fn validate_path_param(kind: &str, value: &str) -> Result<(), ExportApiError> {
    if value.is_empty() {
        return Err(ExportApiError::InvalidArgument(format!(
            "{} cannot be empty",
            kind
        )));
    }

    if value.len() > MAX_PATH_PARAM_LENGTH {
        return Err(ExportApiError::InvalidArgument(format!(
            "{} too long (max {} characters)",
            kind, MAX_PATH_PARAM_LENGTH
        )));
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ExportApiError::InvalidArgument(format!(
            "{} contains invalid characters. Only alphanumeric, hyphens, underscores and periods are allowed.",
            kind
        )));
    }

    if value.starts_with('.') {
        return Err(ExportApiError::InvalidArgument(format!(
            "{} cannot start with a period",
            kind
        )));
    }

    Ok(())
}

/// Export backend that talks to the HTTP API
#[derive(Debug, Clone)]
pub struct HttpExportBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpExportBackend {
    /// Create a new HTTP export backend
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the API server (e.g., "https://school.example.com/api/v1")
    ///
    /// # Example
    ///
    /// ```rust
    /// use export_config_sdk::api::HttpExportBackend;
    ///
    /// let backend = HttpExportBackend::new("https://school.example.com/api/v1");
    /// assert_eq!(backend.base_url(), "https://school.example.com/api/v1");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a backend from client configuration, applying the request timeout
    pub fn from_config(config: &ClientConfig) -> Result<Self, ExportApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ExportApiError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with authentication headers
    fn build_request(
        &self,
        method: reqwest::Method,
        path: &str,
        ctx: &RequestContext,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);

        if let Some(header) = ctx.authorization_header() {
            request = request.header("Authorization", header);
        }

        request
    }

    /// Send a request and decode the JSON body
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, ExportApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ExportApiError::NetworkError(format!("Failed to {}: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExportApiError::BackendError {
                status: status.as_u16(),
                message: if message.is_empty() {
                    format!("{} request failed", what)
                } else {
                    message
                },
            });
        }

        response.json::<T>().await.map_err(|e| {
            ExportApiError::SerializationError(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait(?Send)]
impl ExportBackend for HttpExportBackend {
    async fn get_collections_relationships(
        &self,
        ctx: &RequestContext,
    ) -> Result<RelationshipsResponse, ExportApiError> {
        debug!("Loading collection relationships");
        let request = self.build_request(
            reqwest::Method::GET,
            "/export/collections/relationships",
            ctx,
        );
        self.send_json(request, "load collection relationships").await
    }

    async fn get_field_suggestions(
        &self,
        ctx: &RequestContext,
        collection: &str,
    ) -> Result<FieldSuggestionsResponse, ExportApiError> {
        validate_path_param("Collection key", collection)?;

        debug!(collection, "Loading field suggestions");
        let encoded = urlencoding::encode(collection);
        let request = self.build_request(
            reqwest::Method::GET,
            &format!("/export/collections/{}/fields", encoded),
            ctx,
        );
        self.send_json(request, "load field suggestions").await
    }

    async fn validate_configuration(
        &self,
        ctx: &RequestContext,
        payload: &BackendExportPayload,
    ) -> Result<ValidationResponse, ExportApiError> {
        let request = self
            .build_request(reqwest::Method::POST, "/export/validate", ctx)
            .json(payload);
        self.send_json(request, "validate export configuration").await
    }

    async fn execute_export(
        &self,
        ctx: &RequestContext,
        payload: &BackendExportPayload,
    ) -> Result<ExecuteResponse, ExportApiError> {
        let request = self
            .build_request(reqwest::Method::POST, "/export/execute", ctx)
            .json(payload);
        self.send_json(request, "execute export").await
    }

    async fn get_export_status(
        &self,
        ctx: &RequestContext,
        task_id: &str,
    ) -> Result<ExportStatus, ExportApiError> {
        validate_path_param("Task id", task_id)?;

        let encoded = urlencoding::encode(task_id);
        let request = self.build_request(
            reqwest::Method::GET,
            &format!("/export/status/{}", encoded),
            ctx,
        );
        self.send_json(request, "get export status").await
    }
}
