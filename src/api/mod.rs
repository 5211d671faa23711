//! Export backend abstraction
//!
//! Defines the ExportBackend trait the builders' collaborator calls go
//! through, plus the response types of the export REST endpoints:
//! - collection relationship catalog
//! - per-collection field suggestions
//! - configuration validation, export execution and task status
//!
//! HttpExportBackend implements the trait over HTTP (feature `api-backend`).

pub mod types;

#[cfg(feature = "api-backend")]
pub mod http;

pub use types::{
    ExecuteResponse, ExportStatus, FieldSuggestionsResponse, RelationshipsResponse, TaskStatus,
    ValidationResponse,
};

#[cfg(feature = "api-backend")]
pub use http::HttpExportBackend;

use crate::auth::RequestContext;
use crate::export::BackendExportPayload;
use async_trait::async_trait;

/// Error type for backend calls
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportApiError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Backend error ({status}): {message}")]
    BackendError { status: u16, message: String },
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ExportApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ExportApiError::BackendError { status: 401 | 403, .. })
    }
}

/// Trait for the export collaborator
///
/// Every call takes the request context explicitly. Implementations do not
/// retry; a failed call is reported and the user re-triggers the action.
#[async_trait(?Send)]
pub trait ExportBackend {
    /// Load the collection relationship graph
    async fn get_collections_relationships(
        &self,
        ctx: &RequestContext,
    ) -> Result<RelationshipsResponse, ExportApiError>;

    /// Load the fields available on one collection
    async fn get_field_suggestions(
        &self,
        ctx: &RequestContext,
        collection: &str,
    ) -> Result<FieldSuggestionsResponse, ExportApiError>;

    /// Ask the backend to check a payload without running it
    async fn validate_configuration(
        &self,
        ctx: &RequestContext,
        payload: &BackendExportPayload,
    ) -> Result<ValidationResponse, ExportApiError>;

    /// Start an export job
    async fn execute_export(
        &self,
        ctx: &RequestContext,
        payload: &BackendExportPayload,
    ) -> Result<ExecuteResponse, ExportApiError>;

    /// Poll an export job
    async fn get_export_status(
        &self,
        ctx: &RequestContext,
        task_id: &str,
    ) -> Result<ExportStatus, ExportApiError>;
}
