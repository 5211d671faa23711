//! Backend payload export
//!
//! Turns an [`ExportConfiguration`](crate::models::ExportConfiguration) into
//! the nested [`BackendExportPayload`] the export backend executes.

pub mod payload;
pub mod transform;

pub use payload::{BackendExportPayload, FormattingOptions, JoinDescriptor, PayloadCondition, QueryConfig};
pub use transform::{default_filename, transform, transform_at};

/// Error while rendering a payload
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BackendExportPayload {
    /// Pretty-printed JSON request body
    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::SerializationError(e.to_string()))
    }
}
