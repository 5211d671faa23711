//! CLI error types

use crate::api::ExportApiError;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::store::StoreError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to parse export configuration: {0}")]
    ParseError(String),

    #[error("Validation failed with {0} error(s)")]
    ValidationFailed(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ExportApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
