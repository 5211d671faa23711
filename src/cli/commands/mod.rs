//! CLI command implementations

pub mod collections;
pub mod execute;
pub mod status;
pub mod transform;
pub mod validate;

use crate::api::HttpExportBackend;
use crate::cli::error::CliError;
use crate::config::ClientConfig;
use crate::models::{ExportConfiguration, ExportFormat};
use crate::session::ExportSession;
use crate::store::ExportConfigurationStore;
use std::io::Read;
use std::path::PathBuf;

/// Load input content from file or stdin
fn load_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::InvalidArgument(format!("Failed to read stdin: {}", e)))?;
        Ok(content)
    } else {
        let path = PathBuf::from(input);
        std::fs::read_to_string(&path).map_err(|e| CliError::FileReadError(path, e.to_string()))
    }
}

/// Parse an export configuration (JSON) and replay it through the store,
/// so files that break the join or filter invariants are rejected early
///
/// A file without a `format` gets `default_format`.
pub fn parse_configuration(
    content: &str,
    default_format: ExportFormat,
) -> Result<ExportConfigurationStore, CliError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| CliError::ParseError(e.to_string()))?;
    let has_format = value.get("format").is_some_and(|f| !f.is_null());
    let mut config: ExportConfiguration =
        serde_json::from_value(value).map_err(|e| CliError::ParseError(e.to_string()))?;
    if !has_format {
        config.format = default_format;
    }
    Ok(ExportConfigurationStore::try_from(config)?)
}

pub fn load_configuration(
    input: &str,
    default_format: ExportFormat,
) -> Result<ExportConfigurationStore, CliError> {
    parse_configuration(&load_input(input)?, default_format)
}

/// Session against the configured HTTP backend
pub fn connect(config: &ClientConfig) -> Result<ExportSession<HttpExportBackend>, CliError> {
    let backend = HttpExportBackend::from_config(config)?;
    Ok(ExportSession::from_config(backend, config))
}

/// Session preloaded with the configuration in `input`
pub fn connect_with(
    config: &ClientConfig,
    input: &str,
) -> Result<ExportSession<HttpExportBackend>, CliError> {
    let store = load_configuration(input, config.default_format)?;
    Ok(connect(config)?.with_configuration(store.into_configuration())?)
}
