//! Client configuration
//!
//! Settings for reaching the export backend and polling export tasks.
//! Values are layered: explicit overrides, then environment
//! (`EXPORT_API_URL`, `EXPORT_API_TOKEN`), then an optional TOML file
//! (feature `config-file`), then defaults.

use crate::auth::RequestContext;
use crate::models::ExportFormat;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "EXPORT_API_URL";
/// Environment variable carrying the auth token
pub const ENV_API_TOKEN: &str = "EXPORT_API_TOKEN";

/// Error while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    ReadError { path: String, message: String },
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Configuration for the export client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API (e.g. "https://school.example.com/api/v1")
    pub api_url: String,
    /// Bearer token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Delay between export status polls
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    /// Format used when a configuration does not set one
    pub default_format: ExportFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api/v1".to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            poll_interval_ms: 1000,
            max_poll_attempts: 120,
            default_format: ExportFormat::Json,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    pub fn with_poll_interval(mut self, millis: u64) -> Self {
        self.poll_interval_ms = millis;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn with_default_format(mut self, format: ExportFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Apply `EXPORT_API_URL` / `EXPORT_API_TOKEN` when set
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.auth_token = Some(token);
        }
        self
    }

    /// Check values that would make every request fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(format!(
                "api_url must start with http:// or https://, got '{}'",
                self.api_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "max_poll_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_context(&self) -> RequestContext {
        RequestContext::from(self.auth_token.clone())
    }

    /// Parse configuration from TOML text
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration from a TOML file
    #[cfg(feature = "config-file")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }
}
