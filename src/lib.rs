//! Export Config SDK - building cross-collection data exports
//!
//! Provides:
//! - Relationship catalog and field suggestion access
//! - Filter and join builders (network-free, driven by request tickets)
//! - The export configuration store and its invariants
//! - Pre-submit validation and the backend payload transformer
//! - An async export session over any [`ExportBackend`]

pub mod api;
pub mod auth;
pub mod builder;
pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod export;
pub mod models;
pub mod session;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use api::{ExportApiError, ExportBackend};
#[cfg(feature = "api-backend")]
pub use api::HttpExportBackend;
pub use auth::RequestContext;
pub use builder::{FilterConditionBuilder, JoinConfigurationBuilder, JoinStep, ValidationError};
pub use catalog::{FieldSuggestions, RelationshipCatalog};
pub use config::{ClientConfig, ConfigError};
pub use export::{transform, BackendExportPayload};
pub use session::{ExportSession, SessionError, SubmissionReport};
pub use store::{ExportConfigurationStore, StoreError};
pub use validation::{validate_configuration, ConfigurationValidationResult};

// Re-export models
pub use models::{
    CollectionFilter, CollectionRelationship, ExportConfiguration, ExportFormat, ExportOptions,
    FieldInfo, FilterCondition, FilterLogic, FilterOperator, JoinConfiguration, JoinMethod,
    PossibleJoin, SelectedField,
};
