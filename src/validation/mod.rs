//! Validation functionality
//!
//! Provides validation logic for:
//! - Join trees (rootedness, cycles, transitive dependents)
//! - Whole export configurations before submission

pub mod configuration;
pub mod joins;

pub use configuration::{
    ConfigurationIssue, ConfigurationValidationResult, ConfigurationWarning, validate_configuration,
};
pub use joins::JoinTree;
