//! Pre-submit validation of an export configuration
//!
//! Checks a whole [`ExportConfiguration`] before it is transformed and sent
//! to the backend. Errors make the export unusable; warnings describe
//! behaviour the user may not expect (e.g. nested joins being flattened).

use super::joins::JoinTree;
use crate::models::{ExportConfiguration, FilterLogic};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// A problem that prevents the export from running
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationIssue {
    #[error("no main collection selected")]
    MissingMainCollection,

    #[error("join to '{target}' starts from '{source_collection}', which is not part of the export")]
    DanglingJoinSource {
        join_id: Uuid,
        source_collection: String,
        target: String,
    },

    #[error("collection '{target}' is joined more than once")]
    DuplicateJoinTarget { target: String },

    #[error("joins form a cycle between {}", .collections.join(", "))]
    JoinCycle { collections: Vec<String> },

    #[error("join to '{target}' is missing its local or foreign field")]
    IncompleteJoin { target: String },

    #[error("filter targets '{collection}', which is not part of the export")]
    UnknownFilterCollection { filter_id: Uuid, collection: String },

    #[error("filter on '{collection}' has no conditions")]
    EmptyFilter { filter_id: Uuid, collection: String },

    #[error("filter on '{collection}' has an incomplete condition at position {}", .index + 1)]
    IncompleteCondition {
        filter_id: Uuid,
        collection: String,
        index: usize,
    },

    #[error("field '{field}' is selected from '{collection}', which is not part of the export")]
    UnknownFieldCollection { collection: String, field: String },
}

/// Behaviour worth pointing out before the export runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationWarning {
    /// Without selected fields the backend exports every field
    NoMainFields,
    JoinWithoutFields { target: String },
    /// `or` logic is dropped when conditions are flattened into the payload
    OrLogicFlattened { collection: String },
    /// Joins below the first level are emitted at the top level
    NestedJoinFlattened { target: String, depth: usize },
}

impl fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationWarning::NoMainFields => {
                write!(f, "no fields selected on the main collection; all fields will be exported")
            }
            ConfigurationWarning::JoinWithoutFields { target } => {
                write!(f, "no fields selected on joined collection '{}'", target)
            }
            ConfigurationWarning::OrLogicFlattened { collection } => write!(
                f,
                "'or' logic on '{}' is not applied; its conditions are combined with 'and'",
                collection
            ),
            ConfigurationWarning::NestedJoinFlattened { target, depth } => write!(
                f,
                "join to '{}' is {} levels deep and will be sent as a first-level join",
                target, depth
            ),
        }
    }
}

/// Outcome of [`validate_configuration`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationValidationResult {
    pub errors: Vec<ConfigurationIssue>,
    pub warnings: Vec<ConfigurationWarning>,
}

impl ConfigurationValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Validate a configuration as a whole
pub fn validate_configuration(config: &ExportConfiguration) -> ConfigurationValidationResult {
    let mut result = ConfigurationValidationResult::default();

    if config.main_collection.is_empty() {
        result.errors.push(ConfigurationIssue::MissingMainCollection);
    }

    validate_joins(config, &mut result);
    validate_filters(config, &mut result);

    for selected in &config.selected_fields {
        if !config.contains_collection(&selected.collection) {
            result.errors.push(ConfigurationIssue::UnknownFieldCollection {
                collection: selected.collection.clone(),
                field: selected.field.clone(),
            });
        }
    }

    if !config.main_collection.is_empty() && config.fields_for(&config.main_collection).is_empty() {
        result.warnings.push(ConfigurationWarning::NoMainFields);
    }

    debug!(
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "Validated export configuration"
    );
    result
}

fn validate_joins(config: &ExportConfiguration, result: &mut ConfigurationValidationResult) {
    let tree = JoinTree::build(&config.main_collection, &config.joins);
    let mut seen: HashSet<&str> = HashSet::from([config.main_collection.as_str()]);

    for join in &config.joins {
        if !seen.insert(join.target_collection.as_str()) {
            result.errors.push(ConfigurationIssue::DuplicateJoinTarget {
                target: join.target_collection.clone(),
            });
        }
        if join.local_field.is_empty() || join.foreign_field.is_empty() {
            result.errors.push(ConfigurationIssue::IncompleteJoin {
                target: join.target_collection.clone(),
            });
        }

        match tree.depth(&join.source_collection) {
            None => result.errors.push(ConfigurationIssue::DanglingJoinSource {
                join_id: join.id,
                source_collection: join.source_collection.clone(),
                target: join.target_collection.clone(),
            }),
            Some(depth) if depth >= 1 => {
                result.warnings.push(ConfigurationWarning::NestedJoinFlattened {
                    target: join.target_collection.clone(),
                    depth: depth + 1,
                });
            }
            Some(_) => {}
        }

        if config.fields_for(&join.target_collection).is_empty() {
            result.warnings.push(ConfigurationWarning::JoinWithoutFields {
                target: join.target_collection.clone(),
            });
        }
    }

    for collections in tree.cycles() {
        result.errors.push(ConfigurationIssue::JoinCycle { collections });
    }
}

fn validate_filters(config: &ExportConfiguration, result: &mut ConfigurationValidationResult) {
    let mut flattened: Vec<&str> = Vec::new();

    for filter in &config.filters {
        if !config.contains_collection(&filter.collection) {
            result.errors.push(ConfigurationIssue::UnknownFilterCollection {
                filter_id: filter.id,
                collection: filter.collection.clone(),
            });
        }
        if filter.conditions.is_empty() {
            result.errors.push(ConfigurationIssue::EmptyFilter {
                filter_id: filter.id,
                collection: filter.collection.clone(),
            });
        } else if let Some(index) = filter.first_incomplete() {
            result.errors.push(ConfigurationIssue::IncompleteCondition {
                filter_id: filter.id,
                collection: filter.collection.clone(),
                index,
            });
        }

        if filter.logic == FilterLogic::Or
            && filter.conditions.len() > 1
            && !flattened.contains(&filter.collection.as_str())
        {
            flattened.push(filter.collection.as_str());
            result.warnings.push(ConfigurationWarning::OrLogicFlattened {
                collection: filter.collection.clone(),
            });
        }
    }
}
