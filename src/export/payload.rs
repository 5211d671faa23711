//! Backend execution payload
//!
//! The JSON shape of these types is the contract with the export backend;
//! field names must not change.

use crate::models::{ExportFormat, FilterCondition, FilterOperator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level request body for `validate` and `execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendExportPayload {
    pub config: QueryConfig,
    pub format: ExportFormat,
    pub filename: String,
    pub async_export: bool,
    pub explain: bool,
    pub dry_run: bool,
    pub formatting: FormattingOptions,
}

/// Query executed against the main collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub main_collection: String,
    pub fields: Vec<String>,
    pub exclude_fields: Vec<String>,
    pub filters: Vec<PayloadCondition>,
    pub joins: Vec<JoinDescriptor>,
    pub group_by: Vec<String>,
    pub having: Vec<PayloadCondition>,
    pub sort: BTreeMap<String, i32>,
    /// 0 means unbounded
    pub limit: u64,
    pub skip: u64,
    pub allow_disk_use: bool,
}

impl QueryConfig {
    /// Unbounded query over `main_collection` with nothing selected yet
    pub fn new(main_collection: impl Into<String>) -> Self {
        Self {
            main_collection: main_collection.into(),
            fields: Vec::new(),
            exclude_fields: Vec::new(),
            filters: Vec::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            sort: BTreeMap::new(),
            limit: 0,
            skip: 0,
            allow_disk_use: true,
        }
    }
}

/// One lookup stage with its own field list and filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinDescriptor {
    pub collection: String,
    pub local_field: String,
    pub foreign_field: String,
    pub alias: String,
    pub fields: Vec<String>,
    pub exclude_fields: Vec<String>,
    pub filters: Vec<PayloadCondition>,
    pub joins: Vec<JoinDescriptor>,
    pub preserve_null_and_empty_arrays: bool,
    pub limit: u64,
}

impl JoinDescriptor {
    /// Left-outer lookup aliased by the target collection name
    pub fn new(
        collection: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        let collection = collection.into();
        Self {
            alias: collection.clone(),
            collection,
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            fields: Vec::new(),
            exclude_fields: Vec::new(),
            filters: Vec::new(),
            joins: Vec::new(),
            preserve_null_and_empty_arrays: true,
            limit: 0,
        }
    }
}

/// A filter condition as the backend expects it (no client id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
    pub options: String,
}

impl From<&FilterCondition> for PayloadCondition {
    fn from(condition: &FilterCondition) -> Self {
        Self {
            field: condition.field.clone(),
            operator: condition.operator,
            value: condition.value.clone(),
            options: condition.options.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingOptions {
    pub exclude_ids: bool,
    pub flatten_nested: bool,
    pub use_aliases: bool,
    pub include_empty_fields: bool,
}
