//! Response bodies of the export endpoints

use crate::catalog::RelationshipCatalog;
use crate::models::{CollectionRelationship, FieldInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /export/collections/relationships`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RelationshipsResponse {
    #[serde(default)]
    pub relationships: BTreeMap<String, CollectionRelationship>,
}

impl From<RelationshipsResponse> for RelationshipCatalog {
    fn from(response: RelationshipsResponse) -> Self {
        RelationshipCatalog::new(response.relationships)
    }
}

/// `GET /export/collections/{key}/fields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FieldSuggestionsResponse {
    #[serde(default)]
    pub available_fields: Vec<FieldInfo>,
}

/// `POST /export/validate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// `POST /export/execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Lifecycle state of an export task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// `GET /export/status/{task_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStatus {
    pub task_id: String,
    pub status: TaskStatus,
    /// Percentage, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
