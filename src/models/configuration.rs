//! Export configuration aggregate
//!
//! The aggregate itself is a plain value; the invariants tying filters and
//! selected fields to the join tree are enforced by
//! [`ExportConfigurationStore`](crate::store::ExportConfigurationStore).

use super::filter::CollectionFilter;
use super::join::JoinConfiguration;
use serde::{Deserialize, Serialize};

/// Output file format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xlsx,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Output options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Drop `_id` fields from the output
    pub exclude_ids: bool,
    /// Flatten nested documents into dotted columns
    pub flatten_nested: bool,
    pub include_timestamps: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            exclude_ids: false,
            flatten_nested: true,
            include_timestamps: true,
        }
    }
}

/// A field chosen for output, tagged with the collection it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedField {
    pub collection: String,
    pub field: String,
}

impl SelectedField {
    pub fn new(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
        }
    }
}

/// The in-progress definition of one export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExportConfiguration {
    #[serde(default)]
    pub main_collection: String,
    #[serde(default)]
    pub joins: Vec<JoinConfiguration>,
    #[serde(default)]
    pub filters: Vec<CollectionFilter>,
    #[serde(default)]
    pub selected_fields: Vec<SelectedField>,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default)]
    pub options: ExportOptions,
}

impl ExportConfiguration {
    /// Collections that filters and fields may reference: the main
    /// collection followed by every join target, in join order.
    pub fn collection_keys(&self) -> Vec<&str> {
        if self.main_collection.is_empty() {
            return Vec::new();
        }
        std::iter::once(self.main_collection.as_str())
            .chain(self.joins.iter().map(|j| j.target_collection.as_str()))
            .collect()
    }

    pub fn contains_collection(&self, collection: &str) -> bool {
        !collection.is_empty()
            && (self.main_collection == collection
                || self.joins.iter().any(|j| j.target_collection == collection))
    }

    /// Selected field paths for one collection, in selection order
    pub fn fields_for(&self, collection: &str) -> Vec<String> {
        self.selected_fields
            .iter()
            .filter(|f| f.collection == collection)
            .map(|f| f.field.clone())
            .collect()
    }

    pub fn filters_for<'a>(&'a self, collection: &'a str) -> impl Iterator<Item = &'a CollectionFilter> + 'a {
        self.filters.iter().filter(move |f| f.collection == collection)
    }

    pub fn join_by_target(&self, collection: &str) -> Option<&JoinConfiguration> {
        self.joins.iter().find(|j| j.target_collection == collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_parse() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("Excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_collection_keys_empty_without_main() {
        let config = ExportConfiguration::default();
        assert!(config.collection_keys().is_empty());
        assert!(!config.contains_collection(""));
    }

    #[test]
    fn test_collection_keys_follow_join_order() {
        let config = ExportConfiguration {
            main_collection: "students".to_string(),
            joins: vec![
                JoinConfiguration::new("students", "classes", "class_id", "_id"),
                JoinConfiguration::new("classes", "teachers", "teacher_id", "_id"),
            ],
            ..Default::default()
        };
        assert_eq!(config.collection_keys(), vec!["students", "classes", "teachers"]);
        assert!(config.contains_collection("teachers"));
        assert!(!config.contains_collection("exams"));
    }

    #[test]
    fn test_options_partial_deserialization() {
        let options: ExportOptions = serde_json::from_str(r#"{"exclude_ids": true}"#).unwrap();
        assert!(options.exclude_ids);
        assert!(options.flatten_nested);
    }
}
