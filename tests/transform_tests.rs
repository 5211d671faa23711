//! Tests for the backend payload transformer

use chrono::{TimeZone, Utc};
use export_config_sdk::export::{transform, transform_at};
use export_config_sdk::models::{
    CollectionFilter, ExportConfiguration, ExportFormat, FilterCondition, FilterOperator,
    JoinConfiguration, SelectedField,
};
use export_config_sdk::store::ExportConfigurationStore;
use serde_json::json;

fn students_with_classes() -> ExportConfiguration {
    let mut store = ExportConfigurationStore::new();
    store.set_main_collection("students");
    store
        .add_join(JoinConfiguration::new("students", "classes", "class_id", "_id"))
        .unwrap();
    store
        .add_filter(CollectionFilter::new(
            "classes",
            vec![
                FilterCondition::new("year", FilterOperator::Eq, "2024"),
                FilterCondition::new("room", FilterOperator::Exists, ""),
            ],
        ))
        .unwrap();
    store
        .set_selected_fields("students", ["first_name", "last_name"])
        .unwrap();
    store.set_selected_fields("classes", ["name"]).unwrap();
    store.into_configuration()
}

mod nesting_tests {
    use super::*;

    #[test]
    fn test_join_carries_its_filters_and_fields() {
        let config = students_with_classes();
        let payload = transform(&config);

        let join = &payload.config.joins[0];
        let expected: Vec<(String, FilterOperator, String)> = config.filters[0]
            .conditions
            .iter()
            .map(|c| (c.field.clone(), c.operator, c.value.clone()))
            .collect();
        let actual: Vec<(String, FilterOperator, String)> = join
            .filters
            .iter()
            .map(|c| (c.field.clone(), c.operator, c.value.clone()))
            .collect();
        assert_eq!(actual, expected);
        assert_eq!(join.fields, vec!["name"]);

        assert_eq!(payload.config.fields, vec!["first_name", "last_name"]);
        assert!(payload.config.filters.is_empty());
    }

    #[test]
    fn test_filters_for_same_collection_are_concatenated() {
        let mut config = students_with_classes();
        config.filters.push(CollectionFilter::new(
            "classes",
            vec![FilterCondition::new("teacher", FilterOperator::Ne, "none")],
        ));

        let payload = transform(&config);
        let fields: Vec<&str> = payload.config.joins[0]
            .filters
            .iter()
            .map(|c| c.field.as_str())
            .collect();
        assert_eq!(fields, vec!["year", "room", "teacher"]);
    }

    #[test]
    fn test_join_without_filters_or_fields() {
        let config = ExportConfiguration {
            main_collection: "students".to_string(),
            joins: vec![JoinConfiguration::new("students", "exams", "_id", "student_id")],
            selected_fields: vec![SelectedField::new("students", "email")],
            ..Default::default()
        };
        let payload = transform(&config);
        assert!(payload.config.joins[0].filters.is_empty());
        assert!(payload.config.joins[0].fields.is_empty());
        assert_eq!(payload.config.joins[0].alias, "exams");
    }
}

mod wire_format_tests {
    use super::*;

    #[test]
    fn test_payload_json_shape() {
        let mut config = students_with_classes();
        config.format = ExportFormat::Csv;
        config.filename = Some("class_roster".to_string());
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        let value = serde_json::to_value(transform_at(&config, now)).unwrap();

        assert_eq!(
            value,
            json!({
                "config": {
                    "main_collection": "students",
                    "fields": ["first_name", "last_name"],
                    "exclude_fields": [],
                    "filters": [],
                    "joins": [{
                        "collection": "classes",
                        "local_field": "class_id",
                        "foreign_field": "_id",
                        "alias": "classes",
                        "fields": ["name"],
                        "exclude_fields": [],
                        "filters": [
                            {"field": "year", "operator": "eq", "value": "2024", "options": ""},
                            {"field": "room", "operator": "exists", "value": "", "options": ""}
                        ],
                        "joins": [],
                        "preserve_null_and_empty_arrays": true,
                        "limit": 0
                    }],
                    "group_by": [],
                    "having": [],
                    "sort": {},
                    "limit": 0,
                    "skip": 0,
                    "allow_disk_use": true
                },
                "format": "csv",
                "filename": "class_roster",
                "async_export": false,
                "explain": false,
                "dry_run": false,
                "formatting": {
                    "exclude_ids": false,
                    "flatten_nested": true,
                    "use_aliases": true,
                    "include_empty_fields": true
                }
            })
        );
    }

    #[test]
    fn test_default_filename_uses_timestamp() {
        let config = students_with_classes();
        let payload = transform(&config);
        let millis = payload
            .filename
            .strip_prefix("export_")
            .and_then(|s| s.parse::<i64>().ok());
        assert!(millis.is_some_and(|m| m > 0), "got {}", payload.filename);
    }
}
