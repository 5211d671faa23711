//! Tests for the export configuration store

use export_config_sdk::models::{
    CollectionFilter, ExportConfiguration, ExportFormat, FilterCondition, FilterOperator,
    JoinConfiguration, SelectedField,
};
use export_config_sdk::store::{ExportConfigurationStore, StoreError};
use uuid::Uuid;

fn condition(field: &str) -> FilterCondition {
    FilterCondition::new(field, FilterOperator::Eq, "x")
}

/// Every filter and field collection is the main collection or a join target,
/// and every join source is the main collection or another join's target.
fn assert_invariants(store: &ExportConfigurationStore) {
    let config = store.configuration();
    for filter in &config.filters {
        assert!(
            config.contains_collection(&filter.collection),
            "filter on '{}' escaped the join tree",
            filter.collection
        );
    }
    for field in &config.selected_fields {
        assert!(config.contains_collection(&field.collection));
    }
    for join in &config.joins {
        assert!(
            join.source_collection == config.main_collection
                || config.joins.iter().any(|j| j.target_collection == join.source_collection),
            "join from '{}' is orphaned",
            join.source_collection
        );
    }
}

mod cascade_tests {
    use super::*;

    #[test]
    fn test_remove_join_cascades_transitively() {
        let mut store = ExportConfigurationStore::new();
        store.set_main_collection("a");
        let ab = JoinConfiguration::new("a", "b", "b_id", "_id");
        let ab_id = ab.id;
        store.add_join(ab).unwrap();
        store.add_join(JoinConfiguration::new("b", "c", "c_id", "_id")).unwrap();
        store
            .add_filter(CollectionFilter::new("c", vec![condition("name")]))
            .unwrap();

        let removed = store.remove_join(ab_id);

        assert_eq!(removed.len(), 2);
        assert!(store.joins().is_empty());
        assert!(store.filters().is_empty());
        assert_invariants(&store);
    }

    #[test]
    fn test_remove_join_keeps_siblings() {
        let mut store = ExportConfigurationStore::new();
        store.set_main_collection("students");
        let classes = JoinConfiguration::new("students", "classes", "class_id", "_id");
        let classes_id = classes.id;
        store.add_join(classes).unwrap();
        store
            .add_join(JoinConfiguration::new("classes", "teachers", "teacher_id", "_id"))
            .unwrap();
        store
            .add_join(JoinConfiguration::new("students", "exams", "_id", "student_id"))
            .unwrap();
        store.set_selected_fields("students", ["first_name"]).unwrap();
        store.set_selected_fields("teachers", ["last_name"]).unwrap();
        store.set_selected_fields("exams", ["score"]).unwrap();
        store
            .add_filter(CollectionFilter::new("exams", vec![condition("subject")]))
            .unwrap();
        store
            .add_filter(CollectionFilter::new("classes", vec![condition("year")]))
            .unwrap();

        store.remove_join(classes_id);

        let config = store.configuration();
        assert_eq!(config.joins.len(), 1);
        assert_eq!(config.joins[0].target_collection, "exams");
        assert_eq!(config.filters.len(), 1);
        assert_eq!(config.filters[0].collection, "exams");
        assert_eq!(
            config.selected_fields,
            vec![
                SelectedField::new("students", "first_name"),
                SelectedField::new("exams", "score"),
            ]
        );
        assert_invariants(&store);
    }

    #[test]
    fn test_remove_unknown_join_is_noop() {
        let mut store = ExportConfigurationStore::new();
        store.set_main_collection("students");
        store
            .add_join(JoinConfiguration::new("students", "classes", "class_id", "_id"))
            .unwrap();

        assert!(store.remove_join(Uuid::new_v4()).is_empty());
        assert_eq!(store.joins().len(), 1);
    }
}

mod filter_tests {
    use super::*;

    #[test]
    fn test_remove_filter_is_idempotent() {
        let mut store = ExportConfigurationStore::new();
        store.set_main_collection("students");
        let filter = CollectionFilter::new("students", vec![condition("grade")]);
        let id = filter.id;
        store.add_filter(filter).unwrap();
        store
            .add_filter(CollectionFilter::new("students", vec![condition("status")]))
            .unwrap();

        assert!(store.remove_filter(id));
        let after_first = store.configuration().clone();
        assert!(!store.remove_filter(id));
        assert_eq!(store.configuration(), &after_first);
        assert_eq!(store.filters().len(), 1);
    }

    #[test]
    fn test_filter_outside_tree_rejected() {
        let mut store = ExportConfigurationStore::new();
        store.set_main_collection("students");
        let result = store.add_filter(CollectionFilter::new("teachers", vec![condition("name")]));
        assert_eq!(result, Err(StoreError::UnknownCollection("teachers".to_string())));
        assert!(store.filters().is_empty());
    }

    #[test]
    fn test_duplicate_filter_id_rejected() {
        let mut store = ExportConfigurationStore::new();
        store.set_main_collection("students");
        let filter = CollectionFilter::new("students", vec![condition("grade")]);
        store.add_filter(filter.clone()).unwrap();
        assert_eq!(store.add_filter(filter.clone()), Err(StoreError::DuplicateId(filter.id)));
    }
}

mod main_collection_tests {
    use super::*;

    #[test]
    fn test_changing_main_collection_clears_everything() {
        let mut store = ExportConfigurationStore::new();
        store.set_main_collection("a");
        store.add_join(JoinConfiguration::new("a", "b", "b_id", "_id")).unwrap();
        store
            .add_filter(CollectionFilter::new("a", vec![condition("name")]))
            .unwrap();
        store.set_selected_fields("a", ["name"]).unwrap();
        store.set_format(ExportFormat::Csv);

        store.set_main_collection("x");

        let config = store.configuration();
        assert_eq!(config.main_collection, "x");
        assert!(config.joins.is_empty());
        assert!(config.filters.is_empty());
        assert!(config.selected_fields.is_empty());
        assert_eq!(config.format, ExportFormat::Csv);
    }
}

mod rehydration_tests {
    use super::*;

    #[test]
    fn test_try_from_valid_configuration() {
        let config = ExportConfiguration {
            main_collection: "students".to_string(),
            joins: vec![
                JoinConfiguration::new("students", "classes", "class_id", "_id"),
                JoinConfiguration::new("classes", "teachers", "teacher_id", "_id"),
            ],
            filters: vec![CollectionFilter::new("teachers", vec![condition("subject")])],
            selected_fields: vec![
                SelectedField::new("students", "first_name"),
                SelectedField::new("teachers", "last_name"),
                SelectedField::new("students", "last_name"),
            ],
            format: ExportFormat::Xlsx,
            filename: Some("roster".to_string()),
            ..Default::default()
        };

        let store = ExportConfigurationStore::try_from(config).unwrap();
        assert_eq!(store.joins().len(), 2);
        assert_eq!(store.joins()[1].selected_fields, vec!["last_name"]);
        assert_eq!(
            store.configuration().fields_for("students"),
            vec!["first_name", "last_name"]
        );
        assert_eq!(store.configuration().format, ExportFormat::Xlsx);
        assert_invariants(&store);
    }

    #[test]
    fn test_try_from_rejects_orphaned_join() {
        let config = ExportConfiguration {
            main_collection: "students".to_string(),
            joins: vec![JoinConfiguration::new("rooms", "buildings", "building_id", "_id")],
            ..Default::default()
        };
        assert_eq!(
            ExportConfigurationStore::try_from(config),
            Err(StoreError::DanglingJoinSource("rooms".to_string()))
        );
    }

    #[test]
    fn test_try_from_rejects_missing_main() {
        assert_eq!(
            ExportConfigurationStore::try_from(ExportConfiguration::default()),
            Err(StoreError::NoMainCollection)
        );
    }

    #[test]
    fn test_configuration_json_round_trip() {
        let json = serde_json::json!({
            "main_collection": "students",
            "joins": [{
                "id": "5b0c4bd3-8f5e-4d3c-9a44-3f0b9f3f7f10",
                "source_collection": "students",
                "target_collection": "classes",
                "local_field": "class_id",
                "foreign_field": "_id"
            }],
            "filters": [],
            "selected_fields": [{"collection": "classes", "field": "name"}],
            "format": "csv"
        });
        let config: ExportConfiguration = serde_json::from_value(json).unwrap();
        let store = ExportConfigurationStore::try_from(config).unwrap();
        assert_eq!(store.joins()[0].selected_fields, vec!["name"]);
        assert_eq!(store.configuration().format, ExportFormat::Csv);
        assert!(store.configuration().options.flatten_nested);
    }
}

mod reachable_state_tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Step {
        SetMain(&'static str),
        AddJoin(&'static str, &'static str),
        RemoveJoinTo(&'static str),
        AddFilter(&'static str),
        RemoveFirstFilter,
        SelectFields(&'static str),
    }

    const STEPS: [Step; 11] = [
        Step::SetMain("a"),
        Step::SetMain("b"),
        Step::AddJoin("a", "b"),
        Step::AddJoin("b", "c"),
        Step::AddJoin("a", "c"),
        Step::AddJoin("c", "d"),
        Step::RemoveJoinTo("b"),
        Step::RemoveJoinTo("c"),
        Step::AddFilter("c"),
        Step::RemoveFirstFilter,
        Step::SelectFields("d"),
    ];

    fn apply(store: &mut ExportConfigurationStore, step: Step) {
        // Rejected steps are expected; only the resulting state matters.
        match step {
            Step::SetMain(key) => store.set_main_collection(key),
            Step::AddJoin(source, target) => {
                let _ = store.add_join(JoinConfiguration::new(source, target, "ref_id", "_id"));
            }
            Step::RemoveJoinTo(target) => {
                if let Some(id) = store
                    .joins()
                    .iter()
                    .find(|j| j.target_collection == target)
                    .map(|j| j.id)
                {
                    store.remove_join(id);
                }
            }
            Step::AddFilter(collection) => {
                let _ = store.add_filter(CollectionFilter::new(collection, vec![condition("name")]));
            }
            Step::RemoveFirstFilter => {
                if let Some(id) = store.filters().first().map(|f| f.id) {
                    store.remove_filter(id);
                }
            }
            Step::SelectFields(collection) => {
                let _ = store.set_selected_fields(collection, ["name"]);
            }
        }
    }

    #[test]
    fn test_invariants_hold_after_every_step() {
        let n = STEPS.len();
        for seq in 0..n.pow(4) {
            let mut store = ExportConfigurationStore::new();
            store.set_main_collection("a");
            let mut rest = seq;
            let mut applied = Vec::new();
            for _ in 0..4 {
                let step = STEPS[rest % n];
                rest /= n;
                applied.push(step);
                apply(&mut store, step);

                assert_invariants(&store);
                let config = store.configuration();
                let mut targets: Vec<&str> =
                    config.joins.iter().map(|j| j.target_collection.as_str()).collect();
                targets.sort_unstable();
                targets.dedup();
                assert_eq!(targets.len(), config.joins.len(), "duplicate join target after {:?}", applied);
                assert!(
                    !targets.contains(&config.main_collection.as_str()),
                    "main collection joined after {:?}",
                    applied
                );
            }
        }
    }
}
