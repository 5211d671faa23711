//! Export configuration to backend payload
//!
//! The configuration keeps filters and selected fields as flat lists tagged
//! by collection. The backend wants them nested: main-collection filters
//! and fields on the query itself, everything else embedded in the join
//! that brings the collection in.
//!
//! Only one level of joins is emitted. A join whose source is another
//! join's target still appears as a top-level join descriptor, and `or`
//! logic is dropped because all conditions for a collection are combined
//! into one list. [`validate_configuration`](crate::validation::validate_configuration)
//! warns about both.

use super::payload::{BackendExportPayload, FormattingOptions, JoinDescriptor, PayloadCondition, QueryConfig};
use crate::models::{ExportConfiguration, ExportOptions};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Build the backend payload, timestamping the default filename with the
/// current time
pub fn transform(config: &ExportConfiguration) -> BackendExportPayload {
    transform_at(config, Utc::now())
}

/// Same as [`transform`] with an explicit clock
pub fn transform_at(config: &ExportConfiguration, now: DateTime<Utc>) -> BackendExportPayload {
    let mut main_filters: Vec<PayloadCondition> = Vec::new();
    let mut join_filters: HashMap<&str, Vec<PayloadCondition>> = HashMap::new();

    for filter in &config.filters {
        let conditions = filter.conditions.iter().map(PayloadCondition::from);
        if filter.collection == config.main_collection {
            main_filters.extend(conditions);
        } else {
            join_filters
                .entry(filter.collection.as_str())
                .or_default()
                .extend(conditions);
        }
    }

    let joins: Vec<JoinDescriptor> = config
        .joins
        .iter()
        .map(|join| JoinDescriptor {
            fields: config.fields_for(&join.target_collection),
            filters: join_filters
                .remove(join.target_collection.as_str())
                .unwrap_or_default(),
            ..JoinDescriptor::new(&join.target_collection, &join.local_field, &join.foreign_field)
        })
        .collect();

    let query = QueryConfig {
        fields: config.fields_for(&config.main_collection),
        filters: main_filters,
        joins,
        ..QueryConfig::new(&config.main_collection)
    };

    let filename = config
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_filename(now));

    debug!(
        main_collection = %query.main_collection,
        joins = query.joins.len(),
        filters = query.filters.len(),
        filename = %filename,
        "Built export payload"
    );

    BackendExportPayload {
        config: query,
        format: config.format,
        filename,
        async_export: false,
        explain: false,
        dry_run: false,
        formatting: formatting(&config.options),
    }
}

/// `export_<unix millis>`
pub fn default_filename(now: DateTime<Utc>) -> String {
    format!("export_{}", now.timestamp_millis())
}

fn formatting(options: &ExportOptions) -> FormattingOptions {
    FormattingOptions {
        exclude_ids: options.exclude_ids,
        flatten_nested: options.flatten_nested,
        use_aliases: true,
        // The backend has no timestamp switch; empty fields follow it
        include_empty_fields: options.include_timestamps,
    }
}
