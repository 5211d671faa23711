//! Export configuration store
//!
//! Owns the [`ExportConfiguration`] of one export session and is the only
//! way to mutate it. Every filter and selected field refers to the main
//! collection or to the target of a join currently present, and every join
//! starts from the main collection or from another join's target. Removing
//! a join removes everything that depended on it.

use crate::catalog::{CollectionOption, RelationshipCatalog};
use crate::models::{
    CollectionFilter, ExportConfiguration, ExportFormat, ExportOptions, JoinConfiguration,
    SelectedField,
};
use crate::validation::JoinTree;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Rejected mutation that would break the configuration's invariants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no main collection selected")]
    NoMainCollection,

    #[error("collection '{0}' is not part of the export")]
    UnknownCollection(String),

    #[error("join source '{0}' is neither the main collection nor a joined collection")]
    DanglingJoinSource(String),

    #[error("collection '{0}' is already part of the export")]
    DuplicateJoinTarget(String),

    #[error("id {0} is already in use")]
    DuplicateId(Uuid),

    #[error("filter {0} not found")]
    FilterNotFound(Uuid),

    #[error("filter on '{0}' has no conditions")]
    EmptyFilter(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportConfigurationStore {
    config: ExportConfiguration,
}

impl ExportConfigurationStore {
    /// Empty store for a new export session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configuration(&self) -> &ExportConfiguration {
        &self.config
    }

    pub fn into_configuration(self) -> ExportConfiguration {
        self.config
    }

    pub fn main_collection(&self) -> &str {
        &self.config.main_collection
    }

    pub fn joins(&self) -> &[JoinConfiguration] {
        &self.config.joins
    }

    pub fn filters(&self) -> &[CollectionFilter] {
        &self.config.filters
    }

    pub fn selected_fields(&self) -> &[SelectedField] {
        &self.config.selected_fields
    }

    /// Change the root collection
    ///
    /// Joins, filters and selected fields all hang off the root, so they
    /// are cleared. Setting the current main collection again is a no-op.
    pub fn set_main_collection(&mut self, key: &str) {
        if self.config.main_collection == key {
            return;
        }
        info!(
            from = %self.config.main_collection,
            to = %key,
            "Main collection changed, clearing joins, filters and fields"
        );
        self.config.main_collection = key.to_string();
        self.config.joins.clear();
        self.config.filters.clear();
        self.config.selected_fields.clear();
    }

    pub fn add_join(&mut self, join: JoinConfiguration) -> Result<(), StoreError> {
        if self.config.main_collection.is_empty() {
            return Err(StoreError::NoMainCollection);
        }
        if !self.config.contains_collection(&join.source_collection) {
            return Err(StoreError::DanglingJoinSource(join.source_collection));
        }
        if self.config.contains_collection(&join.target_collection) {
            return Err(StoreError::DuplicateJoinTarget(join.target_collection));
        }
        if self.config.joins.iter().any(|j| j.id == join.id) {
            return Err(StoreError::DuplicateId(join.id));
        }

        debug!(
            source = %join.source_collection,
            target = %join.target_collection,
            "Adding join"
        );
        for field in &join.selected_fields {
            self.config
                .selected_fields
                .push(SelectedField::new(join.target_collection.clone(), field.clone()));
        }
        self.config.joins.push(join);
        Ok(())
    }

    /// Remove a join together with every join chained below it and all
    /// filters and selected fields on the removed collections
    ///
    /// Returns the removed joins; an unknown id removes nothing.
    pub fn remove_join(&mut self, id: Uuid) -> Vec<JoinConfiguration> {
        let Some(join) = self.config.joins.iter().find(|j| j.id == id) else {
            return Vec::new();
        };

        let tree = JoinTree::build(&self.config.main_collection, &self.config.joins);
        let removed: HashSet<String> = tree.descendants(&join.target_collection);

        let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.config.joins)
            .into_iter()
            .partition(|j| removed.contains(&j.target_collection));
        self.config.joins = kept;

        let filters_before = self.config.filters.len();
        self.config
            .filters
            .retain(|f| !removed.contains(&f.collection));
        let fields_before = self.config.selected_fields.len();
        self.config
            .selected_fields
            .retain(|f| !removed.contains(&f.collection));

        info!(
            joins = dropped.len(),
            filters = filters_before - self.config.filters.len(),
            fields = fields_before - self.config.selected_fields.len(),
            "Removed join and its dependents"
        );
        dropped
    }

    pub fn add_filter(&mut self, filter: CollectionFilter) -> Result<(), StoreError> {
        self.check_filter(&filter)?;
        if self.config.filters.iter().any(|f| f.id == filter.id) {
            return Err(StoreError::DuplicateId(filter.id));
        }
        self.config.filters.push(filter);
        Ok(())
    }

    /// Replace the filter with `id`; the stored filter keeps `id`
    pub fn update_filter(&mut self, id: Uuid, mut filter: CollectionFilter) -> Result<(), StoreError> {
        self.check_filter(&filter)?;
        let slot = self
            .config
            .filters
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(StoreError::FilterNotFound(id))?;
        filter.id = id;
        *slot = filter;
        Ok(())
    }

    /// Remove a filter; removing an unknown id is a no-op
    pub fn remove_filter(&mut self, id: Uuid) -> bool {
        let before = self.config.filters.len();
        self.config.filters.retain(|f| f.id != id);
        self.config.filters.len() != before
    }

    fn check_filter(&self, filter: &CollectionFilter) -> Result<(), StoreError> {
        if !self.config.contains_collection(&filter.collection) {
            return Err(StoreError::UnknownCollection(filter.collection.clone()));
        }
        if filter.conditions.is_empty() {
            return Err(StoreError::EmptyFilter(filter.collection.clone()));
        }
        Ok(())
    }

    /// Replace the selected fields of one collection (duplicates dropped,
    /// order kept)
    pub fn set_selected_fields<I, S>(&mut self, collection: &str, fields: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.config.contains_collection(collection) {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }

        let mut unique: Vec<String> = Vec::new();
        for field in fields.into_iter().map(Into::into) {
            if !field.is_empty() && !unique.contains(&field) {
                unique.push(field);
            }
        }

        self.config
            .selected_fields
            .retain(|f| f.collection != collection);
        self.config.selected_fields.extend(
            unique
                .iter()
                .map(|field| SelectedField::new(collection, field.clone())),
        );
        if let Some(join) = self
            .config
            .joins
            .iter_mut()
            .find(|j| j.target_collection == collection)
        {
            join.selected_fields = unique;
        }
        Ok(())
    }

    pub fn set_format(&mut self, format: ExportFormat) {
        self.config.format = format;
    }

    /// Set the output filename; blank names fall back to the generated default
    pub fn set_filename(&mut self, filename: Option<String>) {
        self.config.filename = filename.filter(|name| !name.trim().is_empty());
    }

    pub fn set_options(&mut self, options: ExportOptions) {
        self.config.options = options;
    }

    /// Collections a filter may target: the main collection and every join
    /// target, each with its display name
    pub fn available_collections_for_filter(&self, catalog: &RelationshipCatalog) -> Vec<CollectionOption> {
        self.config
            .collection_keys()
            .into_iter()
            .map(|key| catalog.option(key))
            .collect()
    }

    /// Collections a new join may start from (same set as for filters)
    pub fn available_join_sources(&self, catalog: &RelationshipCatalog) -> Vec<CollectionOption> {
        self.available_collections_for_filter(catalog)
    }
}

/// Rebuild a store from a configuration by replaying it through the
/// store's checks; fails on the first invariant violation.
impl TryFrom<ExportConfiguration> for ExportConfigurationStore {
    type Error = StoreError;

    fn try_from(config: ExportConfiguration) -> Result<Self, Self::Error> {
        let ExportConfiguration {
            main_collection,
            joins,
            filters,
            selected_fields,
            format,
            filename,
            options,
        } = config;

        if main_collection.is_empty() {
            return Err(StoreError::NoMainCollection);
        }
        let mut store = ExportConfigurationStore::new();
        store.set_main_collection(&main_collection);

        for mut join in joins {
            // Selected fields are replayed below from the flat list
            join.selected_fields.clear();
            store.add_join(join)?;
        }
        for filter in filters {
            store.add_filter(filter)?;
        }

        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for selected in selected_fields {
            match grouped.iter_mut().find(|(c, _)| *c == selected.collection) {
                Some((_, fields)) => fields.push(selected.field),
                None => grouped.push((selected.collection, vec![selected.field])),
            }
        }
        for (collection, fields) in grouped {
            store.set_selected_fields(&collection, fields)?;
        }

        store.set_format(format);
        store.set_filename(filename);
        store.set_options(options);
        Ok(store)
    }
}
