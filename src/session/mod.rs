//! Export session
//!
//! Drives one export from start to submission. The session owns the
//! configuration store and both builders, loads the relationship catalog
//! and field suggestions from an [`ExportBackend`], and feeds fetched
//! fields back to the builders through their request tickets.
//!
//! # Example
//!
//! ```rust,ignore
//! use export_config_sdk::session::ExportSession;
//! use export_config_sdk::models::JoinMethod;
//!
//! let mut session = ExportSession::new(backend, ctx);
//! session.load_catalog().await?;
//! session.set_main_collection("students");
//!
//! session.open_join()?;
//! session.choose_join_source("students")?;
//! session.choose_join_target("classes").await?;
//! session.join_builder_mut().choose_method(JoinMethod::Suggested)?;
//! session.confirm_join()?;
//!
//! let report = session.validate().await?;
//! ```

pub mod report;

pub use report::SubmissionReport;

use crate::api::{ExecuteResponse, ExportApiError, ExportBackend, ExportStatus};
#[cfg(feature = "status-polling")]
use crate::api::TaskStatus;
use crate::auth::RequestContext;
use crate::builder::{
    FetchState, FieldRequest, FilterConditionBuilder, JoinConfigurationBuilder, ValidationError,
};
use crate::catalog::{CollectionOption, FieldSuggestions, RelationshipCatalog};
use crate::config::ClientConfig;
use crate::export::{transform, BackendExportPayload};
use crate::models::{ExportConfiguration, FieldInfo, JoinConfiguration};
use crate::store::{ExportConfigurationStore, StoreError};
use crate::validation::{validate_configuration, ConfigurationValidationResult};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ExportApiError),

    #[error(transparent)]
    Builder(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("relationship catalog has not been loaded")]
    CatalogNotLoaded,

    #[error("export configuration is invalid: {}", .0.join("; "))]
    InvalidConfiguration(Vec<String>),

    #[error("export task {task_id} failed: {error}")]
    ExportFailed { task_id: String, error: String },

    #[error("export task {task_id} did not finish after {attempts} status checks")]
    PollingTimedOut { task_id: String, attempts: u32 },
}

pub struct ExportSession<B: ExportBackend> {
    backend: B,
    ctx: RequestContext,
    catalog: FetchState<RelationshipCatalog>,
    fields: FieldSuggestions,
    store: ExportConfigurationStore,
    filter_builder: FilterConditionBuilder,
    join_builder: JoinConfigurationBuilder,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl<B: ExportBackend> ExportSession<B> {
    pub fn new(backend: B, ctx: RequestContext) -> Self {
        let defaults = ClientConfig::default();
        Self {
            backend,
            ctx,
            catalog: FetchState::Idle,
            fields: FieldSuggestions::new(),
            store: ExportConfigurationStore::new(),
            filter_builder: FilterConditionBuilder::new(),
            join_builder: JoinConfigurationBuilder::new(),
            poll_interval: Duration::from_millis(defaults.poll_interval_ms),
            max_poll_attempts: defaults.max_poll_attempts,
        }
    }

    /// Session using the token, polling settings and default format of `config`
    pub fn from_config(backend: B, config: &ClientConfig) -> Self {
        let mut session = Self::new(backend, config.request_context())
            .with_polling(Duration::from_millis(config.poll_interval_ms), config.max_poll_attempts);
        session.store.set_format(config.default_format);
        session
    }

    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
        self
    }

    /// Start from an existing configuration (e.g. loaded from a file)
    pub fn with_configuration(mut self, config: ExportConfiguration) -> Result<Self, StoreError> {
        self.store = ExportConfigurationStore::try_from(config)?;
        Ok(self)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    pub fn store(&self) -> &ExportConfigurationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ExportConfigurationStore {
        &mut self.store
    }

    pub fn configuration(&self) -> &ExportConfiguration {
        self.store.configuration()
    }

    pub fn filter_builder(&self) -> &FilterConditionBuilder {
        &self.filter_builder
    }

    pub fn filter_builder_mut(&mut self) -> &mut FilterConditionBuilder {
        &mut self.filter_builder
    }

    pub fn join_builder(&self) -> &JoinConfigurationBuilder {
        &self.join_builder
    }

    pub fn join_builder_mut(&mut self) -> &mut JoinConfigurationBuilder {
        &mut self.join_builder
    }

    pub fn catalog_state(&self) -> &FetchState<RelationshipCatalog> {
        &self.catalog
    }

    pub fn catalog(&self) -> Result<&RelationshipCatalog, SessionError> {
        self.catalog.ready().ok_or(SessionError::CatalogNotLoaded)
    }

    /// Fetch the relationship catalog (again, on manual retry)
    pub async fn load_catalog(&mut self) -> Result<&RelationshipCatalog, SessionError> {
        self.catalog = FetchState::Loading;
        match self.backend.get_collections_relationships(&self.ctx).await {
            Ok(response) => {
                let catalog = RelationshipCatalog::from(response);
                info!("Loaded relationship catalog with {} collections", catalog.len());
                self.catalog = FetchState::Ready(catalog);
                self.catalog()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load relationship catalog");
                self.catalog = FetchState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Fields of `collection`, fetched once per session
    pub async fn field_suggestions(&mut self, collection: &str) -> Result<Vec<FieldInfo>, SessionError> {
        let fields = lookup_fields(&self.backend, &self.ctx, &self.fields, collection).await?;
        self.fields.insert(collection, fields.clone());
        Ok(fields)
    }

    pub fn cached_fields(&self) -> &FieldSuggestions {
        &self.fields
    }

    /// Change the main collection; clears the configuration and closes
    /// both builders
    pub fn set_main_collection(&mut self, key: &str) {
        if self.store.main_collection() != key {
            self.filter_builder.cancel();
            self.join_builder.cancel();
        }
        self.store.set_main_collection(key);
    }

    pub fn set_selected_fields<I, S>(&mut self, collection: &str, fields: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store.set_selected_fields(collection, fields)?;
        Ok(())
    }

    /// Select the fields the backend recommends for `collection`
    pub async fn select_recommended_fields(&mut self, collection: &str) -> Result<Vec<String>, SessionError> {
        if !self.store.configuration().contains_collection(collection) {
            return Err(StoreError::UnknownCollection(collection.to_string()).into());
        }
        self.field_suggestions(collection).await?;
        let recommended = self.fields.recommended(collection);
        self.store
            .set_selected_fields(collection, recommended.iter().cloned())?;
        Ok(recommended)
    }

    /// Collections offered in the filter dialog
    pub fn filter_collection_options(&self) -> Result<Vec<CollectionOption>, SessionError> {
        Ok(self.store.available_collections_for_filter(self.catalog()?))
    }

    /// Open the filter builder for a new filter
    pub async fn open_filter(&mut self, collection: Option<&str>) -> Result<(), SessionError> {
        match self.filter_builder.open(collection, None) {
            Some(request) => self.deliver_filter_fields(request).await,
            None => Ok(()),
        }
    }

    /// Open the filter builder on an existing filter
    pub async fn edit_filter(&mut self, id: Uuid) -> Result<(), SessionError> {
        let existing = self
            .store
            .filters()
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(StoreError::FilterNotFound(id))?;
        match self.filter_builder.open(None, Some(&existing)) {
            Some(request) => self.deliver_filter_fields(request).await,
            None => Ok(()),
        }
    }

    pub async fn set_filter_collection(&mut self, key: &str) -> Result<(), SessionError> {
        if !self.store.configuration().contains_collection(key) {
            return Err(StoreError::UnknownCollection(key.to_string()).into());
        }
        let request = self.filter_builder.set_collection(key)?;
        self.deliver_filter_fields(request).await
    }

    /// Manual retry after a failed field fetch
    pub async fn reload_filter_fields(&mut self) -> Result<(), SessionError> {
        match self.filter_builder.reload_fields() {
            Some(request) => self.deliver_filter_fields(request).await,
            None => Ok(()),
        }
    }

    async fn deliver_filter_fields(&mut self, request: FieldRequest) -> Result<(), SessionError> {
        let result = lookup_fields(&self.backend, &self.ctx, &self.fields, &request.collection).await;
        if let Ok(fields) = &result {
            self.fields.insert(request.collection.clone(), fields.clone());
        }
        self.filter_builder
            .receive_fields(&request, result.clone().map_err(|e| e.to_string()));
        result.map(|_| ()).map_err(SessionError::from)
    }

    /// Save the open filter into the store
    ///
    /// The builder is closed only once the store accepted the filter; a
    /// rejected filter stays open with its edits.
    pub fn save_filter(&mut self) -> Result<Uuid, SessionError> {
        let filter = self.filter_builder.to_filter()?;
        let id = filter.id;
        let editing = self.filter_builder.is_editing();
        if editing {
            self.store.update_filter(id, filter)?;
        } else {
            self.store.add_filter(filter)?;
        }
        self.filter_builder.cancel();
        debug!(%id, editing, "Filter saved");
        Ok(id)
    }

    pub fn cancel_filter(&mut self) {
        self.filter_builder.cancel();
    }

    pub fn remove_filter(&mut self, id: Uuid) -> bool {
        self.store.remove_filter(id)
    }

    /// Open the join builder with the collections currently in the export
    /// as possible sources
    pub fn open_join(&mut self) -> Result<(), SessionError> {
        let sources: Vec<String> = self
            .store
            .configuration()
            .collection_keys()
            .into_iter()
            .map(str::to_string)
            .collect();
        if sources.is_empty() {
            return Err(StoreError::NoMainCollection.into());
        }
        self.join_builder.open(sources);
        Ok(())
    }

    pub fn choose_join_source(&mut self, collection: &str) -> Result<(), SessionError> {
        self.join_builder.choose_source(collection)?;
        Ok(())
    }

    pub fn join_target_options(&self) -> Result<Vec<CollectionOption>, SessionError> {
        Ok(self.join_builder.target_options(self.catalog()?))
    }

    /// Choose the join target and load both sides' fields in parallel
    ///
    /// A failed fetch reverts the target to unselected and is returned.
    pub async fn choose_join_target(&mut self, collection: &str) -> Result<(), SessionError> {
        let catalog = self.catalog.ready().ok_or(SessionError::CatalogNotLoaded)?;
        let requests = self.join_builder.choose_target(catalog, collection)?;

        let (source, target) = futures::join!(
            lookup_fields(&self.backend, &self.ctx, &self.fields, &requests.source.collection),
            lookup_fields(&self.backend, &self.ctx, &self.fields, &requests.target.collection),
        );

        for (request, result) in [(&requests.source, &source), (&requests.target, &target)] {
            if let Ok(fields) = result {
                self.fields.insert(request.collection.clone(), fields.clone());
            }
        }
        self.join_builder
            .receive_source_fields(&requests.source, source.clone().map_err(|e| e.to_string()));
        self.join_builder
            .receive_target_fields(&requests.target, target.clone().map_err(|e| e.to_string()));

        source?;
        target?;
        Ok(())
    }

    /// Add the join being built to the store; `None` when the builder is
    /// not ready
    pub fn confirm_join(&mut self) -> Result<Option<Uuid>, SessionError> {
        let Some(join) = self.join_builder.confirm() else {
            return Ok(None);
        };
        let id = join.id;
        self.store.add_join(join)?;
        Ok(Some(id))
    }

    pub fn cancel_join(&mut self) {
        self.join_builder.cancel();
    }

    /// Remove a join and everything depending on it
    ///
    /// Removed collections are withdrawn from an open join builder's
    /// sources, and an open filter builder on a removed collection is
    /// closed.
    pub fn remove_join(&mut self, id: Uuid) -> Vec<JoinConfiguration> {
        let removed = self.store.remove_join(id);
        let gone: Vec<&str> = removed.iter().map(|j| j.target_collection.as_str()).collect();
        if gone.is_empty() {
            return removed;
        }

        if self.join_builder.is_open() && self.join_builder.withdraw_sources(&gone) {
            debug!("Join source was removed from the export; source cleared");
        }
        if self
            .filter_builder
            .collection()
            .is_some_and(|c| gone.contains(&c))
        {
            debug!("Filter collection was removed from the export; filter builder closed");
            self.filter_builder.cancel();
        }
        removed
    }

    pub fn check(&self) -> ConfigurationValidationResult {
        validate_configuration(self.store.configuration())
    }

    pub fn payload(&self) -> BackendExportPayload {
        transform(self.store.configuration())
    }

    /// Validate locally, then with the backend
    ///
    /// The backend is only asked when the local checks pass.
    pub async fn validate(&self) -> Result<SubmissionReport, SessionError> {
        let local = self.check();
        let report = SubmissionReport::local(&local);
        if !local.is_valid() {
            info!(errors = report.errors.len(), "Configuration failed local validation");
            return Ok(report);
        }

        let response = self
            .backend
            .validate_configuration(&self.ctx, &self.payload())
            .await?;
        let report = report.merge_remote(response);
        info!(
            valid = report.valid,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Configuration validated"
        );
        Ok(report)
    }

    /// Submit the export job
    pub async fn execute(&self) -> Result<ExecuteResponse, SessionError> {
        let local = self.check();
        if !local.is_valid() {
            return Err(SessionError::InvalidConfiguration(local.error_messages()));
        }

        let response = self.backend.execute_export(&self.ctx, &self.payload()).await?;
        info!(task_id = %response.task_id, status = %response.status, "Export submitted");
        Ok(response)
    }

    pub async fn status(&self, task_id: &str) -> Result<ExportStatus, SessionError> {
        Ok(self.backend.get_export_status(&self.ctx, task_id).await?)
    }

    /// Poll until the task completes or fails
    #[cfg(feature = "status-polling")]
    pub async fn wait_for_completion(&self, task_id: &str) -> Result<ExportStatus, SessionError> {
        let mut last_status: Option<TaskStatus> = None;
        for attempt in 1..=self.max_poll_attempts {
            let status = self.status(task_id).await?;
            if last_status != Some(status.status) {
                info!(task_id, status = %status.status, progress = ?status.progress, "Export status");
                last_status = Some(status.status);
            }

            match status.status {
                TaskStatus::Completed => return Ok(status),
                TaskStatus::Failed => {
                    return Err(SessionError::ExportFailed {
                        task_id: task_id.to_string(),
                        error: status.error.unwrap_or_else(|| "unknown error".to_string()),
                    });
                }
                TaskStatus::Pending | TaskStatus::Processing => {}
            }

            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        warn!(task_id, attempts = self.max_poll_attempts, "Gave up waiting for export");
        Err(SessionError::PollingTimedOut {
            task_id: task_id.to_string(),
            attempts: self.max_poll_attempts,
        })
    }
}

/// Cached fields for `collection`, or a fresh fetch
async fn lookup_fields<B: ExportBackend>(
    backend: &B,
    ctx: &RequestContext,
    cache: &FieldSuggestions,
    collection: &str,
) -> Result<Vec<FieldInfo>, ExportApiError> {
    if let Some(fields) = cache.get(collection) {
        return Ok(fields.to_vec());
    }
    let response = backend.get_field_suggestions(ctx, collection).await?;
    debug!(
        collection,
        fields = response.available_fields.len(),
        "Loaded field suggestions"
    );
    Ok(response.available_fields)
}
