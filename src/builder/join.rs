//! Join configuration builder
//!
//! Walks the user through creating one join:
//!
//! ```text
//! Idle → ChoosingSource → ChoosingTarget → LoadingFields → ChoosingMethod
//!      → { SuggestedSelected | CustomFieldsChosen } → Ready → (confirm) → Idle
//! ```
//!
//! The step is derived from the builder's fields rather than stored, so it
//! can never disagree with them.

use super::{FetchState, FieldRequest, ValidationError};
use crate::catalog::{CollectionOption, RelationshipCatalog};
use crate::models::{FieldInfo, JoinConfiguration, JoinMethod, PossibleJoin, RelationshipType};
use tracing::{debug, warn};

/// Where the join builder currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStep {
    Idle,
    ChoosingSource,
    ChoosingTarget,
    /// Source and target fields are being fetched
    LoadingFields,
    ChoosingMethod,
    SuggestedSelected,
    CustomFieldsChosen,
    Ready,
}

/// Field fetches issued when a target is chosen; both must be fulfilled
/// before a method can be picked. They may run concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinFieldRequests {
    pub source: FieldRequest,
    pub target: FieldRequest,
}

#[derive(Debug, Default)]
pub struct JoinConfigurationBuilder {
    active: bool,
    /// Main collection plus every joined collection
    allowed_sources: Vec<String>,
    source: Option<String>,
    target: Option<String>,
    method: Option<JoinMethod>,
    available_possible_joins: Vec<PossibleJoin>,
    selected_possible_join: Option<usize>,
    local_field: String,
    foreign_field: String,
    relationship_type: RelationshipType,
    description: String,
    source_fields: FetchState<Vec<FieldInfo>>,
    target_fields: FetchState<Vec<FieldInfo>>,
    last_error: Option<String>,
    generation: u64,
}

impl JoinConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start creating a join; `sources` are the collections already in the
    /// export (main collection first).
    pub fn open<I, S>(&mut self, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reset();
        self.active = true;
        self.allowed_sources = sources.into_iter().map(Into::into).collect();
    }

    pub fn choose_source(&mut self, collection: &str) -> Result<(), ValidationError> {
        if !self.active {
            return Err(ValidationError::NotOpen);
        }
        if !self.allowed_sources.iter().any(|s| s == collection) {
            return Err(ValidationError::InvalidJoinSource(collection.to_string()));
        }

        self.clear_target();
        self.source = Some(collection.to_string());
        Ok(())
    }

    /// Choose the target collection
    ///
    /// Any catalog collection that is not already part of the export may be
    /// chosen: suggested targets get their catalog mappings, every other
    /// target falls back to the custom method.
    pub fn choose_target(
        &mut self,
        catalog: &RelationshipCatalog,
        collection: &str,
    ) -> Result<JoinFieldRequests, ValidationError> {
        if !self.active {
            return Err(ValidationError::NotOpen);
        }
        let source = self.source.clone().ok_or(ValidationError::NoSourceSelected)?;
        if !catalog.contains(collection) {
            return Err(ValidationError::UnknownCollection(collection.to_string()));
        }
        if self.allowed_sources.iter().any(|s| s == collection) {
            return Err(ValidationError::TargetAlreadyJoined(collection.to_string()));
        }

        self.clear_target();
        self.target = Some(collection.to_string());
        self.available_possible_joins = catalog.possible_joins_between(&source, collection);
        if self.available_possible_joins.is_empty() {
            self.method = Some(JoinMethod::Custom);
            self.relationship_type = RelationshipType::Custom;
        }

        self.source_fields = FetchState::Loading;
        self.target_fields = FetchState::Loading;
        Ok(JoinFieldRequests {
            source: FieldRequest {
                collection: source,
                generation: self.generation,
            },
            target: FieldRequest {
                collection: collection.to_string(),
                generation: self.generation,
            },
        })
    }

    pub fn receive_source_fields(
        &mut self,
        request: &FieldRequest,
        result: Result<Vec<FieldInfo>, String>,
    ) -> bool {
        if !self.is_current(request, self.source.as_deref()) {
            return false;
        }
        match result {
            Ok(fields) => {
                self.source_fields = FetchState::Ready(fields);
                true
            }
            Err(message) => {
                self.fail_fetch(message);
                true
            }
        }
    }

    pub fn receive_target_fields(
        &mut self,
        request: &FieldRequest,
        result: Result<Vec<FieldInfo>, String>,
    ) -> bool {
        if !self.is_current(request, self.target.as_deref()) {
            return false;
        }
        match result {
            Ok(fields) => {
                self.target_fields = FetchState::Ready(fields);
                true
            }
            Err(message) => {
                self.fail_fetch(message);
                true
            }
        }
    }

    fn is_current(&self, request: &FieldRequest, expected: Option<&str>) -> bool {
        let current = self.active
            && self.target.is_some()
            && request.generation == self.generation
            && expected == Some(request.collection.as_str());
        if !current {
            debug!(
                collection = %request.collection,
                generation = request.generation,
                "Discarding stale join field response"
            );
        }
        current
    }

    /// A failed fetch puts the target back to unselected
    fn fail_fetch(&mut self, message: String) {
        warn!(error = %message, "Field suggestions for join failed to load");
        self.clear_target();
        self.last_error = Some(message);
    }

    pub fn choose_method(&mut self, method: JoinMethod) -> Result<(), ValidationError> {
        if !self.active {
            return Err(ValidationError::NotOpen);
        }
        let target = self.target.clone().ok_or(ValidationError::NoTargetSelected)?;
        if !self.fields_ready() {
            return Err(ValidationError::FieldsNotLoaded);
        }

        match method {
            JoinMethod::Suggested => {
                if self.available_possible_joins.is_empty() {
                    return Err(ValidationError::NoSuggestedJoin {
                        source_collection: self.source.clone().unwrap_or_default(),
                        target_collection: target,
                    });
                }
                self.method = Some(JoinMethod::Suggested);
                self.apply_possible_join(0);
            }
            JoinMethod::Custom => {
                self.method = Some(JoinMethod::Custom);
                self.selected_possible_join = None;
                self.local_field.clear();
                self.foreign_field.clear();
                self.relationship_type = RelationshipType::Custom;
                self.description.clear();
            }
        }
        Ok(())
    }

    /// Pick one of several catalog suggestions for the pair
    pub fn select_possible_join(&mut self, index: usize) -> Result<(), ValidationError> {
        if self.method != Some(JoinMethod::Suggested) {
            return Err(ValidationError::WrongMethod {
                expected: JoinMethod::Suggested,
            });
        }
        if index >= self.available_possible_joins.len() {
            return Err(ValidationError::PossibleJoinOutOfRange { index });
        }
        self.apply_possible_join(index);
        Ok(())
    }

    fn apply_possible_join(&mut self, index: usize) {
        if let Some(pj) = self.available_possible_joins.get(index) {
            self.local_field = pj.suggested_local_field.clone();
            self.foreign_field = pj.suggested_foreign_field.clone();
            self.relationship_type = pj.relationship_type.clone();
            self.description = pj.description.clone();
            self.selected_possible_join = Some(index);
        }
    }

    /// Pick the source-side field (custom method); empty clears it
    pub fn set_local_field(&mut self, field: &str) -> Result<(), ValidationError> {
        self.check_custom_field(&self.source_fields, self.source.as_deref(), field)?;
        self.local_field = field.to_string();
        Ok(())
    }

    /// Pick the target-side field (custom method); empty clears it
    pub fn set_foreign_field(&mut self, field: &str) -> Result<(), ValidationError> {
        self.check_custom_field(&self.target_fields, self.target.as_deref(), field)?;
        self.foreign_field = field.to_string();
        Ok(())
    }

    fn check_custom_field(
        &self,
        fields: &FetchState<Vec<FieldInfo>>,
        collection: Option<&str>,
        field: &str,
    ) -> Result<(), ValidationError> {
        if self.method != Some(JoinMethod::Custom) {
            return Err(ValidationError::WrongMethod {
                expected: JoinMethod::Custom,
            });
        }
        if !field.is_empty() && !fields.has_field(field) {
            return Err(ValidationError::UnknownField {
                collection: collection.unwrap_or_default().to_string(),
                field: field.to_string(),
            });
        }
        Ok(())
    }

    /// Whether `confirm` would emit a join
    pub fn is_ready(&self) -> bool {
        if !self.active || self.source.is_none() || self.target.is_none() || !self.fields_ready() {
            return false;
        }
        match self.method {
            Some(JoinMethod::Suggested) => self.selected_possible_join.is_some(),
            Some(JoinMethod::Custom) => !self.local_field.is_empty() && !self.foreign_field.is_empty(),
            None => false,
        }
    }

    /// Emit the join and return to idle; a no-op returning `None` when the
    /// builder is not ready.
    pub fn confirm(&mut self) -> Option<JoinConfiguration> {
        if !self.is_ready() {
            return None;
        }
        let (Some(source), Some(target)) = (self.source.take(), self.target.take()) else {
            return None;
        };

        let mut join = JoinConfiguration::new(
            source,
            target,
            std::mem::take(&mut self.local_field),
            std::mem::take(&mut self.foreign_field),
        );
        join.relationship_type = std::mem::take(&mut self.relationship_type);
        join.description = std::mem::take(&mut self.description);

        debug!(
            source = %join.source_collection,
            target = %join.target_collection,
            "Join configured"
        );
        self.reset();
        Some(join)
    }

    /// Stop offering collections that left the export
    ///
    /// When the chosen source is among them, the source and everything
    /// chosen after it are cleared. Returns whether that happened.
    pub fn withdraw_sources(&mut self, removed: &[&str]) -> bool {
        self.allowed_sources
            .retain(|s| !removed.contains(&s.as_str()));
        let source_removed = self
            .source
            .as_deref()
            .is_some_and(|s| removed.contains(&s));
        if source_removed {
            self.clear_target();
            self.source = None;
        }
        source_removed
    }

    /// Discard everything in progress and return to idle
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    /// Forget the target and everything derived from it. Bumping the
    /// generation invalidates any field fetch still in flight.
    fn clear_target(&mut self) {
        self.generation += 1;
        self.target = None;
        self.method = None;
        self.available_possible_joins.clear();
        self.selected_possible_join = None;
        self.local_field.clear();
        self.foreign_field.clear();
        self.relationship_type = RelationshipType::default();
        self.description.clear();
        self.source_fields = FetchState::Idle;
        self.target_fields = FetchState::Idle;
        self.last_error = None;
    }

    fn fields_ready(&self) -> bool {
        self.source_fields.is_ready() && self.target_fields.is_ready()
    }

    pub fn step(&self) -> JoinStep {
        if !self.active {
            return JoinStep::Idle;
        }
        if self.source.is_none() {
            return JoinStep::ChoosingSource;
        }
        if self.target.is_none() {
            return JoinStep::ChoosingTarget;
        }
        if !self.fields_ready() {
            return JoinStep::LoadingFields;
        }
        if self.is_ready() {
            return JoinStep::Ready;
        }
        match self.method {
            None => JoinStep::ChoosingMethod,
            Some(JoinMethod::Suggested) => JoinStep::SuggestedSelected,
            Some(JoinMethod::Custom) => JoinStep::CustomFieldsChosen,
        }
    }

    /// Targets offered for the chosen source: suggested targets first, in
    /// catalog order, then every other collection not yet in the export.
    pub fn target_options(&self, catalog: &RelationshipCatalog) -> Vec<CollectionOption> {
        let Some(source) = self.source.as_deref() else {
            return Vec::new();
        };
        let taken = |key: &str| self.allowed_sources.iter().any(|s| s == key);

        let suggested = catalog.join_targets(source);
        let mut options: Vec<CollectionOption> = suggested
            .iter()
            .filter(|key| catalog.contains(*key) && !taken(*key))
            .map(|key| catalog.option(*key))
            .collect();
        options.extend(
            catalog
                .collections()
                .filter(|rel| !taken(rel.key.as_str()) && !suggested.contains(&rel.key.as_str()))
                .map(|rel| catalog.option(&rel.key)),
        );
        options
    }

    pub fn is_open(&self) -> bool {
        self.active
    }

    pub fn allowed_sources(&self) -> &[String] {
        &self.allowed_sources
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn method(&self) -> Option<JoinMethod> {
        self.method
    }

    pub fn available_possible_joins(&self) -> &[PossibleJoin] {
        &self.available_possible_joins
    }

    pub fn selected_possible_join(&self) -> Option<usize> {
        self.selected_possible_join
    }

    pub fn local_field(&self) -> &str {
        &self.local_field
    }

    pub fn foreign_field(&self) -> &str {
        &self.foreign_field
    }

    pub fn source_fields(&self) -> &FetchState<Vec<FieldInfo>> {
        &self.source_fields
    }

    pub fn target_fields(&self) -> &FetchState<Vec<FieldInfo>> {
        &self.target_fields
    }

    /// Message of the last failed field fetch, cleared on the next choice
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollectionRelationship;

    fn catalog() -> RelationshipCatalog {
        RelationshipCatalog::from_collections([
            CollectionRelationship::new("students", "Students")
                .with_join(
                    PossibleJoin::new("classes", "class_id", "_id")
                        .with_description("Class the student attends"),
                )
                .with_join(PossibleJoin::new("classes", "homeroom_id", "_id")),
            CollectionRelationship::new("classes", "Classes")
                .with_join(PossibleJoin::new("teachers", "teacher_id", "_id")),
            CollectionRelationship::new("teachers", "Teachers"),
            CollectionRelationship::new("exams", "Exams"),
        ])
    }

    fn student_fields() -> Vec<FieldInfo> {
        vec![
            FieldInfo::new("_id", "ID"),
            FieldInfo::new("class_id", "Class"),
            FieldInfo::new("homeroom_id", "Homeroom"),
        ]
    }

    fn exam_fields() -> Vec<FieldInfo> {
        vec![FieldInfo::new("_id", "ID"), FieldInfo::new("student_id", "Student")]
    }

    fn load(builder: &mut JoinConfigurationBuilder, requests: &JoinFieldRequests, target: Vec<FieldInfo>) {
        assert!(builder.receive_source_fields(&requests.source, Ok(student_fields())));
        assert!(builder.receive_target_fields(&requests.target, Ok(target)));
    }

    #[test]
    fn test_steps_through_suggested_join() {
        let catalog = catalog();
        let mut builder = JoinConfigurationBuilder::new();
        assert_eq!(builder.step(), JoinStep::Idle);

        builder.open(["students"]);
        assert_eq!(builder.step(), JoinStep::ChoosingSource);
        builder.choose_source("students").unwrap();
        assert_eq!(builder.step(), JoinStep::ChoosingTarget);

        let requests = builder.choose_target(&catalog, "classes").unwrap();
        assert_eq!(builder.step(), JoinStep::LoadingFields);
        assert_eq!(builder.available_possible_joins().len(), 2);
        assert_eq!(
            builder.choose_method(JoinMethod::Suggested),
            Err(ValidationError::FieldsNotLoaded)
        );

        load(&mut builder, &requests, vec![FieldInfo::new("_id", "ID")]);
        assert_eq!(builder.step(), JoinStep::ChoosingMethod);

        builder.choose_method(JoinMethod::Suggested).unwrap();
        assert_eq!(builder.step(), JoinStep::Ready);
        assert_eq!(builder.local_field(), "class_id");

        builder.select_possible_join(1).unwrap();
        assert_eq!(builder.local_field(), "homeroom_id");
        assert!(builder.select_possible_join(2).is_err());

        let join = builder.confirm().unwrap();
        assert_eq!(join.source_collection, "students");
        assert_eq!(join.target_collection, "classes");
        assert_eq!(join.local_field, "homeroom_id");
        assert_eq!(join.foreign_field, "_id");
        assert!(join.selected_fields.is_empty());
        assert_eq!(builder.step(), JoinStep::Idle);
    }

    #[test]
    fn test_no_suggestion_forces_custom() {
        let catalog = catalog();
        let mut builder = JoinConfigurationBuilder::new();
        builder.open(["students"]);
        builder.choose_source("students").unwrap();

        let requests = builder.choose_target(&catalog, "exams").unwrap();
        assert_eq!(builder.method(), Some(JoinMethod::Custom));
        load(&mut builder, &requests, exam_fields());
        assert_eq!(builder.step(), JoinStep::CustomFieldsChosen);
        assert!(matches!(
            builder.choose_method(JoinMethod::Suggested),
            Err(ValidationError::NoSuggestedJoin { .. })
        ));

        builder.set_local_field("_id").unwrap();
        assert!(builder.confirm().is_none());
        assert!(matches!(
            builder.set_foreign_field("missing"),
            Err(ValidationError::UnknownField { .. })
        ));
        builder.set_foreign_field("student_id").unwrap();

        let join = builder.confirm().unwrap();
        assert_eq!(join.relationship_type, RelationshipType::Custom);
        assert_eq!(join.foreign_field, "student_id");
    }

    #[test]
    fn test_custom_setters_require_custom_method() {
        let catalog = catalog();
        let mut builder = JoinConfigurationBuilder::new();
        builder.open(["students"]);
        builder.choose_source("students").unwrap();
        let requests = builder.choose_target(&catalog, "classes").unwrap();
        load(&mut builder, &requests, vec![FieldInfo::new("_id", "ID")]);
        builder.choose_method(JoinMethod::Suggested).unwrap();

        assert_eq!(
            builder.set_local_field("class_id"),
            Err(ValidationError::WrongMethod { expected: JoinMethod::Custom })
        );

        builder.choose_method(JoinMethod::Custom).unwrap();
        assert!(builder.local_field().is_empty());
        assert_eq!(
            builder.select_possible_join(0),
            Err(ValidationError::WrongMethod { expected: JoinMethod::Suggested })
        );
    }

    #[test]
    fn test_invalid_source_and_target() {
        let catalog = catalog();
        let mut builder = JoinConfigurationBuilder::new();
        builder.open(["students", "classes"]);

        assert_eq!(
            builder.choose_source("teachers"),
            Err(ValidationError::InvalidJoinSource("teachers".to_string()))
        );
        assert!(matches!(
            builder.choose_target(&catalog, "teachers"),
            Err(ValidationError::NoSourceSelected)
        ));

        builder.choose_source("classes").unwrap();
        assert_eq!(
            builder.choose_target(&catalog, "students"),
            Err(ValidationError::TargetAlreadyJoined("students".to_string()))
        );
        assert_eq!(
            builder.choose_target(&catalog, "nope"),
            Err(ValidationError::UnknownCollection("nope".to_string()))
        );
    }

    #[test]
    fn test_stale_responses_after_source_change() {
        let catalog = catalog();
        let mut builder = JoinConfigurationBuilder::new();
        builder.open(["students", "classes"]);
        builder.choose_source("students").unwrap();
        let stale = builder.choose_target(&catalog, "exams").unwrap();

        builder.choose_source("classes").unwrap();
        assert!(!builder.receive_source_fields(&stale.source, Ok(student_fields())));
        assert!(!builder.receive_target_fields(&stale.target, Ok(exam_fields())));
        assert_eq!(builder.step(), JoinStep::ChoosingTarget);
        assert!(builder.target_fields().ready().is_none());
    }

    #[test]
    fn test_fetch_failure_reverts_target() {
        let catalog = catalog();
        let mut builder = JoinConfigurationBuilder::new();
        builder.open(["students"]);
        builder.choose_source("students").unwrap();
        let requests = builder.choose_target(&catalog, "classes").unwrap();

        assert!(builder.receive_target_fields(&requests.target, Err("503".to_string())));
        assert_eq!(builder.target(), None);
        assert_eq!(builder.step(), JoinStep::ChoosingTarget);
        assert_eq!(builder.last_error(), Some("503"));
        // The sibling request is now stale
        assert!(!builder.receive_source_fields(&requests.source, Ok(student_fields())));
    }

    #[test]
    fn test_target_options_order() {
        let catalog = catalog();
        let mut builder = JoinConfigurationBuilder::new();
        builder.open(["students"]);
        assert!(builder.target_options(&catalog).is_empty());

        builder.choose_source("students").unwrap();
        let keys: Vec<String> = builder
            .target_options(&catalog)
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["classes", "exams", "teachers"]);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let catalog = catalog();
        let mut builder = JoinConfigurationBuilder::new();
        builder.open(["students"]);
        builder.choose_source("students").unwrap();
        let requests = builder.choose_target(&catalog, "classes").unwrap();
        builder.cancel();

        assert_eq!(builder.step(), JoinStep::Idle);
        assert!(!builder.receive_target_fields(&requests.target, Ok(Vec::new())));
        assert!(builder.confirm().is_none());
    }
}
