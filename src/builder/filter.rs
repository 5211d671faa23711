//! Filter condition builder
//!
//! Edits one [`CollectionFilter`]: the collection it applies to, its logic
//! operator and an ordered list of conditions.

use super::{FetchState, FieldRequest, ValidationError};
use crate::models::{
    CollectionFilter, ConditionPatch, FieldInfo, FilterCondition, FilterLogic,
};
use tracing::debug;
use uuid::Uuid;

/// Edit session for a single collection filter
#[derive(Debug, Default)]
pub struct FilterConditionBuilder {
    open: bool,
    /// Id of the filter being edited; `None` when creating
    editing_id: Option<Uuid>,
    collection: Option<String>,
    logic: FilterLogic,
    conditions: Vec<FilterCondition>,
    fields: FetchState<Vec<FieldInfo>>,
    generation: u64,
}

impl FilterConditionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin an edit session
    ///
    /// With `existing`, its collection, logic and conditions are preloaded
    /// and saving keeps its id. Returns a field request when a collection is
    /// known up front.
    pub fn open(
        &mut self,
        collection: Option<&str>,
        existing: Option<&CollectionFilter>,
    ) -> Option<FieldRequest> {
        self.reset();
        self.open = true;

        if let Some(filter) = existing {
            self.editing_id = Some(filter.id);
            self.collection = Some(filter.collection.clone());
            self.logic = filter.logic;
            self.conditions = filter.conditions.clone();
        } else if let Some(key) = collection.filter(|k| !k.is_empty()) {
            self.collection = Some(key.to_string());
        }

        self.request_fields()
    }

    /// Change the target collection
    ///
    /// Conditions are cleared because their fields belong to the previous
    /// collection. The returned ticket must be fulfilled with the new
    /// collection's fields.
    pub fn set_collection(&mut self, key: &str) -> Result<FieldRequest, ValidationError> {
        if !self.open {
            return Err(ValidationError::NotOpen);
        }
        if key.is_empty() {
            return Err(ValidationError::NoCollectionSelected);
        }

        self.collection = Some(key.to_string());
        self.conditions.clear();
        self.request_fields()
            .ok_or(ValidationError::NoCollectionSelected)
    }

    /// Re-issue the field request for the current collection (manual retry)
    pub fn reload_fields(&mut self) -> Option<FieldRequest> {
        if !self.open {
            return None;
        }
        self.request_fields()
    }

    fn request_fields(&mut self) -> Option<FieldRequest> {
        let collection = self.collection.clone()?;
        self.generation += 1;
        self.fields = FetchState::Loading;
        Some(FieldRequest {
            collection,
            generation: self.generation,
        })
    }

    /// Deliver the outcome of a field fetch
    ///
    /// Returns `false` when the response is stale (superseded request or
    /// closed builder) and was discarded.
    pub fn receive_fields(
        &mut self,
        request: &FieldRequest,
        result: Result<Vec<FieldInfo>, String>,
    ) -> bool {
        let current = self.open
            && request.generation == self.generation
            && self.collection.as_deref() == Some(request.collection.as_str());
        if !current {
            debug!(
                collection = %request.collection,
                generation = request.generation,
                "Discarding stale filter field response"
            );
            return false;
        }

        self.fields = match result {
            Ok(fields) => FetchState::Ready(fields),
            Err(message) => FetchState::Failed(message),
        };
        true
    }

    /// Append an empty condition (`eq`, no field, no value)
    pub fn add_condition(&mut self) -> Result<Uuid, ValidationError> {
        if !self.open {
            return Err(ValidationError::NotOpen);
        }
        let condition = FilterCondition::empty();
        let id = condition.id;
        self.conditions.push(condition);
        Ok(id)
    }

    /// Merge `patch` into the condition with `id`; no-op when not found
    pub fn update_condition(&mut self, id: Uuid, patch: ConditionPatch) -> bool {
        match self.conditions.iter_mut().find(|c| c.id == id) {
            Some(condition) => {
                condition.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn remove_condition(&mut self, id: Uuid) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.id != id);
        self.conditions.len() != before
    }

    /// Only `and` can be selected; `or` is reserved
    pub fn set_logic(&mut self, logic: FilterLogic) -> Result<(), ValidationError> {
        match logic {
            FilterLogic::And => {
                self.logic = logic;
                Ok(())
            }
            FilterLogic::Or => Err(ValidationError::LogicNotSupported),
        }
    }

    /// Validate and emit the filter, closing the builder on success
    pub fn save(&mut self) -> Result<CollectionFilter, ValidationError> {
        let filter = self.to_filter()?;
        self.reset();
        Ok(filter)
    }

    /// Validate and emit the filter, leaving the builder open
    ///
    /// A new filter gets a fresh id on every call; an edited filter keeps
    /// its id.
    pub fn to_filter(&self) -> Result<CollectionFilter, ValidationError> {
        if !self.open {
            return Err(ValidationError::NotOpen);
        }
        let collection = self
            .collection
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::NoCollectionSelected)?;
        if self.conditions.is_empty() {
            return Err(ValidationError::NoConditions);
        }
        if let Some(index) = self.conditions.iter().position(|c| !c.is_complete()) {
            return Err(ValidationError::IncompleteCondition { index });
        }

        Ok(CollectionFilter {
            id: self.editing_id.unwrap_or_else(Uuid::new_v4),
            collection,
            conditions: self.conditions.clone(),
            logic: self.logic,
        })
    }

    /// Discard all edits and close
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        // The generation keeps counting so late responses from an earlier
        // session are still recognised as stale.
        let generation = self.generation;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn editing_id(&self) -> Option<Uuid> {
        self.editing_id
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn logic(&self) -> FilterLogic {
        self.logic
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn fields(&self) -> &FetchState<Vec<FieldInfo>> {
        &self.fields
    }

    /// Field-dependent selects are disabled while this is true
    pub fn fields_loading(&self) -> bool {
        self.fields.is_loading()
    }
}
