//! Join configuration model

use super::relationship::{PossibleJoin, RelationshipType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the local/foreign field pair of a join was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMethod {
    /// Prefilled from a catalog `possible_joins` entry
    Suggested,
    /// Fields picked manually
    Custom,
}

impl std::fmt::Display for JoinMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinMethod::Suggested => write!(f, "suggested"),
            JoinMethod::Custom => write!(f, "custom"),
        }
    }
}

/// A lookup from a source collection to a target collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinConfiguration {
    pub id: Uuid,
    pub source_collection: String,
    pub target_collection: String,
    pub local_field: String,
    pub foreign_field: String,
    #[serde(default)]
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub description: String,
    /// Fields exported from the target collection
    #[serde(default)]
    pub selected_fields: Vec<String>,
}

impl JoinConfiguration {
    pub fn new(
        source_collection: impl Into<String>,
        target_collection: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_collection: source_collection.into(),
            target_collection: target_collection.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            relationship_type: RelationshipType::Custom,
            description: String::new(),
            selected_fields: Vec::new(),
        }
    }

    /// Build a join from a catalog suggestion declared on `source_collection`
    pub fn from_possible_join(source_collection: impl Into<String>, possible: &PossibleJoin) -> Self {
        Self {
            relationship_type: possible.relationship_type.clone(),
            description: possible.description.clone(),
            ..Self::new(
                source_collection,
                possible.collection.clone(),
                possible.suggested_local_field.clone(),
                possible.suggested_foreign_field.clone(),
            )
        }
    }
}
