//! Collection relationship model
//!
//! Relationships are declared by the backend on the source side only: a
//! collection lists the joins it can offer through `possible_joins`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of relationship behind a join
///
/// The backend sends free-form strings; the two values the builder itself
/// produces are modelled explicitly and everything else is carried through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum RelationshipType {
    /// Field-to-field reference declared by the backend
    #[default]
    Direct,
    /// Manually chosen local/foreign field pair
    Custom,
    /// Any other backend-declared kind (e.g. "reverse", "many_to_many")
    Other(String),
}

impl RelationshipType {
    pub fn as_str(&self) -> &str {
        match self {
            RelationshipType::Direct => "direct",
            RelationshipType::Custom => "custom",
            RelationshipType::Other(other) => other,
        }
    }
}

impl From<String> for RelationshipType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "direct" => RelationshipType::Direct,
            "custom" => RelationshipType::Custom,
            _ => RelationshipType::Other(value),
        }
    }
}

impl From<&str> for RelationshipType {
    fn from(value: &str) -> Self {
        RelationshipType::from(value.to_string())
    }
}

impl From<RelationshipType> for String {
    fn from(value: RelationshipType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A join the backend suggests from one collection to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossibleJoin {
    /// Target collection key
    pub collection: String,
    /// Field on the source collection
    pub suggested_local_field: String,
    /// Field on the target collection
    pub suggested_foreign_field: String,
    #[serde(default)]
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub description: String,
}

/// A collection together with the joins it declares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRelationship {
    /// Collection key. The backend keys its map by collection, so this is
    /// filled from the map key when the payload omits it.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub possible_joins: Vec<PossibleJoin>,
}

impl CollectionRelationship {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            possible_joins: Vec::new(),
        }
    }

    /// Add a possible join (builder style, mostly for fixtures)
    pub fn with_join(mut self, join: PossibleJoin) -> Self {
        self.possible_joins.push(join);
        self
    }

    /// Display name, falling back to the key when the backend sent none
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.key
        } else {
            &self.display_name
        }
    }
}

impl PossibleJoin {
    pub fn new(
        collection: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            suggested_local_field: local_field.into(),
            suggested_foreign_field: foreign_field.into(),
            relationship_type: RelationshipType::Direct,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_relationship_type(mut self, relationship_type: RelationshipType) -> Self {
        self.relationship_type = relationship_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_type_from_string() {
        assert_eq!(RelationshipType::from("direct"), RelationshipType::Direct);
        assert_eq!(RelationshipType::from("custom"), RelationshipType::Custom);
        assert_eq!(
            RelationshipType::from("reverse"),
            RelationshipType::Other("reverse".to_string())
        );
    }

    #[test]
    fn test_possible_join_deserialization() {
        let json = r#"{
            "collection": "classes",
            "suggested_local_field": "class_id",
            "suggested_foreign_field": "_id",
            "relationship_type": "direct",
            "description": "Student's class"
        }"#;
        let join: PossibleJoin = serde_json::from_str(json).unwrap();
        assert_eq!(join.collection, "classes");
        assert_eq!(join.relationship_type, RelationshipType::Direct);

        let back = serde_json::to_value(&join).unwrap();
        assert_eq!(back["relationship_type"], "direct");
    }

    #[test]
    fn test_label_falls_back_to_key() {
        let rel = CollectionRelationship::new("students", "");
        assert_eq!(rel.label(), "students");
        let rel = CollectionRelationship::new("students", "Students");
        assert_eq!(rel.label(), "Students");
    }
}
