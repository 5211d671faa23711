//! Field suggestion accessor
//!
//! Caches the backend's field list per collection key for the lifetime of
//! an export session.

use crate::models::FieldInfo;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct FieldSuggestions {
    by_collection: HashMap<String, Vec<FieldInfo>>,
}

impl FieldSuggestions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: impl Into<String>, fields: Vec<FieldInfo>) {
        self.by_collection.insert(collection.into(), fields);
    }

    pub fn get(&self, collection: &str) -> Option<&[FieldInfo]> {
        self.by_collection.get(collection).map(Vec::as_slice)
    }

    pub fn is_loaded(&self, collection: &str) -> bool {
        self.by_collection.contains_key(collection)
    }

    /// Field paths the backend marks as recommended for `collection`
    pub fn recommended(&self, collection: &str) -> Vec<String> {
        self.get(collection)
            .unwrap_or_default()
            .iter()
            .filter(|f| f.is_recommended())
            .map(|f| f.field.clone())
            .collect()
    }

    pub fn contains_field(&self, collection: &str, field: &str) -> bool {
        self.get(collection)
            .is_some_and(|fields| fields.iter().any(|f| f.field == field))
    }

    /// Drop every cached list (session teardown)
    pub fn clear(&mut self) {
        self.by_collection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommended_fields() {
        let mut cache = FieldSuggestions::new();
        cache.insert(
            "students",
            vec![
                FieldInfo::new("first_name", "First name").recommended(),
                FieldInfo::new("internal_notes", "Notes"),
                FieldInfo::new("email", "Email").recommended(),
            ],
        );
        assert_eq!(cache.recommended("students"), vec!["first_name", "email"]);
        assert!(cache.recommended("classes").is_empty());
        assert!(cache.contains_field("students", "email"));
        assert!(!cache.contains_field("classes", "email"));
    }
}
