//! Field suggestion model

use serde::{Deserialize, Serialize};

/// Category the backend assigns to fields it recommends exporting
pub const RECOMMENDED_CATEGORY: &str = "recommended";

/// A field available on a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field path (e.g. "profile.first_name")
    pub field: String,
    /// Display label
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub category: String,
}

impl FieldInfo {
    pub fn new(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            alias: alias.into(),
            category: String::new(),
        }
    }

    pub fn recommended(mut self) -> Self {
        self.category = RECOMMENDED_CATEGORY.to_string();
        self
    }

    pub fn is_recommended(&self) -> bool {
        self.category == RECOMMENDED_CATEGORY
    }

    pub fn label(&self) -> &str {
        if self.alias.is_empty() {
            &self.field
        } else {
            &self.alias
        }
    }
}
