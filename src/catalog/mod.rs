//! Relationship catalog and field suggestion accessors
//!
//! Both are read-only views over data the backend provides once per
//! session: the collection graph (with each collection's declared
//! `possible_joins`) and the fields available on each collection.

pub mod fields;

pub use fields::FieldSuggestions;

use crate::models::{CollectionRelationship, PossibleJoin};
use serde::Serialize;
use std::collections::BTreeMap;

/// A collection key paired with its human-readable name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionOption {
    pub key: String,
    pub display_name: String,
}

/// Read-only lookup over the backend's collection relationship graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipCatalog {
    collections: BTreeMap<String, CollectionRelationship>,
}

impl RelationshipCatalog {
    /// Build a catalog from the backend map. Entries missing a `key` take
    /// the map key.
    pub fn new(relationships: BTreeMap<String, CollectionRelationship>) -> Self {
        let collections = relationships
            .into_iter()
            .map(|(key, mut rel)| {
                if rel.key.is_empty() {
                    rel.key = key.clone();
                }
                (key, rel)
            })
            .collect();
        Self { collections }
    }

    pub fn from_collections(collections: impl IntoIterator<Item = CollectionRelationship>) -> Self {
        Self {
            collections: collections
                .into_iter()
                .map(|rel| (rel.key.clone(), rel))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    pub fn get(&self, collection: &str) -> Option<&CollectionRelationship> {
        self.collections.get(collection)
    }

    /// Display name for a collection, or the key itself when unknown
    pub fn display_name<'a>(&'a self, collection: &'a str) -> &'a str {
        self.collections
            .get(collection)
            .map(|rel| rel.label())
            .unwrap_or(collection)
    }

    pub fn option(&self, collection: &str) -> CollectionOption {
        CollectionOption {
            key: collection.to_string(),
            display_name: self.display_name(collection).to_string(),
        }
    }

    /// All collections, sorted by key
    pub fn collections(&self) -> impl Iterator<Item = &CollectionRelationship> {
        self.collections.values()
    }

    pub fn options(&self) -> Vec<CollectionOption> {
        self.collections.keys().map(|key| self.option(key)).collect()
    }

    /// Joins declared on `source`, in catalog order
    pub fn possible_joins(&self, source: &str) -> &[PossibleJoin] {
        self.collections
            .get(source)
            .map(|rel| rel.possible_joins.as_slice())
            .unwrap_or(&[])
    }

    /// Suggestions for one source→target pair; the first entry is the
    /// default suggestion.
    pub fn possible_joins_between(&self, source: &str, target: &str) -> Vec<PossibleJoin> {
        self.possible_joins(source)
            .iter()
            .filter(|pj| pj.collection == target)
            .cloned()
            .collect()
    }

    /// Distinct targets `source` declares joins to, in catalog order
    pub fn join_targets(&self, source: &str) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for pj in self.possible_joins(source) {
            if !targets.contains(&pj.collection.as_str()) {
                targets.push(pj.collection.as_str());
            }
        }
        targets
    }

    pub fn has_suggestion(&self, source: &str, target: &str) -> bool {
        self.possible_joins(source)
            .iter()
            .any(|pj| pj.collection == target)
    }
}
