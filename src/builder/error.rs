//! Builder validation errors
//!
//! Raised by `save()`/`confirm()`-style steps when required input is
//! missing. The builder stays open and nothing is committed.

use crate::models::JoinMethod;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("builder is not open")]
    NotOpen,

    #[error("no collection selected")]
    NoCollectionSelected,

    #[error("no conditions")]
    NoConditions,

    /// Condition at `index` lacks a field, or a value for a value-taking operator
    #[error("incomplete condition at position {}", .index + 1)]
    IncompleteCondition { index: usize },

    #[error("'or' logic is not supported yet")]
    LogicNotSupported,

    #[error("'{0}' is neither the main collection nor a joined collection")]
    InvalidJoinSource(String),

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("collection '{0}' is already part of the export")]
    TargetAlreadyJoined(String),

    #[error("no source collection selected")]
    NoSourceSelected,

    #[error("no target collection selected")]
    NoTargetSelected,

    #[error("field suggestions are still loading")]
    FieldsNotLoaded,

    #[error("no suggested join from '{source_collection}' to '{target_collection}'")]
    NoSuggestedJoin {
        source_collection: String,
        target_collection: String,
    },

    #[error("operation requires the {expected} join method")]
    WrongMethod { expected: JoinMethod },

    #[error("suggested join {index} does not exist")]
    PossibleJoinOutOfRange { index: usize },

    #[error("unknown field '{field}' on '{collection}'")]
    UnknownField { collection: String, field: String },
}
