//! Interactive builders for filters and joins
//!
//! The builders hold in-progress edit state and never talk to the network.
//! When a step needs a collection's fields, the builder hands out a
//! [`FieldRequest`] ticket; whoever performs the fetch delivers the result
//! back with that ticket. Tickets carry a generation number, so a response
//! for a superseded selection is discarded instead of populating fresh state.

pub mod error;
pub mod filter;
pub mod join;

pub use error::ValidationError;
pub use filter::FilterConditionBuilder;
pub use join::{JoinConfigurationBuilder, JoinFieldRequests, JoinStep};

use crate::models::FieldInfo;

/// Ticket for a pending field-suggestion fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequest {
    pub collection: String,
    pub generation: u64,
}

/// Load state of a field list that depends on an async fetch
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FetchState::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl FetchState<Vec<FieldInfo>> {
    /// Loaded fields, or an empty slice while loading/failed
    pub fn fields(&self) -> &[FieldInfo] {
        self.ready().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().iter().any(|f| f.field == field)
    }
}
