//! Models module for the SDK
//!
//! Defines the value objects the export builder works with: the
//! backend-sourced relationship catalog and field lists, and the
//! client-side filters, joins and export configuration.

pub mod configuration;
pub mod field;
pub mod filter;
pub mod join;
pub mod relationship;

pub use configuration::{ExportConfiguration, ExportFormat, ExportOptions, SelectedField};
pub use field::{FieldInfo, RECOMMENDED_CATEGORY};
pub use filter::{CollectionFilter, ConditionPatch, FilterCondition, FilterLogic, FilterOperator};
pub use join::{JoinConfiguration, JoinMethod};
pub use relationship::{CollectionRelationship, PossibleJoin, RelationshipType};
