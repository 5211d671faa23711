//! Filter model: conditions scoped to a single collection

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comparison operator of a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Regex,
    Exists,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 10] = [
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::In,
        FilterOperator::Nin,
        FilterOperator::Regex,
        FilterOperator::Exists,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::In => "in",
            FilterOperator::Nin => "nin",
            FilterOperator::Regex => "regex",
            FilterOperator::Exists => "exists",
        }
    }

    /// `exists` is the only operator whose value is ignored
    pub fn requires_value(&self) -> bool {
        !matches!(self, FilterOperator::Exists)
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == lowered)
            .ok_or_else(|| format!("Unknown filter operator: {}", s))
    }
}

/// How the conditions of one filter combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    #[default]
    And,
    /// Kept for forward compatibility; the filter builder does not offer it
    Or,
}

/// A single `field <operator> value` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub id: Uuid,
    pub field: String,
    #[serde(default)]
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
    /// Free-form operator options (e.g. regex flags)
    #[serde(default)]
    pub options: String,
}

impl FilterCondition {
    /// Fresh, empty condition with the default `eq` operator
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            field: String::new(),
            operator: FilterOperator::Eq,
            value: String::new(),
            options: String::new(),
        }
    }

    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            ..Self::empty()
        }
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    /// A condition is complete when it names a field and, unless the
    /// operator is `exists`, carries a value.
    pub fn is_complete(&self) -> bool {
        !self.field.trim().is_empty()
            && (!self.operator.requires_value() || !self.value.trim().is_empty())
    }

    /// Merge a partial update into this condition
    pub fn apply(&mut self, patch: ConditionPatch) {
        if let Some(field) = patch.field {
            self.field = field;
        }
        if let Some(operator) = patch.operator {
            self.operator = operator;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(options) = patch.options {
            self.options = options;
        }
    }
}

/// Partial update for a [`FilterCondition`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionPatch {
    pub field: Option<String>,
    pub operator: Option<FilterOperator>,
    pub value: Option<String>,
    pub options: Option<String>,
}

impl ConditionPatch {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    pub fn operator(operator: FilterOperator) -> Self {
        Self {
            operator: Some(operator),
            ..Self::default()
        }
    }

    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_operator(mut self, operator: FilterOperator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }
}

/// Conditions attached to exactly one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFilter {
    pub id: Uuid,
    pub collection: String,
    pub conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub logic: FilterLogic,
}

impl CollectionFilter {
    pub fn new(collection: impl Into<String>, conditions: Vec<FilterCondition>) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection: collection.into(),
            conditions,
            logic: FilterLogic::And,
        }
    }

    /// Index of the first incomplete condition, if any
    pub fn first_incomplete(&self) -> Option<usize> {
        self.conditions.iter().position(|c| !c.is_complete())
    }
}
