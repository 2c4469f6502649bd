//! Filter model.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// How a column's filter input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Free text.
    #[default]
    Text,
    /// Numeric comparisons.
    Number,
    /// Dates (RFC 3339 timestamps or `YYYY-MM-DD`).
    Date,
    /// Membership in a set of allowed values.
    Select,
    /// Boolean equality.
    Boolean,
}

/// Filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// String equality.
    #[default]
    Equals,
    /// String inequality.
    NotEqual,
    /// Case-insensitive substring.
    Contains,
    /// Case-insensitive substring absent.
    NotContains,
    /// Case-insensitive prefix.
    StartsWith,
    /// Case-insensitive suffix.
    EndsWith,
    /// Numeric `>`.
    GreaterThan,
    /// Numeric `>=`.
    GreaterThanOrEqual,
    /// Numeric `<`.
    LessThan,
    /// Numeric `<=`.
    LessThanOrEqual,
    /// Numeric inclusive range, value is a 2-element array.
    Between,
    /// Value is null, missing or empty.
    Blank,
    /// Value is present and non-empty.
    NotBlank,
}

/// One entry of the filter model. Entries AND together.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::FilterItem;
///
/// let active = FilterItem::equals("status", "active");
/// let rich = FilterItem::greater_than("revenue", 1_000_000);
/// let nothing = FilterItem::select("region", Vec::<String>::new());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterItem {
    /// Dotted path of the filtered field.
    pub field: String,
    /// How the value is interpreted.
    #[serde(default)]
    pub filter_type: FilterType,
    /// Filter input.
    #[serde(default)]
    pub value: Value,
    /// Operator (ignored for [`FilterType::Select`]).
    #[serde(default)]
    pub operator: FilterOperator,
}

impl FilterItem {
    /// Creates a filter entry.
    pub fn new(
        field: impl Into<String>,
        filter_type: FilterType,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            filter_type,
            value: value.into(),
            operator,
        }
    }

    /// Text equality.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterType::Text, FilterOperator::Equals, value)
    }

    /// Case-insensitive substring.
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterType::Text, FilterOperator::Contains, value.into())
    }

    /// Case-insensitive prefix.
    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterType::Text, FilterOperator::StartsWith, value.into())
    }

    /// Case-insensitive suffix.
    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterType::Text, FilterOperator::EndsWith, value.into())
    }

    /// Numeric `>`.
    pub fn greater_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterType::Number, FilterOperator::GreaterThan, value)
    }

    /// Numeric `<`.
    pub fn less_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterType::Number, FilterOperator::LessThan, value)
    }

    /// Numeric inclusive range.
    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(
            field,
            FilterType::Number,
            FilterOperator::Between,
            Value::Array(vec![low.into(), high.into()]),
        )
    }

    /// Set membership. An empty set lets no row through.
    pub fn select<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            field,
            FilterType::Select,
            FilterOperator::Equals,
            Value::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Value is null, missing or empty.
    pub fn blank(field: impl Into<String>) -> Self {
        Self::new(field, FilterType::Text, FilterOperator::Blank, Value::Null)
    }
}

/// Filter entries, ANDed together.
pub type FilterModel = Vec<FilterItem>;
