//! Filter stage.

use chrono::DateTime;
use chrono::NaiveDate;
use serde_json::Value;

use crate::model::ColumnDef;
use crate::model::FilterItem;
use crate::model::FilterOperator;
use crate::model::FilterType;
use crate::model::RowNode;
use crate::model::find_column;
use crate::value::as_number;
use crate::value::deep_equal;
use crate::value::is_nullish;
use crate::value::to_display_string;

/// Keeps rows passing every filter entry and the quick filter.
///
/// An entry on a column with a `filter_comparator` uses it; every other
/// entry uses [`matches_filter`]. The quick filter (ignored when blank)
/// passes a row if any visible column's formatted value contains the text,
/// case-insensitively. `row_index` is renumbered.
pub fn filter_rows(rows: Vec<RowNode>, filter_model: &[FilterItem], quick_filter: &str, columns: &[ColumnDef]) -> Vec<RowNode> {
    let quick = quick_filter.trim().to_lowercase();
    if filter_model.is_empty() && quick.is_empty() {
        return rows;
    }

    let mut out: Vec<RowNode> = rows
        .into_iter()
        .filter(|row| row_passes(row, filter_model, columns) && passes_quick_filter(row, &quick, columns))
        .collect();
    for (index, row) in out.iter_mut().enumerate() {
        row.row_index = index;
    }
    out
}

/// Whether a row satisfies every entry of a filter model.
pub fn row_passes(row: &RowNode, filter_model: &[FilterItem], columns: &[ColumnDef]) -> bool {
    filter_model.iter().all(|item| {
        let value = row.get(&item.field);
        match find_column(columns, &item.field).and_then(|c| c.filter_comparator.as_ref()) {
            Some(comparator) => comparator.matches(value, item),
            None => matches_filter(value, item),
        }
    })
}

fn passes_quick_filter(row: &RowNode, quick: &str, columns: &[ColumnDef]) -> bool {
    if quick.is_empty() {
        return true;
    }
    let visible: Vec<&ColumnDef> = columns.iter().filter(|c| !c.hidden).collect();
    if visible.is_empty() {
        return match &row.data {
            Value::Object(map) => map
                .values()
                .any(|v| to_display_string(Some(v)).to_lowercase().contains(quick)),
            other => to_display_string(Some(other)).to_lowercase().contains(quick),
        };
    }
    visible
        .iter()
        .any(|column| column.format_value(&row.data).to_lowercase().contains(quick))
}

/// Default filter predicate for one entry.
///
/// - [`FilterType::Select`]: the value must be in the array; an empty array
///   lets nothing through
/// - `blank` / `notBlank` test for null, missing or whitespace-only values
/// - an entry with a `null` filter value is inactive
/// - text operators compare display strings (`equals` exactly, the rest
///   case-insensitively)
/// - ordering operators compare numbers, or timestamps for
///   [`FilterType::Date`]; non-comparable values fail
pub fn matches_filter(value: Option<&Value>, filter: &FilterItem) -> bool {
    if filter.filter_type == FilterType::Select {
        return matches_select(value, &filter.value);
    }

    match filter.operator {
        FilterOperator::Blank => return is_blank(value),
        FilterOperator::NotBlank => return !is_blank(value),
        _ => {}
    }

    if filter.value.is_null() {
        return true;
    }

    match filter.filter_type {
        FilterType::Boolean => matches_boolean(value, filter),
        FilterType::Number | FilterType::Date => matches_ordered(value, filter),
        FilterType::Text | FilterType::Select => matches_text(value, filter),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    is_nullish(value) || to_display_string(value).trim().is_empty()
}

fn matches_select(value: Option<&Value>, allowed: &Value) -> bool {
    match allowed {
        Value::Null => true,
        Value::Array(items) => {
            let text = to_display_string(value);
            items.iter().any(|item| match value {
                Some(v) if deep_equal(v, item) => true,
                _ => to_display_string(Some(item)) == text,
            })
        }
        single => to_display_string(Some(single)) == to_display_string(value),
    }
}

fn matches_boolean(value: Option<&Value>, filter: &FilterItem) -> bool {
    let equal = as_bool(value) == as_bool(Some(&filter.value));
    match filter.operator {
        FilterOperator::NotEqual => !equal,
        _ => equal,
    }
}

fn as_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

fn matches_text(value: Option<&Value>, filter: &FilterItem) -> bool {
    let text = to_display_string(value);
    let needle = to_display_string(Some(&filter.value));
    let lower = || (text.to_lowercase(), needle.to_lowercase());

    match filter.operator {
        FilterOperator::Equals => text == needle,
        FilterOperator::NotEqual => text != needle,
        FilterOperator::Contains => {
            let (text, needle) = lower();
            text.contains(&needle)
        }
        FilterOperator::NotContains => {
            let (text, needle) = lower();
            !text.contains(&needle)
        }
        FilterOperator::StartsWith => {
            let (text, needle) = lower();
            text.starts_with(&needle)
        }
        FilterOperator::EndsWith => {
            let (text, needle) = lower();
            text.ends_with(&needle)
        }
        _ => matches_ordered(value, filter),
    }
}

fn matches_ordered(value: Option<&Value>, filter: &FilterItem) -> bool {
    let as_text = || {
        let text_filter = FilterItem {
            filter_type: FilterType::Text,
            ..filter.clone()
        };
        matches_text(value, &text_filter)
    };
    if matches!(
        filter.operator,
        FilterOperator::Contains | FilterOperator::NotContains | FilterOperator::StartsWith | FilterOperator::EndsWith
    ) {
        return as_text();
    }

    let operand = |v: Option<&Value>| match filter.filter_type {
        FilterType::Date => as_timestamp(v),
        _ => as_number(v),
    };

    if filter.operator == FilterOperator::Between {
        let Value::Array(bounds) = &filter.value else {
            log::warn!("between filter on '{}' needs a 2-element array", filter.field);
            return true;
        };
        let (Some(low), Some(high)) = (operand(bounds.first()), operand(bounds.get(1))) else {
            return true;
        };
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        return operand(value).is_some_and(|v| v >= low && v <= high);
    }

    let (Some(actual), Some(target)) = (operand(value), operand(Some(&filter.value))) else {
        return match filter.operator {
            FilterOperator::Equals | FilterOperator::NotEqual => as_text(),
            _ => false,
        };
    };

    match filter.operator {
        FilterOperator::Equals => actual == target,
        FilterOperator::NotEqual => actual != target,
        FilterOperator::GreaterThan => actual > target,
        FilterOperator::GreaterThanOrEqual => actual >= target,
        FilterOperator::LessThan => actual < target,
        FilterOperator::LessThanOrEqual => actual <= target,
        _ => false,
    }
}

/// Interprets a value as epoch milliseconds.
///
/// Accepts numbers (already milliseconds), RFC 3339 timestamps and
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn as_timestamp(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.timestamp_millis() as f64);
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
            Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows() -> Vec<RowNode> {
        vec![
            RowNode::data("1", json!({ "name": "Alpha", "n": 5, "status": "open", "on": "2024-01-10" }), 0),
            RowNode::data("2", json!({ "name": "beta", "n": 15, "status": "closed", "on": "2024-03-01" }), 1),
            RowNode::data("3", json!({ "name": "Gamma", "n": null, "status": "open", "on": "2023-12-31T23:00:00Z" }), 2),
        ]
    }

    fn ids(rows: &[RowNode]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_empty_select_passes_nothing() {
        let filter = vec![FilterItem::select("status", Vec::<String>::new())];
        assert!(filter_rows(rows(), &filter, "", &[]).is_empty());
    }

    #[test]
    fn test_select_membership() {
        let filter = vec![FilterItem::select("status", ["closed"])];
        assert_eq!(ids(&filter_rows(rows(), &filter, "", &[])), vec!["2"]);
    }

    #[test]
    fn test_text_operators_ignore_case() {
        let filter = vec![FilterItem::contains("name", "A")];
        assert_eq!(ids(&filter_rows(rows(), &filter, "", &[])), vec!["1", "2", "3"]);
        let filter = vec![FilterItem::starts_with("name", "ALP")];
        assert_eq!(ids(&filter_rows(rows(), &filter, "", &[])), vec!["1"]);
        let filter = vec![FilterItem::equals("name", "alpha")];
        assert!(filter_rows(rows(), &filter, "", &[]).is_empty());
    }

    #[test]
    fn test_numeric_operators_skip_non_numbers() {
        let filter = vec![FilterItem::greater_than("n", 4)];
        assert_eq!(ids(&filter_rows(rows(), &filter, "", &[])), vec!["1", "2"]);
        let filter = vec![FilterItem::between("n", 10, 20)];
        let out = filter_rows(rows(), &filter, "", &[]);
        assert_eq!(ids(&out), vec!["2"]);
        assert_eq!(out[0].row_index, 0);
    }

    #[test]
    fn test_date_filter() {
        let filter = vec![FilterItem::new(
            "on",
            FilterType::Date,
            FilterOperator::LessThan,
            "2024-01-01",
        )];
        assert_eq!(ids(&filter_rows(rows(), &filter, "", &[])), vec!["3"]);
    }

    #[test]
    fn test_blank_operators() {
        let filter = vec![FilterItem::blank("n")];
        assert_eq!(ids(&filter_rows(rows(), &filter, "", &[])), vec!["3"]);
    }

    #[test]
    fn test_adding_filters_never_grows_result() {
        let one = vec![FilterItem::equals("status", "open")];
        let two = vec![FilterItem::equals("status", "open"), FilterItem::greater_than("n", 1)];
        let a = filter_rows(rows(), &one, "", &[]).len();
        let b = filter_rows(rows(), &two, "", &[]).len();
        assert!(b <= a);
        assert_eq!(filter_rows(rows(), &[], "", &[]).len(), 3);
    }

    #[test]
    fn test_quick_filter_uses_visible_columns() {
        let columns = vec![ColumnDef::new("name"), ColumnDef::new("status").hidden()];
        assert_eq!(ids(&filter_rows(rows(), &[], "GAM", &columns)), vec!["3"]);
        assert!(filter_rows(rows(), &[], "closed", &columns).is_empty());
    }

    #[test]
    fn test_column_filter_comparator_wins() {
        let columns = vec![ColumnDef::new("n").filter_comparator(|v, _| v.is_some_and(Value::is_null))];
        let filter = vec![FilterItem::greater_than("n", 100)];
        assert_eq!(ids(&filter_rows(rows(), &filter, "", &columns)), vec!["3"]);
    }
}
