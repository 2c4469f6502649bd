//! Default value comparison and stringification.

use std::cmp::Ordering;

use serde_json::Value;

/// Returns `true` for missing or JSON `null` values.
pub fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Interprets a value as a number.
///
/// Numbers convert directly; strings are parsed after trimming. Everything
/// else is not numeric.
pub fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Renders a value the way filters, the quick filter and exports see it.
///
/// `null` and missing values render as an empty string; strings render
/// without quotes; arrays and objects render as compact JSON.
pub fn to_display_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Default comparator used when a column has no custom comparator.
///
/// - null/missing sorts before every other value
/// - two numbers compare numerically
/// - two booleans compare `false < true`
/// - everything else compares as strings, case-insensitively first and then
///   by exact text so the order is total
pub fn default_compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (is_nullish(a), is_nullish(b)) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => {
            let x = to_display_string(a);
            let y = to_display_string(b);
            x.to_lowercase()
                .cmp(&y.to_lowercase())
                .then_with(|| x.cmp(&y))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_nulls_sort_first() {
        assert_eq!(default_compare(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(
            default_compare(Some(&json!("a")), Some(&Value::Null)),
            Ordering::Greater
        );
        assert_eq!(default_compare(None, Some(&Value::Null)), Ordering::Equal);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(
            default_compare(Some(&json!(10)), Some(&json!(9))),
            Ordering::Greater
        );
        assert_eq!(
            default_compare(Some(&json!(1.5)), Some(&json!(1.5))),
            Ordering::Equal
        );
    }

    #[test]
    fn test_strings_ignore_case_first() {
        assert_eq!(
            default_compare(Some(&json!("apple")), Some(&json!("Banana"))),
            Ordering::Less
        );
    }

    #[test]
    fn test_display_string() {
        assert_eq!(to_display_string(Some(&json!("x"))), "x");
        assert_eq!(to_display_string(Some(&json!(3))), "3");
        assert_eq!(to_display_string(None), "");
        assert_eq!(as_number(Some(&json!(" 4.5 "))), Some(4.5));
    }
}
