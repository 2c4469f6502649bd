//! Deep equality, deep merge and field diffing.

use serde_json::Value;

use super::get_path;

/// Structural equality that treats `1` and `1.0` as equal.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Merges `patch` into `target`.
///
/// Objects merge key by key, recursively. Any other patch value replaces the
/// target value outright.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_object() && patch_value.is_object() => {
                        deep_merge(existing, patch_value);
                    }
                    _ => {
                        target_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// A single leaf field that differs between a row and a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDiff {
    /// Dotted path of the field.
    pub field: String,
    /// Value before the patch (`None` if the field did not exist).
    pub old: Option<Value>,
    /// Value the patch writes.
    pub new: Value,
}

/// Lists every leaf field of `patch` whose value differs from `current`.
///
/// Nested patch objects are walked so that `{"a": {"b": 1}}` reports the
/// path `a.b`.
pub fn diff_fields(current: &Value, patch: &Value) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    collect_diffs(current, patch, String::new(), &mut diffs);
    diffs
}

fn collect_diffs(current: &Value, patch: &Value, prefix: String, out: &mut Vec<FieldDiff>) {
    let Value::Object(patch_map) = patch else {
        let old = get_path(current, &prefix);
        if !old.is_some_and(|old| deep_equal(old, patch)) {
            out.push(FieldDiff {
                field: prefix,
                old: old.cloned(),
                new: patch.clone(),
            });
        }
        return;
    };

    for (key, value) in patch_map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let existing_is_object = get_path(current, &path).is_some_and(Value::is_object);
        if value.is_object() && existing_is_object {
            collect_diffs(current, value, path, out);
        } else {
            let old = get_path(current, &path);
            if !old.is_some_and(|old| deep_equal(old, value)) {
                out.push(FieldDiff {
                    field: path,
                    old: old.cloned(),
                    new: value.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deep_equal_numbers() {
        assert!(deep_equal(&json!({"a": [1]}), &json!({"a": [1.0]})));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_deep_merge_nested() {
        let mut row = json!({ "id": "1", "address": { "city": "Ghent", "zip": "9000" } });
        deep_merge(&mut row, &json!({ "address": { "city": "Bruges" }, "name": "N" }));
        assert_eq!(
            row,
            json!({ "id": "1", "name": "N", "address": { "city": "Bruges", "zip": "9000" } })
        );
    }

    #[test]
    fn test_diff_fields_reports_only_changes() {
        let row = json!({ "id": "1", "v": 1, "address": { "city": "Ghent" } });
        let diffs = diff_fields(&row, &json!({ "id": "1", "v": 2, "address": { "city": "Ghent" } }));
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "v");
        assert_eq!(diffs[0].old, Some(json!(1)));
        assert_eq!(diffs[0].new, json!(2));
    }

    #[test]
    fn test_diff_fields_new_field() {
        let diffs = diff_fields(&json!({ "id": "x" }), &json!({ "name": "Y" }));
        assert_eq!(diffs[0].field, "name");
        assert_eq!(diffs[0].old, None);
    }
}
