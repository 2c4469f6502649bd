//! Dotted-path access on JSON row objects.

use serde_json::Map;
use serde_json::Value;

/// Returns the value at a dotted path (`"address.city"`, `"tags.0"`).
///
/// Object segments are looked up by key, array segments by numeric index.
/// Returns `None` when any segment is missing.
///
/// # Example
///
/// ```
/// use datagrid_lib::value::get_path;
/// use serde_json::json;
///
/// let row = json!({ "address": { "city": "Ghent" } });
/// assert_eq!(get_path(&row, "address.city"), Some(&json!("Ghent")));
/// assert_eq!(get_path(&row, "address.zip"), None);
/// ```
pub fn get_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(data);
    }
    let mut current = data;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable variant of [`get_path`].
pub fn get_path_mut<'a>(data: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    if path.is_empty() {
        return Some(data);
    }
    let mut current = data;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Sets the value at a dotted path in place, creating intermediate objects.
///
/// A non-container value found along the path is replaced by an object.
pub fn set_path(data: &mut Value, path: &str, value: Value) {
    if path.is_empty() {
        *data = value;
        return;
    }
    let mut segments = path.split('.').peekable();
    let mut current = data;
    while let Some(segment) = segments.next() {
        let last = segments.peek().is_none();

        let array_index = match &*current {
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .filter(|index| *index < items.len()),
            _ => None,
        };
        if let Some(index) = array_index {
            let Value::Array(items) = current else {
                return;
            };
            if last {
                items[index] = value;
                return;
            }
            current = &mut items[index];
            continue;
        }

        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if last {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Returns a copy of `data` with `value` written at `path`.
///
/// The input is never mutated.
pub fn with_path(data: &Value, path: &str, value: Value) -> Value {
    let mut copy = data.clone();
    set_path(&mut copy, path, value);
    copy
}
