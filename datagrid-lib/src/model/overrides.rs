//! Uncommitted cell edits layered over raw row data.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde_json::Value;

use crate::value::set_path;

/// Pending edits keyed by row id, then field path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideMap {
    edits: HashMap<String, BTreeMap<String, Value>>,
}

impl OverrideMap {
    /// Creates an empty override map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no pending edits.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Number of rows with pending edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Records an edit.
    pub fn set(&mut self, row_id: impl Into<String>, field: impl Into<String>, value: Value) {
        self.edits
            .entry(row_id.into())
            .or_default()
            .insert(field.into(), value);
    }

    /// Returns the pending edit for a cell.
    pub fn get(&self, row_id: &str, field: &str) -> Option<&Value> {
        self.edits.get(row_id)?.get(field)
    }

    /// Returns all pending edits for a row.
    pub fn row(&self, row_id: &str) -> Option<&BTreeMap<String, Value>> {
        self.edits.get(row_id)
    }

    /// Returns `true` if the cell has a pending edit.
    pub fn is_dirty(&self, row_id: &str, field: &str) -> bool {
        self.get(row_id, field).is_some()
    }

    /// Clears one cell. Returns `true` if an edit was removed.
    pub fn reset_cell(&mut self, row_id: &str, field: &str) -> bool {
        let Some(row) = self.edits.get_mut(row_id) else {
            return false;
        };
        let removed = row.remove(field).is_some();
        if row.is_empty() {
            self.edits.remove(row_id);
        }
        removed
    }

    /// Clears every edit of a row. Returns `true` if anything was removed.
    pub fn reset_row(&mut self, row_id: &str) -> bool {
        self.edits.remove(row_id).is_some()
    }

    /// Clears everything. Returns `true` if anything was removed.
    pub fn clear(&mut self) -> bool {
        let had_edits = !self.edits.is_empty();
        self.edits.clear();
        had_edits
    }

    /// Drops edits for rows that are no longer present.
    pub fn retain_rows(&mut self, keep: impl Fn(&str) -> bool) {
        self.edits.retain(|row_id, _| keep(row_id));
    }

    /// Returns `data` with this row's edits applied, without touching `data`.
    pub fn apply(&self, row_id: &str, data: &Value) -> Value {
        match self.edits.get(row_id) {
            Some(fields) => {
                let mut copy = data.clone();
                for (field, value) in fields {
                    set_path(&mut copy, field, value.clone());
                }
                copy
            }
            None => data.clone(),
        }
    }

    /// Iterates `(row_id, field, value)` over every pending edit.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.edits.iter().flat_map(|(row_id, fields)| {
            fields
                .iter()
                .map(move |(field, value)| (row_id.as_str(), field.as_str(), value))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_apply_is_non_destructive() {
        let mut overrides = OverrideMap::new();
        overrides.set("1", "address.city", json!("Bruges"));
        let raw = json!({ "address": { "city": "Ghent" } });
        let applied = overrides.apply("1", &raw);
        assert_eq!(applied["address"]["city"], json!("Bruges"));
        assert_eq!(raw["address"]["city"], json!("Ghent"));
    }

    #[test]
    fn test_reset_cell_drops_empty_rows() {
        let mut overrides = OverrideMap::new();
        overrides.set("1", "v", json!(1));
        assert!(overrides.reset_cell("1", "v"));
        assert!(overrides.is_empty());
        assert!(!overrides.reset_cell("1", "v"));
    }
}
