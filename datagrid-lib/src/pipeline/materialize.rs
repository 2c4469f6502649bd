//! Materialize stage.

use std::collections::HashSet;

use serde_json::Value;

use crate::model::OverrideMap;
use crate::model::RowIdSource;
use crate::model::RowNode;

/// Turns raw data into [`RowNode`]s: id, overrides, selection flag.
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    pub row_id: &'a RowIdSource,
    pub overrides: &'a OverrideMap,
    pub selection: &'a HashSet<String>,
}

impl<'a> Materializer<'a> {
    pub fn new(row_id: &'a RowIdSource, overrides: &'a OverrideMap, selection: &'a HashSet<String>) -> Self {
        Self {
            row_id,
            overrides,
            selection,
        }
    }

    /// Materializes one datum under a known id. `data` is never mutated.
    pub fn materialize(&self, id: String, data: &Value, index: usize) -> RowNode {
        let data = self.overrides.apply(&id, data);
        let selected = self.selection.contains(&id);
        let mut node = RowNode::data(id, data, index);
        node.selected = selected;
        node
    }
}

/// Materializes every raw row, `row_index = i`.
pub fn apply_overrides(raw: &[Value], materializer: &Materializer<'_>) -> Vec<RowNode> {
    raw.iter()
        .enumerate()
        .map(|(index, data)| {
            let id = materializer.row_id.resolve(data, index);
            materializer.materialize(id, data, index)
        })
        .collect()
}
