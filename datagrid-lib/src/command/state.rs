//! Canonical grid state the executor mutates.

use std::collections::HashSet;

use serde_json::Value;

use crate::group::ExpandState;
use crate::group::GroupMode;
use crate::group::locate_in_tree;
use crate::model::RowNode;
use crate::pipeline::PipelineModel;
use crate::pipeline::display;
use crate::pipeline::process;
use crate::selection::SelectionMode;
use crate::value::get_path;
use crate::value::get_path_mut;

/// Where a row lives inside the raw data: a root index plus child indices
/// through the tree children field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLocation {
    pub root: usize,
    pub path: Vec<usize>,
}

/// Everything one grid owns long-term.
#[derive(Debug, Clone, Default)]
pub struct GridState {
    /// Current raw rows.
    pub raw: Vec<Value>,
    /// Rows as last set from outside; `reset_state` restores them.
    pub baseline: Vec<Value>,
    pub model: PipelineModel,
    pub selection_mode: SelectionMode,
}

impl GridState {
    /// Tree children field, when the grid is in parent/child mode.
    pub fn children_field(&self) -> Option<&str> {
        match &self.model.group_mode {
            GroupMode::Tree(field) => Some(field),
            _ => None,
        }
    }

    /// Finds a row by id among root rows and, in tree mode, their children.
    pub fn locate(&self, id: &str) -> Option<RowLocation> {
        match self.children_field() {
            Some(field) => locate_in_tree(&self.raw, &self.model.row_id, field, id)
                .map(|(root, path)| RowLocation { root, path }),
            None => self
                .raw
                .iter()
                .enumerate()
                .position(|(index, data)| self.model.row_id.resolve(data, index) == id)
                .map(|root| RowLocation {
                    root,
                    path: Vec::new(),
                }),
        }
    }

    /// Raw datum at a location.
    pub fn datum(&self, location: &RowLocation) -> Option<&Value> {
        let mut current = self.raw.get(location.root)?;
        for &index in &location.path {
            current = get_path(current, self.children_field()?)?.as_array()?.get(index)?;
        }
        Some(current)
    }

    /// Mutable raw datum at a location.
    pub fn datum_mut(&mut self, location: &RowLocation) -> Option<&mut Value> {
        let field = self.children_field().map(str::to_string);
        let mut current = self.raw.get_mut(location.root)?;
        for &index in &location.path {
            let field = field.as_deref()?;
            current = get_path_mut(current, field)?.as_array_mut()?.get_mut(index)?;
        }
        Some(current)
    }

    /// Returns `true` if a row with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    /// Every row id, including tree children.
    pub fn row_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        for (index, data) in self.raw.iter().enumerate() {
            let id = self.model.row_id.resolve(data, index);
            if let Some(field) = self.children_field() {
                self.collect_child_ids(data, &id, field, &mut ids);
            }
            ids.insert(id);
        }
        ids
    }

    fn collect_child_ids(&self, data: &Value, parent_id: &str, field: &str, ids: &mut HashSet<String>) {
        let Some(Value::Array(items)) = get_path(data, field) else {
            return;
        };
        for (index, item) in items.iter().enumerate() {
            let id = self.model.row_id.resolve_child(item, parent_id, index);
            self.collect_child_ids(item, &id, field, ids);
            ids.insert(id);
        }
    }

    /// The cell value a reader sees: the pending edit, else the raw value.
    pub fn effective_value(&self, id: &str, field: &str) -> Option<Value> {
        if let Some(edit) = self.model.overrides.get(id, field) {
            return Some(edit.clone());
        }
        let location = self.locate(id)?;
        get_path(self.datum(&location)?, field).cloned()
    }

    /// Every row after filter, sort and grouping (all pages).
    pub fn processed(&self) -> Vec<RowNode> {
        process(&self.raw, &self.model)
    }

    /// The current page.
    pub fn displayed(&self) -> Vec<RowNode> {
        display(&self.raw, &self.model)
    }

    /// Ids of every group header, collapsed or not.
    pub fn group_ids(&self) -> Vec<String> {
        if !matches!(self.model.group_mode, GroupMode::Fields(_)) {
            return Vec::new();
        }
        let mut model = self.model.clone();
        model.expand = ExpandState::new(true);
        process(&self.raw, &model)
            .into_iter()
            .filter(RowNode::is_group)
            .map(|row| row.id)
            .collect()
    }

    /// Ids of processed data rows in display order; the index space for
    /// shift-range selection.
    pub fn selectable_ids(&self) -> Vec<String> {
        self.processed()
            .into_iter()
            .filter(RowNode::is_data)
            .map(|row| row.id)
            .collect()
    }

    /// Re-derives the pagination row count. Server mode gets its totals from
    /// the server instead.
    pub fn sync_pagination(&mut self) {
        if !self.model.server_mode {
            let total = self.processed().len();
            self.model.pagination.set_total_rows(total);
        }
    }

    /// Drops edits and selections of rows that no longer exist.
    pub fn prune_orphans(&mut self) -> Vec<String> {
        let ids = self.row_ids();
        self.model.overrides.retain_rows(|id| ids.contains(id));
        self.model.selection.retain(|id| ids.contains(id)).removed
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::RowIdSource;

    fn tree_state() -> GridState {
        let mut state = GridState::default();
        state.model.group_mode = GroupMode::Tree("children".into());
        state.raw = vec![
            json!({ "name": "a" }),
            json!({ "name": "b", "children": [{ "name": "b1" }] }),
        ];
        state
    }

    #[test]
    fn test_locate_and_mutate_child() {
        let mut state = tree_state();
        let location = state.locate("row-1-0").unwrap();
        assert_eq!(location.path, vec![0]);
        state.datum_mut(&location).unwrap()["name"] = json!("B1");
        assert_eq!(state.raw[1]["children"][0]["name"], json!("B1"));
    }

    #[test]
    fn test_row_ids_include_children() {
        let state = tree_state();
        let ids = state.row_ids();
        assert!(ids.contains("row-1-0"));
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_effective_value_prefers_edit() {
        let mut state = GridState::default();
        state.model.row_id = RowIdSource::field("id");
        state.raw = vec![json!({ "id": "x", "v": 1 })];
        assert_eq!(state.effective_value("x", "v"), Some(json!(1)));
        state.model.overrides.set("x", "v", json!(2));
        assert_eq!(state.effective_value("x", "v"), Some(json!(2)));
    }
}
