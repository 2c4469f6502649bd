//! Expand/collapse state and flattening.

use std::collections::HashSet;

use crate::model::RowKind;
use crate::model::RowNode;

/// Expand state for group headers and tree parents.
///
/// Groups and tree rows are tracked separately. When `groups` is empty and
/// `groups_by_default` is set, every group counts as expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandState {
    pub groups: HashSet<String>,
    pub rows: HashSet<String>,
    pub groups_by_default: bool,
}

impl Default for ExpandState {
    fn default() -> Self {
        Self {
            groups: HashSet::new(),
            rows: HashSet::new(),
            groups_by_default: true,
        }
    }
}

impl ExpandState {
    /// Creates an empty expand state.
    pub fn new(groups_by_default: bool) -> Self {
        Self {
            groups_by_default,
            ..Default::default()
        }
    }

    /// Whether a group header shows its children.
    pub fn is_group_expanded(&self, group_id: &str) -> bool {
        if self.groups.is_empty() {
            return self.groups_by_default;
        }
        self.groups.contains(group_id)
    }

    /// Whether a tree parent shows its children.
    pub fn is_row_expanded(&self, row_id: &str) -> bool {
        self.rows.contains(row_id)
    }

    /// Sets a group's expand state. Returns `true` if it changed.
    ///
    /// Collapsing one group while all groups are implicitly expanded first
    /// materializes the implicit set from `all_group_ids`.
    pub fn set_group_expanded(&mut self, group_id: &str, expanded: bool, all_group_ids: &[String]) -> bool {
        if self.is_group_expanded(group_id) == expanded {
            return false;
        }
        if !expanded && self.groups.is_empty() && self.groups_by_default {
            self.groups.extend(all_group_ids.iter().cloned());
        }
        if expanded {
            self.groups.insert(group_id.to_string());
        } else {
            self.groups.remove(group_id);
        }
        true
    }

    /// Sets a tree row's expand state. Returns `true` if it changed.
    pub fn set_row_expanded(&mut self, row_id: &str, expanded: bool) -> bool {
        if expanded {
            self.rows.insert(row_id.to_string())
        } else {
            self.rows.remove(row_id)
        }
    }
}

/// Flattens group and tree nodes pre-order into a display list.
///
/// Group headers and tree parents are always emitted; their children only
/// when expanded. `row_index` is renumbered over the result.
pub fn flatten(nodes: Vec<RowNode>, expand: &ExpandState) -> Vec<RowNode> {
    let mut out = Vec::with_capacity(nodes.len());
    flatten_into(nodes, expand, 0, &mut out);
    for (index, row) in out.iter_mut().enumerate() {
        row.row_index = index;
    }
    out
}

fn flatten_into(nodes: Vec<RowNode>, expand: &ExpandState, level: usize, out: &mut Vec<RowNode>) {
    for mut node in nodes {
        match &node.kind {
            RowKind::Group(group) => {
                let expanded = expand.is_group_expanded(&node.id);
                let children = expanded.then(|| group.group_children.clone());
                node.expanded = Some(expanded);
                node.level = Some(level);
                out.push(node);
                if let Some(children) = children {
                    flatten_into(children, expand, level + 1, out);
                }
            }
            RowKind::Data if !node.children.is_empty() => {
                let expanded = expand.is_row_expanded(&node.id);
                let children = expanded.then(|| node.children.clone());
                node.expanded = Some(expanded);
                node.level = Some(level);
                out.push(node);
                if let Some(children) = children {
                    flatten_into(children, expand, level + 1, out);
                }
            }
            _ => {
                if level > 0 || node.level.is_some() {
                    node.level = Some(level);
                }
                out.push(node);
            }
        }
    }
}

/// Collects the ids of every group node in a (pre-flatten) tree.
pub fn collect_group_ids(nodes: &[RowNode]) -> Vec<String> {
    let mut ids = Vec::new();
    for node in nodes {
        if let RowKind::Group(group) = &node.kind {
            ids.push(node.id.clone());
            ids.extend(collect_group_ids(&group.group_children));
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_expands_everything_by_default() {
        let state = ExpandState::default();
        assert!(state.is_group_expanded("group:a=1"));
        let state = ExpandState::new(false);
        assert!(!state.is_group_expanded("group:a=1"));
    }

    #[test]
    fn test_collapse_materializes_implicit_set() {
        let mut state = ExpandState::default();
        let all = vec!["g1".to_string(), "g2".to_string()];
        assert!(state.set_group_expanded("g1", false, &all));
        assert!(!state.is_group_expanded("g1"));
        assert!(state.is_group_expanded("g2"));
        assert!(!state.set_group_expanded("g2", true, &all));
    }

    #[test]
    fn test_rows_collapsed_by_default() {
        let mut state = ExpandState::default();
        assert!(!state.is_row_expanded("row-0"));
        assert!(state.set_row_expanded("row-0", true));
        assert!(!state.set_row_expanded("row-0", true));
    }
}
