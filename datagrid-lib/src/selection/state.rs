//! Selection state.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

/// Selection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Selection requests are ignored.
    None,
    /// At most one selected row.
    #[default]
    Single,
    /// Any number of rows, with shift ranges.
    Multiple,
}

/// Ids that entered and left the selection in one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SelectionDelta {
    /// Returns `true` if the selected set did not change.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Folds another delta into this one.
    pub fn merge(&mut self, other: SelectionDelta) {
        for id in other.added {
            if let Some(pos) = self.removed.iter().position(|r| *r == id) {
                self.removed.remove(pos);
            } else if !self.added.contains(&id) {
                self.added.push(id);
            }
        }
        for id in other.removed {
            if let Some(pos) = self.added.iter().position(|a| *a == id) {
                self.added.remove(pos);
            } else if !self.removed.contains(&id) {
                self.removed.push(id);
            }
        }
    }
}

/// Selected row ids plus range-selection bookkeeping.
///
/// `anchor_index` only moves on non-shift selections. Indices refer to the
/// displayed row order at the time of the action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_rows: HashSet<String>,
    pub last_selected_index: Option<usize>,
    pub anchor_index: Option<usize>,
}

impl SelectionState {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a row is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_rows.contains(id)
    }

    /// Selected ids, sorted for deterministic ordering.
    pub fn selected(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.selected_rows.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Selected ids in displayed order.
    pub fn selected_in_order(&self, displayed_ids: &[String]) -> Vec<String> {
        displayed_ids
            .iter()
            .filter(|id| self.selected_rows.contains(*id))
            .cloned()
            .collect()
    }

    /// Click selection.
    ///
    /// - `Single`: selecting replaces the set with `{id}`, deselecting
    ///   removes it
    /// - `Multiple` with `shift` and an anchor: applies `selected` to the
    ///   inclusive displayed range between anchor and target
    /// - `Multiple` otherwise (`ctrl` or plain): sets `id`'s membership and
    ///   moves the anchor to it
    /// - `None`: ignored
    pub fn select_row(
        &mut self,
        mode: SelectionMode,
        id: &str,
        selected: bool,
        shift: bool,
        ctrl: bool,
        displayed_ids: &[String],
    ) -> SelectionDelta {
        let index = displayed_ids.iter().position(|d| d == id);

        match mode {
            SelectionMode::None => SelectionDelta::default(),
            SelectionMode::Single => {
                let delta = if selected {
                    self.replace([id.to_string()].into_iter().collect())
                } else {
                    self.set_membership(id, false)
                };
                self.anchor_index = index;
                self.last_selected_index = index;
                delta
            }
            SelectionMode::Multiple => {
                if shift
                    && let Some(anchor) = self.anchor_index
                    && let Some(target) = index
                    && anchor < displayed_ids.len()
                {
                    let (start, end) = if anchor <= target { (anchor, target) } else { (target, anchor) };
                    let mut delta = SelectionDelta::default();
                    for row_id in &displayed_ids[start..=end] {
                        delta.merge(self.set_membership(row_id, selected));
                    }
                    self.last_selected_index = index;
                    return delta;
                }

                log::trace!("select_row {} (ctrl: {})", id, ctrl);
                let delta = self.set_membership(id, selected);
                self.anchor_index = index;
                self.last_selected_index = index;
                delta
            }
        }
    }

    /// Makes the selection exactly the displayed rows, dropping selected
    /// rows that are filtered out. Only valid in `Multiple` mode.
    pub fn select_all(&mut self, mode: SelectionMode, displayed_ids: &[String]) -> SelectionDelta {
        if mode != SelectionMode::Multiple {
            return SelectionDelta::default();
        }
        self.replace(displayed_ids.iter().cloned().collect())
    }

    /// Clears the selection in any mode.
    pub fn deselect_all(&mut self) -> SelectionDelta {
        let mut removed: Vec<_> = self.selected_rows.drain().collect();
        removed.sort();
        self.anchor_index = None;
        self.last_selected_index = None;
        SelectionDelta {
            added: Vec::new(),
            removed,
        }
    }

    /// Programmatic batch toggle, independent of shift/ctrl.
    ///
    /// In `Single` mode only the last id of a selecting batch is kept.
    pub fn select_rows(&mut self, mode: SelectionMode, ids: &[String], selected: bool) -> SelectionDelta {
        match mode {
            SelectionMode::None => SelectionDelta::default(),
            SelectionMode::Single if selected => match ids.last() {
                Some(last) => self.replace([last.clone()].into_iter().collect()),
                None => SelectionDelta::default(),
            },
            _ => {
                let mut delta = SelectionDelta::default();
                for id in ids {
                    delta.merge(self.set_membership(id, selected));
                }
                delta
            }
        }
    }

    /// Drops ids that are no longer in the row set.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) -> SelectionDelta {
        let mut removed: Vec<_> = self
            .selected_rows
            .iter()
            .filter(|id| !keep(id))
            .cloned()
            .collect();
        removed.sort();
        for id in &removed {
            self.selected_rows.remove(id);
        }
        SelectionDelta {
            added: Vec::new(),
            removed,
        }
    }

    fn set_membership(&mut self, id: &str, selected: bool) -> SelectionDelta {
        let mut delta = SelectionDelta::default();
        if selected {
            if self.selected_rows.insert(id.to_string()) {
                delta.added.push(id.to_string());
            }
        } else if self.selected_rows.remove(id) {
            delta.removed.push(id.to_string());
        }
        delta
    }

    fn replace(&mut self, next: HashSet<String>) -> SelectionDelta {
        let mut removed: Vec<_> = self.selected_rows.difference(&next).cloned().collect();
        let mut added: Vec<_> = next.difference(&self.selected_rows).cloned().collect();
        removed.sort();
        added.sort();
        if !added.is_empty() || !removed.is_empty() {
            self.selected_rows = next;
        }
        SelectionDelta { added, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("row-{}", i)).collect()
    }

    #[test]
    fn test_single_replaces() {
        let displayed = ids(3);
        let mut state = SelectionState::new();
        state.select_row(SelectionMode::Single, "row-0", true, false, false, &displayed);
        let delta = state.select_row(SelectionMode::Single, "row-2", true, false, false, &displayed);
        assert_eq!(delta.added, vec!["row-2"]);
        assert_eq!(delta.removed, vec!["row-0"]);
        assert_eq!(state.selected(), vec!["row-2"]);
    }

    #[test]
    fn test_shift_range_keeps_anchor() {
        let displayed = ids(6);
        let mut state = SelectionState::new();
        state.select_row(SelectionMode::Multiple, "row-4", true, false, false, &displayed);
        state.select_row(SelectionMode::Multiple, "row-1", true, true, false, &displayed);
        assert_eq!(state.selected(), vec!["row-1", "row-2", "row-3", "row-4"]);
        assert_eq!(state.anchor_index, Some(4));
        assert_eq!(state.last_selected_index, Some(1));
    }

    #[test]
    fn test_round_trip_restores_set() {
        let displayed = ids(3);
        let mut state = SelectionState::new();
        state.select_row(SelectionMode::Multiple, "row-0", true, false, false, &displayed);
        let before = state.selected();
        state.select_row(SelectionMode::Multiple, "row-1", true, false, true, &displayed);
        state.select_row(SelectionMode::Multiple, "row-1", false, false, true, &displayed);
        assert_eq!(state.selected(), before);
    }

    #[test]
    fn test_noop_yields_empty_delta() {
        let displayed = ids(2);
        let mut state = SelectionState::new();
        state.select_row(SelectionMode::Multiple, "row-0", true, false, false, &displayed);
        let delta = state.select_row(SelectionMode::Multiple, "row-0", true, false, false, &displayed);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_none_mode_ignores_everything() {
        let displayed = ids(2);
        let mut state = SelectionState::new();
        assert!(state.select_row(SelectionMode::None, "row-0", true, false, false, &displayed).is_empty());
        assert!(state.select_rows(SelectionMode::None, &displayed, true).is_empty());
        assert!(state.selected_rows.is_empty());
    }

    #[test]
    fn test_select_all_then_deselect_all() {
        let displayed = ids(4);
        let mut state = SelectionState::new();
        assert!(state.select_all(SelectionMode::Single, &displayed).is_empty());
        assert_eq!(state.select_all(SelectionMode::Multiple, &displayed).added.len(), 4);
        assert_eq!(state.deselect_all().removed.len(), 4);
        assert!(state.selected_rows.is_empty());
    }

    #[test]
    fn test_select_all_drops_hidden_selection() {
        let mut state = SelectionState::new();
        state.select_rows(SelectionMode::Multiple, &["hidden".to_string(), "row-0".to_string()], true);

        let delta = state.select_all(SelectionMode::Multiple, &ids(2));
        assert_eq!(delta.added, vec!["row-1"]);
        assert_eq!(delta.removed, vec!["hidden"]);
        let mut selected: Vec<_> = state.selected_rows.iter().cloned().collect();
        selected.sort();
        assert_eq!(selected, ids(2));
    }

    #[test]
    fn test_delta_merge_cancels() {
        let mut delta = SelectionDelta {
            added: vec!["a".into()],
            removed: vec![],
        };
        delta.merge(SelectionDelta {
            added: vec![],
            removed: vec!["a".into()],
        });
        assert!(delta.is_empty());
    }
}
