//! Batch executor.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;

use super::Command;
use super::FilterOp;
use super::GridState;
use super::RowLocation;
use super::SelectionOp;
use super::SortOp;
use super::UpdateBatch;
use crate::error::GridError;
use crate::event::CellValueChangedEvent;
use crate::event::FilterChangedEvent;
use crate::event::GridEvent;
use crate::event::PaginationChangedEvent;
use crate::event::RowDataChangedEvent;
use crate::event::SelectionChangedEvent;
use crate::event::SortChangedEvent;
use crate::model::FilterModel;
use crate::model::PaginationState;
use crate::model::SortModel;
use crate::value::deep_equal;
use crate::value::deep_merge;
use crate::value::diff_fields;
use crate::value::get_path;
use crate::value::get_path_mut;
use crate::value::set_path;

/// Outcome of one `execute()`.
#[derive(Debug, Default)]
pub struct ExecuteReport {
    /// Events produced by the commit, in dispatch order.
    pub events: Vec<GridEvent>,
    /// Commands that were dropped, with the reason.
    pub dropped: Vec<GridError>,
}

impl ExecuteReport {
    /// Returns `true` if the commit changed anything observable.
    pub fn changed(&self) -> bool {
        !self.events.is_empty()
    }

    /// Returns `true` if no command was dropped.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// State the change events are diffed against.
struct Before {
    filter_model: FilterModel,
    quick_filter: String,
    sort_model: SortModel,
    pagination: PaginationState,
    selected: Vec<String>,
}

impl Before {
    fn of(state: &GridState) -> Self {
        Self {
            filter_model: state.model.filter_model.clone(),
            quick_filter: state.model.quick_filter.clone(),
            sort_model: state.model.sort_model.clone(),
            pagination: state.model.pagination,
            selected: state.model.selection.selected(),
        }
    }

    fn filters_changed(&self, state: &GridState) -> bool {
        self.filter_model != state.model.filter_model || self.quick_filter != state.model.quick_filter
    }
}

#[derive(Default)]
struct RowChanges {
    added: Vec<String>,
    updated: Vec<String>,
    removed: Vec<String>,
}

impl RowChanges {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    fn touch(list: &mut Vec<String>, id: &str) {
        if !list.iter().any(|existing| existing == id) {
            list.push(id.to_string());
        }
    }
}

struct Execution<'a> {
    state: &'a mut GridState,
    cell_events: Vec<CellValueChangedEvent>,
    rows: RowChanges,
    dropped: Vec<GridError>,
}

/// Applies a batch to grid state in one pass.
///
/// Commands run in a fixed phase order regardless of call order:
///
/// 1. whole-state reset
/// 2. edit, cell and row resets
/// 3. filter changes (call order), then the quick filter
/// 4. sort changes (call order)
/// 5. page size, page
/// 6. selection
/// 7. row reconciliation: a wholesale replacement (`replaceAll`,
///    `updateRowData`) wins over the baseline restore of a reset, which
///    wins over incremental changes (add, upAdd, update, updateCell,
///    setSelectionData, split, remove)
///
/// Malformed or unresolvable commands are logged and dropped; the rest of
/// the batch still applies. `cellValueChanged` events carry the value from
/// before the merge. The returned events have not been dispatched yet.
pub fn execute_batch(batch: UpdateBatch, state: &mut GridState) -> ExecuteReport {
    let (commands, rejected) = batch.into_ordered();
    let before = Before::of(state);
    let command_count = commands.len();

    let mut execution = Execution {
        state,
        cell_events: Vec::new(),
        rows: RowChanges::default(),
        dropped: rejected,
    };

    let (state_commands, row_commands): (Vec<Command>, Vec<Command>) =
        commands.into_iter().partition(|c| !c.is_row_command());

    let mut reset_requested = false;
    let mut paging_prepared = false;
    let mut selectable: Option<Vec<String>> = None;

    for command in state_commands {
        if command.phase() >= 5 && !paging_prepared {
            execution.prepare_paging(&before);
            paging_prepared = true;
        }
        match command {
            Command::ResetState => {
                execution.reset_state();
                reset_requested = true;
            }
            Command::ResetEdits => {
                execution.state.model.overrides.clear();
            }
            Command::ResetCell { row_id, field } => execution.reset_cell(&row_id, &field),
            Command::ResetRow { row_id } => execution.reset_row(&row_id),
            Command::Filter(op) => execution.apply_filter_op(op),
            Command::QuickFilter(text) => execution.state.model.quick_filter = text,
            Command::Sort(op) => execution.apply_sort_op(op),
            Command::SetPageSize(size) => execution.state.model.pagination.set_page_size(size),
            Command::SetPage(page) => execution.state.model.pagination.set_page(page),
            Command::Selection(op) => {
                if selectable.is_none() {
                    selectable = Some(execution.state.selectable_ids());
                }
                execution.apply_selection_op(op, selectable.as_deref().unwrap_or(&[]));
            }
            other => log::debug!("unexpected state-phase command {}", other.name()),
        }
    }
    if !paging_prepared {
        execution.prepare_paging(&before);
    }

    execution.reconcile_rows(row_commands, reset_requested);

    let Execution {
        state,
        cell_events,
        rows,
        dropped,
    } = execution;

    let deselected = state.prune_orphans();
    if !deselected.is_empty() {
        log::debug!("dropped {} selection(s) of removed rows", deselected.len());
    }
    state.sync_pagination();

    let events = collect_events(&before, state, cell_events, rows);
    log::debug!(
        "executed {} command(s): {} event(s), {} dropped",
        command_count,
        events.len(),
        dropped.len()
    );
    ExecuteReport { events, dropped }
}

fn collect_events(
    before: &Before,
    state: &GridState,
    cell_events: Vec<CellValueChangedEvent>,
    rows: RowChanges,
) -> Vec<GridEvent> {
    let mut events: Vec<GridEvent> = cell_events.into_iter().map(GridEvent::CellValueChanged).collect();

    if !rows.is_empty() {
        events.push(GridEvent::RowDataChanged(RowDataChangedEvent {
            added: rows.added,
            updated: rows.updated,
            removed: rows.removed,
            total_rows: state.raw.len(),
        }));
    }
    if before.filters_changed(state) {
        events.push(GridEvent::FilterChanged(FilterChangedEvent {
            old: before.filter_model.clone(),
            actual: state.model.filter_model.clone(),
            old_quick_filter: before.quick_filter.clone(),
            quick_filter: state.model.quick_filter.clone(),
        }));
    }
    if before.sort_model != state.model.sort_model {
        events.push(GridEvent::SortChanged(SortChangedEvent {
            old: before.sort_model.clone(),
            actual: state.model.sort_model.clone(),
        }));
    }
    if before.pagination != state.model.pagination {
        events.push(GridEvent::PaginationChanged(PaginationChangedEvent {
            old: before.pagination,
            actual: state.model.pagination,
        }));
    }

    let selected = state.model.selection.selected();
    if before.selected != selected {
        events.push(GridEvent::SelectionChanged(selection_event(&before.selected, selected, state)));
    }
    events
}

/// Builds a `selectionChanged` payload from the previous selected ids.
pub fn selection_event(old: &[String], actual: Vec<String>, state: &GridState) -> SelectionChangedEvent {
    let added = actual.iter().filter(|id| !old.contains(id)).cloned().collect();
    let removed = old.iter().filter(|id| !actual.contains(id)).cloned().collect();
    let rows = state
        .processed()
        .into_iter()
        .filter(|row| row.is_data() && row.selected)
        .collect();
    SelectionChangedEvent {
        old: old.to_vec(),
        actual,
        added,
        removed,
        rows,
    }
}

impl Execution<'_> {
    fn drop_command(&mut self, error: GridError) {
        log::warn!("{}", error);
        self.dropped.push(error);
    }

    // -------------------------------------------------------------------------
    // State phases
    // -------------------------------------------------------------------------

    fn reset_state(&mut self) {
        let model = &mut self.state.model;
        model.filter_model.clear();
        model.quick_filter.clear();
        model.sort_model.clear();
        model.pagination.set_page(0);
        model.selection.deselect_all();
        model.overrides.clear();
    }

    fn reset_cell(&mut self, row_id: &str, field: &str) {
        if !self.state.contains(row_id) {
            self.drop_command(GridError::row_not_found(row_id));
            return;
        }
        self.state.model.overrides.reset_cell(row_id, field);
    }

    fn reset_row(&mut self, row_id: &str) {
        if !self.state.contains(row_id) {
            self.drop_command(GridError::row_not_found(row_id));
            return;
        }
        self.state.model.overrides.reset_row(row_id);
    }

    fn apply_filter_op(&mut self, op: FilterOp) {
        let current = std::mem::take(&mut self.state.model.filter_model);
        self.state.model.filter_model = match op {
            FilterOp::Set(model) => model,
            FilterOp::Remove(field) => current.into_iter().filter(|item| item.field != field).collect(),
            FilterOp::RemoveAll => Vec::new(),
            FilterOp::Transform(transform) => transform(current),
        };
    }

    fn apply_sort_op(&mut self, op: SortOp) {
        let current = std::mem::take(&mut self.state.model.sort_model);
        self.state.model.sort_model = match op {
            SortOp::Set(model) => model,
            SortOp::Remove(field) => current.into_iter().filter(|item| item.field != field).collect(),
            SortOp::Transform(transform) => transform(current),
        };
    }

    /// Filter changes send the grid back to the first page; totals are
    /// re-derived so explicit page requests clamp against the new count.
    fn prepare_paging(&mut self, before: &Before) {
        if before.filters_changed(self.state) {
            self.state.model.pagination.set_page(0);
        }
        self.state.sync_pagination();
    }

    fn apply_selection_op(&mut self, op: SelectionOp, displayed: &[String]) {
        let mode = self.state.selection_mode;
        let selection = &mut self.state.model.selection;
        let delta = match op {
            SelectionOp::SelectRow {
                id,
                selected,
                shift,
                ctrl,
            } => selection.select_row(mode, &id, selected, shift, ctrl, displayed),
            SelectionOp::SelectRows { ids, selected } => selection.select_rows(mode, &ids, selected),
            SelectionOp::SelectAll => selection.select_all(mode, displayed),
            SelectionOp::DeselectAll => selection.deselect_all(),
        };
        log::trace!("selection: +{:?} -{:?}", delta.added, delta.removed);
    }

    // -------------------------------------------------------------------------
    // Row reconciliation
    // -------------------------------------------------------------------------

    fn reconcile_rows(&mut self, commands: Vec<Command>, reset_requested: bool) {
        let wholesale = commands
            .iter()
            .any(|c| matches!(c, Command::UpdateRowData(_) | Command::ReplaceAll { .. }));

        if !wholesale && reset_requested && self.state.raw != self.state.baseline {
            let old_ids = self.root_ids();
            self.state.raw = self.state.baseline.clone();
            self.record_replacement(&old_ids);
        }

        for command in commands {
            let superseded = match &command {
                Command::UpdateRowData(_) | Command::ReplaceAll { .. } => false,
                _ => wholesale || reset_requested,
            };
            if superseded {
                let by = if wholesale { "a wholesale row replacement" } else { "resetState" };
                self.drop_command(GridError::malformed(command.name(), format!("superseded by {}", by)));
                continue;
            }

            match command {
                Command::UpdateRowData(rows) => self.replace_rows(rows, None, false),
                Command::ReplaceAll { rows, merge_key } => self.replace_rows(rows, merge_key.as_deref(), true),
                Command::Add(rows) => self.add_rows(rows),
                Command::UpAdd(rows) => self.up_add_rows(rows),
                Command::Update(rows) => self.update_rows(rows),
                Command::UpdateCell { row_id, field, value } => self.update_cell(&row_id, &field, value),
                Command::SetSelectionData(patch) => self.set_selection_data(&patch),
                Command::Split { row_id, as_child } => self.split_row(&row_id, as_child),
                Command::Remove(ids) => self.remove_rows(&ids),
                other => log::debug!("unexpected row-phase command {}", other.name()),
            }
        }
    }

    fn root_ids(&self) -> Vec<String> {
        let row_id = &self.state.model.row_id;
        self.state
            .raw
            .iter()
            .enumerate()
            .map(|(index, data)| row_id.resolve(data, index))
            .collect()
    }

    fn record_replacement(&mut self, old_ids: &[String]) {
        let new_ids = self.root_ids();
        let old: HashSet<&String> = old_ids.iter().collect();
        let new: HashSet<&String> = new_ids.iter().collect();
        for id in &new_ids {
            if old.contains(id) {
                RowChanges::touch(&mut self.rows.updated, id);
            } else {
                RowChanges::touch(&mut self.rows.added, id);
            }
        }
        for id in old_ids {
            if !new.contains(id) {
                RowChanges::touch(&mut self.rows.removed, id);
            }
        }
    }

    fn replace_rows(&mut self, rows: Vec<Value>, merge_key: Option<&str>, diff: bool) {
        let old_ids = self.root_ids();
        let old_rows = std::mem::take(&mut self.state.raw);
        let row_id = self.state.model.row_id.clone();

        let mut next = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let matched = match merge_key {
                Some(key) => get_path(&row, key).and_then(|needle| {
                    old_rows
                        .iter()
                        .enumerate()
                        .find(|(_, old)| get_path(old, key).is_some_and(|v| deep_equal(v, needle)))
                }),
                None if diff && !row_id.is_positional() => {
                    let id = row_id.resolve(&row, index);
                    old_rows
                        .iter()
                        .enumerate()
                        .find(|(old_index, old)| row_id.resolve(old, *old_index) == id)
                }
                None => None,
            };

            match matched {
                Some((old_index, old)) => {
                    let id = row_id.resolve(old, old_index);
                    self.push_cell_diffs(&id, old, &row);
                    if merge_key.is_some() {
                        let mut merged = old.clone();
                        deep_merge(&mut merged, &row);
                        next.push(merged);
                    } else {
                        next.push(row);
                    }
                }
                None => next.push(row),
            }
        }

        self.state.raw = next;
        if !diff {
            self.state.baseline = self.state.raw.clone();
        }
        self.record_replacement(&old_ids);
    }

    fn push_cell_diffs(&mut self, row_id: &str, current: &Value, patch: &Value) -> bool {
        let diffs = diff_fields(current, patch);
        let changed = !diffs.is_empty();
        for diff in diffs {
            self.cell_events.push(CellValueChangedEvent {
                row_id: row_id.to_string(),
                field: diff.field,
                old: diff.old,
                actual: diff.new,
            });
        }
        changed
    }

    fn add_rows(&mut self, rows: Vec<Value>) {
        if rows.is_empty() {
            self.drop_command(GridError::malformed("add", "empty row array"));
            return;
        }
        for row in rows {
            self.add_row(row);
        }
    }

    fn add_row(&mut self, row: Value) {
        if let Some(id) = self.state.model.row_id.from_data(&row)
            && self.state.contains(&id)
        {
            self.drop_command(GridError::malformed("add", format!("row '{}' already exists", id)));
            return;
        }
        let index = self.state.raw.len();
        let id = self.state.model.row_id.resolve(&row, index);
        self.state.raw.push(row);
        RowChanges::touch(&mut self.rows.added, &id);
    }

    fn up_add_rows(&mut self, rows: Vec<Value>) {
        if rows.is_empty() {
            self.drop_command(GridError::malformed("upAdd", "empty row array"));
            return;
        }
        for row in rows {
            match self.state.model.row_id.from_data(&row) {
                Some(id) if self.state.contains(&id) => self.update_row(&id, &row),
                _ => self.add_row(row),
            }
        }
    }

    fn update_rows(&mut self, rows: Vec<Value>) {
        if rows.is_empty() {
            self.drop_command(GridError::malformed("update", "empty row array"));
            return;
        }
        for row in rows {
            match self.state.model.row_id.from_data(&row) {
                Some(id) => self.update_row(&id, &row),
                None => self.drop_command(GridError::malformed("update", "row without an id")),
            }
        }
    }

    fn update_row(&mut self, id: &str, patch: &Value) {
        let Some(location) = self.state.locate(id) else {
            self.drop_command(GridError::row_not_found(id));
            return;
        };
        let Some(current) = self.state.datum(&location).cloned() else {
            return;
        };
        if !self.push_cell_diffs(id, &current, patch) {
            return;
        }
        if let Some(datum) = self.state.datum_mut(&location) {
            deep_merge(datum, patch);
        }
        if !self.rows.added.iter().any(|added| added == id) {
            RowChanges::touch(&mut self.rows.updated, id);
        }
    }

    fn update_cell(&mut self, row_id: &str, field: &str, value: Value) {
        if !self.state.contains(row_id) {
            self.drop_command(GridError::row_not_found(row_id));
            return;
        }
        let old = self.state.effective_value(row_id, field);
        if old.as_ref().is_some_and(|old| deep_equal(old, &value)) {
            return;
        }
        self.cell_events.push(CellValueChangedEvent {
            row_id: row_id.to_string(),
            field: field.to_string(),
            old,
            actual: value.clone(),
        });
        self.state.model.overrides.set(row_id, field, value);
    }

    fn set_selection_data(&mut self, patch: &Value) {
        if !patch.is_object() {
            self.drop_command(GridError::malformed("setSelectionData", "patch must be an object"));
            return;
        }
        for id in self.state.model.selection.selected() {
            self.update_row(&id, patch);
        }
    }

    fn split_row(&mut self, row_id: &str, as_child: bool) {
        let Some(location) = self.state.locate(row_id) else {
            self.drop_command(GridError::row_not_found(row_id));
            return;
        };
        let Some(datum) = self.state.datum(&location) else {
            return;
        };

        let mut copy = self.state.model.overrides.apply(row_id, datum);
        let children_field = self.state.children_field().map(str::to_string);
        if let Some(field) = &children_field {
            set_path(&mut copy, field, Value::Array(Vec::new()));
        }

        let new_id = format!(
            "{}-split-{}-{}",
            row_id,
            Utc::now().timestamp_millis(),
            rand::random::<u32>()
        );
        if !self.state.model.row_id.assign(&mut copy, &new_id) {
            self.drop_command(GridError::malformed("split", "row ids cannot be written back into row data"));
            return;
        }

        if as_child {
            let Some(field) = children_field else {
                self.drop_command(GridError::malformed("split", "splitting as a child needs a tree children field"));
                return;
            };
            let Some(parent) = self.state.datum_mut(&location) else {
                return;
            };
            match get_path_mut(parent, &field).and_then(Value::as_array_mut) {
                Some(children) => children.push(copy),
                None => set_path(parent, &field, Value::Array(vec![copy])),
            }
            RowChanges::touch(&mut self.rows.updated, row_id);
        } else if !self.insert_after(&location, copy) {
            return;
        }

        let added = if self.state.model.row_id.is_positional() {
            self.positional_id_after(&location)
        } else {
            Some(new_id)
        };
        if let Some(id) = added {
            RowChanges::touch(&mut self.rows.added, &id);
        }
    }

    fn insert_after(&mut self, location: &RowLocation, copy: Value) -> bool {
        let Some((&last, parent_path)) = location.path.split_last() else {
            let at = (location.root + 1).min(self.state.raw.len());
            self.state.raw.insert(at, copy);
            return true;
        };
        let Some(field) = self.state.children_field().map(str::to_string) else {
            return false;
        };
        let parent = RowLocation {
            root: location.root,
            path: parent_path.to_vec(),
        };
        let Some(siblings) = self
            .state
            .datum_mut(&parent)
            .and_then(|p| get_path_mut(p, &field))
            .and_then(Value::as_array_mut)
        else {
            return false;
        };
        let at = (last + 1).min(siblings.len());
        siblings.insert(at, copy);
        true
    }

    fn positional_id_after(&self, location: &RowLocation) -> Option<String> {
        let root_id = |index: usize| self.state.raw.get(index).map(|d| self.state.model.row_id.resolve(d, index));
        match location.path.split_last() {
            None => root_id(location.root + 1),
            Some((&last, parent_path)) => {
                let mut id = root_id(location.root)?;
                for index in parent_path {
                    id = format!("{}-{}", id, index);
                }
                Some(format!("{}-{}", id, last + 1))
            }
        }
    }

    fn remove_rows(&mut self, ids: &[String]) {
        if ids.is_empty() {
            self.drop_command(GridError::malformed("remove", "empty id array"));
            return;
        }

        let mut located = Vec::new();
        for id in ids {
            match self.state.locate(id) {
                Some(location) => located.push((location, id.clone())),
                None => self.drop_command(GridError::row_not_found(id)),
            }
        }

        // Deepest and last first, so earlier locations stay valid.
        located.sort_by(|(a, _), (b, _)| (b.root, &b.path).cmp(&(a.root, &a.path)));
        located.dedup_by(|(a, _), (b, _)| a == b);

        for (location, id) in located {
            let removed = match location.path.split_last() {
                None => {
                    self.state.raw.remove(location.root);
                    true
                }
                Some((&last, parent_path)) => {
                    let parent = RowLocation {
                        root: location.root,
                        path: parent_path.to_vec(),
                    };
                    let field = self.state.children_field().map(str::to_string);
                    field
                        .and_then(|field| {
                            self.state
                                .datum_mut(&parent)
                                .and_then(|p| get_path_mut(p, &field))
                                .and_then(Value::as_array_mut)
                                .filter(|siblings| last < siblings.len())
                                .map(|siblings| siblings.remove(last))
                        })
                        .is_some()
                }
            };
            if removed {
                self.state.model.overrides.reset_row(&id);
                RowChanges::touch(&mut self.rows.removed, &id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::FilterItem;
    use crate::model::RowIdSource;
    use crate::model::SortItem;
    use crate::selection::SelectionMode;

    fn state() -> GridState {
        let mut state = GridState::default();
        state.model.row_id = RowIdSource::field("id");
        state.selection_mode = SelectionMode::Multiple;
        state.raw = vec![
            json!({ "id": "1", "v": 3, "name": "a" }),
            json!({ "id": "2", "v": 1, "name": "b" }),
            json!({ "id": "3", "v": 2, "name": "c" }),
        ];
        state.baseline = state.raw.clone();
        state.sync_pagination();
        state
    }

    fn batch(commands: Vec<Command>) -> UpdateBatch {
        let mut batch = UpdateBatch::new();
        for command in commands {
            batch.push("test", command);
        }
        batch
    }

    fn kinds(report: &ExecuteReport) -> Vec<&'static str> {
        report.events.iter().map(|e| e.kind().as_str()).collect()
    }

    #[test]
    fn test_add_then_update_in_one_batch() {
        let mut state = state();
        let report = execute_batch(
            batch(vec![
                Command::Update(vec![json!({ "id": "x", "name": "Y" })]),
                Command::Add(vec![json!({ "id": "x" })]),
            ]),
            &mut state,
        );
        assert!(report.is_clean());
        assert_eq!(state.raw[3], json!({ "id": "x", "name": "Y" }));
    }

    #[test]
    fn test_cell_event_carries_old_value() {
        let mut state = state();
        let report = execute_batch(batch(vec![Command::Update(vec![json!({ "id": "1", "v": 9 })])]), &mut state);
        let GridEvent::CellValueChanged(event) = &report.events[0] else {
            panic!("expected cellValueChanged, got {:?}", report.events);
        };
        assert_eq!(event.old(), Some(&json!(3)));
        assert_eq!(event.actual(), &json!(9));
        assert_eq!(kinds(&report), vec!["cellValueChanged", "rowDataChanged"]);
    }

    #[test]
    fn test_malformed_commands_are_dropped() {
        let mut state = state();
        let report = execute_batch(
            batch(vec![
                Command::Update(vec![json!({ "name": "no id" })]),
                Command::Remove(vec!["missing".into()]),
                Command::Add(Vec::new()),
                Command::Add(vec![json!({ "id": "4" })]),
            ]),
            &mut state,
        );
        assert_eq!(report.dropped.len(), 3);
        assert_eq!(state.raw.len(), 4);
    }

    #[test]
    fn test_filter_change_fires_once_and_resets_page() {
        let mut state = state();
        state.model.pagination = PaginationState::new(true, 1);
        state.sync_pagination();
        state.model.pagination.set_page(2);
        let report = execute_batch(
            batch(vec![
                Command::Filter(FilterOp::Set(vec![FilterItem::greater_than("v", 0)])),
                Command::Filter(FilterOp::Remove("v".into())),
                Command::Filter(FilterOp::Set(vec![FilterItem::greater_than("v", 1)])),
                Command::Sort(SortOp::Set(vec![SortItem::asc("v")])),
            ]),
            &mut state,
        );
        assert_eq!(kinds(&report), vec!["filterChanged", "sortChanged", "paginationChanged"]);
        assert_eq!(state.model.pagination.current_page, 0);
        assert_eq!(state.model.pagination.total_rows, 2);
    }

    #[test]
    fn test_explicit_page_wins_over_filter_reset() {
        let mut state = state();
        state.model.pagination = PaginationState::new(true, 1);
        let report = execute_batch(
            batch(vec![
                Command::SetPage(1),
                Command::Filter(FilterOp::Set(vec![FilterItem::greater_than("v", 1)])),
            ]),
            &mut state,
        );
        assert!(report.is_clean());
        assert_eq!(state.model.pagination.current_page, 1);
    }

    #[test]
    fn test_reset_state_restores_baseline_and_supersedes_incremental() {
        let mut state = state();
        execute_batch(batch(vec![Command::Remove(vec!["1".into()])]), &mut state);
        state.model.overrides.set("2", "v", json!(7));
        let report = execute_batch(
            batch(vec![Command::ResetState, Command::Add(vec![json!({ "id": "9" })])]),
            &mut state,
        );
        assert_eq!(state.raw, state.baseline);
        assert!(state.model.overrides.is_empty());
        assert_eq!(report.dropped.len(), 1);
    }

    #[test]
    fn test_replace_all_with_merge_key() {
        let mut state = state();
        let report = execute_batch(
            batch(vec![Command::ReplaceAll {
                rows: vec![json!({ "id": "2", "name": "B" }), json!({ "id": "5" })],
                merge_key: Some("id".into()),
            }]),
            &mut state,
        );
        assert_eq!(state.raw, vec![json!({ "id": "2", "v": 1, "name": "B" }), json!({ "id": "5" })]);
        let rows = report
            .events
            .iter()
            .find_map(|e| match e {
                GridEvent::RowDataChanged(rows) => Some(rows),
                _ => None,
            })
            .unwrap();
        assert_eq!(rows.removed, vec!["1", "3"]);
        assert_eq!(rows.added, vec!["5"]);
    }

    #[test]
    fn test_removing_selected_row_fires_selection_change() {
        let mut state = state();
        state.model.selection.selected_rows.insert("2".into());
        let report = execute_batch(batch(vec![Command::Remove(vec!["2".into()])]), &mut state);
        assert_eq!(kinds(&report), vec!["rowDataChanged", "paginationChanged", "selectionChanged"]);
    }

    #[test]
    fn test_split_assigns_new_id_after_source() {
        let mut state = state();
        let report = execute_batch(
            batch(vec![Command::Split {
                row_id: "1".into(),
                as_child: false,
            }]),
            &mut state,
        );
        assert!(report.is_clean());
        let id = state.raw[1]["id"].as_str().unwrap();
        assert!(id.starts_with("1-split-"));
        assert_eq!(state.raw[1]["v"], json!(3));
    }

    #[test]
    fn test_update_cell_writes_override() {
        let mut state = state();
        let report = execute_batch(
            batch(vec![Command::UpdateCell {
                row_id: "1".into(),
                field: "name".into(),
                value: json!("z"),
            }]),
            &mut state,
        );
        assert_eq!(kinds(&report), vec!["cellValueChanged"]);
        assert_eq!(state.raw[0]["name"], json!("a"));
        assert_eq!(state.effective_value("1", "name"), Some(json!("z")));
    }

    #[test]
    fn test_selection_noop_fires_nothing() {
        let mut state = state();
        let select = || {
            Command::Selection(SelectionOp::SelectRow {
                id: "1".into(),
                selected: true,
                shift: false,
                ctrl: false,
            })
        };
        let first = execute_batch(batch(vec![select()]), &mut state);
        assert_eq!(kinds(&first), vec!["selectionChanged"]);
        let second = execute_batch(batch(vec![select()]), &mut state);
        assert!(!second.changed());
    }
}
