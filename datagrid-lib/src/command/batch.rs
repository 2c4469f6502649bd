//! Command batch.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::GridError;
use crate::model::FilterModel;
use crate::model::SortModel;

/// Transforms the current filter model.
pub type FilterTransform = Arc<dyn Fn(FilterModel) -> FilterModel + Send + Sync>;

/// Transforms the current sort model.
pub type SortTransform = Arc<dyn Fn(SortModel) -> SortModel + Send + Sync>;

// =============================================================================
// Operations
// =============================================================================

/// A queued filter model change.
#[derive(Clone)]
pub enum FilterOp {
    /// Replace the whole model.
    Set(FilterModel),
    /// Drop every entry for a field.
    Remove(String),
    /// Drop every entry.
    RemoveAll,
    /// Apply a custom transform to the model as it stands at that point.
    Transform(FilterTransform),
}

/// A queued sort model change.
#[derive(Clone)]
pub enum SortOp {
    /// Replace the whole model.
    Set(SortModel),
    /// Drop the entry for a field.
    Remove(String),
    /// Apply a custom transform.
    Transform(SortTransform),
}

/// A queued selection change.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOp {
    SelectRow {
        id: String,
        selected: bool,
        shift: bool,
        ctrl: bool,
    },
    SelectRows {
        ids: Vec<String>,
        selected: bool,
    },
    SelectAll,
    DeselectAll,
}

/// One queued command.
#[derive(Clone)]
pub enum Command {
    /// Clear filter, sort, quick filter, page, selection and edits, and
    /// restore the baseline rows.
    ResetState,
    /// Clear every pending edit.
    ResetEdits,
    ResetCell {
        row_id: String,
        field: String,
    },
    ResetRow {
        row_id: String,
    },
    Filter(FilterOp),
    QuickFilter(String),
    Sort(SortOp),
    SetPage(usize),
    SetPageSize(usize),
    Selection(SelectionOp),
    /// Replace the raw rows.
    UpdateRowData(Vec<Value>),
    /// Replace the raw rows, optionally merging with existing rows that
    /// share the value at `merge_key`.
    ReplaceAll {
        rows: Vec<Value>,
        merge_key: Option<String>,
    },
    Add(Vec<Value>),
    /// Update rows whose id exists, add the rest. Resolved at execute time.
    UpAdd(Vec<Value>),
    /// Deep-merge patches into existing rows, matched by id.
    Update(Vec<Value>),
    /// Record a pending edit.
    UpdateCell {
        row_id: String,
        field: String,
        value: Value,
    },
    /// Deep-merge one patch into every selected row.
    SetSelectionData(Value),
    /// Clone a row after itself, or as a tree child of itself.
    Split {
        row_id: String,
        as_child: bool,
    },
    Remove(Vec<String>),
}

impl Command {
    /// Execution phase. Commands run in phase order, call order within a
    /// phase.
    pub fn phase(&self) -> u8 {
        match self {
            Command::ResetState => 0,
            Command::ResetEdits | Command::ResetCell { .. } | Command::ResetRow { .. } => 1,
            Command::Filter(_) => 2,
            Command::QuickFilter(_) => 3,
            Command::Sort(_) => 4,
            Command::SetPage(_) | Command::SetPageSize(_) => 5,
            Command::Selection(_) => 6,
            Command::UpdateRowData(_) | Command::ReplaceAll { .. } => 7,
            Command::Add(_) => 8,
            Command::UpAdd(_) => 9,
            Command::Update(_) => 10,
            Command::UpdateCell { .. } => 11,
            Command::SetSelectionData(_) => 12,
            Command::Split { .. } => 13,
            Command::Remove(_) => 14,
        }
    }

    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ResetState => "resetState",
            Command::ResetEdits => "resetEdits",
            Command::ResetCell { .. } => "resetCell",
            Command::ResetRow { .. } => "resetRow",
            Command::Filter(_) => "filter",
            Command::QuickFilter(_) => "setQuickFilter",
            Command::Sort(_) => "sort",
            Command::SetPage(_) => "setPage",
            Command::SetPageSize(_) => "setPageSize",
            Command::Selection(_) => "selection",
            Command::UpdateRowData(_) => "updateRowData",
            Command::ReplaceAll { .. } => "replaceAll",
            Command::Add(_) => "add",
            Command::UpAdd(_) => "upAdd",
            Command::Update(_) => "update",
            Command::UpdateCell { .. } => "updateCell",
            Command::SetSelectionData(_) => "setSelectionData",
            Command::Split { .. } => "split",
            Command::Remove(_) => "remove",
        }
    }

    /// Ingress actions a builder may tag this command with. The first one
    /// is the action checked when a batch carries any other label.
    pub fn ingress_actions(&self) -> &'static [&'static str] {
        match self {
            Command::ResetState => &["api.resetState"],
            Command::ResetEdits => &["api.resetEdits", "manager.resetEdits"],
            Command::ResetCell { .. } => &["api.resetCell", "manager.resetCell"],
            Command::ResetRow { .. } => &["api.resetRow", "manager.resetRow"],
            Command::Filter(FilterOp::Set(_) | FilterOp::Transform(_)) => &["api.setFilterModel"],
            Command::Filter(FilterOp::Remove(_)) => &["api.removeFilter"],
            Command::Filter(FilterOp::RemoveAll) => &["api.removeAllFilter"],
            Command::QuickFilter(_) => &["api.setQuickFilter"],
            Command::Sort(SortOp::Set(_) | SortOp::Transform(_)) => &["api.setSortModel"],
            Command::Sort(SortOp::Remove(_)) => &["api.removeSort"],
            Command::SetPage(_) => &["api.setPage"],
            Command::SetPageSize(_) => &["api.setPageSize"],
            Command::Selection(SelectionOp::SelectRow { .. }) => &["api.selectRow"],
            Command::Selection(SelectionOp::SelectRows { .. }) => &["api.selectRows"],
            Command::Selection(SelectionOp::SelectAll) => &["api.selectAll"],
            Command::Selection(SelectionOp::DeselectAll) => &["api.deselectAll"],
            Command::UpdateRowData(_) => &["api.updateRowData"],
            Command::ReplaceAll { .. } => &["manager.replaceAll"],
            Command::Add(_) => &["manager.add"],
            Command::UpAdd(_) => &["manager.upAdd"],
            Command::Update(_) => &["manager.update"],
            Command::UpdateCell { .. } => &["manager.updateCell"],
            Command::SetSelectionData(_) => &["manager.setSelectionData"],
            Command::Split { .. } => &["manager.split"],
            Command::Remove(_) => &["manager.remove"],
        }
    }

    /// The action checked for this command when it was queued as `label`.
    pub fn checked_action(&self, label: &'static str) -> &'static str {
        let actions = self.ingress_actions();
        if actions.contains(&label) { label } else { actions[0] }
    }

    /// Returns `true` for commands that touch the raw row set.
    pub fn is_row_command(&self) -> bool {
        self.phase() >= 7
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Filter(FilterOp::Set(model)) => f.debug_tuple("SetFilterModel").field(model).finish(),
            Command::Sort(SortOp::Set(model)) => f.debug_tuple("SetSortModel").field(model).finish(),
            Command::Selection(op) => f.debug_tuple("Selection").field(op).finish(),
            Command::UpdateCell { row_id, field, value } => f
                .debug_struct("UpdateCell")
                .field("row_id", row_id)
                .field("field", field)
                .field("value", value)
                .finish(),
            other => write!(f, "{}", other.name()),
        }
    }
}

// =============================================================================
// Batch
// =============================================================================

/// A command queued by a builder, tagged with its ingress action.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    /// `api.<method>` or `manager.<method>`.
    pub action: &'static str,
    pub command: Command,
}

/// Commands accumulated by one builder chain, consumed by one `execute()`.
#[derive(Debug, Default)]
pub struct UpdateBatch {
    pub(crate) commands: Vec<QueuedCommand>,
    pub(crate) rejected: Vec<GridError>,
}

impl UpdateBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a command.
    pub(crate) fn push(&mut self, action: &'static str, command: Command) {
        self.commands.push(QueuedCommand { action, command });
    }

    /// Records a call that was dropped while building (malformed input).
    pub fn reject(&mut self, error: GridError) {
        log::warn!("{}", error);
        self.rejected.push(error);
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Queued commands in call order.
    pub fn commands(&self) -> &[QueuedCommand] {
        &self.commands
    }

    /// Distinct checked actions in the batch, in first-call order.
    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions = Vec::new();
        for queued in &self.commands {
            let action = queued.command.checked_action(queued.action);
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
        actions
    }

    /// Keeps only commands whose checked action passes `allowed`; returns
    /// the actions that were dropped. A label that does not belong to its
    /// command is replaced by the command's own action before the check.
    pub fn retain_actions(&mut self, allowed: impl Fn(&str) -> bool) -> Vec<&'static str> {
        let mut dropped = Vec::new();
        self.commands.retain(|queued| {
            let action = queued.command.checked_action(queued.action);
            if action != queued.action {
                log::warn!("{} queued as {}, checking {}", queued.command.name(), queued.action, action);
            }
            let keep = allowed(action);
            if !keep && !dropped.contains(&action) {
                dropped.push(action);
            }
            keep
        });
        dropped
    }

    /// Splits the batch into its commands (phase-ordered, stable) and the
    /// errors recorded while building.
    pub(crate) fn into_ordered(self) -> (Vec<Command>, Vec<GridError>) {
        let mut commands: Vec<Command> = self.commands.into_iter().map(|q| q.command).collect();
        commands.sort_by_key(Command::phase);
        (commands, self.rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_is_stable() {
        let mut batch = UpdateBatch::new();
        batch.push("manager.remove", Command::Remove(vec!["a".into()]));
        batch.push("api.setPage", Command::SetPage(1));
        batch.push("manager.add", Command::Add(vec![Value::Null]));
        batch.push("api.setFilterModel", Command::Filter(FilterOp::RemoveAll));
        batch.push("api.setQuickFilter", Command::QuickFilter("a".into()));
        batch.push("api.removeFilter", Command::Filter(FilterOp::Remove("x".into())));
        let (commands, _) = batch.into_ordered();
        let names: Vec<_> = commands.iter().map(Command::name).collect();
        assert_eq!(names, vec!["filter", "filter", "setQuickFilter", "setPage", "add", "remove"]);
        assert!(matches!(commands[0], Command::Filter(FilterOp::RemoveAll)));
    }

    #[test]
    fn test_retain_actions_reports_dropped() {
        let mut batch = UpdateBatch::new();
        batch.push("api.setPage", Command::SetPage(1));
        batch.push("api.selectAll", Command::Selection(SelectionOp::SelectAll));
        batch.push("api.setPage", Command::SetPage(2));
        let dropped = batch.retain_actions(|action| action == "api.selectAll");
        assert_eq!(dropped, vec!["api.setPage"]);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_mislabelled_command_is_checked_as_itself() {
        let mut batch = UpdateBatch::new();
        batch.push("api.selectRow", Command::Remove(vec!["1".into()]));
        batch.push("api.selectRow", Command::ResetState);
        assert_eq!(batch.actions(), vec!["manager.remove", "api.resetState"]);

        let dropped = batch.retain_actions(|action| action == "api.selectRow");
        assert_eq!(dropped, vec!["manager.remove", "api.resetState"]);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_shared_reset_actions() {
        assert_eq!(Command::ResetEdits.checked_action("manager.resetEdits"), "manager.resetEdits");
        assert_eq!(Command::ResetEdits.checked_action("api.resetEdits"), "api.resetEdits");
        assert_eq!(Command::SetPage(0).checked_action("api.setPageSize"), "api.setPage");
    }
}
