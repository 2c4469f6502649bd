//! Bulk row CRUD builder.

use serde_json::Value;

use super::Command;
use super::ExecuteReport;
use super::UpdateBatch;
use crate::GridApi;
use crate::error::GridError;

/// Fluent builder for row additions, updates, removals and edits.
///
/// Obtained from [`GridApiExt::manager`](crate::GridApiExt::manager).
/// Empty row arrays are rejected with a warning; the rest of the chain
/// still executes.
pub struct ManagerBuilder<'a, A: GridApi + ?Sized> {
    api: &'a A,
    batch: UpdateBatch,
}

impl<'a, A: GridApi + ?Sized> ManagerBuilder<'a, A> {
    /// Creates a builder targeting `api`.
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            batch: UpdateBatch::new(),
        }
    }

    fn push_rows(&mut self, action: &'static str, name: &'static str, rows: Vec<Value>, command: fn(Vec<Value>) -> Command) {
        if rows.is_empty() {
            self.batch.reject(GridError::malformed(name, "empty row array"));
            return;
        }
        self.batch.push(action, command(rows));
    }

    /// Appends rows.
    pub fn add(mut self, rows: Vec<Value>) -> Self {
        self.push_rows("manager.add", "add", rows, Command::Add);
        self
    }

    /// Updates rows whose id already exists at execute time, adds the rest.
    pub fn up_add(mut self, rows: Vec<Value>) -> Self {
        self.push_rows("manager.upAdd", "upAdd", rows, Command::UpAdd);
        self
    }

    /// Deep-merges each patch into the row with the same id.
    pub fn update(mut self, rows: Vec<Value>) -> Self {
        self.push_rows("manager.update", "update", rows, Command::Update);
        self
    }

    /// Replaces every row.
    pub fn replace_all(mut self, rows: Vec<Value>) -> Self {
        self.batch.push(
            "manager.replaceAll",
            Command::ReplaceAll {
                rows,
                merge_key: None,
            },
        );
        self
    }

    /// Replaces every row, merging each new row into the existing row that
    /// has the same value at `key`.
    pub fn replace_all_merged(mut self, rows: Vec<Value>, key: impl Into<String>) -> Self {
        self.batch.push(
            "manager.replaceAll",
            Command::ReplaceAll {
                rows,
                merge_key: Some(key.into()),
            },
        );
        self
    }

    /// Removes rows by id.
    pub fn remove<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            self.batch.reject(GridError::malformed("remove", "empty id array"));
        } else {
            self.batch.push("manager.remove", Command::Remove(ids));
        }
        self
    }

    /// Records a pending edit for one cell.
    pub fn update_cell(mut self, row_id: impl Into<String>, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.batch.push(
            "manager.updateCell",
            Command::UpdateCell {
                row_id: row_id.into(),
                field: field.into(),
                value: value.into(),
            },
        );
        self
    }

    pub fn reset_cell(mut self, row_id: impl Into<String>, field: impl Into<String>) -> Self {
        self.batch.push(
            "manager.resetCell",
            Command::ResetCell {
                row_id: row_id.into(),
                field: field.into(),
            },
        );
        self
    }

    pub fn reset_row(mut self, row_id: impl Into<String>) -> Self {
        self.batch.push(
            "manager.resetRow",
            Command::ResetRow {
                row_id: row_id.into(),
            },
        );
        self
    }

    pub fn reset_edits(mut self) -> Self {
        self.batch.push("manager.resetEdits", Command::ResetEdits);
        self
    }

    /// Clones a row and inserts the copy right after it.
    ///
    /// The copy gets the id `{id}-split-{timestamp}-{random}`.
    pub fn split(mut self, row_id: impl Into<String>) -> Self {
        self.batch.push(
            "manager.split",
            Command::Split {
                row_id: row_id.into(),
                as_child: false,
            },
        );
        self
    }

    /// Clones a row and appends the copy as its tree child.
    pub fn split_as_child(mut self, row_id: impl Into<String>) -> Self {
        self.batch.push(
            "manager.split",
            Command::Split {
                row_id: row_id.into(),
                as_child: true,
            },
        );
        self
    }

    /// Deep-merges `patch` into every selected row.
    pub fn set_selection_data(mut self, patch: Value) -> Self {
        self.batch.push("manager.setSelectionData", Command::SetSelectionData(patch));
        self
    }

    /// Returns the batch without executing it.
    pub fn into_batch(self) -> UpdateBatch {
        self.batch
    }

    /// Applies every queued command in one commit.
    pub fn execute(self) -> ExecuteReport {
        self.api.execute(self.batch)
    }
}
