//! Grid-state builder.

use std::sync::Arc;

use serde_json::Value;

use super::Command;
use super::ExecuteReport;
use super::FilterOp;
use super::SelectionOp;
use super::SortOp;
use super::UpdateBatch;
use crate::GridApi;
use crate::model::FilterModel;
use crate::model::SortModel;

/// Fluent builder for filter, sort, paging, selection and reset changes.
///
/// Obtained from [`GridApiExt::params`](crate::GridApiExt::params). Every
/// call queues a command; [`execute`](Self::execute) applies the whole
/// chain in one commit.
pub struct ParamsBuilder<'a, A: GridApi + ?Sized> {
    api: &'a A,
    batch: UpdateBatch,
}

impl<'a, A: GridApi + ?Sized> ParamsBuilder<'a, A> {
    /// Creates a builder targeting `api`.
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            batch: UpdateBatch::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Filter
    // -------------------------------------------------------------------------

    pub fn set_filter_model(mut self, model: FilterModel) -> Self {
        self.batch.push("api.setFilterModel", Command::Filter(FilterOp::Set(model)));
        self
    }

    /// Applies `f` to the filter model as left by earlier filter calls.
    pub fn update_filter_model(mut self, f: impl Fn(FilterModel) -> FilterModel + Send + Sync + 'static) -> Self {
        self.batch
            .push("api.setFilterModel", Command::Filter(FilterOp::Transform(Arc::new(f))));
        self
    }

    pub fn remove_filter(mut self, field: impl Into<String>) -> Self {
        self.batch
            .push("api.removeFilter", Command::Filter(FilterOp::Remove(field.into())));
        self
    }

    pub fn remove_all_filter(mut self) -> Self {
        self.batch.push("api.removeAllFilter", Command::Filter(FilterOp::RemoveAll));
        self
    }

    pub fn set_quick_filter(mut self, text: impl Into<String>) -> Self {
        self.batch.push("api.setQuickFilter", Command::QuickFilter(text.into()));
        self
    }

    // -------------------------------------------------------------------------
    // Sort
    // -------------------------------------------------------------------------

    pub fn set_sort_model(mut self, model: SortModel) -> Self {
        self.batch.push("api.setSortModel", Command::Sort(SortOp::Set(model)));
        self
    }

    /// Applies `f` to the sort model as left by earlier sort calls.
    pub fn update_sort_model(mut self, f: impl Fn(SortModel) -> SortModel + Send + Sync + 'static) -> Self {
        self.batch
            .push("api.setSortModel", Command::Sort(SortOp::Transform(Arc::new(f))));
        self
    }

    pub fn remove_sort(mut self, field: impl Into<String>) -> Self {
        self.batch.push("api.removeSort", Command::Sort(SortOp::Remove(field.into())));
        self
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    pub fn set_page(mut self, page: usize) -> Self {
        self.batch.push("api.setPage", Command::SetPage(page));
        self
    }

    pub fn set_page_size(mut self, page_size: usize) -> Self {
        self.batch.push("api.setPageSize", Command::SetPageSize(page_size));
        self
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn select_row(self, id: impl Into<String>, selected: bool) -> Self {
        self.select_row_with(id, selected, false, false)
    }

    /// Click-style selection with modifier keys.
    pub fn select_row_with(mut self, id: impl Into<String>, selected: bool, shift: bool, ctrl: bool) -> Self {
        self.batch.push(
            "api.selectRow",
            Command::Selection(SelectionOp::SelectRow {
                id: id.into(),
                selected,
                shift,
                ctrl,
            }),
        );
        self
    }

    pub fn select_rows<I, S>(mut self, ids: I, selected: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(Into::into).collect();
        self.batch
            .push("api.selectRows", Command::Selection(SelectionOp::SelectRows { ids, selected }));
        self
    }

    pub fn select_all(mut self) -> Self {
        self.batch.push("api.selectAll", Command::Selection(SelectionOp::SelectAll));
        self
    }

    pub fn deselect_all(mut self) -> Self {
        self.batch.push("api.deselectAll", Command::Selection(SelectionOp::DeselectAll));
        self
    }

    // -------------------------------------------------------------------------
    // Rows and resets
    // -------------------------------------------------------------------------

    /// Replaces the raw rows. Edits of rows that survive are kept.
    pub fn update_row_data(mut self, rows: Vec<Value>) -> Self {
        self.batch.push("api.updateRowData", Command::UpdateRowData(rows));
        self
    }

    /// Clears filter, sort, quick filter, page, selection and edits.
    pub fn reset_state(mut self) -> Self {
        self.batch.push("api.resetState", Command::ResetState);
        self
    }

    pub fn reset_edits(mut self) -> Self {
        self.batch.push("api.resetEdits", Command::ResetEdits);
        self
    }

    pub fn reset_cell(mut self, row_id: impl Into<String>, field: impl Into<String>) -> Self {
        self.batch.push(
            "api.resetCell",
            Command::ResetCell {
                row_id: row_id.into(),
                field: field.into(),
            },
        );
        self
    }

    pub fn reset_row(mut self, row_id: impl Into<String>) -> Self {
        self.batch.push(
            "api.resetRow",
            Command::ResetRow {
                row_id: row_id.into(),
            },
        );
        self
    }

    // -------------------------------------------------------------------------
    // Finish
    // -------------------------------------------------------------------------

    /// Returns the batch without executing it.
    pub fn into_batch(self) -> UpdateBatch {
        self.batch
    }

    /// Applies every queued command in one commit.
    pub fn execute(self) -> ExecuteReport {
        self.api.execute(self.batch)
    }
}
