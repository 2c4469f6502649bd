//! Permission-checked grid handle.

use serde_json::Value;

use super::IngressPolicy;
use crate::Grid;
use crate::api::GridApi;
use crate::command::ExecuteReport;
use crate::command::UpdateBatch;
use crate::error::GridError;
use crate::event::EventKind;
use crate::event::Listener;
use crate::event::Subscription;
use crate::export::CsvOptions;
use crate::model::FilterModel;
use crate::model::PaginationState;
use crate::model::ProcessedColumn;
use crate::model::RowNode;
use crate::model::SortModel;

/// A [`GridApi`] over another grid, as seen from `origin`.
///
/// Every read, batch command and subscription is checked against the
/// target grid's [`IngressPolicy`]. Denied reads return empty defaults,
/// denied commands are dropped from the batch (and reported in
/// [`ExecuteReport::dropped`]), denied subscriptions are inert. Each denial
/// is logged.
#[derive(Debug, Clone)]
pub struct SecureGridApi {
    target: Grid,
    origin: String,
    policy: IngressPolicy,
}

impl SecureGridApi {
    /// Wraps `target` for calls from `origin`, using the target's own rules.
    pub fn new(target: Grid, origin: impl Into<String>) -> Self {
        let policy = target.ingress_policy();
        Self {
            target,
            origin: origin.into(),
            policy,
        }
    }

    /// Caller origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns `true` if the origin may perform `action`.
    pub fn can(&self, action: &str) -> bool {
        self.policy.is_allowed(&self.origin, action)
    }

    fn guard(&self, action: &str) -> bool {
        self.policy.check(&self.origin, action).is_ok()
    }

    fn read<T: Default>(&self, action: &str, f: impl FnOnce(&Grid) -> T) -> T {
        if self.guard(action) {
            f(&self.target)
        } else {
            T::default()
        }
    }
}

impl GridApi for SecureGridApi {
    fn grid_id(&self) -> &str {
        self.target.grid_id()
    }

    fn get_row_data(&self) -> Vec<Value> {
        self.read("api.getRowData", Grid::get_row_data)
    }

    fn get_displayed_rows(&self) -> Vec<RowNode> {
        self.read("api.getDisplayedRows", Grid::get_displayed_rows)
    }

    fn get_row(&self, id: &str) -> Option<RowNode> {
        self.read("api.getRow", |grid| grid.get_row(id))
    }

    fn get_selected_rows(&self) -> Vec<RowNode> {
        self.read("api.getSelectedRows", Grid::get_selected_rows)
    }

    fn get_selected_ids(&self) -> Vec<String> {
        self.read("api.getSelectedRows", Grid::get_selected_ids)
    }

    fn get_filter_model(&self) -> FilterModel {
        self.read("api.getFilterModel", Grid::get_filter_model)
    }

    fn get_sort_model(&self) -> SortModel {
        self.read("api.getSortModel", Grid::get_sort_model)
    }

    fn get_quick_filter(&self) -> String {
        self.read("api.getQuickFilter", Grid::get_quick_filter)
    }

    fn get_pagination(&self) -> PaginationState {
        self.read("api.getPagination", Grid::get_pagination)
    }

    fn get_columns(&self) -> Vec<ProcessedColumn> {
        self.read("api.getColumns", Grid::get_columns)
    }

    fn execute(&self, mut batch: UpdateBatch) -> ExecuteReport {
        let denied = batch.retain_actions(|action| self.policy.is_allowed(&self.origin, action));
        let denied: Vec<GridError> = denied
            .into_iter()
            .map(|action| {
                let error = GridError::denied(&self.origin, action);
                log::warn!("{}", error);
                error
            })
            .collect();

        let mut report = if batch.is_empty() {
            ExecuteReport::default()
        } else {
            self.target.execute(batch)
        };
        report.dropped.extend(denied);
        report
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> Subscription {
        if !self.guard(&kind.ingress_action()) {
            return Subscription::inert(self.target.grid_id(), kind);
        }
        self.target.add_event_listener(kind, listener)
    }

    fn export_to_csv(&self, options: &CsvOptions) -> String {
        self.read("api.exportToCsv", |grid| grid.export_to_csv(options))
    }

    fn copy_to_clipboard(&self) -> Result<(), GridError> {
        self.policy.check(&self.origin, "api.copyToClipboard")?;
        self.target.copy_to_clipboard()
    }

    fn paste_from_clipboard(&self) -> Result<usize, GridError> {
        self.policy.check(&self.origin, "api.pasteFromClipboard")?;
        self.target.paste_from_clipboard()
    }
}
