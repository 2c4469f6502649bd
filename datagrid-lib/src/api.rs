//! The public grid surface.

use serde_json::Value;

use crate::command::ExecuteReport;
use crate::command::ManagerBuilder;
use crate::command::ParamsBuilder;
use crate::command::UpdateBatch;
use crate::error::GridError;
use crate::event::EventKind;
use crate::event::EventSubscriber;
use crate::event::Listener;
use crate::event::Subscription;
use crate::export::CsvOptions;
use crate::model::FilterModel;
use crate::model::PaginationState;
use crate::model::ProcessedColumn;
use crate::model::RowNode;
use crate::model::SortModel;

/// Operations every grid handle exposes.
///
/// Implemented by [`Grid`](crate::Grid) for the owning side and by
/// [`SecureGridApi`](crate::ingress::SecureGridApi) for other origins, which
/// checks every call against the target grid's ingress rules first.
///
/// Mutations all funnel through [`execute`](Self::execute): the provided
/// convenience methods build a one-command batch, so an implementation only
/// has to guard `execute` to guard them too.
pub trait GridApi: Send + Sync {
    /// Id the grid is registered under.
    fn grid_id(&self) -> &str;

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Raw rows, without pending edits.
    fn get_row_data(&self) -> Vec<Value>;

    /// The current page of processed rows.
    fn get_displayed_rows(&self) -> Vec<RowNode>;

    /// One row by id, with pending edits applied.
    fn get_row(&self, id: &str) -> Option<RowNode>;

    /// Selected rows in display order (all pages).
    fn get_selected_rows(&self) -> Vec<RowNode>;

    /// Selected ids, sorted.
    fn get_selected_ids(&self) -> Vec<String>;

    fn get_filter_model(&self) -> FilterModel;

    fn get_sort_model(&self) -> SortModel;

    fn get_quick_filter(&self) -> String;

    fn get_pagination(&self) -> PaginationState;

    /// Visible columns with resolved layout.
    fn get_columns(&self) -> Vec<ProcessedColumn>;

    // -------------------------------------------------------------------------
    // Commands and events
    // -------------------------------------------------------------------------

    /// Applies a batch in one commit and dispatches the resulting events.
    fn execute(&self, batch: UpdateBatch) -> ExecuteReport;

    /// Registers a raw listener for one event kind.
    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> Subscription;

    // -------------------------------------------------------------------------
    // Export
    // -------------------------------------------------------------------------

    fn export_to_csv(&self, options: &CsvOptions) -> String;

    /// Writes the selected rows (or the current page when nothing is
    /// selected) to the clipboard as tab-separated text.
    ///
    /// Without a clipboard provider this is a logged no-op that returns
    /// [`GridError::ClipboardUnavailable`]; grid state is untouched, so
    /// callers may ignore the error.
    fn copy_to_clipboard(&self) -> Result<(), GridError>;

    /// Pastes clipboard text as pending edits, anchored at the first
    /// selected row (or the first displayed row) and the first editable
    /// column. Returns the number of cells written.
    ///
    /// Like [`copy_to_clipboard`](Self::copy_to_clipboard), a missing
    /// provider is a soft failure: nothing is edited and
    /// [`GridError::ClipboardUnavailable`] is returned.
    fn paste_from_clipboard(&self) -> Result<usize, GridError>;

    // -------------------------------------------------------------------------
    // Provided
    // -------------------------------------------------------------------------

    fn set_filter_model(&self, model: FilterModel) -> ExecuteReport {
        ParamsBuilder::new(self).set_filter_model(model).execute()
    }

    fn set_sort_model(&self, model: SortModel) -> ExecuteReport {
        ParamsBuilder::new(self).set_sort_model(model).execute()
    }

    fn set_quick_filter(&self, text: &str) -> ExecuteReport {
        ParamsBuilder::new(self).set_quick_filter(text).execute()
    }

    fn set_page(&self, page: usize) -> ExecuteReport {
        ParamsBuilder::new(self).set_page(page).execute()
    }

    fn set_page_size(&self, page_size: usize) -> ExecuteReport {
        ParamsBuilder::new(self).set_page_size(page_size).execute()
    }

    fn select_row(&self, id: &str, selected: bool) -> ExecuteReport {
        ParamsBuilder::new(self).select_row(id, selected).execute()
    }

    fn select_rows(&self, ids: Vec<String>, selected: bool) -> ExecuteReport {
        ParamsBuilder::new(self).select_rows(ids, selected).execute()
    }

    fn select_all(&self) -> ExecuteReport {
        ParamsBuilder::new(self).select_all().execute()
    }

    fn deselect_all(&self) -> ExecuteReport {
        ParamsBuilder::new(self).deselect_all().execute()
    }

    fn reset_state(&self) -> ExecuteReport {
        ParamsBuilder::new(self).reset_state().execute()
    }

    fn reset_edits(&self) -> ExecuteReport {
        ParamsBuilder::new(self).reset_edits().execute()
    }
}

/// Builder entry points for any [`GridApi`].
pub trait GridApiExt: GridApi {
    /// Filter, sort, paging, selection and reset changes.
    fn params(&self) -> ParamsBuilder<'_, Self> {
        ParamsBuilder::new(self)
    }

    /// Row additions, updates, removals and edits.
    fn manager(&self) -> ManagerBuilder<'_, Self> {
        ManagerBuilder::new(self)
    }

    /// Typed event subscriptions.
    fn events(&self) -> EventSubscriber<'_, Self> {
        EventSubscriber::new(self)
    }
}

impl<T: GridApi + ?Sized> GridApiExt for T {}
