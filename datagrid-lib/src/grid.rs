//! Grid handle.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::Instant;

use serde_json::Value;

use crate::api::GridApi;
use crate::command::Command;
use crate::command::ExecuteReport;
use crate::command::GridState;
use crate::command::SelectionOp;
use crate::command::SortOp;
use crate::command::UpdateBatch;
use crate::command::execute_batch;
use crate::config::GridConfig;
use crate::error::GridError;
use crate::event::EventBus;
use crate::event::EventKind;
use crate::event::ExpandedChangedEvent;
use crate::event::GridEvent;
use crate::event::Listener;
use crate::event::PaginationChangedEvent;
use crate::event::RowClickedEvent;
use crate::event::RowDataChangedEvent;
use crate::event::Subscription;
use crate::export::ClipboardProvider;
use crate::export::CsvOptions;
use crate::export::export_to_csv;
use crate::export::parse_tsv;
use crate::export::plan_paste;
use crate::export::rows_to_tsv;
use crate::group::ExpandState;
use crate::ingress::IngressPolicy;
use crate::model::ColumnDef;
use crate::model::Direction;
use crate::model::FilterModel;
use crate::model::MIN_COLUMN_WIDTH;
use crate::model::PaginationState;
use crate::model::Pinned;
use crate::model::ProcessedColumn;
use crate::model::RowIdSource;
use crate::model::RowNode;
use crate::model::SortItem;
use crate::model::SortModel;
use crate::model::find_column;
use crate::model::process_columns;
use crate::selection::DragSelection;
use crate::server::ServerRequest;
use crate::server::ServerRowStore;
use crate::server::ServerSideDataSource;
use crate::server::ServerSnapshot;
use crate::value::get_path;
use crate::value::get_path_mut;
use crate::value::set_path;
use crate::view::ClickDetector;
use crate::view::ClickType;
use crate::view::VirtualWindow;
use crate::view::scroll_to_index;
use crate::view::visible_window;

/// A click waiting for its click type to resolve.
#[derive(Debug, Clone)]
struct PendingClick {
    row_id: String,
    shift: bool,
    ctrl: bool,
}

struct GridInner {
    state: GridState,
    config: GridConfig,
    clicks: ClickDetector,
    pending_click: Option<PendingClick>,
    drag: DragSelection,
    clipboard: Option<Arc<dyn ClipboardProvider>>,
    server: Option<ServerRowStore>,
}

impl GridInner {
    fn row(&self, id: &str) -> Option<RowNode> {
        let location = self.state.locate(id)?;
        let data = self.state.datum(&location)?;
        Some(
            self.state
                .model
                .materializer()
                .materialize(id.to_string(), data, location.root),
        )
    }

    /// Visible column definitions in display order.
    fn display_columns(&self) -> Vec<ColumnDef> {
        process_columns(&self.state.model.columns, self.config.container_width)
            .into_iter()
            .map(|column| column.def)
            .collect()
    }

    fn server_request(&self) -> ServerRequest {
        let model = &self.state.model;
        ServerRequest {
            page: model.pagination.current_page,
            page_size: model.pagination.page_size,
            sort_model: model.sort_model.clone(),
            filter_model: model.filter_model.clone(),
            quick_filter_text: model.quick_filter.clone(),
        }
    }
}

/// A grid instance.
///
/// `Grid` is a cheap, cloneable handle: clones share one state. Every
/// mutation takes the state lock once, and listeners run after the lock is
/// released, so a listener may call back into the grid.
///
/// # Example
///
/// ```
/// use datagrid_lib::Grid;
/// use datagrid_lib::GridApi;
/// use datagrid_lib::GridApiExt;
/// use datagrid_lib::GridConfig;
/// use datagrid_lib::model::ColumnDef;
/// use datagrid_lib::model::SortItem;
/// use serde_json::json;
///
/// let grid = Grid::new("orders", GridConfig::default().id_field("id"))
///     .with_columns(vec![ColumnDef::new("id"), ColumnDef::new("total")])
///     .with_rows(vec![
///         json!({ "id": "a", "total": 30 }),
///         json!({ "id": "b", "total": 10 }),
///     ]);
///
/// grid.params().set_sort_model(vec![SortItem::asc("total")]).execute();
/// let ids: Vec<_> = grid.get_displayed_rows().into_iter().map(|r| r.id).collect();
/// assert_eq!(ids, ["b", "a"]);
/// ```
#[derive(Clone)]
pub struct Grid {
    id: String,
    inner: Arc<RwLock<GridInner>>,
    bus: EventBus,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Grid {
    /// Creates an empty grid on its own event bus.
    pub fn new(id: impl Into<String>, config: GridConfig) -> Self {
        let mut state = GridState {
            selection_mode: config.selection_mode,
            ..Default::default()
        };
        state.model.row_id = config.row_id_source();
        state.model.group_mode = config.group_mode();
        state.model.expand = ExpandState::new(config.expand_groups_by_default);
        state.model.pagination = PaginationState::new(config.pagination, config.page_size);
        state.model.server_mode = config.server_mode;

        let inner = GridInner {
            state,
            clicks: ClickDetector::new(config.click_quiet_period_duration()),
            pending_click: None,
            drag: DragSelection::new(),
            clipboard: None,
            server: None,
            config,
        };
        Self {
            id: id.into(),
            inner: Arc::new(RwLock::new(inner)),
            bus: EventBus::new(),
        }
    }

    /// Moves the grid onto a shared bus. Call before registering listeners
    /// or a data source.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Replaces the row id source.
    pub fn with_row_id(self, row_id: RowIdSource) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.state.model.row_id = row_id;
        }
        self
    }

    pub fn with_columns(self, columns: Vec<ColumnDef>) -> Self {
        self.set_columns(columns);
        self
    }

    /// Loads initial rows without firing events.
    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.state.baseline = rows.clone();
            inner.state.raw = rows;
            inner.state.sync_pagination();
        }
        self
    }

    pub fn with_clipboard(self, clipboard: Arc<dyn ClipboardProvider>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.clipboard = Some(clipboard);
        }
        self
    }

    /// Switches the grid to server mode backed by `source`.
    ///
    /// Nothing is fetched until [`refresh_server_rows`](Self::refresh_server_rows)
    /// runs; after that, filter, sort and page changes refetch on their own.
    pub fn with_data_source(self, source: Arc<dyn ServerSideDataSource>) -> Self {
        let cache = self.read(|inner| inner.config.page_cache()).unwrap_or_default();
        let store = ServerRowStore::with_cache(source, cache);
        let weak = Arc::downgrade(&self.inner);
        let id = self.id.clone();
        let bus = self.bus.clone();
        store.subscribe(move |snapshot| {
            if let Some(inner) = weak.upgrade() {
                let grid = Grid {
                    id: id.clone(),
                    inner,
                    bus: bus.clone(),
                };
                grid.apply_server_snapshot(snapshot);
            }
        });

        if let Ok(mut inner) = self.inner.write() {
            inner.server = Some(store);
            inner.config.server_mode = true;
            inner.state.model.server_mode = true;
        }
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> GridConfig {
        self.read(|inner| inner.config.clone()).unwrap_or_default()
    }

    /// Ingress rules other origins are checked against.
    pub fn ingress_policy(&self) -> IngressPolicy {
        self.read(|inner| IngressPolicy::from_rules(inner.config.ingress.clone()))
            .unwrap_or_else(|| IngressPolicy::restricted(Vec::new()))
    }

    /// A copy of the full grid state.
    pub fn state(&self) -> GridState {
        self.read(|inner| inner.state.clone()).unwrap_or_default()
    }

    /// Rows after filter, sort and grouping, across all pages.
    pub fn get_processed_rows(&self) -> Vec<RowNode> {
        self.read(|inner| inner.state.processed()).unwrap_or_default()
    }

    // =========================================================================
    // Locking and dispatch
    // =========================================================================

    fn read<R>(&self, f: impl FnOnce(&GridInner) -> R) -> Option<R> {
        match self.inner.read() {
            Ok(inner) => Some(f(&inner)),
            Err(_) => {
                log::error!("grid '{}' state lock poisoned", self.id);
                None
            }
        }
    }

    fn dispatch(&self, events: &[GridEvent]) {
        for event in events {
            self.bus.fire_event(&self.id, event);
        }
    }

    /// Runs `f` under the write lock, re-derives pagination, then dispatches
    /// the returned events. An error leaves the state as `f` found it.
    fn mutate(&self, f: impl FnOnce(&mut GridInner) -> Result<Vec<GridEvent>, GridError>) -> ExecuteReport {
        let result = match self.inner.write() {
            Ok(mut inner) => {
                let before = inner.state.model.pagination;
                f(&mut inner).map(|mut events| {
                    inner.state.sync_pagination();
                    let actual = inner.state.model.pagination;
                    if before != actual {
                        events.push(GridEvent::PaginationChanged(PaginationChangedEvent {
                            old: before,
                            actual,
                        }));
                    }
                    events
                })
            }
            Err(_) => {
                log::error!("grid '{}' state lock poisoned", self.id);
                Ok(Vec::new())
            }
        };

        match result {
            Ok(events) => {
                self.dispatch(&events);
                ExecuteReport {
                    events,
                    dropped: Vec::new(),
                }
            }
            Err(error) => {
                log::warn!("{}", error);
                ExecuteReport {
                    events: Vec::new(),
                    dropped: vec![error],
                }
            }
        }
    }

    /// Executes a batch without ingress checks.
    fn commit(&self, batch: UpdateBatch) -> ExecuteReport {
        let report = match self.inner.write() {
            Ok(mut inner) => execute_batch(batch, &mut inner.state),
            Err(_) => {
                log::error!("grid '{}' state lock poisoned", self.id);
                return ExecuteReport::default();
            }
        };
        self.dispatch(&report.events);

        let refetch = report.events.iter().any(|event| {
            matches!(
                event,
                GridEvent::FilterChanged(_) | GridEvent::SortChanged(_) | GridEvent::PaginationChanged(_)
            )
        });
        if refetch
            && self.read(|inner| inner.server.is_some()).unwrap_or(false)
            && let Err(error) = self.refresh_server_rows()
        {
            log::warn!("server refresh after '{}' change failed: {}", self.id, error);
        }
        report
    }

    fn single(action: &'static str, command: Command) -> UpdateBatch {
        let mut batch = UpdateBatch::new();
        batch.push(action, command);
        batch
    }

    // =========================================================================
    // Rows and edits
    // =========================================================================

    /// Replaces the rows from outside, dropping every pending edit.
    pub fn set_row_data(&self, rows: Vec<Value>) -> ExecuteReport {
        let mut batch = UpdateBatch::new();
        batch.push("api.resetEdits", Command::ResetEdits);
        batch.push("api.updateRowData", Command::UpdateRowData(rows));
        self.commit(batch)
    }

    /// Records a pending edit.
    pub fn edit_cell(&self, row_id: &str, field: &str, value: Value) -> ExecuteReport {
        self.commit(Self::single(
            "manager.updateCell",
            Command::UpdateCell {
                row_id: row_id.to_string(),
                field: field.to_string(),
                value,
            },
        ))
    }

    /// `(row id, field)` of every pending edit.
    pub fn dirty_cells(&self) -> Vec<(String, String)> {
        self.read(|inner| {
            inner
                .state
                .model
                .overrides
                .iter()
                .map(|(row_id, field, _)| (row_id.to_string(), field.to_string()))
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn is_cell_dirty(&self, row_id: &str, field: &str) -> bool {
        self.read(|inner| inner.state.model.overrides.is_dirty(row_id, field))
            .unwrap_or(false)
    }

    /// Writes every pending edit into the raw rows and clears the edits.
    pub fn commit_edits(&self) -> ExecuteReport {
        self.mutate(|inner| {
            let state = &mut inner.state;
            let edits: Vec<(String, String, Value)> = state
                .model
                .overrides
                .iter()
                .map(|(row_id, field, value)| (row_id.to_string(), field.to_string(), value.clone()))
                .collect();
            if edits.is_empty() {
                return Ok(Vec::new());
            }

            let mut updated: Vec<String> = Vec::new();
            for (row_id, field, value) in edits {
                if let Some(location) = state.locate(&row_id)
                    && let Some(datum) = state.datum_mut(&location)
                {
                    set_path(datum, &field, value);
                    if !updated.contains(&row_id) {
                        updated.push(row_id);
                    }
                }
            }
            state.model.overrides.clear();
            log::debug!("committed edits of {} row(s)", updated.len());
            Ok(vec![GridEvent::RowDataChanged(RowDataChangedEvent {
                added: Vec::new(),
                updated,
                removed: Vec::new(),
                total_rows: state.raw.len(),
            })])
        })
    }

    /// Appends a child to a row's children array. Parent/child mode only.
    pub fn add_child_to_row(&self, parent_id: &str, child: Value) -> ExecuteReport {
        self.mutate(|inner| {
            let state = &mut inner.state;
            let Some(field) = state.children_field().map(str::to_string) else {
                return Err(GridError::malformed("addChildToRow", "grid has no tree children field"));
            };
            let location = state
                .locate(parent_id)
                .ok_or_else(|| GridError::row_not_found(parent_id))?;
            let datum = state
                .datum_mut(&location)
                .ok_or_else(|| GridError::row_not_found(parent_id))?;

            if !matches!(get_path(datum, &field), Some(Value::Array(_))) {
                set_path(datum, &field, Value::Array(Vec::new()));
            }
            let Some(Value::Array(children)) = get_path_mut(datum, &field) else {
                return Err(GridError::malformed("addChildToRow", "children field is not an array"));
            };
            children.push(child.clone());
            let index = children.len() - 1;

            let child_id = state.model.row_id.resolve_child(&child, parent_id, index);
            state.model.expand.set_row_expanded(parent_id, true);
            Ok(vec![GridEvent::RowDataChanged(RowDataChangedEvent {
                added: vec![child_id],
                updated: vec![parent_id.to_string()],
                removed: Vec::new(),
                total_rows: state.raw.len(),
            })])
        })
    }

    /// Moves a root row to `to_index` in the raw row order.
    pub fn move_row(&self, id: &str, to_index: usize) -> ExecuteReport {
        self.mutate(|inner| {
            let state = &mut inner.state;
            let location = state.locate(id).ok_or_else(|| GridError::row_not_found(id))?;
            if !location.path.is_empty() {
                return Err(GridError::malformed("moveRow", "only root rows can be moved"));
            }
            let to_index = to_index.min(state.raw.len() - 1);
            if location.root == to_index {
                return Ok(Vec::new());
            }
            let row = state.raw.remove(location.root);
            state.raw.insert(to_index, row);
            Ok(vec![GridEvent::RowDataChanged(RowDataChangedEvent {
                added: Vec::new(),
                updated: vec![id.to_string()],
                removed: Vec::new(),
                total_rows: state.raw.len(),
            })])
        })
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Header-click sort cycle: none, ascending, descending, none.
    ///
    /// Without `multi` the clicked column replaces the sort model; with it
    /// the column is added, flipped or removed in place.
    pub fn toggle_sort(&self, field: &str, multi: bool) -> ExecuteReport {
        let next = self.read(|inner| {
            let model = &inner.state.model;
            if let Some(column) = find_column(&model.columns, field)
                && !column.sortable
            {
                return None;
            }
            Some(cycle_sort(&model.sort_model, field, multi))
        });
        match next.flatten() {
            Some(model) => self.commit(Self::single("api.setSortModel", Command::Sort(SortOp::Set(model)))),
            None => ExecuteReport::default(),
        }
    }

    // =========================================================================
    // Expand / collapse
    // =========================================================================

    pub fn set_group_expanded(&self, group_id: &str, expanded: bool) -> ExecuteReport {
        self.mutate(|inner| {
            let state = &mut inner.state;
            let all = state.group_ids();
            if !all.iter().any(|id| id == group_id) {
                return Err(GridError::row_not_found(group_id));
            }
            if !state.model.expand.set_group_expanded(group_id, expanded, &all) {
                return Ok(Vec::new());
            }
            Ok(vec![GridEvent::ExpandedChanged(ExpandedChangedEvent {
                id: group_id.to_string(),
                expanded,
                is_group: true,
            })])
        })
    }

    pub fn toggle_group(&self, group_id: &str) -> ExecuteReport {
        let expanded = self
            .read(|inner| inner.state.model.expand.is_group_expanded(group_id))
            .unwrap_or(false);
        self.set_group_expanded(group_id, !expanded)
    }

    /// Expands or collapses every group and makes that the default for
    /// groups that appear later.
    pub fn set_all_groups_expanded(&self, expanded: bool) -> ExecuteReport {
        self.mutate(|inner| {
            let state = &mut inner.state;
            let all = state.group_ids();
            let before: Vec<bool> = all
                .iter()
                .map(|id| state.model.expand.is_group_expanded(id))
                .collect();

            state.model.expand.groups.clear();
            state.model.expand.groups_by_default = expanded;

            Ok(all
                .into_iter()
                .zip(before)
                .filter(|(_, was)| *was != expanded)
                .map(|(id, _)| {
                    GridEvent::ExpandedChanged(ExpandedChangedEvent {
                        id,
                        expanded,
                        is_group: true,
                    })
                })
                .collect())
        })
    }

    /// Expands or collapses a tree parent.
    pub fn set_row_expanded(&self, row_id: &str, expanded: bool) -> ExecuteReport {
        self.mutate(|inner| {
            let state = &mut inner.state;
            if !state.contains(row_id) {
                return Err(GridError::row_not_found(row_id));
            }
            if !state.model.expand.set_row_expanded(row_id, expanded) {
                return Ok(Vec::new());
            }
            Ok(vec![GridEvent::ExpandedChanged(ExpandedChangedEvent {
                id: row_id.to_string(),
                expanded,
                is_group: false,
            })])
        })
    }

    pub fn toggle_row(&self, row_id: &str) -> ExecuteReport {
        let expanded = self
            .read(|inner| inner.state.model.expand.is_row_expanded(row_id))
            .unwrap_or(false);
        self.set_row_expanded(row_id, !expanded)
    }

    // =========================================================================
    // Columns
    // =========================================================================

    pub fn set_columns(&self, columns: Vec<ColumnDef>) -> ExecuteReport {
        self.mutate(|inner| {
            inner.state.model.columns = columns;
            Ok(Vec::new())
        })
    }

    /// Fixes a column's width, clamped to its bounds. The column stops
    /// flexing.
    pub fn set_column_width(&self, field: &str, width: f64) -> ExecuteReport {
        self.update_column("setColumnWidth", field, |column| {
            let min = column.min_width.unwrap_or(MIN_COLUMN_WIDTH).max(MIN_COLUMN_WIDTH);
            let max = column.max_width.unwrap_or(f64::INFINITY).max(min);
            column.width = Some(width.clamp(min, max));
            column.flex = None;
        })
    }

    pub fn pin_column(&self, field: &str, pinned: Option<Pinned>) -> ExecuteReport {
        self.update_column("pinColumn", field, |column| column.pinned = pinned)
    }

    pub fn set_column_hidden(&self, field: &str, hidden: bool) -> ExecuteReport {
        self.update_column("setColumnHidden", field, |column| column.hidden = hidden)
    }

    /// Moves a column to `to_index` in definition order.
    pub fn move_column(&self, field: &str, to_index: usize) -> ExecuteReport {
        self.mutate(|inner| {
            let columns = &mut inner.state.model.columns;
            let from = columns
                .iter()
                .position(|c| c.field == field)
                .ok_or_else(|| GridError::malformed("moveColumn", format!("unknown column '{}'", field)))?;
            let column = columns.remove(from);
            let to_index = to_index.min(columns.len());
            columns.insert(to_index, column);
            Ok(Vec::new())
        })
    }

    pub fn set_container_width(&self, width: f64) {
        if let Ok(mut inner) = self.inner.write() {
            inner.config.container_width = width.max(0.0);
        }
    }

    fn update_column(&self, command: &'static str, field: &str, f: impl FnOnce(&mut ColumnDef)) -> ExecuteReport {
        self.mutate(|inner| {
            let column = inner
                .state
                .model
                .columns
                .iter_mut()
                .find(|c| c.field == field)
                .ok_or_else(|| GridError::malformed(command, format!("unknown column '{}'", field)))?;
            f(column);
            Ok(Vec::new())
        })
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    /// A click on a row at `now`.
    ///
    /// Selection applies immediately: shift selects the range from the
    /// anchor, anything else toggles the row. The click type is reported
    /// later as `rowClicked`, once the quiet period passes
    /// ([`poll_clicks`](Self::poll_clicks)) or a click lands on another row.
    pub fn row_clicked(&self, id: &str, shift: bool, ctrl: bool, now: Instant) -> ExecuteReport {
        let prepared = match self.inner.write() {
            Ok(mut inner) => {
                if !inner.state.contains(id) {
                    None
                } else {
                    let selected = shift || !inner.state.model.selection.is_selected(id);
                    let switched_rows = inner
                        .pending_click
                        .as_ref()
                        .is_some_and(|pending| pending.row_id != id);
                    let resolved = if switched_rows {
                        inner.clicks.flush()
                    } else {
                        inner.clicks.poll(now)
                    };
                    let resolved = resolved.and_then(|click_type| {
                        inner
                            .pending_click
                            .take()
                            .map(|pending| (pending, click_type))
                    });
                    inner.clicks.click(now);
                    inner.pending_click = Some(PendingClick {
                        row_id: id.to_string(),
                        shift,
                        ctrl,
                    });
                    Some((selected, resolved))
                }
            }
            Err(_) => None,
        };
        let Some((selected, resolved)) = prepared else {
            let error = GridError::row_not_found(id);
            log::warn!("{}", error);
            return ExecuteReport {
                events: Vec::new(),
                dropped: vec![error],
            };
        };

        let click_event = resolved.and_then(|(pending, click_type)| self.click_event(pending, click_type));
        if let Some(event) = &click_event {
            self.dispatch(std::slice::from_ref(event));
        }

        let mut report = self.commit(Self::single(
            "api.selectRow",
            Command::Selection(SelectionOp::SelectRow {
                id: id.to_string(),
                selected,
                shift,
                ctrl,
            }),
        ));
        if let Some(event) = click_event {
            report.events.insert(0, event);
        }
        report
    }

    /// Resolves a pending click whose quiet period has passed and fires
    /// `rowClicked`.
    pub fn poll_clicks(&self, now: Instant) -> Option<ClickType> {
        let resolved = match self.inner.write() {
            Ok(mut inner) => inner
                .clicks
                .poll(now)
                .and_then(|click_type| inner.pending_click.take().map(|pending| (pending, click_type))),
            Err(_) => None,
        };
        let (pending, click_type) = resolved?;
        if let Some(event) = self.click_event(pending, click_type) {
            self.dispatch(&[event]);
        }
        Some(click_type)
    }

    /// When the pending click resolves, for the caller's timer.
    pub fn click_deadline(&self) -> Option<Instant> {
        self.read(|inner| inner.clicks.deadline()).flatten()
    }

    fn click_event(&self, pending: PendingClick, click_type: ClickType) -> Option<GridEvent> {
        let row = self.read(|inner| inner.row(&pending.row_id)).flatten()?;
        Some(GridEvent::RowClicked(RowClickedEvent {
            row,
            click_type,
            shift: pending.shift,
            ctrl: pending.ctrl,
        }))
    }

    /// Mouse button pressed on a row; starts a possible drag selection.
    pub fn row_mouse_down(&self, id: &str) {
        if let Ok(mut inner) = self.inner.write() {
            let selected = inner.state.model.selection.is_selected(id);
            inner.drag.mouse_down(id, selected);
        }
    }

    /// Pointer entered a row with the button held.
    pub fn row_mouse_enter(&self, id: &str) -> ExecuteReport {
        let changes = match self.inner.write() {
            Ok(mut inner) => inner.drag.mouse_enter(id),
            Err(_) => Vec::new(),
        };
        if changes.is_empty() {
            return ExecuteReport::default();
        }
        let mut batch = UpdateBatch::new();
        for (row_id, selected) in changes {
            batch.push(
                "api.selectRows",
                Command::Selection(SelectionOp::SelectRows {
                    ids: vec![row_id],
                    selected,
                }),
            );
        }
        self.commit(batch)
    }

    /// Mouse button released. Returns `true` if the gesture was a drag; a
    /// plain click should then go through [`row_clicked`](Self::row_clicked).
    pub fn row_mouse_up(&self) -> bool {
        match self.inner.write() {
            Ok(mut inner) => inner.drag.mouse_up(),
            Err(_) => false,
        }
    }

    // =========================================================================
    // Virtualization
    // =========================================================================

    /// Rows to render for a scroll position over the current page.
    pub fn visible_window(&self, scroll_top: f64, viewport_height: f64) -> VirtualWindow {
        self.read(|inner| {
            visible_window(
                inner.state.displayed().len(),
                inner.config.row_height,
                scroll_top,
                viewport_height,
                inner.config.overscan,
            )
        })
        .unwrap_or(VirtualWindow {
            range: 0..0,
            offset_top: 0.0,
            total_height: 0.0,
        })
    }

    /// Scroll position that brings a displayed row into view.
    pub fn scroll_to_row(&self, id: &str, scroll_top: f64, viewport_height: f64) -> Option<f64> {
        self.read(|inner| {
            let index = inner.state.displayed().iter().position(|row| row.id == id)?;
            scroll_to_index(index, inner.config.row_height, scroll_top, viewport_height)
        })
        .flatten()
    }

    // =========================================================================
    // Server mode
    // =========================================================================

    /// Requests the rows for the current page, sort and filter from the
    /// data source and applies whatever the store has right now.
    pub fn refresh_server_rows(&self) -> Result<ServerSnapshot, GridError> {
        let target = self
            .read(|inner| inner.server.clone().map(|store| (store, inner.server_request())))
            .flatten();
        let Some((store, request)) = target else {
            return Err(GridError::malformed("refreshServerRows", "grid has no server data source"));
        };
        let snapshot = store.snapshot(&request)?;
        self.apply_server_snapshot(&snapshot);
        Ok(snapshot)
    }

    /// The server store's last snapshot.
    pub fn server_snapshot(&self) -> Option<ServerSnapshot> {
        self.read(|inner| inner.server.as_ref().map(ServerRowStore::current))
            .flatten()
    }

    fn apply_server_snapshot(&self, snapshot: &ServerSnapshot) {
        let events = match self.inner.write() {
            Ok(mut inner) => {
                let state = &mut inner.state;
                let mut events = Vec::new();
                if state.raw != snapshot.rows {
                    let old_ids = root_ids(&state.model.row_id, &state.raw);
                    let new_ids = root_ids(&state.model.row_id, &snapshot.rows);
                    state.raw = snapshot.rows.clone();
                    state.baseline = snapshot.rows.clone();
                    state.model.overrides.retain_rows(|id| new_ids.iter().any(|new_id| new_id == id));
                    let old_set: HashSet<&String> = old_ids.iter().collect();
                    let new_set: HashSet<&String> = new_ids.iter().collect();
                    events.push(GridEvent::RowDataChanged(RowDataChangedEvent {
                        added: new_ids.iter().filter(|id| !old_set.contains(id)).cloned().collect(),
                        updated: Vec::new(),
                        removed: old_ids.iter().filter(|id| !new_set.contains(id)).cloned().collect(),
                        total_rows: state.raw.len(),
                    }));
                }
                let before = state.model.pagination;
                state.model.pagination.set_total_rows(snapshot.total_rows);
                if before != state.model.pagination {
                    events.push(GridEvent::PaginationChanged(PaginationChangedEvent {
                        old: before,
                        actual: state.model.pagination,
                    }));
                }
                events
            }
            Err(_) => Vec::new(),
        };
        self.dispatch(&events);
    }
}

fn root_ids(row_id: &RowIdSource, rows: &[Value]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .map(|(index, data)| row_id.resolve(data, index))
        .collect()
}

/// Next sort model after a header click on `field`.
fn cycle_sort(current: &SortModel, field: &str, multi: bool) -> SortModel {
    let next = match current.iter().find(|item| item.field == field).map(|item| item.direction) {
        None => Some(Direction::Asc),
        Some(Direction::Asc) => Some(Direction::Desc),
        Some(Direction::Desc) => None,
    };
    let mut model: SortModel = if multi {
        current.clone()
    } else {
        current.iter().filter(|item| item.field == field).cloned().collect()
    };
    match next {
        Some(direction) => match model.iter_mut().find(|item| item.field == field) {
            Some(item) => item.direction = direction,
            None => model.push(SortItem {
                field: field.to_string(),
                direction,
            }),
        },
        None => model.retain(|item| item.field != field),
    }
    model
}

impl GridApi for Grid {
    fn grid_id(&self) -> &str {
        &self.id
    }

    fn get_row_data(&self) -> Vec<Value> {
        self.read(|inner| inner.state.raw.clone()).unwrap_or_default()
    }

    fn get_displayed_rows(&self) -> Vec<RowNode> {
        self.read(|inner| inner.state.displayed()).unwrap_or_default()
    }

    fn get_row(&self, id: &str) -> Option<RowNode> {
        self.read(|inner| inner.row(id)).flatten()
    }

    fn get_selected_rows(&self) -> Vec<RowNode> {
        self.read(|inner| {
            let selection = &inner.state.model.selection;
            let mut ids = selection.selected_in_order(&inner.state.selectable_ids());
            for id in selection.selected() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            ids.iter().filter_map(|id| inner.row(id)).collect()
        })
        .unwrap_or_default()
    }

    fn get_selected_ids(&self) -> Vec<String> {
        self.read(|inner| inner.state.model.selection.selected())
            .unwrap_or_default()
    }

    fn get_filter_model(&self) -> FilterModel {
        self.read(|inner| inner.state.model.filter_model.clone())
            .unwrap_or_default()
    }

    fn get_sort_model(&self) -> SortModel {
        self.read(|inner| inner.state.model.sort_model.clone())
            .unwrap_or_default()
    }

    fn get_quick_filter(&self) -> String {
        self.read(|inner| inner.state.model.quick_filter.clone())
            .unwrap_or_default()
    }

    fn get_pagination(&self) -> PaginationState {
        self.read(|inner| inner.state.model.pagination)
            .unwrap_or_default()
    }

    fn get_columns(&self) -> Vec<ProcessedColumn> {
        self.read(|inner| process_columns(&inner.state.model.columns, inner.config.container_width))
            .unwrap_or_default()
    }

    fn execute(&self, batch: UpdateBatch) -> ExecuteReport {
        self.commit(batch)
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> Subscription {
        let id = self.bus.add_event_listener(&self.id, kind, listener);
        Subscription::active(self.bus.clone(), self.id.clone(), kind, id)
    }

    fn export_to_csv(&self, options: &CsvOptions) -> String {
        self.read(|inner| {
            let rows = if options.all_pages {
                inner.state.processed()
            } else {
                inner.state.displayed()
            };
            let columns = match options.columns {
                Some(_) => inner.state.model.columns.clone(),
                None => inner.display_columns(),
            };
            export_to_csv(&rows, &columns, options)
        })
        .unwrap_or_default()
    }

    fn copy_to_clipboard(&self) -> Result<(), GridError> {
        let prepared = self.read(|inner| {
            let clipboard = inner.clipboard.clone();
            let selected: Vec<RowNode> = inner
                .state
                .processed()
                .into_iter()
                .filter(|row| row.is_data() && row.selected)
                .collect();
            let rows = if selected.is_empty() {
                inner.state.displayed()
            } else {
                selected
            };
            (clipboard, rows_to_tsv(&rows, &inner.display_columns(), false))
        });
        let Some((Some(clipboard), text)) = prepared else {
            log::warn!("copy on grid '{}': no clipboard provider", self.id);
            return Err(GridError::ClipboardUnavailable);
        };
        clipboard.write_text(&text)?;
        log::debug!("copied {} line(s) from grid '{}'", text.lines().count(), self.id);
        Ok(())
    }

    fn paste_from_clipboard(&self) -> Result<usize, GridError> {
        let Some(clipboard) = self.read(|inner| inner.clipboard.clone()).flatten() else {
            log::warn!("paste on grid '{}': no clipboard provider", self.id);
            return Err(GridError::ClipboardUnavailable);
        };
        let cells = parse_tsv(&clipboard.read_text()?);
        if cells.is_empty() {
            return Ok(0);
        }

        let edits = self
            .read(|inner| {
                let rows: Vec<RowNode> = inner
                    .state
                    .displayed()
                    .into_iter()
                    .filter(RowNode::is_data)
                    .collect();
                let anchor_row = rows.iter().position(|row| row.selected).unwrap_or(0);
                let columns = inner.display_columns();
                let columns: Vec<&ColumnDef> = columns.iter().collect();
                let anchor_column = columns.iter().position(|c| c.editable).unwrap_or(0);
                plan_paste(&cells, &rows, &columns, anchor_row, anchor_column)
            })
            .unwrap_or_default();
        if edits.is_empty() {
            return Ok(0);
        }

        let count = edits.len();
        let mut batch = UpdateBatch::new();
        for edit in edits {
            batch.push(
                "manager.updateCell",
                Command::UpdateCell {
                    row_id: edit.row_id,
                    field: edit.field,
                    value: edit.value,
                },
            );
        }
        self.commit(batch);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::GridApiExt;
    use crate::export::MemoryClipboard;
    use crate::selection::SelectionMode;

    fn people() -> Grid {
        Grid::new(
            "people",
            GridConfig::default()
                .id_field("id")
                .selection_mode(SelectionMode::Multiple),
        )
        .with_columns(vec![
            ColumnDef::new("id"),
            ColumnDef::new("name").editable(),
            ColumnDef::new("age").editable(),
        ])
        .with_rows(vec![
            json!({ "id": "1", "name": "Ada", "age": 36 }),
            json!({ "id": "2", "name": "Brian", "age": 41 }),
            json!({ "id": "3", "name": "Cleo", "age": 29 }),
        ])
    }

    #[test]
    fn test_cycle_sort() {
        let model = cycle_sort(&Vec::new(), "age", false);
        assert_eq!(model, vec![SortItem::asc("age")]);
        let model = cycle_sort(&model, "age", false);
        assert_eq!(model, vec![SortItem::desc("age")]);
        assert!(cycle_sort(&model, "age", false).is_empty());

        let multi = cycle_sort(&vec![SortItem::asc("name")], "age", true);
        assert_eq!(multi, vec![SortItem::asc("name"), SortItem::asc("age")]);
        let single = cycle_sort(&vec![SortItem::asc("name")], "age", false);
        assert_eq!(single, vec![SortItem::asc("age")]);
    }

    #[test]
    fn test_commit_edits_writes_raw_rows() {
        let grid = people();
        grid.edit_cell("2", "name", json!("Bea"));
        assert!(grid.is_cell_dirty("2", "name"));
        assert_eq!(grid.get_row_data()[1]["name"], json!("Brian"));

        let report = grid.commit_edits();
        assert!(report.changed());
        assert!(grid.dirty_cells().is_empty());
        assert_eq!(grid.get_row_data()[1]["name"], json!("Bea"));
    }

    #[test]
    fn test_row_clicked_toggles_and_reports_click_type() {
        let grid = people();
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let seen = clicks.clone();
        grid.events().on_row_clicked(move |event| {
            seen.lock().unwrap().push((event.row.id.clone(), event.click_type));
        });

        let start = Instant::now();
        grid.row_clicked("1", false, false, start);
        grid.row_clicked("1", false, false, start + Duration::from_millis(100));
        assert!(clicks.lock().unwrap().is_empty());

        assert_eq!(
            grid.poll_clicks(start + Duration::from_millis(400)),
            Some(ClickType::Double)
        );
        assert_eq!(*clicks.lock().unwrap(), vec![("1".to_string(), ClickType::Double)]);
        // Two toggles: selected, then deselected.
        assert!(grid.get_selected_ids().is_empty());
    }

    #[test]
    fn test_click_on_other_row_resolves_pending_click() {
        let grid = people();
        let start = Instant::now();
        grid.row_clicked("1", false, false, start);
        let report = grid.row_clicked("2", false, false, start + Duration::from_millis(50));
        assert!(matches!(
            report.events.first(),
            Some(GridEvent::RowClicked(event)) if event.row.id == "1" && event.click_type == ClickType::Single
        ));
        assert_eq!(grid.get_selected_ids(), vec!["1", "2"]);
    }

    #[test]
    fn test_drag_selection() {
        let grid = people();
        grid.row_mouse_down("1");
        assert!(!grid.row_mouse_enter("1").changed());
        grid.row_mouse_enter("2");
        grid.row_mouse_enter("3");
        grid.row_mouse_enter("2");
        assert!(grid.row_mouse_up());
        assert_eq!(grid.get_selected_ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_toggle_sort_skips_unsortable_columns() {
        let grid = people();
        grid.set_columns(vec![ColumnDef {
            sortable: false,
            ..ColumnDef::new("name")
        }]);
        assert!(!grid.toggle_sort("name", false).changed());
        assert!(grid.toggle_sort("age", false).changed());
        assert_eq!(grid.get_sort_model(), vec![SortItem::asc("age")]);
    }

    #[test]
    fn test_move_row_and_column() {
        let grid = people();
        grid.move_row("3", 0);
        let ids: Vec<_> = grid.get_displayed_rows().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["3", "1", "2"]);

        grid.move_column("age", 0);
        let fields: Vec<_> = grid.get_columns().into_iter().map(|c| c.def.field).collect();
        assert_eq!(fields, ["age", "id", "name"]);
        assert!(!grid.move_column("nope", 0).is_clean());
    }

    #[test]
    fn test_column_width_is_clamped() {
        let grid = people();
        grid.set_column_width("name", 5.0);
        let columns = grid.get_columns();
        let name = columns.iter().find(|c| c.def.field == "name").unwrap();
        assert_eq!(name.computed_width, MIN_COLUMN_WIDTH);
    }

    #[test]
    fn test_tree_add_child_and_expand() {
        let grid = Grid::new("tree", GridConfig::default().tree_children("children"))
            .with_rows(vec![json!({ "name": "root" })]);
        let report = grid.add_child_to_row("row-0", json!({ "name": "leaf" }));
        assert!(report.is_clean());

        let rows = grid.get_displayed_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, "row-0-0");

        grid.toggle_row("row-0");
        assert_eq!(grid.get_displayed_rows().len(), 1);
        assert!(!grid.add_child_to_row("missing", json!({})).is_clean());
    }

    #[test]
    fn test_group_expand_events() {
        let grid = Grid::new("groups", GridConfig::default().group_by(vec!["team".into()])).with_rows(vec![
            json!({ "team": "a" }),
            json!({ "team": "b" }),
            json!({ "team": "a" }),
        ]);
        assert_eq!(grid.get_displayed_rows().len(), 5);

        let report = grid.toggle_group("group:team=a");
        assert!(matches!(
            report.events.first(),
            Some(GridEvent::ExpandedChanged(event)) if !event.expanded && event.is_group
        ));
        assert_eq!(grid.get_displayed_rows().len(), 3);

        let report = grid.set_all_groups_expanded(false);
        let expanded_events = report
            .events
            .iter()
            .filter(|event| matches!(event, GridEvent::ExpandedChanged(_)))
            .count();
        assert_eq!(expanded_events, 1);
        assert_eq!(grid.get_displayed_rows().len(), 2);
        assert!(!grid.set_group_expanded("group:team=zzz", true).is_clean());
    }

    #[test]
    fn test_clipboard_copy_and_paste() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let grid = people().with_clipboard(clipboard.clone());

        grid.select_row("2", true);
        grid.copy_to_clipboard().unwrap();
        assert_eq!(clipboard.read_text().unwrap(), "2\tBrian\t41");

        clipboard.write_text("Zed\t50\nYan\t51").unwrap();
        assert_eq!(grid.paste_from_clipboard().unwrap(), 4);
        assert_eq!(grid.get_row("2").unwrap().data["name"], json!("Zed"));
        assert_eq!(grid.get_row("3").unwrap().data["age"], json!(51));
        let csv = grid.export_to_csv(&CsvOptions::default().skip_header().columns(vec!["age".into()]));
        assert_eq!(csv.lines().last(), Some("51"));
        assert_eq!(grid.get_row_data()[1]["name"], json!("Brian"));
    }

    #[test]
    fn test_clipboard_unavailable() {
        let grid = people();
        grid.select_row("1", true);
        assert!(matches!(grid.copy_to_clipboard(), Err(GridError::ClipboardUnavailable)));
        assert!(matches!(grid.paste_from_clipboard(), Err(GridError::ClipboardUnavailable)));
        assert_eq!(grid.get_selected_ids(), vec!["1"]);
        assert_eq!(grid.get_row("1").unwrap().data["name"], json!("Ada"));
    }

    #[test]
    fn test_visible_window_uses_config() {
        let grid = Grid::new("big", GridConfig::default().row_height(10.0).overscan(1))
            .with_rows((0..100).map(|i| json!({ "n": i })).collect());
        let window = grid.visible_window(200.0, 50.0);
        assert_eq!(window.range, 19..27);
        assert_eq!(window.total_height, 1000.0);
        assert_eq!(grid.scroll_to_row("row-50", 0.0, 50.0), Some(460.0));
    }
}
