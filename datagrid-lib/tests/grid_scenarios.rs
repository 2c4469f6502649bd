//! End-to-end grid behavior through the public API.

use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;
use serde_json::json;

use datagrid_lib::Grid;
use datagrid_lib::GridApi;
use datagrid_lib::GridApiExt;
use datagrid_lib::GridConfig;
use datagrid_lib::event::EventKind;
use datagrid_lib::event::GridEvent;
use datagrid_lib::export::CsvOptions;
use datagrid_lib::model::ColumnDef;
use datagrid_lib::model::FilterItem;
use datagrid_lib::model::SortItem;
use datagrid_lib::selection::SelectionMode;

fn rows() -> Vec<Value> {
    vec![
        json!({ "id": "1", "name": "Ada", "team": "core", "v": 3 }),
        json!({ "id": "2", "name": "Brian", "team": "web", "v": 1 }),
        json!({ "id": "3", "name": "Cleo", "team": "core", "v": 2 }),
    ]
}

fn grid_with(config: GridConfig) -> Grid {
    Grid::new("scenario", config.id_field("id"))
        .with_columns(vec![
            ColumnDef::new("id").header("Id"),
            ColumnDef::new("name").header("Name").editable(),
            ColumnDef::new("team").header("Team"),
            ColumnDef::new("v").header("Value"),
        ])
        .with_rows(rows())
}

fn grid() -> Grid {
    grid_with(GridConfig::default())
}

fn displayed_ids(grid: &Grid) -> Vec<String> {
    grid.get_displayed_rows().into_iter().map(|row| row.id).collect()
}

/// Records every event of every kind, in dispatch order.
fn record(grid: &Grid) -> Arc<Mutex<Vec<GridEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        let sink = events.clone();
        grid.add_event_listener(
            kind,
            Arc::new(move |event: &GridEvent| sink.lock().unwrap().push(event.clone())),
        );
    }
    events
}

// =============================================================================
// Pipeline
// =============================================================================

#[test]
fn sort_ascending_by_value() {
    let grid = grid();
    grid.set_sort_model(vec![SortItem::asc("v")]);
    assert_eq!(displayed_ids(&grid), ["2", "3", "1"]);
}

#[test]
fn sort_is_idempotent() {
    let grid = grid();
    grid.set_sort_model(vec![SortItem::desc("v")]);
    let first = displayed_ids(&grid);
    let report = grid.set_sort_model(vec![SortItem::desc("v")]);
    assert!(!report.changed());
    assert_eq!(displayed_ids(&grid), first);
}

#[test]
fn empty_select_filter_hides_everything() {
    let grid = grid();
    grid.set_filter_model(vec![FilterItem::select("team", Vec::<String>::new())]);
    assert!(grid.get_displayed_rows().is_empty());
}

#[test]
fn adding_filter_entries_never_grows_the_result() {
    let grid = grid();
    grid.set_filter_model(vec![FilterItem::equals("team", "core")]);
    let narrowed = displayed_ids(&grid);
    assert_eq!(narrowed, ["1", "3"]);

    grid.set_filter_model(vec![
        FilterItem::equals("team", "core"),
        FilterItem::greater_than("v", 2),
    ]);
    let narrower = displayed_ids(&grid);
    assert_eq!(narrower, ["1"]);
    assert!(narrower.iter().all(|id| narrowed.contains(id)));
}

#[test]
fn quick_filter_matches_visible_columns() {
    let grid = grid();
    grid.set_quick_filter("CLE");
    assert_eq!(displayed_ids(&grid), ["3"]);
    grid.params().set_quick_filter("").execute();
    assert_eq!(grid.get_displayed_rows().len(), 3);
}

#[test]
fn pagination_clamps_requested_page() {
    let grid = grid_with(GridConfig::default().paginate(2));
    let pagination = grid.get_pagination();
    assert_eq!(pagination.total_pages, 2);

    grid.set_page(10);
    let pagination = grid.get_pagination();
    assert_eq!(pagination.current_page, 1);
    assert_eq!(displayed_ids(&grid), ["3"]);
}

#[test]
fn filter_change_returns_to_first_page() {
    let grid = grid_with(GridConfig::default().paginate(1));
    grid.set_page(2);
    assert_eq!(grid.get_pagination().current_page, 2);

    grid.set_filter_model(vec![FilterItem::equals("team", "core")]);
    let pagination = grid.get_pagination();
    assert_eq!(pagination.current_page, 0);
    assert_eq!(pagination.total_rows, 2);
}

#[test]
fn grouping_by_team() {
    let grid = grid_with(GridConfig::default().group_by(vec!["team".into()]));
    let rows = grid.get_displayed_rows();
    let headers: Vec<_> = rows.iter().filter(|row| row.is_group()).collect();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[0].group().unwrap().leaf_count, 2);
    assert_eq!(rows.len(), 5);
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn add_then_update_in_one_manager_batch() {
    let grid = grid();
    let report = grid
        .manager()
        .update(vec![json!({ "id": "4", "v": 10 })])
        .add(vec![json!({ "id": "4", "name": "Dan", "v": 9 })])
        .execute();

    assert!(report.is_clean());
    let row = grid.get_row("4").unwrap();
    assert_eq!(row.data["v"], json!(10));
    assert_eq!(row.data["name"], json!("Dan"));
}

#[test]
fn one_execute_dispatches_one_event_per_change() {
    let grid = grid();
    let events = record(&grid);

    grid.params()
        .set_filter_model(vec![FilterItem::equals("team", "core")])
        .set_sort_model(vec![SortItem::desc("v")])
        .select_row("3", true)
        .execute();

    let events = events.lock().unwrap();
    let kinds: Vec<EventKind> = events.iter().map(GridEvent::kind).collect();
    assert_eq!(
        kinds,
        [
            EventKind::FilterChanged,
            EventKind::SortChanged,
            EventKind::PaginationChanged,
            EventKind::SelectionChanged,
        ]
    );
}

#[test]
fn listeners_observe_the_committed_state() {
    let grid = grid();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    let reader = grid.clone();
    grid.events().on_filter_changed(move |_| {
        let ids: Vec<String> = reader.get_displayed_rows().into_iter().map(|r| r.id).collect();
        sink.lock().unwrap().push((ids, reader.get_sort_model()));
    });

    grid.params()
        .set_sort_model(vec![SortItem::asc("v")])
        .set_filter_model(vec![FilterItem::equals("team", "core")])
        .execute();

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].0, ["3", "1"]);
    assert_eq!(observed[0].1, vec![SortItem::asc("v")]);
}

#[test]
fn cell_edit_reports_old_value_and_resets() {
    let grid = grid();
    let events = record(&grid);

    grid.manager().update_cell("2", "name", "Bea").execute();
    assert_eq!(grid.get_row("2").unwrap().data["name"], json!("Bea"));
    assert!(matches!(
        events.lock().unwrap().first(),
        Some(GridEvent::CellValueChanged(event))
            if event.old == Some(json!("Brian")) && event.actual == json!("Bea")
    ));

    grid.params().reset_cell("2", "name").execute();
    assert_eq!(grid.get_row("2").unwrap().data["name"], json!("Brian"));
}

#[test]
fn reset_state_restores_baseline_rows() {
    let grid = grid();
    grid.manager().add(vec![json!({ "id": "9", "v": 0 })]).execute();
    grid.set_sort_model(vec![SortItem::asc("v")]);
    assert_eq!(grid.get_row_data().len(), 4);

    grid.reset_state();
    assert_eq!(grid.get_row_data().len(), 3);
    assert!(grid.get_sort_model().is_empty());
}

#[test]
fn malformed_commands_are_dropped_without_aborting_the_batch() {
    let grid = grid();
    let report = grid
        .manager()
        .add(Vec::new())
        .remove(["missing"])
        .update(vec![json!({ "id": "1", "v": 30 })])
        .execute();

    assert_eq!(report.dropped.len(), 2);
    assert_eq!(grid.get_row("1").unwrap().data["v"], json!(30));
}

#[test]
fn removing_selected_rows_updates_selection() {
    let grid = grid_with(GridConfig::default().selection_mode(SelectionMode::Multiple));
    grid.select_rows(vec!["1".into(), "2".into()], true);
    let report = grid.manager().remove(["2"]).execute();

    assert_eq!(grid.get_selected_ids(), ["1"]);
    assert!(report
        .events
        .iter()
        .any(|event| matches!(event, GridEvent::SelectionChanged(e) if e.removed == ["2"])));
}

#[test]
fn selection_round_trip() {
    let grid = grid_with(GridConfig::default().selection_mode(SelectionMode::Multiple));
    grid.select_all();
    assert_eq!(grid.get_selected_rows().len(), 3);
    grid.deselect_all();
    assert!(grid.get_selected_ids().is_empty());
    assert!(!grid.deselect_all().changed());
}

#[test]
fn replace_all_merges_on_key() {
    let grid = grid();
    grid.manager()
        .replace_all_merged(vec![json!({ "name": "Ada", "v": 100 })], "name")
        .execute();

    let data = grid.get_row_data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], json!("1"));
    assert_eq!(data[0]["v"], json!(100));
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn csv_export_uses_headers_and_quotes() {
    let grid = grid();
    grid.manager().update_cell("1", "name", "Ada, Countess").execute();
    let csv = grid.export_to_csv(&CsvOptions::default().columns(vec!["id".into(), "name".into()]));
    assert_eq!(csv, "Id,Name\n1,\"Ada, Countess\"\n2,Brian\n3,Cleo");

    let body = grid.export_to_csv(&CsvOptions::default().skip_header().columns(vec!["v".into()]));
    assert_eq!(body, "3\n1\n2");
}
