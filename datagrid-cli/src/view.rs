//! Grid view files.

use std::fs;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use serde::Deserialize;
use serde_json::Value;

use datagrid_lib::Grid;
use datagrid_lib::GridApiExt;
use datagrid_lib::GridConfig;
use datagrid_lib::model::ColumnDef;
use datagrid_lib::model::FilterModel;
use datagrid_lib::model::SortModel;

/// Everything needed to reproduce what a user sees: grid config, columns
/// and the filter/sort/page state on top.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridView {
    pub config: GridConfig,
    /// Empty means one column per key of the first row.
    pub columns: Vec<ColumnDef>,
    pub filter_model: FilterModel,
    pub sort_model: SortModel,
    pub quick_filter: String,
    pub page: usize,
    pub selected: Vec<String>,
}

impl GridView {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading view {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing view {}", path.display()))
    }

    /// Builds a grid over `rows` and applies the view state in one batch.
    pub fn build(self, rows: Vec<Value>) -> Grid {
        let columns = if self.columns.is_empty() {
            infer_columns(&rows)
        } else {
            self.columns
        };
        log::debug!("building grid with {} row(s), {} column(s)", rows.len(), columns.len());

        let grid = Grid::new("cli", self.config).with_columns(columns).with_rows(rows);
        let mut params = grid
            .params()
            .set_filter_model(self.filter_model)
            .set_sort_model(self.sort_model)
            .set_quick_filter(self.quick_filter)
            .set_page(self.page);
        if !self.selected.is_empty() {
            params = params.select_rows(self.selected, true);
        }

        let report = params.execute();
        for dropped in &report.dropped {
            log::warn!("view state not applied: {}", dropped);
        }
        grid
    }
}

/// Reads a JSON array of row objects.
pub fn load_rows(path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading rows {}", path.display()))?;
    let value: Value = serde_json::from_str(&text).with_context(|| format!("parsing rows {}", path.display()))?;
    let Value::Array(rows) = value else {
        bail!("{} must contain a JSON array of rows", path.display());
    };
    Ok(rows)
}

/// One sortable, filterable column per top-level key of the first row.
pub fn infer_columns(rows: &[Value]) -> Vec<ColumnDef> {
    rows.first()
        .and_then(Value::as_object)
        .map(|object| object.keys().map(ColumnDef::new).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use datagrid_lib::GridApi;

    use super::*;

    #[test]
    fn test_view_applies_state() {
        let view: GridView = serde_json::from_value(json!({
            "config": { "idField": "id", "pagination": true, "pageSize": 1 },
            "columns": [{ "field": "id" }, { "field": "name", "headerName": "Name" }],
            "sortModel": [{ "field": "name", "direction": "desc" }],
            "page": 1
        }))
        .unwrap();

        let grid = view.build(vec![
            json!({ "id": "a", "name": "Ada" }),
            json!({ "id": "b", "name": "Brian" }),
        ]);
        let rows = grid.get_displayed_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "a");
        assert_eq!(grid.get_columns()[1].def.display_name(), "Name");
    }

    #[test]
    fn test_infer_columns() {
        let columns = infer_columns(&[json!({ "id": 1, "name": "x" })]);
        let fields: Vec<_> = columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["id", "name"]);
        assert!(infer_columns(&[]).is_empty());
    }
}
