//! Row transformation pipeline.
//!
//! Pure stages composed in a fixed order:
//!
//! 1. [`apply_overrides`] - ids, pending edits, selection flags
//! 2. [`filter_rows`] - filter model AND quick filter
//! 3. [`sort_rows`] - stable multi-key sort
//! 4. grouping / tree expansion (see [`crate::group`])
//! 5. [`paginate_rows`] - the current page
//!
//! Only filtering and pagination shrink the list. [`display`] runs them all.

mod filter;
mod materialize;
mod paginate;
mod sort;

pub use filter::*;
pub use materialize::*;
pub use paginate::*;
pub use sort::*;

use serde_json::Value;

use crate::group::ExpandState;
use crate::group::GroupMode;
use crate::group::build_tree;
use crate::group::flatten;
use crate::group::group_by_fields;
use crate::group::split_by_field;
use crate::model::ColumnDef;
use crate::model::FilterModel;
use crate::model::OverrideMap;
use crate::model::PaginationState;
use crate::model::RowIdSource;
use crate::model::RowNode;
use crate::model::SortModel;
use crate::model::find_column;
use crate::selection::SelectionState;

/// Every input the pipeline reads besides the raw rows.
///
/// This is the long-lived, mutable part of a grid's state. The command
/// executor mutates it; the pipeline only reads it.
#[derive(Debug, Clone, Default)]
pub struct PipelineModel {
    pub row_id: RowIdSource,
    pub overrides: OverrideMap,
    pub selection: SelectionState,
    pub columns: Vec<ColumnDef>,
    pub filter_model: FilterModel,
    pub quick_filter: String,
    pub sort_model: SortModel,
    pub group_mode: GroupMode,
    pub expand: ExpandState,
    pub pagination: PaginationState,
    /// Raw rows are already the current server page.
    pub server_mode: bool,
}

impl PipelineModel {
    /// Materializer over this model's ids, overrides and selection.
    pub fn materializer(&self) -> Materializer<'_> {
        Materializer::new(&self.row_id, &self.overrides, &self.selection.selected_rows)
    }
}

/// Runs every stage except pagination.
///
/// In server mode sorting and most filtering happen remotely: only filters
/// on columns flagged `use_internal_filter` run here.
pub fn process(raw: &[Value], model: &PipelineModel) -> Vec<RowNode> {
    let materializer = model.materializer();
    let rows = apply_overrides(raw, &materializer);
    log::trace!("pipeline: materialized {} rows", rows.len());

    let rows = if model.server_mode {
        let internal: FilterModel = model
            .filter_model
            .iter()
            .filter(|item| find_column(&model.columns, &item.field).is_some_and(|c| c.use_internal_filter))
            .cloned()
            .collect();
        filter_rows(rows, &internal, "", &model.columns)
    } else {
        let rows = filter_rows(rows, &model.filter_model, &model.quick_filter, &model.columns);
        log::trace!("pipeline: {} rows after filter", rows.len());
        sort_rows(rows, &model.sort_model, &model.columns)
    };

    group_rows(rows, &model.group_mode, &model.columns, &model.expand, &materializer)
}

/// Applies the grouping mode and flattens by expand state.
pub fn group_rows(
    rows: Vec<RowNode>,
    mode: &GroupMode,
    columns: &[ColumnDef],
    expand: &ExpandState,
    materializer: &Materializer<'_>,
) -> Vec<RowNode> {
    match mode {
        GroupMode::None => rows,
        GroupMode::Fields(fields) if fields.is_empty() => rows,
        GroupMode::Fields(fields) => flatten(group_by_fields(rows, fields, columns), expand),
        GroupMode::Split(field) => split_by_field(rows, field),
        GroupMode::Tree(field) => flatten(build_tree(rows, field, materializer), expand),
    }
}

/// The display-ready rows for the current page.
///
/// Pure and deterministic in `(raw, model)`. The page is clamped against the
/// processed row count, so a stale `current_page` never yields an empty
/// page past the end.
pub fn display(raw: &[Value], model: &PipelineModel) -> Vec<RowNode> {
    let rows = process(raw, model);
    if model.server_mode {
        return rows;
    }
    let mut pagination = model.pagination;
    pagination.set_total_rows(rows.len());
    paginate_rows(rows, &pagination)
}
