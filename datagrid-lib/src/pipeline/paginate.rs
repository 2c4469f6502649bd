//! Paginate stage.

use crate::model::PaginationState;
use crate::model::RowNode;

/// Slices the current page out of `rows` and renumbers `row_index` from 0.
///
/// `pagination.total_rows` is expected to match `rows.len()`; disabled
/// pagination returns every row.
pub fn paginate_rows(rows: Vec<RowNode>, pagination: &PaginationState) -> Vec<RowNode> {
    if !pagination.enabled {
        return rows;
    }
    let range = pagination.page_range();
    let end = range.end.min(rows.len());
    let start = range.start.min(end);
    let mut page: Vec<RowNode> = rows.into_iter().skip(start).take(end - start).collect();
    for (index, row) in page.iter_mut().enumerate() {
        row.row_index = index;
    }
    page
}
