//! Grid data model.
//!
//! - [`RowNode`] - a display-ready row produced by the pipeline
//! - [`ColumnDef`] / [`ProcessedColumn`] - column definitions and their resolved layout
//! - [`SortItem`] / [`FilterItem`] - the sort and filter models
//! - [`PaginationState`] - page bookkeeping
//! - [`OverrideMap`] - uncommitted cell edits

mod column;
mod filter;
mod overrides;
mod pagination;
mod row;
mod sort;

pub use column::*;
pub use filter::*;
pub use overrides::*;
pub use pagination::*;
pub use row::*;
pub use sort::*;
