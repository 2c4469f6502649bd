//! Transactional command system.
//!
//! [`ParamsBuilder`] (grid state: filter, sort, paging, selection, resets)
//! and [`ManagerBuilder`] (bulk row CRUD) both accumulate into one
//! [`UpdateBatch`]. Nothing happens until `execute()`, which hands the
//! batch to [`GridApi::execute`](crate::GridApi::execute); the grid then
//! runs [`execute_batch`] against its state in a single commit.
//!
//! # Example
//!
//! ```
//! use datagrid_lib::Grid;
//! use datagrid_lib::GridApi;
//! use datagrid_lib::GridApiExt;
//! use datagrid_lib::GridConfig;
//! use datagrid_lib::model::FilterItem;
//! use datagrid_lib::model::SortItem;
//! use serde_json::json;
//!
//! let grid = Grid::new("orders", GridConfig::default().id_field("id"));
//! grid.manager()
//!     .add(vec![json!({ "id": "x" })])
//!     .update(vec![json!({ "id": "x", "name": "Y" })])
//!     .execute();
//! grid.params()
//!     .set_filter_model(vec![FilterItem::equals("name", "Y")])
//!     .set_sort_model(vec![SortItem::asc("name")])
//!     .set_page(0)
//!     .execute();
//! assert_eq!(grid.get_displayed_rows().len(), 1);
//! ```

mod batch;
mod executor;
mod manager;
mod params;
mod state;

pub use batch::*;
pub use executor::*;
pub use manager::*;
pub use params::*;
pub use state::*;
