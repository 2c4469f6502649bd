//! Grouping and tree engine.
//!
//! Turns the filtered, sorted row list into one of three display shapes:
//!
//! - **group-by-fields** - a hierarchy of [`GroupNode`](crate::model::GroupNode)s
//!   with per-group aggregations
//! - **split-by-field** - section markers wherever a field's value changes
//! - **explicit parent/child** - rows carrying their own child arrays
//!
//! and flattens the result back into a display list honoring expand state.

mod expand;
mod fields;
mod split;
mod tree;

pub use expand::*;
pub use fields::*;
pub use split::*;
pub use tree::*;

use serde::Deserialize;
use serde::Serialize;

/// Which tree-construction mode the grid uses. The modes are exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "field")]
pub enum GroupMode {
    /// Flat rows.
    #[default]
    None,
    /// Nested groups, one level per field.
    Fields(Vec<String>),
    /// Section markers on value changes of one field.
    Split(String),
    /// Child rows read from an array field of each row.
    Tree(String),
}

impl GroupMode {
    /// Returns `true` for flat rows.
    pub fn is_none(&self) -> bool {
        matches!(self, GroupMode::None)
    }
}
