//! Row records and row identity.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::value::get_path;
use crate::value::set_path;
use crate::value::to_display_string;

/// Projection from a row datum to its id.
pub type RowIdFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Writes an id into a row datum (used when cloning rows during `split`).
pub type RowIdSetter = Arc<dyn Fn(&mut Value, &str) + Send + Sync>;

/// How row ids are derived from row data.
///
/// Ids must be unique and stable across data refreshes: selection,
/// overrides and row commands are all keyed by them.
#[derive(Clone, Default)]
pub enum RowIdSource {
    /// `"row-{index}"` from the row's position in the raw row array.
    #[default]
    Index,
    /// Display string of the value at a dotted path.
    Field(String),
    /// Caller-supplied projection, with an optional setter.
    Custom {
        get: RowIdFn,
        set: Option<RowIdSetter>,
    },
}

impl RowIdSource {
    /// Reads ids from a dotted field path.
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    /// Reads ids with a custom projection.
    pub fn custom(get: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        Self::Custom {
            get: Arc::new(get),
            set: None,
        }
    }

    /// Adds a setter to a custom projection.
    pub fn with_setter(self, setter: impl Fn(&mut Value, &str) + Send + Sync + 'static) -> Self {
        match self {
            Self::Custom { get, .. } => Self::Custom {
                get,
                set: Some(Arc::new(setter)),
            },
            other => other,
        }
    }

    /// Returns `true` if ids depend on row position rather than row data.
    pub fn is_positional(&self) -> bool {
        matches!(self, Self::Index)
    }

    /// Resolves the id of a root row at `index`.
    pub fn resolve(&self, data: &Value, index: usize) -> String {
        self.from_data(data)
            .unwrap_or_else(|| format!("row-{}", index))
    }

    /// Resolves the id of a tree child.
    pub fn resolve_child(&self, data: &Value, parent_id: &str, index: usize) -> String {
        self.from_data(data)
            .unwrap_or_else(|| format!("{}-{}", parent_id, index))
    }

    /// Reads an id from the datum alone; `None` for positional ids or when
    /// the id field is empty.
    pub fn from_data(&self, data: &Value) -> Option<String> {
        match self {
            Self::Index => None,
            Self::Field(path) => {
                let id = to_display_string(get_path(data, path));
                (!id.is_empty()).then_some(id)
            }
            Self::Custom { get, .. } => {
                let id = get(data);
                (!id.is_empty()).then_some(id)
            }
        }
    }

    /// Writes `id` into `data`. Returns `false` if this source cannot
    /// store ids.
    pub fn assign(&self, data: &mut Value, id: &str) -> bool {
        match self {
            Self::Index => true,
            Self::Field(path) => {
                set_path(data, path, Value::String(id.to_string()));
                true
            }
            Self::Custom { set: Some(set), .. } => {
                set(data, id);
                true
            }
            Self::Custom { set: None, .. } => false,
        }
    }
}

impl fmt::Debug for RowIdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => write!(f, "Index"),
            Self::Field(path) => f.debug_tuple("Field").field(path).finish(),
            Self::Custom { set, .. } => f
                .debug_struct("Custom")
                .field("settable", &set.is_some())
                .finish(),
        }
    }
}

/// A synthetic row representing a bucket of grouped rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    /// Field this level groups by.
    pub group_key: String,
    /// Value shared by every member of the group.
    pub group_value: Value,
    /// Child nodes (sub-groups or data rows).
    pub group_children: Vec<RowNode>,
    /// Aggregated values per column field.
    pub aggregations: BTreeMap<String, f64>,
    /// Number of leaf data rows under this group.
    pub leaf_count: usize,
}

/// What a [`RowNode`] represents.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// A row backed by caller data.
    Data,
    /// A group header produced by group-by-fields.
    Group(GroupNode),
    /// A section break inserted by split-by-field.
    SplitMarker { field: String, value: Value },
}

/// The processed, display-ready wrapper around one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowNode {
    /// Stable row id.
    pub id: String,
    /// Row data with overrides applied.
    pub data: Value,
    /// Position in the displayed sequence.
    pub row_index: usize,
    /// Whether the row is selected.
    pub selected: bool,
    /// Expand state for group headers and tree parents.
    pub expanded: Option<bool>,
    /// Nesting depth for groups and tree rows.
    pub level: Option<usize>,
    /// Tree children (explicit parent/child mode only).
    pub children: Vec<RowNode>,
    /// Row kind.
    pub kind: RowKind,
}

impl RowNode {
    /// Creates a data row.
    pub fn data(id: impl Into<String>, data: Value, row_index: usize) -> Self {
        Self {
            id: id.into(),
            data,
            row_index,
            selected: false,
            expanded: None,
            level: None,
            children: Vec::new(),
            kind: RowKind::Data,
        }
    }

    /// Returns `true` for rows backed by caller data.
    pub fn is_data(&self) -> bool {
        matches!(self.kind, RowKind::Data)
    }

    /// Returns `true` for group headers.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, RowKind::Group(_))
    }

    /// Returns the group details for group headers.
    pub fn group(&self) -> Option<&GroupNode> {
        match &self.kind {
            RowKind::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Returns the value at a dotted path in the row data.
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.data, path)
    }
}
