//! Grid configuration

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::GridError;
use crate::group::GroupMode;
use crate::ingress::IngressRule;
use crate::model::DEFAULT_PAGE_SIZE;
use crate::model::RowIdSource;
use crate::selection::SelectionMode;
use crate::server::DEFAULT_MAX_PAGES;
use crate::server::DEFAULT_PAGE_TTL;
use crate::server::PageCacheConfig;
use crate::view::DEFAULT_CLICK_QUIET_PERIOD;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 32.0;

/// Default number of rows rendered outside the viewport on each side.
pub const DEFAULT_OVERSCAN: usize = 5;

/// Static grid options.
///
/// Deserializable from JSON (camelCase keys, every key optional) and
/// buildable in code.
///
/// # Example
///
/// ```
/// use datagrid_lib::GridConfig;
/// use datagrid_lib::selection::SelectionMode;
///
/// let config = GridConfig::default()
///     .id_field("id")
///     .selection_mode(SelectionMode::Multiple)
///     .paginate(25);
/// assert_eq!(config.page_size, 25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    pub selection_mode: SelectionMode,

    /// Whether rows are paginated.
    pub pagination: bool,

    /// Rows per page.
    ///
    /// Default: 100
    pub page_size: usize,

    /// Group rows by these fields, outermost first.
    pub group_by_fields: Vec<String>,

    /// Insert section markers when this field's value changes.
    pub split_by_field: Option<String>,

    /// Read child rows from this array field.
    pub tree_children_field: Option<String>,

    /// Groups start expanded while no group has been toggled.
    ///
    /// Default: true
    pub expand_groups_by_default: bool,

    /// Who may call this grid from another origin. `None` allows everyone;
    /// an empty list allows no one.
    pub ingress: Option<Vec<IngressRule>>,

    /// Dotted path of the row id field. Rows are identified by position
    /// when unset.
    pub id_field: Option<String>,

    /// Fixed row height in pixels.
    pub row_height: f64,

    /// Extra rows rendered around the viewport.
    pub overscan: usize,

    /// Quiet period before a click sequence resolves.
    ///
    /// Default: 250 ms
    pub click_quiet_period_ms: u64,

    /// Width available to columns, for flex distribution.
    pub container_width: f64,

    /// Rows come from a server data source, one page at a time.
    pub server_mode: bool,

    /// How long a fetched server page is reused. Zero disables the cache.
    ///
    /// Default: 300000 ms
    pub server_cache_ttl_ms: u64,

    /// Server pages cached at once.
    ///
    /// Default: 50
    pub server_cache_pages: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::Single,
            pagination: false,
            page_size: DEFAULT_PAGE_SIZE,
            group_by_fields: Vec::new(),
            split_by_field: None,
            tree_children_field: None,
            expand_groups_by_default: true,
            ingress: None,
            id_field: None,
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            click_quiet_period_ms: DEFAULT_CLICK_QUIET_PERIOD.as_millis() as u64,
            container_width: 0.0,
            server_mode: false,
            server_cache_ttl_ms: DEFAULT_PAGE_TTL.as_millis() as u64,
            server_cache_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl GridConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON config.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    /// Enables pagination with `page_size` rows per page.
    pub fn paginate(mut self, page_size: usize) -> Self {
        self.pagination = true;
        self.page_size = page_size;
        self
    }

    pub fn group_by(mut self, fields: Vec<String>) -> Self {
        self.group_by_fields = fields;
        self
    }

    pub fn split_by(mut self, field: impl Into<String>) -> Self {
        self.split_by_field = Some(field.into());
        self
    }

    pub fn tree_children(mut self, field: impl Into<String>) -> Self {
        self.tree_children_field = Some(field.into());
        self
    }

    pub fn expand_groups_by_default(mut self, expanded: bool) -> Self {
        self.expand_groups_by_default = expanded;
        self
    }

    /// Restricts cross-grid access to these rules.
    pub fn ingress(mut self, rules: Vec<IngressRule>) -> Self {
        self.ingress = Some(rules);
        self
    }

    pub fn id_field(mut self, path: impl Into<String>) -> Self {
        self.id_field = Some(path.into());
        self
    }

    pub fn row_height(mut self, height: f64) -> Self {
        self.row_height = height;
        self
    }

    pub fn overscan(mut self, rows: usize) -> Self {
        self.overscan = rows;
        self
    }

    pub fn click_quiet_period(mut self, period: Duration) -> Self {
        self.click_quiet_period_ms = period.as_millis() as u64;
        self
    }

    pub fn container_width(mut self, width: f64) -> Self {
        self.container_width = width;
        self
    }

    pub fn server_mode(mut self) -> Self {
        self.server_mode = true;
        self
    }

    pub fn server_cache(mut self, ttl: Duration, max_pages: usize) -> Self {
        self.server_cache_ttl_ms = ttl.as_millis() as u64;
        self.server_cache_pages = max_pages;
        self
    }

    /// The tree-construction mode. Group-by fields win over split, split
    /// wins over parent/child.
    pub fn group_mode(&self) -> GroupMode {
        if !self.group_by_fields.is_empty() {
            GroupMode::Fields(self.group_by_fields.clone())
        } else if let Some(field) = &self.split_by_field {
            GroupMode::Split(field.clone())
        } else if let Some(field) = &self.tree_children_field {
            GroupMode::Tree(field.clone())
        } else {
            GroupMode::None
        }
    }

    /// Row id source derived from `id_field`.
    pub fn row_id_source(&self) -> RowIdSource {
        match &self.id_field {
            Some(path) => RowIdSource::field(path.clone()),
            None => RowIdSource::Index,
        }
    }

    pub fn click_quiet_period_duration(&self) -> Duration {
        Duration::from_millis(self.click_quiet_period_ms)
    }

    pub fn page_cache(&self) -> PageCacheConfig {
        PageCacheConfig::default()
            .with_ttl(Duration::from_millis(self.server_cache_ttl_ms))
            .with_max_pages(self.server_cache_pages)
    }
}
