//! Column definitions and column layout.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::FilterItem;
use super::FilterType;
use crate::value::get_path;
use crate::value::to_display_string;

/// Width used for columns without an explicit width or flex.
pub const DEFAULT_COLUMN_WIDTH: f64 = 150.0;

/// Smallest width any column is laid out at.
pub const MIN_COLUMN_WIDTH: f64 = 20.0;

// =============================================================================
// Callbacks
// =============================================================================

/// Custom sort comparator over two cell values.
#[derive(Clone)]
pub struct ValueComparator(pub Arc<dyn Fn(Option<&Value>, Option<&Value>) -> Ordering + Send + Sync>);

impl ValueComparator {
    /// Wraps a comparator closure.
    pub fn new(f: impl Fn(Option<&Value>, Option<&Value>) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Compares two cell values.
    pub fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for ValueComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueComparator(..)")
    }
}

/// Custom filter predicate: does this cell value pass the filter entry?
#[derive(Clone)]
pub struct FilterComparator(pub Arc<dyn Fn(Option<&Value>, &FilterItem) -> bool + Send + Sync>);

impl FilterComparator {
    /// Wraps a filter predicate.
    pub fn new(f: impl Fn(Option<&Value>, &FilterItem) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Evaluates the predicate.
    pub fn matches(&self, value: Option<&Value>, filter: &FilterItem) -> bool {
        (self.0)(value, filter)
    }
}

impl fmt::Debug for FilterComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterComparator(..)")
    }
}

/// Formats a cell value for display, the quick filter and exports.
/// Receives the cell value and the whole row.
#[derive(Clone)]
pub struct ValueFormatter(pub Arc<dyn Fn(Option<&Value>, &Value) -> String + Send + Sync>);

impl ValueFormatter {
    /// Wraps a formatter closure.
    pub fn new(f: impl Fn(Option<&Value>, &Value) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Formats a cell.
    pub fn format(&self, value: Option<&Value>, row: &Value) -> String {
        (self.0)(value, row)
    }
}

impl fmt::Debug for ValueFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueFormatter(..)")
    }
}

/// Group aggregation for a column.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggFunc {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    /// Custom reducer over the numeric member values.
    #[serde(skip)]
    Custom(Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>),
}

impl AggFunc {
    /// Wraps a custom reducer.
    pub fn custom(f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Reduces the numeric values of a group.
    ///
    /// `count` counts members, the others ignore non-numeric members.
    /// `avg`/`min`/`max` of nothing is `0`.
    pub fn aggregate(&self, values: &[f64], member_count: usize) -> f64 {
        match self {
            AggFunc::Sum => values.iter().sum(),
            AggFunc::Avg if values.is_empty() => 0.0,
            AggFunc::Avg => values.iter().sum::<f64>() / values.len() as f64,
            AggFunc::Min => values.iter().copied().reduce(f64::min).unwrap_or(0.0),
            AggFunc::Max => values.iter().copied().reduce(f64::max).unwrap_or(0.0),
            AggFunc::Count => member_count as f64,
            AggFunc::Custom(f) => f(values),
        }
    }
}

impl fmt::Debug for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggFunc::Sum => write!(f, "Sum"),
            AggFunc::Avg => write!(f, "Avg"),
            AggFunc::Min => write!(f, "Min"),
            AggFunc::Max => write!(f, "Max"),
            AggFunc::Count => write!(f, "Count"),
            AggFunc::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

// =============================================================================
// Column Definition
// =============================================================================

/// Which side a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pinned {
    Left,
    Right,
}

/// A column definition.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::ColumnDef;
///
/// let columns = vec![
///     ColumnDef::new("name").header("Name").flex(1.0),
///     ColumnDef::new("address.city").header("City").width(120.0).editable(),
/// ];
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnDef {
    /// Dotted path into row data.
    pub field: String,
    /// Header label (defaults to the field).
    pub header_name: Option<String>,
    /// Fixed width in pixels.
    pub width: Option<f64>,
    /// Lower width bound.
    pub min_width: Option<f64>,
    /// Upper width bound.
    pub max_width: Option<f64>,
    /// Share of the remaining container width.
    pub flex: Option<f64>,
    pub sortable: bool,
    pub filterable: bool,
    pub editable: bool,
    /// Hidden columns are excluded from layout, quick filter and export.
    pub hidden: bool,
    pub pinned: Option<Pinned>,
    pub filter_type: FilterType,
    /// Name of the editor a presentation layer should use.
    pub cell_editor: Option<String>,
    /// In server mode, evaluate this column's filters client-side.
    pub use_internal_filter: bool,
    pub agg_func: Option<AggFunc>,
    #[serde(skip)]
    pub comparator: Option<ValueComparator>,
    #[serde(skip)]
    pub filter_comparator: Option<FilterComparator>,
    #[serde(skip)]
    pub value_formatter: Option<ValueFormatter>,
}

impl ColumnDef {
    /// Creates a sortable, filterable column for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sortable: true,
            filterable: true,
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn min_width(mut self, width: f64) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn max_width(mut self, width: f64) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn flex(mut self, flex: f64) -> Self {
        self.flex = Some(flex);
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn pinned(mut self, side: Pinned) -> Self {
        self.pinned = Some(side);
        self
    }

    pub fn filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    pub fn internal_filter(mut self) -> Self {
        self.use_internal_filter = true;
        self
    }

    pub fn agg(mut self, agg: AggFunc) -> Self {
        self.agg_func = Some(agg);
        self
    }

    pub fn comparator(
        mut self,
        f: impl Fn(Option<&Value>, Option<&Value>) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.comparator = Some(ValueComparator::new(f));
        self
    }

    pub fn filter_comparator(
        mut self,
        f: impl Fn(Option<&Value>, &FilterItem) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter_comparator = Some(FilterComparator::new(f));
        self
    }

    pub fn formatter(mut self, f: impl Fn(Option<&Value>, &Value) -> String + Send + Sync + 'static) -> Self {
        self.value_formatter = Some(ValueFormatter::new(f));
        self
    }

    /// Header label, falling back to the field path.
    pub fn display_name(&self) -> &str {
        self.header_name.as_deref().unwrap_or(&self.field)
    }

    /// Formatted cell text for a row.
    pub fn format_value(&self, row: &Value) -> String {
        let value = get_path(row, &self.field);
        match &self.value_formatter {
            Some(formatter) => formatter.format(value, row),
            None => to_display_string(value),
        }
    }

    fn clamp_width(&self, width: f64) -> f64 {
        let min = self.min_width.unwrap_or(MIN_COLUMN_WIDTH);
        let max = self.max_width.unwrap_or(f64::INFINITY).max(min);
        width.clamp(min, max)
    }
}

/// Looks up a column by field.
pub fn find_column<'a>(columns: &'a [ColumnDef], field: &str) -> Option<&'a ColumnDef> {
    columns.iter().find(|column| column.field == field)
}

// =============================================================================
// Column Layout
// =============================================================================

/// A column with its resolved layout.
#[derive(Debug, Clone)]
pub struct ProcessedColumn {
    pub def: ColumnDef,
    /// Pixel width after flex distribution and clamping.
    pub computed_width: f64,
    /// Cumulative offset from the left edge.
    pub left: f64,
}

/// Resolves widths and offsets for the visible columns.
///
/// Columns are ordered pinned-left, unpinned, pinned-right (stable within
/// each section). Fixed columns take their clamped width; flex columns share
/// whatever is left of `container_width` in proportion to their flex, and a
/// flex column that hits its min/max bound is frozen there while the rest is
/// redistributed among the others.
pub fn process_columns(columns: &[ColumnDef], container_width: f64) -> Vec<ProcessedColumn> {
    let ordered: Vec<&ColumnDef> = columns
        .iter()
        .filter(|c| !c.hidden && c.pinned == Some(Pinned::Left))
        .chain(columns.iter().filter(|c| !c.hidden && c.pinned.is_none()))
        .chain(
            columns
                .iter()
                .filter(|c| !c.hidden && c.pinned == Some(Pinned::Right)),
        )
        .collect();

    let mut widths: Vec<Option<f64>> = ordered
        .iter()
        .map(|c| match c.flex {
            Some(flex) if flex > 0.0 => None,
            _ => Some(c.clamp_width(c.width.unwrap_or(DEFAULT_COLUMN_WIDTH))),
        })
        .collect();

    // Distribute until no flex column gets clamped.
    loop {
        let fixed: f64 = widths.iter().flatten().sum();
        let remaining = (container_width - fixed).max(0.0);
        let total_flex: f64 = ordered
            .iter()
            .zip(&widths)
            .filter(|(_, w)| w.is_none())
            .map(|(c, _)| c.flex.unwrap_or(0.0))
            .sum();
        if total_flex <= 0.0 {
            break;
        }

        let mut clamped_any = false;
        for (column, width) in ordered.iter().zip(widths.iter_mut()) {
            if width.is_some() {
                continue;
            }
            let share = remaining * column.flex.unwrap_or(0.0) / total_flex;
            let clamped = column.clamp_width(share);
            if (clamped - share).abs() > f64::EPSILON {
                *width = Some(clamped);
                clamped_any = true;
            }
        }
        if !clamped_any {
            for (column, width) in ordered.iter().zip(widths.iter_mut()) {
                if width.is_none() {
                    *width = Some(remaining * column.flex.unwrap_or(0.0) / total_flex);
                }
            }
            break;
        }
    }

    let mut left = 0.0;
    ordered
        .into_iter()
        .zip(widths)
        .map(|(def, width)| {
            let computed_width = width.unwrap_or(DEFAULT_COLUMN_WIDTH);
            let column = ProcessedColumn {
                def: def.clone(),
                computed_width,
                left,
            };
            left += computed_width;
            column
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fixed_widths_and_offsets() {
        let columns = vec![ColumnDef::new("a").width(100.0), ColumnDef::new("b")];
        let processed = process_columns(&columns, 1000.0);
        assert_eq!(processed[0].computed_width, 100.0);
        assert_eq!(processed[1].left, 100.0);
        assert_eq!(processed[1].computed_width, DEFAULT_COLUMN_WIDTH);
    }

    #[test]
    fn test_flex_shares_remaining_space() {
        let columns = vec![
            ColumnDef::new("a").width(100.0),
            ColumnDef::new("b").flex(1.0),
            ColumnDef::new("c").flex(3.0),
        ];
        let processed = process_columns(&columns, 500.0);
        assert_eq!(processed[1].computed_width, 100.0);
        assert_eq!(processed[2].computed_width, 300.0);
    }

    #[test]
    fn test_flex_respects_max_width() {
        let columns = vec![
            ColumnDef::new("a").flex(1.0).max_width(50.0),
            ColumnDef::new("b").flex(1.0),
        ];
        let processed = process_columns(&columns, 400.0);
        assert_eq!(processed[0].computed_width, 50.0);
        assert_eq!(processed[1].computed_width, 350.0);
    }

    #[test]
    fn test_pinned_ordering_and_hidden() {
        let columns = vec![
            ColumnDef::new("right").pinned(Pinned::Right),
            ColumnDef::new("center"),
            ColumnDef::new("gone").hidden(),
            ColumnDef::new("left").pinned(Pinned::Left),
        ];
        let fields: Vec<_> = process_columns(&columns, 0.0)
            .into_iter()
            .map(|c| c.def.field)
            .collect();
        assert_eq!(fields, vec!["left", "center", "right"]);
    }

    #[test]
    fn test_format_value_uses_formatter() {
        let column = ColumnDef::new("price").formatter(|v, _| format!("${}", to_display_string(v)));
        assert_eq!(column.format_value(&json!({ "price": 5 })), "$5");
    }

    #[test]
    fn test_agg_funcs() {
        let values = [1.0, 2.0, 6.0];
        assert_eq!(AggFunc::Sum.aggregate(&values, 3), 9.0);
        assert_eq!(AggFunc::Avg.aggregate(&values, 3), 3.0);
        assert_eq!(AggFunc::Min.aggregate(&values, 3), 1.0);
        assert_eq!(AggFunc::Max.aggregate(&values, 3), 6.0);
        assert_eq!(AggFunc::Count.aggregate(&values, 4), 4.0);
        assert_eq!(AggFunc::custom(|v| v.len() as f64).aggregate(&values, 3), 3.0);
    }
}
