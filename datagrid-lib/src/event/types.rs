//! Typed grid events.

use serde_json::Value;

use crate::model::FilterModel;
use crate::model::PaginationState;
use crate::model::RowNode;
use crate::model::SortModel;
use crate::view::ClickType;

/// Event kinds a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SelectionChanged,
    SortChanged,
    FilterChanged,
    CellValueChanged,
    PaginationChanged,
    RowClicked,
    RowDataChanged,
    ExpandedChanged,
}

impl EventKind {
    /// Every event kind.
    pub const ALL: [EventKind; 8] = [
        EventKind::SelectionChanged,
        EventKind::SortChanged,
        EventKind::FilterChanged,
        EventKind::CellValueChanged,
        EventKind::PaginationChanged,
        EventKind::RowClicked,
        EventKind::RowDataChanged,
        EventKind::ExpandedChanged,
    ];

    /// Event name, e.g. `selectionChanged`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SelectionChanged => "selectionChanged",
            EventKind::SortChanged => "sortChanged",
            EventKind::FilterChanged => "filterChanged",
            EventKind::CellValueChanged => "cellValueChanged",
            EventKind::PaginationChanged => "paginationChanged",
            EventKind::RowClicked => "rowClicked",
            EventKind::RowDataChanged => "rowDataChanged",
            EventKind::ExpandedChanged => "expandedChanged",
        }
    }

    /// Ingress action guarding subscriptions, e.g. `onSelectionChanged`.
    pub fn ingress_action(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("on{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }

    /// Parses an event name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// The selected set changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionChangedEvent {
    /// Selected ids before the change (sorted).
    pub old: Vec<String>,
    /// Selected ids after the change (sorted).
    pub actual: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Selected rows that are currently displayed, in display order.
    pub rows: Vec<RowNode>,
}

impl SelectionChangedEvent {
    pub fn old(&self) -> &[String] {
        &self.old
    }

    pub fn actual(&self) -> &[String] {
        &self.actual
    }

    /// Every selected row currently displayed.
    pub fn all(&self) -> &[RowNode] {
        &self.rows
    }

    /// First selected row in display order.
    pub fn first_row(&self) -> Option<&RowNode> {
        self.rows.first()
    }
}

/// The sort model changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortChangedEvent {
    pub old: SortModel,
    pub actual: SortModel,
}

impl SortChangedEvent {
    pub fn old(&self) -> &SortModel {
        &self.old
    }

    pub fn actual(&self) -> &SortModel {
        &self.actual
    }
}

/// The filter model or quick filter changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChangedEvent {
    pub old: FilterModel,
    pub actual: FilterModel,
    pub old_quick_filter: String,
    pub quick_filter: String,
}

impl FilterChangedEvent {
    pub fn old(&self) -> &FilterModel {
        &self.old
    }

    pub fn actual(&self) -> &FilterModel {
        &self.actual
    }
}

/// One field of one row changed value. Fired before the change is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CellValueChangedEvent {
    pub row_id: String,
    pub field: String,
    pub old: Option<Value>,
    pub actual: Value,
}

impl CellValueChangedEvent {
    pub fn old(&self) -> Option<&Value> {
        self.old.as_ref()
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }
}

/// Page, page size or total row count changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginationChangedEvent {
    pub old: PaginationState,
    pub actual: PaginationState,
}

impl PaginationChangedEvent {
    pub fn old(&self) -> &PaginationState {
        &self.old
    }

    pub fn actual(&self) -> &PaginationState {
        &self.actual
    }
}

/// A row was clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct RowClickedEvent {
    pub row: RowNode,
    pub click_type: ClickType,
    pub shift: bool,
    pub ctrl: bool,
}

impl RowClickedEvent {
    pub fn first_row(&self) -> &RowNode {
        &self.row
    }
}

/// The raw row set changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowDataChangedEvent {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    /// Raw rows after the change.
    pub total_rows: usize,
}

impl RowDataChangedEvent {
    /// Every id touched by the change.
    pub fn all(&self) -> Vec<&str> {
        self.added
            .iter()
            .chain(&self.updated)
            .chain(&self.removed)
            .map(String::as_str)
            .collect()
    }
}

/// A group header or tree row was expanded or collapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedChangedEvent {
    pub id: String,
    pub expanded: bool,
    pub is_group: bool,
}

/// A grid event.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    SelectionChanged(SelectionChangedEvent),
    SortChanged(SortChangedEvent),
    FilterChanged(FilterChangedEvent),
    CellValueChanged(CellValueChangedEvent),
    PaginationChanged(PaginationChangedEvent),
    RowClicked(RowClickedEvent),
    RowDataChanged(RowDataChangedEvent),
    ExpandedChanged(ExpandedChangedEvent),
}

impl GridEvent {
    /// The kind listeners subscribe to.
    pub fn kind(&self) -> EventKind {
        match self {
            GridEvent::SelectionChanged(_) => EventKind::SelectionChanged,
            GridEvent::SortChanged(_) => EventKind::SortChanged,
            GridEvent::FilterChanged(_) => EventKind::FilterChanged,
            GridEvent::CellValueChanged(_) => EventKind::CellValueChanged,
            GridEvent::PaginationChanged(_) => EventKind::PaginationChanged,
            GridEvent::RowClicked(_) => EventKind::RowClicked,
            GridEvent::RowDataChanged(_) => EventKind::RowDataChanged,
            GridEvent::ExpandedChanged(_) => EventKind::ExpandedChanged,
        }
    }
}
