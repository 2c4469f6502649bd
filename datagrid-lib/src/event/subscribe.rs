//! Subscriptions and typed listener registration.

use std::sync::Arc;

use super::CellValueChangedEvent;
use super::EventBus;
use super::EventKind;
use super::ExpandedChangedEvent;
use super::FilterChangedEvent;
use super::GridEvent;
use super::ListenerId;
use super::PaginationChangedEvent;
use super::RowClickedEvent;
use super::RowDataChangedEvent;
use super::SelectionChangedEvent;
use super::SortChangedEvent;
use crate::GridApi;

/// Handle to a registered listener.
///
/// A subscription that was refused by an ingress check is inert: it never
/// fires and unsubscribing it does nothing.
#[derive(Debug, Clone)]
pub struct Subscription {
    bus: Option<EventBus>,
    grid_id: String,
    kind: EventKind,
    id: Option<ListenerId>,
}

impl Subscription {
    pub(crate) fn active(bus: EventBus, grid_id: impl Into<String>, kind: EventKind, id: ListenerId) -> Self {
        Self {
            bus: Some(bus),
            grid_id: grid_id.into(),
            kind,
            id: Some(id),
        }
    }

    /// A subscription that was never registered.
    pub fn inert(grid_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            bus: None,
            grid_id: grid_id.into(),
            kind,
            id: None,
        }
    }

    /// Returns `true` if a listener was registered.
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    pub fn grid_id(&self) -> &str {
        &self.grid_id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Removes the listener. Returns `true` if it was still registered.
    pub fn unsubscribe(self) -> bool {
        match (self.bus, self.id) {
            (Some(bus), Some(id)) => bus.remove_event_listener(&self.grid_id, self.kind, id),
            _ => false,
        }
    }
}

/// Typed listener registration.
///
/// Obtained from [`GridApiExt::events`](crate::GridApiExt::events). Each
/// method unwraps the matching [`GridEvent`] variant before calling the
/// handler.
///
/// # Example
///
/// ```
/// use datagrid_lib::Grid;
/// use datagrid_lib::GridApiExt;
/// use datagrid_lib::GridConfig;
///
/// let grid = Grid::new("orders", GridConfig::default());
/// let subscription = grid.events().on_sort_changed(|event| {
///     println!("sorted by {:?}", event.actual());
/// });
/// assert!(subscription.is_active());
/// ```
pub struct EventSubscriber<'a, A: GridApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: GridApi + ?Sized> EventSubscriber<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub fn on_selection_changed(
        &self,
        handler: impl Fn(&SelectionChangedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.api.add_event_listener(
            EventKind::SelectionChanged,
            Arc::new(move |event| {
                if let GridEvent::SelectionChanged(event) = event {
                    handler(event);
                }
            }),
        )
    }

    pub fn on_sort_changed(&self, handler: impl Fn(&SortChangedEvent) + Send + Sync + 'static) -> Subscription {
        self.api.add_event_listener(
            EventKind::SortChanged,
            Arc::new(move |event| {
                if let GridEvent::SortChanged(event) = event {
                    handler(event);
                }
            }),
        )
    }

    pub fn on_filter_changed(&self, handler: impl Fn(&FilterChangedEvent) + Send + Sync + 'static) -> Subscription {
        self.api.add_event_listener(
            EventKind::FilterChanged,
            Arc::new(move |event| {
                if let GridEvent::FilterChanged(event) = event {
                    handler(event);
                }
            }),
        )
    }

    /// Fires once per changed field, before the change is applied.
    pub fn on_cell_value_changed(
        &self,
        handler: impl Fn(&CellValueChangedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.api.add_event_listener(
            EventKind::CellValueChanged,
            Arc::new(move |event| {
                if let GridEvent::CellValueChanged(event) = event {
                    handler(event);
                }
            }),
        )
    }

    pub fn on_pagination_changed(
        &self,
        handler: impl Fn(&PaginationChangedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.api.add_event_listener(
            EventKind::PaginationChanged,
            Arc::new(move |event| {
                if let GridEvent::PaginationChanged(event) = event {
                    handler(event);
                }
            }),
        )
    }

    pub fn on_row_clicked(&self, handler: impl Fn(&RowClickedEvent) + Send + Sync + 'static) -> Subscription {
        self.api.add_event_listener(
            EventKind::RowClicked,
            Arc::new(move |event| {
                if let GridEvent::RowClicked(event) = event {
                    handler(event);
                }
            }),
        )
    }

    pub fn on_row_data_changed(&self, handler: impl Fn(&RowDataChangedEvent) + Send + Sync + 'static) -> Subscription {
        self.api.add_event_listener(
            EventKind::RowDataChanged,
            Arc::new(move |event| {
                if let GridEvent::RowDataChanged(event) = event {
                    handler(event);
                }
            }),
        )
    }

    pub fn on_expanded_changed(
        &self,
        handler: impl Fn(&ExpandedChangedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.api.add_event_listener(
            EventKind::ExpandedChanged,
            Arc::new(move |event| {
                if let GridEvent::ExpandedChanged(event) = event {
                    handler(event);
                }
            }),
        )
    }
}
