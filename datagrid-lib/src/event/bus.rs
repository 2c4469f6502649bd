//! Event bus.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use super::EventKind;
use super::GridEvent;

/// A registered event callback.
pub type Listener = Arc<dyn Fn(&GridEvent) + Send + Sync>;

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerTable = HashMap<String, HashMap<EventKind, Vec<(ListenerId, Listener)>>>;

/// Per-grid listener registry.
///
/// Dispatch is synchronous and in registration order. A panicking listener
/// is caught and logged; the remaining listeners still run. The registry
/// lock is never held while a listener runs, so listeners may register,
/// remove or fire events themselves.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<ListenerTable>>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grids = self.listeners.read().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("EventBus").field("grids", &grids).finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event kind of one grid.
    pub fn add_event_listener(&self, grid_id: &str, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut table) = self.listeners.write() {
            table
                .entry(grid_id.to_string())
                .or_default()
                .entry(kind)
                .or_default()
                .push((id, listener));
        }
        log::trace!("listener {:?} added for {}/{}", id, grid_id, kind.as_str());
        id
    }

    /// Removes a listener. Returns `true` if it was registered.
    pub fn remove_event_listener(&self, grid_id: &str, kind: EventKind, id: ListenerId) -> bool {
        let Ok(mut table) = self.listeners.write() else {
            return false;
        };
        let Some(kinds) = table.get_mut(grid_id) else {
            return false;
        };
        let Some(list) = kinds.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            kinds.remove(&kind);
        }
        if kinds.is_empty() {
            table.remove(grid_id);
        }
        removed
    }

    /// Dispatches an event to the grid's listeners for its kind.
    pub fn fire_event(&self, grid_id: &str, event: &GridEvent) {
        let kind = event.kind();
        let snapshot: Vec<Listener> = match self.listeners.read() {
            Ok(table) => table
                .get(grid_id)
                .and_then(|kinds| kinds.get(&kind))
                .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default(),
            Err(_) => return,
        };

        log::debug!("{}: {} -> {} listener(s)", grid_id, kind.as_str(), snapshot.len());
        for listener in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                log::error!(
                    "{}: {} listener panicked: {}",
                    grid_id,
                    kind.as_str(),
                    extract_panic_message(&panic)
                );
            }
        }
    }

    /// Number of listeners registered for one kind of one grid.
    pub fn listener_count(&self, grid_id: &str, kind: EventKind) -> usize {
        self.listeners
            .read()
            .ok()
            .and_then(|table| table.get(grid_id).and_then(|k| k.get(&kind)).map(Vec::len))
            .unwrap_or(0)
    }

    /// Drops every listener of a grid.
    pub fn clear_grid(&self, grid_id: &str) {
        if let Ok(mut table) = self.listeners.write() {
            table.remove(grid_id);
        }
    }
}

/// Extract a human-readable message from a panic payload.
pub fn extract_panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::event::RowDataChangedEvent;

    fn event() -> GridEvent {
        GridEvent::RowDataChanged(RowDataChangedEvent::default())
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let seen = Arc::clone(&seen);
            bus.add_event_listener(
                "g",
                EventKind::RowDataChanged,
                Arc::new(move |_| seen.lock().unwrap().push(n)),
            );
        }
        bus.fire_event("g", &event());
        bus.fire_event("other", &event());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0));
        bus.add_event_listener("g", EventKind::RowDataChanged, Arc::new(|_| panic!("boom")));
        let counter = Arc::clone(&seen);
        bus.add_event_listener(
            "g",
            EventKind::RowDataChanged,
            Arc::new(move |_| *counter.lock().unwrap() += 1),
        );
        bus.fire_event("g", &event());
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_remove_listener() {
        let bus = EventBus::new();
        let id = bus.add_event_listener("g", EventKind::RowDataChanged, Arc::new(|_| {}));
        assert_eq!(bus.listener_count("g", EventKind::RowDataChanged), 1);
        assert!(bus.remove_event_listener("g", EventKind::RowDataChanged, id));
        assert!(!bus.remove_event_listener("g", EventKind::RowDataChanged, id));
        assert_eq!(bus.listener_count("g", EventKind::RowDataChanged), 0);
    }

    #[test]
    fn test_extract_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(extract_panic_message(&payload), "static");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(extract_panic_message(&payload), "Unknown panic");
    }
}
