//! Multi-grid registry.

use std::sync::Arc;

use dashmap::DashMap;

use super::SecureGridApi;
use crate::Grid;
use crate::GridConfig;
use crate::event::EventBus;

/// Grids sharing one event bus, addressable by id.
///
/// The owner of a grid keeps its [`Grid`] handle; everyone else asks the
/// registry for a [`SecureGridApi`] under their own origin.
///
/// # Example
///
/// ```
/// use datagrid_lib::GridApi;
/// use datagrid_lib::GridConfig;
/// use datagrid_lib::ingress::GridRegistry;
/// use datagrid_lib::ingress::IngressRule;
///
/// let registry = GridRegistry::new();
/// registry.create_grid(
///     "orders",
///     GridConfig::default().ingress(vec![IngressRule::new("details", ["api.getSelectedRows"])]),
/// );
///
/// let orders = registry.connect("orders", "details").unwrap();
/// assert!(orders.get_selected_rows().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GridRegistry {
    grids: Arc<DashMap<String, Grid>>,
    bus: EventBus,
}

impl GridRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose grids dispatch on `bus`.
    pub fn with_bus(bus: EventBus) -> Self {
        Self {
            grids: Arc::new(DashMap::new()),
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Creates a grid on the registry's bus and registers it.
    pub fn create_grid(&self, id: impl Into<String>, config: GridConfig) -> Grid {
        let grid = Grid::new(id, config).with_bus(self.bus.clone());
        self.register(grid.clone());
        grid
    }

    /// Registers a grid, replacing any grid with the same id.
    pub fn register(&self, grid: Grid) {
        log::debug!("registering grid '{}'", grid.id());
        if self.grids.insert(grid.id().to_string(), grid).is_some() {
            log::warn!("grid id registered twice; the previous grid was replaced");
        }
    }

    /// Removes a grid and its listeners.
    pub fn unregister(&self, id: &str) -> Option<Grid> {
        let (_, grid) = self.grids.remove(id)?;
        self.bus.clear_grid(id);
        Some(grid)
    }

    /// The owner's handle, unchecked.
    pub fn get(&self, id: &str) -> Option<Grid> {
        self.grids.get(id).map(|entry| entry.value().clone())
    }

    /// A permission-checked handle to grid `target` for calls from `origin`.
    pub fn connect(&self, target: &str, origin: impl Into<String>) -> Option<SecureGridApi> {
        let grid = self.get(target)?;
        Some(SecureGridApi::new(grid, origin))
    }

    /// Registered grid ids, sorted.
    pub fn grid_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.grids.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use serde_json::json;

    use super::*;
    use crate::GridApi;
    use crate::GridApiExt;
    use crate::ingress::IngressRule;

    #[test]
    fn test_connect_and_unregister() {
        let registry = GridRegistry::new();
        registry.create_grid("a", GridConfig::default());
        registry.create_grid("b", GridConfig::default());
        assert_eq!(registry.grid_ids(), vec!["a", "b"]);

        assert!(registry.connect("a", "b").is_some());
        assert!(registry.connect("missing", "b").is_none());

        assert!(registry.unregister("a").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_cross_grid_subscription_sees_owner_changes() {
        let registry = GridRegistry::new();
        let orders = registry.create_grid(
            "orders",
            GridConfig::default()
                .id_field("id")
                .ingress(vec![IngressRule::new("details", ["onSelectionChanged"])]),
        );
        orders.set_row_data(vec![json!({ "id": "o1" }), json!({ "id": "o2" })]);

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let remote = registry.connect("orders", "details").unwrap();
        let subscription = remote.events().on_selection_changed(move |event| {
            assert_eq!(event.actual(), ["o2".to_string()]);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        orders.select_row("o2", true);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        assert!(subscription.unsubscribe());
        orders.select_row("o1", true);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
