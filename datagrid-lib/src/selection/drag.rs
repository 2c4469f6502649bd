//! Drag-to-select gesture machine.

use std::collections::HashSet;

/// Tracks a mouse-down / mouse-enter / mouse-up drag over rows.
///
/// Mouse-down only records the origin row and the target state (the
/// opposite of the origin's current selection). Nothing is applied until
/// the pointer enters a different row; then the origin and every newly
/// entered row get the target state exactly once. A gesture that never
/// leaves the origin row is a plain click.
#[derive(Debug, Clone, Default)]
pub struct DragSelection {
    origin: Option<String>,
    target: bool,
    dragging: bool,
    visited: HashSet<String>,
}

impl DragSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a gesture on `id`.
    pub fn mouse_down(&mut self, id: &str, currently_selected: bool) {
        self.origin = Some(id.to_string());
        self.target = !currently_selected;
        self.dragging = false;
        self.visited.clear();
    }

    /// The pointer entered row `id` with the button held.
    ///
    /// Returns the `(row id, selected)` changes to apply, in order.
    pub fn mouse_enter(&mut self, id: &str) -> Vec<(String, bool)> {
        let Some(origin) = self.origin.clone() else {
            return Vec::new();
        };

        let mut changes = Vec::new();
        if !self.dragging {
            if id == origin {
                return changes;
            }
            self.dragging = true;
            self.visited.insert(origin.clone());
            changes.push((origin, self.target));
        }
        if self.visited.insert(id.to_string()) {
            changes.push((id.to_string(), self.target));
        }
        changes
    }

    /// Ends the gesture. Returns `true` if it turned into a drag, `false`
    /// if it was a plain click.
    pub fn mouse_up(&mut self) -> bool {
        let dragged = self.dragging;
        self.origin = None;
        self.dragging = false;
        self.visited.clear();
        dragged
    }

    /// Returns `true` while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}
