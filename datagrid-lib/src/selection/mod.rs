//! Selection engine.
//!
//! [`SelectionState`] tracks selected row ids with anchor/last index for
//! shift-range and ctrl-toggle semantics. [`DragSelection`] is the separate
//! drag-to-select gesture machine. Both report changes as
//! [`SelectionDelta`]s so callers fire events only when something changed.

mod drag;
mod state;

pub use drag::*;
pub use state::*;
