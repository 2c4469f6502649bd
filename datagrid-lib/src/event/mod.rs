//! Grid events and the event bus.
//!
//! [`EventBus`] is an explicitly constructed, cloneable handle mapping
//! grid id -> event kind -> listeners. Grids sharing a bus can observe each
//! other (subject to ingress rules); tests build a fresh bus each.

mod bus;
mod subscribe;
mod types;

pub use bus::*;
pub use subscribe::*;
pub use types::*;
