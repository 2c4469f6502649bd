//! Cross-grid access control.
//!
//! A grid's config may carry [`IngressRule`]s naming which origins may
//! perform which actions on it. Other grids and components reach it
//! through a [`SecureGridApi`] handed out by the [`GridRegistry`], which
//! checks every call, batch command and subscription against those rules.
//!
//! Actions are named `api.<method>`, `manager.<method>` and
//! `on<EventName>`; `api.*`, `manager.*` and `*` are wildcards.

mod registry;
mod rules;
mod secure;

pub use registry::*;
pub use rules::*;
pub use secure::*;
