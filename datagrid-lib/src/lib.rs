//! Headless data-grid engine
//!
//! A UI-agnostic spreadsheet-like grid core: the row pipeline (overrides,
//! filtering, sorting, grouping, pagination, virtualization), a transactional
//! command system, and a permissioned multi-grid event bus.

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod group;
pub mod ingress;
pub mod model;
pub mod pipeline;
pub mod selection;
pub mod server;
pub mod value;
pub mod view;

mod api;
mod grid;

pub use api::*;
pub use config::GridConfig;
pub use grid::*;
