//! Error types

mod clipboard;
mod data_source;
mod grid;

pub use clipboard::*;
pub use data_source::*;
pub use grid::*;
