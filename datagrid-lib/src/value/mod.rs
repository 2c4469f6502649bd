//! Value and path utilities.
//!
//! Pure helpers over JSON row data: dotted-path access, the default value
//! comparator, stringification for filtering/export, deep equality and
//! deep merge. Nothing here holds state.

mod compare;
mod merge;
mod path;

pub use compare::*;
pub use merge::*;
pub use path::*;
