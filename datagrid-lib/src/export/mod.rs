//! CSV export and clipboard text.
//!
//! Both project rows through the visible columns and their value
//! formatters. CSV quotes per RFC 4180; clipboard text is tab-separated and
//! unquoted. The OS clipboard sits behind [`ClipboardProvider`].

mod clipboard;
mod csv;

pub use clipboard::*;
pub use csv::*;
