//! View helpers: virtualization math and click-type detection.

mod click;
mod window;

pub use click::*;
pub use window::*;
