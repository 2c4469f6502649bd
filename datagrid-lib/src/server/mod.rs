//! Server-side row model.
//!
//! In server mode the grid holds only the current page. A
//! [`ServerSideDataSource`] answers page requests asynchronously; the
//! [`ServerRowStore`] schedules fetches on the tokio runtime, cancels
//! superseded ones, caches responses by request key for a limited time and
//! hands the grid a
//! synchronous [`ServerSnapshot`] at all times.

mod cache;
mod source;
mod store;

pub use cache::DEFAULT_MAX_PAGES;
pub use cache::DEFAULT_PAGE_TTL;
pub use cache::PageCacheConfig;
pub use source::*;
pub use store::*;
