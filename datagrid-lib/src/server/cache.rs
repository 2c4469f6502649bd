//! Server page cache.

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use dashmap::DashMap;

use super::ServerResponse;

/// Default time a committed page stays fresh.
pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(300);

/// Default number of pages kept per grid.
pub const DEFAULT_MAX_PAGES: usize = 50;

/// How long server pages are cached and how many are kept.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use datagrid_lib::server::PageCacheConfig;
///
/// let config = PageCacheConfig::default()
///     .with_ttl(Duration::from_secs(30))
///     .with_max_pages(10);
/// assert_eq!(config.max_pages, 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PageCacheConfig {
    /// Time a page is served from the cache after it was fetched.
    ///
    /// Default: 5 minutes
    pub ttl: Duration,

    /// Pages kept at once. The page closest to expiry is evicted first.
    ///
    /// Default: 50
    pub max_pages: usize,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_PAGE_TTL,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl PageCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Every request goes to the server.
    pub fn no_cache() -> Self {
        Self {
            ttl: Duration::ZERO,
            max_pages: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedPage {
    response: ServerResponse,
    expires_at: DateTime<Utc>,
}

impl CachedPage {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Committed responses keyed by request, with expiry and a size cap.
#[derive(Debug)]
pub(crate) struct PageCache {
    config: PageCacheConfig,
    pages: DashMap<String, CachedPage>,
}

impl PageCache {
    pub(crate) fn new(config: PageCacheConfig) -> Self {
        Self {
            config,
            pages: DashMap::new(),
        }
    }

    /// The cached response for `key`, unless it has expired.
    pub(crate) fn get(&self, key: &str) -> Option<ServerResponse> {
        let entry = self.pages.get(key)?;
        if entry.is_expired() {
            drop(entry);
            self.pages.remove(key);
            return None;
        }
        Some(entry.response.clone())
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn insert(&self, key: &str, response: ServerResponse) {
        if self.config.max_pages == 0 || self.config.ttl.is_zero() {
            return;
        }
        let Ok(ttl) = chrono::Duration::from_std(self.config.ttl) else {
            return;
        };

        self.gc();
        if !self.pages.contains_key(key) {
            while self.pages.len() >= self.config.max_pages {
                let oldest = self
                    .pages
                    .iter()
                    .min_by_key(|entry| entry.expires_at)
                    .map(|entry| entry.key().clone());
                let Some(oldest) = oldest else { break };
                log::trace!("evicting server page {}", oldest);
                self.pages.remove(&oldest);
            }
        }

        self.pages.insert(
            key.to_string(),
            CachedPage {
                response,
                expires_at: Utc::now() + ttl,
            },
        );
    }

    pub(crate) fn clear(&self) {
        self.pages.clear();
    }

    /// Number of entries, including expired ones not yet collected.
    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }

    /// Drops expired entries. Returns how many were removed.
    pub(crate) fn gc(&self) -> usize {
        let before = self.pages.len();
        self.pages.retain(|_, page| !page.is_expired());
        before - self.pages.len()
    }
}
