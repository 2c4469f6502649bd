//! Server row store.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::PageCacheConfig;
use super::ServerRequest;
use super::ServerResponse;
use super::ServerSideDataSource;
use super::cache::PageCache;
use crate::error::DataSourceError;
use crate::error::GridError;

/// Callback invoked after every committed fetch.
pub type SnapshotListener = Arc<dyn Fn(&ServerSnapshot) + Send + Sync>;

/// What the grid shows while talking to the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerSnapshot {
    /// Rows of the last committed page.
    pub rows: Vec<Value>,
    pub total_rows: usize,
    /// A fetch for the desired request is in flight.
    pub loading: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
}

impl ServerSnapshot {
    fn loaded(response: ServerResponse) -> Self {
        Self {
            rows: response.data,
            total_rows: response.total_rows,
            loading: false,
            error: None,
        }
    }
}

#[derive(Default)]
struct StoreInner {
    /// Cache key of the request the grid currently wants.
    desired: Option<String>,
    snapshot: ServerSnapshot,
    in_flight: Option<CancellationToken>,
}

/// Async page fetcher with caching and stale-response rejection.
///
/// [`snapshot`](Self::snapshot) never blocks: on a new request key it
/// cancels whatever is in flight, spawns a fetch on the current tokio
/// runtime and returns the previous rows flagged as loading. A response is
/// committed only while its key is still the desired one; committed
/// responses are cached by key until they expire (see [`PageCacheConfig`]),
/// so revisiting a recent page costs nothing.
#[derive(Clone)]
pub struct ServerRowStore {
    source: Arc<dyn ServerSideDataSource>,
    inner: Arc<Mutex<StoreInner>>,
    cache: Arc<PageCache>,
    listeners: Arc<RwLock<Vec<(u64, SnapshotListener)>>>,
    next_listener: Arc<AtomicU64>,
}

impl fmt::Debug for ServerRowStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerRowStore")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl ServerRowStore {
    pub fn new(source: Arc<dyn ServerSideDataSource>) -> Self {
        Self::with_cache(source, PageCacheConfig::default())
    }

    pub fn with_cache(source: Arc<dyn ServerSideDataSource>, cache: PageCacheConfig) -> Self {
        Self {
            source,
            inner: Arc::new(Mutex::new(StoreInner::default())),
            cache: Arc::new(PageCache::new(cache)),
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the snapshot for `request`, scheduling a fetch if the
    /// request differs from the last one.
    ///
    /// Fails with [`GridError::NoRuntime`] when a fetch is needed outside a
    /// tokio runtime.
    pub fn snapshot(&self, request: &ServerRequest) -> Result<ServerSnapshot, GridError> {
        let key = request.cache_key();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if inner.desired.as_deref() == Some(key.as_str()) {
            return Ok(inner.snapshot.clone());
        }

        if let Some(response) = self.cache.get(&key) {
            log::debug!("server cache hit for page {}", request.page);
            if let Some(token) = inner.in_flight.take() {
                token.cancel();
            }
            inner.desired = Some(key);
            inner.snapshot = ServerSnapshot::loaded(response);
            return Ok(inner.snapshot.clone());
        }

        let runtime = Handle::try_current().map_err(|_| GridError::NoRuntime)?;
        if let Some(token) = inner.in_flight.take() {
            log::debug!("cancelling superseded server fetch");
            token.cancel();
        }

        let token = CancellationToken::new();
        inner.desired = Some(key.clone());
        inner.in_flight = Some(token.clone());
        inner.snapshot.loading = true;
        inner.snapshot.error = None;
        let snapshot = inner.snapshot.clone();
        drop(inner);

        log::debug!(
            "fetching server page {} (size {})",
            request.page,
            request.page_size
        );
        let store = self.clone();
        let request = request.clone();
        runtime.spawn(async move {
            store.fetch(request, key, token).await;
        });
        Ok(snapshot)
    }

    /// The last snapshot, without scheduling anything.
    pub fn current(&self) -> ServerSnapshot {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Returns `true` if an unexpired response for `request` is cached.
    pub fn is_cached(&self, request: &ServerRequest) -> bool {
        self.cache.contains(&request.cache_key())
    }

    /// Drops cached pages and forgets the desired request, so the next
    /// snapshot refetches.
    pub fn invalidate(&self) {
        self.cache.clear();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = inner.in_flight.take() {
            token.cancel();
        }
        inner.desired = None;
    }

    /// Registers a listener called after every commit. Returns its id.
    pub fn subscribe(&self, listener: impl Fn(&ServerSnapshot) + Send + Sync + 'static) -> u64 {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Removes a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let Ok(mut listeners) = self.listeners.write() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    async fn fetch(self, request: ServerRequest, key: String, token: CancellationToken) {
        let result = tokio::select! {
            _ = token.cancelled() => Err(DataSourceError::Cancelled),
            result = self.source.get_rows(request, token.clone()) => result,
        };
        self.commit(&key, result);
    }

    fn commit(&self, key: &str, result: Result<ServerResponse, DataSourceError>) {
        let snapshot = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.desired.as_deref() != Some(key) {
                log::debug!("discarding stale server response");
                return;
            }
            match result {
                Ok(response) => {
                    self.cache.insert(key, response.clone());
                    inner.snapshot = ServerSnapshot::loaded(response);
                }
                Err(error) if error.is_cancelled() => return,
                Err(error) => {
                    log::warn!("server fetch failed: {}", error);
                    inner.snapshot.loading = false;
                    inner.snapshot.error = Some(error.to_string());
                }
            }
            inner.in_flight = None;
            inner.snapshot.clone()
        };
        self.notify(&snapshot);
    }

    fn notify(&self, snapshot: &ServerSnapshot) {
        let listeners: Vec<SnapshotListener> = match self.listeners.read() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;

    /// Page 0 answers slowly, page 2 always fails, the rest answer quickly.
    #[derive(Default)]
    struct PagedSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ServerSideDataSource for PagedSource {
        async fn get_rows(
            &self,
            request: ServerRequest,
            cancel: CancellationToken,
        ) -> Result<ServerResponse, DataSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = if request.page == 0 { 80 } else { 5 };
            tokio::select! {
                _ = cancel.cancelled() => return Err(DataSourceError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
            }
            if request.page == 2 {
                return Err(DataSourceError::failed("backend down"));
            }
            Ok(ServerResponse {
                data: (0..request.page_size)
                    .map(|i| json!({ "id": format!("{}-{}", request.page, i) }))
                    .collect(),
                total_rows: 100,
                page: request.page,
                page_size: request.page_size,
            })
        }
    }

    fn page(page: usize) -> ServerRequest {
        ServerRequest {
            page,
            page_size: 3,
            ..Default::default()
        }
    }

    fn store_with_channel() -> (
        Arc<PagedSource>,
        ServerRowStore,
        mpsc::UnboundedReceiver<ServerSnapshot>,
    ) {
        let source = Arc::new(PagedSource::default());
        let store = ServerRowStore::new(source.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        store.subscribe(move |snapshot| {
            let _ = tx.send(snapshot.clone());
        });
        (source, store, rx)
    }

    #[tokio::test]
    async fn test_fetch_commits_and_caches() {
        let (source, store, mut rx) = store_with_channel();

        let first = store.snapshot(&page(1)).unwrap();
        assert!(first.loading);
        assert!(first.rows.is_empty());

        let committed = rx.recv().await.unwrap();
        assert!(!committed.loading);
        assert_eq!(committed.rows.len(), 3);
        assert_eq!(committed.total_rows, 100);

        // Same request: served from the committed snapshot.
        assert_eq!(store.snapshot(&page(1)).unwrap(), committed);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        store.snapshot(&page(3)).unwrap();
        rx.recv().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // Back to a cached page: no new fetch, rows available immediately.
        let cached = store.snapshot(&page(1)).unwrap();
        assert!(!cached.loading);
        assert_eq!(cached.rows[0]["id"], json!("1-0"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_superseded_fetch_is_discarded() {
        let (_source, store, mut rx) = store_with_channel();

        store.snapshot(&page(0)).unwrap();
        store.snapshot(&page(1)).unwrap();

        let committed = rx.recv().await.unwrap();
        assert_eq!(committed.rows[0]["id"], json!("1-0"));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(store.current().rows[0]["id"], json!("1-0"));
        assert!(!store.is_cached(&page(0)));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_rows() {
        let (_source, store, mut rx) = store_with_channel();

        store.snapshot(&page(1)).unwrap();
        rx.recv().await.unwrap();

        let loading = store.snapshot(&page(2)).unwrap();
        assert!(loading.loading);
        assert_eq!(loading.rows.len(), 3);

        let failed = rx.recv().await.unwrap();
        assert!(!failed.loading);
        assert!(failed.error.as_deref().unwrap().contains("backend down"));
        assert_eq!(failed.rows[0]["id"], json!("1-0"));
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let (source, store, mut rx) = store_with_channel();

        store.snapshot(&page(1)).unwrap();
        rx.recv().await.unwrap();
        store.invalidate();
        assert!(store.snapshot(&page(1)).unwrap().loading);
        rx.recv().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_page_refetches() {
        let source = Arc::new(PagedSource::default());
        let store = ServerRowStore::with_cache(
            source.clone(),
            PageCacheConfig::default().with_ttl(Duration::from_millis(20)),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        store.subscribe(move |snapshot| {
            let _ = tx.send(snapshot.clone());
        });

        store.snapshot(&page(1)).unwrap();
        rx.recv().await.unwrap();
        store.snapshot(&page(3)).unwrap();
        rx.recv().await.unwrap();
        assert!(store.is_cached(&page(1)));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!store.is_cached(&page(1)));

        // Expired: the old rows stay visible while the page is fetched again.
        let revisit = store.snapshot(&page(1)).unwrap();
        assert!(revisit.loading);
        rx.recv().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_fetch_needs_runtime() {
        let store = ServerRowStore::new(Arc::new(PagedSource::default()));
        assert!(matches!(store.snapshot(&page(1)), Err(GridError::NoRuntime)));
    }
}
