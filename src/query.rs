//! A bound, repeatable cache query.
//!
//! `PageQuery` ties a key, a TTL and a reusable fetcher to a [`PageCache`]
//! and keeps the last observed state around for a view to render: the data,
//! whether a fetch is running, and the last error.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::cache::{Lookup, PageCache, ReadOptions};
use crate::error::{BoxError, FetchError};

/// What a view knows about its query.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    /// The last successfully read value.
    pub data: Option<T>,
    pub is_loading: bool,
    /// Error from the most recent read, cleared by the next success.
    pub error: Option<FetchError>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

/// A cache read bound to one key.
///
/// ```
/// use policy_kit::{PageCache, PageQuery};
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let cache: PageCache<u32> = PageCache::default();
/// let mut query = PageQuery::new(cache, "tasks:open", Duration::from_secs(30), || async {
///     Ok::<_, std::io::Error>(12)
/// });
///
/// query.load().await;
/// assert_eq!(query.state().data, Some(12));
/// assert!(!query.state().is_loading);
/// # });
/// ```
pub struct PageQuery<T, F> {
    cache: PageCache<T>,
    key: String,
    ttl: Duration,
    fetch: F,
    state: QueryState<T>,
}

impl<T, F, Fut, E> PageQuery<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    pub fn new(cache: PageCache<T>, key: impl Into<String>, ttl: Duration, fetch: F) -> Self {
        Self {
            cache,
            key: key.into(),
            ttl,
            fetch,
            state: QueryState::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &QueryState<T> {
        &self.state
    }

    /// Read through the cache, fetching only when the entry is missing or stale.
    pub async fn load(&mut self) -> &QueryState<T> {
        self.run(false).await
    }

    /// Fetch regardless of freshness.
    pub async fn refetch(&mut self) -> &QueryState<T> {
        self.run(true).await
    }

    async fn run(&mut self, force: bool) -> &QueryState<T> {
        self.state.is_loading = true;
        let options = ReadOptions::new().ttl(self.ttl).force(force);
        let result = self.cache.read_with(&self.key, options, &self.fetch).await;
        self.apply(result);
        &self.state
    }

    fn apply(&mut self, result: Result<Lookup<T>, FetchError>) {
        self.state.is_loading = false;
        match result {
            Ok(lookup) => {
                self.state.data = Some(lookup.value);
                self.state.error = None;
            }
            Err(err) => {
                warn!(key = %self.key, cause = %err.cause(), "page query failed");
                // Keep whatever was shown before the failure.
                self.state.error = Some(err);
            }
        }
    }
}
