//! The keyed TTL page cache.
//!
//! `PageCache` memoizes asynchronous reads by a caller-supplied key. A read
//! returns the stored value while its entry is fresh and otherwise runs the
//! caller's fetch, storing the result with a new expiry. Failed fetches store
//! nothing, so the next read for the key simply tries again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::error::{BoxError, FetchError};
use crate::stats::{CacheStats, StatsSnapshot};
use crate::storage::Store;

/// Slot shared by concurrent misses when in-flight deduplication is enabled.
type SharedFetch<T> = Arc<OnceCell<Result<T, FetchError>>>;

/// Where the value returned by a read came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Served from a fresh entry; no fetch ran.
    Cached,
    /// This read ran the fetch.
    Fetched,
    /// This read waited on a fetch started by another caller.
    Joined,
}

/// The value produced by a successful read.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Lookup<T> {
    fn new(value: T, origin: Origin) -> Self {
        Self { value, origin }
    }

    /// Whether the value came from the cache without a fetch.
    pub fn is_cached(&self) -> bool {
        self.origin == Origin::Cached
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Per-read options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// TTL for a value stored by this read. `None` uses the cache default.
    pub ttl: Option<Duration>,
    /// Skip the freshness check and always fetch.
    pub force: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// A keyed cache of asynchronously fetched values with TTL expiry.
///
/// Cloning a `PageCache` creates a new handle to the same entries. Build one
/// at application start and pass it to whatever needs it; tests build their
/// own so nothing leaks between them.
///
/// # Example
/// ```
/// use policy_kit::{CacheConfig, Origin, PageCache};
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let cache: PageCache<Vec<String>> = PageCache::new(
///     CacheConfig::new().default_ttl(Duration::from_secs(60)).build(),
/// );
///
/// let first = cache
///     .read("frameworks", || async { Ok::<_, std::io::Error>(vec!["SOC 2".to_string()]) })
///     .await
///     .unwrap();
/// assert_eq!(first.origin, Origin::Fetched);
///
/// // Fresh entry: the second fetch never runs.
/// let second = cache
///     .read("frameworks", || async { Ok::<_, std::io::Error>(Vec::new()) })
///     .await
///     .unwrap();
/// assert_eq!(second.value, vec!["SOC 2".to_string()]);
/// # });
/// ```
#[derive(Debug)]
pub struct PageCache<T> {
    inner: Arc<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    store: Store<T>,
    config: CacheConfig,
    stats: Arc<CacheStats>,
    /// Number of fetches currently running per key.
    pending: Mutex<HashMap<String, usize>>,
    /// Shared fetches, only used when deduplication is enabled.
    in_flight: Mutex<HashMap<String, SharedFetch<T>>>,
}

impl<T> Clone for PageCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> PageCache<T> {
    /// Create a new cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let stats = Arc::new(CacheStats::new());
        Self {
            inner: Arc::new(Inner {
                store: Store::new(Arc::clone(&stats)),
                config,
                stats,
                pending: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Read `key` with the default TTL, fetching only if no fresh entry exists.
    pub async fn read<F, Fut, E>(&self, key: &str, fetch: F) -> Result<Lookup<T>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        self.read_with(key, ReadOptions::default(), fetch).await
    }

    /// Fetch `key` regardless of freshness and store the result.
    pub async fn refresh<F, Fut, E>(&self, key: &str, fetch: F) -> Result<Lookup<T>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        self.read_with(key, ReadOptions::new().force(true), fetch)
            .await
    }

    /// Read `key` with explicit options.
    ///
    /// Without `force`, a fresh entry is returned and `fetch` is never
    /// called. Otherwise `fetch` runs; on success its value is stored with
    /// `expires_at = now + ttl`, replacing any previous entry. On failure the
    /// error is returned and the cache is left untouched.
    pub async fn read_with<F, Fut, E>(
        &self,
        key: &str,
        options: ReadOptions,
        fetch: F,
    ) -> Result<Lookup<T>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let ttl = options.ttl.unwrap_or(self.inner.config.default_ttl);

        if options.force {
            self.inner.stats.record_forced();
            debug!(key, "forced refresh");
            let value = self.fetch_and_store(key, ttl, fetch).await?;
            return Ok(Lookup::new(value, Origin::Fetched));
        }

        if let Some(value) = self.inner.store.get_fresh(key, Instant::now()) {
            self.inner.stats.record_hit();
            debug!(key, "cache hit");
            return Ok(Lookup::new(value, Origin::Cached));
        }

        self.inner.stats.record_miss();
        debug!(key, "cache miss");

        if self.inner.config.dedupe_in_flight {
            return self.read_shared(key, ttl, fetch).await;
        }

        let value = self.fetch_and_store(key, ttl, fetch).await?;
        Ok(Lookup::new(value, Origin::Fetched))
    }

    /// Drop the entry for `key` so the next read fetches.
    ///
    /// Returns `true` if an entry existed. A fetch already running for the
    /// key is not affected and will store its result when it completes.
    pub fn invalidate(&self, key: &str) -> bool {
        let existed = self.inner.store.remove(key);
        debug!(key, existed, "invalidated");
        existed
    }

    /// The fresh value for `key`, without fetching.
    pub fn peek(&self, key: &str) -> Option<T> {
        self.inner.store.get_fresh(key, Instant::now())
    }

    /// Time left before the entry for `key` goes stale, if it is fresh.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.inner
            .store
            .expires_at(key)
            .filter(|&expires_at| now < expires_at)
            .map(|expires_at| expires_at - now)
    }

    /// Whether a fresh entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.store.contains_fresh(key, Instant::now())
    }

    /// Whether a fetch for `key` is currently running.
    pub fn is_loading(&self, key: &str) -> bool {
        lock(&self.inner.pending).contains_key(key)
    }

    /// Number of stored entries.
    ///
    /// Stale entries count until they are overwritten, invalidated or
    /// removed by [`cleanup_expired`](Self::cleanup_expired).
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Stored keys, oldest first.
    pub fn keys(&self) -> Vec<String> {
        self.inner.store.keys()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.inner.store.clear();
    }

    /// Remove entries that are no longer fresh.
    ///
    /// Nothing calls this automatically; stale entries are otherwise only
    /// replaced by the next successful fetch for their key.
    pub fn cleanup_expired(&self) -> usize {
        let removed = self.inner.store.remove_stale(Instant::now());
        debug!(removed, "removed stale entries");
        removed
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Run `fetch` and store its value under `key`.
    async fn fetch_and_store<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let _pending = PendingGuard::enter(&self.inner.pending, key);
        self.inner.stats.record_fetch();

        match fetch().await {
            Ok(value) => {
                let entry = Entry::new(value.clone(), Instant::now(), ttl);
                self.inner.store.insert(key.to_string(), entry);
                debug!(key, ?ttl, "stored fetched value");
                Ok(value)
            }
            Err(err) => {
                self.inner.stats.record_failure();
                let err = FetchError::new(key, err);
                debug!(key, cause = %err.cause(), "fetch failed, nothing stored");
                Err(err)
            }
        }
    }

    /// Miss path when deduplication is on: join the running fetch for `key`
    /// or start one that later callers can join.
    async fn read_shared<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Lookup<T>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let slot: SharedFetch<T> = {
            let mut in_flight = lock(&self.inner.in_flight);
            Arc::clone(
                in_flight
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        // If the caller running the fetch is dropped, a waiter runs its own.
        let mut ran = false;
        let ran_here = &mut ran;
        let shared = &slot;
        let result = slot
            .get_or_init(move || {
                *ran_here = true;
                async move {
                    let result = self.fetch_and_store(key, ttl, fetch).await;
                    self.release_slot(key, shared);
                    result
                }
            })
            .await
            .clone();

        let origin = if ran {
            Origin::Fetched
        } else {
            self.inner.stats.record_join();
            debug!(key, "joined in-flight fetch");
            Origin::Joined
        };

        result.map(|value| Lookup::new(value, origin))
    }

    /// Forget the shared slot for `key` once its fetch has settled, unless
    /// it has already been replaced.
    fn release_slot(&self, key: &str, slot: &SharedFetch<T>) {
        let mut in_flight = lock(&self.inner.in_flight);
        if in_flight.get(key).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            in_flight.remove(key);
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for PageCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Counts a running fetch for as long as it is alive, including when the
/// reading future is dropped mid-fetch.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<String, usize>>,
    key: String,
}

impl<'a> PendingGuard<'a> {
    fn enter(pending: &'a Mutex<HashMap<String, usize>>, key: &str) -> Self {
        *lock(pending).entry(key.to_string()).or_insert(0) += 1;
        Self {
            pending,
            key: key.to_string(),
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut pending = lock(self.pending);
        if let Some(count) = pending.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                pending.remove(&self.key);
            }
        }
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
