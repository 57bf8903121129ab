//! Integration tests for the page cache.

use policy_kit::{CacheConfig, Origin, PageCache, ReadOptions};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{advance, sleep};

const TTL: Duration = Duration::from_millis(1000);

fn cache() -> PageCache<u32> {
    PageCache::new(CacheConfig::new().default_ttl(TTL).build())
}

/// A fetch that counts its calls and returns `value`.
fn counted(
    calls: &Arc<AtomicUsize>,
    value: u32,
) -> impl FnOnce() -> std::pin::Pin<Box<dyn std::future::Future<Output = io::Result<u32>> + Send>>
{
    let calls = Arc::clone(calls);
    move || {
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_fresh_read_returns_original_value() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let first = cache.read("foo", counted(&calls, 42)).await.unwrap();
    assert_eq!(first.value, 42);

    let second = cache.read("foo", counted(&calls, 99)).await.unwrap();
    assert_eq!(second.value, 42);
    assert_eq!(second.origin, Origin::Cached);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cache.is_loading("foo"));
}

#[tokio::test(start_paused = true)]
async fn test_expired_read_fetches_again() {
    let cache = cache();

    cache.read("foo", || async { Ok::<_, io::Error>(42) }).await.unwrap();

    advance(Duration::from_millis(999)).await;
    let still_fresh = cache.read("foo", || async { Ok::<_, io::Error>(99) }).await.unwrap();
    assert_eq!(still_fresh.value, 42);

    advance(Duration::from_millis(101)).await;
    let refreshed = cache.read("foo", || async { Ok::<_, io::Error>(99) }).await.unwrap();
    assert_eq!(refreshed.value, 99);
    assert_eq!(refreshed.origin, Origin::Fetched);
    assert_eq!(cache.peek("foo"), Some(99));
}

#[tokio::test(start_paused = true)]
async fn test_expiry_boundary_is_stale() {
    let cache = cache();

    cache.read("k", || async { Ok::<_, io::Error>(1) }).await.unwrap();
    advance(TTL).await;

    assert!(!cache.contains("k"));
    assert_eq!(cache.peek("k"), None);
    // The stale entry is still stored until something replaces it.
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_remaining_ttl_counts_down() {
    let cache = cache();
    assert_eq!(cache.remaining_ttl("k"), None);

    cache.read("k", || async { Ok::<_, io::Error>(1) }).await.unwrap();
    assert_eq!(cache.remaining_ttl("k"), Some(TTL));

    advance(Duration::from_millis(400)).await;
    assert_eq!(cache.remaining_ttl("k"), Some(Duration::from_millis(600)));

    advance(Duration::from_millis(600)).await;
    assert_eq!(cache.remaining_ttl("k"), None);
}

#[tokio::test(start_paused = true)]
async fn test_huge_ttl_is_stored_and_stays_fresh() {
    let cache = cache();

    let stored = cache
        .read_with("k", ReadOptions::new().ttl(Duration::MAX), || async {
            Ok::<_, io::Error>(7)
        })
        .await
        .unwrap();
    assert_eq!(stored.origin, Origin::Fetched);

    advance(Duration::from_secs(86400 * 365)).await;
    assert_eq!(cache.peek("k"), Some(7));
    assert!(cache.remaining_ttl("k").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_force_bypasses_fresh_entry() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    cache.read("k", counted(&calls, 1)).await.unwrap();
    let forced = cache
        .read_with("k", ReadOptions::new().force(true), counted(&calls, 2))
        .await
        .unwrap();

    assert_eq!(forced.value, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.peek("k"), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_per_read_ttl_overrides_default() {
    let cache = cache();

    cache
        .read_with(
            "long",
            ReadOptions::new().ttl(Duration::from_secs(60)),
            || async { Ok::<_, io::Error>(1) },
        )
        .await
        .unwrap();
    cache.read("short", || async { Ok::<_, io::Error>(2) }).await.unwrap();

    advance(Duration::from_secs(5)).await;
    assert!(cache.contains("long"));
    assert!(!cache.contains("short"));

    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.keys(), vec!["long".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_poison_cache() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let failing = {
        let calls = Arc::clone(&calls);
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<u32, _>(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        }
    };

    let err = cache.read("k", failing).await.unwrap_err();
    assert_eq!(err.key(), "k");
    assert!(cache.is_empty());

    let retry = cache.read("k", counted(&calls, 5)).await.unwrap();
    assert_eq!(retry.origin, Origin::Fetched);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let stats = cache.stats();
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.fetches, 2);
    assert_eq!(stats.misses, 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_without_dedupe_last_write_wins() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let slow = |delay: u64, value: u32, calls: Arc<AtomicUsize>| {
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(delay)).await;
            Ok::<_, io::Error>(value)
        }
    };

    // The first caller's fetch finishes last, so its value is the one kept.
    let (a, b) = tokio::join!(
        cache.read("k", slow(300, 1, Arc::clone(&calls))),
        cache.read("k", slow(100, 2, Arc::clone(&calls))),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.unwrap().value, 1);
    assert_eq!(b.unwrap().value, 2);
    assert_eq!(cache.peek("k"), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_with_dedupe_share_one_fetch() {
    let cache: PageCache<u32> = PageCache::new(CacheConfig::new().dedupe_in_flight(true));
    let calls = Arc::new(AtomicUsize::new(0));

    let reads = (0..5).map(|i| {
        let cache = cache.clone();
        let calls = Arc::clone(&calls);
        tokio::spawn(async move {
            cache
                .read("k", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(200)).await;
                    Ok::<_, io::Error>(i)
                })
                .await
        })
    });
    let handles: Vec<_> = reads.collect();

    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let first = values[0].value;
    assert!(values.iter().all(|lookup| lookup.value == first));
    assert_eq!(
        values.iter().filter(|l| l.origin == Origin::Fetched).count(),
        1
    );
    assert_eq!(cache.stats().joined, 4);
}

#[tokio::test(start_paused = true)]
async fn test_shared_failure_reaches_all_waiters_and_stores_nothing() {
    let cache: PageCache<u32> = PageCache::new(CacheConfig::new().dedupe_in_flight(true));

    let failing = || async {
        sleep(Duration::from_millis(50)).await;
        Err::<u32, _>(io::Error::other("timeout"))
    };

    let (a, b) = tokio::join!(cache.read("k", failing), cache.read("k", failing));

    assert_eq!(a.unwrap_err().cause().to_string(), "timeout");
    assert_eq!(b.unwrap_err().cause().to_string(), "timeout");
    assert!(cache.is_empty());

    // Nothing shared lingers: the next read runs its own fetch.
    let next = cache.read("k", || async { Ok::<_, io::Error>(3) }).await.unwrap();
    assert_eq!(next.origin, Origin::Fetched);
}

#[tokio::test(start_paused = true)]
async fn test_forced_read_does_not_join_shared_fetch() {
    let cache: PageCache<u32> = PageCache::new(CacheConfig::new().dedupe_in_flight(true));
    let calls = Arc::new(AtomicUsize::new(0));

    let slow = |value: u32, calls: Arc<AtomicUsize>| {
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(100)).await;
            Ok::<_, io::Error>(value)
        }
    };

    let (a, b) = tokio::join!(
        cache.read("k", slow(1, Arc::clone(&calls))),
        cache.refresh("k", slow(2, Arc::clone(&calls))),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.unwrap().value, 1);
    assert_eq!(b.unwrap().value, 2);
}

#[tokio::test]
async fn test_independent_caches_are_isolated() {
    let first = cache();
    let second = cache();

    first.read("k", || async { Ok::<_, io::Error>(1) }).await.unwrap();

    assert!(first.contains("k"));
    assert!(!second.contains("k"));
}

#[tokio::test]
async fn test_clone_shares_entries() {
    let cache = cache();
    let handle = cache.clone();

    cache.read("k", || async { Ok::<_, io::Error>(8) }).await.unwrap();
    assert_eq!(handle.peek("k"), Some(8));

    handle.clear();
    assert!(cache.is_empty());
}
