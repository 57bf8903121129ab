//! Cache entry with its freshness window.

use std::time::Duration;
use tokio::time::Instant;

const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A fetched value and the instant it stops being fresh.
///
/// Entries are replaced wholesale on refetch and never mutated in place.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    /// The fetched value.
    pub(crate) value: T,

    /// The entry is fresh strictly before this instant.
    pub(crate) expires_at: Instant,
}

impl<T> Entry<T> {
    /// Create an entry stored at `now` that stays fresh for `ttl`.
    ///
    /// A TTL too large to represent keeps the entry fresh for roughly 30 years.
    pub fn new(value: T, now: Instant, ttl: Duration) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { value, expires_at }
    }

    /// Check freshness at a given instant.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// Get a reference to the value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Get the expiration time.
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}
