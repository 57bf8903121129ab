//! Error types for the policy kit.
//!
//! The cache has exactly one failure mode, [`FetchError`], which wraps whatever
//! the caller's fetch future failed with. Rendering itself never fails; the
//! export side (reading input, loading a layout file) reports [`ExportError`].

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Boxed cause carried by a [`FetchError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A fetch for a cache key failed.
///
/// The error is `Clone` so that a single shared in-flight fetch can hand the
/// same failure to every waiter. No cache entry is ever written for a failed
/// fetch.
#[derive(Debug, Clone, Error)]
#[error("fetch failed for key '{key}'")]
pub struct FetchError {
    key: String,
    #[source]
    cause: Arc<dyn StdError + Send + Sync + 'static>,
}

impl FetchError {
    /// Wrap the cause of a failed fetch for `key`.
    pub fn new(key: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            key: key.into(),
            cause: Arc::from(cause.into()),
        }
    }

    /// The key whose fetch failed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying error produced by the fetch.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.cause
    }
}

/// Errors raised while loading input or writing a rendered document.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Reading the source or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The layout file is not valid TOML for a layout.
    #[error("layout parse error: {0}")]
    Layout(#[from] toml::de::Error),

    /// The layout parsed but describes unusable page geometry.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// A `--date` override could not be parsed.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// A specialized Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
