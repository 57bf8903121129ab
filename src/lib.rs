//! # Policy Kit
//!
//! Two small utilities behind a compliance dashboard:
//!
//! - **`PageCache`**: a keyed cache for asynchronously fetched view data, with
//!   TTL expiry, forced refresh, and optional sharing of in-flight fetches.
//! - **`Paginator`**: lays out a markdown-subset policy document (headings,
//!   bold lines, paragraphs) onto fixed-size pages and serializes them to PDF.
//!
//! The two are independent.
//!
//! ## Cache
//!
//! ```rust
//! use policy_kit::{CacheConfig, PageCache, ReadOptions};
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let cache: PageCache<u64> = PageCache::new(CacheConfig::default());
//!
//! let open_tasks = cache
//!     .read_with(
//!         "tasks:open",
//!         ReadOptions::new().ttl(Duration::from_secs(30)),
//!         || async { Ok::<_, std::io::Error>(17) },
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(open_tasks.value, 17);
//!
//! // Bypass freshness after a mutation.
//! let refreshed = cache
//!     .refresh("tasks:open", || async { Ok::<_, std::io::Error>(16) })
//!     .await
//!     .unwrap();
//! assert_eq!(refreshed.value, 16);
//! # });
//! ```
//!
//! ## Pagination
//!
//! ```rust
//! use policy_kit::{LayoutConfig, Paginator, PDF_MIME};
//!
//! let body = "# Purpose\n\nThis policy defines how access is granted.\n## Scope\nAll staff.";
//! let doc = Paginator::new(LayoutConfig::default()).paginate("Access Control Policy", body);
//!
//! assert_eq!(doc.page_count(), 1);
//! let pdf = doc.to_pdf();
//! assert!(pdf.starts_with(b"%PDF"));
//! assert_eq!(PDF_MIME, "application/pdf");
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod markdown;
pub mod metrics;
pub mod query;
pub mod stats;

pub use cache::{Lookup, Origin, PageCache, ReadOptions};
pub use config::{CacheConfig, LayoutConfig, LineStyle, WrapOverflow, DEFAULT_TTL};
pub use document::{Document, Page, TextRun, TextStyle, PDF_MIME};
pub use error::{BoxError, ExportError, ExportResult, FetchError};
pub use layout::Paginator;
pub use markdown::{body_lines, LineKind};
pub use metrics::{wrap_text, FontWeight, Helvetica, TextMetrics};
pub use query::{PageQuery, QueryState};
pub use stats::{CacheStats, StatsSnapshot};

// Internal modules - not part of public API
pub(crate) mod entry;
pub(crate) mod pdf;
pub(crate) mod storage;

pub mod cli;
pub mod logging;
pub use logging::init_logging;
