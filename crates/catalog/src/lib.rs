//! External catalog boundary: screen content and book discovery, plus the
//! supporting vocabulary (genre tables, curated book queries) and a bounded
//! cache for streaming-availability lookups.
//!
//! Nothing in this crate talks to a real network — `ScreenContentAdapter`
//! and `BookAdapter` are the seams a real HTTP client would implement;
//! `InMemoryScreenContentAdapter`/`InMemoryBookAdapter` are deterministic
//! stand-ins used by tests and the reference `cli` binary.

pub mod book;
pub mod book_catalog;
pub mod candidates;
pub mod error;
pub mod genres;
pub mod lru;
pub mod screen_content;

pub use book::{BookAdapter, InMemoryBookAdapter};
pub use candidates::{BookCandidate, ScreenContentCandidate, WatchProviders};
pub use error::{CatalogError, Result};
pub use genres::ScreenKind;
pub use lru::{BoundedCache, STREAMING_CACHE_CAPACITY};
pub use screen_content::{DiscoverParams, InMemoryScreenContentAdapter, ScreenContentAdapter, SortBy};
