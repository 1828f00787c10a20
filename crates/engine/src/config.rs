//! Engine-wide tunables (§6 of the design doc).
//!
//! These mirror the source's class-attribute constants: documented,
//! immutable at runtime, never environment-parsed. The `cli` binary exposes
//! a handful of them as flags sharing these same defaults.

/// Per-(media-type, genre) cap on admitted recommendations.
pub const PER_GENRE_CAP: usize = 5;

/// How many of a user's top preferred genres the screen-content pipeline's
/// discovery phase will consider.
pub const MAX_PREFERRED_GENRES: usize = 8;

/// Upper bound on distinct genres filled per media type in one run.
pub const MAX_TOTAL_GENRES: usize = 12;

/// How many "similar" items to request per seed title.
pub const SIMILAR_PER_SEED: usize = 3;

/// How many rated seed titles feed the similar-seeded phase.
pub const MAX_SEEDS: usize = 8;

/// Minimum rating for a user media item to count as a seed.
pub const MIN_RATING_FOR_SEED: u8 = 4;

/// Country code used for streaming-availability lookups.
pub const STREAMING_COUNTRY: &str = "FR";

/// Bound on how many candidates a single genre-discovery round enriches
/// with streaming availability, regardless of how many slots remain open.
pub const ENRICHMENT_OVERFETCH: usize = 2;

/// A full refresh with more than this many non-dismissed recommendations
/// generated within [`STALENESS_WINDOW_HOURS`] is considered fresh and
/// skips generation unless `force_refresh` is set.
pub const STALENESS_THRESHOLD_COUNT: usize = 20;

/// Window (in hours) used to decide whether existing recommendations are
/// still fresh enough to skip an unforced refresh.
pub const STALENESS_WINDOW_HOURS: i64 = 12;

/// Dismissed recommendations older than this (in days) are garbage
/// collected on every refresh, forced or not.
pub const DISMISSED_GC_WINDOW_DAYS: i64 = 7;

/// Size of the bounded worker pool [`embedding::EmbeddingService`] offloads
/// CPU-bound encoding onto.
pub const EMBEDDING_WORKER_POOL_SIZE: usize = embedding::EMBEDDING_WORKER_POOL_SIZE;

/// Dimensionality every embedding produced or consumed by the engine has.
pub const EMBEDDING_DIM: usize = media_store::EMBEDDING_DIM;
