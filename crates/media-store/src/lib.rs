//! Domain types and the repository boundary the recommendation engine reads
//! from and writes through.
//!
//! This crate owns no schema, no migrations, and no database driver — it
//! only defines what the rest of the engine needs to see: `Media` the
//! engine reads, `Recommendation` the engine produces, and the `Repository`
//! trait that makes persistence swappable. `InMemoryRepository` is a
//! faithful reference implementation used by tests and the `cli` binary.

pub mod error;
pub mod memory;
pub mod repository;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::InMemoryRepository;
pub use repository::{RecommendationFilter, RecommendationTransaction, Repository};
pub use types::{
    Media, MediaStatus, MediaType, NewRecommendation, Recommendation, RecommendationId,
    RecommendationSource, ShortVideoMetadata, UserId, EMBEDDING_DIM, FALLBACK_GENRE,
};
