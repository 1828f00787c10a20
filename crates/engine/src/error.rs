//! Error taxonomy for the engine crate (§7).
//!
//! Adapter and repository errors are wrapped rather than discarded so a
//! caller that does want to see why a single pipeline came back empty still
//! can; the pipelines themselves treat all of these as "log and continue"
//! except for the final repository commit, which is the one place a
//! generation run actually fails.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] media_store::StoreError),

    #[error(transparent)]
    Catalog(#[from] catalog::CatalogError),

    #[error(transparent)]
    Embedding(#[from] embedding::EmbeddingError),

    #[error("generation was cancelled before it could commit")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EngineError>;
