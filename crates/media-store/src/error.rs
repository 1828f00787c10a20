//! Error types for the media-store crate.
//!
//! Rust error handling concepts demonstrated:
//! - thiserror for defining custom error types
//! - Enum variants for different error cases
//! - Automatic `Display` and `Error` trait implementations

use thiserror::Error;

/// Errors a `Repository` implementation can raise.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user {0} not found")]
    UserNotFound(u32),

    #[error("recommendation {0} not found")]
    RecommendationNotFound(u64),

    #[error("persistence backend failed: {0}")]
    Backend(String),

    #[error("transaction already committed or rolled back")]
    TransactionClosed,
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, StoreError>;
