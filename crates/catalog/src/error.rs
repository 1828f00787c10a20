//! Failure modes surfaced by catalog adapters.
//!
//! Adapters stand in for external services (a screen-content index, a book
//! search API); callers are expected to treat any of these as "this source
//! produced nothing this round" rather than aborting a whole generation run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("adapter call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("upstream catalog error: {0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
