//! Candidate scoring and admission-time filtering for screen content.
//!
//! This crate provides:
//! - `Filter`/`FilterPipeline` for excluding malformed or already-seen
//!   candidates before they're scored
//! - `ScoringWeights`/`CandidateScorer` implementing the additive
//!   multi-signal scoring formula
//!
//! ## Architecture
//! A generation pass for one genre/phase looks like:
//! 1. `FilterPipeline` drops malformed candidates and ones already admitted
//!    this run
//! 2. `CandidateScorer::score_all` scores, sorts, and deduplicates the rest
//! 3. The caller (the screen-content pipeline in the `engine` crate) admits
//!    from the top respecting its per-genre cap
//!
//! ## Example Usage
//! ```ignore
//! use scoring::{FilterPipeline, filters::*};
//!
//! let pipeline = FilterPipeline::new()
//!     .add_filter(InvariantFilter)
//!     .add_filter(AlreadySeenFilter);
//!
//! let filtered = pipeline.apply(candidates, &context);
//! let scored = scorer.score_all(inputs, current_year).await;
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod scorer;
pub mod traits;
pub mod weights;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use scorer::{CandidateInput, CandidateScorer, ScoredCandidate, ScoringSource};
pub use traits::{Filter, FilterContext};
pub use weights::ScoringWeights;
