//! Core trait for admission-time candidate exclusion.
//!
//! Scoring signals (genre preference, recency, semantic similarity) live in
//! [`crate::scorer`]; what's left here is the narrower job of throwing a
//! candidate out entirely before it's ever scored — malformed records and
//! things the user has already seen this run.

use catalog::ScreenContentCandidate;
use std::collections::HashSet;

/// Shared state a filter may need while walking a candidate list.
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    /// Catalog ids to exclude: already in the user's library, already
    /// dismissed, or already admitted earlier in this run.
    pub seen_ids: HashSet<i64>,
}

/// Core trait for excluding candidates before scoring.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be used in concurrent contexts
/// - Filters take ownership of the `Vec<ScreenContentCandidate>` and return a
///   filtered `Vec`, matching the pipeline's move-based style rather than
///   filtering in place
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    fn apply(&self, candidates: Vec<ScreenContentCandidate>, context: &FilterContext) -> Vec<ScreenContentCandidate>;
}
