//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::traits::{Filter, FilterContext};
use catalog::ScreenContentCandidate;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(InvariantFilter)
///     .add_filter(AlreadySeenFilter);
///
/// let filtered = pipeline.apply(candidates, &context);
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Apply all filters in sequence to the candidates.
    pub fn apply(&self, candidates: Vec<ScreenContentCandidate>, context: &FilterContext) -> Vec<ScreenContentCandidate> {
        let mut current = candidates;
        for filter in &self.filters {
            tracing::debug!(
                filter = filter.name(),
                input_count = current.len(),
                "applying filter"
            );
            current = filter.apply(current, context);
            tracing::debug!(
                filter = filter.name(),
                output_count = current.len(),
                "filter applied"
            );
        }
        current
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{AlreadySeenFilter, InvariantFilter};

    fn candidate(id: i64, title: &str) -> ScreenContentCandidate {
        ScreenContentCandidate {
            id,
            title: title.to_string(),
            year: Some(2020),
            overview: None,
            poster_url: None,
            vote_average: 7.0,
            vote_count: 100,
            popularity: 50.0,
            genre_ids: vec![],
        }
    }

    #[test]
    fn empty_pipeline_passes_everything_through() {
        let pipeline = FilterPipeline::new();
        let candidates = vec![candidate(1, "A"), candidate(2, "B")];
        let filtered = pipeline.apply(candidates, &FilterContext::default());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn invariant_then_already_seen_compose_in_order() {
        let mut context = FilterContext::default();
        context.seen_ids.insert(2);

        let pipeline = FilterPipeline::new()
            .add_filter(InvariantFilter)
            .add_filter(AlreadySeenFilter);

        let mut malformed = candidate(3, "");
        malformed.id = 0;
        let candidates = vec![candidate(1, "A"), candidate(2, "B"), malformed];

        let filtered = pipeline.apply(candidates, &context);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }
}
