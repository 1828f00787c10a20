//! Filter to remove candidates the current run has already admitted or
//! excluded up front (library items, dismissed items, completion-mode
//! already-recommended items).

use crate::traits::{Filter, FilterContext};
use catalog::ScreenContentCandidate;

/// Removes candidates whose id is in `context.seen_ids`.
pub struct AlreadySeenFilter;

impl Filter for AlreadySeenFilter {
    fn name(&self) -> &str {
        "AlreadySeenFilter"
    }

    fn apply(&self, candidates: Vec<ScreenContentCandidate>, context: &FilterContext) -> Vec<ScreenContentCandidate> {
        candidates
            .into_iter()
            .filter(|c| !context.seen_ids.contains(&c.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64) -> ScreenContentCandidate {
        ScreenContentCandidate {
            id,
            title: format!("Title {id}"),
            year: None,
            overview: None,
            poster_url: None,
            vote_average: 0.0,
            vote_count: 0,
            popularity: 0.0,
            genre_ids: vec![],
        }
    }

    #[test]
    fn already_seen_filter_excludes_configured_ids() {
        let mut context = FilterContext::default();
        context.seen_ids.insert(100);
        context.seen_ids.insert(200);

        let candidates = vec![candidate(100), candidate(101), candidate(200), candidate(300)];
        let filtered = AlreadySeenFilter.apply(candidates, &context);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].id, 101);
        assert_eq!(filtered[1].id, 300);
    }
}
