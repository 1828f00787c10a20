//! Filter to drop malformed candidates.
//!
//! There's no point scoring a candidate that's missing the fields a stored
//! recommendation requires — this is the first filter in the pipeline.

use crate::traits::{Filter, FilterContext};
use catalog::ScreenContentCandidate;

/// Removes candidates missing an id or title.
pub struct InvariantFilter;

impl Filter for InvariantFilter {
    fn name(&self) -> &str {
        "InvariantFilter"
    }

    fn apply(&self, candidates: Vec<ScreenContentCandidate>, _context: &FilterContext) -> Vec<ScreenContentCandidate> {
        candidates
            .into_iter()
            .filter(|c| c.id != 0 && !c.title.trim().is_empty())
            .collect()
    }
}
