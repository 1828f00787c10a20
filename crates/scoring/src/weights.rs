//! Tunable weights for the additive candidate scorer.
//!
//! One field per named contribution in the scoring formula; grouping them
//! here (rather than scattering magic numbers through `scorer.rs`) is what
//! makes `CandidateScorer` unit-testable against the documented formula
//! without re-deriving constants in every test.

/// Weights and thresholds for [`crate::scorer::CandidateScorer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub source_base_similar: f32,
    pub source_base_preferred_genre: f32,
    pub source_base_genre_discover: f32,
    pub source_base_default: f32,

    pub seed_bonus_per_star: f32,

    pub catalog_rating_weight: f32,

    pub vote_count_weight: f32,
    pub vote_count_log_divisor: f32,

    pub popularity_weight: f32,
    pub popularity_divisor: f32,

    pub genre_preference_weight: f32,

    pub recency_bonus_lt_1y: f32,
    pub recency_bonus_1_to_10y: f32,
    pub recency_bonus_11_to_20y: f32,

    pub semantic_similarity_weight: f32,
    pub semantic_similarity_threshold: f32,

    pub dismissed_threshold_high: f32,
    pub dismissed_threshold_mid: f32,
    pub dismissed_threshold_low: f32,
    pub dismissed_penalty_high: f32,
    pub dismissed_penalty_mid: f32,
    pub dismissed_penalty_low: f32,

    pub streaming_boost: f32,

    pub score_floor: f32,
    pub score_ceiling: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            source_base_similar: 0.40,
            source_base_preferred_genre: 0.35,
            source_base_genre_discover: 0.25,
            source_base_default: 0.20,

            seed_bonus_per_star: 0.05,

            catalog_rating_weight: 0.20,

            vote_count_weight: 0.08,
            vote_count_log_divisor: 5.0,

            popularity_weight: 0.08,
            popularity_divisor: 500.0,

            genre_preference_weight: 0.15,

            recency_bonus_lt_1y: 0.02,
            recency_bonus_1_to_10y: 0.05,
            recency_bonus_11_to_20y: 0.03,

            semantic_similarity_weight: 0.12,
            semantic_similarity_threshold: 0.3,

            dismissed_threshold_high: 0.75,
            dismissed_threshold_mid: 0.60,
            dismissed_threshold_low: 0.50,
            dismissed_penalty_high: 0.25,
            dismissed_penalty_mid: 0.15,
            dismissed_penalty_low: 0.08,

            streaming_boost: 0.05,

            score_floor: 0.05,
            score_ceiling: 0.98,
        }
    }
}
