//! Additive multi-signal candidate scorer (C5).
//!
//! Mirrors the weighted-additive-scorer-with-per-signal-helpers shape: one
//! private method per named contribution in [`crate::weights::ScoringWeights`],
//! summed and clamped by `score_one`, with `score_all` handling the batch
//! embedding lookup, sort, and title-deduplication around it.

use std::collections::{HashMap, HashSet};

use catalog::ScreenContentCandidate;
use embedding::EmbeddingService;
use rayon::prelude::*;

use crate::weights::ScoringWeights;

/// Which phase of the screen-content pipeline produced a candidate, tagged
/// so the scorer can look up its source-base contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringSource {
    Similar,
    PreferredGenre,
    GenreDiscover,
}

/// A raw candidate plus the context the scorer needs that isn't on the
/// catalog record itself.
#[derive(Debug, Clone)]
pub struct CandidateInput {
    pub candidate: ScreenContentCandidate,
    pub source: ScoringSource,
    pub genre_name: Option<String>,
    /// The rating (1..=5) of the seed title this was found similar to, only
    /// meaningful when `source == Similar`.
    pub seed_rating: Option<u8>,
}

/// A candidate with its final additive score, ready for admission.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: ScreenContentCandidate,
    pub source: ScoringSource,
    pub genre_name: Option<String>,
    pub score: f32,
}

/// Scores a batch of candidates against one user's taste profile.
///
/// Owns the per-run taste state (genre-score map, profile embedding,
/// dismissed embeddings) a caller built once per generation — see the
/// user-profile builder in the `engine` crate.
pub struct CandidateScorer {
    weights: ScoringWeights,
    genre_scores: HashMap<String, f32>,
    profile_embedding: Option<Vec<f32>>,
    dismissed_embeddings: Vec<Vec<f32>>,
    embedding: EmbeddingService,
}

impl CandidateScorer {
    pub fn new(
        weights: ScoringWeights,
        genre_scores: HashMap<String, f32>,
        profile_embedding: Option<Vec<f32>>,
        dismissed_embeddings: Vec<Vec<f32>>,
        embedding: EmbeddingService,
    ) -> Self {
        Self {
            weights,
            genre_scores,
            profile_embedding,
            dismissed_embeddings,
            embedding,
        }
    }

    /// Score every candidate, sort descending by score, then drop later
    /// occurrences of a normalized (lowercase, trimmed) title.
    pub async fn score_all(&self, candidates: Vec<CandidateInput>, current_year: u16) -> Vec<ScoredCandidate> {
        let overview_texts: Vec<(usize, String)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, input)| {
                input
                    .candidate
                    .overview
                    .as_ref()
                    .filter(|o| !o.trim().is_empty())
                    .map(|o| (i, o.clone()))
            })
            .collect();

        let mut embeddings_by_index: HashMap<usize, Vec<f32>> = HashMap::new();
        if !overview_texts.is_empty() {
            let texts: Vec<String> = overview_texts.iter().map(|(_, t)| t.clone()).collect();
            let vectors = self.embedding.encode_batch_async(texts).await;
            for ((index, _), vector) in overview_texts.into_iter().zip(vectors) {
                embeddings_by_index.insert(index, vector);
            }
        }

        // CPU-bound per-candidate scoring (dot products, log/sqrt arithmetic)
        // is embarrassingly parallel once the batch embedding lookup above
        // has completed, so it's handed to rayon's work-stealing pool rather
        // than walked sequentially.
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_par_iter()
            .enumerate()
            .map(|(index, input)| {
                let candidate_embedding = embeddings_by_index.get(&index);
                let score = self.score_one(&input, candidate_embedding.map(|v| v.as_slice()), current_year);
                ScoredCandidate {
                    candidate: input.candidate,
                    source: input.source,
                    genre_name: input.genre_name,
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        dedupe_by_normalized_title(scored)
    }

    fn score_one(&self, input: &CandidateInput, embedding: Option<&[f32]>, current_year: u16) -> f32 {
        let candidate = &input.candidate;
        let mut score = self.source_base(input.source);
        score += self.seed_bonus(input.source, input.seed_rating);
        score += self.catalog_rating_bonus(candidate.vote_average);
        score += self.vote_count_bonus(candidate.vote_count);
        score += self.popularity_bonus(candidate.popularity);
        score += self.genre_preference_bonus(input.genre_name.as_deref());
        score += self.recency_bonus(candidate.year, current_year);
        score += self.semantic_similarity_bonus(embedding);
        score += self.dismissed_penalty(embedding);
        score.clamp(self.weights.score_floor, self.weights.score_ceiling)
    }

    fn source_base(&self, source: ScoringSource) -> f32 {
        match source {
            ScoringSource::Similar => self.weights.source_base_similar,
            ScoringSource::PreferredGenre => self.weights.source_base_preferred_genre,
            ScoringSource::GenreDiscover => self.weights.source_base_genre_discover,
        }
    }

    fn seed_bonus(&self, source: ScoringSource, seed_rating: Option<u8>) -> f32 {
        match (source, seed_rating) {
            (ScoringSource::Similar, Some(rating)) => (rating as f32 - 4.0) * self.weights.seed_bonus_per_star,
            _ => 0.0,
        }
    }

    fn catalog_rating_bonus(&self, vote_average: f32) -> f32 {
        ((vote_average - 5.0) / 5.0).max(0.0) * self.weights.catalog_rating_weight
    }

    fn vote_count_bonus(&self, vote_count: u32) -> f32 {
        let reliability = (vote_count.max(1) as f32).log10() / self.weights.vote_count_log_divisor;
        reliability.min(1.0) * self.weights.vote_count_weight
    }

    fn popularity_bonus(&self, popularity: f32) -> f32 {
        (popularity / self.weights.popularity_divisor).min(1.0) * self.weights.popularity_weight
    }

    fn genre_preference_bonus(&self, genre_name: Option<&str>) -> f32 {
        genre_name
            .and_then(|name| self.genre_scores.get(name))
            .map(|genre_score| genre_score * self.weights.genre_preference_weight)
            .unwrap_or(0.0)
    }

    fn recency_bonus(&self, year: Option<u16>, current_year: u16) -> f32 {
        let Some(year) = year else { return 0.0 };
        let age = current_year.saturating_sub(year);
        match age {
            0 => self.weights.recency_bonus_lt_1y,
            1..=10 => self.weights.recency_bonus_1_to_10y,
            11..=20 => self.weights.recency_bonus_11_to_20y,
            _ => 0.0,
        }
    }

    fn semantic_similarity_bonus(&self, embedding: Option<&[f32]>) -> f32 {
        let (Some(profile), Some(candidate_embedding)) = (self.profile_embedding.as_deref(), embedding) else {
            return 0.0;
        };
        let Ok(similarity) = self.embedding.similarity(profile, candidate_embedding) else {
            return 0.0;
        };
        if similarity > self.weights.semantic_similarity_threshold {
            (similarity - self.weights.semantic_similarity_threshold) * self.weights.semantic_similarity_weight
        } else {
            0.0
        }
    }

    fn dismissed_penalty(&self, embedding: Option<&[f32]>) -> f32 {
        let Some(candidate_embedding) = embedding else {
            return 0.0;
        };
        let max_similarity = self
            .dismissed_embeddings
            .iter()
            .filter_map(|dismissed| self.embedding.similarity(dismissed, candidate_embedding).ok())
            .fold(f32::NEG_INFINITY, f32::max);

        if max_similarity > self.weights.dismissed_threshold_high {
            -self.weights.dismissed_penalty_high
        } else if max_similarity >= self.weights.dismissed_threshold_mid {
            -self.weights.dismissed_penalty_mid
        } else if max_similarity >= self.weights.dismissed_threshold_low {
            -self.weights.dismissed_penalty_low
        } else {
            0.0
        }
    }
}

fn dedupe_by_normalized_title(candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut seen_titles: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen_titles.insert(c.candidate.title.trim().to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, title: &str) -> ScreenContentCandidate {
        ScreenContentCandidate {
            id,
            title: title.to_string(),
            year: None,
            overview: None,
            poster_url: None,
            vote_average: 0.0,
            vote_count: 0,
            popularity: 0.0,
            genre_ids: vec![],
        }
    }

    fn scorer(genre_scores: HashMap<String, f32>) -> CandidateScorer {
        CandidateScorer::new(
            ScoringWeights::default(),
            genre_scores,
            None,
            Vec::new(),
            EmbeddingService::new(),
        )
    }

    #[tokio::test]
    async fn scenario_seed_similar_candidate_matches_the_documented_formula() {
        let mut genre_scores = HashMap::new();
        genre_scores.insert("Drama".to_string(), 0.5);
        let scorer = scorer(genre_scores);

        let mut candidate = candidate(1, "Some Drama");
        candidate.vote_average = 8.0;
        candidate.vote_count = 1000;
        candidate.popularity = 200.0;
        candidate.year = Some(2020);

        let input = CandidateInput {
            candidate,
            source: ScoringSource::Similar,
            genre_name: Some("Drama".to_string()),
            seed_rating: Some(5),
        };

        let scored = scorer.score_all(vec![input], 2025).await;
        assert_eq!(scored.len(), 1);
        assert!(
            (scored[0].score - 0.775).abs() < 0.001,
            "expected ~0.775, got {}",
            scored[0].score
        );
    }

    #[tokio::test]
    async fn score_all_sorts_descending_and_clamps_to_the_documented_range() {
        let scorer = scorer(HashMap::new());
        let weak = CandidateInput {
            candidate: candidate(1, "Weak"),
            source: ScoringSource::GenreDiscover,
            genre_name: None,
            seed_rating: None,
        };
        let mut strong_candidate = candidate(2, "Strong");
        strong_candidate.vote_average = 9.5;
        strong_candidate.vote_count = 100_000;
        strong_candidate.popularity = 900.0;
        let strong = CandidateInput {
            candidate: strong_candidate,
            source: ScoringSource::Similar,
            genre_name: None,
            seed_rating: Some(5),
        };

        let scored = scorer.score_all(vec![weak, strong], 2025).await;
        assert_eq!(scored[0].candidate.title, "Strong");
        for candidate in &scored {
            assert!(candidate.score >= 0.05 && candidate.score <= 0.98);
        }
    }

    #[tokio::test]
    async fn score_all_deduplicates_by_normalized_title_keeping_the_higher_scored_one() {
        let scorer = scorer(HashMap::new());
        let mut better = candidate(1, "  Dune  ");
        better.vote_average = 9.0;
        better.vote_count = 5000;
        let mut worse = candidate(2, "dune");
        worse.vote_average = 5.0;

        let inputs = vec![
            CandidateInput {
                candidate: better,
                source: ScoringSource::Similar,
                genre_name: None,
                seed_rating: None,
            },
            CandidateInput {
                candidate: worse,
                source: ScoringSource::GenreDiscover,
                genre_name: None,
                seed_rating: None,
            },
        ];

        let scored = scorer.score_all(inputs, 2025).await;
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].candidate.id, 1);
    }
}
