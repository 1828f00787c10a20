//! Per-genre quota tracking shared by every per-type pipeline (C6).
//!
//! A single [`GenreCounters`] instance tracks how many items have been
//! admitted per genre for one media type during one generation run. In
//! completion mode it is pre-seeded with the caller's existing counts so the
//! pipeline only tops genres up rather than re-filling them from zero.

use std::collections::HashMap;

use media_store::FALLBACK_GENRE;

/// Tracks admitted counts per genre against a shared per-genre cap, and
/// bounds the number of distinct genres a pipeline will ever fill.
#[derive(Debug, Clone)]
pub struct GenreCounters {
    counts: HashMap<String, usize>,
    per_genre_cap: usize,
    max_total_genres: usize,
}

impl GenreCounters {
    pub fn new(per_genre_cap: usize, max_total_genres: usize) -> Self {
        Self {
            counts: HashMap::new(),
            per_genre_cap,
            max_total_genres,
        }
    }

    /// Pre-seed with existing counts, used by completion mode so a genre
    /// already at the cap is skipped entirely.
    pub fn seeded(existing: HashMap<String, usize>, per_genre_cap: usize, max_total_genres: usize) -> Self {
        Self {
            counts: existing,
            per_genre_cap,
            max_total_genres,
        }
    }

    fn key(genre: Option<&str>) -> &str {
        genre.unwrap_or(FALLBACK_GENRE)
    }

    pub fn count(&self, genre: Option<&str>) -> usize {
        self.counts.get(Self::key(genre)).copied().unwrap_or(0)
    }

    pub fn is_full(&self, genre: Option<&str>) -> bool {
        self.count(genre) >= self.per_genre_cap
    }

    pub fn remaining(&self, genre: Option<&str>) -> usize {
        self.per_genre_cap.saturating_sub(self.count(genre))
    }

    /// Whether a genre not yet tracked could still be started without
    /// exceeding the max-total-genres-per-type limit.
    pub fn can_start_new_genre(&self, genre: Option<&str>) -> bool {
        let key = Self::key(genre);
        self.counts.contains_key(key) || self.counts.len() < self.max_total_genres
    }

    /// Whether a candidate in `genre` can be admitted right now: not full,
    /// and not introducing a 13th distinct genre.
    pub fn can_admit(&self, genre: Option<&str>) -> bool {
        !self.is_full(genre) && self.can_start_new_genre(genre)
    }

    pub fn admit(&mut self, genre: Option<&str>) {
        *self.counts.entry(Self::key(genre).to_string()).or_insert(0) += 1;
    }

    /// All genres with at least one admitted item so far, in no particular
    /// order.
    pub fn tracked_genres(&self) -> impl Iterator<Item = String> + '_ {
        self.counts.keys().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_counters_admit_up_to_the_per_genre_cap() {
        let mut counters = GenreCounters::new(5, 12);
        for _ in 0..5 {
            assert!(counters.can_admit(Some("Drama")));
            counters.admit(Some("Drama"));
        }
        assert!(!counters.can_admit(Some("Drama")));
    }

    #[test]
    fn seeded_counters_respect_existing_counts() {
        let mut existing = HashMap::new();
        existing.insert("Drama".to_string(), 5);
        existing.insert("Comedy".to_string(), 2);
        let counters = GenreCounters::seeded(existing, 5, 12);

        assert!(!counters.can_admit(Some("Drama")));
        assert_eq!(counters.remaining(Some("Comedy")), 3);
    }

    #[test]
    fn genreless_candidates_are_tracked_under_the_fallback_label() {
        let mut counters = GenreCounters::new(5, 12);
        counters.admit(None);
        assert_eq!(counters.count(Some(FALLBACK_GENRE)), 1);
    }

    #[test]
    fn max_total_genres_blocks_a_thirteenth_distinct_genre() {
        let mut counters = GenreCounters::new(5, 2);
        counters.admit(Some("Drama"));
        counters.admit(Some("Comedy"));
        assert!(!counters.can_admit(Some("Horror")));
        assert!(counters.can_admit(Some("Drama")));
    }
}
