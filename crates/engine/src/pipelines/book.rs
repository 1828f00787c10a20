//! Book pipeline (C6): discovers candidates against a compile-time curated
//! genre -> query-string table rather than a genre-id discovery endpoint,
//! since book catalogs don't expose one.

use std::collections::{HashMap, HashSet};

use catalog::{book_catalog, BookAdapter, BookCandidate};
use media_store::{Media, MediaType, NewRecommendation, RecommendationSource};
use tracing::{instrument, warn};

use crate::config::{MAX_TOTAL_GENRES, PER_GENRE_CAP};
use crate::pipelines::counters::GenreCounters;

const CURATED_QUERY_LIMIT: usize = 3;
const SECOND_PASS_QUERY_LIMIT: usize = 10;
const PREFERRED_BASE_SCORE: f32 = 0.80;
const NON_PREFERRED_BASE_SCORE: f32 = 0.70;
const COVER_BONUS: f32 = 0.05;
const CURATED_SCORE_CEILING: f32 = 0.95;
const SECOND_PASS_FIXED_SCORE: f32 = 0.65;

pub struct BookRun<'a> {
    pub rated_books: &'a [Media],
    pub owned_titles: &'a [String],
    pub excluded_ids: &'a HashSet<String>,
    pub existing_genre_counts: HashMap<String, usize>,
}

pub struct BookPipeline<A> {
    adapter: A,
}

impl<A: BookAdapter> BookPipeline<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    #[instrument(skip_all)]
    pub async fn run(&self, run: BookRun<'_>) -> Vec<NewRecommendation> {
        let mut seen_ids: HashSet<String> = run.excluded_ids.clone();
        let mut counters = GenreCounters::seeded(run.existing_genre_counts, PER_GENRE_CAP, MAX_TOTAL_GENRES);
        let mut out = Vec::new();

        let ordered_genres = self.ordered_genres(run.rated_books);

        for genre in &ordered_genres {
            let preferred = self.is_preferred(genre, run.rated_books);
            for query in book_catalog::curated_queries(genre) {
                if counters.is_full(Some(genre)) {
                    break;
                }
                let results = match self.adapter.search(query, CURATED_QUERY_LIMIT).await {
                    Ok(results) => results,
                    Err(err) => {
                        warn!(phase = "curated", genre, query, error = %err, "book search failed, treating as empty");
                        continue;
                    }
                };
                if let Some(admitted) = self.admit_first(
                    results,
                    run.owned_titles,
                    &mut seen_ids,
                    genre,
                    preferred,
                ) {
                    counters.admit(Some(genre));
                    out.push(admitted);
                }
            }
        }

        for genre in &ordered_genres {
            if counters.is_full(Some(genre)) {
                continue;
            }
            let query = format!("best {genre} books");
            let results = match self.adapter.search(&query, SECOND_PASS_QUERY_LIMIT).await {
                Ok(results) => results,
                Err(err) => {
                    warn!(phase = "second_pass", genre, error = %err, "book search failed, treating as empty");
                    continue;
                }
            };
            for candidate in results {
                if counters.is_full(Some(genre)) {
                    break;
                }
                let Some(new_rec) = self.try_admit_second_pass(candidate, run.owned_titles, &mut seen_ids, genre) else {
                    continue;
                };
                counters.admit(Some(genre));
                out.push(new_rec);
            }
        }

        out
    }

    /// Preferred genres (case-insensitive substring match, either direction,
    /// against the user's own book genres from titles rated >= 4) first,
    /// then the rest of the curated table, capped at [`MAX_TOTAL_GENRES`].
    fn ordered_genres(&self, rated_books: &[Media]) -> Vec<String> {
        let user_genres: HashSet<String> = rated_books
            .iter()
            .filter(|m| m.rating.unwrap_or(0) >= 4)
            .flat_map(|m| m.genres.iter().cloned())
            .map(|g| g.to_lowercase())
            .collect();

        let all: Vec<String> = book_catalog::curated_genres().map(str::to_string).collect();
        let (mut preferred, mut rest): (Vec<String>, Vec<String>) = all
            .into_iter()
            .partition(|genre| self.genre_matches_user(genre, &user_genres));
        preferred.append(&mut rest);
        preferred.truncate(MAX_TOTAL_GENRES);
        preferred
    }

    fn genre_matches_user(&self, genre: &str, user_genres: &HashSet<String>) -> bool {
        let genre_lower = genre.to_lowercase();
        user_genres
            .iter()
            .any(|ug| genre_lower.contains(ug.as_str()) || ug.contains(genre_lower.as_str()))
    }

    fn is_preferred(&self, genre: &str, rated_books: &[Media]) -> bool {
        let user_genres: HashSet<String> = rated_books
            .iter()
            .filter(|m| m.rating.unwrap_or(0) >= 4)
            .flat_map(|m| m.genres.iter().cloned())
            .map(|g| g.to_lowercase())
            .collect();
        self.genre_matches_user(genre, &user_genres)
    }

    fn admit_first(
        &self,
        results: Vec<BookCandidate>,
        owned_titles: &[String],
        seen_ids: &mut HashSet<String>,
        genre: &str,
        preferred: bool,
    ) -> Option<NewRecommendation> {
        for candidate in results {
            if title_owned(&candidate.title, owned_titles) {
                continue;
            }
            let Some(external_id) = candidate.resolved_external_id() else {
                warn!(title = %candidate.title, "book candidate has no resolvable external id, skipping");
                continue;
            };
            if !seen_ids.insert(external_id.clone()) {
                continue;
            }
            let mut score = if preferred {
                PREFERRED_BASE_SCORE
            } else {
                NON_PREFERRED_BASE_SCORE
            };
            if candidate.cover_url.is_some() {
                score += COVER_BONUS;
            }
            score = score.min(CURATED_SCORE_CEILING);
            let source = if preferred {
                RecommendationSource::Curated
            } else {
                RecommendationSource::Popular
            };
            return Some(to_new_recommendation(candidate, external_id, score, source, genre));
        }
        None
    }

    fn try_admit_second_pass(
        &self,
        candidate: BookCandidate,
        owned_titles: &[String],
        seen_ids: &mut HashSet<String>,
        genre: &str,
    ) -> Option<NewRecommendation> {
        if title_owned(&candidate.title, owned_titles) {
            return None;
        }
        let external_id = candidate.resolved_external_id()?;
        if !seen_ids.insert(external_id.clone()) {
            return None;
        }
        Some(to_new_recommendation(
            candidate,
            external_id,
            SECOND_PASS_FIXED_SCORE,
            RecommendationSource::Popular,
            genre,
        ))
    }
}

fn title_owned(title: &str, owned_titles: &[String]) -> bool {
    let title_lower = title.to_lowercase();
    owned_titles.iter().any(|owned| {
        let owned_lower = owned.to_lowercase();
        title_lower.contains(&owned_lower) || owned_lower.contains(&title_lower)
    })
}

fn to_new_recommendation(
    candidate: BookCandidate,
    external_id: String,
    score: f32,
    source: RecommendationSource,
    genre: &str,
) -> NewRecommendation {
    NewRecommendation {
        user_id: 0,
        media_type: MediaType::Book,
        external_id,
        title: candidate.title,
        year: candidate.year,
        cover_url: candidate.cover_url,
        description: candidate.description,
        score,
        source,
        genre_name: Some(genre.to_string()),
        catalog_rating: None,
        is_streamable: false,
        streaming_providers: None,
        external_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::InMemoryBookAdapter;
    use media_store::MediaStatus;

    fn owned_book(title: &str, genre: &str, rating: u8) -> Media {
        Media {
            user_id: 1,
            title: title.to_string(),
            media_type: MediaType::Book,
            year: None,
            external_id: format!("owned-{title}"),
            description: None,
            status: MediaStatus::Done,
            rating: Some(rating),
            genres: vec![genre.to_string()],
            embedding: None,
            short_video: None,
        }
    }

    fn book(title: &str, cover: bool) -> BookCandidate {
        BookCandidate {
            title: title.to_string(),
            open_library_key: Some(format!("/works/{}", title.replace(' ', "_"))),
            cover_url: cover.then(|| "https://covers/x.jpg".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn preferred_genre_gets_the_curated_source_and_higher_score() {
        let adapter = InMemoryBookAdapter::new(vec![book("Dune Frank Herbert", true)]);
        let pipeline = BookPipeline::new(adapter);

        let rated = vec![owned_book("Old Favorite", "Science Fiction", 5)];
        let run = BookRun {
            rated_books: &rated,
            owned_titles: &["Old Favorite".to_string()],
            excluded_ids: &HashSet::new(),
            existing_genre_counts: HashMap::new(),
        };

        let admitted = pipeline.run(run).await;
        let dune = admitted.iter().find(|r| r.title.contains("Dune")).unwrap();
        assert_eq!(dune.source, RecommendationSource::Curated);
        assert!((dune.score - 0.85).abs() < 1e-4);
    }

    #[tokio::test]
    async fn owned_titles_are_never_recommended_again() {
        let adapter = InMemoryBookAdapter::new(vec![book("Dune Frank Herbert", false)]);
        let pipeline = BookPipeline::new(adapter);

        let rated = vec![owned_book("Dune Frank Herbert", "Science Fiction", 5)];
        let run = BookRun {
            rated_books: &rated,
            owned_titles: &["Dune Frank Herbert".to_string()],
            excluded_ids: &HashSet::new(),
            existing_genre_counts: HashMap::new(),
        };

        let admitted = pipeline.run(run).await;
        assert!(admitted.iter().all(|r| !r.title.contains("Dune")));
    }

    #[tokio::test]
    async fn completion_mode_tops_up_a_partially_filled_genre() {
        let adapter = InMemoryBookAdapter::new(vec![
            book("Foundation Isaac Asimov", false),
            book("Neuromancer William Gibson", false),
        ]);
        let pipeline = BookPipeline::new(adapter);

        let mut existing = HashMap::new();
        existing.insert("Science Fiction".to_string(), 3);
        let run = BookRun {
            rated_books: &[],
            owned_titles: &[],
            excluded_ids: &HashSet::new(),
            existing_genre_counts: existing,
        };

        let admitted = pipeline.run(run).await;
        let sci_fi_count = admitted.iter().filter(|r| r.genre_name.as_deref() == Some("Science Fiction")).count();
        assert!(sci_fi_count <= 2);
    }
}
