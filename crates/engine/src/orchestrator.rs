//! Orchestrator (C7): drives full-refresh and completion-mode generation,
//! transactional replacement, and the two mutation operations.
//!
//! `Orchestrator` itself holds only cheaply-cloneable collaborators
//! (repository, adapters, embedding service) and is `Clone`; all per-run
//! state (profile, genre counters, the streaming-availability cache) is
//! local to one `generate`/`generate_streaming`/`complete_streaming` call
//! and is dropped when that call returns, so concurrent generations for
//! different users never share mutable state.

use std::collections::{HashMap, HashSet};

use async_stream::stream;
use catalog::{BookAdapter, ScreenContentAdapter, BoundedCache, STREAMING_CACHE_CAPACITY};
use chrono::{Datelike, Duration, Utc};
use embedding::EmbeddingService;
use media_store::{
    Media, MediaType, NewRecommendation, Recommendation, RecommendationFilter, RecommendationId, Repository, UserId,
    FALLBACK_GENRE,
};
use scoring::ScoringWeights;
use tokio_stream::Stream;
use tracing::{debug, info, instrument, warn};

use crate::config::{DISMISSED_GC_WINDOW_DAYS, PER_GENRE_CAP, STALENESS_THRESHOLD_COUNT, STALENESS_WINDOW_HOURS};
use crate::error::Result;
use crate::pipelines::{BookPipeline, BookRun, ScreenContentPipeline, ScreenContentRun, ShortVideoPipeline, ShortVideoRun};
use crate::profile::{ProfileBuilder, UserTasteProfile};
use crate::progress::{ProgressEvent, Step};

/// What completion mode already knows about one media type before a
/// pipeline runs, derived from the caller's existing non-dismissed,
/// non-added recommendations.
struct CompletionState {
    genre_counts: HashMap<String, usize>,
    external_ids_i64: HashSet<i64>,
    external_ids_string: HashSet<String>,
    needs_completion: bool,
}

fn completion_state_for(existing: &[Recommendation], media_type: MediaType) -> CompletionState {
    let items: Vec<&Recommendation> = existing.iter().filter(|r| r.media_type == media_type).collect();

    let mut genre_counts: HashMap<String, usize> = HashMap::new();
    for r in &items {
        let key = r.genre_name.clone().unwrap_or_else(|| FALLBACK_GENRE.to_string());
        *genre_counts.entry(key).or_insert(0) += 1;
    }

    let needs_completion = items.is_empty() || genre_counts.values().any(|&count| count < PER_GENRE_CAP);
    let external_ids_i64 = items.iter().filter_map(|r| r.external_id.parse().ok()).collect();
    let external_ids_string = items.iter().map(|r| r.external_id.clone()).collect();

    CompletionState {
        genre_counts,
        external_ids_i64,
        external_ids_string,
        needs_completion,
    }
}

fn stamp_user_id(mut recs: Vec<NewRecommendation>, user_id: UserId) -> Vec<NewRecommendation> {
    for rec in &mut recs {
        rec.user_id = user_id;
    }
    recs
}

fn current_year() -> u16 {
    Utc::now().year() as u16
}

/// Coordinates the four per-type pipelines against one repository and one
/// pair of catalog adapters.
pub struct Orchestrator<R, S, B> {
    repo: R,
    screen_adapter: S,
    book_adapter: B,
    embedding: EmbeddingService,
    weights: ScoringWeights,
}

impl<R, S, B> Clone for Orchestrator<R, S, B>
where
    R: Clone,
    S: Clone,
    B: Clone,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            screen_adapter: self.screen_adapter.clone(),
            book_adapter: self.book_adapter.clone(),
            embedding: self.embedding.clone(),
            weights: self.weights,
        }
    }
}

impl<R, S, B> Orchestrator<R, S, B>
where
    R: Repository + Clone + 'static,
    S: ScreenContentAdapter + Clone + 'static,
    B: BookAdapter + Clone + 'static,
{
    pub fn new(repo: R, screen_adapter: S, book_adapter: B, embedding: EmbeddingService) -> Self {
        Self {
            repo,
            screen_adapter,
            book_adapter,
            embedding,
            weights: ScoringWeights::default(),
        }
    }

    /// Full refresh: if not forced and the user has more than
    /// [`STALENESS_THRESHOLD_COUNT`] non-dismissed recommendations generated
    /// within [`STALENESS_WINDOW_HOURS`], returns the existing set unchanged.
    /// Otherwise runs all four pipelines and transactionally replaces the
    /// stored recommendations, unless every pipeline came back empty.
    #[instrument(skip(self))]
    pub async fn generate(&self, user_id: UserId, force_refresh: bool) -> Result<Vec<Recommendation>> {
        if !force_refresh {
            if let Some(existing) = self.existing_if_fresh(user_id)? {
                info!(user_id, "existing recommendations are still fresh, skipping generation");
                return Ok(existing);
            }
        }

        let profile = self.build_profile(user_id).await?;
        let rated = self.repo.rated_media(user_id)?;

        let mut new_recs = Vec::new();
        new_recs.extend(
            self.run_screen_pipeline(user_id, MediaType::Film, &rated, &profile, HashMap::new(), &HashSet::new())
                .await,
        );
        new_recs.extend(
            self.run_screen_pipeline(user_id, MediaType::Series, &rated, &profile, HashMap::new(), &HashSet::new())
                .await,
        );
        new_recs.extend(self.run_book_pipeline(user_id, &rated, HashMap::new(), &HashSet::new()).await);
        new_recs.extend(self.run_short_video_pipeline(user_id, &HashSet::new()).await);

        if new_recs.is_empty() {
            warn!(user_id, "every pipeline produced nothing; leaving stored recommendations untouched");
            let filter = RecommendationFilter {
                dismissed: Some(false),
                ..Default::default()
            };
            return Ok(self.repo.recommendations(user_id, &filter)?);
        }

        self.commit_replacement(user_id, new_recs).await
    }

    /// Same pipeline as [`Self::generate`], yielding a lazy, finite sequence
    /// of progress events at fixed milestones instead of returning only the
    /// final result. Dropping the stream before it's exhausted cancels the
    /// run at its next suspension point; nothing is persisted in that case
    /// since the repository commit is the last step.
    pub fn generate_streaming(&self, user_id: UserId) -> impl Stream<Item = ProgressEvent> {
        let this = self.clone();
        stream! {
            yield ProgressEvent::new(5, "building taste profile", Step::Profile, 0);
            let profile = match this.build_profile(user_id).await {
                Ok(profile) => profile,
                Err(err) => {
                    yield error_event(&err);
                    return;
                }
            };
            let rated = match this.repo.rated_media(user_id) {
                Ok(rated) => rated,
                Err(err) => {
                    yield ProgressEvent::new(100, format!("generation failed: {err}"), Step::Error, 0);
                    return;
                }
            };
            yield ProgressEvent::new(10, "profile ready", Step::Profile, 0);

            let mut new_recs = Vec::new();

            yield ProgressEvent::new(15, "finding films", Step::Films, new_recs.len());
            new_recs.extend(
                this.run_screen_pipeline(user_id, MediaType::Film, &rated, &profile, HashMap::new(), &HashSet::new())
                    .await,
            );
            yield ProgressEvent::new(35, "films ready", Step::Films, new_recs.len());

            yield ProgressEvent::new(40, "finding series", Step::Series, new_recs.len());
            new_recs.extend(
                this.run_screen_pipeline(user_id, MediaType::Series, &rated, &profile, HashMap::new(), &HashSet::new())
                    .await,
            );
            yield ProgressEvent::new(55, "series ready", Step::Series, new_recs.len());

            yield ProgressEvent::new(60, "finding books", Step::Books, new_recs.len());
            new_recs.extend(this.run_book_pipeline(user_id, &rated, HashMap::new(), &HashSet::new()).await);
            yield ProgressEvent::new(80, "books ready", Step::Books, new_recs.len());

            yield ProgressEvent::new(82, "finding short videos", Step::Youtube, new_recs.len());
            new_recs.extend(this.run_short_video_pipeline(user_id, &HashSet::new()).await);
            yield ProgressEvent::new(90, "short videos ready", Step::Youtube, new_recs.len());

            if new_recs.is_empty() {
                yield ProgressEvent::new(100, "no new recommendations found", Step::Done, 0);
                return;
            }

            yield ProgressEvent::new(92, "saving recommendations", Step::Saving, new_recs.len());
            match this.commit_replacement(user_id, new_recs).await {
                Ok(inserted) => yield ProgressEvent::new(100, "done", Step::Done, inserted.len()),
                Err(err) => yield error_event(&err),
            }
        }
    }

    /// Completion mode: tops up existing recommendations rather than
    /// replacing them. Loads the user's existing non-dismissed, non-added
    /// recommendations, determines which media types still have a genre
    /// below the per-genre cap (or none at all), and only runs the
    /// pipelines that need it. Existing recommendations are never deleted;
    /// only dismissed ones older than [`DISMISSED_GC_WINDOW_DAYS`] are.
    pub fn complete_streaming(&self, user_id: UserId) -> impl Stream<Item = ProgressEvent> {
        let this = self.clone();
        stream! {
            let filter = RecommendationFilter {
                dismissed: Some(false),
                added_to_library: Some(false),
                ..Default::default()
            };
            let existing = match this.repo.recommendations(user_id, &filter) {
                Ok(existing) => existing,
                Err(err) => {
                    yield ProgressEvent::new(100, format!("generation failed: {err}"), Step::Error, 0);
                    return;
                }
            };
            let total_existing = existing.len();

            let film_state = completion_state_for(&existing, MediaType::Film);
            let series_state = completion_state_for(&existing, MediaType::Series);
            let book_state = completion_state_for(&existing, MediaType::Book);
            let video_state = completion_state_for(&existing, MediaType::ShortVideo);

            if !film_state.needs_completion
                && !series_state.needs_completion
                && !book_state.needs_completion
                && !video_state.needs_completion
            {
                yield ProgressEvent::new(100, "already complete", Step::Done, total_existing);
                return;
            }

            yield ProgressEvent::new(5, "building taste profile", Step::Profile, total_existing);
            let profile = match this.build_profile(user_id).await {
                Ok(profile) => profile,
                Err(err) => {
                    yield error_event(&err);
                    return;
                }
            };
            let rated = match this.repo.rated_media(user_id) {
                Ok(rated) => rated,
                Err(err) => {
                    yield ProgressEvent::new(100, format!("generation failed: {err}"), Step::Error, 0);
                    return;
                }
            };
            yield ProgressEvent::new(10, "profile ready", Step::Profile, total_existing);

            let mut new_recs = Vec::new();

            yield ProgressEvent::new(15, "finding films", Step::Films, total_existing + new_recs.len());
            if film_state.needs_completion {
                new_recs.extend(
                    this.run_screen_pipeline(
                        user_id,
                        MediaType::Film,
                        &rated,
                        &profile,
                        film_state.genre_counts,
                        &film_state.external_ids_i64,
                    )
                    .await,
                );
            }
            yield ProgressEvent::new(35, "films ready", Step::Films, total_existing + new_recs.len());

            yield ProgressEvent::new(40, "finding series", Step::Series, total_existing + new_recs.len());
            if series_state.needs_completion {
                new_recs.extend(
                    this.run_screen_pipeline(
                        user_id,
                        MediaType::Series,
                        &rated,
                        &profile,
                        series_state.genre_counts,
                        &series_state.external_ids_i64,
                    )
                    .await,
                );
            }
            yield ProgressEvent::new(55, "series ready", Step::Series, total_existing + new_recs.len());

            yield ProgressEvent::new(60, "finding books", Step::Books, total_existing + new_recs.len());
            if book_state.needs_completion {
                new_recs.extend(
                    this.run_book_pipeline(user_id, &rated, book_state.genre_counts, &book_state.external_ids_string)
                        .await,
                );
            }
            yield ProgressEvent::new(80, "books ready", Step::Books, total_existing + new_recs.len());

            yield ProgressEvent::new(82, "finding short videos", Step::Youtube, total_existing + new_recs.len());
            if video_state.needs_completion {
                new_recs.extend(this.run_short_video_pipeline(user_id, &video_state.external_ids_string).await);
            }
            yield ProgressEvent::new(90, "short videos ready", Step::Youtube, total_existing + new_recs.len());

            if new_recs.is_empty() {
                yield ProgressEvent::new(100, "done", Step::Done, total_existing);
                return;
            }

            yield ProgressEvent::new(92, "saving recommendations", Step::Saving, total_existing + new_recs.len());
            match this.commit_completion(user_id, new_recs).await {
                Ok(inserted) => yield ProgressEvent::new(100, "done", Step::Done, total_existing + inserted.len()),
                Err(err) => yield error_event(&err),
            }
        }
    }

    /// Marks a stored recommendation dismissed. Idempotent: succeeds
    /// silently if no row matches.
    pub fn dismiss(&self, user_id: UserId, recommendation_id: RecommendationId) -> Result<()> {
        self.repo.dismiss(user_id, recommendation_id)?;
        Ok(())
    }

    /// Marks a stored recommendation as added to the user's library.
    /// Idempotent: succeeds silently if no row matches.
    pub fn mark_added(&self, user_id: UserId, external_id: &str, media_type: MediaType) -> Result<()> {
        self.repo.mark_added_to_library(user_id, external_id, media_type)?;
        Ok(())
    }

    fn existing_if_fresh(&self, user_id: UserId) -> Result<Option<Vec<Recommendation>>> {
        let cutoff = Utc::now() - Duration::hours(STALENESS_WINDOW_HOURS);
        let recent_filter = RecommendationFilter {
            dismissed: Some(false),
            generated_after: Some(cutoff),
            ..Default::default()
        };
        let recent = self.repo.recommendations(user_id, &recent_filter)?;
        if recent.len() <= STALENESS_THRESHOLD_COUNT {
            return Ok(None);
        }
        let all_filter = RecommendationFilter {
            dismissed: Some(false),
            ..Default::default()
        };
        Ok(Some(self.repo.recommendations(user_id, &all_filter)?))
    }

    async fn build_profile(&self, user_id: UserId) -> Result<UserTasteProfile> {
        let builder = ProfileBuilder::new(self.repo.clone(), self.embedding.clone());
        Ok(builder.build(user_id).await?)
    }

    fn dismissed_external_ids(&self, user_id: UserId, media_type: MediaType) -> HashSet<String> {
        let filter = RecommendationFilter {
            media_type: Some(media_type),
            dismissed: Some(true),
            ..Default::default()
        };
        match self.repo.recommendations(user_id, &filter) {
            Ok(recs) => recs.into_iter().map(|r| r.external_id).collect(),
            Err(err) => {
                warn!(user_id, ?media_type, error = %err, "failed to load dismissed ids, proceeding without them");
                HashSet::new()
            }
        }
    }

    async fn run_screen_pipeline(
        &self,
        user_id: UserId,
        media_type: MediaType,
        rated: &[Media],
        profile: &UserTasteProfile,
        existing_genre_counts: HashMap<String, usize>,
        existing_ids: &HashSet<i64>,
    ) -> Vec<NewRecommendation> {
        let mut excluded: HashSet<i64> = existing_ids.clone();
        excluded.extend(
            self.dismissed_external_ids(user_id, media_type)
                .into_iter()
                .filter_map(|id| id.parse().ok()),
        );
        excluded.extend(
            rated
                .iter()
                .filter(|m| m.media_type == media_type)
                .filter_map(|m| m.external_id.parse::<i64>().ok()),
        );

        let type_rated: Vec<Media> = rated.iter().filter(|m| m.media_type == media_type).cloned().collect();
        let pipeline = ScreenContentPipeline::new(self.screen_adapter.clone(), media_type);
        let run = ScreenContentRun {
            rated_media: &type_rated,
            excluded_ids: &excluded,
            existing_genre_counts,
            current_year: current_year(),
        };
        let mut cache = BoundedCache::new(STREAMING_CACHE_CAPACITY);
        let recs = pipeline.run(run, profile, &self.weights, &self.embedding, &mut cache).await;
        stamp_user_id(recs, user_id)
    }

    async fn run_book_pipeline(
        &self,
        user_id: UserId,
        rated: &[Media],
        existing_genre_counts: HashMap<String, usize>,
        existing_ids: &HashSet<String>,
    ) -> Vec<NewRecommendation> {
        let mut excluded = existing_ids.clone();
        excluded.extend(self.dismissed_external_ids(user_id, MediaType::Book));

        let rated_books: Vec<Media> = rated.iter().filter(|m| m.media_type == MediaType::Book).cloned().collect();
        let owned_titles: Vec<String> = match self.repo.library_media(user_id, MediaType::Book) {
            Ok(items) => items.into_iter().map(|m| m.title).collect(),
            Err(err) => {
                warn!(user_id, error = %err, "failed to load owned books, proceeding without the dedupe list");
                Vec::new()
            }
        };

        let pipeline = BookPipeline::new(self.book_adapter.clone());
        let run = BookRun {
            rated_books: &rated_books,
            owned_titles: &owned_titles,
            excluded_ids: &excluded,
            existing_genre_counts,
        };
        stamp_user_id(pipeline.run(run).await, user_id)
    }

    async fn run_short_video_pipeline(&self, user_id: UserId, existing_ids: &HashSet<String>) -> Vec<NewRecommendation> {
        let library = match self.repo.library_media(user_id, MediaType::ShortVideo) {
            Ok(items) => items,
            Err(err) => {
                warn!(user_id, error = %err, "failed to load short-video library");
                return Vec::new();
            }
        };
        let mut excluded = existing_ids.clone();
        excluded.extend(self.dismissed_external_ids(user_id, MediaType::ShortVideo));

        let pipeline = ShortVideoPipeline;
        pipeline.run(ShortVideoRun {
            library: &library,
            excluded_ids: &excluded,
        })
    }

    async fn commit_replacement(&self, user_id: UserId, new_recs: Vec<NewRecommendation>) -> Result<Vec<Recommendation>> {
        let mut tx = self.repo.begin();
        let gc_cutoff = Utc::now() - Duration::days(DISMISSED_GC_WINDOW_DAYS);
        let gc_count = tx.delete_dismissed_older_than(user_id, gc_cutoff)?;
        tx.delete_non_dismissed(user_id)?;
        let inserted = tx.insert_all(new_recs, Utc::now())?;
        tx.commit()?;
        debug!(user_id, gc_count, inserted = inserted.len(), "committed full-refresh replacement");
        Ok(inserted)
    }

    async fn commit_completion(&self, user_id: UserId, new_recs: Vec<NewRecommendation>) -> Result<Vec<Recommendation>> {
        let mut tx = self.repo.begin();
        let gc_cutoff = Utc::now() - Duration::days(DISMISSED_GC_WINDOW_DAYS);
        let gc_count = tx.delete_dismissed_older_than(user_id, gc_cutoff)?;
        let inserted = tx.insert_all(new_recs, Utc::now())?;
        tx.commit()?;
        debug!(user_id, gc_count, inserted = inserted.len(), "committed completion-mode insert");
        Ok(inserted)
    }
}

fn error_event(err: &crate::error::EngineError) -> ProgressEvent {
    ProgressEvent::new(100, format!("generation failed: {err}"), Step::Error, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{InMemoryBookAdapter, InMemoryScreenContentAdapter};
    use media_store::{InMemoryRepository, RecommendationSource};
    use tokio_stream::StreamExt;

    type TestOrchestrator = Orchestrator<InMemoryRepository, InMemoryScreenContentAdapter, InMemoryBookAdapter>;

    fn orchestrator() -> TestOrchestrator {
        Orchestrator::new(
            InMemoryRepository::new(),
            InMemoryScreenContentAdapter::new(vec![]),
            InMemoryBookAdapter::new(vec![]),
            EmbeddingService::new(),
        )
    }

    #[tokio::test]
    async fn generate_with_no_signal_leaves_recommendations_empty_but_succeeds() {
        let orchestrator = orchestrator();
        let recs = orchestrator.generate(1, true).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn generate_streaming_ends_with_a_done_event_when_nothing_is_found() {
        let orchestrator = orchestrator();
        let events: Vec<ProgressEvent> = orchestrator.generate_streaming(1).collect().await;
        let last = events.last().unwrap();
        assert_eq!(last.progress, 100);
        assert_eq!(last.step, Step::Done);
    }

    #[tokio::test]
    async fn dismiss_is_idempotent_for_an_unknown_recommendation() {
        let orchestrator = orchestrator();
        orchestrator.dismiss(1, 999).unwrap();
        orchestrator.dismiss(1, 999).unwrap();
    }

    #[tokio::test]
    async fn complete_streaming_short_circuits_when_nothing_needs_completion() {
        let repo = InMemoryRepository::new();
        let mut tx = repo.begin();
        let recs: Vec<NewRecommendation> = (0..PER_GENRE_CAP)
            .map(|i| NewRecommendation {
                user_id: 1,
                media_type: MediaType::Film,
                external_id: i.to_string(),
                title: format!("Film {i}"),
                year: None,
                cover_url: None,
                description: None,
                score: 0.8,
                source: RecommendationSource::Similar,
                genre_name: Some("Drama".to_string()),
                catalog_rating: None,
                is_streamable: false,
                streaming_providers: None,
                external_url: None,
            })
            .collect();
        tx.insert_all(recs, Utc::now()).unwrap();
        tx.commit().unwrap();

        let orchestrator = Orchestrator::new(
            repo,
            InMemoryScreenContentAdapter::new(vec![]),
            InMemoryBookAdapter::new(vec![]),
            EmbeddingService::new(),
        );

        // Every other media type has zero recommendations, so completion is
        // still needed overall; this just checks the short-circuit branch
        // doesn't fire prematurely for a type that's already full.
        let events: Vec<ProgressEvent> = orchestrator.complete_streaming(1).collect().await;
        assert_eq!(events.last().unwrap().step, Step::Done);
    }

    #[tokio::test]
    async fn mark_added_is_idempotent_for_an_unknown_external_id() {
        let orchestrator = orchestrator();
        orchestrator.mark_added(1, "nonexistent", MediaType::Film).unwrap();
        orchestrator.mark_added(1, "nonexistent", MediaType::ShortVideo).unwrap();
    }

}
