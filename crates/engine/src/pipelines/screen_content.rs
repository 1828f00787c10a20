//! Screen-content pipeline (C6): films and series share this state machine,
//! parameterized only by which [`ScreenKind`] catalog they discover against.
//!
//! Four phases run in order, each topping up the shared [`GenreCounters`]:
//! similar-seeded discovery, preferred-genre discovery, a same-threshold
//! fill pass for genres the similar phase only partially seeded, and a
//! relaxed-threshold second pass for preferred genres still short.

use std::collections::{HashMap, HashSet};

use catalog::{
    genres, BoundedCache, DiscoverParams, ScreenContentAdapter, ScreenContentCandidate, ScreenKind, SortBy,
    WatchProviders,
};
use embedding::EmbeddingService;
use media_store::{Media, MediaType, NewRecommendation, RecommendationSource};
use scoring::{
    filters::{AlreadySeenFilter, InvariantFilter},
    CandidateInput, CandidateScorer, FilterContext, FilterPipeline, ScoredCandidate, ScoringSource, ScoringWeights,
};
use tracing::{instrument, warn};

use crate::config::{
    ENRICHMENT_OVERFETCH, MAX_PREFERRED_GENRES, MAX_SEEDS, MAX_TOTAL_GENRES, MIN_RATING_FOR_SEED, PER_GENRE_CAP,
    SIMILAR_PER_SEED, STREAMING_COUNTRY,
};
use crate::pipelines::counters::GenreCounters;
use crate::profile::UserTasteProfile;

const SIMILAR_DISCOVER_VOTE_AVG: f32 = 6.5;
const SIMILAR_DISCOVER_VOTE_COUNT: u32 = 50;
const RELAXED_VOTE_AVG: f32 = 6.0;
const RELAXED_VOTE_COUNT: u32 = 20;
const PARTIAL_FILL_FIXED_SCORE: f32 = 0.65;
const RELAXED_BASE_SCORE: f32 = 0.6;
const RELAXED_GENRE_WEIGHT: f32 = 0.1;
const STREAMING_BOOST: f32 = 0.05;
const SCORE_CEILING: f32 = 0.98;

/// Inputs that vary per call; the adapter, scorer weights, and embedding
/// service are shared collaborators passed separately.
pub struct ScreenContentRun<'a> {
    pub rated_media: &'a [Media],
    pub excluded_ids: &'a HashSet<i64>,
    pub existing_genre_counts: HashMap<String, usize>,
    pub current_year: u16,
}

/// Runs the four-phase screen-content state machine for one media type.
pub struct ScreenContentPipeline<A> {
    adapter: A,
    kind: ScreenKind,
    media_type: MediaType,
}

impl<A: ScreenContentAdapter> ScreenContentPipeline<A> {
    pub fn new(adapter: A, media_type: MediaType) -> Self {
        let kind = match media_type {
            MediaType::Film => ScreenKind::Movie,
            MediaType::Series => ScreenKind::Tv,
            other => panic!("screen-content pipeline does not handle {other:?}"),
        };
        Self {
            adapter,
            kind,
            media_type,
        }
    }

    #[instrument(skip_all, fields(media_type = ?self.media_type))]
    pub async fn run(
        &self,
        run: ScreenContentRun<'_>,
        profile: &UserTasteProfile,
        weights: &ScoringWeights,
        embedding: &EmbeddingService,
        streaming_cache: &mut BoundedCache<(i64, String), WatchProviders>,
    ) -> Vec<NewRecommendation> {
        let mut seen_ids: HashSet<i64> = run.excluded_ids.clone();
        let mut counters =
            GenreCounters::seeded(run.existing_genre_counts, PER_GENRE_CAP, MAX_TOTAL_GENRES);
        let scorer = CandidateScorer::new(
            *weights,
            profile.genre_scores.clone(),
            profile.profile_embedding.clone(),
            profile.dismissed_embeddings.clone(),
            embedding.clone(),
        );
        let filter_pipeline = FilterPipeline::new()
            .add_filter(InvariantFilter)
            .add_filter(AlreadySeenFilter);
        let mut out = Vec::new();

        self.similar_seeded_phase(&run, &scorer, &filter_pipeline, &mut seen_ids, &mut counters, streaming_cache, &mut out)
            .await;

        let preferred_genres = self.preferred_genres(profile);

        self.preferred_genre_phase(
            &preferred_genres,
            &scorer,
            &filter_pipeline,
            &mut seen_ids,
            &mut counters,
            streaming_cache,
            run.current_year,
            &mut out,
        )
        .await;

        self.fill_partials_from_similar_phase(
            &filter_pipeline,
            &mut seen_ids,
            &mut counters,
            streaming_cache,
            &mut out,
        )
        .await;

        self.second_pass_relaxation_phase(
            &preferred_genres,
            &filter_pipeline,
            &mut seen_ids,
            &mut counters,
            streaming_cache,
            &mut out,
        )
        .await;

        out
    }

    /// Top preferred genres (by genre-score) that map to a catalog genre id
    /// for this kind, highest score first, capped at [`MAX_PREFERRED_GENRES`].
    fn preferred_genres(&self, profile: &UserTasteProfile) -> Vec<(String, f32, i32)> {
        let mut scored: Vec<(String, f32, i32)> = profile
            .genre_scores
            .iter()
            .filter_map(|(name, score)| genres::genre_id(self.kind, name).map(|id| (name.clone(), *score, id)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(MAX_PREFERRED_GENRES);
        scored
    }

    async fn similar_seeded_phase(
        &self,
        run: &ScreenContentRun<'_>,
        scorer: &CandidateScorer,
        filter_pipeline: &FilterPipeline,
        seen_ids: &mut HashSet<i64>,
        counters: &mut GenreCounters,
        streaming_cache: &mut BoundedCache<(i64, String), WatchProviders>,
        out: &mut Vec<NewRecommendation>,
    ) {
        let mut seeds: Vec<&Media> = run
            .rated_media
            .iter()
            .filter(|m| m.rating.unwrap_or(0) >= MIN_RATING_FOR_SEED)
            .collect();
        seeds.sort_by(|a, b| b.rating.cmp(&a.rating));
        seeds.truncate(MAX_SEEDS);

        let mut inputs: Vec<CandidateInput> = Vec::new();
        let mut queued_ids: HashSet<i64> = HashSet::new();
        for seed in seeds {
            let Ok(seed_id) = seed.external_id.parse::<i64>() else {
                warn!(external_id = %seed.external_id, "seed media has a non-numeric external id, skipping");
                continue;
            };
            match self.adapter.similar(self.kind, seed_id, SIMILAR_PER_SEED).await {
                Ok(candidates) => {
                    for candidate in candidates {
                        if seen_ids.contains(&candidate.id) || !queued_ids.insert(candidate.id) {
                            continue;
                        }
                        let genre_name = genres::primary_genre_name(self.kind, &candidate.genre_ids).map(str::to_string);
                        inputs.push(CandidateInput {
                            candidate,
                            source: ScoringSource::Similar,
                            genre_name,
                            seed_rating: seed.rating,
                        });
                    }
                }
                Err(err) => {
                    warn!(media_type = ?self.media_type, phase = "similar_seeded", seed_id, error = %err, "similar lookup failed, treating as empty");
                }
            }
        }

        let filtered = filter_pipeline.apply(
            inputs.iter().map(|i| i.candidate.clone()).collect(),
            &FilterContext {
                seen_ids: seen_ids.clone(),
            },
        );
        let allowed_ids: HashSet<i64> = filtered.iter().map(|c| c.id).collect();
        inputs.retain(|i| allowed_ids.contains(&i.candidate.id));

        let scored = scorer.score_all(inputs, run.current_year).await;
        let enriched = self
            .enrich_batch(scored, streaming_cache)
            .await;
        self.admit_ranked(enriched, seen_ids, counters, out, RecommendationSource::Similar);
    }

    async fn preferred_genre_phase(
        &self,
        preferred_genres: &[(String, f32, i32)],
        scorer: &CandidateScorer,
        filter_pipeline: &FilterPipeline,
        seen_ids: &mut HashSet<i64>,
        counters: &mut GenreCounters,
        streaming_cache: &mut BoundedCache<(i64, String), WatchProviders>,
        current_year: u16,
        out: &mut Vec<NewRecommendation>,
    ) {
        for (genre, _score, genre_id) in preferred_genres {
            if counters.is_full(Some(genre)) {
                continue;
            }
            let needed = counters.remaining(Some(genre));
            let params = DiscoverParams {
                with_genres: vec![*genre_id],
                vote_average_gte: SIMILAR_DISCOVER_VOTE_AVG,
                vote_count_gte: SIMILAR_DISCOVER_VOTE_COUNT,
                sort_by: SortBy::VoteAverageDesc,
            };
            let candidates = match self.adapter.discover(self.kind, &params, needed + 5).await {
                Ok(candidates) => candidates,
                Err(err) => {
                    warn!(media_type = ?self.media_type, phase = "preferred_genre", genre, error = %err, "discover failed, treating as empty");
                    Vec::new()
                }
            };

            let filtered = filter_pipeline.apply(
                candidates,
                &FilterContext {
                    seen_ids: seen_ids.clone(),
                },
            );
            let inputs: Vec<CandidateInput> = filtered
                .into_iter()
                .map(|candidate| CandidateInput {
                    candidate,
                    source: ScoringSource::PreferredGenre,
                    genre_name: Some(genre.clone()),
                    seed_rating: None,
                })
                .collect();

            let scored = scorer.score_all(inputs, current_year).await;
            let bounded: Vec<_> = scored.into_iter().take(needed + ENRICHMENT_OVERFETCH).collect();
            let enriched = self.enrich_batch(bounded, streaming_cache).await;
            let top_needed: Vec<_> = enriched.into_iter().take(needed).collect();
            self.admit_ranked(top_needed, seen_ids, counters, out, RecommendationSource::GenreDiscover);
        }
    }

    async fn fill_partials_from_similar_phase(
        &self,
        filter_pipeline: &FilterPipeline,
        seen_ids: &mut HashSet<i64>,
        counters: &mut GenreCounters,
        streaming_cache: &mut BoundedCache<(i64, String), WatchProviders>,
        out: &mut Vec<NewRecommendation>,
    ) {
        let partial_genres: Vec<String> = counters
            .tracked_genres()
            .filter(|g| {
                let count = counters.count(Some(g));
                count > 0 && count < PER_GENRE_CAP
            })
            .collect();

        for genre in partial_genres {
            if counters.is_full(Some(&genre)) {
                continue;
            }
            let Some(genre_id) = genres::genre_id(self.kind, &genre) else {
                continue;
            };
            let needed = counters.remaining(Some(&genre));
            let params = DiscoverParams {
                with_genres: vec![genre_id],
                vote_average_gte: SIMILAR_DISCOVER_VOTE_AVG,
                vote_count_gte: SIMILAR_DISCOVER_VOTE_COUNT,
                sort_by: SortBy::VoteAverageDesc,
            };
            let candidates = match self
                .adapter
                .discover(self.kind, &params, needed + ENRICHMENT_OVERFETCH)
                .await
            {
                Ok(candidates) => candidates,
                Err(err) => {
                    warn!(media_type = ?self.media_type, phase = "fill_partials", genre, error = %err, "discover failed, treating as empty");
                    Vec::new()
                }
            };
            let filtered = filter_pipeline.apply(
                candidates,
                &FilterContext {
                    seen_ids: seen_ids.clone(),
                },
            );

            for candidate in filtered.into_iter().take(needed) {
                if !counters.can_admit(Some(&genre)) {
                    break;
                }
                let providers = self.watch_providers(candidate.id, streaming_cache).await;
                let score = apply_streaming_boost(PARTIAL_FILL_FIXED_SCORE, providers.is_streamable());
                seen_ids.insert(candidate.id);
                counters.admit(Some(&genre));
                out.push(to_new_recommendation(
                    candidate,
                    self.media_type,
                    score,
                    RecommendationSource::GenreDiscover,
                    Some(genre.clone()),
                    providers,
                ));
            }
        }
    }

    async fn second_pass_relaxation_phase(
        &self,
        preferred_genres: &[(String, f32, i32)],
        filter_pipeline: &FilterPipeline,
        seen_ids: &mut HashSet<i64>,
        counters: &mut GenreCounters,
        streaming_cache: &mut BoundedCache<(i64, String), WatchProviders>,
        out: &mut Vec<NewRecommendation>,
    ) {
        for (genre, genre_score, genre_id) in preferred_genres {
            if counters.is_full(Some(genre)) {
                continue;
            }
            let needed = counters.remaining(Some(genre));
            let params = DiscoverParams {
                with_genres: vec![*genre_id],
                vote_average_gte: RELAXED_VOTE_AVG,
                vote_count_gte: RELAXED_VOTE_COUNT,
                sort_by: SortBy::PopularityDesc,
            };
            let candidates = match self
                .adapter
                .discover(self.kind, &params, needed + ENRICHMENT_OVERFETCH)
                .await
            {
                Ok(candidates) => candidates,
                Err(err) => {
                    warn!(media_type = ?self.media_type, phase = "second_pass", genre, error = %err, "discover failed, treating as empty");
                    Vec::new()
                }
            };
            let filtered = filter_pipeline.apply(
                candidates,
                &FilterContext {
                    seen_ids: seen_ids.clone(),
                },
            );

            for candidate in filtered.into_iter().take(needed) {
                if !counters.can_admit(Some(genre)) {
                    break;
                }
                let providers = self.watch_providers(candidate.id, streaming_cache).await;
                let base = RELAXED_BASE_SCORE + RELAXED_GENRE_WEIGHT * genre_score;
                let score = apply_streaming_boost(base, providers.is_streamable());
                seen_ids.insert(candidate.id);
                counters.admit(Some(genre));
                out.push(to_new_recommendation(
                    candidate,
                    self.media_type,
                    score,
                    RecommendationSource::GenreDiscover,
                    Some(genre.clone()),
                    providers,
                ));
            }
        }
    }

    /// Batch streaming-availability enrichment: looks up every candidate,
    /// applies the post-scoring boost, then re-sorts descending since the
    /// boost can change relative order.
    async fn enrich_batch(
        &self,
        scored: Vec<ScoredCandidate>,
        streaming_cache: &mut BoundedCache<(i64, String), WatchProviders>,
    ) -> Vec<(ScreenContentCandidate, f32, Option<String>, WatchProviders)> {
        let mut enriched = Vec::with_capacity(scored.len());
        for candidate in scored {
            let providers = self.watch_providers(candidate.candidate.id, streaming_cache).await;
            let score = apply_streaming_boost(candidate.score, providers.is_streamable());
            enriched.push((candidate.candidate, score, candidate.genre_name, providers));
        }
        enriched.sort_by(|a, b| b.1.total_cmp(&a.1));
        enriched
    }

    async fn watch_providers(
        &self,
        id: i64,
        streaming_cache: &mut BoundedCache<(i64, String), WatchProviders>,
    ) -> WatchProviders {
        let key = (id, STREAMING_COUNTRY.to_string());
        if let Some(cached) = streaming_cache.get(&key) {
            return cached;
        }
        match self.adapter.watch_providers(id, self.kind, STREAMING_COUNTRY).await {
            Ok(providers) => {
                streaming_cache.put(key, providers.clone());
                providers
            }
            Err(err) => {
                warn!(media_type = ?self.media_type, id, error = %err, "watch_providers lookup failed, assuming unavailable");
                WatchProviders::default()
            }
        }
    }

    fn admit_ranked(
        &self,
        enriched: Vec<(ScreenContentCandidate, f32, Option<String>, WatchProviders)>,
        seen_ids: &mut HashSet<i64>,
        counters: &mut GenreCounters,
        out: &mut Vec<NewRecommendation>,
        source: RecommendationSource,
    ) {
        for (candidate, score, genre_name, providers) in enriched {
            if seen_ids.contains(&candidate.id) || !counters.can_admit(genre_name.as_deref()) {
                continue;
            }
            seen_ids.insert(candidate.id);
            counters.admit(genre_name.as_deref());
            out.push(to_new_recommendation(
                candidate,
                self.media_type,
                score,
                source,
                genre_name,
                providers,
            ));
        }
    }
}

fn apply_streaming_boost(score: f32, is_streamable: bool) -> f32 {
    if is_streamable {
        (score + STREAMING_BOOST).min(SCORE_CEILING)
    } else {
        score
    }
}

fn to_new_recommendation(
    candidate: ScreenContentCandidate,
    media_type: MediaType,
    score: f32,
    source: RecommendationSource,
    genre_name: Option<String>,
    providers: WatchProviders,
) -> NewRecommendation {
    let is_streamable = providers.is_streamable();
    NewRecommendation {
        user_id: 0, // stamped by the orchestrator before insertion
        media_type,
        external_id: candidate.id.to_string(),
        title: candidate.title,
        year: candidate.year,
        cover_url: candidate.poster_url,
        description: candidate.overview,
        score,
        source,
        genre_name,
        catalog_rating: Some(candidate.vote_average),
        is_streamable,
        streaming_providers: if providers.flatrate.is_empty() {
            None
        } else {
            Some(providers.flatrate)
        },
        external_url: None,
    }
}
