//! User-profile builder (C4).
//!
//! Derives the per-run taste state every pipeline and the candidate scorer
//! read from: a profile embedding centroid, a per-genre preference score,
//! and (when enough history exists) a set of "dismissed" embeddings used to
//! penalize candidates that resemble things the user already rejected.

use std::collections::HashMap;

use embedding::EmbeddingService;
use media_store::{Media, Recommendation, RecommendationFilter, Repository, UserId};
use tracing::{debug, instrument};

/// Fewer dismissed recommendations than this and no penalty is applied at
/// all — not enough signal to trust.
const MIN_DISMISSED_FOR_PENALTY: usize = 3;

/// At most this many dismissed descriptions are embedded, most recent first.
const MAX_DISMISSED_EMBEDDED: usize = 20;

/// Dismissed descriptions are truncated to this many characters before
/// embedding, matching the text-synthesis truncation convention elsewhere.
const DISMISSED_DESCRIPTION_CHARS: usize = 300;

/// Per-run taste state shared by the candidate scorer and every pipeline.
#[derive(Debug, Clone, Default)]
pub struct UserTasteProfile {
    pub profile_embedding: Option<Vec<f32>>,
    pub genre_scores: HashMap<String, f32>,
    pub dismissed_embeddings: Vec<Vec<f32>>,
}

/// Builds a [`UserTasteProfile`] from a user's rated media and dismissed
/// recommendation history.
pub struct ProfileBuilder<R> {
    repo: R,
    embedding: EmbeddingService,
}

impl<R: Repository> ProfileBuilder<R> {
    pub fn new(repo: R, embedding: EmbeddingService) -> Self {
        Self { repo, embedding }
    }

    #[instrument(skip(self))]
    pub async fn build(&self, user_id: UserId) -> media_store::Result<UserTasteProfile> {
        let rated = self.repo.rated_media(user_id)?;

        let profile_embedding = self.profile_embedding(&rated);
        let genre_scores = self.genre_scores(&rated);
        let dismissed_embeddings = self.dismissed_embeddings(user_id).await?;

        debug!(
            user_id,
            rated_count = rated.len(),
            has_profile_embedding = profile_embedding.is_some(),
            genre_count = genre_scores.len(),
            dismissed_count = dismissed_embeddings.len(),
            "built user taste profile"
        );

        Ok(UserTasteProfile {
            profile_embedding,
            genre_scores,
            dismissed_embeddings,
        })
    }

    /// Weighted centroid over `(embedding, rating)` pairs where the
    /// embedding is present. `rated_media` already guarantees a rating.
    fn profile_embedding(&self, rated: &[Media]) -> Option<Vec<f32>> {
        let pairs: Vec<(Vec<f32>, Option<u8>)> = rated
            .iter()
            .filter_map(|m| m.embedding.clone().map(|e| (e, m.rating)))
            .collect();
        self.embedding.profile_centroid(&pairs)
    }

    /// `0.7 * avg(normalized rating) + 0.3 * min(sqrt(n) / 3, 1)` per genre.
    fn genre_scores(&self, rated: &[Media]) -> HashMap<String, f32> {
        let mut sums: HashMap<String, (f32, usize)> = HashMap::new();
        for media in rated {
            let Some(rating) = media.rating else { continue };
            let normalized = (rating as f32 - 1.0) / 4.0;
            for genre in &media.genres {
                let entry = sums.entry(genre.clone()).or_insert((0.0, 0));
                entry.0 += normalized;
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .map(|(genre, (sum, count))| {
                let avg = sum / count as f32;
                let count_factor = ((count as f32).sqrt() / 3.0).min(1.0);
                (genre, 0.7 * avg + 0.3 * count_factor)
            })
            .collect()
    }

    /// Batch-embeds up to [`MAX_DISMISSED_EMBEDDED`] dismissed recommendation
    /// descriptions, only once at least [`MIN_DISMISSED_FOR_PENALTY`] exist.
    async fn dismissed_embeddings(&self, user_id: UserId) -> media_store::Result<Vec<Vec<f32>>> {
        let filter = RecommendationFilter {
            dismissed: Some(true),
            ..Default::default()
        };
        let dismissed: Vec<Recommendation> = self.repo.recommendations(user_id, &filter)?;
        if dismissed.len() < MIN_DISMISSED_FOR_PENALTY {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = dismissed
            .iter()
            .take(MAX_DISMISSED_EMBEDDED)
            .filter_map(|r| r.description.as_deref())
            .map(|d| truncate_chars(d, DISMISSED_DESCRIPTION_CHARS))
            .collect();
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.embedding.encode_batch_async(texts).await)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
