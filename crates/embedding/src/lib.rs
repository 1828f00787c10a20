//! Text-embedding service: produces and compares L2-normalized semantic
//! vectors, and aggregates a user's rated media into a single taste
//! centroid.
//!
//! The text -> vector function itself is out of scope for the engine (the
//! spec treats the embedding model's training as an external concern). What
//! ships here is a deterministic, dependency-free feature-hashing
//! vectorizer standing in for a pretrained sentence encoder: it tokenizes on
//! word boundaries, hashes each token into one of [`EMBEDDING_DIM`] buckets
//! with a sign derived from a second slice of the same hash, accumulates,
//! and L2-normalizes. Same text always yields the same vector; semantically
//! overlapping texts (shared tokens) yield higher cosine similarity than
//! unrelated ones, which is all the scorer and profile builder need.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{instrument, trace};

/// Dimensionality every vector produced or consumed here must have.
pub const EMBEDDING_DIM: usize = 384;

/// Size of the dedicated CPU-offload worker pool (§5, §6). Async callers
/// never run embedding work on their own task; they hand it to this pool.
pub const EMBEDDING_WORKER_POOL_SIZE: usize = 2;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("vectors have mismatched dimensions: {0} vs {1}")]
    InvalidDimension(usize, usize),

    #[error("no input provided")]
    EmptyInput,
}

/// Stateless text -> vector function plus the aggregate operations the
/// profile builder and scorer need on top of it.
///
/// Cheap to construct and `Clone` (the hashing vectorizer carries no model
/// weights), but still exposes an async offload path so callers that treat
/// embedding as CPU-bound work never block their own task on it.
#[derive(Clone)]
pub struct EmbeddingService {
    worker_pool: Arc<Semaphore>,
}

impl EmbeddingService {
    pub fn new() -> Self {
        Self {
            worker_pool: Arc::new(Semaphore::new(EMBEDDING_WORKER_POOL_SIZE)),
        }
    }

    /// Deterministic, normalized embedding for `text`.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        hash_embed(text)
    }

    /// Batch form. Must be preferred whenever two or more texts are
    /// available — semantically equivalent to calling `encode` per text, but
    /// the scorer's correctness depends on candidates being embedded in one
    /// batch rather than interleaved with other similarity work.
    pub fn encode_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| hash_embed(t)).collect()
    }

    /// Async form of [`encode`], offloaded to the bounded worker pool so the
    /// calling task is never blocked by CPU-bound hashing.
    #[instrument(skip(self, text))]
    pub async fn encode_async(&self, text: String) -> Vec<f32> {
        let _permit = self
            .worker_pool
            .clone()
            .acquire_owned()
            .await
            .expect("embedding worker pool semaphore closed");
        tokio::task::spawn_blocking(move || hash_embed(&text))
            .await
            .expect("embedding worker task panicked")
    }

    /// Async form of [`encode_batch`].
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn encode_batch_async(&self, texts: Vec<String>) -> Vec<Vec<f32>> {
        let _permit = self
            .worker_pool
            .clone()
            .acquire_owned()
            .await
            .expect("embedding worker pool semaphore closed");
        tokio::task::spawn_blocking(move || texts.iter().map(|t| hash_embed(t)).collect())
            .await
            .expect("embedding worker task panicked")
    }

    /// Cosine similarity between two normalized vectors (= dot product).
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError> {
        if a.len() != b.len() {
            return Err(EmbeddingError::InvalidDimension(a.len(), b.len()));
        }
        Ok(dot(a, b))
    }

    /// Filter `candidates` by `score >= min_sim`, sort descending, truncate
    /// to `k`.
    pub fn top_k_similar<'a, I: Copy + 'a>(
        &self,
        query: &[f32],
        candidates: &'a [(I, Vec<f32>)],
        k: usize,
        min_sim: f32,
    ) -> Vec<(I, f32)> {
        let mut scored: Vec<(I, f32)> = candidates
            .iter()
            .filter_map(|(id, vec)| {
                let score = self.similarity(query, vec).ok()?;
                (score >= min_sim).then_some((*id, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Weighted centroid of `(embedding, rating)` pairs, L2-normalized.
    /// `None` if `pairs` is empty. See §4.1 for the rating -> weight curve.
    pub fn profile_centroid(&self, pairs: &[(Vec<f32>, Option<u8>)]) -> Option<Vec<f32>> {
        if pairs.is_empty() {
            return None;
        }
        let weights: Vec<f32> = pairs
            .iter()
            .map(|(_, rating)| match rating {
                Some(r) => ((*r as f32 - 1.0) / 4.0) * 0.8 + 0.2,
                None => 0.5,
            })
            .collect();
        let total: f32 = weights.iter().sum();
        let dim = pairs[0].0.len();
        let mut centroid = vec![0.0f32; dim];
        for ((vec, _), w) in pairs.iter().zip(weights.iter()) {
            let normalized_w = w / total;
            for (c, v) in centroid.iter_mut().zip(vec.iter()) {
                *c += v * normalized_w;
            }
        }
        Some(l2_normalize(&centroid))
    }
}

impl Default for EmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Compose the single canonical string used both at profile-build time and
/// candidate-scoring time, so the two are directly comparable.
pub fn create_media_text(
    title: &str,
    year: Option<u16>,
    authors: &[String],
    genres: &[String],
    keywords: &[String],
    description: Option<&str>,
) -> String {
    let mut parts = vec![title.to_string()];
    if let Some(year) = year {
        parts.push(year.to_string());
    }
    if !authors.is_empty() {
        parts.push(authors.join(", "));
    }
    if !genres.is_empty() {
        parts.push(genres.join(", "));
    }
    if !keywords.is_empty() {
        parts.push(keywords.iter().take(10).cloned().collect::<Vec<_>>().join(", "));
    }
    if let Some(description) = description {
        parts.push(truncate_with_ellipsis(description, 500));
    }
    parts.join(" | ")
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}

fn hash_embed(text: &str) -> Vec<f32> {
    let mut vec = vec![0.0f32; EMBEDDING_DIM];
    for token in tokenize(text) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let h = hasher.finish();
        let bucket = (h % EMBEDDING_DIM as u64) as usize;
        let sign = if (h / EMBEDDING_DIM as u64) % 2 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign;
    }
    trace!(tokens = vec.iter().filter(|&&x| x != 0.0).count(), "hashed embedding");
    l2_normalize(&vec)
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vec.to_vec();
    }
    vec.iter().map(|x| x / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(a: f32, b: f32, tol: f32) {
        assert!((a - b).abs() <= tol, "expected {a} ~= {b} (tol {tol})");
    }

    #[test]
    fn encode_is_deterministic_and_normalized() {
        let service = EmbeddingService::new();
        let v1 = service.encode("The Matrix is a science fiction film");
        let v2 = service.encode("The Matrix is a science fiction film");
        assert_eq!(v1, v2);
        assert_eq!(v1.len(), EMBEDDING_DIM);
        let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert_approx_eq(norm, 1.0, 1e-4);
    }

    #[test]
    fn encode_batch_matches_individual_encode() {
        let service = EmbeddingService::new();
        let texts = vec!["alpha beta".to_string(), "gamma delta".to_string()];
        let batch = service.encode_batch(&texts);
        assert_eq!(batch[0], service.encode(&texts[0]));
        assert_eq!(batch[1], service.encode(&texts[1]));
    }

    #[test]
    fn similarity_of_identical_vectors_is_one() {
        let service = EmbeddingService::new();
        let v = service.encode("a shared-universe superhero sequel");
        let sim = service.similarity(&v, &v).unwrap();
        assert_approx_eq(sim, 1.0, 1e-4);
    }

    #[test]
    fn similarity_rejects_mismatched_dimensions() {
        let service = EmbeddingService::new();
        let err = service.similarity(&[0.0, 1.0], &[0.0, 1.0, 0.0]).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidDimension(2, 3)));
    }

    #[test]
    fn related_texts_are_more_similar_than_unrelated_ones() {
        let service = EmbeddingService::new();
        let sci_fi_a = service.encode("space opera with starships and aliens");
        let sci_fi_b = service.encode("starships aliens and a distant space opera");
        let cooking = service.encode("a gentle documentary about baking sourdough bread");

        let sim_related = service.similarity(&sci_fi_a, &sci_fi_b).unwrap();
        let sim_unrelated = service.similarity(&sci_fi_a, &cooking).unwrap();
        assert!(sim_related > sim_unrelated);
    }

    #[test]
    fn top_k_similar_filters_sorts_and_truncates() {
        let service = EmbeddingService::new();
        let query = service.encode("a quiet character study about grief");
        let candidates = vec![
            (1, service.encode("a quiet character study about grief and loss")),
            (2, service.encode("a quiet character study about grief, loss and memory")),
            (3, service.encode("giant robots fighting in outer space")),
        ];
        let top = service.top_k_similar(&query, &candidates, 2, 0.0);
        assert_eq!(top.len(), 2);
        assert!(top[0].1 >= top[1].1);
    }

    #[test]
    fn profile_centroid_of_single_pair_is_the_normalized_vector() {
        let service = EmbeddingService::new();
        let v = service.encode("a beloved animated film about found family");
        let centroid = service.profile_centroid(&[(v.clone(), Some(5))]).unwrap();
        for (a, b) in centroid.iter().zip(v.iter()) {
            assert_approx_eq(*a, *b, 1e-5);
        }
    }

    #[test]
    fn profile_centroid_of_empty_input_is_none() {
        let service = EmbeddingService::new();
        assert!(service.profile_centroid(&[]).is_none());
    }

    #[test]
    fn profile_centroid_weighs_five_star_ratings_more_than_one_star() {
        let service = EmbeddingService::new();
        let liked = service.encode("an acclaimed prestige drama");
        let disliked = service.encode("a forgettable straight-to-video sequel");
        let centroid = service
            .profile_centroid(&[(liked.clone(), Some(5)), (disliked, Some(1))])
            .unwrap();
        let sim_to_liked = service.similarity(&centroid, &liked).unwrap();
        assert!(sim_to_liked > 0.3);
    }

    #[test]
    fn create_media_text_is_deterministic() {
        let text1 = create_media_text(
            "Dune",
            Some(2021),
            &[],
            &["Science Fiction".to_string()],
            &["sandworms".to_string(), "spice".to_string()],
            Some("A noble family becomes embroiled in a war for control over the galaxy's most valuable asset."),
        );
        let text2 = create_media_text(
            "Dune",
            Some(2021),
            &[],
            &["Science Fiction".to_string()],
            &["sandworms".to_string(), "spice".to_string()],
            Some("A noble family becomes embroiled in a war for control over the galaxy's most valuable asset."),
        );
        assert_eq!(text1, text2);
        assert!(text1.starts_with("Dune | 2021 | Science Fiction | sandworms, spice"));
    }

    #[test]
    fn create_media_text_truncates_long_descriptions_with_ellipsis() {
        let long_description = "x".repeat(600);
        let text = create_media_text("Title", None, &[], &[], &[], Some(&long_description));
        let tail = text.split(" | ").last().unwrap();
        assert_eq!(tail.chars().count(), 503);
        assert!(tail.ends_with("..."));
    }

    #[tokio::test]
    async fn encode_async_matches_sync_encode() {
        let service = EmbeddingService::new();
        let text = "asynchronous offload should not change the result".to_string();
        let async_vec = service.encode_async(text.clone()).await;
        assert_eq!(async_vec, service.encode(&text));
    }

    #[tokio::test]
    async fn worker_pool_bounds_concurrent_offloads() {
        let service = EmbeddingService::new();
        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.encode_async(format!("candidate number {i}")).await
            }));
        }
        for handle in handles {
            let v = handle.await.unwrap();
            assert_eq!(v.len(), EMBEDDING_DIM);
        }
    }
}
