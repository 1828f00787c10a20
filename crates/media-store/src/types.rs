//! Core domain types: user-owned media and the recommendations derived from it.
//!
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (UserId, RecommendationId)
//! - Structs with public fields
//! - Enums for fixed sets of values
//! - Derive macros for common traits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a user.
pub type UserId = u32;

/// Unique identifier for a stored recommendation row.
pub type RecommendationId = u64;

/// Dimensionality every stored/produced embedding must have.
pub const EMBEDDING_DIM: usize = 384;

/// The four media categories the engine recommends across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Film,
    Series,
    Book,
    ShortVideo,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Film => "film",
            MediaType::Series => "series",
            MediaType::Book => "book",
            MediaType::ShortVideo => "short_video",
        }
    }
}

/// Where a piece of media sits in the user's consumption lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaStatus {
    ToConsume,
    InProgress,
    Done,
    Abandoned,
}

/// Short-video-specific attributes, present only on `MediaType::ShortVideo` items.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShortVideoMetadata {
    pub channel_name: Option<String>,
    pub external_url: Option<String>,
    pub cover_url: Option<String>,
}

/// A single item of media owned by a user: something they've added to their
/// library, optionally rated and optionally embedded.
///
/// The engine only ever reads these; their lifecycle (creation, rating) is
/// driven by the user through collaborators outside this crate's scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub user_id: UserId,
    pub title: String,
    pub media_type: MediaType,
    pub year: Option<u16>,
    pub external_id: String,
    pub description: Option<String>,
    pub status: MediaStatus,
    /// 1..=5, absent if not yet rated.
    pub rating: Option<u8>,
    pub genres: Vec<String>,
    /// L2-normalized, length `EMBEDDING_DIM`, absent until computed.
    pub embedding: Option<Vec<f32>>,
    pub short_video: Option<ShortVideoMetadata>,
}

/// How a recommendation was produced, carried through to the stored row for
/// explainability and for completion-mode re-derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationSource {
    Similar,
    GenreDiscover,
    Curated,
    Popular,
    FavoriteChannel,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationSource::Similar => "similar",
            RecommendationSource::GenreDiscover => "genre_discover",
            RecommendationSource::Curated => "curated",
            RecommendationSource::Popular => "popular",
            RecommendationSource::FavoriteChannel => "favorite_channel",
        }
    }
}

/// A recommendation surfaced to a user: a scored, sourced, persisted pointer
/// to an item in some external catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub user_id: UserId,
    pub media_type: MediaType,
    pub external_id: String,
    pub title: String,
    pub year: Option<u16>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    /// Clamped to [0.05, 0.98] by the scorer/pipeline that produced it.
    pub score: f32,
    pub source: RecommendationSource,
    pub genre_name: Option<String>,
    pub catalog_rating: Option<f32>,
    pub is_streamable: bool,
    pub streaming_providers: Option<Vec<String>>,
    pub external_url: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub is_dismissed: bool,
    pub added_to_library: bool,
}

/// Fields needed to construct a new `Recommendation` before it has an id or
/// timestamp assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewRecommendation {
    pub user_id: UserId,
    pub media_type: MediaType,
    pub external_id: String,
    pub title: String,
    pub year: Option<u16>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub score: f32,
    pub source: RecommendationSource,
    pub genre_name: Option<String>,
    pub catalog_rating: Option<f32>,
    pub is_streamable: bool,
    pub streaming_providers: Option<Vec<String>>,
    pub external_url: Option<String>,
}

/// Label used for grouping/counting recommendations that have no genre, so
/// ungenred items still count toward a media type's completion decision.
pub const FALLBACK_GENRE: &str = "Discoveries";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_as_str_round_trips_recognizably() {
        assert_eq!(MediaType::Film.as_str(), "film");
        assert_eq!(MediaType::ShortVideo.as_str(), "short_video");
    }

    #[test]
    fn recommendation_source_as_str() {
        assert_eq!(RecommendationSource::Similar.as_str(), "similar");
        assert_eq!(RecommendationSource::FavoriteChannel.as_str(), "favorite_channel");
    }
}
