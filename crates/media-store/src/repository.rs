//! Repository contract: what the orchestrator needs from persistence.
//!
//! This crate never talks to a real database — schema, migrations, and the
//! transport that fronts it are out of scope. What's here is the abstract
//! boundary the orchestrator programs against, plus one concrete in-memory
//! implementation (`InMemoryRepository`) that is faithful enough about
//! commit/rollback semantics to be used in tests.

use crate::error::Result;
use crate::types::{Media, MediaType, NewRecommendation, Recommendation, RecommendationId, UserId};
use chrono::{DateTime, Utc};

/// Filter applied when reading back stored recommendations.
#[derive(Debug, Clone, Default)]
pub struct RecommendationFilter {
    pub media_type: Option<MediaType>,
    pub dismissed: Option<bool>,
    pub added_to_library: Option<bool>,
    pub generated_after: Option<DateTime<Utc>>,
}

impl RecommendationFilter {
    pub fn matches(&self, rec: &Recommendation) -> bool {
        if let Some(media_type) = self.media_type {
            if rec.media_type != media_type {
                return false;
            }
        }
        if let Some(dismissed) = self.dismissed {
            if rec.is_dismissed != dismissed {
                return false;
            }
        }
        if let Some(added) = self.added_to_library {
            if rec.added_to_library != added {
                return false;
            }
        }
        if let Some(cutoff) = self.generated_after {
            if rec.generated_at <= cutoff {
                return false;
            }
        }
        true
    }
}

/// What the orchestrator needs from a persistence backend.
///
/// Read methods are immediate (no transaction needed). Mutations go through
/// a `RecommendationTransaction` so a full refresh can stage a delete+insert
/// and commit or roll it back as a unit.
pub trait Repository: Send + Sync {
    /// All of a user's rated media, genres and embedding included.
    fn rated_media(&self, user_id: UserId) -> Result<Vec<Media>>;

    /// A user's media of one type, regardless of rating (used for library
    /// lookups: existing titles, to-consume short videos, ...).
    fn library_media(&self, user_id: UserId, media_type: MediaType) -> Result<Vec<Media>>;

    /// Stored recommendations for a user matching `filter`.
    fn recommendations(&self, user_id: UserId, filter: &RecommendationFilter) -> Result<Vec<Recommendation>>;

    fn dismiss(&self, user_id: UserId, recommendation_id: RecommendationId) -> Result<bool>;

    fn mark_added_to_library(&self, user_id: UserId, external_id: &str, media_type: MediaType) -> Result<bool>;

    /// Open a transaction for a bulk replace/insert.
    fn begin(&self) -> Box<dyn RecommendationTransaction + '_>;
}

/// Staged mutations for one generation run. Nothing is durable until
/// `commit` is called; dropping without committing is equivalent to
/// `rollback`.
pub trait RecommendationTransaction {
    /// Delete dismissed recommendations generated before `cutoff`. Returns
    /// the number removed.
    fn delete_dismissed_older_than(&mut self, user_id: UserId, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Delete all non-dismissed recommendations for the user (full refresh
    /// replacement step).
    fn delete_non_dismissed(&mut self, user_id: UserId) -> Result<usize>;

    /// Insert a batch of newly generated recommendations, stamping each
    /// with `generated_at = now` and assigning fresh ids.
    fn insert_all(&mut self, recs: Vec<NewRecommendation>, now: DateTime<Utc>) -> Result<Vec<Recommendation>>;

    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}
