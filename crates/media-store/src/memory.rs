//! In-memory reference implementation of [`Repository`].
//!
//! No database, no migrations — a `Mutex`-guarded `Vec` standing in for a
//! real persistence backend. Its only job is to be a faithful enough stand-in
//! for commit/rollback semantics that the orchestrator's transactional
//! replacement logic can be exercised in tests without a real database.
//!
//! A [`begin`](Repository::begin) call snapshots the current recommendations
//! into a staging buffer; mutations happen against that buffer and only
//! become visible to readers once `commit` writes it back. Dropping a
//! transaction (or calling `rollback`) simply discards the buffer.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};
use crate::repository::{RecommendationFilter, RecommendationTransaction, Repository};
use crate::types::{Media, MediaType, NewRecommendation, Recommendation, RecommendationId, UserId};

#[derive(Default)]
struct Store {
    media: Vec<Media>,
    recommendations: Vec<Recommendation>,
    next_id: RecommendationId,
}

/// In-memory `Repository`. Cheap to construct, `Clone`, shareable across
/// tasks via the internal `Arc<Mutex<_>>`.
#[derive(Clone)]
pub struct InMemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    /// Seed the user's library (rated or unrated). Test/fixture helper.
    pub fn seed_media(&self, media: Vec<Media>) {
        self.store.lock().expect("store poisoned").media.extend(media);
    }

    /// Seed pre-existing stored recommendations, e.g. to set up completion-mode
    /// or staleness-window scenarios. Test/fixture helper.
    pub fn seed_recommendations(&self, recs: Vec<Recommendation>) {
        let mut guard = self.store.lock().expect("store poisoned");
        let max_id = recs.iter().map(|r| r.id).max().unwrap_or(0);
        guard.next_id = guard.next_id.max(max_id + 1);
        guard.recommendations.extend(recs);
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for InMemoryRepository {
    fn rated_media(&self, user_id: UserId) -> Result<Vec<Media>> {
        let guard = self.store.lock().map_err(|_| StoreError::Backend("store poisoned".into()))?;
        Ok(guard
            .media
            .iter()
            .filter(|m| m.user_id == user_id && m.rating.is_some())
            .cloned()
            .collect())
    }

    fn library_media(&self, user_id: UserId, media_type: MediaType) -> Result<Vec<Media>> {
        let guard = self.store.lock().map_err(|_| StoreError::Backend("store poisoned".into()))?;
        Ok(guard
            .media
            .iter()
            .filter(|m| m.user_id == user_id && m.media_type == media_type)
            .cloned()
            .collect())
    }

    fn recommendations(&self, user_id: UserId, filter: &RecommendationFilter) -> Result<Vec<Recommendation>> {
        let guard = self.store.lock().map_err(|_| StoreError::Backend("store poisoned".into()))?;
        Ok(guard
            .recommendations
            .iter()
            .filter(|r| r.user_id == user_id && filter.matches(r))
            .cloned()
            .collect())
    }

    fn dismiss(&self, user_id: UserId, recommendation_id: RecommendationId) -> Result<bool> {
        let mut guard = self.store.lock().map_err(|_| StoreError::Backend("store poisoned".into()))?;
        match guard
            .recommendations
            .iter_mut()
            .find(|r| r.user_id == user_id && r.id == recommendation_id)
        {
            Some(rec) => {
                rec.is_dismissed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn mark_added_to_library(&self, user_id: UserId, external_id: &str, media_type: MediaType) -> Result<bool> {
        let mut guard = self.store.lock().map_err(|_| StoreError::Backend("store poisoned".into()))?;
        let mut matched = false;
        for rec in guard.recommendations.iter_mut().filter(|r| {
            r.user_id == user_id && r.external_id == external_id && r.media_type == media_type
        }) {
            rec.added_to_library = true;
            matched = true;
        }
        Ok(matched)
    }

    fn begin(&self) -> Box<dyn RecommendationTransaction + '_> {
        let guard = self.store.lock().expect("store poisoned");
        Box::new(InMemoryTransaction {
            store: self.store.clone(),
            staged: guard.recommendations.clone(),
            next_id: guard.next_id,
            closed: false,
        })
    }
}

struct InMemoryTransaction {
    store: Arc<Mutex<Store>>,
    staged: Vec<Recommendation>,
    next_id: RecommendationId,
    closed: bool,
}

impl RecommendationTransaction for InMemoryTransaction {
    fn delete_dismissed_older_than(&mut self, user_id: UserId, cutoff: DateTime<Utc>) -> Result<usize> {
        let before = self.staged.len();
        self.staged
            .retain(|r| !(r.user_id == user_id && r.is_dismissed && r.generated_at < cutoff));
        Ok(before - self.staged.len())
    }

    fn delete_non_dismissed(&mut self, user_id: UserId) -> Result<usize> {
        let before = self.staged.len();
        self.staged.retain(|r| !(r.user_id == user_id && !r.is_dismissed));
        Ok(before - self.staged.len())
    }

    fn insert_all(&mut self, recs: Vec<NewRecommendation>, now: DateTime<Utc>) -> Result<Vec<Recommendation>> {
        let mut inserted = Vec::with_capacity(recs.len());
        for new_rec in recs {
            let id = self.next_id;
            self.next_id += 1;
            let rec = Recommendation {
                id,
                user_id: new_rec.user_id,
                media_type: new_rec.media_type,
                external_id: new_rec.external_id,
                title: new_rec.title,
                year: new_rec.year,
                cover_url: new_rec.cover_url,
                description: new_rec.description,
                score: new_rec.score,
                source: new_rec.source,
                genre_name: new_rec.genre_name,
                catalog_rating: new_rec.catalog_rating,
                is_streamable: new_rec.is_streamable,
                streaming_providers: new_rec.streaming_providers,
                external_url: new_rec.external_url,
                generated_at: now,
                is_dismissed: false,
                added_to_library: false,
            };
            self.staged.push(rec.clone());
            inserted.push(rec);
        }
        Ok(inserted)
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let mut guard = self.store.lock().map_err(|_| StoreError::Backend("store poisoned".into()))?;
        guard.recommendations = std::mem::take(&mut self.staged);
        guard.next_id = self.next_id;
        self.closed = true;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        // Staging buffer is simply discarded; the shared store was never touched.
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaStatus, RecommendationSource};

    fn sample_media(user_id: UserId) -> Media {
        Media {
            user_id,
            title: "Arrival".into(),
            media_type: MediaType::Film,
            year: Some(2016),
            external_id: "tt2543164".into(),
            description: Some("A linguist deciphers an alien language.".into()),
            status: MediaStatus::Done,
            rating: Some(5),
            genres: vec!["Science Fiction".into()],
            embedding: None,
            short_video: None,
        }
    }

    fn sample_new_rec(user_id: UserId, external_id: &str) -> NewRecommendation {
        NewRecommendation {
            user_id,
            media_type: MediaType::Film,
            external_id: external_id.into(),
            title: "Some Film".into(),
            year: Some(2020),
            cover_url: None,
            description: None,
            score: 0.7,
            source: RecommendationSource::GenreDiscover,
            genre_name: Some("Drama".into()),
            catalog_rating: None,
            is_streamable: false,
            streaming_providers: None,
            external_url: None,
        }
    }

    #[test]
    fn rated_media_filters_to_rated_only_for_the_user() {
        let repo = InMemoryRepository::new();
        let mut unrated = sample_media(1);
        unrated.rating = None;
        unrated.external_id = "unrated".into();
        repo.seed_media(vec![sample_media(1), unrated, sample_media(2)]);

        let rated = repo.rated_media(1).unwrap();
        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].external_id, "tt2543164");
    }

    #[test]
    fn rollback_leaves_store_untouched() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();
        let mut tx = repo.begin();
        tx.insert_all(vec![sample_new_rec(1, "a")], now).unwrap();
        tx.rollback().unwrap();

        let filter = RecommendationFilter::default();
        assert!(repo.recommendations(1, &filter).unwrap().is_empty());
    }

    #[test]
    fn commit_makes_inserts_visible_and_replaces_non_dismissed() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();

        let mut tx = repo.begin();
        tx.insert_all(vec![sample_new_rec(1, "a"), sample_new_rec(1, "b")], now)
            .unwrap();
        tx.commit().unwrap();

        let filter = RecommendationFilter::default();
        assert_eq!(repo.recommendations(1, &filter).unwrap().len(), 2);

        // A second full refresh replaces the non-dismissed set.
        let mut tx2 = repo.begin();
        tx2.delete_non_dismissed(1).unwrap();
        tx2.insert_all(vec![sample_new_rec(1, "c")], now).unwrap();
        tx2.commit().unwrap();

        let after = repo.recommendations(1, &filter).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].external_id, "c");
    }

    #[test]
    fn dismiss_and_mark_added_are_idempotent_on_missing_rows() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.dismiss(1, 999).unwrap(), false);
        assert_eq!(
            repo.mark_added_to_library(1, "missing", MediaType::Film).unwrap(),
            false
        );
    }

    #[test]
    fn dismiss_sets_flag_and_mark_added_updates_matching_rows() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();
        let mut tx = repo.begin();
        let inserted = tx.insert_all(vec![sample_new_rec(1, "a")], now).unwrap();
        tx.commit().unwrap();

        assert!(repo.dismiss(1, inserted[0].id).unwrap());
        assert!(repo
            .mark_added_to_library(1, "a", MediaType::Film)
            .unwrap());

        let filter = RecommendationFilter::default();
        let rec = &repo.recommendations(1, &filter).unwrap()[0];
        assert!(rec.is_dismissed);
        assert!(rec.added_to_library);
    }

    #[test]
    fn delete_dismissed_older_than_respects_cutoff() {
        let repo = InMemoryRepository::new();
        let old = Utc::now() - chrono::Duration::days(10);
        let recent = Utc::now();

        let mut old_rec = sample_new_rec(1, "old");
        old_rec.score = 0.5;
        repo.seed_recommendations(vec![Recommendation {
            id: 1,
            user_id: 1,
            media_type: MediaType::Film,
            external_id: "old".into(),
            title: "Old".into(),
            year: None,
            cover_url: None,
            description: None,
            score: 0.5,
            source: RecommendationSource::Popular,
            genre_name: None,
            catalog_rating: None,
            is_streamable: false,
            streaming_providers: None,
            external_url: None,
            generated_at: old,
            is_dismissed: true,
            added_to_library: false,
        }]);

        let mut tx = repo.begin();
        let cutoff = recent - chrono::Duration::days(7);
        let removed = tx.delete_dismissed_older_than(1, cutoff).unwrap();
        assert_eq!(removed, 1);
        tx.commit().unwrap();

        let filter = RecommendationFilter::default();
        assert!(repo.recommendations(1, &filter).unwrap().is_empty());
    }
}
