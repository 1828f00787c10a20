//! Screen-content (film/series) adapter boundary.
//!
//! Defined with native async-fn-in-trait rather than `#[async_trait]`: every
//! caller in this workspace awaits adapters concretely or through a
//! `Box<dyn ScreenContentAdapter>` only where object safety is actually
//! needed, and this trait isn't used as a trait object anywhere yet.

use std::collections::HashMap;

use crate::candidates::{ScreenContentCandidate, WatchProviders};
use crate::error::CatalogError;
use crate::genres::ScreenKind;

/// How a discovery query should be sorted by the upstream catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    VoteAverageDesc,
    PopularityDesc,
}

/// Parameters for a genre-driven discovery query.
#[derive(Debug, Clone, Default)]
pub struct DiscoverParams {
    pub with_genres: Vec<i32>,
    pub vote_average_gte: f32,
    pub vote_count_gte: u32,
    pub sort_by: SortBy,
}

/// Source of film/series candidates: genre discovery, similarity to a seed
/// title, and watch-provider lookups.
pub trait ScreenContentAdapter: Send + Sync {
    async fn discover(
        &self,
        kind: ScreenKind,
        params: &DiscoverParams,
        limit: usize,
    ) -> anyhow::Result<Vec<ScreenContentCandidate>>;

    async fn similar(
        &self,
        kind: ScreenKind,
        seed_id: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<ScreenContentCandidate>>;

    async fn watch_providers(&self, id: i64, kind: ScreenKind, country: &str) -> anyhow::Result<WatchProviders>;
}

/// Deterministic in-memory adapter: a fixed catalog plus a similarity map,
/// used to exercise the pipelines and orchestrator without a network call.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScreenContentAdapter {
    catalog: Vec<ScreenContentCandidate>,
    similar_to: HashMap<i64, Vec<i64>>,
    providers: HashMap<(i64, String), WatchProviders>,
    always_fail: bool,
}

impl InMemoryScreenContentAdapter {
    pub fn new(catalog: Vec<ScreenContentCandidate>) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    pub fn with_similar(mut self, seed_id: i64, similar_ids: Vec<i64>) -> Self {
        self.similar_to.insert(seed_id, similar_ids);
        self
    }

    pub fn with_watch_providers(mut self, id: i64, country: &str, providers: WatchProviders) -> Self {
        self.providers.insert((id, country.to_string()), providers);
        self
    }

    /// Makes every call fail, to exercise the orchestrator's per-adapter
    /// failure isolation.
    pub fn always_failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    fn by_id(&self, id: i64) -> Option<&ScreenContentCandidate> {
        self.catalog.iter().find(|c| c.id == id)
    }
}

impl ScreenContentAdapter for InMemoryScreenContentAdapter {
    async fn discover(
        &self,
        _kind: ScreenKind,
        params: &DiscoverParams,
        limit: usize,
    ) -> anyhow::Result<Vec<ScreenContentCandidate>> {
        if self.always_fail {
            return Err(CatalogError::AdapterUnavailable("discover".into()).into());
        }
        let mut matches: Vec<ScreenContentCandidate> = self
            .catalog
            .iter()
            .filter(|c| {
                (params.with_genres.is_empty()
                    || params.with_genres.iter().any(|g| c.genre_ids.contains(g)))
                    && c.vote_average >= params.vote_average_gte
                    && c.vote_count >= params.vote_count_gte
            })
            .cloned()
            .collect();
        match params.sort_by {
            SortBy::VoteAverageDesc => {
                matches.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average))
            }
            SortBy::PopularityDesc => matches.sort_by(|a, b| b.popularity.total_cmp(&a.popularity)),
        }
        matches.truncate(limit);
        Ok(matches)
    }

    async fn similar(
        &self,
        _kind: ScreenKind,
        seed_id: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<ScreenContentCandidate>> {
        if self.always_fail {
            return Err(CatalogError::AdapterUnavailable("similar".into()).into());
        }
        let mut results: Vec<ScreenContentCandidate> = self
            .similar_to
            .get(&seed_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id(*id).cloned())
            .collect();
        results.truncate(limit);
        Ok(results)
    }

    async fn watch_providers(&self, id: i64, _kind: ScreenKind, country: &str) -> anyhow::Result<WatchProviders> {
        if self.always_fail {
            return Err(CatalogError::AdapterUnavailable("watch_providers".into()).into());
        }
        Ok(self
            .providers
            .get(&(id, country.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, vote_average: f32, genre_ids: Vec<i32>) -> ScreenContentCandidate {
        ScreenContentCandidate {
            id,
            title: format!("Title {id}"),
            year: Some(2020),
            overview: None,
            poster_url: None,
            vote_average,
            vote_count: 1000,
            popularity: vote_average,
            genre_ids,
        }
    }

    #[tokio::test]
    async fn discover_filters_by_genre_and_sorts_by_vote_average() {
        let adapter = InMemoryScreenContentAdapter::new(vec![
            candidate(1, 7.0, vec![878]),
            candidate(2, 9.0, vec![878]),
            candidate(3, 8.0, vec![18]),
        ]);
        let params = DiscoverParams {
            with_genres: vec![878],
            vote_average_gte: 0.0,
            vote_count_gte: 0,
            sort_by: SortBy::VoteAverageDesc,
        };
        let results = adapter.discover(ScreenKind::Movie, &params, 10).await.unwrap();
        assert_eq!(results.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[tokio::test]
    async fn similar_maps_seed_to_its_configured_neighbors() {
        let adapter = InMemoryScreenContentAdapter::new(vec![candidate(1, 8.0, vec![]), candidate(2, 8.0, vec![])])
            .with_similar(1, vec![2]);
        let results = adapter.similar(ScreenKind::Movie, 1, 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 2);
    }

    #[tokio::test]
    async fn watch_providers_defaults_to_unavailable() {
        let adapter = InMemoryScreenContentAdapter::new(vec![candidate(1, 8.0, vec![])]);
        let providers = adapter.watch_providers(1, ScreenKind::Movie, "FR").await.unwrap();
        assert!(!providers.is_streamable());
    }

    #[tokio::test]
    async fn always_failing_adapter_errors_on_every_call() {
        let adapter = InMemoryScreenContentAdapter::default().always_failing();
        let params = DiscoverParams::default();
        assert!(adapter.discover(ScreenKind::Movie, &params, 5).await.is_err());
        assert!(adapter.similar(ScreenKind::Movie, 1, 5).await.is_err());
        assert!(adapter.watch_providers(1, ScreenKind::Movie, "FR").await.is_err());
    }
}
