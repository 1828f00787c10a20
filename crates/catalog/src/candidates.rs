//! Raw record types returned by catalog adapters, before scoring.
//!
//! These are intentionally thinner than `media_store::Recommendation`: an
//! adapter has no opinion on score, streamability, or which user asked —
//! that's layered on afterward by the scorer and the orchestrator.

/// A film or series surfaced by a [`crate::screen_content::ScreenContentAdapter`].
#[derive(Debug, Clone)]
pub struct ScreenContentCandidate {
    pub id: i64,
    pub title: String,
    pub year: Option<u16>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub vote_average: f32,
    pub vote_count: u32,
    pub popularity: f32,
    pub genre_ids: Vec<i32>,
}

/// Subscription-streaming availability for one title in one country. Ad-
/// supported and rental/purchase tiers aren't tracked — only "included with
/// a subscription you likely already have" counts toward `is_streamable`.
#[derive(Debug, Clone, Default)]
pub struct WatchProviders {
    pub flatrate: Vec<String>,
}

impl WatchProviders {
    pub fn is_streamable(&self) -> bool {
        !self.flatrate.is_empty()
    }
}

/// A book surfaced by a [`crate::book::BookAdapter`]. Real book catalogs
/// (Open Library, Google Books) disagree on identifier shape, so candidates
/// carry whichever of these the source actually populated.
#[derive(Debug, Clone, Default)]
pub struct BookCandidate {
    pub external_id: Option<String>,
    pub isbn: Option<String>,
    pub open_library_key: Option<String>,
    pub key: Option<String>,
    pub title: String,
    pub year: Option<u16>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
}

impl BookCandidate {
    /// The identifier to persist as `external_id`, in order of preference:
    /// an explicit id, then ISBN, then the tail segment of an Open Library
    /// key or generic key (`/works/OL123W` -> `OL123W`).
    pub fn resolved_external_id(&self) -> Option<String> {
        self.external_id
            .clone()
            .or_else(|| self.isbn.clone())
            .or_else(|| self.open_library_key.as_deref().map(tail_segment))
            .or_else(|| self.key.as_deref().map(tail_segment))
    }
}

fn tail_segment(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_providers_is_streamable_requires_a_flatrate_entry() {
        assert!(!WatchProviders::default().is_streamable());
        let available = WatchProviders {
            flatrate: vec!["Netflix".into()],
        };
        assert!(available.is_streamable());
    }

    #[test]
    fn resolved_external_id_prefers_explicit_id_over_key() {
        let candidate = BookCandidate {
            external_id: Some("explicit".into()),
            open_library_key: Some("/works/OL123W".into()),
            ..Default::default()
        };
        assert_eq!(candidate.resolved_external_id(), Some("explicit".into()));
    }

    #[test]
    fn resolved_external_id_falls_back_to_open_library_key_tail() {
        let candidate = BookCandidate {
            open_library_key: Some("/works/OL123W".into()),
            ..Default::default()
        };
        assert_eq!(candidate.resolved_external_id(), Some("OL123W".into()));
    }

    #[test]
    fn resolved_external_id_is_none_when_nothing_is_populated() {
        assert_eq!(BookCandidate::default().resolved_external_id(), None);
    }
}
