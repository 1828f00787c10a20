//! Book search adapter boundary.

use crate::candidates::BookCandidate;
use crate::error::CatalogError;

/// Source of book candidates, queried by free-text title/author search —
/// there's no genre-id discovery endpoint for books, so genre-driven book
/// recommendations instead search curated queries (see [`crate::book_catalog`]).
pub trait BookAdapter: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<BookCandidate>>;
}

/// Deterministic in-memory adapter: a fixed catalog, matched by case-
/// insensitive substring against the query.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookAdapter {
    catalog: Vec<BookCandidate>,
    always_fail: bool,
}

impl InMemoryBookAdapter {
    pub fn new(catalog: Vec<BookCandidate>) -> Self {
        Self {
            catalog,
            always_fail: false,
        }
    }

    pub fn always_failing(mut self) -> Self {
        self.always_fail = true;
        self
    }
}

impl BookAdapter for InMemoryBookAdapter {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<BookCandidate>> {
        if self.always_fail {
            return Err(CatalogError::AdapterUnavailable("search".into()).into());
        }
        let query_lower = query.to_lowercase();
        let mut results: Vec<BookCandidate> = self
            .catalog
            .iter()
            .filter(|b| {
                let title_lower = b.title.to_lowercase();
                title_lower.contains(&query_lower) || query_lower.contains(&title_lower)
            })
            .cloned()
            .collect();
        results.truncate(limit);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str) -> BookCandidate {
        BookCandidate {
            title: title.to_string(),
            open_library_key: Some(format!("/works/{}", title.replace(' ', "_"))),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn search_matches_by_case_insensitive_substring() {
        let adapter = InMemoryBookAdapter::new(vec![book("Dune Frank Herbert"), book("Foundation Isaac Asimov")]);
        let results = adapter.search("dune", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dune Frank Herbert");
    }

    #[tokio::test]
    async fn search_respects_the_limit() {
        let adapter = InMemoryBookAdapter::new(vec![book("Dune Frank Herbert"), book("Dune Messiah")]);
        let results = adapter.search("Dune", 1).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn always_failing_adapter_errors() {
        let adapter = InMemoryBookAdapter::default().always_failing();
        assert!(adapter.search("anything", 5).await.is_err());
    }
}
