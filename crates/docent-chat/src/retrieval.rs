//! Retrieval seam.
//!
//! The pipeline talks to the knowledge base through [`Retriever`] so
//! tests can substitute a scripted index for the real one.

use async_trait::async_trait;
use docent_core::types::Passage;
use docent_storage::search::PassageSearch;
use tracing::debug;

use crate::error::ChatError;

/// Fetches candidate passages for a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` passages ranked by relevance, best first.
    async fn fetch(&self, query: &str, k: usize) -> Result<Vec<Passage>, ChatError>;
}

/// [`Retriever`] backed by the SQLite full-text index.
pub struct IndexRetriever {
    search: PassageSearch,
}

impl IndexRetriever {
    pub fn new(search: PassageSearch) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn fetch(&self, query: &str, k: usize) -> Result<Vec<Passage>, ChatError> {
        let passages = self
            .search
            .search(query, k)
            .map_err(|err| ChatError::RetrievalUnavailable(err.to_string()))?;
        debug!(k, found = passages.len(), "fetched passages");
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_storage::db::Database;
    use docent_storage::search::PassageStore;
    use std::sync::Arc;

    fn seeded_retriever() -> IndexRetriever {
        let db = Arc::new(Database::in_memory().unwrap());
        let store = PassageStore::new(db.clone());
        store
            .insert(
                "langchain",
                "https://docs.example.com/runnables",
                "Runnables compose into chains and each chain step can be retried.",
            )
            .unwrap();
        store
            .insert(
                "fastapi",
                "https://docs.example.com/routing",
                "Routing tables map incoming paths to handlers at startup.",
            )
            .unwrap();
        IndexRetriever::new(PassageSearch::new(db))
    }

    #[tokio::test]
    async fn test_fetch_returns_ranked_matches() {
        let retriever = seeded_retriever();
        let passages = retriever.fetch("chains retried", 10).await.unwrap();
        assert!(!passages.is_empty());
        assert_eq!(passages[0].similarity_rank, 1);
        assert!(passages[0].content.contains("chains"));
    }

    #[tokio::test]
    async fn test_fetch_respects_limit() {
        let retriever = seeded_retriever();
        let passages = retriever.fetch("handlers OR chains", 1).await.unwrap();
        assert!(passages.len() <= 1);
    }

    #[tokio::test]
    async fn test_fetch_no_matches_is_empty_not_error() {
        let retriever = seeded_retriever();
        let passages = retriever.fetch("zzyzx", 10).await.unwrap();
        assert!(passages.is_empty());
    }
}
