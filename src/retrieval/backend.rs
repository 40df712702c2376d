//! Adapter from a [`VectorStore`] to the retriever's [`SearchBackend`].

use super::{ScoredChunk, SearchBackend, SourceChunk};
use crate::vector_store::{StoredChunk, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Serves retrieval from a vector store, reporting store failures as empty results.
#[derive(Clone)]
pub struct StoreBackend {
    store: Arc<dyn VectorStore>,
}

impl StoreBackend {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }
}

fn to_source_chunk(stored: StoredChunk) -> SourceChunk {
    SourceChunk {
        source_id: stored.source_id,
        source_title: stored.source_title,
        chunk: stored.chunk,
    }
}

#[async_trait]
impl SearchBackend for StoreBackend {
    async fn vector_search(
        &self,
        embedding: &[f32],
        limit: usize,
        source_filter: Option<&str>,
    ) -> Vec<ScoredChunk> {
        match self.store.vector_search(embedding, limit, source_filter).await {
            Ok(results) => results
                .into_iter()
                .map(|r| {
                    let score = r.score;
                    to_source_chunk(r.chunk).with_score(score)
                })
                .collect(),
            Err(e) => {
                warn!("Vector search failed, treating as no candidates: {}", e);
                Vec::new()
            }
        }
    }

    async fn list_all(&self, source_filter: Option<&str>) -> Vec<SourceChunk> {
        match self.store.list_all(source_filter).await {
            Ok(chunks) => chunks.into_iter().map(to_source_chunk).collect(),
            Err(e) => {
                warn!("Listing chunks failed, skipping lexical scoring: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LecnavError, Result};
    use crate::segment::Chunk;
    use crate::vector_store::{IndexedSource, MemoryVectorStore, SearchResult};

    struct BrokenStore;

    #[async_trait]
    impl VectorStore for BrokenStore {
        async fn replace_source(&self, _: &str, _: &[StoredChunk]) -> Result<usize> {
            Err(LecnavError::VectorStore("offline".to_string()))
        }

        async fn vector_search(&self, _: &[f32], _: usize, _: Option<&str>) -> Result<Vec<SearchResult>> {
            Err(LecnavError::VectorStore("offline".to_string()))
        }

        async fn list_all(&self, _: Option<&str>) -> Result<Vec<StoredChunk>> {
            Err(LecnavError::VectorStore("offline".to_string()))
        }

        async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
            Err(LecnavError::VectorStore("offline".to_string()))
        }

        async fn get_source(&self, _: &str) -> Result<Option<IndexedSource>> {
            Err(LecnavError::VectorStore("offline".to_string()))
        }

        async fn delete_source(&self, _: &str) -> Result<usize> {
            Err(LecnavError::VectorStore("offline".to_string()))
        }

        async fn chunk_count(&self) -> Result<usize> {
            Err(LecnavError::VectorStore("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failures_become_empty() {
        let backend = StoreBackend::new(Arc::new(BrokenStore));
        assert!(backend.vector_search(&[1.0], 4, None).await.is_empty());
        assert!(backend.list_all(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_maps_store_results() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .replace_source(
                "lec1",
                &[StoredChunk::new(
                    "lec1".to_string(),
                    "Lecture 1".to_string(),
                    Chunk::new(0.0, 30.0, "sorting algorithms".to_string()),
                    vec![1.0, 0.0],
                    0,
                )],
            )
            .await
            .unwrap();

        let backend = StoreBackend::new(store);
        let hits = backend.vector_search(&[1.0, 0.0], 4, Some("lec1")).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_title, "Lecture 1");
        assert!((hits[0].score - 1.0).abs() < 1e-6);

        let all = backend.list_all(Some("other")).await;
        assert!(all.is_empty());
    }
}
