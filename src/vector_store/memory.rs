//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{rank_by_similarity, IndexedSource, SearchResult, StoredChunk, VectorStore};
use crate::error::{LecnavError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store. Chunks are kept in insertion order.
pub struct MemoryVectorStore {
    chunks: RwLock<Vec<StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .read()
            .map_err(|e| LecnavError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .write()
            .map_err(|e| LecnavError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn replace_source(&self, source_id: &str, chunks: &[StoredChunk]) -> Result<usize> {
        let mut store = self.write()?;
        store.retain(|c| c.source_id != source_id);
        store.extend(chunks.iter().cloned().map(|mut c| {
            c.source_id = source_id.to_string();
            c
        }));
        Ok(chunks.len())
    }

    async fn vector_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let store = self.read()?;
        let candidates = store.iter().filter(|c| c.matches(source_filter)).cloned();
        Ok(rank_by_similarity(candidates, query_embedding, limit))
    }

    async fn list_all(&self, source_filter: Option<&str>) -> Result<Vec<StoredChunk>> {
        let store = self.read()?;
        Ok(store
            .iter()
            .filter(|c| c.matches(source_filter))
            .cloned()
            .collect())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let store = self.read()?;

        let mut source_map: HashMap<String, IndexedSource> = HashMap::new();
        for chunk in store.iter() {
            let entry = source_map
                .entry(chunk.source_id.clone())
                .or_insert_with(|| IndexedSource {
                    source_id: chunk.source_id.clone(),
                    source_title: chunk.source_title.clone(),
                    chunk_count: 0,
                    total_duration_seconds: 0.0,
                    indexed_at: chunk.indexed_at,
                });

            entry.chunk_count += 1;
            if chunk.chunk.end > entry.total_duration_seconds {
                entry.total_duration_seconds = chunk.chunk.end;
            }
            if chunk.indexed_at > entry.indexed_at {
                entry.indexed_at = chunk.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = source_map.into_values().collect();
        sources.sort_by(|a, b| {
            b.indexed_at
                .cmp(&a.indexed_at)
                .then_with(|| a.source_id.cmp(&b.source_id))
        });

        Ok(sources)
    }

    async fn get_source(&self, source_id: &str) -> Result<Option<IndexedSource>> {
        let sources = self.list_sources().await?;
        Ok(sources.into_iter().find(|s| s.source_id == source_id))
    }

    async fn delete_source(&self, source_id: &str) -> Result<usize> {
        let mut store = self.write()?;
        let initial_len = store.len();
        store.retain(|c| c.source_id != source_id);
        Ok(initial_len - store.len())
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Chunk;

    fn stored(source: &str, text: &str, start: f64, embedding: Vec<f32>) -> StoredChunk {
        StoredChunk::new(
            source.to_string(),
            format!("Title {}", source),
            Chunk::new(start, start + 30.0, text.to_string()),
            embedding,
            0,
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .replace_source(
                "video1",
                &[
                    stored("video1", "Hello world", 0.0, vec![1.0, 0.0, 0.0]),
                    stored("video1", "Goodbye world", 30.0, vec![0.0, 1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 2);

        let results = store.vector_search(&[1.0, 0.0, 0.0], 10, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_count, 2);
        assert_eq!(sources[0].total_duration_seconds, 60.0);
    }

    #[tokio::test]
    async fn test_replace_source_is_last_writer_wins() {
        let store = MemoryVectorStore::new();
        store
            .replace_source("a", &[stored("a", "old", 0.0, vec![1.0])])
            .await
            .unwrap();
        store
            .replace_source("b", &[stored("b", "other", 0.0, vec![1.0])])
            .await
            .unwrap();
        store
            .replace_source("a", &[stored("a", "new one", 0.0, vec![1.0]), stored("a", "new two", 30.0, vec![1.0])])
            .await
            .unwrap();

        let a = store.list_all(Some("a")).await.unwrap();
        let texts: Vec<&str> = a.iter().map(|c| c.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["new one", "new two"]);
        assert_eq!(store.chunk_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_source_filter() {
        let store = MemoryVectorStore::new();
        store
            .replace_source("a", &[stored("a", "alpha", 0.0, vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .replace_source("b", &[stored("b", "beta", 0.0, vec![1.0, 0.0])])
            .await
            .unwrap();

        let results = store.vector_search(&[1.0, 0.0], 10, Some("b")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source_id, "b");

        assert_eq!(store.list_all(None).await.unwrap().len(), 2);
        assert_eq!(store.delete_source("a").await.unwrap(), 1);
        assert!(store.get_source("a").await.unwrap().is_none());
        assert!(store.get_source("b").await.unwrap().is_some());
    }
}
