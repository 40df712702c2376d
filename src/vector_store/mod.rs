//! Vector store abstraction for lecnav.
//!
//! Stores embedded transcript chunks per source and answers similarity and
//! listing queries for the retriever.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::Settings;
use crate::error::{LecnavError, Result};
use crate::segment::Chunk;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// An embedded chunk as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Source (video/document) this chunk belongs to.
    pub source_id: String,
    /// Human-readable source title.
    pub source_title: String,
    /// The transcript chunk.
    pub chunk: Chunk,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Position of this chunk within its source.
    pub chunk_order: i32,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl StoredChunk {
    /// Create a new stored chunk.
    pub fn new(
        source_id: String,
        source_title: String,
        chunk: Chunk,
        embedding: Vec<f32>,
        chunk_order: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            source_title,
            chunk,
            embedding,
            chunk_order,
            indexed_at: Utc::now(),
        }
    }

    fn matches(&self, source_filter: Option<&str>) -> bool {
        source_filter.map_or(true, |id| self.source_id == id)
    }
}

/// A similarity search hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: StoredChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// Source ID.
    pub source_id: String,
    /// Source title.
    pub source_title: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// End of the last chunk in seconds.
    pub total_duration_seconds: f64,
    /// When the source was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace every chunk of a source with `chunks` in one operation.
    ///
    /// Concurrent replacements of the same source resolve last-writer-wins.
    async fn replace_source(&self, source_id: &str, chunks: &[StoredChunk]) -> Result<usize>;

    /// Return up to `limit` chunks ranked by cosine similarity, optionally scoped to one source.
    async fn vector_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>>;

    /// Return every stored chunk, optionally scoped to one source, in insertion order.
    async fn list_all(&self, source_filter: Option<&str>) -> Result<Vec<StoredChunk>>;

    /// List all indexed sources.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Get a specific source's information.
    async fn get_source(&self, source_id: &str) -> Result<Option<IndexedSource>>;

    /// Delete all chunks of a source.
    async fn delete_source(&self, source_id: &str) -> Result<usize>;

    /// Get total chunk count.
    async fn chunk_count(&self) -> Result<usize>;
}

/// Open the store selected by `[vector_store]` settings.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        other => Err(LecnavError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score `chunks` against a query embedding and keep the best `limit`.
///
/// Chunks whose embedding dimension differs from the query are skipped.
pub(crate) fn rank_by_similarity<I>(chunks: I, query_embedding: &[f32], limit: usize) -> Vec<SearchResult>
where
    I: IntoIterator<Item = StoredChunk>,
{
    let mut results: Vec<SearchResult> = chunks
        .into_iter()
        .filter(|c| c.embedding.len() == query_embedding.len())
        .map(|chunk| {
            let score = cosine_similarity(query_embedding, &chunk.embedding);
            SearchResult { chunk, score }
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    results
}
