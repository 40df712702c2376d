//! Hybrid retrieval over indexed transcript chunks.
//!
//! A query is answered from vector similarity first. When the best similarity
//! is weak, a lexical term-count pass over every stored chunk is merged in so
//! that exact keyword hits are not lost.

mod backend;
mod lexical;

pub use backend::StoreBackend;
pub use lexical::{lexical_scores, query_tokens};

use crate::embedding::Embedder;
use crate::error::{LecnavError, Result};
use crate::segment::Chunk;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default top-score threshold below which the lexical fallback runs.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.2;

/// Default number of vector candidates requested per wanted result.
pub const DEFAULT_OVERFETCH_FACTOR: usize = 4;

/// A stored chunk together with the source it belongs to.
#[derive(Debug, Clone)]
pub struct SourceChunk {
    pub source_id: String,
    pub source_title: String,
    pub chunk: Chunk,
}

impl SourceChunk {
    /// Copy this chunk and annotate it with a score.
    pub fn with_score(&self, score: f32) -> ScoredChunk {
        ScoredChunk {
            source_id: self.source_id.clone(),
            source_title: self.source_title.clone(),
            chunk: self.chunk.clone(),
            score,
        }
    }
}

/// A ranked retrieval hit.
///
/// Similarity hits carry cosine scores; lexical hits carry raw term counts.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub source_id: String,
    pub source_title: String,
    pub chunk: Chunk,
    pub score: f32,
}

impl ScoredChunk {
    /// Identity used for deduplication: owning source plus exact time span.
    fn key(&self) -> (String, u64, u64) {
        (
            self.source_id.clone(),
            self.chunk.start.to_bits(),
            self.chunk.end.to_bits(),
        )
    }
}

/// A free-text search request.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub k: usize,
    pub source_filter: Option<String>,
}

impl Query {
    /// Create a query over all sources.
    pub fn new(text: impl Into<String>, k: usize) -> Self {
        Self {
            text: text.into(),
            k,
            source_filter: None,
        }
    }

    /// Restrict the query to a single source.
    pub fn with_source(mut self, source_id: Option<String>) -> Self {
        self.source_filter = source_id.filter(|s| !s.trim().is_empty());
        self
    }

    /// Reject queries that cannot produce results.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(LecnavError::InvalidInput(
                "Query text must not be empty".to_string(),
            ));
        }
        if self.k == 0 {
            return Err(LecnavError::InvalidInput(
                "k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tuning knobs for hybrid retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    /// Top similarity score below which the lexical fallback runs.
    pub confidence_threshold: f32,
    /// Vector candidates requested per wanted result.
    pub overfetch_factor: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            overfetch_factor: DEFAULT_OVERFETCH_FACTOR,
        }
    }
}

/// The two storage primitives retrieval needs.
///
/// Both are infallible from the retriever's point of view: backends report
/// failures as empty results.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Up to `limit` chunks scored by similarity to `embedding`.
    async fn vector_search(
        &self,
        embedding: &[f32],
        limit: usize,
        source_filter: Option<&str>,
    ) -> Vec<ScoredChunk>;

    /// Every stored chunk, optionally scoped to one source.
    async fn list_all(&self, source_filter: Option<&str>) -> Vec<SourceChunk>;
}

/// Resolve a query into at most `query.k` ranked, deduplicated chunks.
#[instrument(skip_all, fields(query = %query.text, k = query.k))]
pub async fn search(
    query: &Query,
    config: &RetrievalConfig,
    embedder: &dyn Embedder,
    backend: &dyn SearchBackend,
) -> Result<Vec<ScoredChunk>> {
    query.validate()?;

    let embedding = embedder.embed(&query.text).await?;
    let filter = query.source_filter.as_deref();
    let limit = query.k.saturating_mul(config.overfetch_factor.max(1));

    let candidates = backend.vector_search(&embedding, limit, filter).await;
    debug!("Vector search returned {} candidates", candidates.len());

    if candidates.is_empty() {
        info!("No vector candidates, using lexical results only");
        let all = backend.list_all(filter).await;
        return Ok(lexical_scores(&query.text, &all, query.k));
    }

    let primary = rank_candidates(candidates, query.k);
    let top_score = primary.first().map_or(0.0, |c| c.score);

    if top_score >= config.confidence_threshold {
        return Ok(primary);
    }

    info!(
        "Top score {:.3} below threshold {:.3}, merging lexical results",
        top_score, config.confidence_threshold
    );
    let all = backend.list_all(filter).await;
    let fallback = lexical_scores(&query.text, &all, query.k);
    Ok(merge_results(primary, fallback, query.k))
}

/// Order similarity candidates by score, breaking ties by later end time, and keep `k`.
pub fn rank_candidates(mut candidates: Vec<ScoredChunk>, k: usize) -> Vec<ScoredChunk> {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.chunk.end.total_cmp(&a.chunk.end))
    });
    candidates.truncate(k);
    candidates
}

/// Merge primary and fallback hits.
///
/// The first occurrence of each `(source_id, start, end)` wins, so a primary hit
/// keeps its own score even when the fallback scored the same span higher.
pub fn merge_results(
    primary: Vec<ScoredChunk>,
    fallback: Vec<ScoredChunk>,
    k: usize,
) -> Vec<ScoredChunk> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ScoredChunk> = primary
        .into_iter()
        .chain(fallback)
        .filter(|c| seen.insert(c.key()))
        .collect();

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(k);
    merged
}

/// Retriever bound to an embedder and a backend.
pub struct HybridRetriever {
    embedder: Arc<dyn Embedder>,
    backend: Arc<dyn SearchBackend>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    /// Create a retriever with the default config.
    pub fn new(embedder: Arc<dyn Embedder>, backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            embedder,
            backend,
            config: RetrievalConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run a query.
    pub async fn search(&self, query: &Query) -> Result<Vec<ScoredChunk>> {
        search(query, &self.config, self.embedder.as_ref(), self.backend.as_ref()).await
    }
}
