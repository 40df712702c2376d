//! Term-count scoring used when vector similarity is weak.

use super::{ScoredChunk, SourceChunk};

/// Lowercased whitespace tokens of a query.
pub fn query_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Score every chunk by the total number of non-overlapping query-token
/// occurrences in its lowercased text and keep the best `k`.
///
/// Chunks with no occurrence are dropped. Equal scores keep input order.
pub fn lexical_scores(query: &str, chunks: &[SourceChunk], k: usize) -> Vec<ScoredChunk> {
    let tokens = query_tokens(query);
    if tokens.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .filter_map(|c| {
            let text = c.chunk.text.to_lowercase();
            let hits: usize = tokens.iter().map(|t| text.matches(t.as_str()).count()).sum();
            (hits > 0).then(|| c.with_score(hits as f32))
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}
