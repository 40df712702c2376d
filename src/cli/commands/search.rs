//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::openai::require_api_key;
use crate::retrieval::{HybridRetriever, Query, StoreBackend};
use crate::segment::format_timestamp;
use crate::vector_store::open_store;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(
    query: &str,
    k: Option<usize>,
    source: Option<String>,
    settings: Settings,
) -> Result<()> {
    let query = Query::new(query, k.unwrap_or(settings.retrieval.default_k)).with_source(source);
    query.validate()?;
    require_api_key()?;

    let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
    let backend = Arc::new(StoreBackend::new(open_store(&settings)?));
    let retriever =
        HybridRetriever::new(embedder, backend).with_config(settings.retrieval.to_config()?);

    let spinner = Output::spinner("Searching...");
    let results = retriever.search(&query).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            if hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", hits.len()));

                for hit in &hits {
                    Output::search_result(
                        &hit.source_title,
                        &format_timestamp(hit.chunk.start),
                        &format_timestamp(hit.chunk.end),
                        hit.score,
                        &hit.chunk.text,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
