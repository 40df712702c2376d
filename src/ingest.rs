//! Ingestion pipeline for lecnav.
//!
//! Coordinates caption loading, segmentation, embedding and indexing.

use crate::captions::{load_captions, parse_captions, source_id_from_input, CaptionFormat};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{LecnavError, Result};
use crate::segment::{segment, SegmentConfig, SegmentPreset, TimedUnit};
use crate::vector_store::{open_store, StoredChunk, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Per-call segmentation choices.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Window preset to start from.
    pub preset: SegmentPreset,
    /// Override the preset's window, in seconds.
    pub window: Option<f64>,
    /// Override the preset's overlap, in seconds.
    pub overlap: Option<f64>,
}

/// Result of ingesting a source.
#[derive(Debug, Clone)]
pub struct IngestResult {
    /// Source ID.
    pub source_id: String,
    /// Title.
    pub title: String,
    /// Number of chunks indexed.
    pub chunks_indexed: usize,
}

/// Turns caption units into indexed chunks.
pub struct Ingestor {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Ingestor {
    /// Create an ingestor with the embedder and store chosen by `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let store = open_store(&settings)?;
        Ok(Self::with_components(settings, embedder, store))
    }

    /// Create an ingestor with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            settings,
            embedder,
            store,
        }
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build the segment config for `options` from the configured presets.
    pub fn segment_config(&self, options: &IngestOptions) -> Result<SegmentConfig> {
        self.settings
            .segmentation
            .segment_config(options.preset, options.window, options.overlap)
    }

    /// Load a caption file and index it.
    ///
    /// The source id defaults to the file stem and the title to the source id.
    #[instrument(skip(self, options), fields(path = %path.display()))]
    pub async fn ingest_file(
        &self,
        path: &Path,
        source_id: Option<&str>,
        title: Option<&str>,
        options: &IngestOptions,
    ) -> Result<IngestResult> {
        // Validate the window before touching the file.
        let config = self.segment_config(options)?;

        let source_id = match source_id {
            Some(id) => id.trim().to_string(),
            None => source_id_from_input(&path.to_string_lossy())?,
        };

        let units = load_captions(path, config.cleaner())?;
        let title = title.unwrap_or(&source_id).to_string();
        self.index_units(&source_id, &title, &units, &config, options.preset)
            .await
    }

    /// Parse caption content already in memory and index it.
    ///
    /// A missing source id gets a fresh random one.
    #[instrument(skip(self, content, options))]
    pub async fn ingest_content(
        &self,
        content: &str,
        format: Option<CaptionFormat>,
        source_id: Option<&str>,
        title: Option<&str>,
        options: &IngestOptions,
    ) -> Result<IngestResult> {
        let config = self.segment_config(options)?;
        let format = format.unwrap_or_else(|| CaptionFormat::sniff(content));
        let units = parse_captions(content, format, config.cleaner())?;

        let source_id = match source_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().simple().to_string(),
        };
        let title = title.unwrap_or(&source_id).to_string();
        self.index_units(&source_id, &title, &units, &config, options.preset)
            .await
    }

    /// Segment, embed and index a sequence of units under `source_id`.
    pub async fn ingest_units(
        &self,
        source_id: &str,
        title: &str,
        units: &[TimedUnit],
        options: &IngestOptions,
    ) -> Result<IngestResult> {
        let config = self.segment_config(options)?;
        self.index_units(source_id, title, units, &config, options.preset)
            .await
    }

    async fn index_units(
        &self,
        source_id: &str,
        title: &str,
        units: &[TimedUnit],
        config: &SegmentConfig,
        preset: SegmentPreset,
    ) -> Result<IngestResult> {
        if source_id.is_empty() {
            return Err(LecnavError::InvalidInput(
                "source id must not be empty".to_string(),
            ));
        }

        let mut chunks = segment(units, config);
        info!(
            "Segmented {} units into {} chunks for {}",
            units.len(),
            chunks.len(),
            source_id
        );

        if chunks.is_empty() {
            return Ok(IngestResult {
                source_id: source_id.to_string(),
                title: title.to_string(),
                chunks_indexed: 0,
            });
        }

        for chunk in &mut chunks {
            chunk.metadata.insert("preset".into(), preset.to_string().into());
            chunk.metadata.insert("window".into(), config.window().into());
            chunk.metadata.insert("overlap".into(), config.overlap().into());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(LecnavError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        debug!("Generated {} embeddings", embeddings.len());

        let stored: Vec<StoredChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(order, (chunk, embedding))| {
                StoredChunk::new(
                    source_id.to_string(),
                    title.to_string(),
                    chunk,
                    embedding,
                    order as i32,
                )
            })
            .collect();

        let count = self.store.replace_source(source_id, &stored).await?;

        Ok(IngestResult {
            source_id: source_id.to_string(),
            title: title.to_string(),
            chunks_indexed: count,
        })
    }
}
