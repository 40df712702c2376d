//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 BLOBs and scored with cosine
//! similarity in Rust.

use super::{rank_by_similarity, IndexedSource, SearchResult, StoredChunk, VectorStore};
use crate::error::{LecnavError, Result};
use crate::segment::Chunk;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        source_id TEXT NOT NULL,
        source_title TEXT NOT NULL,
        content TEXT NOT NULL,
        start_seconds REAL NOT NULL,
        end_seconds REAL NOT NULL,
        metadata TEXT NOT NULL,
        embedding BLOB NOT NULL,
        chunk_order INTEGER NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_source_id ON chunks(source_id);
"#;

const SELECT_CHUNKS: &str = r#"
    SELECT id, source_id, source_title, content, start_seconds, end_seconds,
           metadata, embedding, chunk_order, indexed_at
    FROM chunks
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LecnavError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<StoredChunk> {
        let id_str: String = row.get(0)?;
        let metadata_json: String = row.get(6)?;
        let embedding_bytes: Vec<u8> = row.get(7)?;
        let indexed_at_str: String = row.get(9)?;

        let id = uuid::Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
        })?;
        let metadata: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&metadata_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e))
            })?;

        Ok(StoredChunk {
            id,
            source_id: row.get(1)?,
            source_title: row.get(2)?,
            chunk: Chunk {
                start: row.get(4)?,
                end: row.get(5)?,
                text: row.get(3)?,
                metadata,
            },
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            chunk_order: row.get(8)?,
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }

    fn row_to_source(row: &Row<'_>) -> rusqlite::Result<IndexedSource> {
        let indexed_at_str: String = row.get(4)?;
        Ok(IndexedSource {
            source_id: row.get(0)?,
            source_title: row.get(1)?,
            chunk_count: row.get(2)?,
            total_duration_seconds: row.get(3)?,
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }

    fn select_chunks(conn: &Connection, source_filter: Option<&str>) -> Result<Vec<StoredChunk>> {
        let chunks = match source_filter {
            Some(source_id) => {
                let mut stmt =
                    conn.prepare(&format!("{} WHERE source_id = ?1 ORDER BY rowid", SELECT_CHUNKS))?;
                let rows = stmt.query_map(params![source_id], Self::row_to_chunk)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!("{} ORDER BY rowid", SELECT_CHUNKS))?;
                let rows = stmt.query_map([], Self::row_to_chunk)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(chunks)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn replace_source(&self, source_id: &str, chunks: &[StoredChunk]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute("DELETE FROM chunks WHERE source_id = ?1", params![source_id])?;

        for chunk in chunks {
            let metadata = serde_json::to_string(&chunk.chunk.metadata)?;
            tx.execute(
                r#"
                INSERT INTO chunks
                (id, source_id, source_title, content, start_seconds, end_seconds,
                 metadata, embedding, chunk_order, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    chunk.id.to_string(),
                    source_id,
                    chunk.source_title,
                    chunk.chunk.text,
                    chunk.chunk.start,
                    chunk.chunk.end,
                    metadata,
                    Self::embedding_to_bytes(&chunk.embedding),
                    chunk.chunk_order,
                    chunk.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!(
            "Replaced source {} ({} old chunks, {} new)",
            source_id,
            deleted,
            chunks.len()
        );
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn vector_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let chunks = Self::select_chunks(&conn, source_filter)?;
        let results = rank_by_similarity(chunks, query_embedding, limit);

        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn list_all(&self, source_filter: Option<&str>) -> Result<Vec<StoredChunk>> {
        let conn = self.lock()?;
        Self::select_chunks(&conn, source_filter)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source_id, source_title, COUNT(*) as chunk_count,
                   MAX(end_seconds) as total_duration, MAX(indexed_at) as indexed_at
            FROM chunks
            GROUP BY source_id
            ORDER BY indexed_at DESC, source_id
            "#,
        )?;

        let sources = stmt
            .query_map([], Self::row_to_source)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sources)
    }

    #[instrument(skip(self))]
    async fn get_source(&self, source_id: &str) -> Result<Option<IndexedSource>> {
        let conn = self.lock()?;

        let source = conn.query_row(
            r#"
            SELECT source_id, source_title, COUNT(*) as chunk_count,
                   MAX(end_seconds) as total_duration, MAX(indexed_at) as indexed_at
            FROM chunks
            WHERE source_id = ?1
            GROUP BY source_id
            "#,
            params![source_id],
            Self::row_to_source,
        );

        match source {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn delete_source(&self, source_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM chunks WHERE source_id = ?1", params![source_id])?;

        info!("Deleted {} chunks for source {}", deleted, source_id);
        Ok(deleted)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
