//! SQLite-backed vector store for documentation chunks.
//!
//! The store owns the idempotence contract: chunk ids are deterministic and
//! writes go through `INSERT OR REPLACE`, so re-indexing the same corpus
//! replaces rather than duplicates.

use crate::embedding::TrigramEmbedder;
use crate::types::{DocumentChunk, RetrievalResult};
use opsdesk_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Trait for vector search backends.
///
/// The exact similarity metric and embedding model are the backend's
/// concern; callers only rely on `query` returning the nearest chunks with
/// a distance score (lower is closer).
pub trait VectorStore: Send + Sync {
    /// Insert or update chunks by id.
    fn add(&self, chunks: &[DocumentChunk]) -> AppResult<()>;

    /// Return the `top_k` chunks nearest to the query text.
    fn query(&self, text: &str, top_k: usize) -> AppResult<Vec<RetrievalResult>>;

    /// Get (documents, chunks) counts.
    fn stats(&self) -> AppResult<(u32, u32)>;

    /// Remove all indexed chunks.
    fn reset(&self) -> AppResult<()>;
}

/// SQLite implementation with cosine ranking over trigram embeddings.
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
    embedder: TrigramEmbedder,
}

impl SqliteVectorStore {
    /// Open (or create) the index database at the given path.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open index: {}", e)))?;

        Self::with_connection(conn)
    }

    /// Open an in-memory index (tests).
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Knowledge(format!("Failed to open in-memory index: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                filename TEXT NOT NULL,
                content TEXT NOT NULL,
                source_path TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_filename ON chunks(filename);
            "#,
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create index tables: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder: TrigramEmbedder::default(),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("Index connection poisoned".to_string()))
    }
}

impl VectorStore for SqliteVectorStore {
    fn add(&self, chunks: &[DocumentChunk]) -> AppResult<()> {
        let guard = self.lock()?;

        for chunk in chunks {
            let embedding = self.embedder.embed(&chunk.content);
            guard
                .execute(
                    "INSERT OR REPLACE INTO chunks (id, title, filename, content, source_path, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        chunk.id,
                        chunk.title,
                        chunk.filename,
                        chunk.content,
                        chunk.source_path,
                        embedding_to_bytes(&embedding),
                    ],
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;
        }

        tracing::debug!("Indexed {} chunks", chunks.len());
        Ok(())
    }

    fn query(&self, text: &str, top_k: usize) -> AppResult<Vec<RetrievalResult>> {
        let query_embedding = self.embedder.embed(text);
        let guard = self.lock()?;

        let mut stmt = guard
            .prepare("SELECT content, filename, title, embedding FROM chunks")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let embedding_bytes: Vec<u8> = row.get(3)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    embedding_bytes,
                ))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

        let mut results: Vec<RetrievalResult> = Vec::new();
        for row in rows {
            let (content, filename, title, embedding_bytes) =
                row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk: {}", e)))?;
            let embedding = bytes_to_embedding(&embedding_bytes)?;
            let score = cosine_similarity(&query_embedding, &embedding);
            results.push(RetrievalResult {
                content,
                filename,
                title,
                distance: 1.0 - score,
            });
        }

        // Nearest first
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        tracing::debug!("Retrieved {} chunks (requested top-{})", results.len(), top_k);
        Ok(results)
    }

    fn stats(&self) -> AppResult<(u32, u32)> {
        let guard = self.lock()?;

        let documents: u32 = guard
            .query_row("SELECT COUNT(DISTINCT filename) FROM chunks", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to count documents: {}", e)))?;

        let chunks: u32 = guard
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to count chunks: {}", e)))?;

        Ok((documents, chunks))
    }

    fn reset(&self) -> AppResult<()> {
        let guard = self.lock()?;
        guard
            .execute("DELETE FROM chunks", [])
            .map_err(|e| AppError::Knowledge(format!("Failed to reset index: {}", e)))?;
        tracing::info!("Reset documentation index");
        Ok(())
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}

/// Cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
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
