//! Document indexing pipeline.
//!
//! Walks a documentation directory, splits each markdown file into
//! header-aware chunks, and hands them to the vector store. A malformed
//! document never aborts the rest of the corpus.

use crate::index::VectorStore;
use crate::splitter::chunk_document;
use crate::types::IndexStats;
use opsdesk_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

/// Indexes documentation directories into a vector store.
pub struct DocumentIndexer {
    store: Arc<dyn VectorStore>,
}

impl DocumentIndexer {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Index every `*.md` file under `dir`.
    ///
    /// Files that fail to read or chunk are logged and skipped. An empty or
    /// missing directory indexes zero chunks without raising.
    pub fn index_dir(&self, dir: &Path) -> AppResult<IndexStats> {
        if !dir.exists() {
            tracing::warn!("Documentation directory {:?} does not exist", dir);
            return Ok(IndexStats::default());
        }

        let mut stats = IndexStats::default();

        for entry in WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            match self.index_file(path) {
                Ok(chunk_count) => {
                    stats.documents_indexed += 1;
                    stats.chunks_indexed += chunk_count;
                }
                Err(e) => {
                    tracing::error!("Skipping document {:?}: {}", path, e);
                }
            }
        }

        tracing::info!(
            "Indexed {} documents ({} chunks)",
            stats.documents_indexed,
            stats.chunks_indexed
        );

        Ok(stats)
    }

    /// Index a single document, returning the number of chunks stored.
    pub fn index_file(&self, path: &Path) -> AppResult<u32> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AppError::Knowledge(format!("Invalid file name: {:?}", path)))?;
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AppError::Knowledge(format!("Invalid file name: {:?}", path)))?;

        let chunks = chunk_document(stem, filename, &path.to_string_lossy(), &content);
        self.store.add(&chunks)?;

        tracing::debug!("Indexed {:?}: {} chunks", path, chunks.len());
        Ok(chunks.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SqliteVectorStore;
    use tempfile::TempDir;

    fn indexer_with_store() -> (DocumentIndexer, Arc<SqliteVectorStore>) {
        let store = Arc::new(SqliteVectorStore::open_in_memory().unwrap());
        (DocumentIndexer::new(store.clone()), store)
    }

    #[test]
    fn indexes_markdown_files_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("guide.md"),
            "# Guide\n\n## Setup\n\nSteps.\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "not markdown").unwrap();

        let (indexer, store) = indexer_with_store();
        let stats = indexer.index_dir(dir.path()).unwrap();

        assert_eq!(stats.documents_indexed, 1);
        assert!(stats.chunks_indexed >= 1);
        assert_eq!(store.stats().unwrap().0, 1);
    }

    #[test]
    fn missing_directory_indexes_nothing() {
        let (indexer, _) = indexer_with_store();
        let stats = indexer
            .index_dir(Path::new("/definitely/not/a/real/dir"))
            .unwrap();
        assert_eq!(stats.documents_indexed, 0);
        assert_eq!(stats.chunks_indexed, 0);
    }

    #[test]
    fn empty_directory_indexes_nothing() {
        let dir = TempDir::new().unwrap();
        let (indexer, _) = indexer_with_store();
        let stats = indexer.index_dir(dir.path()).unwrap();
        assert_eq!(stats.chunks_indexed, 0);
    }

    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        // Invalid UTF-8 makes read_to_string fail for this file
        std::fs::write(dir.path().join("broken.md"), [0xFF, 0xFE, 0xFD]).unwrap();
        std::fs::write(dir.path().join("fine.md"), "# Fine\n\nContent.\n").unwrap();

        let (indexer, _) = indexer_with_store();
        let stats = indexer.index_dir(dir.path()).unwrap();

        assert_eq!(stats.documents_indexed, 1);
    }

    #[test]
    fn reindexing_produces_same_chunk_set() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("guide.md"),
            "# Guide\n\n## One\n\nA.\n\n## Two\n\nB.\n",
        )
        .unwrap();

        let (indexer, store) = indexer_with_store();
        indexer.index_dir(dir.path()).unwrap();
        let first = store.stats().unwrap();

        indexer.index_dir(dir.path()).unwrap();
        let second = store.stats().unwrap();

        assert_eq!(first, second);
    }
}
