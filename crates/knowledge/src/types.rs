//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};

/// A retrievable unit of documentation text, the atom of vector search.
///
/// Immutable once indexed; re-indexing replaces by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Deterministic identifier: `"{stem}_{sequence}"`
    pub id: String,

    /// Document title (first top-level header, else the filename stem)
    pub title: String,

    /// Source filename (e.g., "escalation_policy.md")
    pub filename: String,

    /// Chunk text, enriched with its nearest top-level header context
    pub content: String,

    /// Full path of the source document
    pub source_path: String,
}

/// One search hit, produced per query and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub content: String,
    pub filename: String,
    pub title: String,
    /// Distance to the query (lower is closer)
    pub distance: f32,
}

/// Statistics from an indexing run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents_indexed: u32,
    pub chunks_indexed: u32,
}
