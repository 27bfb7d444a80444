//! Documentation indexing and retrieval for OpsDesk.
//!
//! Splits markdown documentation into header-aware chunks, stores them in a
//! local vector index, and retrieves source-attributed context for queries.

pub mod embedding;
pub mod index;
pub mod indexer;
pub mod retriever;
pub mod splitter;
pub mod types;

// Re-export commonly used types
pub use index::{SqliteVectorStore, VectorStore};
pub use indexer::DocumentIndexer;
pub use retriever::{ContextRetriever, DEFAULT_TOP_K};
pub use types::{DocumentChunk, IndexStats, RetrievalResult};
