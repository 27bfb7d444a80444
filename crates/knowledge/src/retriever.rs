//! Context retrieval and formatting for LLM consumption.

use crate::index::VectorStore;
use crate::types::RetrievalResult;
use opsdesk_core::AppResult;
use std::sync::Arc;

/// Default number of chunks to retrieve per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Maximum characters of chunk content included per context block.
const MAX_BLOCK_CHARS: usize = 500;

/// Retrieves relevant documentation chunks for a query.
pub struct ContextRetriever {
    store: Arc<dyn VectorStore>,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Search for the chunks most relevant to `query`.
    ///
    /// An empty corpus returns no results, which is not an error.
    pub fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievalResult>> {
        let results = self.store.query(query, top_k)?;
        tracing::debug!("Retrieved {} chunks for query", results.len());
        Ok(results)
    }

    /// Retrieve and format context with the default depth.
    ///
    /// Returns an empty string when there is nothing to retrieve; callers
    /// treat that as "omit the context block".
    pub fn context_for(&self, query: &str) -> AppResult<String> {
        let results = self.search(query, DEFAULT_TOP_K)?;
        Ok(format_context(&results))
    }
}

/// Format retrieval results as source-attributed blocks for the LLM.
pub fn format_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(|result| {
            format!(
                "[Source: {}]\n{}",
                result.filename,
                truncate(&result.content, MAX_BLOCK_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Truncate to at most `max_chars` characters, ellipsis-suffixed.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
