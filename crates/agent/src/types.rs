//! Agent-facing response types.

use opsdesk_store::QueryType;
use serde::{Deserialize, Serialize};

/// The response returned to callers of `process_query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The answer text, with the sources footer already removed
    pub answer: String,

    /// Sources the answer claims to have used, parsed from its footer
    pub sources: Vec<String>,

    /// Confidence in [0, 1]; policy responses carry fixed values
    pub confidence: f32,

    /// How the query was classified and answered
    pub query_type: QueryType,

    /// Id of the interaction log entry, when the log write succeeded
    pub log_id: Option<i64>,
}
