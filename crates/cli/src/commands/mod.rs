//! Command handlers for the OpsDesk CLI.

mod feedback;
mod history;
mod index;
mod query;
mod seed;
mod stats;

pub use feedback::FeedbackCommand;
pub use history::HistoryCommand;
pub use index::IndexCommand;
pub use query::QueryCommand;
pub use seed::SeedCommand;
pub use stats::StatsCommand;

use opsdesk_agent::{ConversationMemory, IntentGate, QueryProcessor, ToolExecutor};
use opsdesk_core::{config::AppConfig, AppResult};
use opsdesk_knowledge::{ContextRetriever, SqliteVectorStore, VectorStore};
use opsdesk_llm::create_client;
use opsdesk_store::{db, InteractionLog, RecordStore};
use std::sync::Arc;

/// Construct the full component graph for query processing.
///
/// Each component is built once here and handed to the processor by handle;
/// there are no ambient singletons. A provider that cannot be created (for
/// example, a missing API key) degrades to no client: the gate fails open
/// and answers become the fixed degraded responses.
pub(crate) fn build_processor(config: &AppConfig) -> AppResult<QueryProcessor> {
    let conn = db::open(&config.db_path())?;
    let records = RecordStore::new(conn.clone());
    let log = InteractionLog::new(conn);

    let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::open(&config.index_path())?);
    let retriever = ContextRetriever::new(store);
    let memory = ConversationMemory::new(log.clone());

    let api_key = config.resolve_api_key(&config.provider);
    let endpoint = config.resolve_endpoint(&config.provider);
    let client = match create_client(&config.provider, endpoint.as_deref(), api_key.as_deref()) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!("LLM provider unavailable ({}); responses will be degraded", e);
            None
        }
    };

    let gate = IntentGate::new(client.clone(), &config.model);

    Ok(QueryProcessor::new(
        client,
        &config.model,
        retriever,
        memory,
        gate,
        ToolExecutor::new(records),
        log,
    ))
}
