//! Query command handler.

use clap::Args;
use opsdesk_core::{config::AppConfig, AppResult};

/// Ask a question through the full pipeline
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question to ask
    pub query: String,

    /// User identifier for conversation memory
    #[arg(short, long)]
    pub user: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command");

        let processor = super::build_processor(config)?;
        let response = processor
            .process_query(&self.query, self.user.as_deref())
            .await;

        if self.json {
            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| opsdesk_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", response.answer);
            if !response.sources.is_empty() {
                println!();
                println!("Sources: {}", response.sources.join(", "));
            }
            tracing::debug!(
                "query_type={}, confidence={:.1}, log_id={:?}",
                response.query_type.as_str(),
                response.confidence,
                response.log_id
            );
        }

        Ok(())
    }
}
