//! Stats command handler.

use clap::Args;
use opsdesk_core::{config::AppConfig, AppResult};
use opsdesk_store::{db, InteractionLog};

/// Show conversation statistics for a user
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// User identifier
    #[arg(short, long, default_value = "default")]
    pub user: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command for user '{}'", self.user);

        let log = InteractionLog::new(db::open(&config.db_path())?);
        let stats = log.stats_for_user(&self.user)?;

        if self.json {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| opsdesk_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("Conversations for '{}':", self.user);
        println!("  Total: {}", stats.total_conversations);
        println!("  Last 24h: {}", stats.recent_conversations_24h);

        if !stats.query_type_distribution.is_empty() {
            println!("  By query type:");
            let mut kinds: Vec<_> = stats.query_type_distribution.iter().collect();
            kinds.sort_by(|a, b| b.1.cmp(a.1));
            for (kind, count) in kinds {
                println!("    {}: {}", kind, count);
            }
        }

        Ok(())
    }
}
