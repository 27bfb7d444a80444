//! History command handler.

use clap::Args;
use opsdesk_core::{config::AppConfig, AppResult};
use opsdesk_store::{db, InteractionLog};

/// Show recent interaction history
#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Filter by user identifier
    #[arg(short, long)]
    pub user: Option<String>,

    /// Maximum entries to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing history command");

        let log = InteractionLog::new(db::open(&config.db_path())?);
        let entries = log.get(self.limit, self.user.as_deref())?;

        if self.json {
            let json = serde_json::to_string_pretty(&entries)
                .map_err(|e| opsdesk_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No interactions logged yet.");
            return Ok(());
        }

        for entry in &entries {
            println!(
                "[{}] #{} ({}) {:.2}s",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.id,
                entry.query_type.as_str(),
                entry.processing_time_seconds,
            );
            println!("  Query: {}", truncate(&entry.query, 80));
            println!("  Answer: {}", truncate(&entry.response_text, 80));
            if !entry.sources.is_empty() {
                println!("  Sources: {}", entry.sources.join(", "));
            }
            if let Some(feedback) = &entry.feedback {
                println!(
                    "  Feedback: {}",
                    if feedback.helpful { "helpful" } else { "not helpful" }
                );
            }
            println!();
        }

        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
