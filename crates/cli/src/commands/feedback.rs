//! Feedback command handler.

use clap::Args;
use opsdesk_core::{config::AppConfig, AppError, AppResult};
use opsdesk_store::{db, InteractionLog};

/// Attach feedback to a logged interaction
#[derive(Args, Debug)]
pub struct FeedbackCommand {
    /// Log entry id (printed by `query --json` and `history`)
    pub log_id: i64,

    /// Mark the response as helpful
    #[arg(long)]
    pub helpful: bool,

    /// Mark the response as not helpful
    #[arg(long, conflicts_with = "helpful")]
    pub not_helpful: bool,

    /// Optional free-text comment
    #[arg(long)]
    pub comment: Option<String>,
}

impl FeedbackCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing feedback command for log entry {}", self.log_id);

        if !self.helpful && !self.not_helpful {
            return Err(AppError::Config(
                "Pass either --helpful or --not-helpful".to_string(),
            ));
        }

        let log = InteractionLog::new(db::open(&config.db_path())?);
        let updated = log.set_feedback(self.log_id, self.helpful, self.comment.as_deref())?;

        if updated {
            println!("Feedback recorded for log entry {}", self.log_id);
        } else {
            println!("No log entry with id {}", self.log_id);
        }

        Ok(())
    }
}
