//! Seed command handler.

use clap::Args;
use opsdesk_core::{config::AppConfig, AppResult};
use opsdesk_store::{db, RecordStore};
use std::path::PathBuf;

/// Load sample records from JSON files
#[derive(Args, Debug)]
pub struct SeedCommand {
    /// Directory holding employees.json, tickets.json, deployments.json
    pub data_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SeedCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing seed command from {:?}", self.data_dir);

        let records = RecordStore::new(db::open(&config.db_path())?);
        let (employees, tickets, deployments) = records.seed_from_dir(&self.data_dir)?;

        if self.json {
            let output = serde_json::json!({
                "employees": employees,
                "tickets": tickets,
                "deployments": deployments,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        } else {
            println!(
                "Loaded {} employees, {} tickets, {} deployments",
                employees, tickets, deployments
            );
        }

        Ok(())
    }
}
