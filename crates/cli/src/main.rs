//! OpsDesk CLI
//!
//! Main entry point for the opsdesk command-line tool.
//! Answers questions about internal data and documentation through the
//! query pipeline, and manages the documentation index, sample records,
//! interaction history, and feedback.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    FeedbackCommand, HistoryCommand, IndexCommand, QueryCommand, SeedCommand, StatsCommand,
};
use opsdesk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// OpsDesk CLI - internal-data question answering
#[derive(Parser, Debug)]
#[command(name = "opsdesk")]
#[command(about = "Ask questions about internal data and documentation", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "OPSDESK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "OPSDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (openai, ollama, mock)
    #[arg(short, long, global = true, env = "OPSDESK_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "OPSDESK_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question through the full pipeline
    Query(QueryCommand),

    /// Index a documentation directory for retrieval
    Index(IndexCommand),

    /// Show recent interaction history
    History(HistoryCommand),

    /// Show conversation statistics for a user
    Stats(StatsCommand),

    /// Attach feedback to a logged interaction
    Feedback(FeedbackCommand),

    /// Load sample records from JSON files
    Seed(SeedCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("OpsDesk CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;
    config.ensure_opsdesk_dir()?;

    let command_name = match &cli.command {
        Commands::Query(_) => "query",
        Commands::Index(_) => "index",
        Commands::History(_) => "history",
        Commands::Stats(_) => "stats",
        Commands::Feedback(_) => "feedback",
        Commands::Seed(_) => "seed",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config),
        Commands::History(cmd) => cmd.execute(&config),
        Commands::Stats(cmd) => cmd.execute(&config),
        Commands::Feedback(cmd) => cmd.execute(&config),
        Commands::Seed(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
