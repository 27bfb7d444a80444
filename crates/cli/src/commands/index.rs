//! Index command handler.

use clap::Args;
use opsdesk_core::{config::AppConfig, AppResult};
use opsdesk_knowledge::{DocumentIndexer, SqliteVectorStore, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Index a documentation directory for retrieval
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Directory of markdown documentation
    pub dir: PathBuf,

    /// Clear the index before indexing
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command for {:?}", self.dir);

        let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::open(&config.index_path())?);

        if self.reset {
            store.reset()?;
        }

        let indexer = DocumentIndexer::new(store);
        let stats = indexer.index_dir(&self.dir)?;

        if self.json {
            let output = serde_json::json!({
                "documentsIndexed": stats.documents_indexed,
                "chunksIndexed": stats.chunks_indexed,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        } else {
            println!(
                "Indexed {} documents ({} chunks)",
                stats.documents_indexed, stats.chunks_indexed
            );
        }

        Ok(())
    }
}
