//! Index command handler.

use super::{print_json, Workspace};
use clap::Args;
use footprint_core::{config::AppConfig, AppResult};
use footprint_knowledge::embeddings::create_provider;
use footprint_knowledge::{DocumentStore, Indexer, VectorStore};
use std::time::Instant;

/// Embed new and changed documents
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Drop every stored vector and re-embed from scratch
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let start = Instant::now();
        let workspace = Workspace::open(config)?;
        let provider = create_provider(&workspace.index.embedding)?;

        if self.reset {
            tracing::info!("Resetting vector store");
            workspace.vectors.delete_all()?;
        }

        let documents = workspace.documents.all()?;
        let report = Indexer::new(provider, workspace.vectors.clone())
            .with_batch_size(workspace.index.embedding.batch_size)
            .with_retry(workspace.index.retry)
            .sync(&documents)
            .await?;

        if self.json {
            print_json(&report)?;
            return Ok(());
        }

        println!(
            "Indexed {} documents ({} unchanged, {} removed) in {:.2}s",
            report.indexed,
            report.unchanged,
            report.removed,
            start.elapsed().as_secs_f64()
        );

        if !report.is_clean() {
            println!(
                "{} documents could not be embedded and will be retried next run:",
                report.failed()
            );
            for failure in &report.failures {
                println!(
                    "  {} ({} documents): {}",
                    failure.source,
                    failure.ids.len(),
                    failure.error
                );
            }
        }

        Ok(())
    }
}
