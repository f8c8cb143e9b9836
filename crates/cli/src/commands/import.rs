//! Import command handler.

use super::{open_documents, print_json};
use clap::Args;
use footprint_core::{config::AppConfig, AppResult};
use footprint_knowledge::import_jsonl;
use std::path::PathBuf;

/// Import documents from a JSON Lines file
#[derive(Args, Debug)]
pub struct ImportCommand {
    /// File with one document record per line
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Importing documents from {:?}", self.file);

        let documents = import_jsonl(&self.file)?;
        let store = open_documents(config)?;
        let imported = store.upsert(&documents)?;
        let total = store.count()?;

        if self.json {
            print_json(&serde_json::json!({
                "imported": imported,
                "total": total,
            }))?;
        } else {
            println!("Imported {} documents ({} in store)", imported, total);
            println!("Run 'footprint index' to embed them.");
        }

        Ok(())
    }
}
