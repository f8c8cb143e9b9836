//! Stats command handler.

use super::{print_json, Workspace};
use clap::Args;
use footprint_core::{config::AppConfig, AppResult};
use footprint_knowledge::{DocumentStore, SourceTag, VectorStore};
use serde::Serialize;

/// Show content and index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceCount {
    source: SourceTag,
    documents: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    documents: usize,
    vectors: usize,
    dimension: usize,
    embedding_provider: String,
    embedding_model: String,
    sources: Vec<SourceCount>,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let workspace = Workspace::open(config)?;

        let mut sources = Vec::new();
        for source in SourceTag::ALL {
            sources.push(SourceCount {
                source,
                documents: workspace.documents.find_by_source(source)?.len(),
            });
        }

        let stats = Stats {
            documents: workspace.documents.count()?,
            vectors: workspace.vectors.count()?,
            dimension: workspace.vectors.dimension(),
            embedding_provider: workspace.index.embedding.provider.clone(),
            embedding_model: workspace.index.embedding.model.clone(),
            sources,
        };

        if self.json {
            return print_json(&stats);
        }

        println!("Documents: {}", stats.documents);
        for entry in &stats.sources {
            println!("  {:<13} {}", entry.source.as_str(), entry.documents);
        }
        println!(
            "Vectors:   {} (D={}, {} / {})",
            stats.vectors, stats.dimension, stats.embedding_provider, stats.embedding_model
        );
        if stats.vectors < stats.documents {
            println!(
                "{} documents not yet indexed. Run 'footprint index'.",
                stats.documents - stats.vectors
            );
        }

        Ok(())
    }
}
