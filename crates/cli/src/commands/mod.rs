//! Command handlers for the Footprint CLI.
//!
//! This module organizes all CLI commands into separate submodules, plus the
//! store and collaborator setup they share.

pub mod ask;
pub mod import;
pub mod index;
pub mod plan;
pub mod stats;

pub use ask::AskCommand;
pub use import::ImportCommand;
pub use index::IndexCommand;
pub use plan::PlanCommand;
pub use stats::StatsCommand;

use footprint_core::{config::AppConfig, AppResult};
use footprint_knowledge::config::{documents_path, vectors_path};
use footprint_knowledge::{IndexConfig, SqliteDocumentStore, SqliteVectorStore};
use serde::Serialize;
use std::sync::Arc;

/// The workspace's index config and both stores.
pub struct Workspace {
    pub index: IndexConfig,
    pub documents: Arc<SqliteDocumentStore>,
    pub vectors: Arc<SqliteVectorStore>,
}

impl Workspace {
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let index = IndexConfig::load(&config.workspace)?;
        let documents = Arc::new(open_documents(config)?);
        let vectors = Arc::new(SqliteVectorStore::open(
            &vectors_path(&config.workspace),
            index.embedding.dimensions,
        )?);

        Ok(Self {
            index,
            documents,
            vectors,
        })
    }
}

pub fn open_documents(config: &AppConfig) -> AppResult<SqliteDocumentStore> {
    SqliteDocumentStore::open(&documents_path(&config.workspace))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
