//! Retrieval core for a personal footprint.
//!
//! Documents gathered from profile hosts, feeds, uploaded files and social
//! accounts are embedded into a [`VectorStore`]. Questions are classified by
//! the keyword [`RetrievalPlanner`], matched by exact cosine search, and
//! turned into a small, source-diverse set of [`ContextFragment`]s that the
//! [`Assistant`] hands to a generator together with numbered citations.
//!
//! # Example
//! ```no_run
//! use footprint_knowledge::{
//!     make_plan, pick_context, IndexConfig, SqliteDocumentStore, SqliteVectorStore,
//! };
//! use footprint_knowledge::embeddings::{EmbeddingProvider, MockProvider};
//!
//! # async fn example() -> footprint_core::AppResult<()> {
//! let config = IndexConfig::default();
//! let vectors = SqliteVectorStore::open_in_memory(64)?;
//! let documents = SqliteDocumentStore::open_in_memory()?;
//! let embedder = MockProvider::new(64);
//!
//! let plan = make_plan("What rust projects do they maintain?");
//! let query = embedder.embed("What rust projects do they maintain?").await?;
//! let fragments = pick_context(&query, &vectors, &documents, &config.selection_options(&plan))?;
//! println!("{} fragments", fragments.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod documents;
pub mod embeddings;
pub mod indexer;
pub mod planner;
pub mod rag;
pub mod similarity;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::IndexConfig;
pub use context::{pick_context, truncate_chars, SelectionOptions, TRUNCATION_MARKER};
pub use documents::{import_jsonl, DocumentSet, DocumentStore, SqliteDocumentStore};
pub use indexer::{BatchFailure, IndexReport, Indexer};
pub use planner::{make_plan, Intent, Plan, PlannerPolicy, RetrievalPlanner};
pub use rag::{Assistant, Citation, RagAnswer, RagResponse};
pub use similarity::cosine_similarity;
pub use store::{SearchHit, SqliteVectorStore, VectorEntry, VectorStore};
pub use types::{ContextFragment, Document, SourceTag};
