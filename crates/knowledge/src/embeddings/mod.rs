//! Embedding providers.
//!
//! The retrieval core treats embedding as `embed(texts) -> vectors`; this
//! module holds that contract, the factory and the concrete providers.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, embed_with_retry, EmbeddingProvider};
pub use providers::{MockProvider, OllamaProvider};
