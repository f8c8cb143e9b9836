//! Generation client crate for Footprint.
//!
//! Provides a provider-agnostic trait for turning a prompt into text (whole
//! or streamed), the Ollama implementation, and the bounded retry policy
//! shared by every network-facing collaborator.
//!
//! # Example
//! ```no_run
//! use footprint_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> footprint_core::AppResult<()> {
//! let client = create_client("ollama", None, None)?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;
pub mod types;

// Re-export main types
pub use client::{
    collect_stream, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
pub use factory::create_client;
pub use providers::OllamaClient;
pub use retry::{retry_async, RetryPolicy};
pub use types::ProviderType;
