//! Embedding provider trait and factory.

use crate::config::EmbeddingSettings;
use footprint_core::{AppError, AppResult};
use footprint_llm::{retry_async, RetryPolicy};
use std::sync::Arc;

/// Turns text into fixed-length vectors.
///
/// `embed_batch` returns one vector per input, in input order. Rate limits
/// surface as `AppError::RateLimited` so callers can back off.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g., "mock", "ollama")
    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;

    /// Length of every vector this provider returns
    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::UpstreamFailure("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from the index settings.
pub fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "mock" => Ok(Arc::new(super::providers::MockProvider::new(
            settings.dimensions,
        ))),

        "ollama" => {
            let provider = super::providers::OllamaProvider::new(
                &settings.model,
                settings.dimensions,
                settings.endpoint.as_deref(),
                settings.timeout_secs,
            )?;
            Ok(Arc::new(provider))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: mock, ollama",
            other
        ))),
    }
}

/// Embed a batch under the retry policy.
pub async fn embed_with_retry(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    policy: RetryPolicy,
) -> AppResult<Vec<Vec<f32>>> {
    retry_async(policy, "embedding batch", move || provider.embed_batch(texts)).await
}
