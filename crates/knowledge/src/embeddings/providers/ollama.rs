//! Ollama embedding provider.
//!
//! Uses the batch `/api/embed` endpoint, so one HTTP call embeds a whole
//! batch. No request is made until the first embed call.

use crate::embeddings::provider::EmbeddingProvider;
use footprint_core::{AppError, AppResult};
use footprint_llm::providers::ollama::DEFAULT_OLLAMA_URL;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const EMBED_ENDPOINT: &str = "/api/embed";

/// Applied when the settings give no timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    /// Build a provider for `model` returning `dimensions`-long vectors.
    pub fn new(
        model: &str,
        dimensions: usize,
        endpoint: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .map_err(|e| {
                AppError::Config(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: endpoint
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            dimensions,
        })
    }
}

/// 429 is a rate limit; every other failure is a generic upstream failure.
fn classify_status(status: StatusCode, body: &str) -> AppError {
    let message = format!("Ollama embed error ({}): {}", status, body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS {
        AppError::RateLimited(message)
    } else {
        AppError::UpstreamFailure(message)
    }
}

/// Check a response body against the request: one vector per input, each of
/// the configured length.
fn parse_embeddings(body: &str, expected: usize, dimensions: usize) -> AppResult<Vec<Vec<f32>>> {
    let response: EmbedResponse = serde_json::from_str(body).map_err(|e| {
        AppError::UpstreamFailure(format!("Failed to parse Ollama embed response: {}", e))
    })?;

    if response.embeddings.len() != expected {
        return Err(AppError::UpstreamFailure(format!(
            "Ollama returned {} embeddings for {} inputs",
            response.embeddings.len(),
            expected
        )));
    }

    if let Some(bad) = response.embeddings.iter().find(|v| v.len() != dimensions) {
        return Err(AppError::dimension_mismatch(dimensions, bad.len()));
    }

    Ok(response.embeddings)
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        debug!("Sending embed request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Failed to reach Ollama: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::UpstreamFailure(format!("Failed to read Ollama response: {}", e))
        })?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        parse_embeddings(&body, texts.len(), self.dimensions)
    }
}
