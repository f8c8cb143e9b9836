//! Concrete generation providers and shared HTTP error mapping.

pub mod ollama;

pub use ollama::OllamaClient;

use footprint_core::AppError;
use reqwest::StatusCode;

/// Map a non-success HTTP status from a provider into the error taxonomy.
///
/// 429 becomes `RateLimited`, server errors and timeouts become
/// `UpstreamFailure`, anything else is a non-retryable `Llm` error.
pub fn status_error(provider: &str, status: StatusCode, body: &str) -> AppError {
    let message = format!("{} API error ({}): {}", provider, status, body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS {
        AppError::RateLimited(message)
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        AppError::UpstreamFailure(message)
    } else {
        AppError::Llm(message)
    }
}

/// Map a transport-level failure (connect, timeout, body read).
pub fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    AppError::UpstreamFailure(format!("Failed to reach {}: {}", provider, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_classification() {
        assert!(matches!(
            status_error("ollama", StatusCode::TOO_MANY_REQUESTS, "busy"),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            status_error("ollama", StatusCode::BAD_GATEWAY, ""),
            AppError::UpstreamFailure(_)
        ));
        assert!(matches!(
            status_error("ollama", StatusCode::NOT_FOUND, "model not found"),
            AppError::Llm(_)
        ));
    }
}
