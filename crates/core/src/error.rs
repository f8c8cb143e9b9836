//! Error types for Footprint.
//!
//! This module defines a unified error enum that covers every error category
//! in the workspace: the structural retrieval errors (dimension mismatch,
//! unavailable store), collaborator failures (rate limiting, generic upstream
//! failures) and the plumbing categories (configuration, I/O, serialization).

use thiserror::Error;

/// Unified error type for Footprint.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Structural errors are never swallowed; "no results" is not an error.
#[derive(Error, Debug)]
pub enum AppError {
    /// A vector's length disagrees with the store dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Durable backing storage cannot be opened or has been closed.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The embedding or generation provider asked us to slow down.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Generic collaborator failure (network, parse, auth).
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors that are not worth retrying
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        AppError::DimensionMismatch { expected, actual }
    }

    /// Whether a caller-level retry makes sense for this error.
    ///
    /// Only collaborator failures qualify; structural errors always propagate.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::RateLimited(_) | AppError::UpstreamFailure(_))
    }

    /// Whether this error came from a rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::RateLimited(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
