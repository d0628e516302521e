use axum::http::StatusCode;
use thiserror::Error;

use crate::core::validation::ValidationError;

/// Everything a summary request can fail with, mapped to a stable HTTP
/// status and a fixed public message. Persistence failures are absent on
/// purpose: they are absorbed by the orchestrator and never surfaced.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("{0}")]
    Validation(ValidationError),

    #[error("generation service credentials are not configured")]
    Configuration,

    #[error("generation call exceeded its deadline")]
    GenerationTimeout,

    #[error("generation service rate limit hit")]
    RateLimited,

    #[error("generation service returned no usable text")]
    EmptyGeneration,

    #[error("generation call failed: {0}")]
    GenerationFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SummarizeError {
    pub fn status(&self) -> StatusCode {
        match self {
            SummarizeError::Validation(_) => StatusCode::BAD_REQUEST,
            SummarizeError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            SummarizeError::GenerationTimeout => StatusCode::REQUEST_TIMEOUT,
            SummarizeError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SummarizeError::EmptyGeneration => StatusCode::INTERNAL_SERVER_ERROR,
            SummarizeError::GenerationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SummarizeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the caller. Fixed strings only: no dependency error
    /// text, credentials, or stack traces leave the process.
    pub fn public_message(&self) -> String {
        match self {
            SummarizeError::Validation(err) => err.message().to_string(),
            SummarizeError::Configuration => "Service configuration error".to_string(),
            SummarizeError::GenerationTimeout => {
                "Processing taking too long. Please try with shorter content.".to_string()
            }
            SummarizeError::RateLimited => {
                "Rate limit exceeded. Please try again in a moment.".to_string()
            }
            SummarizeError::EmptyGeneration => "Failed to generate summary".to_string(),
            SummarizeError::GenerationFailed(_) | SummarizeError::Internal(_) => {
                "Failed to process request".to_string()
            }
        }
    }
}

impl From<ValidationError> for SummarizeError {
    fn from(err: ValidationError) -> Self {
        SummarizeError::Validation(err)
    }
}

/// Classifies a generation-service failure from its HTTP status and message.
/// Rate-limit and timeout checks must run before the generic fallback: both
/// arrive as ordinary errors distinguished only by a status code or a
/// message substring.
pub fn classify_generation_failure(status: Option<u16>, message: &str) -> SummarizeError {
    if status == Some(429) {
        return SummarizeError::RateLimited;
    }
    let lowered = message.to_lowercase();
    if lowered.contains("timeout") || lowered.contains("timed out") {
        return SummarizeError::GenerationTimeout;
    }
    SummarizeError::GenerationFailed(message.to_string())
}

impl From<reqwest::Error> for SummarizeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return SummarizeError::GenerationTimeout;
        }
        let status = error.status().map(|s| s.as_u16());
        classify_generation_failure(status, &error.to_string())
    }
}
