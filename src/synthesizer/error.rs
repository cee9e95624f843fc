//! Synthesizer error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while calling the external synthesizer
///
/// Every variant is recovered locally by the step generator's
/// deterministic fallback; none of them reach the capture caller.
#[derive(Debug, Error)]
pub enum SynthesizerError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SynthesizerError {
    /// Check if this error is retryable within the client's own budget
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthesizerError::RateLimited { .. } => true,
            SynthesizerError::ApiError { status, .. } => *status >= 500,
            SynthesizerError::Network(_) => true,
            SynthesizerError::Timeout(_) => true,
            SynthesizerError::MalformedOutput(_) => false,
            SynthesizerError::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(
            SynthesizerError::RateLimited {
                retry_after: Duration::from_secs(30)
            }
            .is_retryable()
        );

        assert!(
            SynthesizerError::ApiError {
                status: 503,
                message: "overloaded".to_string()
            }
            .is_retryable()
        );

        assert!(
            !SynthesizerError::ApiError {
                status: 400,
                message: "bad request".to_string()
            }
            .is_retryable()
        );

        assert!(SynthesizerError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!SynthesizerError::MalformedOutput("no steps".to_string()).is_retryable());
    }
}
