//! Error types for the Skycast SDK
//!
//! A single crate-wide taxonomy: every fallible operation in the SDK returns
//! `Result<_, SdkError>`, and provider HTTP failures are mapped onto it so
//! callers can match on the class of failure rather than on transport details.

use thiserror::Error;

/// Errors that can occur anywhere in the SDK
#[derive(Debug, Error)]
pub enum SdkError {
    /// Bad caller arguments (blank city name, invalid configuration value)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested location is unknown to the geocoding provider,
    /// or a cache refresh targeted a key that is no longer stored
    #[error("Not found: {0}")]
    NotFound(String),

    /// The upstream API rejected the request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The API key is missing, invalid, or lacks the required subscription
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A daily or per-minute call quota was hit, locally or upstream
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Transient transport or upstream server failure
    #[error("Network error: {0}")]
    Network(String),

    /// The SDK instance was used after `destroy()`
    #[error("Illegal SDK state: {0}")]
    IllegalState(String),

    /// Anything unanticipated, with the original failure preserved as cause
    #[error("SDK error: {message}")]
    Unexpected {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SdkError {
    /// Wraps an unanticipated failure, preserving it as the error cause
    pub fn unexpected(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SdkError::Unexpected {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Whether retrying the same call later can reasonably succeed
    ///
    /// Rate-limit rejections clear once the window slides or the daily quota
    /// resets; network failures are transient by definition. Everything else
    /// needs a different input, different credentials, or a code fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SdkError::RateLimited(_) | SdkError::Network(_))
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(err: reqwest::Error) -> Self {
        SdkError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_and_network_are_retryable() {
        assert!(SdkError::RateLimited("per-minute quota".to_string()).is_retryable());
        assert!(SdkError::Network("connection reset".to_string()).is_retryable());
    }

    #[test]
    fn test_caller_errors_are_not_retryable() {
        assert!(!SdkError::InvalidInput("blank city".to_string()).is_retryable());
        assert!(!SdkError::NotFound("Atlantis".to_string()).is_retryable());
        assert!(!SdkError::Unauthorized("bad key".to_string()).is_retryable());
        assert!(!SdkError::IllegalState("destroyed".to_string()).is_retryable());
        assert!(!SdkError::BadRequest("missing lat".to_string()).is_retryable());
    }

    #[test]
    fn test_unexpected_preserves_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = SdkError::unexpected("failed to get weather", cause);

        let source = std::error::Error::source(&err).expect("cause should be preserved");
        assert!(source.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_display_includes_detail() {
        let err = SdkError::NotFound("City not found: Atlantis".to_string());
        assert!(err.to_string().contains("Atlantis"));
    }
}
