//! The reasoning service boundary.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Failure of one reasoning service call, classified for the retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service asked us to slow down, optionally saying for how long.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Timeouts, connection failures, 5xx, malformed responses. Worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Bad credentials, bad request. Retrying will not help.
    #[error("fatal failure: {0}")]
    Fatal(String),
}

/// Binary image sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// One prompt, with an optional image for judgment calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningRequest {
    pub prompt: String,
    pub image: Option<ImageAttachment>,
}

impl ReasoningRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImageAttachment) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// A text-completion backend. Returns the raw response text.
pub trait ReasoningService {
    fn complete(
        &self,
        request: &ReasoningRequest,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display() {
        let err = ServiceError::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(err.to_string(), "rate limited (retry after Some(7s))");
        assert_eq!(
            ServiceError::Fatal("401".into()).to_string(),
            "fatal failure: 401"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServiceError>();
    }
}
