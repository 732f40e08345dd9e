//! Error types for webhook delivery.

use thiserror::Error;

/// Errors that can occur while delivering a webhook.
///
/// None of these ever reach the workflow that triggered the dispatch; they
/// terminate in a log line inside the background delivery job. `Transport`
/// and `HttpStatus` drive the retry loop, `Signing` downgrades the request
/// to unsigned, `Serialization` aborts the job.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Network-level fault on a single attempt (connect, DNS, timeout).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered, but outside the 2xx range.
    #[error("endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// HMAC signature computation failed.
    #[error("signature computation failed: {0}")]
    Signing(String),

    /// Payload could not be serialized to JSON.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeliveryError {
    /// Whether another delivery attempt is worth making.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HttpStatus { .. })
    }
}
