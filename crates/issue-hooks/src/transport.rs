//! HTTP transport for single delivery attempts.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::DeliveryError;

/// Fixed User-Agent sent on every request.
const USER_AGENT: &str = concat!("issue-hooks/", env!("CARGO_PKG_VERSION"));

/// Header carrying the payload signature, GitHub-style.
const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// A single-attempt webhook sender.
///
/// Implementations perform exactly one POST; retrying is the scheduler's
/// concern.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POST `body` to `url`, with connect and read timeouts both set to
    /// `timeout`.
    ///
    /// `Ok(())` means the endpoint answered with a 2xx status. Any other
    /// status is `DeliveryError::HttpStatus`; network faults (connect, DNS,
    /// timeout) are `DeliveryError::Transport`. Both drive a retry.
    async fn post(
        &self,
        url: &str,
        body: &[u8],
        signature: Option<&str>,
        timeout: Duration,
    ) -> Result<(), DeliveryError>;
}

/// `reqwest`-backed transport.
///
/// A fresh client is built per attempt: each delivery owns its own
/// connection, so concurrent dispatches share no in-flight state.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: &[u8],
        signature: Option<&str>,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        let mut request = client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT);

        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, format!("sha256={signature}"));
        }

        let response = request.body(body.to_vec()).send().await?;
        let status = response.status();

        // Drain the body for the debug log; it is never parsed.
        let response_body = response.text().await.unwrap_or_default();
        debug!(status = %status, body = %response_body, "Webhook response");

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::HttpStatus {
                status: status.as_u16(),
            })
        }
    }
}
