//! Signed, retrying webhook delivery for issue state changes.
//!
//! This crate notifies an external HTTP endpoint whenever an issue is
//! created or transitioned. Delivery is fire-and-forget: the dispatcher
//! serializes the event into a JSON payload, signs it with HMAC-SHA256 when
//! a secret is configured, and hands it to a background task that retries
//! transient failures with backoff. The workflow that triggered the event
//! never blocks on delivery and never observes a delivery failure.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use issue_hooks::{EnvConfigSource, IssueChangeEvent, WebhookDispatcher};
//!
//! # async fn example() {
//! let dispatcher = WebhookDispatcher::new(Arc::new(EnvConfigSource));
//!
//! let mut event = IssueChangeEvent::new("ABC-1");
//! event.severity = Some("MAJOR".to_string());
//!
//! // Returns immediately; delivery happens on a background task.
//! dispatcher.dispatch(&event, "created", "my-project", "My Project");
//! # }
//! ```
//!
//! # Configuration
//!
//! Settings are read fresh from the injected [`ConfigSource`] on every
//! dispatch:
//!
//! - `webhook.enabled`: master switch (default `false`)
//! - `webhook.url`: target endpoint; blank disables delivery
//! - `webhook.secret`: shared secret for the `X-Hub-Signature-256` header
//! - `webhook.timeoutMillis`: per-attempt connect/read timeout (default 10000)
//! - `webhook.retryCount`: retries after the first attempt (default 3)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod payload;
pub mod retry;
pub mod signature;
pub mod transport;

pub use config::{ConfigSource, EnvConfigSource, StaticConfigSource, WebhookConfig};
pub use error::DeliveryError;
pub use events::{IssueChangeEvent, IssueType};
pub use payload::WebhookPayload;
pub use retry::{DeliveryOutcome, RetryScheduler};
pub use transport::{HttpTransport, WebhookTransport};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Public entry point for webhook delivery.
///
/// Built with explicit references to a configuration source and a transport;
/// there is no ambient lookup. Dropping the dispatcher does not stop
/// in-flight deliveries — call [`WebhookDispatcher::shutdown`] to abort
/// their backoff waits.
pub struct WebhookDispatcher {
    config: Arc<dyn ConfigSource>,
    transport: Arc<dyn WebhookTransport>,
    scheduler: RetryScheduler,
    shutdown: CancellationToken,
}

impl WebhookDispatcher {
    /// Create a dispatcher delivering over HTTP.
    #[must_use]
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Create a dispatcher with a specific transport.
    #[must_use]
    pub fn with_transport(
        config: Arc<dyn ConfigSource>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        Self {
            config,
            transport,
            scheduler: RetryScheduler::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replace the retry scheduler, mainly to shorten backoff in tests.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: RetryScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Send a webhook for an issue change (fire-and-forget).
    ///
    /// Reads the configuration fresh, and returns immediately without
    /// spawning anything when webhooks are disabled or no URL is set.
    /// Otherwise the delivery runs on a spawned task; every fault inside it
    /// is caught and logged, never propagated. Must be called within a
    /// Tokio runtime.
    pub fn dispatch(
        &self,
        event: &IssueChangeEvent,
        action: &str,
        project_key: &str,
        project_name: &str,
    ) {
        let Some(job) = self.prepare(event, action, project_key, project_name) else {
            return;
        };

        tokio::spawn(async move {
            job.run().await;
        });
    }

    /// Deliver inline and report the outcome.
    ///
    /// Same behavior as [`dispatch`](Self::dispatch), but awaits the
    /// delivery and returns its outcome. Returns `None` when the gate
    /// checks skip delivery. Useful for tests and for callers that need
    /// delivery confirmation.
    pub async fn dispatch_and_wait(
        &self,
        event: &IssueChangeEvent,
        action: &str,
        project_key: &str,
        project_name: &str,
    ) -> Option<DeliveryOutcome> {
        let job = self.prepare(event, action, project_key, project_name)?;
        Some(job.run().await)
    }

    /// Signal shutdown: in-flight backoff waits abort promptly and their
    /// deliveries finish as failures. An HTTP attempt already on the wire
    /// runs to its own timeout.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Gate checks plus payload construction; `None` means no delivery.
    fn prepare(
        &self,
        event: &IssueChangeEvent,
        action: &str,
        project_key: &str,
        project_name: &str,
    ) -> Option<DeliveryJob> {
        let config = WebhookConfig::from_source(self.config.as_ref());
        let Some(url) = config.delivery_target() else {
            debug!(issue = %event.key, "Issue webhooks disabled or unconfigured");
            return None;
        };

        Some(DeliveryJob {
            url: url.to_string(),
            secret: config.signing_secret().map(str::to_string),
            timeout: config.timeout,
            max_retries: config.max_retries,
            payload: WebhookPayload::build(event, action, project_key, project_name),
            transport: Arc::clone(&self.transport),
            scheduler: self.scheduler.clone(),
            cancel: self.shutdown.clone(),
        })
    }
}

/// One delivery, owning everything it needs.
///
/// Carries an immutable snapshot of the configuration taken at dispatch
/// time, so setting changes never affect an already-started delivery.
struct DeliveryJob {
    url: String,
    secret: Option<String>,
    timeout: Duration,
    max_retries: u32,
    payload: WebhookPayload,
    transport: Arc<dyn WebhookTransport>,
    scheduler: RetryScheduler,
    cancel: CancellationToken,
}

impl DeliveryJob {
    /// Serialize, sign, deliver. All faults terminate in a log line here.
    async fn run(self) -> DeliveryOutcome {
        let issue_key = self.payload.issue.key.clone();

        // Serialized once; the same bytes are signed and retried verbatim.
        let body = match serde_json::to_vec(&self.payload) {
            Ok(body) => body,
            Err(e) => {
                error!(
                    issue = %issue_key,
                    error = %e,
                    "Dropping webhook delivery, payload not serializable"
                );
                return DeliveryOutcome {
                    success: false,
                    attempts_made: 0,
                };
            }
        };

        // Signing is best-effort: a failure downgrades to unsigned delivery.
        let signature = self.secret.as_deref().and_then(|secret| {
            match signature::sign(&body, secret) {
                Ok(signature) => Some(signature),
                Err(e) => {
                    warn!(issue = %issue_key, error = %e, "Sending webhook unsigned");
                    None
                }
            }
        });

        debug!(issue = %issue_key, url = %self.url, "Delivering issue webhook");

        self.scheduler
            .deliver(
                self.transport.as_ref(),
                &self.url,
                &body,
                signature.as_deref(),
                self.timeout,
                self.max_retries,
                &self.cancel,
            )
            .await
    }
}
