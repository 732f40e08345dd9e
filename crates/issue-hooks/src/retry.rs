//! Bounded retry with backoff around the transport.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::transport::WebhookTransport;

/// Delay multiplier base between attempts: attempt `n` (0-indexed) waits
/// `1000ms * (n + 1)` before the next try.
const BACKOFF_BASE: Duration = Duration::from_millis(1000);

/// Result of a full retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub success: bool,
    /// Total attempts performed, including the first try.
    pub attempts_made: u32,
}

/// Drives the transport until success, exhaustion, or cancellation.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    backoff_base: Duration,
}

impl Default for RetryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryScheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            backoff_base: BACKOFF_BASE,
        }
    }

    /// Override the backoff base, mainly to keep tests fast.
    #[must_use]
    pub const fn with_backoff_base(backoff_base: Duration) -> Self {
        Self { backoff_base }
    }

    /// Deliver `body` to `url`, making up to `max_retries + 1` attempts.
    ///
    /// Attempt 0 is the first try, not a retry. Failed attempts wait
    /// `backoff_base * (n + 1)` before the next one; the wait races against
    /// `cancel`, and cancellation stops the loop immediately, reporting the
    /// attempts made so far. Every attempt's outcome is logged with its
    /// attempt number; nothing is propagated to the caller beyond the
    /// outcome.
    pub async fn deliver(
        &self,
        transport: &dyn WebhookTransport,
        url: &str,
        body: &[u8],
        signature: Option<&str>,
        timeout: Duration,
        max_retries: u32,
        cancel: &CancellationToken,
    ) -> DeliveryOutcome {
        for attempt in 0..=max_retries {
            match transport.post(url, body, signature, timeout).await {
                Ok(()) => {
                    debug!(url, attempt = attempt + 1, "Webhook delivered");
                    return DeliveryOutcome {
                        success: true,
                        attempts_made: attempt + 1,
                    };
                }
                Err(e) => {
                    warn!(
                        url,
                        attempt = attempt + 1,
                        error = %e,
                        "Webhook delivery attempt failed"
                    );
                }
            }

            if attempt < max_retries {
                let backoff = self.backoff_base * (attempt + 1);
                tokio::select! {
                    () = cancel.cancelled() => {
                        warn!(
                            url,
                            attempts = attempt + 1,
                            "Webhook delivery cancelled during backoff"
                        );
                        return DeliveryOutcome {
                            success: false,
                            attempts_made: attempt + 1,
                        };
                    }
                    () = tokio::time::sleep(backoff) => {}
                }
            }
        }

        error!(
            url,
            attempts = max_retries + 1,
            "Webhook delivery failed, retries exhausted"
        );
        DeliveryOutcome {
            success: false,
            attempts_made: max_retries + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then succeeds.
    struct ScriptedTransport {
        failures: u32,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn failing_forever() -> Self {
            Self {
                failures: u32::MAX,
                calls: AtomicU32::new(0),
            }
        }

        fn succeeding_after(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WebhookTransport for ScriptedTransport {
        async fn post(
            &self,
            _url: &str,
            _body: &[u8],
            _signature: Option<&str>,
            _timeout: Duration,
        ) -> Result<(), DeliveryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(DeliveryError::HttpStatus { status: 500 })
            } else {
                Ok(())
            }
        }
    }

    fn fast_scheduler() -> RetryScheduler {
        RetryScheduler::with_backoff_base(Duration::from_millis(1))
    }

    async fn run(
        scheduler: &RetryScheduler,
        transport: &ScriptedTransport,
        max_retries: u32,
        cancel: &CancellationToken,
    ) -> DeliveryOutcome {
        scheduler
            .deliver(
                transport,
                "https://hooks.example/x",
                b"{}",
                None,
                Duration::from_millis(100),
                max_retries,
                cancel,
            )
            .await
    }

    #[tokio::test]
    async fn permanent_failure_makes_exactly_max_retries_plus_one_attempts() {
        let transport = ScriptedTransport::failing_forever();
        let outcome = run(&fast_scheduler(), &transport, 3, &CancellationToken::new()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.attempts_made, 4);
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn zero_retries_means_a_single_attempt() {
        let transport = ScriptedTransport::failing_forever();
        let outcome = run(&fast_scheduler(), &transport, 0, &CancellationToken::new()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn success_on_third_attempt_stops_the_loop() {
        let transport = ScriptedTransport::succeeding_after(2);
        let outcome = run(&fast_scheduler(), &transport, 5, &CancellationToken::new()).await;

        assert!(outcome.success);
        assert_eq!(outcome.attempts_made, 3);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn immediate_success_makes_one_attempt() {
        let transport = ScriptedTransport::succeeding_after(0);
        let outcome = run(&fast_scheduler(), &transport, 3, &CancellationToken::new()).await;

        assert!(outcome.success);
        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn cancellation_aborts_the_backoff_wait() {
        // Backoff long enough that only cancellation can end the test quickly.
        let scheduler = RetryScheduler::with_backoff_base(Duration::from_secs(3600));
        let transport = ScriptedTransport::failing_forever();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = run(&scheduler, &transport, 5, &cancel).await;

        assert!(!outcome.success);
        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(transport.calls(), 1);
    }
}
