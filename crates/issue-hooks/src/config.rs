//! Webhook configuration, read fresh from a host-provided source on every
//! dispatch so mid-flight setting changes apply to the next event.

use std::collections::HashMap;
use std::time::Duration;

/// Setting key: master switch, defaults to off.
pub const KEY_ENABLED: &str = "webhook.enabled";
/// Setting key: target URL; blank means disabled.
pub const KEY_URL: &str = "webhook.url";
/// Setting key: shared secret for HMAC signing; blank skips signing.
pub const KEY_SECRET: &str = "webhook.secret";
/// Setting key: connect + read timeout per attempt, in milliseconds.
pub const KEY_TIMEOUT_MILLIS: &str = "webhook.timeoutMillis";
/// Setting key: retries after the first attempt.
pub const KEY_RETRY_COUNT: &str = "webhook.retryCount";

const DEFAULT_TIMEOUT_MILLIS: u64 = 10_000;
const DEFAULT_RETRY_COUNT: u32 = 3;

/// A source of named string settings.
///
/// The host decides where settings live (env vars, a config file, an admin
/// UI); the dispatcher only ever asks for the `webhook.*` keys.
pub trait ConfigSource: Send + Sync {
    /// Look up the raw value for a setting key.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads settings from environment variables.
///
/// Keys map to variables by uppercasing and replacing `.` with `_`:
/// `webhook.url` becomes `WEBHOOK_URL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        let var = key.replace('.', "_").to_uppercase();
        std::env::var(var).ok()
    }
}

/// An in-memory settings map, for hosts that pass explicit settings and for
/// tests.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    settings: HashMap<String, String>,
}

impl StaticConfigSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, builder-style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for StaticConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }
}

/// Immutable snapshot of the webhook settings at dispatch time.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub secret: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl WebhookConfig {
    /// Read a snapshot from the source, applying defaults for absent or
    /// unparsable values.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let enabled = source
            .get(KEY_ENABLED)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let timeout_millis = source
            .get(KEY_TIMEOUT_MILLIS)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MILLIS);

        let max_retries = source
            .get(KEY_RETRY_COUNT)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_COUNT);

        Self {
            enabled,
            url: source.get(KEY_URL),
            secret: source.get(KEY_SECRET),
            timeout: Duration::from_millis(timeout_millis),
            max_retries,
        }
    }

    /// The URL to deliver to, if the gate checks pass.
    ///
    /// Returns `None` when disabled or when the URL is blank, in which case
    /// no network activity may occur.
    #[must_use]
    pub fn delivery_target(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Some(url),
            _ => None,
        }
    }

    /// The signing secret, if one is configured and non-blank.
    #[must_use]
    pub fn signing_secret(&self) -> Option<&str> {
        match self.secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Some(secret),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_when_source_is_empty() {
        let config = WebhookConfig::from_source(&StaticConfigSource::new());
        assert!(!config.enabled);
        assert!(config.url.is_none());
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.max_retries, 3);
        assert!(config.delivery_target().is_none());
    }

    #[test]
    fn disabled_config_has_no_target_even_with_url() {
        let source = StaticConfigSource::new().with(KEY_URL, "https://hooks.example/x");
        let config = WebhookConfig::from_source(&source);
        assert!(config.delivery_target().is_none());
    }

    #[test]
    fn blank_url_has_no_target() {
        let source = StaticConfigSource::new()
            .with(KEY_ENABLED, "true")
            .with(KEY_URL, "   ");
        let config = WebhookConfig::from_source(&source);
        assert!(config.delivery_target().is_none());
    }

    #[test]
    fn enabled_accepts_true_and_one() {
        for value in ["true", "TRUE", "1"] {
            let source = StaticConfigSource::new()
                .with(KEY_ENABLED, value)
                .with(KEY_URL, "https://hooks.example/x");
            let config = WebhookConfig::from_source(&source);
            assert_eq!(config.delivery_target(), Some("https://hooks.example/x"));
        }
    }

    #[test]
    fn blank_secret_is_not_a_signing_secret() {
        let source = StaticConfigSource::new().with(KEY_SECRET, "  ");
        let config = WebhookConfig::from_source(&source);
        assert!(config.signing_secret().is_none());

        let source = StaticConfigSource::new().with(KEY_SECRET, "s3cret");
        let config = WebhookConfig::from_source(&source);
        assert_eq!(config.signing_secret(), Some("s3cret"));
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let source = StaticConfigSource::new()
            .with(KEY_TIMEOUT_MILLIS, "soon")
            .with(KEY_RETRY_COUNT, "-1");
        let config = WebhookConfig::from_source(&source);
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    #[serial]
    fn env_source_maps_keys_to_variables() {
        std::env::set_var("WEBHOOK_URL", "https://hooks.example/env");
        let source = EnvConfigSource;
        assert_eq!(
            source.get(KEY_URL),
            Some("https://hooks.example/env".to_string())
        );
        std::env::remove_var("WEBHOOK_URL");
        assert!(source.get(KEY_URL).is_none());
    }
}
