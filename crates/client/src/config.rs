//! Configuration types for the ADT client.

use adt_mcp_core::SessionType;
use std::time::Duration;
use url::Url;

/// Configuration for the ADT client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the ABAP system, e.g. `https://host:44300`.
    pub base_url: Url,
    /// Logon user.
    pub username: String,
    /// Logon password.
    pub password: String,
    /// SAP client (mandant), sent as `sap-client`.
    pub client: Option<String>,
    /// Logon language, sent as `sap-language`.
    pub language: Option<String>,
    /// Whether the server keeps context between requests.
    pub session_type: SessionType,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration for idempotent requests.
    pub retry_config: RetryConfig,
    /// Accept self-signed certificates (development systems only).
    pub allow_insecure_tls: bool,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL and credentials.
    pub fn new(base_url: Url, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url,
            username: username.into(),
            password: password.into(),
            client: None,
            language: None,
            session_type: SessionType::Stateful,
            timeout: Duration::from_secs(60),
            retry_config: RetryConfig::default(),
            allow_insecure_tls: false,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"***")
            .field("client", &self.client)
            .field("language", &self.language)
            .field("session_type", &self.session_type)
            .field("timeout", &self.timeout)
            .field("retry_config", &self.retry_config)
            .field("allow_insecure_tls", &self.allow_insecure_tls)
            .finish()
    }
}

/// Configuration for retry behavior.
///
/// Only GET requests are retried. Locks, writes and releases are not safe to
/// replay blindly.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// HTTP status codes to retry on.
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![429, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_url() -> Url {
        Url::parse("https://sap.example.com:44300").unwrap()
    }

    #[test]
    fn test_backoff_calculation() {
        let config = RetryConfig::default();

        assert_eq!(config.backoff_for_attempt(0), Duration::from_millis(200));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_millis(400));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let config = RetryConfig {
            max_backoff: Duration::from_millis(500),
            ..Default::default()
        };

        assert_eq!(config.backoff_for_attempt(10), Duration::from_millis(500));
    }

    #[test]
    fn test_should_retry_status() {
        let config = RetryConfig::default();

        assert!(config.should_retry_status(503));
        assert!(config.should_retry_status(429));
        // ADT reports business errors as 500, those are not transient
        assert!(!config.should_retry_status(500));
        assert!(!config.should_retry_status(403));
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new(test_url(), "DEVELOPER", "secret");

        assert_eq!(config.session_type, SessionType::Stateful);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.client.is_none());
        assert!(!config.allow_insecure_tls);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ClientConfig::new(test_url(), "DEVELOPER", "secret");
        let debug = format!("{:?}", config);

        assert!(debug.contains("DEVELOPER"));
        assert!(!debug.contains("secret"));
    }
}
