//! Main client for the ADT REST API.

use crate::api::*;
use crate::config::{ClientConfig, RetryConfig};
use crate::error::{AdtError, AdtResult};
use crate::transport::{AdtRequest, HttpTransport};
use adt_mcp_core::SessionType;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Client for one ABAP system.
#[derive(Debug)]
pub struct AdtClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl AdtClient {
    /// Create a new client builder.
    pub fn builder() -> AdtClientBuilder {
        AdtClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> AdtResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the objects API.
    pub fn objects(&self) -> ObjectsApi<'_> {
        ObjectsApi::new(self)
    }

    /// Get the activation API.
    pub fn activation(&self) -> ActivationApi<'_> {
        ActivationApi::new(self)
    }

    /// Get the transports API.
    pub fn transports(&self) -> TransportsApi<'_> {
        TransportsApi::new(self)
    }

    /// Get the checks API.
    pub fn checks(&self) -> ChecksApi<'_> {
        ChecksApi::new(self)
    }

    /// Get the data preview API.
    pub fn data_preview(&self) -> DataPreviewApi<'_> {
        DataPreviewApi::new(self)
    }

    /// Log on and fetch a CSRF token.
    pub async fn login(&self) -> AdtResult<()> {
        self.http.login().await?;
        info!(
            user = %self.config.username,
            session_type = %self.config.session_type,
            "Logged on to ABAP system"
        );
        Ok(())
    }

    /// Log off on the server and forget the local session.
    pub async fn logout(&self) -> AdtResult<()> {
        self.http
            .send(AdtRequest::get("/sap/public/bc/icf/logoff"))
            .await?;
        self.http.reset()?;
        info!("Logged off from ABAP system");
        Ok(())
    }

    /// Forget the local session without contacting the server.
    pub fn drop_session(&self) -> AdtResult<()> {
        self.http.reset()
    }
}

/// Builder for creating an AdtClient.
pub struct AdtClientBuilder {
    base_url: Option<String>,
    username: Option<String>,
    password: String,
    client: Option<String>,
    language: Option<String>,
    session_type: SessionType,
    timeout: Duration,
    retry_config: RetryConfig,
    allow_insecure_tls: bool,
}

impl AdtClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            username: None,
            password: String::new(),
            client: None,
            language: None,
            session_type: SessionType::Stateful,
            timeout: Duration::from_secs(60),
            retry_config: RetryConfig::default(),
            allow_insecure_tls: false,
        }
    }

    /// Set the base URL of the ABAP system.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the logon credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = password.into();
        self
    }

    /// Set the SAP client (mandant).
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// Set the logon language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn session_type(mut self, session_type: SessionType) -> Self {
        self.session_type = session_type;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Accept invalid TLS certificates.
    pub fn allow_insecure_tls(mut self, allow: bool) -> Self {
        self.allow_insecure_tls = allow;
        self
    }

    /// Build the client.
    pub fn build(self) -> AdtResult<AdtClient> {
        let base_url_str = self
            .base_url
            .ok_or_else(|| AdtError::Config("base_url is required".to_string()))?;
        let username = self
            .username
            .filter(|user| !user.is_empty())
            .ok_or_else(|| AdtError::Config("username is required".to_string()))?;

        let base_url = Url::parse(&base_url_str)?;

        let config = ClientConfig {
            base_url,
            username,
            password: self.password,
            client: self.client,
            language: self.language,
            session_type: self.session_type,
            timeout: self.timeout,
            retry_config: self.retry_config,
            allow_insecure_tls: self.allow_insecure_tls,
        };

        AdtClient::from_config(config)
    }
}

impl Default for AdtClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = AdtClient::builder().credentials("DEVELOPER", "pw").build();
        assert!(matches!(result, Err(AdtError::Config(_))));
    }

    #[test]
    fn test_builder_requires_username() {
        let result = AdtClient::builder().base_url("https://sap.example.com").build();
        assert!(matches!(result, Err(AdtError::Config(_))));
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let result = AdtClient::builder()
            .base_url("not a url")
            .credentials("DEVELOPER", "pw")
            .build();
        assert!(matches!(result, Err(AdtError::InvalidUrl(_))));
    }

    #[test]
    fn test_builder_settings() {
        let client = AdtClient::builder()
            .base_url("https://sap.example.com:44300")
            .credentials("DEVELOPER", "pw")
            .client("001")
            .language("DE")
            .session_type(SessionType::Stateless)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let config = client.config();
        assert_eq!(config.client.as_deref(), Some("001"));
        assert_eq!(config.language.as_deref(), Some("DE"));
        assert_eq!(config.session_type, SessionType::Stateless);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
