use adt_mcp_client::{AdtClient, RetryConfig};
use adt_mcp_core::{RateLimitPolicy, SessionType};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub adt: AdtConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Connection to the ABAP system
#[derive(Clone, Serialize, Deserialize)]
pub struct AdtConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub client: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub session_type: SessionType,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub allow_insecure_tls: bool,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

impl Default for AdtConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: String::new(),
            password: String::new(),
            client: None,
            language: None,
            session_type: SessionType::default(),
            timeout_secs: default_timeout_secs(),
            allow_insecure_tls: false,
            max_retries: default_max_retries(),
        }
    }
}

impl std::fmt::Debug for AdtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdtConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("client", &self.client)
            .field("language", &self.language)
            .field("session_type", &self.session_type)
            .field("timeout_secs", &self.timeout_secs)
            .field("allow_insecure_tls", &self.allow_insecure_tls)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_max_requests() -> u32 {
    1
}

fn default_window_ms() -> u64 {
    1000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
        }
    }
}

/// Values given on the command line or through `SAP_*` environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub client: Option<String>,
    pub language: Option<String>,
    pub session_type: Option<SessionType>,
    pub allow_insecure_tls: Option<bool>,
}

impl ServerConfig {
    /// Load the TOML file if it exists, otherwise start from defaults
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read configuration file {}", config_path.display()))?;
            Self::from_toml(&content)
        } else {
            tracing::info!(path = %config_path.display(), "Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration file")
    }

    /// Overrides win over file values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.url {
            self.adt.url = url;
        }
        if let Some(user) = overrides.user {
            self.adt.user = user;
        }
        if let Some(password) = overrides.password {
            self.adt.password = password;
        }
        if overrides.client.is_some() {
            self.adt.client = overrides.client;
        }
        if overrides.language.is_some() {
            self.adt.language = overrides.language;
        }
        if let Some(session_type) = overrides.session_type {
            self.adt.session_type = session_type;
        }
        if let Some(allow) = overrides.allow_insecure_tls {
            self.adt.allow_insecure_tls = allow;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.adt.url.trim().is_empty() {
            bail!("SAP URL is required (set SAP_URL or [adt].url)");
        }
        url::Url::parse(&self.adt.url)
            .with_context(|| format!("Invalid SAP URL '{}'", self.adt.url))?;
        if self.adt.user.trim().is_empty() {
            bail!("SAP user is required (set SAP_USER or [adt].user)");
        }
        if self.rate_limit.enabled && self.rate_limit.max_requests == 0 {
            bail!("rate_limit.max_requests must be at least 1 when rate limiting is enabled");
        }
        Ok(())
    }

    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            enabled: self.rate_limit.enabled,
            max_requests: self.rate_limit.max_requests,
            window: Duration::from_millis(self.rate_limit.window_ms),
        }
    }

    /// Build the session client shared by every handler
    pub fn build_client(&self) -> Result<AdtClient> {
        let adt = &self.adt;
        let mut builder = AdtClient::builder()
            .base_url(&adt.url)
            .credentials(&adt.user, &adt.password)
            .session_type(adt.session_type)
            .timeout(Duration::from_secs(adt.timeout_secs))
            .retry_config(RetryConfig {
                max_retries: adt.max_retries,
                ..Default::default()
            })
            .allow_insecure_tls(adt.allow_insecure_tls);

        if let Some(client) = adt.client.as_deref().filter(|c| !c.is_empty()) {
            builder = builder.client(client);
        }
        if let Some(language) = adt.language.as_deref().filter(|l| !l.is_empty()) {
            builder = builder.language(language);
        }

        builder.build().context("Failed to create ADT client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.adt.session_type, SessionType::Stateful);
        assert_eq!(config.adt.timeout_secs, 60);
        assert_eq!(config.adt.max_retries, 3);

        let policy = config.rate_limit_policy();
        assert!(policy.enabled);
        assert_eq!(policy.max_requests, 1);
        assert_eq!(policy.window, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_toml() {
        let config = ServerConfig::from_toml(
            r#"
            [adt]
            url = "https://sap.example.com:44300"
            user = "DEVELOPER"
            password = "secret"
            client = "001"
            session_type = "stateless"

            [rate_limit]
            max_requests = 5
            window_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.adt.client.as_deref(), Some("001"));
        assert_eq!(config.adt.session_type, SessionType::Stateless);
        assert_eq!(config.adt.timeout_secs, 60);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit_policy().max_requests, 5);
        assert_eq!(config.rate_limit_policy().window, Duration::from_secs(2));
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::load(&dir.path().join("adt-mcp.toml")).unwrap();
        assert!(config.adt.url.is_empty());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = ServerConfig::from_toml(
            r#"
            [adt]
            url = "https://old.example.com"
            user = "OLD"
            "#,
        )
        .unwrap();

        config.apply_overrides(ConfigOverrides {
            url: Some("https://new.example.com".into()),
            language: Some("DE".into()),
            session_type: Some(SessionType::Stateless),
            ..Default::default()
        });

        assert_eq!(config.adt.url, "https://new.example.com");
        assert_eq!(config.adt.user, "OLD");
        assert_eq!(config.adt.language.as_deref(), Some("DE"));
        assert_eq!(config.adt.session_type, SessionType::Stateless);
    }

    #[test]
    fn test_validation() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_err());

        config.adt.url = "not a url".into();
        config.adt.user = "DEVELOPER".into();
        assert!(config.validate().is_err());

        config.adt.url = "https://sap.example.com".into();
        config.validate().unwrap();

        config.adt.user.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let mut config = ServerConfig::default();
        config.adt.password = "secret".into();
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_build_client() {
        let mut config = ServerConfig::default();
        config.adt.url = "https://sap.example.com".into();
        config.adt.user = "DEVELOPER".into();
        config.adt.client = Some("001".into());

        let client = config.build_client().unwrap();
        assert_eq!(client.config().client.as_deref(), Some("001"));
    }
}
