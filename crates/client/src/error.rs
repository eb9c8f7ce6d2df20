//! Error types for the ADT client.

use crate::config::RetryConfig;
use crate::xml;

/// Result type for client operations.
pub type AdtResult<T> = Result<T, AdtError>;

/// Error types that can occur when talking to an ABAP system.
#[derive(Debug, thiserror::Error)]
pub enum AdtError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The ABAP system returned an error response.
    #[error("ADT error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        exception_type: Option<String>,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response body could not be parsed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Connection timeout.
    #[error("Request timed out")]
    Timeout,

    /// The server refused the CSRF token even after a refresh.
    #[error("CSRF token rejected by the server")]
    CsrfRejected,

    /// Response did not contain an expected value.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Object path would leave the configured ABAP system.
    #[error("Refusing to send request outside the ABAP system: {0}")]
    ForeignUrl(String),
}

impl AdtError {
    /// Check if this error is retryable under the given retry policy.
    pub fn is_retryable(&self, retry: &RetryConfig) -> bool {
        match self {
            Self::Timeout => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => retry.should_retry_status(*status),
            _ => false,
        }
    }

    /// Create an API error from a status code and response body.
    ///
    /// ADT wraps failures in an `exc:exception` document whose `message`
    /// element carries the text meant for the user.
    pub fn from_response(status: u16, body: &str) -> Self {
        match xml::parse_exception(body) {
            Some(exception) => Self::Api {
                status,
                message: exception.message,
                exception_type: exception.exception_type,
            },
            None => Self::Api {
                status,
                message: body.trim().to_string(),
                exception_type: None,
            },
        }
    }
}

impl From<quick_xml::Error> for AdtError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for AdtError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_with_exception() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<exc:exception xmlns:exc="http://www.sap.com/abapxml/types/communicationframework">
  <namespace id="com.sap.adt"/>
  <type id="ExceptionResourceNoAccess"/>
  <message lang="EN">User DEVELOPER is currently editing ZCL_EXAMPLE</message>
</exc:exception>"#;

        match AdtError::from_response(403, body) {
            AdtError::Api {
                status,
                message,
                exception_type,
            } => {
                assert_eq!(status, 403);
                assert_eq!(message, "User DEVELOPER is currently editing ZCL_EXAMPLE");
                assert_eq!(exception_type.as_deref(), Some("ExceptionResourceNoAccess"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_response_plain_text() {
        match AdtError::from_response(404, "  Not found \n") {
            AdtError::Api { message, .. } => assert_eq!(message, "Not found"),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_is_retryable() {
        let retry = RetryConfig::default();
        assert!(AdtError::Timeout.is_retryable(&retry));
        assert!(AdtError::from_response(503, "").is_retryable(&retry));
        assert!(AdtError::from_response(429, "").is_retryable(&retry));
        assert!(!AdtError::from_response(500, "").is_retryable(&retry));
        assert!(!AdtError::Config("x".to_string()).is_retryable(&retry));
        assert!(!AdtError::ForeignUrl("https://elsewhere.example.com/".to_string()).is_retryable(&retry));
    }

    #[test]
    fn test_retry_status_codes_follow_config() {
        let retry = RetryConfig {
            retry_on_status_codes: vec![500],
            ..Default::default()
        };
        assert!(AdtError::from_response(500, "").is_retryable(&retry));
        assert!(!AdtError::from_response(503, "").is_retryable(&retry));
    }
}
