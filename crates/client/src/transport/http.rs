//! HTTP transport layer for the ADT client.

use crate::config::ClientConfig;
use crate::error::{AdtError, AdtResult};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const CSRF_HEADER: &str = "x-csrf-token";
const SESSION_TYPE_HEADER: &str = "X-sap-adt-sessiontype";
const CSRF_FETCH_PATH: &str = "/sap/bc/adt/compatibility/graph";

/// A single request against the ADT REST API.
#[derive(Debug, Clone)]
pub struct AdtRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub accept: Option<&'static str>,
    pub content_type: Option<&'static str>,
    pub body: Option<String>,
}

impl AdtRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            accept: None,
            content_type: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter only when a value is present
    pub fn query_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.is_empty() => self.query(key, value),
            _ => self,
        }
    }

    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = Some(accept);
        self
    }

    pub fn body(mut self, content_type: &'static str, body: impl Into<String>) -> Self {
        self.content_type = Some(content_type);
        self.body = Some(body.into());
        self
    }

    fn is_idempotent(&self) -> bool {
        self.method == Method::GET
    }
}

/// HTTP transport holding the authenticated session.
///
/// In stateful mode the session cookie pins every request to one ABAP work
/// process context, so requests are serialised through `session_gate`.
#[derive(Debug)]
pub struct HttpTransport {
    client: RwLock<Client>,
    config: Arc<ClientConfig>,
    csrf_token: RwLock<Option<String>>,
    session_gate: Mutex<()>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> AdtResult<Self> {
        let client = Self::build_client(&config)?;

        Ok(Self {
            client: RwLock::new(client),
            config,
            csrf_token: RwLock::new(None),
            session_gate: Mutex::new(()),
        })
    }

    fn build_client(config: &ClientConfig) -> AdtResult<Client> {
        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .danger_accept_invalid_certs(config.allow_insecure_tls)
            .build()?;
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current CSRF token, if one has been fetched.
    pub fn csrf_token(&self) -> Option<String> {
        self.csrf_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_csrf_token(&self, token: Option<String>) {
        *self.csrf_token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn http_client(&self) -> Client {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the CSRF token and the cookie jar.
    pub fn reset(&self) -> AdtResult<()> {
        let client = Self::build_client(&self.config)?;
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = client;
        self.set_csrf_token(None);
        debug!("HTTP session reset");
        Ok(())
    }

    /// Build a URL for the given path.
    ///
    /// Only origin-relative paths on the configured host are accepted.
    fn build_url(&self, path: &str) -> AdtResult<url::Url> {
        let base = &self.config.base_url;
        if !path.starts_with('/') || path.starts_with("//") || path.starts_with("/\\") {
            return Err(AdtError::ForeignUrl(path.to_string()));
        }

        let url = base.join(path)?;
        if url.origin() != base.origin() {
            return Err(AdtError::ForeignUrl(path.to_string()));
        }
        Ok(url)
    }

    /// Authenticate and fetch a fresh CSRF token.
    pub async fn login(&self) -> AdtResult<()> {
        let _guard = self.session_gate.lock().await;
        self.set_csrf_token(None);
        self.fetch_csrf_token().await
    }

    async fn fetch_csrf_token(&self) -> AdtResult<()> {
        let request = AdtRequest::get(CSRF_FETCH_PATH).accept("application/xml");
        self.execute_with_retry(&request).await?;

        if self.csrf_token().is_none() {
            return Err(AdtError::UnexpectedResponse(
                "server did not return a CSRF token".to_string(),
            ));
        }
        debug!("CSRF token fetched");
        Ok(())
    }

    /// Send a request and return the response body.
    ///
    /// Modifying requests fetch a CSRF token first if none is cached. A token
    /// the server rejects is refreshed once.
    pub async fn send(&self, request: AdtRequest) -> AdtResult<String> {
        let _guard = if self.config.session_type.is_stateful() {
            Some(self.session_gate.lock().await)
        } else {
            None
        };

        if !request.is_idempotent() && self.csrf_token().is_none() {
            self.fetch_csrf_token().await?;
        }

        match self.execute_with_retry(&request).await {
            Err(AdtError::CsrfRejected) => {
                warn!(path = %request.path, "CSRF token rejected, fetching a new one");
                self.set_csrf_token(None);
                self.fetch_csrf_token().await?;
                self.execute_with_retry(&request).await
            }
            other => other,
        }
    }

    fn build_request(&self, request: &AdtRequest) -> AdtResult<RequestBuilder> {
        let url = self.build_url(&request.path)?;
        let token = self.csrf_token().unwrap_or_else(|| "fetch".to_string());

        let mut builder = self
            .http_client()
            .request(request.method.clone(), url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CSRF_HEADER, token)
            .query(&request.query);

        if let Some(ref client) = self.config.client {
            builder = builder.query(&[("sap-client", client)]);
        }
        if let Some(ref language) = self.config.language {
            builder = builder.query(&[("sap-language", language)]);
        }
        if self.config.session_type.is_stateful() {
            builder = builder.header(SESSION_TYPE_HEADER, "stateful");
        }
        if let Some(accept) = request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        Ok(builder)
    }

    /// Execute a request, retrying idempotent ones on transient failures.
    async fn execute_with_retry(&self, request: &AdtRequest) -> AdtResult<String> {
        let retry_config = &self.config.retry_config;
        let max_retries = if request.is_idempotent() {
            retry_config.max_retries
        } else {
            0
        };
        let mut attempts = 0;

        loop {
            match self.execute_once(request).await {
                Err(e) if attempts < max_retries && e.is_retryable(retry_config) => {
                    let backoff = retry_config.backoff_for_attempt(attempts);
                    warn!(
                        error = %e,
                        attempt = attempts + 1,
                        backoff_ms = backoff.as_millis(),
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempts += 1;
                }
                result => return result,
            }
        }
    }

    async fn execute_once(&self, request: &AdtRequest) -> AdtResult<String> {
        debug!(method = %request.method, path = %request.path, "ADT request");

        let response = match self.build_request(request)?.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(AdtError::Timeout),
            Err(e) => return Err(e.into()),
        };

        let status = response.status().as_u16();
        self.remember_csrf_token(&response);

        if response.status().is_success() {
            return Ok(response.text().await?);
        }
        if status == 403 && Self::csrf_required(&response) {
            return Err(AdtError::CsrfRejected);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AdtError::from_response(status, &body))
    }

    fn remember_csrf_token(&self, response: &Response) {
        let token = response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.eq_ignore_ascii_case("required"));

        if let Some(token) = token {
            self.set_csrf_token(Some(token.to_string()));
        }
    }

    fn csrf_required(response: &Response) -> bool {
        response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("required"))
    }
}
