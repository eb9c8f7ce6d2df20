// Capability handler contract and the lifecycle every tool call runs through

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn, Instrument};

/// A cohesive group of tools sharing one session and one metrics state
#[async_trait::async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Handler name used in logs and metrics reports
    fn name(&self) -> &'static str;

    /// Tools owned by this handler, in declaration order.
    ///
    /// Pure: callable before any session activity.
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Execute one of this handler's tools
    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError>;

    fn metrics(&self) -> &RequestMetrics;
}

/// State every capability handler carries.
///
/// The session is shared with all other handlers; a handler never creates
/// or closes it.
pub struct HandlerContext {
    name: &'static str,
    session: Arc<dyn AdtSession>,
    metrics: RequestMetrics,
}

impl HandlerContext {
    pub fn new(name: &'static str, session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            name,
            session,
            metrics: RequestMetrics::new(policy),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn session(&self) -> &dyn AdtSession {
        self.session.as_ref()
    }

    pub fn metrics(&self) -> &RequestMetrics {
        &self.metrics
    }

    pub fn unknown_tool(&self, tool: &str) -> ToolError {
        ToolError::MethodNotFound(format!("Unknown tool in {} handler: {}", self.name, tool))
    }

    /// Run one tool operation.
    ///
    /// `operation` returns the operation-specific fields of the payload; it is
    /// not polled before the start time is taken. The outcome is tracked
    /// exactly once, success or failure, before the result is returned.
    pub async fn execute<F>(&self, tool: &str, operation: F) -> Result<CallToolResult, ToolError>
    where
        F: Future<Output = Result<Value, ToolError>>,
    {
        let started = Instant::now();
        let span = tracing::info_span!("tool", handler = self.name, tool);

        let outcome = operation.instrument(span).await;
        self.metrics.track_request(started, outcome.is_ok());
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(fields) => {
                debug!(handler = self.name, tool, duration_ms, "Tool call succeeded");
                success_result(fields)
            }
            Err(error) => {
                warn!(
                    handler = self.name,
                    tool,
                    duration_ms,
                    kind = error.kind(),
                    error = %error,
                    "Tool call failed"
                );
                Err(error)
            }
        }
    }
}

/// Wrap payload fields as `{status: "success", ...}` in a single text block
pub fn success_result(fields: Value) -> Result<CallToolResult, ToolError> {
    let mut payload = serde_json::Map::new();
    payload.insert("status".to_string(), Value::from("success"));
    match fields {
        Value::Object(map) => payload.extend(map),
        Value::Null => {}
        other => {
            payload.insert("result".to_string(), other);
        }
    }

    let text = serde_json::to_string_pretty(&Value::Object(payload))
        .map_err(|e| ToolError::InternalError(format!("Failed to serialize result: {}", e)))?;
    Ok(CallToolResult::text(text))
}

/// Deserialize tool arguments; a missing argument object counts as empty
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidParams(format!("Invalid arguments for {}: {}", tool, e)))
}

/// A logical payload given either inline or as a local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Inline(String),
    File(PathBuf),
}

impl Payload {
    /// Pick exactly one of the two alternatives.
    ///
    /// Empty strings count as absent.
    pub fn exclusive(
        inline: Option<String>,
        inline_name: &str,
        file_path: Option<String>,
    ) -> Result<Self, ToolError> {
        let inline = inline.filter(|value| !value.is_empty());
        let file_path = file_path.filter(|value| !value.is_empty());

        match (inline, file_path) {
            (Some(_), Some(_)) => Err(ToolError::InvalidParams(format!(
                "{} and filePath are mutually exclusive, provide only one of them",
                inline_name
            ))),
            (None, None) => Err(ToolError::InvalidParams(format!(
                "Either {} or filePath must be provided",
                inline_name
            ))),
            (Some(value), None) => Ok(Self::Inline(value)),
            (None, Some(path)) => Ok(Self::File(PathBuf::from(path))),
        }
    }

    /// Load the payload text, reading the file fully when one was given
    pub async fn resolve(self) -> Result<String, ToolError> {
        match self {
            Self::Inline(text) => Ok(text),
            Self::File(path) => tokio::fs::read_to_string(&path).await.map_err(|e| {
                ToolError::InvalidRequest(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                ))
            }),
        }
    }
}

/// Create the parent directory chain of `path`; existing directories are fine
pub async fn ensure_parent_dir(path: &Path) -> Result<(), ToolError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ToolError::InvalidRequest(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })
        }
        _ => Ok(()),
    }
}
