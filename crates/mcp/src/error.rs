use crate::protocol::JsonRpcError;
use thiserror::Error;

/// Fallback used when a failure carries no message of its own
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Failure of a single tool invocation.
///
/// Capability handlers are the only place where raw failures get one of
/// these kinds; the registry and the front-end pass them through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("{0}")]
    MethodNotFound(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InternalError(String),
}

impl ToolError {
    /// Wrap a failed session call as `InternalError`, keeping the cause's message
    pub fn remote(operation: &str, cause: &anyhow::Error) -> Self {
        let message = format!("{:#}", cause);
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        };
        Self::InternalError(format!("{} failed: {}", operation, message))
    }

    /// JSON-RPC error code for this kind
    pub fn code(&self) -> i32 {
        match self {
            Self::MethodNotFound(_) => JsonRpcError::METHOD_NOT_FOUND,
            Self::InvalidParams(_) => JsonRpcError::INVALID_PARAMS,
            Self::InvalidRequest(_) => JsonRpcError::INVALID_REQUEST,
            Self::InternalError(_) => JsonRpcError::INTERNAL_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::MethodNotFound(message)
            | Self::InvalidParams(message)
            | Self::InvalidRequest(message)
            | Self::InternalError(message) => message,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MethodNotFound(_) => "MethodNotFound",
            Self::InvalidParams(_) => "InvalidParams",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::InternalError(_) => "InternalError",
        }
    }
}

impl From<ToolError> for JsonRpcError {
    fn from(error: ToolError) -> Self {
        let code = error.code();
        let message = match error.message() {
            message if message.trim().is_empty() => UNKNOWN_ERROR.to_string(),
            message => message.to_string(),
        };
        JsonRpcError::custom(code, message)
    }
}

impl From<anyhow::Error> for ToolError {
    fn from(error: anyhow::Error) -> Self {
        let message = format!("{:#}", error);
        if message.trim().is_empty() {
            Self::InternalError(UNKNOWN_ERROR.to_string())
        } else {
            Self::InternalError(message)
        }
    }
}
