// Session lifecycle tools

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{json_schema_object, CapabilityHandler, HandlerContext};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct AuthHandler {
    ctx: HandlerContext,
}

impl AuthHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("auth", session, policy),
        }
    }

    async fn login(&self) -> Result<Value, ToolError> {
        let logged_in = self
            .ctx
            .session()
            .login()
            .await
            .map_err(|e| ToolError::remote("Login", &e))?;
        Ok(json!({ "loggedIn": logged_in }))
    }

    async fn logout(&self) -> Result<Value, ToolError> {
        self.ctx
            .session()
            .logout()
            .await
            .map_err(|e| ToolError::remote("Logout", &e))?;
        Ok(json!({ "message": "Logged out" }))
    }

    async fn drop_session(&self) -> Result<Value, ToolError> {
        self.ctx
            .session()
            .drop_session()
            .await
            .map_err(|e| ToolError::remote("Drop session", &e))?;
        Ok(json!({ "message": "Session dropped" }))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for AuthHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "login",
                "Log on to the ABAP system and open a session",
                json_schema_object(json!({}), vec![]),
            ),
            ToolDefinition::new(
                "logout",
                "Log off from the ABAP system",
                json_schema_object(json!({}), vec![]),
            ),
            ToolDefinition::new(
                "dropSession",
                "Discard the local session state without logging off",
                json_schema_object(json!({}), vec![]),
            ),
        ]
    }

    async fn handle(&self, tool: &str, _arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "login" => self.ctx.execute(tool, self.login()).await,
            "logout" => self.ctx.execute(tool, self.logout()).await,
            "dropSession" => self.ctx.execute(tool, self.drop_session()).await,
            _ => Err(self.ctx.unknown_tool(tool)),
        }
    }

    fn metrics(&self) -> &RequestMetrics {
        self.ctx.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::mock::MockSession;

    #[tokio::test]
    async fn test_login_reports_session_result() {
        let session = MockSession::new();
        let handler = AuthHandler::new(session.clone(), RateLimitPolicy::disabled());

        let result = handler.handle("login", Value::Null).await.unwrap();
        let payload: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();

        assert_eq!(payload["status"], "success");
        assert_eq!(payload["loggedIn"], true);
        assert_eq!(session.calls_to("login").len(), 1);
    }

    #[tokio::test]
    async fn test_logout_failure_is_internal_error() {
        let session = MockSession::new();
        session.fail("logout", "HTTP 500");
        let handler = AuthHandler::new(session.clone(), RateLimitPolicy::disabled());

        let error = handler.handle("logout", json!({})).await.unwrap_err();
        assert_eq!(error, ToolError::InternalError("Logout failed: HTTP 500".into()));
        assert_eq!(handler.metrics().snapshot().error_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_in_namespace() {
        let handler = AuthHandler::new(MockSession::shared(), RateLimitPolicy::disabled());

        let error = handler.handle("lock", json!({})).await.unwrap_err();
        assert!(matches!(error, ToolError::MethodNotFound(_)));
        assert!(error.message().contains("auth"));
        assert_eq!(handler.metrics().snapshot().total_requests, 0);
    }
}
