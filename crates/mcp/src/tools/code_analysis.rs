use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{
    json_schema_object, json_schema_string, parse_args, CapabilityHandler, HandlerContext, Payload,
};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Syntax check of unsaved code
pub struct CodeAnalysisHandler {
    ctx: HandlerContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyntaxCheckArgs {
    url: String,
    #[serde(default)]
    main_url: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    main_program: Option<String>,
}

impl CodeAnalysisHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("code_analysis", session, policy),
        }
    }

    async fn syntax_check_code(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: SyntaxCheckArgs = parse_args("syntaxCheckCode", arguments)?;
        let code = Payload::exclusive(args.code, "code", args.file_path)?
            .resolve()
            .await?;

        // Includes are checked in the context of their main object
        let main_url = args
            .main_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| args.url.clone());

        let messages = self
            .ctx
            .session()
            .syntax_check(
                &args.url,
                &main_url,
                &code,
                args.main_program.as_deref().filter(|p| !p.is_empty()),
            )
            .await
            .map_err(|e| ToolError::remote("Syntax check", &e))?;

        let errors = messages
            .iter()
            .filter(|message| matches!(message.severity.as_str(), "E" | "A" | "X"))
            .count();

        Ok(json!({
            "url": args.url,
            "errors": errors,
            "messages": messages,
        }))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for CodeAnalysisHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "syntaxCheckCode",
            "Run a syntax check on ABAP code without saving it, given inline or read from a local file",
            json_schema_object(
                json!({
                    "url": json_schema_string("URL of the object source"),
                    "mainUrl": json_schema_string("URL of the main object (default: url)"),
                    "code": json_schema_string("Code to check (exclusive with filePath)"),
                    "filePath": json_schema_string("Local file holding the code (exclusive with code)"),
                    "mainProgram": json_schema_string("Main program for includes"),
                }),
                vec!["url"],
            ),
        )]
    }

    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "syntaxCheckCode" => {
                self.ctx
                    .execute(tool, self.syntax_check_code(arguments))
                    .await
            }
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
    use adt_mcp_core::SyntaxMessage;
    use tempfile::TempDir;

    const URL: &str = "/sap/bc/adt/programs/programs/zdemo/source/main";

    #[tokio::test]
    async fn test_inline_code_and_default_main_url() {
        let session = MockSession::new();
        session.syntax_messages.lock().unwrap().push(SyntaxMessage {
            uri: format!("{}#start=1,0", URL),
            line: Some(1),
            offset: Some(0),
            severity: "E".into(),
            text: "Statement is not defined".into(),
        });
        let handler = CodeAnalysisHandler::new(session.clone(), RateLimitPolicy::disabled());

        let result = handler
            .handle("syntaxCheckCode", json!({ "url": URL, "code": "WRTE 'x'." }))
            .await
            .unwrap();
        let payload: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();

        assert_eq!(payload["errors"], 1);
        assert_eq!(payload["messages"][0]["line"], 1);
        assert_eq!(
            session.calls_to("syntax_check")[0].args,
            vec![URL, URL, "WRTE 'x'.", "-"]
        );
    }

    #[tokio::test]
    async fn test_code_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zdemo.abap");
        std::fs::write(&path, "REPORT zdemo.").unwrap();

        let session = MockSession::new();
        let handler = CodeAnalysisHandler::new(session.clone(), RateLimitPolicy::disabled());

        handler
            .handle(
                "syntaxCheckCode",
                json!({ "url": URL, "filePath": path.to_string_lossy(), "mainProgram": "ZMAIN" }),
            )
            .await
            .unwrap();

        assert_eq!(
            session.calls_to("syntax_check")[0].args,
            vec![URL, URL, "REPORT zdemo.", "ZMAIN"]
        );
    }

    #[tokio::test]
    async fn test_code_and_file_are_exclusive() {
        let session = MockSession::new();
        let handler = CodeAnalysisHandler::new(session.clone(), RateLimitPolicy::disabled());

        for arguments in [
            json!({ "url": URL }),
            json!({ "url": URL, "code": "REPORT z.", "filePath": "/tmp/z.abap" }),
        ] {
            let error = handler.handle("syntaxCheckCode", arguments).await.unwrap_err();
            assert!(matches!(error, ToolError::InvalidParams(_)));
        }
        assert_eq!(session.call_count(), 0);
    }
}
