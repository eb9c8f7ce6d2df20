use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{json_schema_object, json_schema_string, parse_args, CapabilityHandler, HandlerContext};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ObjectDeletionHandler {
    ctx: HandlerContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteArgs {
    object_url: String,
    lock_handle: String,
    #[serde(default)]
    transport: Option<String>,
}

impl ObjectDeletionHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("object_deletion", session, policy),
        }
    }

    async fn delete_object(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: DeleteArgs = parse_args("deleteObject", arguments)?;

        self.ctx
            .session()
            .delete_object(
                &args.object_url,
                &args.lock_handle,
                args.transport.as_deref().filter(|t| !t.is_empty()),
            )
            .await
            .map_err(|e| ToolError::remote("Delete object", &e))?;

        Ok(json!({ "objectUrl": args.object_url, "deleted": true }))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for ObjectDeletionHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "deleteObject",
            "Delete a locked ABAP object",
            json_schema_object(
                json!({
                    "objectUrl": json_schema_string("URL of the object to delete"),
                    "lockHandle": json_schema_string("Lock handle returned by lock"),
                    "transport": json_schema_string("Transport request number"),
                }),
                vec!["objectUrl", "lockHandle"],
            ),
        )]
    }

    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "deleteObject" => self.ctx.execute(tool, self.delete_object(arguments)).await,
            _ => Err(self.ctx.unknown_tool(tool)),
        }
    }

    fn metrics(&self) -> &RequestMetrics {
        self.ctx.metrics()
    }
}
