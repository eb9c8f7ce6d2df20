// Activation tools

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{json_schema_object, json_schema_string, parse_args, CapabilityHandler, HandlerContext};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ObjectManagementHandler {
    ctx: HandlerContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivateArgs {
    object_name: String,
    object_url: String,
    #[serde(default)]
    main_include: Option<String>,
}

impl ObjectManagementHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("object_management", session, policy),
        }
    }

    async fn activate_by_name(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: ActivateArgs = parse_args("activateByName", arguments)?;

        let result = self
            .ctx
            .session()
            .activate_by_name(
                &args.object_name,
                &args.object_url,
                args.main_include.as_deref().filter(|m| !m.is_empty()),
            )
            .await
            .map_err(|e| ToolError::remote("Activate object", &e))?;

        // Activation errors are a normal answer, not a failed call
        Ok(json!({
            "objectName": args.object_name,
            "activated": result.success,
            "result": result,
        }))
    }

    async fn inactive_objects(&self) -> Result<Value, ToolError> {
        let objects = self
            .ctx
            .session()
            .inactive_objects()
            .await
            .map_err(|e| ToolError::remote("List inactive objects", &e))?;

        Ok(json!({ "count": objects.len(), "objects": objects }))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for ObjectManagementHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "activateByName",
                "Activate an ABAP object by name",
                json_schema_object(
                    json!({
                        "objectName": json_schema_string("Name of the object"),
                        "objectUrl": json_schema_string("URL of the object"),
                        "mainInclude": json_schema_string("Main program the include is activated in"),
                    }),
                    vec!["objectName", "objectUrl"],
                ),
            ),
            ToolDefinition::new(
                "inactiveObjects",
                "List the current user's inactive objects",
                json_schema_object(json!({}), vec![]),
            ),
        ]
    }

    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "activateByName" => {
                self.ctx
                    .execute(tool, self.activate_by_name(arguments))
                    .await
            }
            "inactiveObjects" => self.ctx.execute(tool, self.inactive_objects()).await,
            _ => Err(self.ctx.unknown_tool(tool)),
        }
    }

    fn metrics(&self) -> &RequestMetrics {
        self.ctx.metrics()
    }
}
