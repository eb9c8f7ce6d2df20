// Lock tools. A lock stays held on the server until a matching unLock.

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{
    json_schema_enum, json_schema_object, json_schema_string, parse_args, CapabilityHandler,
    HandlerContext,
};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ObjectLockHandler {
    ctx: HandlerContext,
}

fn default_access_mode() -> String {
    "MODIFY".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockArgs {
    object_url: String,
    #[serde(default = "default_access_mode")]
    access_mode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnlockArgs {
    object_url: String,
    lock_handle: String,
}

impl ObjectLockHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("object_lock", session, policy),
        }
    }

    async fn lock(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: LockArgs = parse_args("lock", arguments)?;

        let lock = self
            .ctx
            .session()
            .lock(&args.object_url, &args.access_mode)
            .await
            .map_err(|e| ToolError::remote("Lock", &e))?;

        Ok(json!({
            "objectUrl": args.object_url,
            "lockHandle": lock.lock_handle,
            "lock": lock,
        }))
    }

    async fn unlock(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: UnlockArgs = parse_args("unLock", arguments)?;

        self.ctx
            .session()
            .unlock(&args.object_url, &args.lock_handle)
            .await
            .map_err(|e| ToolError::remote("Unlock", &e))?;

        Ok(json!({ "objectUrl": args.object_url, "unlocked": true }))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for ObjectLockHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "lock",
                "Lock an ABAP object for editing and return its lock handle",
                json_schema_object(
                    json!({
                        "objectUrl": json_schema_string("URL of the object to lock"),
                        "accessMode": json_schema_enum(&["MODIFY", "READ"], "Access mode (default: MODIFY)"),
                    }),
                    vec!["objectUrl"],
                ),
            ),
            ToolDefinition::new(
                "unLock",
                "Release a lock held on an ABAP object",
                json_schema_object(
                    json!({
                        "objectUrl": json_schema_string("URL of the locked object"),
                        "lockHandle": json_schema_string("Lock handle returned by lock"),
                    }),
                    vec!["objectUrl", "lockHandle"],
                ),
            ),
        ]
    }

    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "lock" => self.ctx.execute(tool, self.lock(arguments)).await,
            "unLock" => self.ctx.execute(tool, self.unlock(arguments)).await,
            _ => Err(self.ctx.unknown_tool(tool)),
        }
    }

    fn metrics(&self) -> &RequestMetrics {
        self.ctx.metrics()
    }
}
