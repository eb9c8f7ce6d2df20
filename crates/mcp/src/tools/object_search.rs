use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{
    json_schema_integer, json_schema_object, json_schema_string, parse_args, CapabilityHandler,
    HandlerContext,
};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_MAX_RESULTS: u32 = 100;

pub struct ObjectSearchHandler {
    ctx: HandlerContext,
}

fn default_max() -> u32 {
    DEFAULT_MAX_RESULTS
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    query: String,
    #[serde(default)]
    obj_type: Option<String>,
    #[serde(default = "default_max")]
    max: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathArgs {
    object_url: String,
}

impl ObjectSearchHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("object_search", session, policy),
        }
    }

    async fn search_object(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: SearchArgs = parse_args("searchObject", arguments)?;

        let results = self
            .ctx
            .session()
            .search_object(
                &args.query,
                args.obj_type.as_deref().filter(|t| !t.is_empty()),
                args.max,
            )
            .await
            .map_err(|e| ToolError::remote("Search objects", &e))?;

        Ok(json!({
            "query": args.query,
            "count": results.len(),
            "results": results,
        }))
    }

    async fn find_object_path(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: PathArgs = parse_args("findObjectPath", arguments)?;

        let path = self
            .ctx
            .session()
            .find_object_path(&args.object_url)
            .await
            .map_err(|e| ToolError::remote("Find object path", &e))?;

        Ok(json!({ "objectUrl": args.object_url, "path": path }))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for ObjectSearchHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "searchObject",
                "Quick search for ABAP repository objects by name pattern",
                json_schema_object(
                    json!({
                        "query": json_schema_string("Name pattern, * is a wildcard"),
                        "objType": json_schema_string("Object type filter, e.g. CLAS or PROG"),
                        "max": json_schema_integer("Maximum number of results (default: 100)"),
                    }),
                    vec!["query"],
                ),
            ),
            ToolDefinition::new(
                "findObjectPath",
                "Find the package path of an ABAP object",
                json_schema_object(
                    json!({
                        "objectUrl": json_schema_string("URL of the object"),
                    }),
                    vec!["objectUrl"],
                ),
            ),
        ]
    }

    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "searchObject" => self.ctx.execute(tool, self.search_object(arguments)).await,
            "findObjectPath" => {
                self.ctx
                    .execute(tool, self.find_object_path(arguments))
                    .await
            }
            _ => Err(self.ctx.unknown_tool(tool)),
        }
    }

    fn metrics(&self) -> &RequestMetrics {
        self.ctx.metrics()
    }
}
