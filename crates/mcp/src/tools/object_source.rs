// Object source tools: read, write and download ABAP source code

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{
    ensure_parent_dir, json_schema_enum, json_schema_object, json_schema_string, parse_args,
    CapabilityHandler, HandlerContext, Payload,
};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics, SourceOptions};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Handler for object source tools
pub struct ObjectSourceHandler {
    ctx: HandlerContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetSourceArgs {
    object_source_url: String,
    #[serde(default)]
    options: SourceOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetSourceArgs {
    object_source_url: String,
    lock_handle: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    transport: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadSourceArgs {
    object_source_url: String,
    file_path: String,
    #[serde(default)]
    options: SourceOptions,
}

impl ObjectSourceHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("object_source", session, policy),
        }
    }

    async fn get_object_source(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: GetSourceArgs = parse_args("getObjectSource", arguments)?;

        let source = self
            .ctx
            .session()
            .get_object_source(&args.object_source_url, &args.options)
            .await
            .map_err(|e| ToolError::remote("Get object source", &e))?;

        Ok(json!({ "source": source }))
    }

    async fn set_object_source(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: SetSourceArgs = parse_args("setObjectSource", arguments)?;
        let source = Payload::exclusive(args.source, "source", args.file_path)?
            .resolve()
            .await?;

        self.ctx
            .session()
            .set_object_source(
                &args.object_source_url,
                &source,
                &args.lock_handle,
                args.transport.as_deref().filter(|t| !t.is_empty()),
            )
            .await
            .map_err(|e| ToolError::remote("Set object source", &e))?;

        Ok(json!({
            "updated": true,
            "objectSourceUrl": args.object_source_url,
        }))
    }

    async fn download_object_source(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: DownloadSourceArgs = parse_args("downloadObjectSource", arguments)?;
        if args.file_path.is_empty() {
            return Err(ToolError::InvalidParams("filePath must not be empty".to_string()));
        }

        let source = self
            .ctx
            .session()
            .get_object_source(&args.object_source_url, &args.options)
            .await
            .map_err(|e| ToolError::remote("Download object source", &e))?;

        let path = PathBuf::from(&args.file_path);
        ensure_parent_dir(&path).await?;
        tokio::fs::write(&path, source.as_bytes()).await.map_err(|e| {
            ToolError::InvalidRequest(format!("Failed to write file {}: {}", args.file_path, e))
        })?;

        let size = source.len();
        let lines = source.lines().count();
        info!(file = %args.file_path, size, lines, "Downloaded object source");

        Ok(json!({
            "objectSourceUrl": args.object_source_url,
            "filePath": args.file_path,
            "size": size,
            "lines": lines,
        }))
    }
}

fn version_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "version": json_schema_enum(
                &["active", "inactive", "workingarea"],
                "Source version to read (default: active)"
            )
        }
    })
}

#[async_trait::async_trait]
impl CapabilityHandler for ObjectSourceHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "getObjectSource",
                "Retrieve the source code of an ABAP object",
                json_schema_object(
                    json!({
                        "objectSourceUrl": json_schema_string("URL of the object source"),
                        "options": version_schema(),
                    }),
                    vec!["objectSourceUrl"],
                ),
            ),
            ToolDefinition::new(
                "setObjectSource",
                "Write the source code of a locked ABAP object, given inline or read from a local file",
                json_schema_object(
                    json!({
                        "objectSourceUrl": json_schema_string("URL of the object source"),
                        "lockHandle": json_schema_string("Lock handle returned by lock"),
                        "source": json_schema_string("New source code (exclusive with filePath)"),
                        "filePath": json_schema_string("Local file holding the new source code (exclusive with source)"),
                        "transport": json_schema_string("Transport request number"),
                    }),
                    vec!["objectSourceUrl", "lockHandle"],
                ),
            ),
            ToolDefinition::new(
                "downloadObjectSource",
                "Save the source code of an ABAP object to a local file",
                json_schema_object(
                    json!({
                        "objectSourceUrl": json_schema_string("URL of the object source"),
                        "filePath": json_schema_string("Local file to write; missing directories are created"),
                        "options": version_schema(),
                    }),
                    vec!["objectSourceUrl", "filePath"],
                ),
            ),
        ]
    }

    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "getObjectSource" => {
                self.ctx
                    .execute(tool, self.get_object_source(arguments))
                    .await
            }
            "setObjectSource" => {
                self.ctx
                    .execute(tool, self.set_object_source(arguments))
                    .await
            }
            "downloadObjectSource" => {
                self.ctx
                    .execute(tool, self.download_object_source(arguments))
                    .await
            }
            _ => Err(self.ctx.unknown_tool(tool)),
        }
    }

    fn metrics(&self) -> &RequestMetrics {
        self.ctx.metrics()
    }
}
