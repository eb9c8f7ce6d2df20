// Change and Transport System tools

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{
    json_schema_boolean, json_schema_object, json_schema_string, parse_args, CapabilityHandler,
    HandlerContext,
};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub struct TransportHandler {
    ctx: HandlerContext,
}

fn default_operation() -> String {
    "I".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransportInfoArgs {
    obj_source_url: String,
    #[serde(default)]
    dev_class: Option<String>,
    #[serde(default = "default_operation")]
    operation: String,
}

#[derive(Debug, Deserialize)]
struct CreateTransportArgs {
    #[serde(rename = "objSourceUrl")]
    obj_source_url: String,
    #[serde(rename = "REQUEST_TEXT")]
    request_text: String,
    #[serde(rename = "DEVCLASS")]
    devclass: String,
    #[serde(rename = "transportLayer", default)]
    transport_layer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserTransportsArgs {
    user: String,
    #[serde(default = "default_true")]
    targets: bool,
}

#[derive(Debug, Deserialize)]
struct ReleaseArgs {
    #[serde(rename = "transportNumber")]
    transport_number: String,
    #[serde(rename = "ignoreLocks", default)]
    ignore_locks: bool,
    #[serde(rename = "IgnoreATC", default)]
    ignore_atc: bool,
}

impl TransportHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("transport", session, policy),
        }
    }

    async fn transport_info(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: TransportInfoArgs = parse_args("transportInfo", arguments)?;

        let info = self
            .ctx
            .session()
            .transport_info(
                &args.obj_source_url,
                args.dev_class.as_deref().filter(|d| !d.is_empty()),
                &args.operation,
            )
            .await
            .map_err(|e| ToolError::remote("Get transport info", &e))?;

        Ok(json!({
            "objSourceUrl": args.obj_source_url,
            "requiresTransport": info.requires_transport(),
            "transportInfo": info,
        }))
    }

    async fn create_transport(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: CreateTransportArgs = parse_args("createTransport", arguments)?;

        let number = self
            .ctx
            .session()
            .create_transport(
                &args.obj_source_url,
                &args.request_text,
                &args.devclass,
                args.transport_layer.as_deref().filter(|l| !l.is_empty()),
            )
            .await
            .map_err(|e| ToolError::remote("Create transport", &e))?;

        info!(transport = %number, devclass = %args.devclass, "Created transport request");
        Ok(json!({ "transportNumber": number }))
    }

    async fn user_transports(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: UserTransportsArgs = parse_args("userTransports", arguments)?;

        let transports = self
            .ctx
            .session()
            .user_transports(&args.user, args.targets)
            .await
            .map_err(|e| ToolError::remote("List user transports", &e))?;

        Ok(json!({
            "user": args.user,
            "count": transports.len(),
            "transports": transports,
        }))
    }

    async fn transport_release(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: ReleaseArgs = parse_args("transportRelease", arguments)?;

        let report = self
            .ctx
            .session()
            .transport_release(&args.transport_number, args.ignore_locks, args.ignore_atc)
            .await
            .map_err(|e| ToolError::remote("Release transport", &e))?;

        info!(transport = %args.transport_number, status = %report.status, "Released transport request");
        Ok(json!({
            "transportNumber": args.transport_number,
            "report": report,
        }))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for TransportHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "transportInfo",
                "Check whether changes to an object need a transport and list candidate requests",
                json_schema_object(
                    json!({
                        "objSourceUrl": json_schema_string("URL of the object source"),
                        "devClass": json_schema_string("Package of the object"),
                        "operation": json_schema_string("Operation, I for insert/change (default: I)"),
                    }),
                    vec!["objSourceUrl"],
                ),
            ),
            ToolDefinition::new(
                "createTransport",
                "Create a new transport request",
                json_schema_object(
                    json!({
                        "objSourceUrl": json_schema_string("URL of the object source"),
                        "REQUEST_TEXT": json_schema_string("Description of the request"),
                        "DEVCLASS": json_schema_string("Package of the object"),
                        "transportLayer": json_schema_string("Transport layer"),
                    }),
                    vec!["objSourceUrl", "REQUEST_TEXT", "DEVCLASS"],
                ),
            ),
            ToolDefinition::new(
                "userTransports",
                "List the transport requests of a user",
                json_schema_object(
                    json!({
                        "user": json_schema_string("User name"),
                        "targets": json_schema_boolean("Include transport targets (default: true)"),
                    }),
                    vec!["user"],
                ),
            ),
            ToolDefinition::new(
                "transportRelease",
                "Release a transport request",
                json_schema_object(
                    json!({
                        "transportNumber": json_schema_string("Transport request number"),
                        "ignoreLocks": json_schema_boolean("Release even if objects are locked (default: false)"),
                        "IgnoreATC": json_schema_boolean("Skip ATC checks (default: false)"),
                    }),
                    vec!["transportNumber"],
                ),
            ),
        ]
    }

    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "transportInfo" => self.ctx.execute(tool, self.transport_info(arguments)).await,
            "createTransport" => {
                self.ctx
                    .execute(tool, self.create_transport(arguments))
                    .await
            }
            "userTransports" => {
                self.ctx
                    .execute(tool, self.user_transports(arguments))
                    .await
            }
            "transportRelease" => {
                self.ctx
                    .execute(tool, self.transport_release(arguments))
                    .await
            }
            _ => Err(self.ctx.unknown_tool(tool)),
        }
    }

    fn metrics(&self) -> &RequestMetrics {
        self.ctx.metrics()
    }
}
