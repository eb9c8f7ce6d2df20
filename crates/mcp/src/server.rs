// MCP server: newline-delimited JSON-RPC 2.0 over stdio

use crate::protocol::*;
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, warn};

/// Rate-limit key used until a client names itself in `initialize`
pub const DEFAULT_CALLER: &str = "stdio";

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            server_info: ServerInfo {
                name: "adt-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn start(&self) -> Result<()> {
        info!(tools = self.registry.list_tools().len(), "MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one connection.
    ///
    /// Every `tools/call` runs on its own task; all responses go through a
    /// single writer task so lines never interleave.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut lines = FramedRead::new(reader, LinesCodec::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

        let writer_task = tokio::spawn(async move {
            let mut sink = FramedWrite::new(writer, LinesCodec::new());
            while let Some(response) = rx.recv().await {
                let line = serde_json::to_string(&response).context("Failed to encode response")?;
                sink.send(line).await.context("Failed to write response")?;
            }
            anyhow::Ok(())
        });

        let mut caller = DEFAULT_CALLER.to_string();
        let mut in_flight = JoinSet::new();

        loop {
            let line = tokio::select! {
                line = lines.next() => line,
                _ = tx.closed() => {
                    warn!("Response writer stopped, no longer reading requests");
                    break;
                }
            };
            let Some(line) = line else { break };
            let line = line.context("Failed to read request")?;
            if line.trim().is_empty() {
                continue;
            }

            let request = match parse_request(&line) {
                Ok(request) => request,
                Err(response) => {
                    if tx.send(*response).is_err() {
                        break;
                    }
                    continue;
                }
            };
            debug!(method = %request.method, id = ?request.id, "Received request");

            if request.is_notification() {
                continue;
            }
            let id = request.id.clone().unwrap_or(Value::Null);

            if request.method == "tools/call" {
                let registry = self.registry.clone();
                let caller = caller.clone();
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let response = call_tool(&registry, &caller, id, request.params).await;
                    if tx.send(response).is_err() {
                        debug!("Response dropped, writer has stopped");
                    }
                });
                continue;
            }

            let response = self.handle_request(id, request, &mut caller);
            if tx.send(response).is_err() {
                break;
            }
        }

        // Let running calls finish before the writer stops
        while in_flight.join_next().await.is_some() {}
        drop(tx);
        writer_task.await.context("Response writer panicked")??;

        self.log_metrics();
        Ok(())
    }

    /// Handle every method except `tools/call`
    fn handle_request(&self, id: Value, request: JsonRpcRequest, caller: &mut String) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams = request
                    .params
                    .and_then(|params| serde_json::from_value(params).ok())
                    .unwrap_or_default();

                if let Some(client) = params.client_info.filter(|c| !c.name.is_empty()) {
                    info!(client = %client.name, version = %client.version, "Client initialized");
                    *caller = client.name;
                }

                JsonRpcResponse::success(
                    id,
                    InitializeResult {
                        protocol_version: PROTOCOL_VERSION.to_string(),
                        capabilities: ServerCapabilities {
                            tools: Some(ToolsCapability {
                                list_changed: false,
                            }),
                        },
                        server_info: self.server_info.clone(),
                    },
                )
            }
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_tools().to_vec(),
                },
            ),
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        }
    }

    fn log_metrics(&self) {
        for (handler, metrics) in self.registry.metrics_report() {
            info!(
                handler,
                total = metrics.total_requests,
                success = metrics.success_count,
                errors = metrics.error_count,
                rejected = metrics.rejected_count,
                avg_ms = metrics.average_duration_ms,
                error_rate = metrics.error_rate,
                "Handler metrics"
            );
        }
    }
}

fn parse_request(line: &str) -> Result<JsonRpcRequest, Box<JsonRpcResponse>> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        warn!(error = %e, "Malformed JSON");
        Box::new(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e)))
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        Box::new(JsonRpcResponse::error(
            id,
            JsonRpcError::custom(
                JsonRpcError::INVALID_REQUEST,
                format!("Invalid Request: {}", e),
            ),
        ))
    })
}

async fn call_tool(
    registry: &ToolRegistry,
    caller: &str,
    id: Value,
    params: Option<Value>,
) -> JsonRpcResponse {
    let params: CallToolParams = match params.map(serde_json::from_value) {
        Some(Ok(params)) => params,
        Some(Err(e)) => {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
            )
        }
        None => {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params("Missing tools/call params"),
            )
        }
    };

    match registry.dispatch(caller, &params.name, params.arguments).await {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::error(id, error.into()),
    }
}
