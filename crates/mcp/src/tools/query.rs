// Data preview tools. Cell values stay strings end to end.

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::{
    json_schema_integer, json_schema_object, json_schema_string, parse_args, CapabilityHandler,
    HandlerContext, Payload,
};
use adt_mcp_core::{AdtSession, RateLimitPolicy, RequestMetrics};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_ROW_NUMBER: u32 = 100;

pub struct QueryHandler {
    ctx: HandlerContext,
}

fn default_row_number() -> u32 {
    DEFAULT_ROW_NUMBER
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableContentsArgs {
    ddic_entity_name: String,
    #[serde(default = "default_row_number")]
    row_number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryArgs {
    #[serde(default)]
    sql_query: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default = "default_row_number")]
    row_number: u32,
}

impl QueryHandler {
    pub fn new(session: Arc<dyn AdtSession>, policy: RateLimitPolicy) -> Self {
        Self {
            ctx: HandlerContext::new("query", session, policy),
        }
    }

    async fn table_contents(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: TableContentsArgs = parse_args("tableContents", arguments)?;

        let result = self
            .ctx
            .session()
            .table_contents(&args.ddic_entity_name, args.row_number)
            .await
            .map_err(|e| ToolError::remote("Read table contents", &e))?;

        Ok(json!({
            "ddicEntityName": args.ddic_entity_name,
            "result": result,
        }))
    }

    async fn run_query(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: RunQueryArgs = parse_args("runQuery", arguments)?;
        let sql = Payload::exclusive(args.sql_query, "sqlQuery", args.file_path)?
            .resolve()
            .await?;

        let result = self
            .ctx
            .session()
            .run_query(sql.trim(), args.row_number)
            .await
            .map_err(|e| ToolError::remote("Run query", &e))?;

        Ok(json!({ "result": result }))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for QueryHandler {
    fn name(&self) -> &'static str {
        self.ctx.name()
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "tableContents",
                "Read rows of a DDIC table or CDS view",
                json_schema_object(
                    json!({
                        "ddicEntityName": json_schema_string("Name of the table or view"),
                        "rowNumber": json_schema_integer("Maximum number of rows (default: 100)"),
                    }),
                    vec!["ddicEntityName"],
                ),
            ),
            ToolDefinition::new(
                "runQuery",
                "Run an ABAP SQL select, given inline or read from a local file",
                json_schema_object(
                    json!({
                        "sqlQuery": json_schema_string("SQL select statement (exclusive with filePath)"),
                        "filePath": json_schema_string("Local file holding the statement (exclusive with sqlQuery)"),
                        "rowNumber": json_schema_integer("Maximum number of rows (default: 100)"),
                    }),
                    vec![],
                ),
            ),
        ]
    }

    async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        match tool {
            "tableContents" => self.ctx.execute(tool, self.table_contents(arguments)).await,
            "runQuery" => self.ctx.execute(tool, self.run_query(arguments)).await,
            _ => Err(self.ctx.unknown_tool(tool)),
        }
    }

    fn metrics(&self) -> &RequestMetrics {
        self.ctx.metrics()
    }
}
