// Standalone MCP server binary

use adt_mcp::config::{ConfigOverrides, ServerConfig};
use adt_mcp::server::McpServer;
use adt_mcp::tools::{default_handlers, ToolRegistry};
use adt_mcp_core::{AdtSession, SessionType};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "adt-mcp")]
#[command(about = "MCP server for the ABAP Development Tools (ADT) API", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "adt-mcp.toml")]
    config: PathBuf,

    /// Base URL of the ABAP system
    #[arg(long, env = "SAP_URL")]
    url: Option<String>,

    #[arg(long, env = "SAP_USER")]
    user: Option<String>,

    #[arg(long, env = "SAP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// SAP client (mandant)
    #[arg(long, env = "SAP_CLIENT")]
    client: Option<String>,

    #[arg(long, env = "SAP_LANGUAGE")]
    language: Option<String>,

    /// stateful or stateless
    #[arg(long, env = "SAP_SESSION_TYPE")]
    session_type: Option<SessionType>,

    #[arg(long, env = "SAP_ALLOW_INSECURE_TLS")]
    allow_insecure_tls: Option<bool>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "adt_mcp=info".into());

    // stdout carries the protocol
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    tracing::info!("ADT MCP server starting...");

    let mut config = ServerConfig::load(&args.config)?;
    config.apply_overrides(ConfigOverrides {
        url: args.url,
        user: args.user,
        password: args.password,
        client: args.client,
        language: args.language,
        session_type: args.session_type,
        allow_insecure_tls: args.allow_insecure_tls,
    });
    config.validate()?;

    tracing::info!(
        url = %config.adt.url,
        user = %config.adt.user,
        session_type = %config.adt.session_type,
        "Connecting to ABAP system"
    );

    // One session shared by every handler
    let session: Arc<dyn AdtSession> = Arc::new(config.build_client()?);
    let registry = ToolRegistry::new(default_handlers(session, config.rate_limit_policy()))?;

    tracing::info!("Registered {} tools", registry.list_tools().len());

    let server = McpServer::new(registry);
    server.start().await?;

    tracing::info!("ADT MCP server stopped");
    Ok(())
}
