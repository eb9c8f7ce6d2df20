// MCP (Model Context Protocol) server exposing the ABAP Development Tools API
// as tools to agent clients

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use config::{ConfigOverrides, ServerConfig};
pub use error::ToolError;
pub use server::McpServer;
pub use tools::{default_handlers, CapabilityHandler, ToolRegistry};
