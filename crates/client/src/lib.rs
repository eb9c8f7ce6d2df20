//! # ADT client
//!
//! Async client for the ABAP Development Tools (ADT) REST API of an SAP
//! system. [`AdtClient`] implements [`adt_mcp_core::AdtSession`], so the
//! MCP front-end can drive it through a trait object.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use adt_mcp_client::{AdtClient, AdtResult};
//! use adt_mcp_core::SourceOptions;
//!
//! #[tokio::main]
//! async fn main() -> AdtResult<()> {
//!     let client = AdtClient::builder()
//!         .base_url("https://sap.example.com:44300")
//!         .credentials("DEVELOPER", "secret")
//!         .client("001")
//!         .build()?;
//!
//!     client.login().await?;
//!
//!     let source = client
//!         .objects()
//!         .source(
//!             "/sap/bc/adt/programs/programs/zdemo/source/main",
//!             &SourceOptions::default(),
//!         )
//!         .await?;
//!     println!("{}", source);
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Stateful sessions
//!
//! With [`SessionType::Stateful`] (the default) every request carries the
//! `X-sap-adt-sessiontype: stateful` header, session cookies are kept, and
//! requests are serialized so that lock handles stay valid between a
//! `lock` and the write that uses it.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;
pub mod xml;

pub use client::{AdtClient, AdtClientBuilder};
pub use config::{ClientConfig, RetryConfig};
pub use error::{AdtError, AdtResult};

pub use adt_mcp_core::SessionType;
