pub mod auth;
pub mod code_analysis;
pub mod object_deletion;
pub mod object_lock;
pub mod object_management;
pub mod object_search;
pub mod object_source;
pub mod query;
pub mod transport;
mod handler;
mod registry;

#[cfg(test)]
pub(crate) mod mock;

pub use auth::AuthHandler;
pub use code_analysis::CodeAnalysisHandler;
pub use handler::{
    ensure_parent_dir, parse_args, success_result, CapabilityHandler, HandlerContext, Payload,
};
pub use object_deletion::ObjectDeletionHandler;
pub use object_lock::ObjectLockHandler;
pub use object_management::ObjectManagementHandler;
pub use object_search::ObjectSearchHandler;
pub use object_source::ObjectSourceHandler;
pub use query::QueryHandler;
pub use registry::{
    json_schema_boolean, json_schema_enum, json_schema_integer, json_schema_object,
    json_schema_string, ToolRegistry,
};
pub use transport::TransportHandler;

use adt_mcp_core::{AdtSession, RateLimitPolicy};
use std::sync::Arc;

/// Every capability handler, in discovery order, sharing one session
pub fn default_handlers(
    session: Arc<dyn AdtSession>,
    policy: RateLimitPolicy,
) -> Vec<Arc<dyn CapabilityHandler>> {
    vec![
        Arc::new(AuthHandler::new(session.clone(), policy)),
        Arc::new(ObjectSourceHandler::new(session.clone(), policy)),
        Arc::new(ObjectLockHandler::new(session.clone(), policy)),
        Arc::new(ObjectDeletionHandler::new(session.clone(), policy)),
        Arc::new(ObjectManagementHandler::new(session.clone(), policy)),
        Arc::new(ObjectSearchHandler::new(session.clone(), policy)),
        Arc::new(TransportHandler::new(session.clone(), policy)),
        Arc::new(CodeAnalysisHandler::new(session.clone(), policy)),
        Arc::new(QueryHandler::new(session, policy)),
    ]
}
