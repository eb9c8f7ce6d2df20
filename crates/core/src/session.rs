// Session client boundary towards the ABAP system

use crate::types::{
    ActivationResult, LockResult, ObjectReference, PathStep, QueryResult, ReleaseReport,
    SourceOptions, SyntaxMessage, TransportInfo, TransportRequest,
};
use anyhow::Result;

/// Stateful access to an ABAP system through the ADT REST API.
///
/// One instance is created at startup and shared by every capability handler.
/// Handlers hold it as `Arc<dyn AdtSession>` and never construct or close it.
/// Implementations own authentication state, the session cookie and any lock
/// held on the server. A lock acquired through one call stays held until a
/// matching `unlock`, no matter which caller issues it.
///
/// Errors are opaque: callers only rely on their display message.
#[async_trait::async_trait]
pub trait AdtSession: Send + Sync {
    /// Authenticate and fetch a CSRF token
    async fn login(&self) -> Result<bool>;

    async fn logout(&self) -> Result<()>;

    /// Forget the server-side session without logging off
    async fn drop_session(&self) -> Result<()>;

    async fn get_object_source(&self, url: &str, options: &SourceOptions) -> Result<String>;

    async fn set_object_source(
        &self,
        url: &str,
        source: &str,
        lock_handle: &str,
        transport: Option<&str>,
    ) -> Result<()>;

    async fn lock(&self, url: &str, access_mode: &str) -> Result<LockResult>;

    async fn unlock(&self, url: &str, lock_handle: &str) -> Result<()>;

    async fn delete_object(
        &self,
        url: &str,
        lock_handle: &str,
        transport: Option<&str>,
    ) -> Result<()>;

    async fn activate_by_name(
        &self,
        name: &str,
        url: &str,
        main_include: Option<&str>,
    ) -> Result<ActivationResult>;

    async fn inactive_objects(&self) -> Result<Vec<ObjectReference>>;

    async fn search_object(
        &self,
        query: &str,
        object_type: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<ObjectReference>>;

    async fn find_object_path(&self, url: &str) -> Result<Vec<PathStep>>;

    async fn transport_info(
        &self,
        url: &str,
        devclass: Option<&str>,
        operation: &str,
    ) -> Result<TransportInfo>;

    /// Create a transport request and return its number
    async fn create_transport(
        &self,
        url: &str,
        request_text: &str,
        devclass: &str,
        transport_layer: Option<&str>,
    ) -> Result<String>;

    async fn user_transports(&self, user: &str, targets: bool) -> Result<Vec<TransportRequest>>;

    async fn transport_release(
        &self,
        number: &str,
        ignore_locks: bool,
        ignore_atc: bool,
    ) -> Result<ReleaseReport>;

    async fn syntax_check(
        &self,
        url: &str,
        main_url: &str,
        source: &str,
        main_program: Option<&str>,
    ) -> Result<Vec<SyntaxMessage>>;

    async fn table_contents(&self, ddic_entity: &str, row_number: u32) -> Result<QueryResult>;

    async fn run_query(&self, sql: &str, row_number: u32) -> Result<QueryResult>;
}
