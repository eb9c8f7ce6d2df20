// Recording AdtSession double for handler and registry tests

use adt_mcp_core::types::{
    ActivationResult, LockResult, ObjectReference, PathStep, QueryResult, ReleaseReport,
    SourceOptions, SyntaxMessage, TransportInfo, TransportRequest,
};
use adt_mcp_core::AdtSession;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub args: Vec<String>,
}

/// Records every call and answers with primed values.
///
/// Unprimed methods return defaults; `fail` makes a method return an error.
#[derive(Default)]
pub struct MockSession {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<&'static str, String>>,
    pub source: Mutex<String>,
    pub lock_result: Mutex<LockResult>,
    pub activation: Mutex<ActivationResult>,
    pub objects: Mutex<Vec<ObjectReference>>,
    pub syntax_messages: Mutex<Vec<SyntaxMessage>>,
    pub query_result: Mutex<QueryResult>,
    pub transport_number: Mutex<String>,
}

impl MockSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn shared() -> Arc<dyn AdtSession> {
        Self::new()
    }

    pub fn with_source(source: impl Into<String>) -> Arc<Self> {
        let session = Self::default();
        *session.source.lock().unwrap() = source.into();
        Arc::new(session)
    }

    pub fn fail(&self, method: &'static str, message: impl Into<String>) {
        self.failures.lock().unwrap().insert(method, message.into());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, method: &'static str, args: &[&str]) -> Result<()> {
        self.calls.lock().unwrap().push(Call {
            method,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        });
        match self.failures.lock().unwrap().get(method) {
            Some(message) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

#[async_trait::async_trait]
impl AdtSession for MockSession {
    async fn login(&self) -> Result<bool> {
        self.record("login", &[])?;
        Ok(true)
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout", &[])
    }

    async fn drop_session(&self) -> Result<()> {
        self.record("drop_session", &[])
    }

    async fn get_object_source(&self, url: &str, options: &SourceOptions) -> Result<String> {
        let version = options.version.map(|version| version.as_str());
        self.record("get_object_source", &[url, opt(version)])?;
        Ok(self.source.lock().unwrap().clone())
    }

    async fn set_object_source(
        &self,
        url: &str,
        source: &str,
        lock_handle: &str,
        transport: Option<&str>,
    ) -> Result<()> {
        self.record(
            "set_object_source",
            &[url, source, lock_handle, opt(transport)],
        )
    }

    async fn lock(&self, url: &str, access_mode: &str) -> Result<LockResult> {
        self.record("lock", &[url, access_mode])?;
        Ok(self.lock_result.lock().unwrap().clone())
    }

    async fn unlock(&self, url: &str, lock_handle: &str) -> Result<()> {
        self.record("unlock", &[url, lock_handle])
    }

    async fn delete_object(
        &self,
        url: &str,
        lock_handle: &str,
        transport: Option<&str>,
    ) -> Result<()> {
        self.record("delete_object", &[url, lock_handle, opt(transport)])
    }

    async fn activate_by_name(
        &self,
        name: &str,
        url: &str,
        main_include: Option<&str>,
    ) -> Result<ActivationResult> {
        self.record("activate_by_name", &[name, url, opt(main_include)])?;
        Ok(self.activation.lock().unwrap().clone())
    }

    async fn inactive_objects(&self) -> Result<Vec<ObjectReference>> {
        self.record("inactive_objects", &[])?;
        Ok(self.objects.lock().unwrap().clone())
    }

    async fn search_object(
        &self,
        query: &str,
        object_type: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<ObjectReference>> {
        let max = max_results.to_string();
        self.record("search_object", &[query, opt(object_type), &max])?;
        Ok(self.objects.lock().unwrap().clone())
    }

    async fn find_object_path(&self, url: &str) -> Result<Vec<PathStep>> {
        self.record("find_object_path", &[url])?;
        Ok(Vec::new())
    }

    async fn transport_info(
        &self,
        url: &str,
        devclass: Option<&str>,
        operation: &str,
    ) -> Result<TransportInfo> {
        self.record("transport_info", &[url, opt(devclass), operation])?;
        Ok(TransportInfo::default())
    }

    async fn create_transport(
        &self,
        url: &str,
        request_text: &str,
        devclass: &str,
        transport_layer: Option<&str>,
    ) -> Result<String> {
        self.record(
            "create_transport",
            &[url, request_text, devclass, opt(transport_layer)],
        )?;
        Ok(self.transport_number.lock().unwrap().clone())
    }

    async fn user_transports(&self, user: &str, targets: bool) -> Result<Vec<TransportRequest>> {
        let targets = targets.to_string();
        self.record("user_transports", &[user, &targets])?;
        Ok(Vec::new())
    }

    async fn transport_release(
        &self,
        number: &str,
        ignore_locks: bool,
        ignore_atc: bool,
    ) -> Result<ReleaseReport> {
        let ignore_locks = ignore_locks.to_string();
        let ignore_atc = ignore_atc.to_string();
        self.record("transport_release", &[number, &ignore_locks, &ignore_atc])?;
        Ok(ReleaseReport {
            number: number.to_string(),
            status: "released".to_string(),
            messages: Vec::new(),
        })
    }

    async fn syntax_check(
        &self,
        url: &str,
        main_url: &str,
        source: &str,
        main_program: Option<&str>,
    ) -> Result<Vec<SyntaxMessage>> {
        self.record("syntax_check", &[url, main_url, source, opt(main_program)])?;
        Ok(self.syntax_messages.lock().unwrap().clone())
    }

    async fn table_contents(&self, ddic_entity: &str, row_number: u32) -> Result<QueryResult> {
        let rows = row_number.to_string();
        self.record("table_contents", &[ddic_entity, &rows])?;
        Ok(self.query_result.lock().unwrap().clone())
    }

    async fn run_query(&self, sql: &str, row_number: u32) -> Result<QueryResult> {
        let rows = row_number.to_string();
        self.record("run_query", &[sql, &rows])?;
        Ok(self.query_result.lock().unwrap().clone())
    }
}
