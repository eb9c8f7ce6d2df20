//! `AdtSession` implementation backed by the HTTP client.

use crate::client::AdtClient;
use adt_mcp_core::types::{
    ActivationResult, LockResult, ObjectReference, PathStep, QueryResult, ReleaseReport,
    SourceOptions, SyntaxMessage, TransportInfo, TransportRequest,
};
use adt_mcp_core::AdtSession;
use anyhow::Result;

#[async_trait::async_trait]
impl AdtSession for AdtClient {
    async fn login(&self) -> Result<bool> {
        AdtClient::login(self).await?;
        Ok(true)
    }

    async fn logout(&self) -> Result<()> {
        Ok(AdtClient::logout(self).await?)
    }

    async fn drop_session(&self) -> Result<()> {
        Ok(AdtClient::drop_session(self)?)
    }

    async fn get_object_source(&self, url: &str, options: &SourceOptions) -> Result<String> {
        Ok(self.objects().source(url, options).await?)
    }

    async fn set_object_source(
        &self,
        url: &str,
        source: &str,
        lock_handle: &str,
        transport: Option<&str>,
    ) -> Result<()> {
        Ok(self
            .objects()
            .set_source(url, source, lock_handle, transport)
            .await?)
    }

    async fn lock(&self, url: &str, access_mode: &str) -> Result<LockResult> {
        Ok(self.objects().lock(url, access_mode).await?)
    }

    async fn unlock(&self, url: &str, lock_handle: &str) -> Result<()> {
        Ok(self.objects().unlock(url, lock_handle).await?)
    }

    async fn delete_object(
        &self,
        url: &str,
        lock_handle: &str,
        transport: Option<&str>,
    ) -> Result<()> {
        Ok(self.objects().delete(url, lock_handle, transport).await?)
    }

    async fn activate_by_name(
        &self,
        name: &str,
        url: &str,
        main_include: Option<&str>,
    ) -> Result<ActivationResult> {
        Ok(self.activation().activate(name, url, main_include).await?)
    }

    async fn inactive_objects(&self) -> Result<Vec<ObjectReference>> {
        Ok(self.activation().inactive_objects().await?)
    }

    async fn search_object(
        &self,
        query: &str,
        object_type: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<ObjectReference>> {
        Ok(self.objects().search(query, object_type, max_results).await?)
    }

    async fn find_object_path(&self, url: &str) -> Result<Vec<PathStep>> {
        Ok(self.objects().node_path(url).await?)
    }

    async fn transport_info(
        &self,
        url: &str,
        devclass: Option<&str>,
        operation: &str,
    ) -> Result<TransportInfo> {
        Ok(self.transports().info(url, devclass, operation).await?)
    }

    async fn create_transport(
        &self,
        url: &str,
        request_text: &str,
        devclass: &str,
        transport_layer: Option<&str>,
    ) -> Result<String> {
        Ok(self
            .transports()
            .create(url, request_text, devclass, transport_layer)
            .await?)
    }

    async fn user_transports(&self, user: &str, targets: bool) -> Result<Vec<TransportRequest>> {
        Ok(self.transports().user_transports(user, targets).await?)
    }

    async fn transport_release(
        &self,
        number: &str,
        ignore_locks: bool,
        ignore_atc: bool,
    ) -> Result<ReleaseReport> {
        Ok(self
            .transports()
            .release(number, ignore_locks, ignore_atc)
            .await?)
    }

    async fn syntax_check(
        &self,
        url: &str,
        main_url: &str,
        source: &str,
        main_program: Option<&str>,
    ) -> Result<Vec<SyntaxMessage>> {
        Ok(self
            .checks()
            .syntax_check(url, main_url, source, main_program)
            .await?)
    }

    async fn table_contents(&self, ddic_entity: &str, row_number: u32) -> Result<QueryResult> {
        Ok(self
            .data_preview()
            .table_contents(ddic_entity, row_number)
            .await?)
    }

    async fn run_query(&self, sql: &str, row_number: u32) -> Result<QueryResult> {
        Ok(self.data_preview().run_query(sql, row_number).await?)
    }
}
