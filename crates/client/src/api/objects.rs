//! Repository object endpoints: sources, locks, deletion and search.

use crate::client::AdtClient;
use crate::error::{AdtError, AdtResult};
use crate::transport::AdtRequest;
use crate::xml::{self, XmlElement};
use adt_mcp_core::types::{LockResult, ObjectReference, PathStep, SourceOptions};

const LOCK_ACCEPT: &str = "application/*,application/vnd.sap.as+xml;charset=UTF-8;dataname=com.sap.adt.lock.result;q=0.8, application/vnd.sap.as+xml;charset=UTF-8;dataname=com.sap.adt.lock.result2;q=0.9";

/// Objects API for reading and changing repository objects.
pub struct ObjectsApi<'a> {
    client: &'a AdtClient,
}

impl<'a> ObjectsApi<'a> {
    pub(crate) fn new(client: &'a AdtClient) -> Self {
        Self { client }
    }

    /// Read the source text of an object.
    pub async fn source(&self, url: &str, options: &SourceOptions) -> AdtResult<String> {
        let request = AdtRequest::get(url)
            .query_opt("version", options.version.map(|v| v.as_str()))
            .accept("text/plain");
        self.client.http.send(request).await
    }

    /// Write the source text of a locked object.
    pub async fn set_source(
        &self,
        url: &str,
        source: &str,
        lock_handle: &str,
        transport: Option<&str>,
    ) -> AdtResult<()> {
        let request = AdtRequest::put(url)
            .query("lockHandle", lock_handle)
            .query_opt("corrNr", transport)
            .body("text/plain; charset=utf-8", source);
        self.client.http.send(request).await?;
        Ok(())
    }

    /// Lock an object for editing.
    pub async fn lock(&self, url: &str, access_mode: &str) -> AdtResult<LockResult> {
        let request = AdtRequest::post(url)
            .query("_action", "LOCK")
            .query("accessMode", access_mode)
            .accept(LOCK_ACCEPT);
        let body = self.client.http.send(request).await?;
        parse_lock_result(&body)
    }

    pub async fn unlock(&self, url: &str, lock_handle: &str) -> AdtResult<()> {
        let request = AdtRequest::post(url)
            .query("_action", "UNLOCK")
            .query("lockHandle", lock_handle);
        self.client.http.send(request).await?;
        Ok(())
    }

    /// Delete a locked object.
    pub async fn delete(
        &self,
        url: &str,
        lock_handle: &str,
        transport: Option<&str>,
    ) -> AdtResult<()> {
        let request = AdtRequest::delete(url)
            .query("lockHandle", lock_handle)
            .query_opt("corrNr", transport);
        self.client.http.send(request).await?;
        Ok(())
    }

    /// Quick search in the repository information system.
    pub async fn search(
        &self,
        query: &str,
        object_type: Option<&str>,
        max_results: u32,
    ) -> AdtResult<Vec<ObjectReference>> {
        let request = AdtRequest::get("/sap/bc/adt/repository/informationsystem/search")
            .query("operation", "quickSearch")
            .query("query", query)
            .query("maxResults", max_results.to_string())
            .query_opt("objectType", object_type)
            .accept("application/*");
        let body = self.client.http.send(request).await?;
        parse_object_references(&body, "objectReference")
    }

    /// Path from the package root down to an object.
    pub async fn node_path(&self, url: &str) -> AdtResult<Vec<PathStep>> {
        let request = AdtRequest::post("/sap/bc/adt/repository/nodepath")
            .query("uri", url)
            .accept("application/*");
        let body = self.client.http.send(request).await?;

        Ok(xml::collect_elements(&body, "objectLinkReference")?
            .into_iter()
            .map(|element| PathStep {
                name: element.attr_or_default("name"),
                object_type: element.attr_or_default("type"),
                uri: element.attr_or_default("uri"),
            })
            .collect())
    }
}

pub(crate) fn parse_lock_result(body: &str) -> AdtResult<LockResult> {
    let data = xml::collect_elements(body, "DATA")?
        .into_iter()
        .next()
        .ok_or_else(|| AdtError::UnexpectedResponse("lock response without DATA".to_string()))?;

    let lock_handle = data.field("LOCK_HANDLE");
    if lock_handle.is_empty() {
        return Err(AdtError::UnexpectedResponse(
            "lock response without LOCK_HANDLE".to_string(),
        ));
    }

    Ok(LockResult {
        lock_handle,
        corr_nr: data.field("CORRNR"),
        corr_user: data.field("CORRUSER"),
        corr_text: data.field("CORRTEXT"),
        is_local: data.field("IS_LOCAL") == "X",
        is_link_up: data.field("IS_LINK_UP") == "X",
        modification_support: data.field("MODIFICATION_SUPPORT") != "NoModification",
    })
}

pub(crate) fn parse_object_references(
    body: &str,
    element_name: &str,
) -> AdtResult<Vec<ObjectReference>> {
    Ok(xml::collect_elements(body, element_name)?
        .iter()
        .map(object_reference)
        .collect())
}

fn object_reference(element: &XmlElement) -> ObjectReference {
    ObjectReference {
        uri: element.attr_or_default("uri"),
        object_type: element.attr_or_default("type"),
        name: element.attr_or_default("name"),
        package_name: element.attr("packageName").map(str::to_string),
        description: element.attr("description").map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lock_result() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?><asx:abap xmlns:asx="http://www.sap.com/abapxml" version="1.0"><asx:values><DATA><LOCK_HANDLE>6A2F3C1D9E8B</LOCK_HANDLE><CORRNR>NPLK900042</CORRNR><CORRUSER>DEVELOPER</CORRUSER><CORRTEXT>Demo changes</CORRTEXT><IS_LOCAL/><IS_LINK_UP/><MODIFICATION_SUPPORT>ModificationsLoggedOnly</MODIFICATION_SUPPORT></DATA></asx:values></asx:abap>"#;

        let lock = parse_lock_result(body).unwrap();
        assert_eq!(lock.lock_handle, "6A2F3C1D9E8B");
        assert_eq!(lock.corr_nr, "NPLK900042");
        assert_eq!(lock.corr_text, "Demo changes");
        assert!(!lock.is_local);
        assert!(lock.modification_support);
    }

    #[test]
    fn test_parse_lock_result_without_handle() {
        let body = r#"<asx:abap xmlns:asx="http://www.sap.com/abapxml"><asx:values><DATA><LOCK_HANDLE/></DATA></asx:values></asx:abap>"#;
        assert!(matches!(
            parse_lock_result(body),
            Err(AdtError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_parse_search_results() {
        let body = r#"<adtcore:objectReferences xmlns:adtcore="http://www.sap.com/adt/core"><adtcore:objectReference adtcore:uri="/sap/bc/adt/oo/classes/zcl_example" adtcore:type="CLAS/OC" adtcore:name="ZCL_EXAMPLE" adtcore:packageName="$TMP" adtcore:description="Example class"/></adtcore:objectReferences>"#;

        let results = parse_object_references(body, "objectReference").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "ZCL_EXAMPLE");
        assert_eq!(results[0].package_name.as_deref(), Some("$TMP"));
        assert_eq!(results[0].description.as_deref(), Some("Example class"));
    }
}
