//! Activation endpoints.

use crate::api::objects::parse_object_references;
use crate::client::AdtClient;
use crate::error::AdtResult;
use crate::transport::AdtRequest;
use crate::xml;
use adt_mcp_core::types::{ActivationMessage, ActivationResult, ObjectReference};

/// Activation API.
pub struct ActivationApi<'a> {
    client: &'a AdtClient,
}

impl<'a> ActivationApi<'a> {
    pub(crate) fn new(client: &'a AdtClient) -> Self {
        Self { client }
    }

    /// Activate a single object.
    ///
    /// Includes are activated in the context of `main_include`.
    pub async fn activate(
        &self,
        name: &str,
        url: &str,
        main_include: Option<&str>,
    ) -> AdtResult<ActivationResult> {
        let request = AdtRequest::post("/sap/bc/adt/activation")
            .query("method", "activate")
            .query("preauditRequested", "true")
            .accept("application/xml")
            .body("application/xml", activation_body(name, url, main_include));
        let body = self.client.http.send(request).await?;
        parse_activation_result(&body)
    }

    /// Objects with an inactive version.
    pub async fn inactive_objects(&self) -> AdtResult<Vec<ObjectReference>> {
        let request = AdtRequest::get("/sap/bc/adt/activation/inactiveobjects")
            .accept("application/vnd.sap.adt.inactivectsobjects.v1+xml, application/xml;q=0.8");
        let body = self.client.http.send(request).await?;
        parse_object_references(&body, "ref")
    }
}

fn activation_body(name: &str, url: &str, main_include: Option<&str>) -> String {
    let uri = match main_include {
        Some(main) if !main.is_empty() => {
            let context: String = url::form_urlencoded::byte_serialize(main.as_bytes()).collect();
            format!("{}?context={}", url, context)
        }
        _ => url.to_string(),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><adtcore:objectReferences xmlns:adtcore="http://www.sap.com/adt/core"><adtcore:objectReference adtcore:uri="{}" adtcore:name="{}"/></adtcore:objectReferences>"#,
        xml::escape(&uri),
        xml::escape(name)
    )
}

/// An empty body means the object was activated without findings.
pub(crate) fn parse_activation_result(body: &str) -> AdtResult<ActivationResult> {
    if body.trim().is_empty() {
        return Ok(ActivationResult {
            success: true,
            ..Default::default()
        });
    }

    let messages: Vec<ActivationMessage> = xml::collect_elements(body, "msg")?
        .into_iter()
        .map(|element| ActivationMessage {
            object_description: element.attr("objDescr").map(str::to_string),
            severity: element.attr_or_default("type"),
            line: element.attr("line").and_then(|line| line.parse().ok()),
            href: element.attr("href").map(str::to_string),
            text: element.text.trim().to_string(),
        })
        .collect();
    let inactive = parse_object_references(body, "ref")?;

    let success = !messages.iter().any(ActivationMessage::is_error) && inactive.is_empty();
    Ok(ActivationResult {
        success,
        messages,
        inactive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_body_with_context() {
        let body = activation_body(
            "ZPROG_F01",
            "/sap/bc/adt/programs/includes/zprog_f01",
            Some("/sap/bc/adt/programs/programs/zprog"),
        );

        assert!(body.contains(
            r#"adtcore:uri="/sap/bc/adt/programs/includes/zprog_f01?context=%2Fsap%2Fbc%2Fadt%2Fprograms%2Fprograms%2Fzprog""#
        ));
        assert!(body.contains(r#"adtcore:name="ZPROG_F01""#));
    }

    #[test]
    fn test_empty_response_is_success() {
        let result = parse_activation_result("").unwrap();
        assert!(result.success);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_activation_errors() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?><chkl:messages xmlns:chkl="http://www.sap.com/abapxml/checklist"><msg objDescr="Class ZCL_EXAMPLE" type="E" line="12" href="/sap/bc/adt/oo/classes/zcl_example/source/main#start=12,4" forceSupported="true"><shortText><txt>Statement "WRTE" is not defined.</txt></shortText></msg><msg objDescr="Class ZCL_EXAMPLE" type="W" line="3"><shortText><txt>Unused variable</txt></shortText></msg></chkl:messages>"#;

        let result = parse_activation_result(body).unwrap();
        assert!(!result.success);
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[0].line, Some(12));
        assert_eq!(result.messages[0].text, "Statement \"WRTE\" is not defined.");
        assert_eq!(result.messages[1].severity, "W");
    }

    #[test]
    fn test_warnings_only_is_success() {
        let body = r#"<chkl:messages xmlns:chkl="http://www.sap.com/abapxml/checklist"><msg type="W"><shortText><txt>Unused variable</txt></shortText></msg></chkl:messages>"#;

        assert!(parse_activation_result(body).unwrap().success);
    }
}
