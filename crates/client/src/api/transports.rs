//! Change and Transport System (CTS) endpoints.

use crate::client::AdtClient;
use crate::error::{AdtError, AdtResult};
use crate::transport::AdtRequest;
use crate::xml;
use adt_mcp_core::types::{
    ReleaseMessage, ReleaseReport, TransportHeader, TransportInfo, TransportRequest,
};

const CHECK_DATA_TYPE: &str =
    "application/vnd.sap.as+xml; charset=UTF-8; dataname=com.sap.adt.transport.service.checkData";
const CREATE_REQUEST_TYPE: &str =
    "application/vnd.sap.as+xml; charset=UTF-8; dataname=com.sap.adt.CreateCorrectionRequest";

/// Transports API.
pub struct TransportsApi<'a> {
    client: &'a AdtClient,
}

impl<'a> TransportsApi<'a> {
    pub(crate) fn new(client: &'a AdtClient) -> Self {
        Self { client }
    }

    /// Check which transports an object change can be recorded on.
    pub async fn info(
        &self,
        url: &str,
        devclass: Option<&str>,
        operation: &str,
    ) -> AdtResult<TransportInfo> {
        let fields = [
            ("PGMID", ""),
            ("OBJECT", ""),
            ("OBJECTNAME", ""),
            ("DEVCLASS", devclass.unwrap_or_default()),
            ("SUPER_PACKAGE", ""),
            ("OPERATION", operation),
            ("URI", url),
        ];
        let request = AdtRequest::post("/sap/bc/adt/cts/transportchecks")
            .accept(CHECK_DATA_TYPE)
            .body(CHECK_DATA_TYPE, asx_body(&fields));
        let body = self.client.http.send(request).await?;
        parse_transport_info(&body)
    }

    /// Create a transport request and return its number.
    pub async fn create(
        &self,
        url: &str,
        request_text: &str,
        devclass: &str,
        transport_layer: Option<&str>,
    ) -> AdtResult<String> {
        let fields = [
            ("DEVCLASS", devclass),
            ("REQUEST_TEXT", request_text),
            ("REF", url),
            ("OPERATION", "I"),
            ("TRANSPORTLAYER", transport_layer.unwrap_or_default()),
        ];
        let request = AdtRequest::post("/sap/bc/adt/cts/transports")
            .accept("text/plain")
            .body(CREATE_REQUEST_TYPE, asx_body(&fields));
        let body = self.client.http.send(request).await?;
        parse_created_transport(&body)
    }

    /// Transport requests owned by `user`.
    pub async fn user_transports(
        &self,
        user: &str,
        targets: bool,
    ) -> AdtResult<Vec<TransportRequest>> {
        let request = AdtRequest::get("/sap/bc/adt/cts/transportrequests")
            .query("user", user)
            .query("targets", targets.to_string())
            .accept("application/vnd.sap.adt.transportorganizertree.v1+xml");
        let body = self.client.http.send(request).await?;
        parse_transport_requests(&body)
    }

    /// Release a transport request.
    pub async fn release(
        &self,
        number: &str,
        ignore_locks: bool,
        ignore_atc: bool,
    ) -> AdtResult<ReleaseReport> {
        let action = if ignore_locks {
            "relwithignlock"
        } else if ignore_atc {
            "relObjigchkatc"
        } else {
            "newreleasejobs"
        };
        let path = format!("/sap/bc/adt/cts/transportrequests/{}/{}", number, action);
        let request = AdtRequest::post(path).accept("application/*");
        let body = self.client.http.send(request).await?;
        parse_release_report(number, &body)
    }
}

fn asx_body(fields: &[(&str, &str)]) -> String {
    let data: String = fields
        .iter()
        .map(|(name, value)| {
            if value.is_empty() {
                format!("<{}/>", name)
            } else {
                format!("<{0}>{1}</{0}>", name, xml::escape(value))
            }
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><asx:abap xmlns:asx="http://www.sap.com/abapxml" version="1.0"><asx:values><DATA>{}</DATA></asx:values></asx:abap>"#,
        data
    )
}

pub(crate) fn parse_transport_info(body: &str) -> AdtResult<TransportInfo> {
    let data = xml::collect_elements(body, "DATA")?
        .into_iter()
        .next()
        .ok_or_else(|| {
            AdtError::UnexpectedResponse("transport check without DATA".to_string())
        })?;

    let transports = xml::collect_elements(body, "headers")?
        .into_iter()
        .map(|header| TransportHeader {
            number: header.field("TRKORR"),
            function: header.field("TRFUNCTION"),
            status: header.field("TRSTATUS"),
            owner: header.field("AS4USER"),
            text: header.field("AS4TEXT"),
        })
        .collect();

    Ok(TransportInfo {
        pgmid: data.field("PGMID"),
        object: data.field("OBJECT"),
        object_name: data.field("OBJECTNAME"),
        operation: data.field("OPERATION"),
        devclass: data.field("DEVCLASS"),
        dlvunit: data.field("DLVUNIT"),
        namespace: data.field("NAMESPACE"),
        recording: data.field("RECORDING"),
        existing_req_only: data.field("EXISTING_REQ_ONLY"),
        transports,
    })
}

/// The response is the request's URI, e.g. `/com.sap.cts/object_record/NPLK900123`.
pub(crate) fn parse_created_transport(body: &str) -> AdtResult<String> {
    let number = body.trim().rsplit('/').next().unwrap_or_default();
    if number.is_empty() {
        return Err(AdtError::UnexpectedResponse(
            "transport creation returned no request number".to_string(),
        ));
    }
    Ok(number.to_string())
}

pub(crate) fn parse_transport_requests(body: &str) -> AdtResult<Vec<TransportRequest>> {
    Ok(xml::collect_elements(body, "request")?
        .into_iter()
        .map(|element| TransportRequest {
            number: element.attr_or_default("number"),
            owner: element.attr_or_default("owner"),
            description: element.attr_or_default("desc"),
            status: element.attr_or_default("status"),
            uri: element.attr_or_default("uri"),
        })
        .collect())
}

pub(crate) fn parse_release_report(number: &str, body: &str) -> AdtResult<ReleaseReport> {
    let status = xml::collect_elements(body, "checkReport")?
        .into_iter()
        .find_map(|report| report.attr("status").map(str::to_string))
        .unwrap_or_default();

    let messages = xml::collect_elements(body, "checkMessage")?
        .into_iter()
        .map(|message| ReleaseMessage {
            severity: message.attr_or_default("type"),
            text: message.attr_or_default("shortText"),
        })
        .collect();

    Ok(ReleaseReport {
        number: number.to_string(),
        status,
        messages,
    })
}
