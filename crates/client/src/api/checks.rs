//! Check run endpoints.

use crate::client::AdtClient;
use crate::error::AdtResult;
use crate::transport::AdtRequest;
use crate::xml;
use adt_mcp_core::types::SyntaxMessage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const CHECK_OBJECTS_TYPE: &str = "application/vnd.sap.adt.checkobjects+xml";

/// Checks API.
pub struct ChecksApi<'a> {
    client: &'a AdtClient,
}

impl<'a> ChecksApi<'a> {
    pub(crate) fn new(client: &'a AdtClient) -> Self {
        Self { client }
    }

    /// Syntax check `source` as the content of `url` without saving it.
    pub async fn syntax_check(
        &self,
        url: &str,
        main_url: &str,
        source: &str,
        main_program: Option<&str>,
    ) -> AdtResult<Vec<SyntaxMessage>> {
        let request = AdtRequest::post("/sap/bc/adt/checkruns")
            .query("reporters", "abapCheckRun")
            .accept("application/vnd.sap.adt.checkmessages+xml")
            .body(
                CHECK_OBJECTS_TYPE,
                check_body(url, main_url, source, main_program),
            );
        let body = self.client.http.send(request).await?;
        parse_check_messages(&body)
    }
}

fn check_body(url: &str, main_url: &str, source: &str, main_program: Option<&str>) -> String {
    let object_uri = match main_program {
        Some(main) if !main.is_empty() => {
            let context: String = url::form_urlencoded::byte_serialize(main.as_bytes()).collect();
            format!("{}?context={}", main_url, context)
        }
        _ => main_url.to_string(),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><chkrun:checkObjectList xmlns:chkrun="http://www.sap.com/adt/checkrun" xmlns:adtcore="http://www.sap.com/adt/core"><chkrun:checkObject adtcore:uri="{}" chkrun:version="inactive"><chkrun:artifacts><chkrun:artifact chkrun:contentType="text/plain; charset=utf-8" chkrun:uri="{}"><chkrun:content>{}</chkrun:content></chkrun:artifact></chkrun:artifacts></chkrun:checkObject></chkrun:checkObjectList>"#,
        xml::escape(&object_uri),
        xml::escape(url),
        STANDARD.encode(source.as_bytes())
    )
}

pub(crate) fn parse_check_messages(body: &str) -> AdtResult<Vec<SyntaxMessage>> {
    Ok(xml::collect_elements(body, "checkMessage")?
        .into_iter()
        .map(|element| {
            let uri = element.attr_or_default("uri");
            let (line, offset) = position_from_uri(&uri);
            SyntaxMessage {
                line,
                offset,
                severity: element.attr_or_default("type"),
                text: element.attr_or_default("shortText"),
                uri,
            }
        })
        .collect())
}

/// Extract `line,offset` from a fragment like `#start=12,4`
fn position_from_uri(uri: &str) -> (Option<u32>, Option<u32>) {
    let Some((_, start)) = uri.split_once("#start=") else {
        return (None, None);
    };
    let mut parts = start.split([',', ';']);
    let line = parts.next().and_then(|part| part.parse().ok());
    let offset = parts.next().and_then(|part| part.parse().ok());
    (line, offset)
}
