//! Data preview endpoints.

use crate::client::AdtClient;
use crate::error::AdtResult;
use crate::transport::AdtRequest;
use crate::xml;
use adt_mcp_core::types::{QueryColumn, QueryResult};
use quick_xml::events::Event;
use quick_xml::Reader;

const TABLE_DATA_TYPE: &str = "application/vnd.sap.adt.datapreview.table.v1+xml";

/// Data preview API.
pub struct DataPreviewApi<'a> {
    client: &'a AdtClient,
}

impl<'a> DataPreviewApi<'a> {
    pub(crate) fn new(client: &'a AdtClient) -> Self {
        Self { client }
    }

    /// Rows of a DDIC table or view.
    pub async fn table_contents(&self, ddic_entity: &str, row_number: u32) -> AdtResult<QueryResult> {
        let request = AdtRequest::post("/sap/bc/adt/datapreview/ddic")
            .query("rowNumber", row_number.to_string())
            .query("ddicEntityName", ddic_entity)
            .accept(TABLE_DATA_TYPE);
        let body = self.client.http.send(request).await?;
        parse_table_data(&body)
    }

    /// Run a free-style ABAP SQL select.
    pub async fn run_query(&self, sql: &str, row_number: u32) -> AdtResult<QueryResult> {
        let request = AdtRequest::post("/sap/bc/adt/datapreview/freestyle")
            .query("rowNumber", row_number.to_string())
            .accept(TABLE_DATA_TYPE)
            .body("text/plain", sql);
        let body = self.client.http.send(request).await?;
        parse_table_data(&body)
    }
}

/// Parse `dataPreview:tableData`.
///
/// The document is column-major: each `columns` element holds one
/// `metadata` element followed by a `dataSet` of `data` values.
pub(crate) fn parse_table_data(body: &str) -> AdtResult<QueryResult> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut columns: Vec<QueryColumn> = Vec::new();
    let mut values: Vec<Vec<String>> = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) | Event::Empty(start)
                if start.local_name().as_ref() == b"metadata" =>
            {
                let mut column = QueryColumn::default();
                for attr in start.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"name" => column.name = value,
                        b"type" => column.column_type = value,
                        b"description" => column.description = Some(value),
                        _ => {}
                    }
                }
                columns.push(column);
                values.push(Vec::new());
            }
            Event::Start(start) if start.local_name().as_ref() == b"data" => {
                current = Some(String::new());
            }
            Event::Empty(start) if start.local_name().as_ref() == b"data" => {
                if let Some(column_values) = values.last_mut() {
                    column_values.push(String::new());
                }
            }
            Event::Text(text) => {
                if let Some(ref mut value) = current {
                    value.push_str(&text.unescape()?);
                }
            }
            Event::End(end) if end.local_name().as_ref() == b"data" => {
                if let (Some(value), Some(column_values)) = (current.take(), values.last_mut()) {
                    column_values.push(value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut result = QueryResult::from_columns(columns, values);
    result.total_rows = xml::collect_elements(body, "totalRows")?
        .into_iter()
        .next()
        .map(|element| element.text.trim().to_string())
        .filter(|total| !total.is_empty());
    Ok(result)
}
