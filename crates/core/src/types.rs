use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Session mode of the connection to the ABAP system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Server-side context (locks, cookies) persists across calls
    #[default]
    Stateful,
    /// Every call is a one-shot request
    Stateless,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stateful => "stateful",
            Self::Stateless => "stateless",
        }
    }

    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::Stateful)
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stateful" => Ok(Self::Stateful),
            "stateless" => Ok(Self::Stateless),
            other => Err(anyhow::anyhow!(
                "Invalid session type '{}', expected 'stateful' or 'stateless'",
                other
            )),
        }
    }
}

/// Which version of a source to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceVersion {
    Active,
    Inactive,
    Workingarea,
}

impl SourceVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Workingarea => "workingarea",
        }
    }
}

/// Options for reading an object source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceOptions {
    #[serde(default)]
    pub version: Option<SourceVersion>,
}

/// Result of a successful lock request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockResult {
    pub lock_handle: String,
    pub corr_nr: String,
    pub corr_user: String,
    pub corr_text: String,
    pub is_local: bool,
    pub is_link_up: bool,
    pub modification_support: bool,
}

/// Reference to a repository object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub uri: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One node on the path from a package root down to an object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStep {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub uri: String,
}

/// Message produced during activation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_description: Option<String>,
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub text: String,
}

impl ActivationMessage {
    /// Errors and aborts block activation, warnings and infos do not
    pub fn is_error(&self) -> bool {
        matches!(self.severity.as_str(), "E" | "A" | "X")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResult {
    pub success: bool,
    pub messages: Vec<ActivationMessage>,
    pub inactive: Vec<ObjectReference>,
}

/// Header of a transport request as returned by the transport check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportHeader {
    pub number: String,
    pub function: String,
    pub status: String,
    pub owner: String,
    pub text: String,
}

/// Transport requirements of an object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportInfo {
    pub pgmid: String,
    pub object: String,
    pub object_name: String,
    pub operation: String,
    pub devclass: String,
    pub dlvunit: String,
    pub namespace: String,
    pub recording: String,
    pub existing_req_only: String,
    pub transports: Vec<TransportHeader>,
}

impl TransportInfo {
    /// Local objects ($TMP and friends) are never recorded
    pub fn requires_transport(&self) -> bool {
        self.recording == "X"
    }
}

/// A transport request owned by a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRequest {
    pub number: String,
    pub owner: String,
    pub description: String,
    pub status: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseMessage {
    pub severity: String,
    pub text: String,
}

/// Outcome of a transport release
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReport {
    pub number: String,
    pub status: String,
    pub messages: Vec<ReleaseMessage>,
}

/// A syntax check finding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxMessage {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    pub severity: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Rows returned by the data preview service.
///
/// Cell values are kept as the strings the server sent. ABAP packed numbers
/// and INT8 columns do not fit an f64 without loss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<QueryColumn>,
    pub rows: Vec<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<String>,
}

impl QueryResult {
    /// Build row maps from column-major values
    pub fn from_columns(columns: Vec<QueryColumn>, values: Vec<Vec<String>>) -> Self {
        let row_count = values.iter().map(Vec::len).max().unwrap_or(0);
        let mut rows = vec![BTreeMap::new(); row_count];

        for (column, column_values) in columns.iter().zip(values) {
            for (row, value) in rows.iter_mut().zip(column_values) {
                row.insert(column.name.clone(), value);
            }
        }

        Self {
            columns,
            rows,
            total_rows: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_type_parse() {
        assert_eq!("stateful".parse::<SessionType>().unwrap(), SessionType::Stateful);
        assert_eq!("Stateless".parse::<SessionType>().unwrap(), SessionType::Stateless);
        assert!("sticky".parse::<SessionType>().is_err());
        assert_eq!(SessionType::default(), SessionType::Stateful);
    }

    #[test]
    fn test_activation_message_severity() {
        let error = ActivationMessage {
            severity: "E".to_string(),
            ..Default::default()
        };
        let warning = ActivationMessage {
            severity: "W".to_string(),
            ..Default::default()
        };
        assert!(error.is_error());
        assert!(!warning.is_error());
    }

    #[test]
    fn test_query_result_from_columns() {
        let columns = vec![
            QueryColumn {
                name: "MANDT".to_string(),
                column_type: "C".to_string(),
                description: None,
            },
            QueryColumn {
                name: "AMOUNT".to_string(),
                column_type: "P".to_string(),
                description: None,
            },
        ];
        let values = vec![
            vec!["001".to_string(), "001".to_string()],
            vec![
                "123456789012345678901234.56".to_string(),
                "0.00".to_string(),
            ],
        ];

        let result = QueryResult::from_columns(columns, values);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["AMOUNT"], "123456789012345678901234.56");
        assert_eq!(result.rows[1]["MANDT"], "001");
    }

    #[test]
    fn test_object_reference_serializes_type_field() {
        let reference = ObjectReference {
            uri: "/sap/bc/adt/oo/classes/zcl_example".to_string(),
            object_type: "CLAS/OC".to_string(),
            name: "ZCL_EXAMPLE".to_string(),
            package_name: Some("$TMP".to_string()),
            description: None,
        };
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["type"], "CLAS/OC");
        assert_eq!(json["packageName"], "$TMP");
        assert!(json.get("description").is_none());
    }
}
