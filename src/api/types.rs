//! REST API types for the upload/transform endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::TransformSpec;
use crate::parser::{ParsedFile, SourceDetail};
use crate::state::FileSnapshot;

/// Response sent after a file upload is parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier.
    pub job_id: String,

    /// Always "ready" on success; errors use [`error_response`].
    pub status: String,

    pub file_name: String,

    /// "csv" or "workbook".
    pub kind: String,

    pub row_count: usize,
    pub columns: Vec<String>,

    /// CSV detection metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,

    /// Workbook metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_names: Option<Vec<String>>,

    /// Whether the raw bytes were saved to the recent-file store.
    pub cached: bool,
}

impl UploadResponse {
    pub fn new(file_name: &str, parsed: &ParsedFile, cached: bool) -> Self {
        let mut response = Self {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            file_name: file_name.to_string(),
            kind: String::new(),
            row_count: parsed.table.row_count(),
            columns: parsed.table.columns().to_vec(),
            encoding: None,
            delimiter: None,
            sheet: None,
            sheet_names: None,
            cached,
        };

        match &parsed.detail {
            SourceDetail::Csv { encoding, delimiter } => {
                response.kind = "csv".to_string();
                response.encoding = Some(encoding.clone());
                response.delimiter = Some(delimiter.to_string());
            }
            SourceDetail::Workbook { sheet, sheet_names } => {
                response.kind = "workbook".to_string();
                response.sheet = Some(sheet.clone());
                response.sheet_names = Some(sheet_names.clone());
            }
        }

        response
    }
}

/// Request body for `POST /api/transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    /// What to do with the current file.
    pub spec: TransformSpec,

    /// Output file name (explode only; empty falls back to the default).
    #[serde(default)]
    pub output_name: String,

    /// Archive entry suffix (group-by only).
    #[serde(default)]
    pub suffix: String,

    /// Acknowledge a fan-out beyond the threshold (group-by only).
    #[serde(default)]
    pub confirm: bool,
}

/// Response for `GET /api/state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub file: Option<FileSnapshot>,
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_auto;

    #[test]
    fn test_upload_response_for_csv() {
        let parsed = parse_auto("stock.csv", b"sku;qty\n1;2\n", None).unwrap();
        let response = UploadResponse::new("stock.csv", &parsed, true);

        assert_eq!(response.status, "ready");
        assert_eq!(response.kind, "csv");
        assert_eq!(response.row_count, 1);
        assert_eq!(response.delimiter.as_deref(), Some(";"));
        assert!(response.sheet_names.is_none());
    }

    #[test]
    fn test_transform_request_defaults() {
        let request: TransformRequest =
            serde_json::from_str(r#"{"spec":{"kind":"groupBy","column":"region"}}"#).unwrap();

        assert_eq!(request.spec, TransformSpec::GroupBy { column: "region".into() });
        assert!(!request.confirm);
        assert!(request.suffix.is_empty());
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("no file uploaded");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "no file uploaded");
    }
}
