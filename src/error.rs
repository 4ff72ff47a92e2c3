//! Error types for the shelfload pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ParseError`] - file parsing errors (CSV and workbook)
//! - [`TransformError`] - table transformation errors
//! - [`SinkError`] - export/serialization errors
//! - [`ValidationError`] - availability record validation errors
//! - [`NetworkError`] - remote submission transport errors
//! - [`CacheError`] - recent-file store errors
//! - [`BarcodeError`] - scan code conversion errors
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Parse Errors
// =============================================================================

/// Errors while turning raw file bytes into a table.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Empty file.
    #[error("File is empty")]
    EmptyFile,

    /// No header row found.
    #[error("No headers found")]
    NoHeaders,

    /// The file extension is not a supported input format.
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    /// The requested worksheet does not exist in the workbook.
    #[error("Worksheet not found: '{0}'")]
    UnknownSheet(String),

    /// The workbook could not be opened or read.
    #[error("Invalid workbook: {0}")]
    Workbook(String),
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors during table transformations.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The target column does not exist in the table.
    #[error("Column not found: '{0}'")]
    MissingColumn(String),

    /// The explode delimiter is empty.
    #[error("Delimiter must not be empty")]
    EmptyDelimiter,

    /// Grouping would produce more output files than the configured
    /// threshold allows without explicit confirmation.
    #[error("Grouping would produce {groups} files (threshold {threshold}); confirmation required")]
    FanOutExceeded { groups: usize, threshold: usize },
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors while serializing tables to output bytes.
#[derive(Debug, Error)]
pub enum SinkError {
    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook serialization failed.
    #[error("Workbook write error: {0}")]
    Workbook(String),

    /// Zip archive assembly failed.
    #[error("Archive write error: {0}")]
    Archive(String),

    /// IO error.
    #[error("Sink IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for SinkError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        SinkError::Workbook(e.to_string())
    }
}

impl From<zip::result::ZipError> for SinkError {
    fn from(e: zip::result::ZipError) -> Self {
        SinkError::Archive(e.to_string())
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors while validating availability records.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required column is missing from the input table.
    #[error("Missing required column: '{0}'")]
    MissingColumn(String),

    /// Invalid field value.
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Every row was rejected, nothing to submit.
    #[error("No valid records after validation ({rejected} rejected)")]
    NoRecords { rejected: usize },
}

// =============================================================================
// Network Errors
// =============================================================================

/// Errors from the remote submission endpoint.
///
/// These are never shown raw to the end user; the submitter renders the
/// generic message and logs the detail.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport-level failure (DNS, connection reset, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Server answered with a non-success status.
    #[error("Server returned status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout
        } else if let Some(status) = e.status() {
            NetworkError::Status(status.as_u16())
        } else {
            NetworkError::Transport(e.to_string())
        }
    }
}

// =============================================================================
// Cache Errors
// =============================================================================

/// Errors from the recent-file store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error.
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Cache JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored bytes could not be decoded from base64.
    #[error("Cache decode error: {0}")]
    Decode(String),
}

// =============================================================================
// Barcode Errors
// =============================================================================

/// Errors converting scan codes to 13-digit codes.
#[derive(Debug, Error)]
pub enum BarcodeError {
    /// Input contained a non-digit character.
    #[error("Scan code must contain only digits: '{0}'")]
    NonDigit(String),

    /// Input was longer than 12 digits.
    #[error("Scan code longer than 12 digits: '{0}'")]
    TooLong(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by the functions in
/// [`crate::transform::pipeline`]. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Transformation error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Export error.
    #[error("Export error: {0}")]
    Sink(#[from] SinkError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Recent-file store error.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for export operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ParseError -> PipelineError
        let parse_err = ParseError::EmptyFile;
        let pipeline_err: PipelineError = parse_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // TransformError -> PipelineError
        let transform_err = TransformError::MissingColumn("Region".into());
        let pipeline_err: PipelineError = transform_err.into();
        assert!(pipeline_err.to_string().contains("Region"));
    }

    #[test]
    fn test_fan_out_message_carries_counts() {
        let err = TransformError::FanOutExceeded { groups: 240, threshold: 100 };
        let msg = err.to_string();
        assert!(msg.contains("240"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_validation_error_format() {
        let err = ValidationError::InvalidValue {
            field: "Current Inventory".into(),
            message: "not a number".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Current Inventory"));
        assert!(msg.contains("not a number"));
    }
}
