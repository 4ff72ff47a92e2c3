//! # Shelfload - spreadsheet transforms and batch availability uploads
//!
//! Shelfload ingests spreadsheet/CSV files from retail catalog operations,
//! applies column transformations, exports workbooks/archives, and batch
//! submits availability updates to the catalog endpoint.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  CSV/XLSX   │────▶│   Parser    │────▶│  Transform   │────▶│  Sink/Zip   │
//! │   (bytes)   │     │ (auto-enc)  │     │(explode/split│     │  or Submit  │
//! └─────────────┘     └─────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shelfload::transform::pipeline::{explode_file, PipelineOptions};
//!
//! let bytes = std::fs::read("stock.csv")?;
//! let out = explode_file("stock.csv", &bytes, "stores", ",", "", &PipelineOptions::default())?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Table, TransformSpec, UploadItem)
//! - [`parser`] - CSV/workbook parsing with auto-detection
//! - [`transform`] - Explode, group-by, and the pipeline
//! - [`sink`] - CSV/workbook/zip serialization
//! - [`validation`] - Availability record validation
//! - [`submit`] - Serial batch submission to the catalog endpoint
//! - [`state`] - File bus and readiness signal
//! - [`cache`] - Bounded recent-file store
//! - [`barcode`] - EAN-13 scan code conversion
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Serialization
pub mod sink;

// Validation
pub mod validation;

// Submission
pub mod submit;

// Shared state
pub mod state;

// Persistence
pub mod cache;

// Barcode helpers
pub mod barcode;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BarcodeError, CacheError, NetworkError, ParseError, PipelineError, ServerError, SinkError,
    TransformError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AvailabilityUpdate, Cell, ExportFormat, ExportTarget, Table, TransformSpec, UploadItem,
    UploadStatus,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    detect_delimiter, detect_encoding, parse_auto, parse_csv_auto, parse_csv_str, CsvTable,
    ParsedFile, SourceDetail, SourceFormat,
};

// =============================================================================
// Re-exports - Transforms
// =============================================================================

pub use transform::{explode, group_by, Group, Grouping, EMPTY_GROUP_KEY};

pub use transform::pipeline::{
    explode_file, split_file, ExplodeOutput, PipelineOptions, SplitOutput,
};

// =============================================================================
// Re-exports - Sink
// =============================================================================

pub use sink::{
    archive_name, export_grouping, export_table, fallback_name, grouping_to_zip,
    sanitize_filename, table_to_csv_bytes, table_to_workbook_bytes, ExportFile,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{check_columns, convert_table, ConversionReport, REQUIRED_COLUMNS};

// =============================================================================
// Re-exports - Submission
// =============================================================================

pub use submit::{
    build_payload, run_batch, run_batch_with_probe, AvailabilityPayload, BatchOptions,
    HttpEndpoint, NotificationProbe, RecordFailure, SourceFile, SubmitAck, SubmitEndpoint,
    NO_CONFIRMATION_MESSAGE, SERVER_ERROR_MESSAGE,
};

// =============================================================================
// Re-exports - State
// =============================================================================

pub use state::{readiness, FileBus, FileSnapshot, ReadySignal, Readiness, Subscription};

// =============================================================================
// Re-exports - Cache
// =============================================================================

pub use cache::{RecentFile, RecentFileStore, MAX_RECENT_FILES};

// =============================================================================
// Re-exports - Barcode
// =============================================================================

pub use barcode::{check_digit, pad_to_12, to_ean13};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
