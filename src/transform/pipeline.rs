//! High-level pipeline API: file bytes in, export bytes out.
//!
//! Combines parsing, transformation, and serialization with the same
//! stepwise narration the HTTP log stream and CLI share.

use serde::{Deserialize, Serialize};

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult, TransformError};
use crate::models::{ExportFormat, ExportTarget};
use crate::parser::{parse_auto, SourceDetail};
use crate::sink::{self, ExportFile};
use crate::transform::{explode, group_by};

/// Options shared by the pipeline entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Worksheet to read from workbook input (first sheet when absent).
    pub sheet: Option<String>,

    /// Maximum number of groups a split may produce without explicit
    /// confirmation.
    pub fanout_threshold: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { sheet: None, fanout_threshold: 100 }
    }
}

/// Result of an explode run.
#[derive(Debug, Clone)]
pub struct ExplodeOutput {
    pub export: ExportFile,
    pub rows: usize,
}

/// Result of a split run.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub export: ExportFile,
    pub entries: usize,
}

/// Parse `bytes`, explode `column` on `delimiter`, and serialize the result.
///
/// The output format follows the chosen name's extension (`.csv` writes
/// delimited text, anything else a workbook); an empty `output_name` falls
/// back to `exploded.xlsx`. Returns `Ok(None)` when the explode produces
/// zero rows, a reportable outcome; nothing is written.
pub fn explode_file(
    file_name: &str,
    bytes: &[u8],
    column: &str,
    delimiter: &str,
    output_name: &str,
    options: &PipelineOptions,
) -> PipelineResult<Option<ExplodeOutput>> {
    let parsed = parse_file(file_name, bytes, options)?;

    log_info(format!("Exploding column '{}' on '{}'...", column, delimiter));
    let out = explode(&parsed, column, delimiter)?;

    if out.is_empty() {
        log_warning("No data to output after explode");
        return Ok(None);
    }
    log_success(format!("{} rows after explode", out.row_count()));

    let name = sink::fallback_name(output_name, "exploded.xlsx");
    let target = ExportTarget::Single { format: ExportFormat::from_name(&name), name };
    let export = sink::export_table(&out, &target, "Exploded")?;

    Ok(Some(ExplodeOutput { rows: out.row_count(), export }))
}

/// Parse `bytes`, group by `column`, and bundle one workbook per group
/// into a zip archive.
///
/// When the grouping exceeds `options.fanout_threshold`, the call fails
/// with [`TransformError::FanOutExceeded`] unless `confirm` is set; the
/// checkpoint fires before any archive bytes exist, so cancelling here has
/// no side effects.
pub fn split_file(
    file_name: &str,
    bytes: &[u8],
    column: &str,
    suffix: &str,
    confirm: bool,
    options: &PipelineOptions,
) -> PipelineResult<SplitOutput> {
    let parsed = parse_file(file_name, bytes, options)?;

    log_info(format!("Grouping by column '{}'...", column));
    let grouping = group_by(&parsed, column)?;
    let entries = grouping.group_count();
    log_success(format!("{} group(s)", entries));

    if entries > options.fanout_threshold && !confirm {
        return Err(PipelineError::Transform(TransformError::FanOutExceeded {
            groups: entries,
            threshold: options.fanout_threshold,
        }));
    }

    log_info("Writing archive...");
    let target =
        ExportTarget::Archive { name: sink::archive_name(column), suffix: suffix.to_string() };
    let export = sink::export_grouping(&grouping, &target)?;
    log_success(format!("Archive '{}' with {} file(s)", export.file_name, entries));

    Ok(SplitOutput { entries, export })
}

fn parse_file(
    file_name: &str,
    bytes: &[u8],
    options: &PipelineOptions,
) -> PipelineResult<crate::models::Table> {
    log_info(format!("Reading '{}'...", file_name));
    let parsed = parse_auto(file_name, bytes, options.sheet.as_deref())?;

    match &parsed.detail {
        SourceDetail::Csv { encoding, delimiter } => {
            log_success(format!(
                "Detected encoding {}, delimiter '{}'",
                encoding,
                format_delimiter(*delimiter)
            ));
        }
        SourceDetail::Workbook { sheet, sheet_names } => {
            log_success(format!("Sheet '{}' of {} sheet(s)", sheet, sheet_names.len()));
        }
    }
    log_success(format!("Read {} rows", parsed.table.row_count()));

    Ok(parsed.table)
}

/// Format delimiter for display.
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::xlsx;
    use std::io::Cursor;

    const CSV: &[u8] = b"sku,stores\n1001,a; b ;c\n1002,solo\n1003,\n";

    #[test]
    fn test_explode_file_writes_workbook() {
        let out = explode_file("in.csv", CSV, "stores", ";", "", &PipelineOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(out.export.file_name, "exploded.xlsx");
        assert_eq!(out.rows, 4); // a, b, c, solo; 1003 dropped

        let table = xlsx::parse_sheet(&out.export.bytes, "Exploded").unwrap();
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn test_explode_file_csv_output() {
        let out = explode_file(
            "in.csv",
            CSV,
            "stores",
            ";",
            "out.csv",
            &PipelineOptions::default(),
        )
        .unwrap()
        .unwrap();

        let text = String::from_utf8(out.export.bytes).unwrap();
        assert!(text.starts_with("sku,stores\n"));
    }

    #[test]
    fn test_explode_file_zero_rows_reports_none() {
        let csv = b"sku,stores\n1001,\n";
        let out =
            explode_file("in.csv", csv, "stores", ";", "", &PipelineOptions::default()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_split_file_produces_archive() {
        let out = split_file("in.csv", CSV, "sku", "part", false, &PipelineOptions::default())
            .unwrap();

        assert_eq!(out.entries, 3);
        assert_eq!(out.export.file_name, "split-by-sku.zip");

        let archive = zip::ZipArchive::new(Cursor::new(out.export.bytes)).unwrap();
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn test_split_file_fanout_checkpoint() {
        let options = PipelineOptions { fanout_threshold: 2, ..Default::default() };

        let err = split_file("in.csv", CSV, "sku", "part", false, &options).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transform(TransformError::FanOutExceeded { groups: 3, threshold: 2 })
        ));

        // Confirmation lets the same call through.
        let out = split_file("in.csv", CSV, "sku", "part", true, &options).unwrap();
        assert_eq!(out.entries, 3);
    }

    #[test]
    fn test_unknown_column_propagates() {
        let err = explode_file("in.csv", CSV, "region", ",", "", &PipelineOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transform(TransformError::MissingColumn(_))
        ));
    }
}
