//! Table sinks: serialize tables to CSV or workbook bytes, and bundle
//! grouped output into a zip archive of workbooks.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::error::{SinkError, SinkResult};
use crate::models::{Cell, ExportFormat, ExportTarget, Table};
use crate::transform::Grouping;

/// Longest file name (before extension) an archive entry may have.
const MAX_NAME_LEN: usize = 50;

/// Worksheet name used for single-table workbook exports.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// A named, serialized export ready for download or disk.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// File names
// =============================================================================

/// Restrict a name to `[A-Za-z0-9._-]`, mapping everything else to `_`,
/// truncated to 50 characters.
///
/// Pure and idempotent: equal inputs always produce equal outputs, and
/// sanitizing twice changes nothing.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .take(MAX_NAME_LEN)
        .collect()
}

/// The caller-supplied name, or `fallback` when it is empty/whitespace.
pub fn fallback_name(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// Single-table serialization
// =============================================================================

/// Serialize a table to CSV bytes (comma-delimited, header first).
pub fn table_to_csv_bytes(table: &Table) -> SinkResult<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new().from_writer(&mut buf);
        writer.write_record(table.columns())?;
        for row in table.rows() {
            let fields: Vec<String> = row.iter().map(Cell::display).collect();
            writer.write_record(&fields)?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

/// Serialize a table to workbook bytes with a single named sheet.
pub fn table_to_workbook_bytes(table: &Table, sheet_name: &str) -> SinkResult<Vec<u8>> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let r = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let c = col_idx as u16;
            match cell {
                Cell::Empty => {} // leave blank
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

// =============================================================================
// Archive serialization
// =============================================================================

/// Zip file name for a grouping over `column`.
pub fn archive_name(column: &str) -> String {
    format!("split-by-{}.zip", sanitize_filename(column))
}

/// Bundle every group into one zip archive, one workbook entry per group.
///
/// Entry names are `sanitize(key)-sanitize(suffix).xlsx`. Distinct keys
/// that sanitize to the same entry name get a numeric suffix instead of
/// silently overwriting each other; equal keys always produce equal names.
pub fn grouping_to_zip(grouping: &Grouping, suffix: &str) -> SinkResult<Vec<u8>> {
    let suffix = fallback_name(suffix, "part");
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used: HashSet<String> = HashSet::new();
    for group in &grouping.groups {
        let stem = format!("{}-{}", sanitize_filename(&group.key), sanitize_filename(&suffix));
        let entry = dedupe_entry_name(&stem, &mut used);

        let bytes = table_to_workbook_bytes(&group.table, DEFAULT_SHEET)?;
        zip.start_file(entry, options)?;
        zip.write_all(&bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

// =============================================================================
// Export targets
// =============================================================================

/// Serialize one table according to an [`ExportTarget::Single`].
///
/// `sheet_name` names the worksheet for workbook output.
pub fn export_table(table: &Table, target: &ExportTarget, sheet_name: &str) -> SinkResult<ExportFile> {
    match target {
        ExportTarget::Single { name, format } => {
            let bytes = match format {
                ExportFormat::Csv => table_to_csv_bytes(table)?,
                ExportFormat::Workbook => table_to_workbook_bytes(table, sheet_name)?,
            };
            Ok(ExportFile { file_name: name.clone(), bytes })
        }
        ExportTarget::Archive { .. } => Err(SinkError::Archive(
            "single-table export cannot target an archive".to_string(),
        )),
    }
}

/// Serialize a grouping according to an [`ExportTarget::Archive`].
pub fn export_grouping(grouping: &Grouping, target: &ExportTarget) -> SinkResult<ExportFile> {
    match target {
        ExportTarget::Archive { name, suffix } => {
            let bytes = grouping_to_zip(grouping, suffix)?;
            Ok(ExportFile { file_name: name.clone(), bytes })
        }
        ExportTarget::Single { .. } => Err(SinkError::Archive(
            "grouped export needs an archive target".to_string(),
        )),
    }
}

fn dedupe_entry_name(stem: &str, used: &mut HashSet<String>) -> String {
    let first = format!("{stem}.xlsx");
    if used.insert(first.clone()) {
        return first;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{stem}_{n}.xlsx");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
