//! Domain models for the shelfload pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Cell`] / [`Table`] - in-memory representation of one parsed sheet
//! - [`TransformSpec`] - description of one table transformation
//! - [`ExportTarget`] - where serialized output goes
//! - [`AvailabilityUpdate`] - one catalog availability record
//! - [`UploadItem`] / [`UploadStatus`] - batch submission state per file

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Cells
// =============================================================================

/// A scalar cell value.
///
/// Missing cells are always represented as [`Cell::Empty`] so that column
/// enumeration stays stable downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// True for empty cells and for text cells that trim to nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the cell the way it appears in an exported sheet.
    /// Empty renders as the empty string.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }

    /// Build a cell from a raw CSV field: empty stays empty, everything
    /// else is kept as text.
    pub fn from_csv_field(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }
}

impl From<&Cell> for Value {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => Value::String(String::new()),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// An ordered sequence of rows sharing one column set.
///
/// Column order is the header order of the source sheet; row order is
/// source order. Rows are padded with [`Cell::Empty`] (or truncated) to
/// the column count on insertion, so every row has exactly one cell per
/// column by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given column set.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Column names in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, in source order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, normalizing its length to the column count.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Empty);
        self.rows.push(cells);
    }

    /// Cell at (row index, column name), if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// A new table with the same columns and the selected rows copied.
    pub fn with_rows(&self, indices: &[usize]) -> Table {
        let mut out = Table::new(self.columns.clone());
        for &i in indices {
            if let Some(row) = self.rows.get(i) {
                out.rows.push(row.clone());
            }
        }
        out
    }

    /// Rows as JSON objects keyed by column name, for CLI/API dumps.
    pub fn to_json_rows(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (col, cell) in self.columns.iter().zip(row.iter()) {
                    obj.insert(col.clone(), cell.into());
                }
                Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Transform Spec
// =============================================================================

/// Immutable description of one table transformation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransformSpec {
    /// Split one delimited cell into multiple rows.
    #[serde(rename_all = "camelCase")]
    Explode { column: String, delimiter: String },
    /// Partition rows into named buckets by cell value.
    #[serde(rename_all = "camelCase")]
    GroupBy { column: String },
}

// =============================================================================
// Export Target
// =============================================================================

/// Output file format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Row-oriented workbook (.xlsx).
    #[default]
    Workbook,
    /// Delimited text (.csv).
    Csv,
}

impl ExportFormat {
    /// Pick the format from an output file name; anything that is not
    /// `.csv` gets a workbook.
    pub fn from_name(name: &str) -> Self {
        if name.trim().to_ascii_lowercase().ends_with(".csv") {
            ExportFormat::Csv
        } else {
            ExportFormat::Workbook
        }
    }
}

/// A serialization destination: one file, or a zip archive of many.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportTarget {
    Single { name: String, format: ExportFormat },
    Archive { name: String, suffix: String },
}

// =============================================================================
// Availability Update
// =============================================================================

/// One catalog availability record, derived 1:1 from an upload sheet row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityUpdate {
    /// Three-letter store code.
    pub store_code: String,
    /// Display name, not used for matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    /// PLU or UPC identifying the item.
    pub sku: String,
    /// Availability state ("Available", "Limited", ...).
    pub availability: String,
    /// On-hand inventory count.
    pub current_inventory: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_floor_capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub andon_cord: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_end_date: Option<String>,
}

// =============================================================================
// Upload Items
// =============================================================================

/// Status of one file in a batch submission.
///
/// `Waiting -> Submitting -> (Succeeded | Failed | PartiallyFailed)`.
/// Terminal states are final; there is no automatic retry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStatus {
    Waiting,
    Submitting,
    Succeeded,
    Failed,
    PartiallyFailed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Succeeded | UploadStatus::Failed | UploadStatus::PartiallyFailed
        )
    }
}

/// One file's worth of batch-submission state and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadItem {
    /// Source file name.
    pub file_name: String,
    pub status: UploadStatus,
    /// Remote status message, per-record failure list, or toast text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadItem {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), status: UploadStatus::Waiting, message: None }
    }

    /// `Waiting -> Submitting`. Ignored from any other state.
    pub fn mark_submitting(&mut self) {
        if self.status == UploadStatus::Waiting {
            self.status = UploadStatus::Submitting;
        }
    }

    /// Move to a terminal state. Ignored once terminal.
    pub fn resolve(&mut self, status: UploadStatus, message: Option<String>) {
        if self.status.is_terminal() || !status.is_terminal() {
            return;
        }
        self.status = status;
        self.message = message;
    }

    /// Append extra text to the status message (toast confirmations).
    pub fn append_message(&mut self, extra: &str) {
        match &mut self.message {
            Some(msg) => {
                msg.push_str(" - ");
                msg.push_str(extra);
            }
            None => self.message = Some(extra.to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Empty.display(), "");
        assert_eq!(Cell::Text("abc".into()).display(), "abc");
        assert_eq!(Cell::Number(30.0).display(), "30");
        assert_eq!(Cell::Number(2.5).display(), "2.5");
    }

    #[test]
    fn test_push_row_normalizes_length() {
        let mut t = Table::new(vec!["a".into(), "b".into(), "c".into()]);
        t.push_row(vec![Cell::Text("1".into())]);
        t.push_row(vec![
            Cell::Text("1".into()),
            Cell::Text("2".into()),
            Cell::Text("3".into()),
            Cell::Text("4".into()),
        ]);

        assert_eq!(t.rows()[0].len(), 3);
        assert_eq!(t.rows()[0][1], Cell::Empty);
        assert_eq!(t.rows()[1].len(), 3);
    }

    #[test]
    fn test_cell_lookup_by_name() {
        let mut t = Table::new(vec!["sku".into(), "qty".into()]);
        t.push_row(vec![Cell::Text("123".into()), Cell::Number(4.0)]);

        assert_eq!(t.cell(0, "sku"), Some(&Cell::Text("123".into())));
        assert_eq!(t.cell(0, "qty"), Some(&Cell::Number(4.0)));
        assert_eq!(t.cell(0, "missing"), None);
        assert_eq!(t.cell(1, "sku"), None);
    }

    #[test]
    fn test_json_rows_keep_empty_cells() {
        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_row(vec![Cell::Text("x".into())]);

        let rows = t.to_json_rows();
        assert_eq!(rows[0]["a"], "x");
        assert_eq!(rows[0]["b"], "");
    }

    #[test]
    fn test_export_format_from_name() {
        assert_eq!(ExportFormat::from_name("out.csv"), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_name("OUT.CSV "), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_name("out.xlsx"), ExportFormat::Workbook);
        assert_eq!(ExportFormat::from_name(""), ExportFormat::Workbook);
    }

    #[test]
    fn test_transform_spec_serde() {
        let spec = TransformSpec::Explode { column: "Region".into(), delimiter: ",".into() };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"kind\":\"explode\""));

        let back: TransformSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_upload_item_lifecycle() {
        let mut item = UploadItem::new("a.csv");
        assert_eq!(item.status, UploadStatus::Waiting);

        item.mark_submitting();
        assert_eq!(item.status, UploadStatus::Submitting);

        item.resolve(UploadStatus::Succeeded, Some("ok".into()));
        assert_eq!(item.status, UploadStatus::Succeeded);

        // Terminal states are final.
        item.resolve(UploadStatus::Failed, Some("late".into()));
        assert_eq!(item.status, UploadStatus::Succeeded);
        assert_eq!(item.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_upload_item_append_message() {
        let mut item = UploadItem::new("a.csv");
        item.resolve(UploadStatus::Succeeded, Some("submitted".into()));
        item.append_message("upload complete");
        assert_eq!(item.message.as_deref(), Some("submitted - upload complete"));
    }
}
