//! Table sources: raw file bytes in, [`Table`] out.
//!
//! CSV input gets encoding and delimiter auto-detection; workbook input
//! (.xlsx/.xls) goes through [`xlsx`] and requires an explicit sheet
//! selection when the workbook has more than one sheet.
//!
//! Parsing has no side effects beyond the returned structure.

use crate::error::{ParseError, ParseResult};
use crate::models::{Cell, Table};

pub mod xlsx;

/// How the source bytes were interpreted.
#[derive(Debug, Clone)]
pub enum SourceDetail {
    Csv { encoding: String, delimiter: char },
    Workbook { sheet: String, sheet_names: Vec<String> },
}

/// A parsed file with its source metadata.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub table: Table,
    pub detail: SourceDetail,
}

/// Supported input formats, derived from the file extension hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Classify a file name by extension. Unknown extensions are an error,
    /// not a guess.
    pub fn from_name(name: &str) -> ParseResult<Self> {
        let ext = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" | "tsv" => Ok(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xls" => Ok(SourceFormat::Workbook),
            other => Err(ParseError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parse file bytes according to the extension hint.
///
/// For workbooks, `sheet` selects the worksheet; `None` falls back to the
/// first sheet as a convenience default (single-sheet workbooks are the
/// common case).
pub fn parse_auto(name: &str, bytes: &[u8], sheet: Option<&str>) -> ParseResult<ParsedFile> {
    match SourceFormat::from_name(name)? {
        SourceFormat::Csv => {
            let parsed = parse_csv_auto(bytes)?;
            Ok(ParsedFile {
                table: parsed.table,
                detail: SourceDetail::Csv { encoding: parsed.encoding, delimiter: parsed.delimiter },
            })
        }
        SourceFormat::Workbook => {
            let names = xlsx::sheet_names(bytes)?;
            let selected = match sheet {
                Some(s) => s.to_string(),
                None => names.first().cloned().ok_or(ParseError::EmptyFile)?,
            };
            let table = xlsx::parse_sheet(bytes, &selected)?;
            Ok(ParsedFile {
                table,
                detail: SourceDetail::Workbook { sheet: selected, sheet_names: names },
            })
        }
    }
}

// =============================================================================
// CSV parsing
// =============================================================================

/// Result of CSV parsing with detection metadata.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub table: Table,
    pub encoding: String,
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ParseResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string())),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        // Fallback: lossy UTF-8 rather than refusing the file outright.
        _ => Ok(String::from_utf8_lossy(bytes).to_string()),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_auto(bytes: &[u8]) -> ParseResult<CsvTable> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;
    Ok(CsvTable { table, encoding, delimiter })
}

/// Parse CSV text with an explicit delimiter.
///
/// The first line is the header; cells are trimmed and stripped of
/// surrounding quotes, blank lines are skipped, and short rows are padded
/// with empty cells so every row matches the header width.
pub fn parse_csv_str(content: &str, delimiter: char) -> ParseResult<Table> {
    let mut lines = content.lines();

    let header_line = lines.next().ok_or(ParseError::EmptyFile)?;
    let columns: Vec<String> = header_line
        .split(delimiter)
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(ParseError::NoHeaders);
    }

    let mut table = Table::new(columns);

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let cells: Vec<Cell> = line
            .split(delimiter)
            .map(|s| Cell::from_csv_field(s.trim().trim_matches('"')))
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_csv_str("name;age\nAlice;30\nBob;25", ';').unwrap();

        assert_eq!(table.columns(), &["name".to_string(), "age".to_string()]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "name"), Some(&Cell::Text("Alice".into())));
        assert_eq!(table.cell(1, "age"), Some(&Cell::Text("25".into())));
    }

    #[test]
    fn test_quoted_values() {
        let table = parse_csv_str("name,value\n\"Alice\",\"Hello\"", ',').unwrap();
        assert_eq!(table.cell(0, "value"), Some(&Cell::Text("Hello".into())));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_csv_str("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_missing_cells_become_empty() {
        let table = parse_csv_str("a,b,c\n1", ',').unwrap();
        assert_eq!(table.cell(0, "b"), Some(&Cell::Empty));
        assert_eq!(table.cell(0, "c"), Some(&Cell::Empty));
    }

    #[test]
    fn test_extra_cells_dropped() {
        let table = parse_csv_str("a,b\n1,2,3,4", ',').unwrap();
        assert_eq!(table.rows()[0].len(), 2);
    }

    #[test]
    fn test_empty_input_errors() {
        assert!(matches!(parse_csv_auto(b""), Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        // No separator at all falls back to comma.
        assert_eq!(detect_delimiter("justonecolumn"), ',');
    }

    #[test]
    fn test_auto_parse_detects_semicolon() {
        let parsed = parse_csv_auto(b"name;age\nAlice;30").unwrap();
        assert_eq!(parsed.delimiter, ';');
        assert_eq!(parsed.table.row_count(), 1);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert!(decoded.contains("Soci"));
    }

    #[test]
    fn test_format_hint() {
        assert_eq!(SourceFormat::from_name("stock.csv").unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_name("stock.XLSX").unwrap(), SourceFormat::Workbook);
        assert!(matches!(
            SourceFormat::from_name("stock.pdf"),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }
}
