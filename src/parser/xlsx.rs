//! Workbook reading via calamine.
//!
//! A workbook exposes its sheet names first; producing a [`Table`] requires
//! a sheet selection (the caller decides, except for the documented
//! first-sheet convenience default in [`super::parse_auto`]).

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::{ParseError, ParseResult};
use crate::models::{Cell, Table};

/// List the sheet names of a workbook.
pub fn sheet_names(bytes: &[u8]) -> ParseResult<Vec<String>> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Workbook(e.to_string()))?;
    Ok(workbook.sheet_names().to_owned())
}

/// Parse one named sheet into a table.
///
/// The first row is the header; all following rows become data rows with
/// cells normalized to [`Cell`] scalars (missing trailing cells are empty).
pub fn parse_sheet(bytes: &[u8], sheet: &str) -> ParseResult<Table> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    if !workbook.sheet_names().to_owned().iter().any(|n| n == sheet) {
        return Err(ParseError::UnknownSheet(sheet.to_string()));
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows.next().ok_or(ParseError::NoHeaders)?;
    let columns: Vec<String> = header.iter().map(cell_to_string).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(ParseError::NoHeaders);
    }

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(to_cell).collect());
    }

    Ok(table)
}

/// Normalize a calamine cell to its display text.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Normalize a calamine cell to a typed [`Cell`].
fn to_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::String(v) if v.is_empty() => Cell::Empty,
        other => Cell::Text(cell_to_string(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn sample_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Stock").unwrap();
        sheet.write_string(0, 0, "sku").unwrap();
        sheet.write_string(0, 1, "qty").unwrap();
        sheet.write_string(1, 0, "123").unwrap();
        sheet.write_number(1, 1, 4.0).unwrap();
        sheet.write_string(2, 0, "456").unwrap();

        let extra = workbook.add_worksheet();
        extra.set_name("Notes").unwrap();
        extra.write_string(0, 0, "note").unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_sheet_names() {
        let bytes = sample_workbook();
        assert_eq!(sheet_names(&bytes).unwrap(), vec!["Stock", "Notes"]);
    }

    #[test]
    fn test_parse_sheet_cells() {
        let bytes = sample_workbook();
        let table = parse_sheet(&bytes, "Stock").unwrap();

        assert_eq!(table.columns(), &["sku".to_string(), "qty".to_string()]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "sku"), Some(&Cell::Text("123".into())));
        assert_eq!(table.cell(0, "qty"), Some(&Cell::Number(4.0)));
        // Missing trailing cell comes back empty, not absent.
        assert_eq!(table.cell(1, "qty"), Some(&Cell::Empty));
    }

    #[test]
    fn test_unknown_sheet() {
        let bytes = sample_workbook();
        assert!(matches!(
            parse_sheet(&bytes, "Nope"),
            Err(ParseError::UnknownSheet(_))
        ));
    }

    #[test]
    fn test_empty_bytes() {
        assert!(matches!(sheet_names(&[]), Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_garbage_bytes() {
        assert!(matches!(
            sheet_names(b"not a workbook"),
            Err(ParseError::Workbook(_))
        ));
    }
}
