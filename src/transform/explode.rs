//! Explode one delimited cell into multiple rows.

use crate::error::{TransformError, TransformResult};
use crate::models::{Cell, Table};

/// Split rows where `column` contains `delimiter`-separated values, one
/// output row per value, all other columns copied by value.
///
/// Per-row policy:
/// - cell contains the delimiter: split, trim each part, drop empty parts,
///   emit one row per remaining part with `column` replaced by the part;
/// - non-empty cell without the delimiter: row passes through unchanged;
/// - empty/missing cell: the row is dropped.
///
/// The empty-drop vs pass-through asymmetry is intentional and relied on
/// by existing upload flows; see the tests pinning both sides.
///
/// A zero-row result is a valid outcome ("no data after explode"), not an
/// error.
pub fn explode(table: &Table, column: &str, delimiter: &str) -> TransformResult<Table> {
    let col = table
        .column_index(column)
        .ok_or_else(|| TransformError::MissingColumn(column.to_string()))?;
    if delimiter.is_empty() {
        return Err(TransformError::EmptyDelimiter);
    }

    let mut out = Table::new(table.columns().to_vec());

    for row in table.rows() {
        let cell = &row[col];
        match cell {
            Cell::Text(text) if text.contains(delimiter) => {
                for part in text.split(delimiter) {
                    let part = part.trim();
                    if part.is_empty() {
                        continue;
                    }
                    let mut new_row = row.clone();
                    new_row[col] = Cell::Text(part.to_string());
                    out.push_row(new_row);
                }
            }
            cell if !cell.is_empty() => out.push_row(row.clone()),
            _ => {} // empty cell: row contributes nothing
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str)]) -> Table {
        let mut t = Table::new(vec!["sku".into(), "stores".into()]);
        for (sku, stores) in rows {
            t.push_row(vec![Cell::from_csv_field(sku), Cell::from_csv_field(stores)]);
        }
        t
    }

    #[test]
    fn test_explode_splits_trims_and_drops_empty_parts() {
        let t = table(&[("1001", "a, b ,c")]);
        let out = explode(&t, "stores", ",").unwrap();

        assert_eq!(out.row_count(), 3);
        assert_eq!(out.cell(0, "stores"), Some(&Cell::Text("a".into())));
        assert_eq!(out.cell(1, "stores"), Some(&Cell::Text("b".into())));
        assert_eq!(out.cell(2, "stores"), Some(&Cell::Text("c".into())));
        // Other columns are copied by value onto every output row.
        for i in 0..3 {
            assert_eq!(out.cell(i, "sku"), Some(&Cell::Text("1001".into())));
        }
    }

    #[test]
    fn test_explode_drops_empty_parts_between_delimiters() {
        let t = table(&[("1001", "a,,b, ,c")]);
        let out = explode(&t, "stores", ",").unwrap();
        assert_eq!(out.row_count(), 3);
    }

    #[test]
    fn test_explode_without_delimiter_passes_through() {
        let t = table(&[("1001", "solo")]);
        let out = explode(&t, "stores", ",").unwrap();

        assert_eq!(out.row_count(), 1);
        assert_eq!(out.cell(0, "stores"), Some(&Cell::Text("solo".into())));
    }

    #[test]
    fn test_explode_empty_cell_drops_row() {
        let t = table(&[("1001", ""), ("1002", "x,y")]);
        let out = explode(&t, "stores", ",").unwrap();

        // The empty-cell row contributes nothing; only 1002 survives.
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.cell(0, "sku"), Some(&Cell::Text("1002".into())));
    }

    #[test]
    fn test_explode_numeric_cell_passes_through() {
        let mut t = Table::new(vec!["sku".into(), "stores".into()]);
        t.push_row(vec![Cell::Text("1001".into()), Cell::Number(42.0)]);

        let out = explode(&t, "stores", ",").unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.cell(0, "stores"), Some(&Cell::Number(42.0)));
    }

    #[test]
    fn test_explode_all_rows_empty_yields_empty_table() {
        let t = table(&[("1001", ""), ("1002", "")]);
        let out = explode(&t, "stores", ",").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_explode_missing_column_fails() {
        let t = table(&[("1001", "a,b")]);
        assert!(matches!(
            explode(&t, "region", ","),
            Err(TransformError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_explode_empty_delimiter_fails() {
        let t = table(&[("1001", "a,b")]);
        assert!(matches!(
            explode(&t, "stores", ""),
            Err(TransformError::EmptyDelimiter)
        ));
    }

    #[test]
    fn test_explode_multichar_delimiter() {
        let t = table(&[("1001", "a::b::c")]);
        let out = explode(&t, "stores", "::").unwrap();
        assert_eq!(out.row_count(), 3);
    }
}
