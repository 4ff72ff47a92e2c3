//! Validation of availability upload tables.
//!
//! An upload sheet must carry the CAM upload column set; each row is
//! converted 1:1 into an [`AvailabilityUpdate`]. Rows with an empty
//! PLU/UPC or a non-numeric inventory are rejected individually with a
//! row-indexed message; a sheet where every row is rejected is an error.

use crate::error::{ValidationError, ValidationResult};
use crate::models::{AvailabilityUpdate, Cell, Table};

pub const COL_STORE: &str = "Store - 3 Letter Code";
pub const COL_ITEM_NAME: &str = "Item Name";
pub const COL_SKU: &str = "Item PLU/UPC";
pub const COL_AVAILABILITY: &str = "Availability";
pub const COL_INVENTORY: &str = "Current Inventory";
pub const COL_CAPACITY: &str = "Sales Floor Capacity";
pub const COL_ANDON: &str = "Andon Cord";
pub const COL_TRACKING_START: &str = "Tracking Start Date";
pub const COL_TRACKING_END: &str = "Tracking End Date";

/// Columns an upload sheet must contain.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_STORE, COL_SKU, COL_AVAILABILITY, COL_INVENTORY];

/// Result of converting a table into availability updates.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub updates: Vec<AvailabilityUpdate>,
    /// `(row index, reason)` for every rejected row.
    pub rejected: Vec<(usize, String)>,
}

/// Check that every required column is present.
pub fn check_columns(table: &Table) -> ValidationResult<()> {
    for col in REQUIRED_COLUMNS {
        if table.column_index(col).is_none() {
            return Err(ValidationError::MissingColumn(col.to_string()));
        }
    }
    Ok(())
}

/// Convert a parsed upload table into availability updates.
///
/// Individual bad rows are rejected, not fatal; only a missing required
/// column or an entirely rejected sheet fails the conversion.
pub fn convert_table(table: &Table) -> ValidationResult<ConversionReport> {
    check_columns(table)?;

    let mut updates = Vec::new();
    let mut rejected = Vec::new();

    for (i, _) in table.rows().iter().enumerate() {
        match convert_row(table, i) {
            Ok(update) => updates.push(update),
            Err(reason) => rejected.push((i, reason)),
        }
    }

    if updates.is_empty() {
        return Err(ValidationError::NoRecords { rejected: rejected.len() });
    }

    Ok(ConversionReport { updates, rejected })
}

fn convert_row(table: &Table, row: usize) -> Result<AvailabilityUpdate, String> {
    let text = |col: &str| -> String {
        table.cell(row, col).map(Cell::display).unwrap_or_default().trim().to_string()
    };
    let optional = |col: &str| -> Option<String> {
        let v = text(col);
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    };

    let store_code = text(COL_STORE);
    if store_code.is_empty() {
        return Err(format!("empty {COL_STORE}"));
    }

    let sku = text(COL_SKU);
    if sku.is_empty() {
        return Err(format!("empty {COL_SKU}"));
    }

    let availability = text(COL_AVAILABILITY);
    if availability.is_empty() {
        return Err(format!("empty {COL_AVAILABILITY}"));
    }

    let current_inventory = match table.cell(row, COL_INVENTORY) {
        Some(Cell::Number(n)) => n.round() as i64,
        // An absent inventory counts as zero on hand.
        Some(Cell::Empty) | None => 0,
        Some(Cell::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(|n| n.round() as i64)
            .map_err(|_| format!("{COL_INVENTORY} is not a number: '{}'", s.trim()))?,
    };

    let sales_floor_capacity = table.cell(row, COL_CAPACITY).and_then(|c| match c {
        Cell::Number(n) => Some(n.round() as i64),
        Cell::Text(s) => s.trim().parse::<f64>().ok().map(|n| n.round() as i64),
        Cell::Empty => None,
    });

    Ok(AvailabilityUpdate {
        store_code,
        item_name: optional(COL_ITEM_NAME),
        sku,
        availability,
        current_inventory,
        sales_floor_capacity,
        andon_cord: optional(COL_ANDON),
        tracking_start_date: optional(COL_TRACKING_START),
        tracking_end_date: optional(COL_TRACKING_END),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    fn upload_csv(rows: &str) -> Table {
        let header = "Store - 3 Letter Code,Item Name,Item PLU/UPC,Availability,Current Inventory,Sales Floor Capacity,Andon Cord,Tracking Start Date,Tracking End Date";
        parse_csv_str(&format!("{header}\n{rows}"), ',').unwrap()
    }

    #[test]
    fn test_convert_valid_rows() {
        let table = upload_csv("ABC,Apples,4011,Available,12,30,Enabled,2024-01-01,2024-02-01");
        let report = convert_table(&table).unwrap();

        assert_eq!(report.updates.len(), 1);
        assert!(report.rejected.is_empty());

        let u = &report.updates[0];
        assert_eq!(u.store_code, "ABC");
        assert_eq!(u.sku, "4011");
        assert_eq!(u.availability, "Available");
        assert_eq!(u.current_inventory, 12);
        assert_eq!(u.sales_floor_capacity, Some(30));
        assert_eq!(u.andon_cord.as_deref(), Some("Enabled"));
    }

    #[test]
    fn test_empty_inventory_defaults_to_zero() {
        let table = upload_csv("ABC,Apples,4011,Limited,,,,,");
        let report = convert_table(&table).unwrap();
        assert_eq!(report.updates[0].current_inventory, 0);
        assert_eq!(report.updates[0].sales_floor_capacity, None);
    }

    #[test]
    fn test_bad_rows_rejected_with_index() {
        let table = upload_csv(
            "ABC,Apples,4011,Available,12,,,,\n\
             ABC,Pears,,Available,3,,,,\n\
             ABC,Plums,4040,Available,lots,,,,",
        );
        let report = convert_table(&table).unwrap();

        assert_eq!(report.updates.len(), 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].0, 1);
        assert!(report.rejected[0].1.contains("Item PLU/UPC"));
        assert_eq!(report.rejected[1].0, 2);
        assert!(report.rejected[1].1.contains("not a number"));
    }

    #[test]
    fn test_missing_required_column() {
        let table = parse_csv_str("Item PLU/UPC,Availability\n4011,Available", ',').unwrap();
        assert!(matches!(
            convert_table(&table),
            Err(ValidationError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_all_rows_rejected_is_an_error() {
        let table = upload_csv("ABC,Apples,,Available,1,,,,");
        assert!(matches!(
            convert_table(&table),
            Err(ValidationError::NoRecords { rejected: 1 })
        ));
    }
}
