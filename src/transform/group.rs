//! Partition a table into named sub-tables by column value.

use std::collections::HashMap;

use crate::error::{TransformError, TransformResult};
use crate::models::Table;

/// Bucket name for rows whose grouping cell is empty or missing.
pub const EMPTY_GROUP_KEY: &str = "EMPTY";

/// One bucket: the distinct cell value and the rows sharing it.
#[derive(Debug, Clone)]
pub struct Group {
    pub key: String,
    pub table: Table,
}

/// The result of a group-by: buckets in first-seen order.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub column: String,
    pub groups: Vec<Group>,
}

impl Grouping {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Partition `table` by the cell value of `column`.
///
/// Every row lands in exactly one group; rows keep their original relative
/// order within a group; group order is the order keys are first seen.
/// Empty cells collapse into the [`EMPTY_GROUP_KEY`] bucket.
///
/// This is a pure partition; the fan-out confirmation guard lives at the
/// call site, before any output bytes are produced.
pub fn group_by(table: &Table, column: &str) -> TransformResult<Grouping> {
    let col = table
        .column_index(column)
        .ok_or_else(|| TransformError::MissingColumn(column.to_string()))?;

    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();

    for (i, row) in table.rows().iter().enumerate() {
        let cell = &row[col];
        let key = if cell.is_empty() { EMPTY_GROUP_KEY.to_string() } else { cell.display() };
        let bucket = buckets.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        bucket.push(i);
    }

    let groups = order
        .into_iter()
        .map(|key| {
            let indices = &buckets[&key];
            Group { table: table.with_rows(indices), key }
        })
        .collect();

    Ok(Grouping { column: column.to_string(), groups })
}
