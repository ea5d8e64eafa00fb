//! Query result types.

use crate::catalog::Column;
use crate::storage::{Row, Value};

/// Receiver of a statement's output, fed while the catalog lock is held.
///
/// `begin` is called once with the output schema, before any `row`.
/// Implementations must not block.
pub trait ResultSink {
    fn begin(&mut self, columns: &[Column]);
    fn row(&mut self, row: Row);
}

/// Status string reported for a completed SELECT.
pub fn select_status(rows: usize) -> String {
    format!("SELECT {}", rows)
}

/// A set of rows from a SELECT query, held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Output columns in order.
    pub columns: Vec<Column>,
    /// Rows, each with one value per column.
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Create a new empty result set.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Values of one named column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let position = self.columns.iter().position(|c| c.name == name)?;
        Some(self.rows.iter().filter_map(|r| r.get(position)).collect())
    }

    pub fn status(&self) -> String {
        select_status(self.rows.len())
    }
}

impl ResultSink for ResultSet {
    fn begin(&mut self, columns: &[Column]) {
        self.columns = columns.to_vec();
        self.rows.clear();
    }

    fn row(&mut self, row: Row) {
        self.rows.push(row);
    }
}
