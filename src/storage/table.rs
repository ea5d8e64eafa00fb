//! Tables: a fixed column schema over one or more row indexes.

use tracing::warn;

use super::errors::{StorageError, StorageResult};
use super::index::Index;
use super::scan_index::ScanIndex;
use super::types::{Key, Row};
use crate::catalog::Column;

/// A table holds the same logical rows in every one of its indexes.
///
/// The first index is the primary index: it assigns keys and is the one
/// scanned by queries. Secondary indexes receive a copy of each row
/// carrying the primary key.
pub struct Table {
    columns: Vec<Column>,
    indexes: Vec<Box<dyn Index>>,
}

impl Table {
    /// Create a table backed by a single scan index.
    pub fn new(columns: Vec<Column>) -> Self {
        Self::with_indexes(columns, vec![Box::new(ScanIndex::new())])
    }

    /// Create a table with a primary scan index and `secondary` more.
    pub fn with_secondary_indexes(columns: Vec<Column>, secondary: usize) -> Self {
        let indexes = (0..=secondary)
            .map(|_| Box::new(ScanIndex::new()) as Box<dyn Index>)
            .collect();
        Self::with_indexes(columns, indexes)
    }

    /// Create a table over explicit indexes. An empty list gives a
    /// schema-only table that can be described but not scanned or written.
    pub fn with_indexes(columns: Vec<Column>, indexes: Vec<Box<dyn Index>>) -> Self {
        Self { columns, indexes }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The index that assigns keys and serves scans.
    pub fn primary_index(&self) -> Option<&dyn Index> {
        self.indexes.first().map(|index| index.as_ref())
    }

    pub fn indexes(&self) -> &[Box<dyn Index>] {
        &self.indexes
    }

    /// Number of live rows in the primary index.
    pub fn row_count(&self) -> usize {
        self.primary_index().map_or(0, |index| index.size())
    }

    /// Validate a row against the column list.
    pub fn validate_row(&self, row: &Row) -> StorageResult<()> {
        if row.len() != self.columns.len() {
            return Err(StorageError::ArityMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        for (column, value) in self.columns.iter().zip(&row.values) {
            if !column.kind.matches(value) {
                return Err(StorageError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.kind.to_string(),
                    actual: value.type_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Insert a row into every index and return the primary key.
    ///
    /// A secondary index failure is returned as
    /// [`StorageError::SecondaryIndex`]; the indexes that already accepted
    /// the row keep it.
    pub fn add_row(&mut self, row: Row) -> StorageResult<Key> {
        self.validate_row(&row)?;

        let (primary, secondaries) = self
            .indexes
            .split_first_mut()
            .ok_or(StorageError::NoBackingIndex)?;

        let key = primary.add(row.clone())?;
        for (offset, index) in secondaries.iter_mut().enumerate() {
            if let Err(e) = index.add(row.with_key(key)) {
                let position = offset + 1;
                warn!(index = position, %key, error = %e, "secondary index insert failed, indexes out of sync");
                return Err(StorageError::SecondaryIndex {
                    index: position,
                    key,
                    source: Box::new(e),
                });
            }
        }
        Ok(key)
    }

    /// Copy of the row behind `key` in the primary index.
    pub fn get_row(&self, key: Key) -> StorageResult<Row> {
        self.primary_index()
            .ok_or(StorageError::NoBackingIndex)?
            .get(key)
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("columns", &self.columns)
            .field("indexes", &self.indexes.len())
            .field("rows", &self.row_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::storage::index::{collect_rows, RowIterator};

    fn columns() -> Vec<Column> {
        vec![Column::integer("id"), Column::text("name")]
    }

    /// Index that accepts a fixed number of rows, then refuses.
    struct FullIndex {
        inner: ScanIndex,
        capacity: usize,
    }

    impl Index for FullIndex {
        fn add(&mut self, row: Row) -> StorageResult<Key> {
            if self.inner.size() >= self.capacity {
                return Err(StorageError::InvalidKey(Key::UNASSIGNED));
            }
            self.inner.add(row)
        }
        fn remove(&mut self, key: Key) -> StorageResult<()> {
            self.inner.remove(key)
        }
        fn get(&self, key: Key) -> StorageResult<Row> {
            self.inner.get(key)
        }
        fn iter(&self) -> Box<dyn RowIterator + Send + '_> {
            self.inner.iter()
        }
        fn size(&self) -> usize {
            self.inner.size()
        }
        fn name(&self) -> &str {
            "full"
        }
    }

    #[test]
    fn test_add_row_uses_primary_key() {
        let mut table = Table::new(columns());
        assert_eq!(table.add_row(row![1i64, "Alice"]).unwrap(), Key::new(1));
        assert_eq!(table.add_row(row![2i64, "Bob"]).unwrap(), Key::new(2));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get_row(Key::new(2)).unwrap().values, row![2i64, "Bob"].values);
    }

    #[test]
    fn test_add_row_propagates_to_secondaries() {
        let mut table = Table::with_secondary_indexes(columns(), 2);
        table.add_row(row![1i64, "Alice"]).unwrap();
        table.add_row(row![2i64, "Bob"]).unwrap();

        assert_eq!(table.indexes().len(), 3);
        let primary = collect_rows(&mut table.indexes()[0].iter()).unwrap();
        for index in table.indexes() {
            assert_eq!(collect_rows(&mut index.iter()).unwrap(), primary);
        }
    }

    #[test]
    fn test_add_row_validates_schema() {
        let mut table = Table::new(columns());
        assert!(matches!(
            table.add_row(row![1i64]),
            Err(StorageError::ArityMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            table.add_row(row!["1", "Alice"]),
            Err(StorageError::TypeMismatch { ref column, .. }) if column == "id"
        ));
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_secondary_failure_is_not_rolled_back() {
        let indexes: Vec<Box<dyn Index>> = vec![
            Box::new(ScanIndex::new()),
            Box::new(ScanIndex::new()),
            Box::new(FullIndex { inner: ScanIndex::new(), capacity: 1 }),
        ];
        let mut table = Table::with_indexes(columns(), indexes);
        table.add_row(row![1i64, "Alice"]).unwrap();

        let err = table.add_row(row![2i64, "Bob"]).unwrap_err();
        assert!(matches!(err, StorageError::SecondaryIndex { index: 2, key, .. } if key == Key::new(2)));
        assert!(err.is_partial_write());

        // Primary and first secondary kept the row, the failing one did not.
        assert_eq!(table.indexes()[0].size(), 2);
        assert_eq!(table.indexes()[1].size(), 2);
        assert_eq!(table.indexes()[2].size(), 1);
    }

    #[test]
    fn test_schema_only_table() {
        let mut table = Table::with_indexes(columns(), Vec::new());
        assert!(table.primary_index().is_none());
        assert_eq!(table.row_count(), 0);
        assert!(matches!(table.add_row(row![1i64, "Alice"]), Err(StorageError::NoBackingIndex)));
        assert!(matches!(table.get_row(Key::new(1)), Err(StorageError::NoBackingIndex)));
    }
}
