//! The row store contract shared by every index implementation.

use super::errors::StorageResult;
use super::types::{Key, Row};

/// Pull-based cursor over rows.
///
/// Each call to [`next_row`](RowIterator::next_row) produces the next row,
/// `Ok(None)` once the sequence is exhausted, or an error if producing the
/// row failed. Cursors are single-pass.
pub trait RowIterator {
    fn next_row(&mut self) -> StorageResult<Option<Row>>;
}

impl<I: RowIterator + ?Sized> RowIterator for Box<I> {
    fn next_row(&mut self) -> StorageResult<Option<Row>> {
        (**self).next_row()
    }
}

/// Key-addressed container of rows.
///
/// Implementations carry no internal synchronization; callers that share an
/// index between threads guard it externally.
pub trait Index: Send + Sync {
    /// Store a row and return the key assigned to it.
    fn add(&mut self, row: Row) -> StorageResult<Key>;

    /// Free the slot behind `key`.
    fn remove(&mut self, key: Key) -> StorageResult<()>;

    /// Copy of the live row behind `key`.
    fn get(&self, key: Key) -> StorageResult<Row>;

    /// Fresh cursor over the live rows in ascending key order.
    fn iter(&self) -> Box<dyn RowIterator + Send + '_>;

    /// Number of live rows.
    fn size(&self) -> usize;

    /// Short label for plan rendering and logs.
    fn name(&self) -> &str;
}

/// Drain a cursor into a vector.
pub fn collect_rows<I: RowIterator + ?Sized>(iter: &mut I) -> StorageResult<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = iter.next_row()? {
        rows.push(row);
    }
    Ok(rows)
}
