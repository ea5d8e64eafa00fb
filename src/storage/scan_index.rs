//! Array-backed row index with slot recycling.

use std::collections::VecDeque;

use super::errors::{StorageError, StorageResult};
use super::index::{Index, RowIterator};
use super::types::{Key, Row};

/// A growable array of slots plus a FIFO queue of freed positions.
///
/// Inserts reuse the oldest freed slot before growing the array, so the
/// key handed out by [`add`](Index::add) is fully determined by the
/// history of adds and removes.
#[derive(Debug, Default, Clone)]
pub struct ScanIndex {
    slots: Vec<Option<Row>>,
    free: VecDeque<usize>,
}

impl ScanIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: VecDeque::new(),
        }
    }

    /// Position of the live slot behind `key`.
    fn live_position(&self, key: Key) -> StorageResult<usize> {
        match key.position() {
            Some(position) if matches!(self.slots.get(position), Some(Some(_))) => Ok(position),
            _ => Err(StorageError::InvalidKey(key)),
        }
    }
}

impl Index for ScanIndex {
    fn add(&mut self, mut row: Row) -> StorageResult<Key> {
        let key = match self.free.pop_front() {
            Some(position) => {
                let key = Key::from_position(position);
                row.key = key;
                self.slots[position] = Some(row);
                key
            }
            None => {
                let key = Key::from_position(self.slots.len());
                row.key = key;
                self.slots.push(Some(row));
                key
            }
        };
        Ok(key)
    }

    fn remove(&mut self, key: Key) -> StorageResult<()> {
        let position = self.live_position(key)?;
        self.slots[position] = None;
        self.free.push_back(position);
        Ok(())
    }

    fn get(&self, key: Key) -> StorageResult<Row> {
        let position = self.live_position(key)?;
        self.slots[position]
            .clone()
            .ok_or(StorageError::InvalidKey(key))
    }

    fn iter(&self) -> Box<dyn RowIterator + Send + '_> {
        Box::new(ScanIterator::new(self))
    }

    fn size(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn name(&self) -> &str {
        "scan"
    }
}

/// Cursor over a [`ScanIndex`], skipping freed slots.
pub struct ScanIterator<'a> {
    slots: &'a [Option<Row>],
    position: usize,
}

impl<'a> ScanIterator<'a> {
    fn new(index: &'a ScanIndex) -> Self {
        Self {
            slots: &index.slots,
            position: 0,
        }
    }
}

impl RowIterator for ScanIterator<'_> {
    fn next_row(&mut self) -> StorageResult<Option<Row>> {
        while self.position < self.slots.len() {
            let slot = &self.slots[self.position];
            self.position += 1;
            if let Some(row) = slot {
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::storage::index::collect_rows;

    fn index_with(values: &[&str]) -> ScanIndex {
        let mut index = ScanIndex::new();
        for value in values {
            index.add(row![*value]).unwrap();
        }
        index
    }

    fn keys(index: &ScanIndex) -> Vec<usize> {
        collect_rows(&mut index.iter())
            .unwrap()
            .iter()
            .map(|r| r.key.get())
            .collect()
    }

    #[test]
    fn test_add_appends_when_no_free_slots() {
        let mut index = ScanIndex::new();
        assert_eq!(index.add(row!["val1"]).unwrap(), Key::new(1));
        assert_eq!(index.add(row!["val2"]).unwrap(), Key::new(2));
        assert_eq!(index.add(row!["val3"]).unwrap(), Key::new(3));
        assert_eq!(index.size(), 3);
    }

    #[test]
    fn test_add_overwrites_caller_key() {
        let mut index = ScanIndex::new();
        let mut row = row!["val1"];
        row.key = Key::new(42);

        let key = index.add(row).unwrap();
        assert_eq!(key, Key::new(1));
        assert_eq!(index.get(key).unwrap().key, Key::new(1));
    }

    #[test]
    fn test_get_round_trip() {
        let mut index = index_with(&["val1"]);
        let key = index.add(row![7i64, "val2"]).unwrap();

        let stored = index.get(key).unwrap();
        assert_eq!(stored, row![7i64, "val2"].with_key(key));
    }

    #[test]
    fn test_remove_then_get_fails() {
        let mut index = index_with(&["val1", "val2"]);
        index.remove(Key::new(1)).unwrap();

        assert!(matches!(index.get(Key::new(1)), Err(StorageError::InvalidKey(k)) if k == Key::new(1)));
        assert_eq!(index.get(Key::new(2)).unwrap().values, row!["val2"].values);
        assert_eq!(index.size(), 1);
    }

    #[test]
    fn test_remove_invalid_keys() {
        let mut index = ScanIndex::new();
        assert!(matches!(index.remove(Key::new(1)), Err(StorageError::InvalidKey(_))));

        let mut index = index_with(&["val1"]);
        assert!(matches!(index.remove(Key::UNASSIGNED), Err(StorageError::InvalidKey(_))));
        assert!(matches!(index.remove(Key::new(2)), Err(StorageError::InvalidKey(_))));

        index.remove(Key::new(1)).unwrap();
        // Double free must not push the slot onto the free list twice.
        assert!(matches!(index.remove(Key::new(1)), Err(StorageError::InvalidKey(_))));
        assert_eq!(index.size(), 0);
        assert_eq!(index.add(row!["val2"]).unwrap(), Key::new(1));
        assert_eq!(index.add(row!["val3"]).unwrap(), Key::new(2));
    }

    #[test]
    fn test_reuse_is_oldest_freed_first() {
        let mut index = index_with(&["a", "b", "c", "d"]);
        index.remove(Key::new(3)).unwrap();
        index.remove(Key::new(1)).unwrap();
        index.remove(Key::new(4)).unwrap();

        assert_eq!(index.add(row!["e"]).unwrap(), Key::new(3));
        index.remove(Key::new(2)).unwrap();
        assert_eq!(index.add(row!["f"]).unwrap(), Key::new(1));
        assert_eq!(index.add(row!["g"]).unwrap(), Key::new(4));
        assert_eq!(index.add(row!["h"]).unwrap(), Key::new(2));
        // Free list drained: grow again.
        assert_eq!(index.add(row!["i"]).unwrap(), Key::new(5));

        assert_eq!(index.get(Key::new(3)).unwrap().values, row!["e"].values);
        assert_eq!(index.get(Key::new(2)).unwrap().values, row!["h"].values);
    }

    #[test]
    fn test_size_tracks_adds_and_successful_removes() {
        let mut index = ScanIndex::new();
        let mut adds = 0;
        let mut removes = 0;

        for i in 0..20i64 {
            index.add(row![i]).unwrap();
            adds += 1;
            if i % 3 == 0 {
                let key = Key::new((i as usize / 2) + 1);
                if index.remove(key).is_ok() {
                    removes += 1;
                }
            }
            // Out-of-range removes never count.
            assert!(index.remove(Key::new(1000)).is_err());
            assert_eq!(index.size(), adds - removes);
        }
    }

    #[test]
    fn test_iterator_skips_free_slots() {
        let mut index = index_with(&["a", "b", "c", "d", "e"]);
        index.remove(Key::new(2)).unwrap();
        index.remove(Key::new(5)).unwrap();

        assert_eq!(keys(&index), vec![1, 3, 4]);

        let rows = collect_rows(&mut index.iter()).unwrap();
        let values: Vec<_> = rows.iter().map(|r| r.values[0].to_string()).collect();
        assert_eq!(values, vec!["a", "c", "d"]);
        for row in &rows {
            assert_eq!(index.get(row.key).unwrap(), *row);
        }
    }

    #[test]
    fn test_iterator_on_empty_and_fully_freed_index() {
        let index = ScanIndex::new();
        assert!(index.iter().next_row().unwrap().is_none());

        let mut index = index_with(&["a", "b"]);
        index.remove(Key::new(1)).unwrap();
        index.remove(Key::new(2)).unwrap();
        let mut iter = index.iter();
        assert!(iter.next_row().unwrap().is_none());
        // Stays exhausted.
        assert!(iter.next_row().unwrap().is_none());
    }

    #[test]
    fn test_iterators_are_independent() {
        let index = index_with(&["a", "b", "c"]);
        let mut first = index.iter();
        first.next_row().unwrap();
        first.next_row().unwrap();

        let mut second = index.iter();
        assert_eq!(second.next_row().unwrap().unwrap().key, Key::new(1));
        assert_eq!(first.next_row().unwrap().unwrap().key, Key::new(3));
        assert!(first.next_row().unwrap().is_none());
    }

    #[test]
    fn test_reused_slot_keeps_ascending_iteration() {
        let mut index = index_with(&["a", "b", "c"]);
        index.remove(Key::new(1)).unwrap();
        index.add(row!["z"]).unwrap();

        let rows = collect_rows(&mut index.iter()).unwrap();
        assert_eq!(rows[0].key, Key::new(1));
        assert_eq!(rows[0].values, row!["z"].values);
        assert_eq!(keys(&index), vec![1, 2, 3]);
    }
}
