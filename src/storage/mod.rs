//! storage layer for slotdb
//!
//! Rows live in key-addressed indexes. The upper layers (planner, executor)
//! only see the [`Index`] contract and the [`Table`] built on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                     Table                       │
//! │     (columns + primary and secondary indexes)   │
//! └─────────────────────────────────────────────────┘
//!                         │
//!          ┌──────────────┼──────────────┐
//!          ▼              ▼              ▼
//!   ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!   │  primary    │ │ secondary 1 │ │ secondary n │
//!   │ (ScanIndex) │ │   (Index)   │ │   (Index)   │
//!   └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use slotdb::catalog::Column;
//! use slotdb::storage::{Key, Table};
//!
//! let mut table = Table::new(vec![Column::integer("id"), Column::text("email")]);
//! let key = table.add_row(slotdb::row![1i64, "a@example.com"]).unwrap();
//! assert_eq!(key, Key::new(1));
//! assert_eq!(table.get_row(key).unwrap().key, key);
//! ```

mod errors;
mod index;
mod scan_index;
mod table;
mod types;

pub use errors::{StorageError, StorageResult};
pub use index::{collect_rows, Index, RowIterator};
pub use scan_index::{ScanIndex, ScanIterator};
pub use table::Table;
pub use types::{Key, Row, Value};
