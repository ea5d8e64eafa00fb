//! slotdb - a minimal in-memory SQL engine behind a PostgreSQL-style socket
//!
//! Rows live in slot arrays with a FIFO free list. Tables group a schema
//! with one or more such stores, and a catalog names the tables. Queries
//! are parsed with `sqlparser`, planned into a projection/filter/scan tree
//! and pulled row by row straight into the wire response.
//!
//! # Example
//!
//! ```
//! use slotdb::catalog::demo_database;
//! use slotdb::executor::QueryExecutor;
//!
//! let executor = QueryExecutor::new(demo_database().unwrap().into_shared());
//! let result = executor
//!     .execute("SELECT email FROM users WHERE user_type = 'driver'")
//!     .unwrap();
//! assert_eq!(result.len(), 2);
//! ```

pub mod catalog;
pub mod executor;
pub mod planner;
pub mod server;
pub mod sql;
pub mod storage;
