//! Catalog module: column types, the table registry and seeding.
//!
//! A [`Database`] maps table names to [`Table`](crate::storage::Table)s. It
//! is built once at startup, either from the built-in demo seed or a JSON
//! seed file, and shared read-mostly afterwards.

mod database;
mod error;
mod seed;
mod types;

pub use database::{Database, SharedDatabase};
pub use error::{CatalogError, CatalogResult};
pub use seed::{demo_database, CatalogSeed, TableSeed};
pub use types::{Column, DataType};
