//! Building a catalog from a JSON seed document.
//!
//! ```json
//! {
//!   "name": "demo",
//!   "tables": [
//!     {
//!       "name": "users",
//!       "columns": [{"name": "id", "kind": "integer"}],
//!       "secondary_indexes": 0,
//!       "rows": [[1], [2]]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::database::Database;
use super::error::{CatalogError, CatalogResult};
use super::types::Column;
use crate::storage::{Row, StorageError, Table, Value};

/// Catalog served when no seed file is given.
const DEMO_SEED: &str = r#"{
    "name": "demo",
    "tables": [
        {
            "name": "users",
            "columns": [
                {"name": "id", "kind": "integer"},
                {"name": "user_type", "kind": "text"},
                {"name": "email", "kind": "text"},
                {"name": "age", "kind": "integer"}
            ],
            "rows": [
                [1, "customer", "customer1@example.com", 24],
                [2, "driver", "driver2@example.com", 30],
                [3, "customer", "customer3@example.com", 25],
                [4, "driver", "driver4@example.com", 31],
                [5, "customer", "customer5@example.com", 40]
            ]
        }
    ]
}"#;

/// A database description loaded from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSeed {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableSeed>,
}

/// One table of a [`CatalogSeed`].
#[derive(Debug, Clone, Deserialize)]
pub struct TableSeed {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub secondary_indexes: usize,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl CatalogSeed {
    /// Parse a seed document.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a seed file.
    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The built-in `users` demo catalog.
    pub fn demo() -> CatalogResult<Self> {
        Self::from_json_str(DEMO_SEED)
    }

    /// Build the database, inserting rows in document order.
    pub fn into_database(self) -> CatalogResult<Database> {
        let mut db = Database::new(self.name);
        for seed in self.tables {
            let table = seed.build()?;
            info!(table = %seed.name, rows = table.row_count(), "seeded table");
            db.add_table(seed.name, table)?;
        }
        Ok(db)
    }
}

impl TableSeed {
    fn build(&self) -> CatalogResult<Table> {
        let mut table = Table::with_secondary_indexes(self.columns.clone(), self.secondary_indexes);
        for (line, values) in self.rows.iter().enumerate() {
            table
                .add_row(Row::new(values.clone()))
                .map_err(|e| match e {
                    StorageError::ArityMismatch { .. } | StorageError::TypeMismatch { .. } => {
                        CatalogError::InvalidSeed(format!("table '{}' row {}: {}", self.name, line, e))
                    }
                    other => CatalogError::Storage(other),
                })?;
        }
        Ok(table)
    }
}

/// The demo database behind the default server.
pub fn demo_database() -> CatalogResult<Database> {
    CatalogSeed::demo()?.into_database()
}
