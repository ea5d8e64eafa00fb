//! Catalog errors.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("table not found: {table} (database {database})")]
    TableNotFound { table: String, database: String },

    #[error("table already exists: {0}")]
    TableExists(String),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("seed format error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
