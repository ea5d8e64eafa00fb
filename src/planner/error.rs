//! Planning errors.

use thiserror::Error;

use crate::catalog::CatalogError;

/// Result type for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Query planning errors.
///
/// Every one of these is raised while building or preparing a plan, before
/// any row has been read.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("table not found: {table} (database {database})")]
    TableNotFound { table: String, database: String },

    #[error("catalog error: {0}")]
    Catalog(CatalogError),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("unsupported relation: {0}")]
    UnsupportedRelation(String),

    #[error("table is not persistent: {0}")]
    TableNotPersistent(String),

    #[error("plan node not prepared: {0}")]
    NotPrepared(&'static str),
}

impl From<CatalogError> for PlanError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::TableNotFound { table, database } => {
                PlanError::TableNotFound { table, database }
            }
            other => PlanError::Catalog(other),
        }
    }
}
