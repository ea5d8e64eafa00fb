//! Query execution errors.

use thiserror::Error;

use crate::planner::PlanError;
use crate::sql::ParseError;
use crate::storage::StorageError;

/// Result type for query execution.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Query execution errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("plan error: {0}")]
    Plan(#[from] PlanError),

    /// A row iterator failed after `rows` rows had already been delivered.
    #[error("error after {rows} rows: {source}")]
    Stream {
        rows: usize,
        #[source]
        source: StorageError,
    },
}

impl ExecuteError {
    /// True if the statement was rejected before any row was produced.
    pub fn before_first_row(&self) -> bool {
        !matches!(self, ExecuteError::Stream { .. })
    }

    /// Rows delivered to the sink before the error.
    pub fn rows_sent(&self) -> usize {
        match self {
            ExecuteError::Stream { rows, .. } => *rows,
            _ => 0,
        }
    }
}
