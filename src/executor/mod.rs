//! Query execution for slotdb.
//!
//! Drives a prepared plan's row iterator to exhaustion and hands each row
//! to a [`ResultSink`].

mod error;
mod executor;
mod result;

pub use error::{ExecuteError, ExecuteResult};
pub use executor::QueryExecutor;
pub use result::{select_status, ResultSet, ResultSink};
