//! TCP server speaking a subset of the PostgreSQL wire protocol.
//!
//! One tokio task per connection. Statements run through a shared
//! [`QueryExecutor`](crate::executor::QueryExecutor); each response is
//! fully buffered before it is written, so the catalog lock is never held
//! across an `.await`.
//!
//! ```text
//! client                         server
//!   | startup ----------------->  |
//!   | <---------- 'R' auth ok     |
//!   | <---------- 'Z' ready       |
//!   | 'Q' query --------------->  |
//!   | <---------- 'T' row desc    |
//!   | <---------- 'D' data row *  |
//!   | <---------- 'C' complete    |
//!   | <---------- 'Z' ready       |
//!   | 'X' terminate ----------->  |
//! ```

mod config;
mod connection;
mod error;
mod listener;
pub mod protocol;

pub use config::{ServerConfig, DEFAULT_MAX_MESSAGE_SIZE};
pub use error::{ProtocolError, ProtocolResult, ServerError, ServerResult};
pub use listener::{Server, ServerHandle};
