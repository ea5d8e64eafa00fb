//! Server and wire protocol errors.

use std::io;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Result type for frame reading.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that end a single connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("invalid frame length: {0}")]
    InvalidLength(u32),

    #[error("{field} {value} does not fit its wire field")]
    FieldOverflow { field: &'static str, value: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    /// True if the peer closed the socket in the middle of a frame.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ProtocolError::Io(e) if matches!(
            e.kind(),
            io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
        ))
    }
}

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("server task failed: {0}")]
    Task(String),
}
