use thiserror::Error;

/// The bridge's single error taxonomy. Every variant has a direct mapping to a
/// failure envelope returned across the wire (see [`crate::router::dispatch`]).
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown command: {0}")]
    CommandNotFound(String),

    #[error("interpreter error: {0}")]
    Interpreter(String),

    #[error("host error: {0}")]
    Host(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request timed out")]
    Timeout,

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("dispatcher is shutting down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, Error>;
