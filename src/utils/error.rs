// src/utils/error.rs
use std::io;
use thiserror::Error;

/// Main error type for the mining application
///
/// Session-level failures (`ConnectionError`, `ProtocolError`, `IoError`)
/// are always recovered by the owning worker reconnecting; the remaining
/// variants surface at startup.
#[derive(Error, Debug)]
pub enum MinerError {
    /// Connecting to the pool or reading its version handshake failed
    #[error("Network connection error: {0}")]
    ConnectionError(String),

    /// The pool sent a malformed or incomplete reply
    #[error("Protocol violation: {0}")]
    ProtocolError(String),

    /// Standard I/O operation errors, including socket timeouts and resets
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP request/response errors from the pool locator
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid user input or parameter errors
    #[error("Invalid input: {0}")]
    InputError(String),
}

impl MinerError {
    /// Whether the error belongs to the connection class (connect, handshake,
    /// socket I/O) rather than to a malformed exchange
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            MinerError::ConnectionError(_) | MinerError::IoError(_)
        )
    }
}
