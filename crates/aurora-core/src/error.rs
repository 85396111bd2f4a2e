//! Error types for the driver contract.

use thiserror::Error;

/// Errors raised by the underlying wire-protocol driver.
///
/// The interception pipeline never rewrites these; they reach the caller
/// exactly as the driver produced them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// Opening the physical connection failed.
    #[error("failed to connect to {host}: {message}")]
    ConnectFailed { host: String, message: String },

    /// The server rejected or failed a statement.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// The connection was already closed.
    #[error("connection is closed")]
    Closed,

    /// The driver does not implement the requested call.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl DriverError {
    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }
}
