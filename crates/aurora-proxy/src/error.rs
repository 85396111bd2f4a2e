//! Error types for the proxy crate.

use aurora_command::CommandError;
use aurora_core::DriverError;
use aurora_policy::StrictWriterViolation;
use thiserror::Error;

/// Errors surfaced to callers of an intercepted connection.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// Opening the connection or its mandatory version probe failed.
    #[error("failed to connect to {host}: {source}")]
    ConnectFailure {
        host: String,
        #[source]
        source: DriverError,
    },

    /// Refused by strict-writer mode. The connection remains usable.
    #[error(transparent)]
    PolicyViolation(#[from] StrictWriterViolation),

    /// Error raised by the underlying driver call.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Invalid plugin configuration.
    #[error("invalid plugin configuration: {0}")]
    Config(#[from] CommandError),
}

impl InterceptError {
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, InterceptError::PolicyViolation(_))
    }
}

/// Result type for intercepted calls.
pub type InterceptResult<T> = Result<T, InterceptError>;
