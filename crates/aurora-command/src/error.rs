//! Error types for the command crate.

use thiserror::Error;

/// Errors building a command detector.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The namespace is empty or only whitespace.
    #[error("command namespace must not be empty")]
    EmptyNamespace,

    /// The command pattern failed to compile.
    #[error("invalid command pattern for namespace {namespace}: {source}")]
    InvalidPattern {
        namespace: String,
        #[source]
        source: regex::Error,
    },
}
