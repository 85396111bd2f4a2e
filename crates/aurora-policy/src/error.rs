//! Policy violation error.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a host failed the strict-writer check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// Reader without write forwarding.
    ReaderWithoutForwarding,
    /// Host is not in the topology table.
    UntrackedHost,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::ReaderWithoutForwarding => write!(f, "reader without write forwarding"),
            ViolationReason::UntrackedHost => write!(f, "host not tracked"),
        }
    }
}

/// A statement refused by strict-writer mode.
///
/// The connection stays open and usable after this error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error(
    "Strict-writer mode: Method {method} called on host {host} which is not a writer instance and not a write-forwarding enabled reader. SQL: {}",
    .sql.as_deref().unwrap_or("N/A")
)]
pub struct StrictWriterViolation {
    pub method: String,
    pub host: String,
    pub sql: Option<String>,
    pub reason: ViolationReason,
}

impl StrictWriterViolation {
    pub fn new(
        method: impl Into<String>,
        host: impl Into<String>,
        sql: Option<&str>,
        reason: ViolationReason,
    ) -> Self {
        Self {
            method: method.into(),
            host: host.into(),
            sql: sql.map(str::to_string),
            reason,
        }
    }
}
