//! Shared types for the Aurora interception engine.
//!
//! Every other crate in the workspace builds on the types defined here:
//! host identities and roles, the lifecycle-scoped [`ConnectionId`], plugin
//! configuration, and the narrow contract the engine uses to talk to the
//! underlying wire-protocol driver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// Configuration types shared across all crates
pub mod config;

// Contract for the wrapped driver
pub mod driver;

pub mod error;

pub use config::{AzConfig, ConfigError, PluginConfig};
pub use driver::{ColumnInfo, Driver, DriverConnection, QueryResult};
pub use error::DriverError;

/// Driver connection properties (`key -> value`), as handed to `connect`.
pub type Properties = HashMap<String, String>;

/// Role of a cluster member at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostRole {
    Writer,
    Reader,
}

impl HostRole {
    /// Parse a role name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WRITER" => Some(Self::Writer),
            "READER" => Some(Self::Reader),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Writer => "WRITER",
            Self::Reader => "READER",
        }
    }
}

impl fmt::Display for HostRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster member as published by host discovery.
///
/// The hostname is the host identity: topology records are keyed by it and
/// the port takes no part in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    pub host: String,
    pub port: u16,
    pub role: HostRole,
}

impl HostSpec {
    pub fn new(host: impl Into<String>, port: u16, role: HostRole) -> Self {
        Self {
            host: host.into(),
            port,
            role,
        }
    }

    pub fn writer(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, HostRole::Writer)
    }

    pub fn reader(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, HostRole::Reader)
    }

    /// The identity used as the topology key.
    pub fn identity(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Lifecycle-scoped handle for one physical connection.
///
/// A fresh id is minted for every physical open, so a driver that recycles
/// its own handles can never inherit another connection's session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
