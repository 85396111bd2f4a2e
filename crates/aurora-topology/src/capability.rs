//! Server capability probes.
//!
//! Run against a freshly opened connection: the server version line, the
//! Aurora marker setting and, for readers, the write-forwarding setting.

use aurora_core::{DriverConnection, DriverError};
use serde::Serialize;

pub const VERSION_QUERY: &str = "SELECT version()";
pub const AURORA_MARKER_QUERY: &str =
    "SELECT setting FROM pg_settings WHERE name = 'aurora_version'";
pub const WRITE_FORWARDING_QUERY: &str = "SHOW aurora_replica_write_forwarding";

/// Engine name reported for PostgreSQL servers.
pub const TARGET_ENGINE: &str = "PostgreSQL";
pub const UNKNOWN_ENGINE: &str = "Unknown";

/// Lowest major version that enables Aurora-specific behaviour.
pub const AURORA_MIN_MAJOR_VERSION: u32 = 17;

/// Parsed `SELECT version()` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerVersion {
    pub engine_name: String,
    pub major_version: u32,
    pub full_version: String,
}

impl ServerVersion {
    pub fn is_target_engine(&self) -> bool {
        self.engine_name == TARGET_ENGINE
    }
}

/// Parse a server version line such as
/// `PostgreSQL 17.2 on x86_64-pc-linux-gnu, compiled by gcc`.
///
/// Never fails: anything unparseable yields major version 0 with a warning.
pub fn parse_server_version(line: &str) -> ServerVersion {
    if !line.to_lowercase().contains("postgresql") {
        return ServerVersion {
            engine_name: UNKNOWN_ENGINE.to_string(),
            major_version: 0,
            full_version: line.to_string(),
        };
    }

    let parts: Vec<&str> = line.split(' ').collect();
    let major_version = match parts.as_slice() {
        [engine, version, ..] if engine.eq_ignore_ascii_case(TARGET_ENGINE) => {
            let major = version.split('.').next().unwrap_or_default();
            match major.parse::<u32>() {
                Ok(major) => major,
                Err(e) => {
                    tracing::warn!(
                        version = %line,
                        error = %e,
                        "Could not parse major version from server version line"
                    );
                    0
                }
            }
        }
        _ => {
            tracing::warn!(
                version = %line,
                "Unexpected server version format"
            );
            0
        }
    };

    ServerVersion {
        engine_name: TARGET_ENGINE.to_string(),
        major_version,
        full_version: line.to_string(),
    }
}

/// Facts established once per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionCapabilities {
    pub engine_name: String,
    pub major_version: u32,
    pub full_version: String,
    /// The Aurora marker setting was present and non-empty.
    pub is_aurora_cluster: bool,
}

impl ConnectionCapabilities {
    /// Capabilities of a server whose version line could not be read.
    pub fn unknown() -> Self {
        Self {
            engine_name: UNKNOWN_ENGINE.to_string(),
            major_version: 0,
            full_version: String::new(),
            is_aurora_cluster: false,
        }
    }

    pub fn is_target_engine(&self) -> bool {
        self.engine_name == TARGET_ENGINE
    }

    /// Aurora PostgreSQL at or above [`AURORA_MIN_MAJOR_VERSION`].
    pub fn is_aurora_v17_plus(&self) -> bool {
        self.is_target_engine()
            && self.major_version >= AURORA_MIN_MAJOR_VERSION
            && self.is_aurora_cluster
    }
}

/// Run the version probe and, for PostgreSQL servers, the Aurora marker probe.
///
/// A failing version query is returned as an error; the caller treats it as a
/// failed connect. A version query returning no row is not an error.
pub fn probe_capabilities(
    conn: &dyn DriverConnection,
) -> Result<ConnectionCapabilities, DriverError> {
    let result = conn.execute_query(VERSION_QUERY)?;
    let Some(line) = result.first_value() else {
        tracing::debug!(url = %conn.url(), "Version query returned no row");
        return Ok(ConnectionCapabilities::unknown());
    };

    let version = parse_server_version(line);
    let is_aurora_cluster = version.is_target_engine() && probe_aurora_marker(conn);

    let capabilities = ConnectionCapabilities {
        engine_name: version.engine_name,
        major_version: version.major_version,
        full_version: version.full_version,
        is_aurora_cluster,
    };

    if capabilities.is_aurora_v17_plus() {
        tracing::info!(
            version = %capabilities.full_version,
            "Connected to Aurora PostgreSQL {} or higher",
            AURORA_MIN_MAJOR_VERSION
        );
    } else if capabilities.is_target_engine()
        && capabilities.major_version >= AURORA_MIN_MAJOR_VERSION
    {
        tracing::info!(
            version = %capabilities.full_version,
            "Connected to PostgreSQL {} or higher, but not Aurora",
            AURORA_MIN_MAJOR_VERSION
        );
    } else {
        tracing::debug!(
            engine = %capabilities.engine_name,
            major_version = capabilities.major_version,
            "Connected to server below Aurora feature threshold"
        );
    }

    Ok(capabilities)
}

/// Whether the server reports a non-empty `aurora_version` setting.
///
/// Errors are logged and read as "not Aurora".
pub fn probe_aurora_marker(conn: &dyn DriverConnection) -> bool {
    match conn.execute_query(AURORA_MARKER_QUERY) {
        Ok(result) => result.first_value().is_some_and(|v| !v.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "Aurora marker probe failed");
            false
        }
    }
}

/// Whether the server reports write forwarding as enabled.
///
/// `on`/`true` (any case) or `1` mean enabled. Errors are logged and read as
/// disabled.
pub fn probe_write_forwarding(conn: &dyn DriverConnection) -> bool {
    match conn.execute_query(WRITE_FORWARDING_QUERY) {
        Ok(result) => result.first_value().is_some_and(is_enabled_setting),
        Err(e) => {
            tracing::debug!(error = %e, url = %conn.url(), "Write forwarding probe failed");
            false
        }
    }
}

fn is_enabled_setting(value: &str) -> bool {
    value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("true") || value == "1"
}
