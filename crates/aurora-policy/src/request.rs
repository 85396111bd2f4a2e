//! Enforcement request types.

use aurora_core::HostRole;

/// What is known about the host a call is about to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFacts {
    /// Topology role when tracked, otherwise the role observed at open.
    pub role: HostRole,
    /// Whether the host has a topology record.
    pub tracked: bool,
    /// Write forwarding after a refresh; `false` for writers and untracked
    /// hosts.
    pub write_forwarding_enabled: bool,
}

impl HostFacts {
    pub fn writer() -> Self {
        Self {
            role: HostRole::Writer,
            tracked: true,
            write_forwarding_enabled: false,
        }
    }

    pub fn reader(write_forwarding_enabled: bool) -> Self {
        Self {
            role: HostRole::Reader,
            tracked: true,
            write_forwarding_enabled,
        }
    }

    /// A host with no topology record, seen at open with `role`.
    pub fn untracked(role: HostRole) -> Self {
        Self {
            role,
            tracked: false,
            write_forwarding_enabled: false,
        }
    }
}

/// One intercepted call to be checked.
#[derive(Debug, Clone)]
pub struct EnforcementRequest<'a> {
    /// Driver method name, e.g. `executeUpdate`.
    pub method: &'a str,
    /// Host identity of the owning connection.
    pub host: &'a str,
    pub sql: Option<&'a str>,
    /// Session strict-writer flag.
    pub strict_writer: bool,
    pub facts: HostFacts,
}
