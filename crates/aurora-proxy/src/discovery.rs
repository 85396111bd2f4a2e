//! Host discovery contract.

use aurora_core::HostSpec;
use parking_lot::RwLock;
use thiserror::Error;

/// Errors from a host discovery source.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("host discovery failed: {0}")]
    Unavailable(String),

    #[error("invalid host list entry: {0}")]
    InvalidEntry(String),
}

/// Source of the authoritative cluster host list.
pub trait HostListProvider: Send + Sync {
    /// Current hosts with their roles, in discovery order.
    fn list_hosts(&self) -> Result<Vec<HostSpec>, DiscoveryError>;
}

/// Receiver of pushed topology changes.
pub trait TopologyListener: Send + Sync {
    fn on_topology_changed(&self, hosts: &[HostSpec]);
}

/// Fixed host list, replaceable at runtime.
#[derive(Debug, Default)]
pub struct StaticHostListProvider {
    hosts: RwLock<Vec<HostSpec>>,
}

impl StaticHostListProvider {
    pub fn new(hosts: Vec<HostSpec>) -> Self {
        Self {
            hosts: RwLock::new(hosts),
        }
    }

    /// Parse `role:host:port,...`, e.g. `writer:db-1:5432,reader:db-2:5432`.
    pub fn parse(raw: &str) -> Result<Self, DiscoveryError> {
        let hosts = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(parse_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(hosts))
    }

    /// Replace the host list and notify `listener`.
    pub fn publish(&self, hosts: Vec<HostSpec>, listener: &dyn TopologyListener) {
        *self.hosts.write() = hosts.clone();
        listener.on_topology_changed(&hosts);
    }
}

impl HostListProvider for StaticHostListProvider {
    fn list_hosts(&self) -> Result<Vec<HostSpec>, DiscoveryError> {
        Ok(self.hosts.read().clone())
    }
}

fn parse_entry(entry: &str) -> Result<HostSpec, DiscoveryError> {
    let mut parts = entry.splitn(3, ':');
    let (Some(role), Some(host), Some(port)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DiscoveryError::InvalidEntry(entry.to_string()));
    };
    let role = aurora_core::HostRole::parse(role)
        .ok_or_else(|| DiscoveryError::InvalidEntry(entry.to_string()))?;
    let port = port
        .trim()
        .parse::<u16>()
        .map_err(|_| DiscoveryError::InvalidEntry(entry.to_string()))?;
    if host.trim().is_empty() {
        return Err(DiscoveryError::InvalidEntry(entry.to_string()));
    }
    Ok(HostSpec::new(host.trim(), port, role))
}
