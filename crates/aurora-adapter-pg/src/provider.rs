//! Connection provider for Aurora PostgreSQL clusters.

use aurora_core::{Driver, DriverConnection, HostRole, HostSpec, Properties};

use crate::error::ProviderError;

pub const TARGET_NAME: &str = "auroraPgConnectionProvider";

/// Decides which protocols and hosts the Postgres driver serves.
///
/// Host selection is deliberately simple: the first host with the requested
/// role, falling back to the first host in the list.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnectionProvider;

impl PgConnectionProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn target_name(&self) -> &'static str {
        TARGET_NAME
    }

    /// True for any protocol naming PostgreSQL.
    pub fn accepts_url(&self, protocol: &str) -> bool {
        protocol.to_lowercase().contains("postgresql")
    }

    /// Every selection strategy is accepted; see [`Self::host_by_strategy`].
    pub fn accepts_strategy(&self, _role: HostRole, _strategy: &str) -> bool {
        true
    }

    pub fn host_by_strategy(
        &self,
        hosts: &[HostSpec],
        role: HostRole,
        strategy: &str,
    ) -> Result<HostSpec, ProviderError> {
        let first = hosts.first().ok_or(ProviderError::EmptyHostList)?;
        let selected = hosts.iter().find(|h| h.role == role).unwrap_or(first);
        tracing::debug!(
            role = %role,
            strategy = %strategy,
            host = %selected,
            "Selected host"
        );
        Ok(selected.clone())
    }

    /// Open a connection through `driver`, naming the target in any failure.
    pub fn connect(
        &self,
        driver: &dyn Driver,
        protocol: &str,
        host: &HostSpec,
        properties: &Properties,
    ) -> Result<Box<dyn DriverConnection>, ProviderError> {
        driver
            .open(protocol, host, properties)
            .map_err(|source| ProviderError::Connect {
                url: format!("{protocol}//{host}"),
                protocol: protocol.to_string(),
                source,
            })
    }
}
