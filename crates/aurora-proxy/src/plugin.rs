//! Plugin entry point: connection establishment and topology notifications.

use aurora_command::ControlCommandDetector;
use aurora_core::config::{HOST_AZ_MAP_PROPERTY, PREFERRED_AZ_PROPERTY, non_empty, parse_host_az_map};
use aurora_core::{ConnectionId, Driver, HostSpec, PluginConfig, Properties};
use aurora_topology::TopologyTracker;
use std::sync::Arc;

use crate::connection::InterceptedConnection;
use crate::discovery::{DiscoveryError, HostListProvider, TopologyListener};
use crate::error::{InterceptError, InterceptResult};
use crate::pipeline::{ConnectionState, InterceptionPipeline};
use crate::session::SessionAttributeStore;

/// One plugin instance per process (or per cluster).
///
/// Every connection opened through the plugin shares its topology tracker
/// and session store.
#[derive(Debug)]
pub struct AuroraPlugin {
    config: PluginConfig,
    pipeline: Arc<InterceptionPipeline>,
}

impl AuroraPlugin {
    pub fn new(config: PluginConfig) -> InterceptResult<Self> {
        let commands = ControlCommandDetector::new(&config.command_namespace)?;
        let tracker = Arc::new(TopologyTracker::from_config(&config));
        let sessions = Arc::new(SessionAttributeStore::new());

        tracing::info!(
            preferred_az = config.preferred_az.as_deref().unwrap_or("none"),
            write_forwarding_check_interval_secs = config.write_forwarding_check_interval_secs,
            command_namespace = %config.command_namespace,
            "Aurora plugin initialised"
        );

        Ok(Self {
            config,
            pipeline: Arc::new(InterceptionPipeline::new(tracker, sessions, commands)),
        })
    }

    pub fn from_properties(properties: &Properties) -> InterceptResult<Self> {
        Self::new(PluginConfig::from_properties(properties))
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn tracker(&self) -> &TopologyTracker {
        self.pipeline.tracker()
    }

    pub fn sessions(&self) -> &SessionAttributeStore {
        self.pipeline.sessions()
    }

    /// Aurora >= 17, as reported by the most recently opened connection.
    pub fn is_aurora_v17_or_higher(&self) -> bool {
        self.tracker().is_aurora_v17_plus()
    }

    /// Open a connection to `host` through `driver` and wrap it.
    ///
    /// Connect-time `preferredAz` and `hostAzMap` properties replace the
    /// process-wide AZ settings. A failed open or version probe yields
    /// [`InterceptError::ConnectFailure`].
    pub fn connect(
        &self,
        driver: &dyn Driver,
        protocol: &str,
        host: &HostSpec,
        properties: &Properties,
    ) -> InterceptResult<InterceptedConnection> {
        self.apply_connect_properties(properties);

        let id = ConnectionId::new();
        let raw = driver
            .open(protocol, host, properties)
            .map_err(|source| {
                self.sessions().clear(id);
                InterceptError::ConnectFailure {
                    host: host.identity().to_string(),
                    source,
                }
            })?;

        let capabilities = match self.tracker().probe_connection(raw.as_ref(), host) {
            Ok(capabilities) => capabilities,
            Err(source) => {
                self.sessions().clear(id);
                if let Err(e) = raw.close() {
                    tracing::warn!(host = %host, error = %e, "Failed to close connection after probe failure");
                }
                tracing::error!(host = %host, error = %source, "Version probe failed, connect aborted");
                return Err(InterceptError::ConnectFailure {
                    host: host.identity().to_string(),
                    source,
                });
            }
        };

        let az = self
            .tracker()
            .record(host.identity())
            .and_then(|record| record.availability_zone);
        self.tracker()
            .az_advisor()
            .log_preference(host.identity(), az.as_deref());

        let state = Arc::new(ConnectionState {
            id,
            host: host.clone(),
            capabilities,
            driver: Arc::from(raw),
        });

        tracing::info!(
            connection_id = %id,
            host = %host,
            role = %host.role,
            url = %state.driver.url(),
            "Connection opened"
        );

        Ok(InterceptedConnection::new(state, Arc::clone(&self.pipeline)))
    }

    /// Seed the topology from a discovery source.
    pub fn init_host_provider(
        &self,
        provider: &dyn HostListProvider,
    ) -> Result<Vec<HostSpec>, DiscoveryError> {
        let hosts = provider.list_hosts()?;
        self.on_topology_changed(&hosts);
        Ok(hosts)
    }

    fn apply_connect_properties(&self, properties: &Properties) {
        let advisor = self.tracker().az_advisor();
        if let Some(az) = non_empty(properties.get(PREFERRED_AZ_PROPERTY)) {
            advisor.override_preferred_az(az);
        }
        if let Some(raw) = non_empty(properties.get(HOST_AZ_MAP_PROPERTY)) {
            advisor.replace_host_map(parse_host_az_map(raw));
            self.tracker().reresolve_availability_zones();
        }
    }
}

impl TopologyListener for AuroraPlugin {
    /// Replace the tracked topology and report preferred-AZ writer
    /// availability.
    fn on_topology_changed(&self, hosts: &[HostSpec]) {
        self.tracker().apply_topology_change(hosts);
        self.tracker().az_advisor().log_writer_availability(hosts);
    }
}
