//! Topology tracker: the shared host table.

use aurora_core::{AzConfig, DriverConnection, DriverError, HostRole, HostSpec, PluginConfig};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::az::AzAdvisor;
use crate::capability::{self, ConnectionCapabilities};
use crate::record::HostRecord;

/// Process-wide view of the cluster, keyed by host identity.
#[derive(Debug)]
pub struct TopologyTracker {
    records: RwLock<HashMap<String, HostRecord>>,
    az: AzAdvisor,
    write_forwarding_interval: Duration,
    /// Aurora >= 17 as reported by the most recently probed connection.
    aurora_v17_plus: AtomicBool,
}

impl TopologyTracker {
    pub fn new(az: AzConfig, write_forwarding_interval: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            az: AzAdvisor::new(az),
            write_forwarding_interval,
            aurora_v17_plus: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(config.az_config(), config.write_forwarding_check_interval())
    }

    pub fn az_advisor(&self) -> &AzAdvisor {
        &self.az
    }

    pub fn write_forwarding_interval(&self) -> Duration {
        self.write_forwarding_interval
    }

    /// Snapshot of one host's record.
    pub fn record(&self, host: &str) -> Option<HostRecord> {
        self.records.read().get(host).cloned()
    }

    /// Snapshot of every record, ordered by host.
    pub fn records(&self) -> Vec<HostRecord> {
        let mut records: Vec<HostRecord> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.host.cmp(&b.host));
        records
    }

    /// Get the record for `host`, creating it with `observed_role` if absent.
    ///
    /// An existing record is returned untouched: its role comes from the last
    /// topology change, not from whoever connected most recently.
    pub fn ensure_host_record(&self, host: &str, observed_role: HostRole) -> HostRecord {
        if let Some(record) = self.record(host) {
            return record;
        }

        let az = self.az.resolve(host);
        let mut records = self.records.write();
        records
            .entry(host.to_string())
            .or_insert_with(|| {
                tracing::debug!(
                    host = %host,
                    role = %observed_role,
                    az = az.as_deref().unwrap_or("unknown"),
                    "Tracking new host"
                );
                HostRecord::new(host, observed_role, az)
            })
            .clone()
    }

    /// Re-probe write forwarding for a reader when its cached result is stale.
    ///
    /// Returns the record as it stands afterwards, or `None` when the host is
    /// not tracked. Writers are returned without probing. The probe runs on
    /// `conn` with no lock held; concurrent refreshes of the same host may
    /// both probe and the last write wins.
    pub fn refresh_write_forwarding(
        &self,
        conn: &dyn DriverConnection,
        host: &str,
    ) -> Option<HostRecord> {
        let snapshot = self.record(host)?;
        if snapshot.is_writer()
            || !snapshot.is_probe_stale(Instant::now(), self.write_forwarding_interval)
        {
            return Some(snapshot);
        }

        let enabled = capability::probe_write_forwarding(conn);
        let probed_at = Instant::now();

        let mut records = self.records.write();
        let record = records.get_mut(host)?;
        // The host may have been promoted while the probe was in flight.
        if record.role == HostRole::Reader {
            if enabled != record.write_forwarding_enabled {
                tracing::info!(
                    host = %host,
                    enabled = enabled,
                    "Write forwarding status changed"
                );
            }
            record.record_probe(enabled, probed_at);
        }
        Some(record.clone())
    }

    /// Replace the tracked host set with `hosts`.
    ///
    /// Hosts kept across the change retain their AZ and forwarding facts,
    /// unless their role changed, in which case the forwarding facts are
    /// dropped. The new table is built under the write lock and swapped in
    /// whole.
    pub fn apply_topology_change(&self, hosts: &[HostSpec]) {
        let mut records = self.records.write();
        let mut next = HashMap::with_capacity(hosts.len());

        for spec in hosts {
            let host = spec.identity();
            let record = match records.get(host) {
                Some(existing) => {
                    if existing.role != spec.role {
                        tracing::info!(
                            host = %host,
                            from = %existing.role,
                            to = %spec.role,
                            "Host role changed"
                        );
                    }
                    existing.clone().with_role(spec.role)
                }
                None => HostRecord::new(host, spec.role, self.az.resolve(host)),
            };
            next.insert(host.to_string(), record);
        }

        let removed = records.keys().filter(|h| !next.contains_key(*h)).count();
        *records = next;

        let mut tracked: Vec<&str> = records.keys().map(String::as_str).collect();
        tracked.sort_unstable();
        tracing::info!(
            hosts = %tracked.join(", "),
            removed = removed,
            "Topology updated"
        );
    }

    pub fn resolve_availability_zone(&self, host: &str) -> Option<String> {
        self.az.resolve(host)
    }

    /// Recompute every record's AZ, after the host map changed.
    pub fn reresolve_availability_zones(&self) {
        let mut records = self.records.write();
        for (host, record) in records.iter_mut() {
            record.availability_zone = self.az.resolve(host);
        }
    }

    /// Probe a freshly opened connection and register its host.
    ///
    /// A failing version probe is returned as an error. On success the
    /// engine-wide Aurora flag is overwritten with this connection's result,
    /// the host record is ensured and, for readers, write forwarding is
    /// refreshed.
    pub fn probe_connection(
        &self,
        conn: &dyn DriverConnection,
        host: &HostSpec,
    ) -> Result<ConnectionCapabilities, DriverError> {
        let capabilities = capability::probe_capabilities(conn)?;
        self.aurora_v17_plus
            .store(capabilities.is_aurora_v17_plus(), Ordering::SeqCst);

        let record = self.ensure_host_record(host.identity(), host.role);
        if record.role == HostRole::Reader {
            self.refresh_write_forwarding(conn, host.identity());
        }
        Ok(capabilities)
    }

    /// Aurora >= 17 as last probed by any connection in this process.
    pub fn is_aurora_v17_plus(&self) -> bool {
        self.aurora_v17_plus.load(Ordering::SeqCst)
    }
}

impl Default for TopologyTracker {
    fn default() -> Self {
        Self::from_config(&PluginConfig::default())
    }
}
