//! Availability-zone configuration.

use std::collections::HashMap;

/// Preferred AZ plus the explicit host-to-AZ map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AzConfig {
    pub preferred_az: Option<String>,
    pub host_to_az: HashMap<String, String>,
}

impl AzConfig {
    /// Build from the preferred AZ and a raw `host:az,...` string.
    pub fn new(preferred_az: Option<String>, host_az_map: Option<&str>) -> Self {
        let preferred_az = preferred_az.filter(|az| !az.trim().is_empty());
        let host_to_az = host_az_map
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_host_az_map)
            .unwrap_or_default();
        Self {
            preferred_az,
            host_to_az,
        }
    }

    /// Explicitly configured AZ for a host.
    pub fn mapped_az(&self, host: &str) -> Option<&str> {
        self.host_to_az.get(host).map(String::as_str)
    }
}

/// Parse `host:az,host:az,...`.
///
/// Pairs without a `:` or with an empty side are skipped with a warning.
/// Only the first `:` separates host from AZ.
pub fn parse_host_az_map(raw: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for pair in raw.split(',') {
        let Some((host, az)) = pair.trim().split_once(':') else {
            tracing::warn!(pair = %pair, map = %raw, "Invalid host-AZ pair");
            continue;
        };
        let (host, az) = (host.trim(), az.trim());
        if host.is_empty() || az.is_empty() {
            tracing::warn!(pair = %pair, map = %raw, "Empty host or AZ in pair");
            continue;
        }
        map.insert(host.to_string(), az.to_string());
    }

    if !map.is_empty() {
        tracing::info!(entries = map.len(), "Host-AZ map loaded");
    }
    map
}
