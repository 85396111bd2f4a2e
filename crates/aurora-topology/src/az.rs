//! Availability-zone resolution and preference logging.
//!
//! The preferred AZ is advisory: it is logged on connect and on topology
//! changes but never influences which host a connection goes to.

use aurora_core::{AzConfig, HostRole, HostSpec};
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static AZ_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}-[a-z]+-[0-9][a-z]$").expect("valid AZ pattern"));

/// Guess the AZ from a hostname segment like `us-east-1a`.
pub fn az_from_hostname(host: &str) -> Option<String> {
    host.split('.')
        .find(|segment| AZ_SEGMENT.is_match(segment))
        .map(str::to_string)
}

/// How a connection's AZ compares with the preferred AZ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AzPreference {
    /// No preferred AZ configured.
    NotConfigured,
    Preferred { az: String },
    NotPreferred { az: String, preferred: String },
    Unknown { preferred: String },
}

/// Writers available in the preferred AZ after a topology change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriterAzAvailability {
    NotConfigured,
    Available { preferred: String, hosts: Vec<String> },
    Unavailable { preferred: String },
}

/// Process-wide AZ settings.
///
/// Connects may replace the preferred AZ or the host map through their own
/// properties; the latest value applies to the whole process.
#[derive(Debug, Default)]
pub struct AzAdvisor {
    config: RwLock<AzConfig>,
}

impl AzAdvisor {
    pub fn new(config: AzConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Explicit map first, then the hostname heuristic.
    pub fn resolve(&self, host: &str) -> Option<String> {
        if let Some(az) = self.config.read().mapped_az(host) {
            return Some(az.to_string());
        }
        az_from_hostname(host)
    }

    pub fn preferred_az(&self) -> Option<String> {
        self.config.read().preferred_az.clone()
    }

    /// Replace the preferred AZ if it differs (case-insensitively) from the
    /// current one. Returns `true` when it changed.
    pub fn override_preferred_az(&self, az: &str) -> bool {
        let mut config = self.config.write();
        let changed = config
            .preferred_az
            .as_deref()
            .is_none_or(|current| !current.eq_ignore_ascii_case(az));
        if changed {
            tracing::info!(
                preferred_az = %az,
                previous = config.preferred_az.as_deref().unwrap_or("none"),
                "Preferred AZ updated from connection properties"
            );
            config.preferred_az = Some(az.to_string());
        }
        changed
    }

    /// Replace the explicit host map wholesale.
    pub fn replace_host_map(&self, host_to_az: HashMap<String, String>) {
        let mut config = self.config.write();
        tracing::info!(entries = host_to_az.len(), "Host-AZ map replaced");
        config.host_to_az = host_to_az;
    }

    /// Compare a connection's AZ with the preferred AZ and log the outcome.
    pub fn log_preference(&self, host: &str, az: Option<&str>) -> AzPreference {
        let Some(preferred) = self.preferred_az() else {
            return AzPreference::NotConfigured;
        };

        match az {
            Some(az) if az.eq_ignore_ascii_case(&preferred) => {
                tracing::info!(host = %host, az = %az, "Connecting to host in preferred AZ");
                AzPreference::Preferred { az: az.to_string() }
            }
            Some(az) => {
                tracing::info!(
                    host = %host,
                    az = %az,
                    preferred_az = %preferred,
                    "Connecting to host outside the preferred AZ"
                );
                AzPreference::NotPreferred {
                    az: az.to_string(),
                    preferred,
                }
            }
            None => {
                tracing::info!(
                    host = %host,
                    preferred_az = %preferred,
                    "Connecting to host whose AZ cannot be determined"
                );
                AzPreference::Unknown { preferred }
            }
        }
    }

    /// Log whether the new topology has a writer in the preferred AZ.
    pub fn log_writer_availability(&self, hosts: &[HostSpec]) -> WriterAzAvailability {
        let Some(preferred) = self.preferred_az() else {
            return WriterAzAvailability::NotConfigured;
        };

        let writers: Vec<String> = hosts
            .iter()
            .filter(|spec| spec.role == HostRole::Writer)
            .filter(|spec| {
                self.resolve(spec.identity())
                    .is_some_and(|az| az.eq_ignore_ascii_case(&preferred))
            })
            .map(|spec| spec.identity().to_string())
            .collect();

        if writers.is_empty() {
            tracing::warn!(preferred_az = %preferred, "No writer instance available in preferred AZ");
            WriterAzAvailability::Unavailable { preferred }
        } else {
            tracing::info!(
                preferred_az = %preferred,
                hosts = %writers.join(", "),
                "Writer instances available in preferred AZ"
            );
            WriterAzAvailability::Available {
                preferred,
                hosts: writers,
            }
        }
    }
}
