//! Configuration types for the Aurora interception engine.
//!
//! The plugin is configured once at construction, either from a YAML file or
//! from the driver property map, and individual connects may override the
//! AZ settings through their own properties.
//!
//! # Recognised properties
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `preferredAz` | AZ hint used for preference logging |
//! | `hostAzMap` | `host:az,host:az,...` explicit AZ map |
//! | `writeForwardingCheckIntervalSecs` | write-forwarding probe TTL |
//! | `commandNamespace` | namespace of the `SET SESSION` control command |

pub mod az;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::Properties;

pub use az::{AzConfig, parse_host_az_map};

pub const PREFERRED_AZ_PROPERTY: &str = "preferredAz";
pub const HOST_AZ_MAP_PROPERTY: &str = "hostAzMap";
pub const WRITE_FORWARDING_INTERVAL_PROPERTY: &str = "writeForwardingCheckIntervalSecs";
pub const COMMAND_NAMESPACE_PROPERTY: &str = "commandNamespace";

/// Plugin-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    /// Preferred availability zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_az: Option<String>,

    /// Raw `host:az,...` map; parsed leniently by [`PluginConfig::az_config`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_az_map: Option<String>,

    /// Seconds a write-forwarding probe result stays fresh.
    #[serde(default = "default_write_forwarding_interval")]
    pub write_forwarding_check_interval_secs: u64,

    /// Namespace of the `SET SESSION <namespace>.strict_writer` command.
    #[serde(default = "default_command_namespace")]
    pub command_namespace: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            preferred_az: None,
            host_az_map: None,
            write_forwarding_check_interval_secs: default_write_forwarding_interval(),
            command_namespace: default_command_namespace(),
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PluginConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from driver properties.
    ///
    /// Property values are never fatal: an unparseable interval is logged and
    /// replaced by the default.
    pub fn from_properties(props: &Properties) -> Self {
        let mut config = Self::default();
        config.merge_properties(props);
        config
    }

    /// Overlay recognised properties on top of this configuration.
    pub fn merge_properties(&mut self, props: &Properties) {
        if let Some(az) = non_empty(props.get(PREFERRED_AZ_PROPERTY)) {
            self.preferred_az = Some(az.to_string());
        }
        if let Some(map) = non_empty(props.get(HOST_AZ_MAP_PROPERTY)) {
            self.host_az_map = Some(map.to_string());
        }
        if let Some(raw) = non_empty(props.get(WRITE_FORWARDING_INTERVAL_PROPERTY)) {
            match raw.parse::<u64>() {
                Ok(secs) => self.write_forwarding_check_interval_secs = secs,
                Err(e) => tracing::warn!(
                    value = %raw,
                    error = %e,
                    "Ignoring invalid {} property",
                    WRITE_FORWARDING_INTERVAL_PROPERTY
                ),
            }
        }
        if let Some(ns) = non_empty(props.get(COMMAND_NAMESPACE_PROPERTY)) {
            self.command_namespace = ns.to_string();
        }
    }

    /// Check values that cannot be repaired with a default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_namespace.trim().is_empty() {
            return Err(ConfigError::Config(
                "commandNamespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse the AZ settings. Malformed map entries are skipped with a warning.
    pub fn az_config(&self) -> AzConfig {
        AzConfig::new(self.preferred_az.clone(), self.host_az_map.as_deref())
    }

    pub fn write_forwarding_check_interval(&self) -> Duration {
        Duration::from_secs(self.write_forwarding_check_interval_secs)
    }
}

/// Read a property, treating an empty value as absent.
pub fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

// Default value functions
fn default_write_forwarding_interval() -> u64 {
    60
}

fn default_command_namespace() -> String {
    "aws_advanced_jdbc".to_string()
}
