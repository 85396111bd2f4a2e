//! CLI command implementations.
//!
//! Each command returns a JSON value that `main` prints.

pub mod az;
pub mod probe;
pub mod version;

use anyhow::{Context, Result};
use aurora_core::{HostRole, HostSpec, PluginConfig};
use clap::ValueEnum;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Writer,
    Reader,
}

impl RoleArg {
    pub fn role(self) -> HostRole {
        match self {
            RoleArg::Writer => HostRole::Writer,
            RoleArg::Reader => HostRole::Reader,
        }
    }

    pub fn host_spec(self, host: &str, port: u16) -> HostSpec {
        HostSpec::new(host, port, self.role())
    }
}

/// Load the plugin configuration, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<PluginConfig> {
    match path {
        Some(path) => PluginConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(PluginConfig::default()),
    }
}
