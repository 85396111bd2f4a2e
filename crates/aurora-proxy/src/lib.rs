//! # aurora-proxy
//!
//! Client-side call interception for Aurora-style clusters.
//!
//! Connections opened through [`AuroraPlugin::connect`] are wrapped so that
//! every call passes through the [`InterceptionPipeline`]:
//!
//! ```text
//! Application
//!       │  execute / executeUpdate / commit / close ...
//!       ▼
//! ┌──────────────────────────┐
//! │  InterceptionPipeline    │
//! │  1. Control command      │  ← aurora-command
//! │  2. Strict-writer policy │  ← aurora-policy + aurora-topology
//! │  3. Delegate             │
//! │  4. Close cleanup        │
//! └────────────┬─────────────┘
//!              ▼
//!       Underlying driver
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use aurora_core::{Driver, HostSpec, PluginConfig, Properties};
//! use aurora_proxy::AuroraPlugin;
//!
//! fn run(driver: &dyn Driver) -> Result<(), Box<dyn std::error::Error>> {
//!     let plugin = AuroraPlugin::new(PluginConfig::default())?;
//!     let host = HostSpec::reader("db-2.cluster-ro.us-east-1a.example.com", 5432);
//!     let conn = plugin.connect(driver, "jdbc:postgresql:", &host, &Properties::new())?;
//!
//!     conn.execute("SET SESSION aws_advanced_jdbc.strict_writer = 'true'")?;
//!     // Refused unless the reader has write forwarding enabled.
//!     conn.execute_update("UPDATE accounts SET balance = 0")?;
//!     conn.close()?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod plugin;
pub mod session;

pub use connection::{InterceptedConnection, InterceptedStatement};
pub use discovery::{DiscoveryError, HostListProvider, StaticHostListProvider, TopologyListener};
pub use error::{InterceptError, InterceptResult};
pub use pipeline::{CallOutput, CallTarget, ConnectionState, InterceptionPipeline, Method};
pub use plugin::AuroraPlugin;
pub use session::SessionAttributeStore;
