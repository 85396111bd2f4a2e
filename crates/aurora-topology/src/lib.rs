//! # aurora-topology
//!
//! Live picture of an Aurora-style cluster as seen from one client process.
//!
//! This crate provides:
//! - [`TopologyTracker`]: one [`HostRecord`] per host identity (role,
//!   availability zone, write-forwarding capability, last probe time)
//! - Capability probes run once per connection (engine, version, Aurora
//!   marker) and the TTL-cached write-forwarding probe for readers
//! - [`AzAdvisor`]: AZ resolution (explicit map, then hostname heuristic) and
//!   preferred-AZ logging
//!
//! ## Locking
//!
//! The host table sits behind a single `RwLock`. Probes perform blocking I/O
//! against the database and are never issued while that lock is held:
//! staleness is read from a snapshot, the probe runs unlocked, and the result
//! is written back in a short critical section.

pub mod az;
pub mod capability;
pub mod record;
pub mod tracker;

pub use az::{AzAdvisor, AzPreference, WriterAzAvailability, az_from_hostname};
pub use capability::{
    ConnectionCapabilities, ServerVersion, parse_server_version, probe_aurora_marker,
    probe_capabilities, probe_write_forwarding,
};
pub use record::HostRecord;
pub use tracker::TopologyTracker;
