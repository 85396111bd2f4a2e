//! Per-host topology record.

use aurora_core::HostRole;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// What the tracker knows about one host.
///
/// Records are plain values: the tracker hands out clones and writes whole
/// records back, so no reader ever sees a half-applied update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostRecord {
    /// Host identity (hostname).
    pub host: String,
    pub role: HostRole,
    pub availability_zone: Option<String>,
    /// Only meaningful while `role` is [`HostRole::Reader`].
    pub write_forwarding_enabled: bool,
    /// Monotonic time of the last write-forwarding probe; `None` = never.
    #[serde(skip)]
    pub last_probed_at: Option<Instant>,
    /// Wall-clock time of the same probe, for display.
    pub last_probed_wall: Option<DateTime<Utc>>,
}

impl HostRecord {
    /// A record seen for the first time: forwarding off, never probed.
    pub fn new(host: impl Into<String>, role: HostRole, availability_zone: Option<String>) -> Self {
        Self {
            host: host.into(),
            role,
            availability_zone,
            write_forwarding_enabled: false,
            last_probed_at: None,
            last_probed_wall: None,
        }
    }

    pub fn is_writer(&self) -> bool {
        self.role == HostRole::Writer
    }

    /// Whether a write-forwarding probe result is older than `interval`.
    pub fn is_probe_stale(&self, now: Instant, interval: Duration) -> bool {
        match self.last_probed_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) > interval,
        }
    }

    /// Record a probe outcome. Negative results are cached the same way.
    pub fn record_probe(&mut self, enabled: bool, at: Instant) {
        self.write_forwarding_enabled = enabled;
        self.last_probed_at = Some(at);
        self.last_probed_wall = Some(Utc::now());
    }

    /// Carry this record into a new topology with `role`.
    ///
    /// A role change drops the forwarding facts: they describe the host in its
    /// old role and a demoted writer must be probed afresh.
    pub fn with_role(mut self, role: HostRole) -> Self {
        if self.role != role {
            self.role = role;
            self.write_forwarding_enabled = false;
            self.last_probed_at = None;
            self.last_probed_wall = None;
        }
        self
    }

    /// Whether a strict-writer connection may run statements on this host.
    pub fn accepts_writes(&self) -> bool {
        self.is_writer() || self.write_forwarding_enabled
    }
}
