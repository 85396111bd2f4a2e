//! Strict-writer decision rule.

use aurora_core::HostRole;
use serde::Serialize;

use crate::error::{StrictWriterViolation, ViolationReason};
use crate::request::EnforcementRequest;

/// Why a call was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Strict-writer mode is off for this connection.
    NotEnforced,
    Writer,
    ForwardingReader,
}

/// Read the session attribute value. Absent or anything but `true` is off.
pub fn is_strict_writer_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// The strict-writer rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictWriterPolicy;

impl StrictWriterPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Allow or refuse one call.
    pub fn check(&self, request: &EnforcementRequest<'_>) -> Result<Decision, StrictWriterViolation> {
        if !request.strict_writer {
            return Ok(Decision::NotEnforced);
        }

        let facts = request.facts;
        if facts.role == HostRole::Writer {
            return Ok(Decision::Writer);
        }
        if facts.tracked && facts.write_forwarding_enabled {
            tracing::debug!(
                host = %request.host,
                method = %request.method,
                "Allowing call on write-forwarding reader"
            );
            return Ok(Decision::ForwardingReader);
        }

        let reason = if facts.tracked {
            ViolationReason::ReaderWithoutForwarding
        } else {
            ViolationReason::UntrackedHost
        };
        let violation =
            StrictWriterViolation::new(request.method, request.host, request.sql, reason);
        tracing::warn!(
            host = %request.host,
            method = %request.method,
            reason = %reason,
            "Strict-writer violation"
        );
        Err(violation)
    }
}
