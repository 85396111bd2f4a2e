//! # aurora-policy
//!
//! Strict-writer enforcement.
//!
//! When a connection has enabled strict-writer mode, every statement it
//! executes must land on a host that can accept writes: the cluster writer,
//! or a reader with write forwarding enabled. Anything else is refused before
//! the driver is called. Read-only SQL is not exempt.
//!
//! The policy is a pure decision over facts gathered by the caller (session
//! flag, host role, forwarding status); it performs no I/O.

pub mod error;
pub mod request;
pub mod strict_writer;

pub use error::{StrictWriterViolation, ViolationReason};
pub use request::{EnforcementRequest, HostFacts};
pub use strict_writer::{Decision, StrictWriterPolicy, is_strict_writer_enabled};
