//! # aurora-command
//!
//! Detection of the in-band session command that toggles strict-writer mode.
//!
//! Applications flip the mode by sending an ordinary statement through their
//! connection:
//!
//! ```sql
//! SET SESSION aws_advanced_jdbc.strict_writer = 'true'
//! ```
//!
//! The statement is consumed by the interception layer and never reaches the
//! database.
//!
//! ## Grammar
//!
//! The whole statement must match, case-insensitively:
//!
//! ```text
//! ^\s*SET\s+SESSION\s+<namespace>\.strict_writer\s*=\s*['"]?(true|false)['"]?\s*$
//! ```
//!
//! | Input | Result |
//! |-------|--------|
//! | `set session aws_advanced_jdbc.strict_writer = TRUE` | enable |
//! | `SET SESSION aws_advanced_jdbc.strict_writer="false"` | disable |
//! | `SET SESSION aws_advanced_jdbc.strict_writer = 'yes'` | not a command |
//! | `SET aws_advanced_jdbc.strict_writer = true` | not a command |
//!
//! Multi-statement batches are never split: a batch is not a command.

pub mod detector;
pub mod error;

pub use detector::{ControlCommand, ControlCommandDetector, DEFAULT_NAMESPACE};
pub use error::CommandError;

/// Session attribute holding the strict-writer flag.
pub const STRICT_WRITER_ATTRIBUTE: &str = "strict-writer";
