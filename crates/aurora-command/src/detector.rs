//! Control-command detector.

use regex::{Regex, RegexBuilder};

use crate::error::CommandError;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "aws_advanced_jdbc";

/// A recognised control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// `SET SESSION <ns>.strict_writer = true|false`
    SetStrictWriter(bool),
}

impl ControlCommand {
    /// Value stored in the session attribute for this command.
    pub fn attribute_value(&self) -> &'static str {
        match self {
            Self::SetStrictWriter(true) => "true",
            Self::SetStrictWriter(false) => "false",
        }
    }
}

/// Matches statement text against the control-command grammar.
#[derive(Debug, Clone)]
pub struct ControlCommandDetector {
    namespace: String,
    pattern: Regex,
}

impl Default for ControlCommandDetector {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE).expect("default namespace is valid")
    }
}

impl ControlCommandDetector {
    /// Build a detector for `SET SESSION <namespace>.strict_writer = ...`.
    ///
    /// The namespace is matched literally.
    pub fn new(namespace: &str) -> Result<Self, CommandError> {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            return Err(CommandError::EmptyNamespace);
        }

        let pattern = format!(
            r#"^\s*SET\s+SESSION\s+{}\.strict_writer\s*=\s*['"]?(true|false)['"]?\s*$"#,
            regex::escape(namespace)
        );
        let pattern = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| CommandError::InvalidPattern {
                namespace: namespace.to_string(),
                source,
            })?;

        Ok(Self {
            namespace: namespace.to_string(),
            pattern,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Detect a control command. Anything that does not match the full
    /// grammar is `None` and must be forwarded unchanged.
    pub fn detect(&self, sql: &str) -> Option<ControlCommand> {
        let captures = self.pattern.captures(sql)?;
        let enabled = captures.get(1)?.as_str().eq_ignore_ascii_case("true");
        tracing::debug!(enabled = enabled, "Strict-writer command detected");
        Some(ControlCommand::SetStrictWriter(enabled))
    }
}
