//! Interception pipeline.
//!
//! Every call on an intercepted connection or statement enters through
//! [`InterceptionPipeline::intercept`], which runs the stages in a fixed
//! order:
//!
//! 1. Resolve the owning connection of the call target.
//! 2. Unsubscribed methods go straight to the driver.
//! 3. Control command: a matching `SET SESSION` statement is consumed and
//!    answered with a synthetic result; the driver is never called.
//! 4. Strict-writer policy for statement execution.
//! 5. Delegate to the driver. For `close`, session state is cleared after
//!    delegation whether or not it succeeded.

use aurora_command::{ControlCommandDetector, STRICT_WRITER_ATTRIBUTE};
use aurora_core::{ConnectionId, DriverConnection, DriverError, HostSpec, QueryResult};
use aurora_policy::{EnforcementRequest, HostFacts, StrictWriterPolicy, is_strict_writer_enabled};
use aurora_topology::{ConnectionCapabilities, TopologyTracker};
use std::fmt;
use std::sync::Arc;

use crate::error::{InterceptError, InterceptResult};
use crate::session::SessionAttributeStore;

/// Driver methods the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Execute,
    ExecuteQuery,
    ExecuteUpdate,
    ExecuteLargeUpdate,
    Commit,
    Rollback,
    SetAutoCommit,
    Close,
    IsValid,
}

impl Method {
    /// Driver-facing method name.
    pub fn name(&self) -> &'static str {
        match self {
            Method::Execute => "execute",
            Method::ExecuteQuery => "executeQuery",
            Method::ExecuteUpdate => "executeUpdate",
            Method::ExecuteLargeUpdate => "executeLargeUpdate",
            Method::Commit => "commit",
            Method::Rollback => "rollback",
            Method::SetAutoCommit => "setAutoCommit",
            Method::Close => "close",
            Method::IsValid => "isValid",
        }
    }

    /// Whether calls of this method run through the pipeline stages.
    pub fn is_subscribed(&self) -> bool {
        !matches!(self, Method::IsValid)
    }

    /// Statement execution, subject to the strict-writer policy.
    pub fn is_statement_execution(&self) -> bool {
        matches!(
            self,
            Method::Execute | Method::ExecuteQuery | Method::ExecuteUpdate | Method::ExecuteLargeUpdate
        )
    }

    /// Methods whose SQL argument may carry a control command.
    pub fn accepts_control_command(&self) -> bool {
        matches!(
            self,
            Method::Execute | Method::ExecuteUpdate | Method::ExecuteLargeUpdate
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Return types of intercepted calls.
///
/// A consumed control command answers with [`CallOutput::control_ack`]; types
/// without an acknowledgement value let the command through to the driver.
pub trait CallOutput: Sized {
    fn control_ack() -> Option<Self> {
        None
    }
}

impl CallOutput for bool {
    fn control_ack() -> Option<Self> {
        Some(false)
    }
}

impl CallOutput for i32 {
    fn control_ack() -> Option<Self> {
        Some(0)
    }
}

impl CallOutput for i64 {
    fn control_ack() -> Option<Self> {
        Some(0)
    }
}

impl CallOutput for () {}

impl CallOutput for QueryResult {}

/// State shared by a connection wrapper and the statements created from it.
pub struct ConnectionState {
    pub id: ConnectionId,
    pub host: HostSpec,
    pub capabilities: ConnectionCapabilities,
    pub driver: Arc<dyn DriverConnection>,
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionState")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Anything a driver call can be made on.
///
/// Connections resolve to themselves; statements resolve to the connection
/// that created them, or to nothing once it is gone.
pub trait CallTarget {
    fn owning_connection(&self) -> Option<Arc<ConnectionState>>;
}

/// Runs the interception stages for every call.
#[derive(Debug)]
pub struct InterceptionPipeline {
    tracker: Arc<TopologyTracker>,
    sessions: Arc<SessionAttributeStore>,
    commands: ControlCommandDetector,
    policy: StrictWriterPolicy,
}

impl InterceptionPipeline {
    pub fn new(
        tracker: Arc<TopologyTracker>,
        sessions: Arc<SessionAttributeStore>,
        commands: ControlCommandDetector,
    ) -> Self {
        Self {
            tracker,
            sessions,
            commands,
            policy: StrictWriterPolicy::new(),
        }
    }

    pub fn tracker(&self) -> &Arc<TopologyTracker> {
        &self.tracker
    }

    pub fn sessions(&self) -> &Arc<SessionAttributeStore> {
        &self.sessions
    }

    /// Run `method` on `target` through the pipeline.
    ///
    /// `delegate` performs the real driver call and is invoked at most once.
    pub fn intercept<T, F>(
        &self,
        target: &dyn CallTarget,
        method: Method,
        sql: Option<&str>,
        delegate: F,
    ) -> InterceptResult<T>
    where
        T: CallOutput,
        F: FnOnce() -> Result<T, DriverError>,
    {
        let connection = target.owning_connection();
        if connection.is_none() {
            tracing::debug!(method = %method, "Call target has no owning connection");
        }

        if !method.is_subscribed() {
            return delegate().map_err(InterceptError::from);
        }

        if let Some(ack) = self.consume_control_command(connection.as_ref(), method, sql) {
            return Ok(ack);
        }

        if method.is_statement_execution()
            && let Some(conn) = connection.as_deref()
        {
            self.enforce_strict_writer(conn, method, sql)?;
        }

        if method == Method::Close {
            let result = delegate();
            if let Some(conn) = connection.as_deref() {
                self.sessions.clear(conn.id);
            }
            return result.map_err(InterceptError::from);
        }

        delegate().map_err(InterceptError::from)
    }

    fn consume_control_command<T: CallOutput>(
        &self,
        connection: Option<&Arc<ConnectionState>>,
        method: Method,
        sql: Option<&str>,
    ) -> Option<T> {
        if !method.accepts_control_command() {
            return None;
        }
        let command = self.commands.detect(sql?)?;

        let Some(conn) = connection else {
            tracing::debug!(
                method = %method,
                "Control command without owning connection, forwarding to driver"
            );
            return None;
        };
        let Some(ack) = T::control_ack() else {
            tracing::warn!(method = %method, "No synthetic result for control command, forwarding to driver");
            return None;
        };

        self.sessions
            .set_owned(conn.id, conn, STRICT_WRITER_ATTRIBUTE, command.attribute_value());
        tracing::info!(
            connection_id = %conn.id,
            host = %conn.host.identity(),
            strict_writer = command.attribute_value(),
            "Strict-writer mode set"
        );
        Some(ack)
    }

    fn enforce_strict_writer(
        &self,
        conn: &ConnectionState,
        method: Method,
        sql: Option<&str>,
    ) -> InterceptResult<()> {
        let attribute = self.sessions.get(conn.id, STRICT_WRITER_ATTRIBUTE);
        if !is_strict_writer_enabled(attribute.as_deref()) {
            return Ok(());
        }

        let host = conn.host.identity();
        let facts = match self.tracker.record(host) {
            Some(record) if record.is_writer() => HostFacts::writer(),
            Some(_) => match self.tracker.refresh_write_forwarding(conn.driver.as_ref(), host) {
                Some(record) if record.is_writer() => HostFacts::writer(),
                Some(record) => HostFacts::reader(record.write_forwarding_enabled),
                None => HostFacts::untracked(conn.host.role),
            },
            None => HostFacts::untracked(conn.host.role),
        };

        let request = EnforcementRequest {
            method: method.name(),
            host,
            sql,
            strict_writer: true,
            facts,
        };
        self.policy.check(&request)?;
        Ok(())
    }
}
