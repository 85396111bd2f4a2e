//! Intercepted connection and statement handles.

use aurora_core::{ConnectionId, DriverConnection, HostSpec, QueryResult};
use aurora_topology::ConnectionCapabilities;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::InterceptResult;
use crate::pipeline::{CallTarget, ConnectionState, InterceptionPipeline, Method};

/// A physical connection wrapped by the interception pipeline.
///
/// Dropping the handle releases its session attributes, as `close` does.
#[derive(Debug)]
pub struct InterceptedConnection {
    state: Arc<ConnectionState>,
    pipeline: Arc<InterceptionPipeline>,
}

impl InterceptedConnection {
    pub(crate) fn new(state: Arc<ConnectionState>, pipeline: Arc<InterceptionPipeline>) -> Self {
        Self { state, pipeline }
    }

    pub fn id(&self) -> ConnectionId {
        self.state.id
    }

    pub fn host(&self) -> &HostSpec {
        &self.state.host
    }

    pub fn capabilities(&self) -> &ConnectionCapabilities {
        &self.state.capabilities
    }

    fn driver(&self) -> &dyn DriverConnection {
        self.state.driver.as_ref()
    }

    pub fn execute(&self, sql: &str) -> InterceptResult<bool> {
        self.pipeline
            .intercept(self, Method::Execute, Some(sql), || self.driver().execute(sql))
    }

    pub fn execute_query(&self, sql: &str) -> InterceptResult<QueryResult> {
        self.pipeline.intercept(self, Method::ExecuteQuery, Some(sql), || {
            self.driver().execute_query(sql)
        })
    }

    pub fn execute_update(&self, sql: &str) -> InterceptResult<i32> {
        self.pipeline.intercept(self, Method::ExecuteUpdate, Some(sql), || {
            self.driver().execute_update(sql)
        })
    }

    pub fn execute_large_update(&self, sql: &str) -> InterceptResult<i64> {
        self.pipeline
            .intercept(self, Method::ExecuteLargeUpdate, Some(sql), || {
                self.driver().execute_large_update(sql)
            })
    }

    pub fn commit(&self) -> InterceptResult<()> {
        self.pipeline
            .intercept(self, Method::Commit, None, || self.driver().commit())
    }

    pub fn rollback(&self) -> InterceptResult<()> {
        self.pipeline
            .intercept(self, Method::Rollback, None, || self.driver().rollback())
    }

    pub fn set_auto_commit(&self, auto_commit: bool) -> InterceptResult<()> {
        self.pipeline.intercept(self, Method::SetAutoCommit, None, || {
            self.driver().set_auto_commit(auto_commit)
        })
    }

    /// Liveness check; bypasses the pipeline stages.
    pub fn is_valid(&self) -> InterceptResult<bool> {
        self.pipeline
            .intercept(self, Method::IsValid, None, || Ok(self.driver().is_valid()))
    }

    /// Close the physical connection. Session attributes are released even
    /// when the driver fails to close.
    pub fn close(&self) -> InterceptResult<()> {
        self.pipeline
            .intercept(self, Method::Close, None, || self.driver().close())
    }

    /// Create a statement bound to this connection.
    pub fn create_statement(&self) -> InterceptedStatement {
        InterceptedStatement {
            owner: Arc::downgrade(&self.state),
            driver: Arc::clone(&self.state.driver),
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl CallTarget for InterceptedConnection {
    fn owning_connection(&self) -> Option<Arc<ConnectionState>> {
        Some(Arc::clone(&self.state))
    }
}

impl Drop for InterceptedConnection {
    fn drop(&mut self) {
        let sessions = self.pipeline.sessions();
        sessions.clear(self.state.id);
        sessions.purge_orphaned();
    }
}

/// A statement created from an [`InterceptedConnection`].
///
/// Holds its connection weakly: once the connection handle is gone the
/// statement still reaches the driver but runs without connection context,
/// so control commands are forwarded and no policy applies.
pub struct InterceptedStatement {
    owner: Weak<ConnectionState>,
    driver: Arc<dyn DriverConnection>,
    pipeline: Arc<InterceptionPipeline>,
}

impl fmt::Debug for InterceptedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedStatement")
            .field("connection_id", &self.connection_id())
            .finish_non_exhaustive()
    }
}

impl InterceptedStatement {
    pub fn execute(&self, sql: &str) -> InterceptResult<bool> {
        self.pipeline
            .intercept(self, Method::Execute, Some(sql), || self.driver.execute(sql))
    }

    pub fn execute_query(&self, sql: &str) -> InterceptResult<QueryResult> {
        self.pipeline.intercept(self, Method::ExecuteQuery, Some(sql), || {
            self.driver.execute_query(sql)
        })
    }

    pub fn execute_update(&self, sql: &str) -> InterceptResult<i32> {
        self.pipeline.intercept(self, Method::ExecuteUpdate, Some(sql), || {
            self.driver.execute_update(sql)
        })
    }

    pub fn execute_large_update(&self, sql: &str) -> InterceptResult<i64> {
        self.pipeline
            .intercept(self, Method::ExecuteLargeUpdate, Some(sql), || {
                self.driver.execute_large_update(sql)
            })
    }

    /// The owning connection's id, if it still exists.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.owner.upgrade().map(|state| state.id)
    }
}

impl CallTarget for InterceptedStatement {
    fn owning_connection(&self) -> Option<Arc<ConnectionState>> {
        self.owner.upgrade()
    }
}
