//! Contract for the wrapped wire-protocol driver.
//!
//! The engine never speaks a wire protocol itself. It opens connections
//! through a [`Driver`] and delegates every intercepted call to the returned
//! [`DriverConnection`]. Calls are synchronous and run on the caller's thread.

use crate::error::DriverError;
use crate::{HostSpec, Properties};

/// Connection factory.
pub trait Driver: Send + Sync {
    /// Open one physical connection to `host`.
    fn open(
        &self,
        protocol: &str,
        host: &HostSpec,
        properties: &Properties,
    ) -> Result<Box<dyn DriverConnection>, DriverError>;
}

/// One physical connection.
///
/// Methods take `&self`; implementations provide their own interior
/// synchronisation so a connection can be shared between a wrapper and the
/// statements created from it.
pub trait DriverConnection: Send + Sync {
    /// Execute a statement; `true` when it produced a result set.
    fn execute(&self, sql: &str) -> Result<bool, DriverError>;

    /// Execute a query and return its rows.
    fn execute_query(&self, sql: &str) -> Result<QueryResult, DriverError>;

    /// Execute a statement and return the 32-bit update count.
    fn execute_update(&self, sql: &str) -> Result<i32, DriverError>;

    /// Execute a statement and return the 64-bit update count.
    fn execute_large_update(&self, sql: &str) -> Result<i64, DriverError>;

    fn commit(&self) -> Result<(), DriverError>;

    fn rollback(&self) -> Result<(), DriverError>;

    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), DriverError>;

    /// Cheap liveness check.
    fn is_valid(&self) -> bool;

    fn close(&self) -> Result<(), DriverError>;

    /// Connection URL, used in log lines only.
    fn url(&self) -> String;
}

/// Result of a query execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column information.
    pub columns: Vec<ColumnInfo>,
    /// Row data as strings.
    pub rows: Vec<Vec<Option<String>>>,
    /// Number of rows returned.
    pub row_count: usize,
}

impl QueryResult {
    /// Build a single-column result from text values.
    pub fn single_column(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        let row_count = values.len();
        Self {
            columns: vec![ColumnInfo { name: name.into() }],
            rows: values.into_iter().map(|v| vec![v]).collect(),
            row_count,
        }
    }

    /// First column of the first row, if any.
    pub fn first_value(&self) -> Option<&str> {
        self.rows.first()?.first()?.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
}
