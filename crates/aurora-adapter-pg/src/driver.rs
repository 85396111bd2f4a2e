//! [`Driver`] implementation over a single `sqlx` Postgres connection.
//!
//! The engine is synchronous, so each driver owns a small tokio runtime and
//! blocks on it for every call. Do not call into a `PgDriver` connection from
//! inside an async context.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aurora_core::{
    ColumnInfo, Driver, DriverConnection, DriverError, HostSpec, Properties, QueryResult,
};
use parking_lot::Mutex;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{Column, Connection, PgConnection, Row, TypeInfo};
use tokio::runtime::Runtime;

use crate::error::ProviderError;

pub const USER_PROPERTY: &str = "user";
pub const PASSWORD_PROPERTY: &str = "password";
pub const DATABASE_PROPERTY: &str = "database";

/// Opens one physical Postgres connection per [`Driver::open`] call.
///
/// The base URL supplies credentials and the database name; host and port
/// always come from the [`HostSpec`] being opened.
pub struct PgDriver {
    base: PgConnectOptions,
    runtime: Arc<Runtime>,
}

impl PgDriver {
    pub fn new(database_url: &str) -> Result<Self, ProviderError> {
        let base = PgConnectOptions::from_str(database_url).map_err(ProviderError::InvalidUrl)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("aurora-pg")
            .enable_all()
            .build()?;
        Ok(Self {
            base,
            runtime: Arc::new(runtime),
        })
    }

    /// Connect options for `host`, with property overrides applied.
    pub fn connect_options(&self, host: &HostSpec, properties: &Properties) -> PgConnectOptions {
        let mut options = self.base.clone().host(&host.host).port(host.port);
        if let Some(user) = non_empty(properties, USER_PROPERTY) {
            options = options.username(user);
        }
        if let Some(password) = non_empty(properties, PASSWORD_PROPERTY) {
            options = options.password(password);
        }
        if let Some(database) = non_empty(properties, DATABASE_PROPERTY) {
            options = options.database(database);
        }
        options
    }
}

impl std::fmt::Debug for PgDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDriver")
            .field("database", &self.base.get_database())
            .finish_non_exhaustive()
    }
}

impl Driver for PgDriver {
    fn open(
        &self,
        protocol: &str,
        host: &HostSpec,
        properties: &Properties,
    ) -> Result<Box<dyn DriverConnection>, DriverError> {
        let options = self.connect_options(host, properties);
        let url = display_url(&options);
        tracing::debug!(protocol = %protocol, url = %url, "Opening Postgres connection");

        let conn = self
            .runtime
            .block_on(PgConnection::connect_with(&options))
            .map_err(|e| DriverError::ConnectFailed {
                host: host.identity().to_string(),
                message: e.to_string(),
            })?;

        Ok(Box::new(PgDriverConnection {
            conn: Mutex::new(Some(conn)),
            runtime: Arc::clone(&self.runtime),
            url,
            auto_commit: AtomicBool::new(true),
        }))
    }
}

/// One open Postgres connection.
///
/// Auto-commit off is emulated with an explicit `BEGIN` that is renewed
/// after every commit and rollback.
pub struct PgDriverConnection {
    conn: Mutex<Option<PgConnection>>,
    runtime: Arc<Runtime>,
    url: String,
    auto_commit: AtomicBool,
}

impl PgDriverConnection {
    fn fetch(&self, sql: &str) -> Result<Vec<PgRow>, DriverError> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(DriverError::Closed)?;
        self.runtime
            .block_on(sqlx::query(sql).fetch_all(&mut *conn))
            .map_err(query_error)
    }

    fn run(&self, sql: &str) -> Result<u64, DriverError> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(DriverError::Closed)?;
        self.runtime
            .block_on(sqlx::query(sql).execute(&mut *conn))
            .map(|done| done.rows_affected())
            .map_err(query_error)
    }

    fn end_transaction(&self, statement: &str) -> Result<(), DriverError> {
        if self.auto_commit.load(Ordering::SeqCst) {
            tracing::debug!(url = %self.url, "{} ignored in auto-commit mode", statement);
            return Ok(());
        }
        self.run(statement)?;
        self.run("BEGIN")?;
        Ok(())
    }
}

impl DriverConnection for PgDriverConnection {
    fn execute(&self, sql: &str) -> Result<bool, DriverError> {
        if returns_rows(sql) {
            self.fetch(sql)?;
            Ok(true)
        } else {
            self.run(sql)?;
            Ok(false)
        }
    }

    fn execute_query(&self, sql: &str) -> Result<QueryResult, DriverError> {
        let rows = self.fetch(sql)?;
        Ok(to_query_result(&rows))
    }

    fn execute_update(&self, sql: &str) -> Result<i32, DriverError> {
        let affected = self.run(sql)?;
        Ok(i32::try_from(affected).unwrap_or(i32::MAX))
    }

    fn execute_large_update(&self, sql: &str) -> Result<i64, DriverError> {
        let affected = self.run(sql)?;
        Ok(i64::try_from(affected).unwrap_or(i64::MAX))
    }

    fn commit(&self) -> Result<(), DriverError> {
        self.end_transaction("COMMIT")
    }

    fn rollback(&self) -> Result<(), DriverError> {
        self.end_transaction("ROLLBACK")
    }

    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), DriverError> {
        let previous = self.auto_commit.load(Ordering::SeqCst);
        if previous == auto_commit {
            return Ok(());
        }
        // Leaving manual mode commits the open transaction.
        self.run(if auto_commit { "COMMIT" } else { "BEGIN" })?;
        self.auto_commit.store(auto_commit, Ordering::SeqCst);
        Ok(())
    }

    fn is_valid(&self) -> bool {
        let mut guard = self.conn.lock();
        match guard.as_mut() {
            Some(conn) => self.runtime.block_on(conn.ping()).is_ok(),
            None => false,
        }
    }

    fn close(&self) -> Result<(), DriverError> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        self.runtime.block_on(conn.close()).map_err(query_error)
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}

/// Statements whose `execute` produces a result set.
pub fn returns_rows(sql: &str) -> bool {
    let sql_upper = sql.trim_start().to_uppercase();
    sql_upper.starts_with("SELECT")
        || sql_upper.starts_with("WITH")
        || sql_upper.starts_with("SHOW")
        || sql_upper.starts_with("EXPLAIN")
}

fn to_query_result(rows: &[PgRow]) -> QueryResult {
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let data: Vec<Vec<Option<String>>> = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| text_value(row, i)).collect())
        .collect();

    QueryResult {
        columns,
        row_count: data.len(),
        rows: data,
    }
}

/// How a column is decoded before being rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextDecoder {
    Text,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Bool,
    Timestamp,
    Timestamptz,
    Date,
    Time,
    Uuid,
    Json,
    /// Anything else is attempted as text.
    Other,
}

fn decoder_for(type_name: &str) -> TextDecoder {
    match type_name.to_uppercase().as_str() {
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "\"CHAR\"" | "NAME" | "CITEXT" => {
            TextDecoder::Text
        }
        "INT2" | "SMALLINT" => TextDecoder::Int2,
        "INT4" | "INT" | "INTEGER" => TextDecoder::Int4,
        "INT8" | "BIGINT" => TextDecoder::Int8,
        "FLOAT4" | "REAL" => TextDecoder::Float4,
        "FLOAT8" | "DOUBLE PRECISION" => TextDecoder::Float8,
        "NUMERIC" | "DECIMAL" => TextDecoder::Numeric,
        "BOOL" | "BOOLEAN" => TextDecoder::Bool,
        "TIMESTAMP" => TextDecoder::Timestamp,
        "TIMESTAMPTZ" => TextDecoder::Timestamptz,
        "DATE" => TextDecoder::Date,
        "TIME" => TextDecoder::Time,
        "UUID" => TextDecoder::Uuid,
        "JSON" | "JSONB" => TextDecoder::Json,
        _ => TextDecoder::Other,
    }
}

fn decode<T>(row: &PgRow, i: usize) -> Result<Option<String>, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + ToString,
{
    row.try_get::<Option<T>, _>(i)
        .map(|value| value.map(|v| v.to_string()))
}

// Values are rendered as text and NULL maps to None. A value that cannot be
// decoded is logged and also maps to None.
fn text_value(row: &PgRow, i: usize) -> Option<String> {
    let column = &row.columns()[i];
    let type_name = column.type_info().name();

    let decoded = match decoder_for(type_name) {
        TextDecoder::Text | TextDecoder::Other => decode::<String>(row, i),
        TextDecoder::Int2 => decode::<i16>(row, i),
        TextDecoder::Int4 => decode::<i32>(row, i),
        TextDecoder::Int8 => decode::<i64>(row, i),
        TextDecoder::Float4 => decode::<f32>(row, i),
        TextDecoder::Float8 => decode::<f64>(row, i),
        TextDecoder::Numeric => decode::<bigdecimal::BigDecimal>(row, i),
        TextDecoder::Bool => decode::<bool>(row, i),
        TextDecoder::Timestamp => decode::<chrono::NaiveDateTime>(row, i),
        TextDecoder::Timestamptz => decode::<chrono::DateTime<chrono::Utc>>(row, i),
        TextDecoder::Date => decode::<chrono::NaiveDate>(row, i),
        TextDecoder::Time => decode::<chrono::NaiveTime>(row, i),
        TextDecoder::Uuid => decode::<uuid::Uuid>(row, i),
        TextDecoder::Json => decode::<serde_json::Value>(row, i),
    };

    match decoded {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                column = %column.name(),
                pg_type = %type_name,
                error = %e,
                "Column value could not be rendered as text"
            );
            None
        }
    }
}

fn query_error(e: sqlx::Error) -> DriverError {
    DriverError::QueryFailed(e.to_string())
}

fn display_url(options: &PgConnectOptions) -> String {
    format!(
        "postgresql://{}:{}/{}",
        options.get_host(),
        options.get_port(),
        options.get_database().unwrap_or_default()
    )
}

fn non_empty<'a>(properties: &'a Properties, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
