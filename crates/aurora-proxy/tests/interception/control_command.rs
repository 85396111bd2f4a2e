//! Control-command consumption.
//!
//! A matching `SET SESSION <ns>.strict_writer` statement must update the
//! session attribute and return a synthetic result without reaching the
//! driver.

use super::common::*;
use aurora_core::{HostSpec, PluginConfig};
use pretty_assertions::assert_eq;

// =============================================================================
// CONSUMPTION
// =============================================================================

#[test]
fn test_execute_consumes_command() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    ctx.cluster().reset_calls();

    assert!(!conn.execute(STRICT_ON).unwrap());
    assert_eq!(ctx.strict_writer(&conn).as_deref(), Some("true"));
    assert!(ctx.cluster().calls().is_empty());
}

#[test]
fn test_execute_update_returns_zero() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    ctx.cluster().reset_calls();

    assert_eq!(conn.execute_update(STRICT_OFF).unwrap(), 0);
    assert_eq!(ctx.strict_writer(&conn).as_deref(), Some("false"));
    assert_eq!(ctx.cluster().count("executeUpdate"), 0);
}

#[test]
fn test_execute_large_update_with_odd_spacing_and_case() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    ctx.cluster().reset_calls();

    let sql = "sEt  SeSsIoN  aws_advanced_jdbc.strict_writer = 'TRUE'  ";
    let result: i64 = conn.execute_large_update(sql).unwrap();

    assert_eq!(result, 0);
    assert_eq!(ctx.strict_writer(&conn).as_deref(), Some("true"));
    assert_eq!(ctx.cluster().count_sql(sql), 0);
    assert!(ctx.cluster().calls().is_empty());
}

#[test]
fn test_toggle_is_idempotent_and_never_reaches_driver() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    ctx.cluster().reset_calls();

    conn.execute(STRICT_ON).unwrap();
    conn.execute(STRICT_ON).unwrap();
    conn.execute_update(STRICT_OFF).unwrap();
    assert_eq!(ctx.strict_writer(&conn).as_deref(), Some("false"));

    conn.execute(STRICT_OFF).unwrap();
    conn.execute(STRICT_ON).unwrap();
    assert_eq!(ctx.strict_writer(&conn).as_deref(), Some("true"));

    assert!(ctx.cluster().calls().is_empty());
}

#[test]
fn test_command_via_statement() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    let stmt = conn.create_statement();
    ctx.cluster().reset_calls();

    assert!(!stmt.execute(STRICT_ON).unwrap());
    assert_eq!(ctx.strict_writer(&conn).as_deref(), Some("true"));
    assert!(ctx.cluster().calls().is_empty());
}

#[test]
fn test_session_is_per_connection() {
    let ctx = TestContext::new();
    let a = ctx.connect_writer();
    let b = ctx.connect_writer();

    a.execute(STRICT_ON).unwrap();
    assert_eq!(ctx.strict_writer(&a).as_deref(), Some("true"));
    assert_eq!(ctx.strict_writer(&b), None);
}

// =============================================================================
// NOT CONSUMED
// =============================================================================

#[test]
fn test_execute_query_forwards_command() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    ctx.cluster().reset_calls();

    conn.execute_query(STRICT_ON).unwrap();
    assert_eq!(ctx.strict_writer(&conn), None);
    assert_eq!(ctx.cluster().count_sql(STRICT_ON), 1);
}

#[test]
fn test_near_miss_is_forwarded() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    ctx.cluster().reset_calls();

    let sql = "SET SESSION aws_advanced_jdbc.strict_writer = 'yes'";
    conn.execute(sql).unwrap();
    assert_eq!(ctx.strict_writer(&conn), None);
    assert_eq!(ctx.cluster().count_sql(sql), 1);
}

#[test]
fn test_orphaned_statement_forwards_command() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    let stmt = conn.create_statement();
    drop(conn);
    ctx.cluster().reset_calls();

    assert_eq!(stmt.connection_id(), None);
    stmt.execute(STRICT_ON).unwrap();
    assert_eq!(ctx.cluster().count_sql(STRICT_ON), 1);
}

#[test]
fn test_custom_namespace() {
    let config = PluginConfig {
        command_namespace: "my_app".to_string(),
        ..PluginConfig::default()
    };
    let ctx = TestContext::with_config(config);
    let conn = ctx.connect(&HostSpec::writer(WRITER, PORT));
    ctx.cluster().reset_calls();

    conn.execute("SET SESSION my_app.strict_writer = true").unwrap();
    assert_eq!(ctx.strict_writer(&conn).as_deref(), Some("true"));

    conn.execute(STRICT_OFF).unwrap();
    assert_eq!(ctx.strict_writer(&conn).as_deref(), Some("true"));
    assert_eq!(ctx.cluster().count_sql(STRICT_OFF), 1);
}
