//! Strict-writer policy enforcement.
//!
//! Tests the policy stage against:
//! - Writers and forwarding readers (allowed)
//! - Readers without forwarding and untracked hosts (refused)
//! - Write-forwarding probe caching
//! - Methods outside statement execution

use super::common::*;
use aurora_core::{HostSpec, PluginConfig, QueryResult};
use aurora_policy::ViolationReason;
use aurora_proxy::{InterceptError, TopologyListener};
use pretty_assertions::assert_eq;
use std::thread;
use std::time::Duration;

fn violation(err: InterceptError) -> aurora_policy::StrictWriterViolation {
    match err {
        InterceptError::PolicyViolation(v) => v,
        other => panic!("expected policy violation, got {other:?}"),
    }
}

// =============================================================================
// ALLOWED
// =============================================================================

#[test]
fn test_writer_query_is_forwarded_unchanged() {
    let ctx = TestContext::new();
    let conn = ctx.connect_writer();
    enable_strict_writer(&conn);

    let result = conn.execute_query("SELECT 1").unwrap();
    assert_eq!(
        result,
        QueryResult::single_column("result", vec![Some(format!("{WRITER}:SELECT 1"))])
    );
    assert_eq!(ctx.cluster().count_sql("SELECT 1"), 1);
}

#[test]
fn test_forwarding_reader_allowed() {
    let ctx = TestContext::new();
    let conn = ctx.connect_forwarding_reader();
    enable_strict_writer(&conn);

    assert_eq!(conn.execute_update("UPDATE t SET x = 1").unwrap(), 1);
    assert_eq!(conn.execute_large_update("DELETE FROM t").unwrap(), 1);
    assert!(conn.execute("SELECT 1").unwrap());
}

#[test]
fn test_reader_allowed_when_strict_writer_off() {
    let ctx = TestContext::new();
    let conn = ctx.connect_reader();

    assert_eq!(conn.execute_update("UPDATE t SET x = 1").unwrap(), 1);

    enable_strict_writer(&conn);
    conn.execute(STRICT_OFF).unwrap();
    assert_eq!(conn.execute_update("UPDATE t SET x = 2").unwrap(), 1);
}

// =============================================================================
// REFUSED
// =============================================================================

#[test]
fn test_reader_without_forwarding_refused() {
    let ctx = TestContext::new();
    let conn = ctx.connect_reader();
    enable_strict_writer(&conn);

    let err = conn.execute_query("SELECT 1").unwrap_err();
    assert!(err.is_policy_violation());
    let message = err.to_string();
    assert!(message.contains("executeQuery"), "{message}");
    assert!(message.contains(READER), "{message}");
    assert!(message.ends_with("SQL: SELECT 1"), "{message}");
    assert_eq!(ctx.cluster().count_sql("SELECT 1"), 0);

    assert_eq!(
        violation(err).reason,
        ViolationReason::ReaderWithoutForwarding
    );
}

#[test]
fn test_every_execution_method_is_checked() {
    let ctx = TestContext::new();
    let conn = ctx.connect_reader();
    enable_strict_writer(&conn);
    ctx.cluster().reset_calls();

    assert!(conn.execute("SELECT 1").unwrap_err().is_policy_violation());
    assert!(conn.execute_update("UPDATE t SET x = 1").unwrap_err().is_policy_violation());
    assert!(conn.execute_large_update("DELETE FROM t").unwrap_err().is_policy_violation());

    let stmt = conn.create_statement();
    assert!(stmt.execute_query("SELECT 2").unwrap_err().is_policy_violation());

    assert_eq!(ctx.cluster().count("execute"), 0);
    assert_eq!(ctx.cluster().count("executeQuery"), 0);
    assert_eq!(ctx.cluster().count("executeUpdate"), 0);
    assert_eq!(ctx.cluster().count("executeLargeUpdate"), 0);
}

#[test]
fn test_connection_usable_after_violation() {
    let ctx = TestContext::new();
    let conn = ctx.connect_reader();
    enable_strict_writer(&conn);

    assert!(conn.execute_update("UPDATE t SET x = 1").is_err());
    conn.execute(STRICT_OFF).unwrap();
    assert_eq!(conn.execute_update("UPDATE t SET x = 1").unwrap(), 1);
}

#[test]
fn test_transaction_methods_not_checked() {
    let ctx = TestContext::new();
    let conn = ctx.connect_reader();
    enable_strict_writer(&conn);

    conn.set_auto_commit(false).unwrap();
    conn.commit().unwrap();
    conn.rollback().unwrap();
    assert!(conn.is_valid().unwrap());
    assert_eq!(ctx.cluster().count("commit"), 1);
}

#[test]
fn test_untracked_host_uses_open_time_role() {
    let ctx = TestContext::new();
    let reader = ctx.connect_forwarding_reader();
    let writer = ctx.connect_writer();
    enable_strict_writer(&reader);
    enable_strict_writer(&writer);

    // Neither host is part of the published topology.
    ctx.plugin
        .on_topology_changed(&[HostSpec::writer("other-writer.example.com", PORT)]);

    let err = reader.execute_update("UPDATE t SET x = 1").unwrap_err();
    assert_eq!(violation(err).reason, ViolationReason::UntrackedHost);
    assert_eq!(writer.execute_update("UPDATE t SET x = 1").unwrap(), 1);
}

// =============================================================================
// WRITE-FORWARDING CACHE
// =============================================================================

#[test]
fn test_forwarding_probe_cached_within_interval() {
    let ctx = TestContext::new();
    let conn = ctx.connect_reader();
    assert_eq!(ctx.cluster().forwarding_probes(READER), 1);
    enable_strict_writer(&conn);

    let first = conn.execute_update("UPDATE t SET x = 1").unwrap_err();
    let second = conn.execute_update("UPDATE t SET x = 1").unwrap_err();
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(ctx.cluster().forwarding_probes(READER), 1);
}

#[test]
fn test_forwarding_reprobed_after_interval() {
    let config = PluginConfig {
        write_forwarding_check_interval_secs: 0,
        ..PluginConfig::default()
    };
    let ctx = TestContext::with_config(config);
    let conn = ctx.connect_reader();
    enable_strict_writer(&conn);

    thread::sleep(Duration::from_millis(5));
    assert!(conn.execute_update("UPDATE t SET x = 1").is_err());

    ctx.cluster()
        .update_host(READER, |host| host.write_forwarding = "ON".to_string());
    thread::sleep(Duration::from_millis(5));
    assert_eq!(conn.execute_update("UPDATE t SET x = 1").unwrap(), 1);
    assert_eq!(ctx.cluster().forwarding_probes(READER), 3);
}

#[test]
fn test_unrecognised_forwarding_value_reads_as_disabled() {
    let ctx = TestContext::new();
    ctx.cluster()
        .update_host(READER, |host| host.write_forwarding = "maybe".to_string());
    let conn = ctx.connect_reader();
    enable_strict_writer(&conn);

    assert!(conn.execute("SELECT 1").unwrap_err().is_policy_violation());
}

#[test]
fn test_forwarding_probe_failure_degrades_to_refusal() {
    let ctx = TestContext::new();
    ctx.cluster().update_host(FORWARDING_READER, |host| host.forwarding_fails = true);
    let conn = ctx.connect_forwarding_reader();
    enable_strict_writer(&conn);

    let err = conn.execute("SELECT 1").unwrap_err();
    assert_eq!(violation(err).reason, ViolationReason::ReaderWithoutForwarding);

    let record = ctx.plugin.tracker().record(FORWARDING_READER).unwrap();
    assert!(record.last_probed_at.is_some());
}

#[test]
fn test_promoted_reader_skips_forwarding_check() {
    let ctx = TestContext::new();
    let conn = ctx.connect_reader();
    enable_strict_writer(&conn);
    assert!(conn.execute("SELECT 1").is_err());

    ctx.plugin.on_topology_changed(&[
        HostSpec::reader(WRITER, PORT),
        HostSpec::writer(READER, PORT),
    ]);

    assert!(conn.execute("SELECT 1").unwrap());
    assert_eq!(ctx.cluster().forwarding_probes(READER), 1);

    let record = ctx.plugin.tracker().record(READER).unwrap();
    assert!(!record.write_forwarding_enabled);
    assert_eq!(record.last_probed_at, None);
}
