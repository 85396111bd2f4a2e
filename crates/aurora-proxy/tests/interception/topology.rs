//! Topology changes, AZ handling and the shared capability flag.

use super::common::*;
use aurora_core::{HostRole, HostSpec, PluginConfig, Properties};
use aurora_proxy::StaticHostListProvider;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

// =============================================================================
// HOST DISCOVERY
// =============================================================================

#[test]
fn test_init_host_provider_seeds_topology() {
    let ctx = TestContext::new();
    let provider = StaticHostListProvider::new(vec![
        HostSpec::writer(WRITER, PORT),
        HostSpec::reader(READER, PORT),
    ]);

    let hosts = ctx.plugin.init_host_provider(&provider).unwrap();
    assert_eq!(hosts.len(), 2);

    let records = ctx.plugin.tracker().records();
    assert_eq!(records.len(), 2);
    assert_eq!(ctx.plugin.tracker().record(WRITER).unwrap().role, HostRole::Writer);
    assert_eq!(
        ctx.plugin
            .tracker()
            .record(READER)
            .unwrap()
            .availability_zone
            .as_deref(),
        Some("us-east-1b")
    );
}

#[test]
fn test_published_change_reaches_plugin() {
    let ctx = TestContext::new();
    ctx.publish_topology();
    let provider = StaticHostListProvider::default();

    provider.publish(vec![HostSpec::writer(READER, PORT)], &ctx.plugin);

    let records = ctx.plugin.tracker().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].host, READER);
    assert!(records[0].is_writer());
}

#[test]
fn test_topology_role_wins_over_open_role() {
    let ctx = TestContext::new();
    ctx.publish_topology();

    // Opened as a writer, but the topology says reader without forwarding.
    let conn = ctx.connect(&HostSpec::writer(READER, PORT));
    enable_strict_writer(&conn);
    assert!(conn.execute("SELECT 1").unwrap_err().is_policy_violation());
}

#[test]
fn test_forwarding_facts_survive_unchanged_role() {
    let ctx = TestContext::new();
    ctx.publish_topology();
    let conn = ctx.connect_forwarding_reader();
    assert!(
        ctx.plugin
            .tracker()
            .record(FORWARDING_READER)
            .unwrap()
            .write_forwarding_enabled
    );

    ctx.publish_topology();
    enable_strict_writer(&conn);
    assert_eq!(conn.execute_update("UPDATE t SET x = 1").unwrap(), 1);
    assert_eq!(ctx.cluster().forwarding_probes(FORWARDING_READER), 1);
}

// =============================================================================
// SHARED AURORA FLAG
// =============================================================================

#[test]
fn test_aurora_flag_is_last_probed_wins() {
    // Known sharp edge: the flag is engine-wide, so connecting to a plain
    // PostgreSQL 16 host flips it off for every other connection too.
    let ctx = TestContext::new();
    let plain = "plain-pg.internal";
    ctx.cluster().set_host(plain, HostBehaviour::plain_postgres(16));

    let aurora = ctx.connect_writer();
    assert!(ctx.plugin.is_aurora_v17_or_higher());
    assert!(aurora.capabilities().is_aurora_v17_plus());

    let _plain = ctx.connect(&HostSpec::writer(plain, PORT));
    assert!(!ctx.plugin.is_aurora_v17_or_higher());
    assert!(aurora.capabilities().is_aurora_v17_plus());

    let _again = ctx.connect_reader();
    assert!(ctx.plugin.is_aurora_v17_or_higher());
}

#[test]
fn test_missing_version_row_clears_aurora_flag() {
    let ctx = TestContext::new();
    let _aurora = ctx.connect_writer();
    assert!(ctx.plugin.is_aurora_v17_or_higher());

    ctx.cluster().update_host(READER, |host| host.version = None);
    let _unknown = ctx.connect_reader();
    assert!(!ctx.plugin.is_aurora_v17_or_higher());
}

#[test]
fn test_postgres_17_without_marker_is_not_aurora() {
    let ctx = TestContext::new();
    ctx.cluster().set_host(WRITER, HostBehaviour::plain_postgres(17));

    let conn = ctx.connect_writer();
    assert_eq!(conn.capabilities().major_version, 17);
    assert!(!ctx.plugin.is_aurora_v17_or_higher());
}

// =============================================================================
// AVAILABILITY ZONES
// =============================================================================

#[test]
fn test_connect_records_heuristic_az() {
    let ctx = TestContext::new();
    ctx.connect_reader();
    assert_eq!(
        ctx.plugin
            .tracker()
            .record(READER)
            .unwrap()
            .availability_zone
            .as_deref(),
        Some("us-east-1b")
    );
}

#[test]
fn test_configured_map_beats_heuristic() {
    let config = PluginConfig {
        host_az_map: Some(format!("{READER}:custom-zone")),
        ..PluginConfig::default()
    };
    let ctx = TestContext::with_config(config);
    ctx.connect_reader();
    assert_eq!(
        ctx.plugin
            .tracker()
            .record(READER)
            .unwrap()
            .availability_zone
            .as_deref(),
        Some("custom-zone")
    );
}

#[test]
fn test_connect_properties_override_az_settings() {
    let config = PluginConfig {
        preferred_az: Some("us-east-1a".to_string()),
        ..PluginConfig::default()
    };
    let ctx = TestContext::with_config(config);
    ctx.connect_reader();

    let props = Properties::from([
        ("preferredAz".to_string(), "us-east-1c".to_string()),
        ("hostAzMap".to_string(), format!("{READER}:mapped-zone")),
    ]);
    ctx.connect_with(&HostSpec::writer(WRITER, PORT), &props);

    let advisor = ctx.plugin.tracker().az_advisor();
    assert_eq!(advisor.preferred_az().as_deref(), Some("us-east-1c"));
    assert_eq!(
        ctx.plugin
            .tracker()
            .record(READER)
            .unwrap()
            .availability_zone
            .as_deref(),
        Some("mapped-zone")
    );
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[test]
fn test_concurrent_connections_and_topology_changes() {
    let ctx = Arc::new(TestContext::new());
    ctx.publish_topology();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                let conn = if i % 2 == 0 {
                    ctx.connect_writer()
                } else {
                    ctx.connect_forwarding_reader()
                };
                enable_strict_writer(&conn);
                for _ in 0..50 {
                    conn.execute_update("UPDATE t SET x = x + 1").unwrap();
                }
                conn.close().unwrap();
            })
        })
        .collect();

    let publisher = {
        let ctx = Arc::clone(&ctx);
        thread::spawn(move || {
            for _ in 0..50 {
                ctx.publish_topology();
            }
        })
    };

    for worker in workers {
        worker.join().unwrap();
    }
    publisher.join().unwrap();

    assert!(ctx.plugin.sessions().is_empty());
    assert_eq!(ctx.cluster().count("executeUpdate"), 200);
}
