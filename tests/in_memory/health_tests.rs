//! Health probes and the package listing surface.

use super::helpers::{GatewayHarness, harness, package_id};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;
use switchyard::tool_registry::domain::HealthState;
use tokio::time::Instant;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_check_all_reports_every_enabled_package(harness: GatewayHarness) {
    harness
        .transport
        .set_unreachable(&package_id("search"), "connection refused")
        .expect("writable");

    let report = harness
        .gateway
        .call("health_check_all", json!({"detailed": true}))
        .await
        .expect("health report");

    let packages = report["packages"].as_object().expect("package map");
    assert_eq!(
        packages.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["filesystem", "github", "labs", "search"]
    );
    assert_eq!(report["packages"]["filesystem"]["state"], json!("healthy"));
    assert_eq!(report["packages"]["github"]["state"], json!("needs_auth"));
    assert_eq!(report["packages"]["search"]["state"], json!("unreachable"));
    assert_eq!(
        report["packages"]["search"]["message"],
        json!("connection failed: connection refused")
    );
}

#[rstest]
#[tokio::test]
async fn cached_statuses_expire_with_the_clock(harness: GatewayHarness) {
    let monitor = harness.gateway.health();
    let id = package_id("filesystem");

    monitor.check("filesystem", false).await.expect("probe");
    harness.clock.advance(TimeDelta::seconds(29));
    monitor.check("filesystem", false).await.expect("cached");
    assert_eq!(harness.transport.list_tools_calls(&id).expect("readable"), 1);

    harness.clock.advance(TimeDelta::seconds(2));
    let status = monitor.check("filesystem", false).await.expect("reprobe");
    assert_eq!(harness.transport.list_tools_calls(&id).expect("readable"), 2);
    assert_eq!(status.state(), HealthState::Healthy);
    assert_eq!(monitor.cached(&id).expect("cache"), Some(status));
}

#[rstest]
#[tokio::test]
async fn package_listing_respects_filters(harness: GatewayHarness) {
    let default = harness
        .gateway
        .call("list_tool_packages", json!({}))
        .await
        .expect("listing");
    let ids = |listing: &serde_json::Value| {
        listing["packages"]
            .as_array()
            .map(|packages| {
                packages
                    .iter()
                    .filter_map(|package| package["id"].as_str().map(str::to_owned))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    };
    assert_eq!(ids(&default), vec!["filesystem", "search", "github", "labs"]);

    let safe = harness
        .gateway
        .call("list_tool_packages", json!({"safe_only": true, "limit": 2}))
        .await
        .expect("listing");
    assert_eq!(ids(&safe), vec!["filesystem", "search"]);

    let everything = harness
        .gateway
        .call("list_tool_packages", json!({"include_disabled": true}))
        .await
        .expect("listing");
    assert_eq!(ids(&everything).len(), 5);
}

#[rstest]
#[tokio::test]
async fn package_listing_can_include_health(harness: GatewayHarness) {
    let listing = harness
        .gateway
        .call("list_tool_packages", json!({"include_health": true, "limit": 1}))
        .await
        .expect("listing");

    assert_eq!(listing["packages"][0]["name"], json!("Filesystem"));
    assert_eq!(listing["packages"][0]["health"]["state"], json!("healthy"));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn listing_with_health_probes_packages_concurrently(harness: GatewayHarness) {
    for id in ["filesystem", "search"] {
        harness
            .transport
            .set_discovery_delay(&package_id(id), Duration::from_secs(60))
            .expect("delay stored");
    }
    let started = Instant::now();

    let listing = harness
        .gateway
        .call("list_tool_packages", json!({"include_health": true}))
        .await
        .expect("listing");

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5), "one probe timeout expected, took {elapsed:?}");
    assert!(elapsed < Duration::from_secs(6), "one probe timeout expected, took {elapsed:?}");
    let states = listing["packages"]
        .as_array()
        .map(|packages| {
            packages
                .iter()
                .map(|package| (package["id"].clone(), package["health"]["state"].clone()))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    assert_eq!(
        states,
        vec![
            (json!("filesystem"), json!("unreachable")),
            (json!("search"), json!("unreachable")),
            (json!("github"), json!("needs_auth")),
            (json!("labs"), json!("healthy")),
        ]
    );
}
