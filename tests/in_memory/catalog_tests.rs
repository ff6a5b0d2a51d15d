//! Catalog discovery, caching, coalescing and paging through the gateway.

use super::helpers::{GatewayHarness, harness, open_tool, package_id};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;
use switchyard::error::ErrorCode;
use switchyard::tool_registry::domain::{ListToolsOptions, SchemaHash, ToolDefinition};
use tokio::task::JoinSet;
use tokio::time::Instant;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_discover_once(harness: GatewayHarness) {
    harness
        .transport
        .set_discovery_delay(&package_id("filesystem"), Duration::from_millis(50))
        .expect("delay stored");

    let mut calls = JoinSet::new();
    for _ in 0..8 {
        let catalog = harness.gateway.catalog().clone();
        calls.spawn(async move { catalog.tools("filesystem").await });
    }
    let entries = calls.join_all().await;

    assert_eq!(
        harness
            .transport
            .list_tools_calls(&package_id("filesystem"))
            .expect("readable"),
        1
    );
    let first = entries
        .first()
        .and_then(|entry| entry.as_ref().ok())
        .expect("catalog entry")
        .clone();
    for entry in &entries {
        assert_eq!(entry.as_ref().expect("catalog entry"), &first);
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_a_failed_discovery(harness: GatewayHarness) {
    let id = package_id("filesystem");
    harness
        .transport
        .set_discovery_delay(&id, Duration::from_secs(120))
        .expect("delay stored");
    let started = Instant::now();

    let mut calls = JoinSet::new();
    for _ in 0..3 {
        let catalog = harness.gateway.catalog().clone();
        calls.spawn(async move { catalog.tools("filesystem").await });
    }
    let outcomes = calls.join_all().await;

    assert_eq!(harness.transport.list_tools_calls(&id).expect("readable"), 1);
    assert_eq!(outcomes.len(), 3);
    for outcome in &outcomes {
        let error = outcome.as_ref().expect_err("discovery timed out");
        assert_eq!(error.code(), ErrorCode::PackageUnavailable);
    }
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_secs(31), "one discovery timeout expected, took {elapsed:?}");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn later_callers_retry_after_a_failed_discovery(harness: GatewayHarness) {
    let id = package_id("filesystem");
    harness
        .transport
        .set_unreachable(&id, "connection refused")
        .expect("writable");
    harness
        .gateway
        .catalog()
        .tools("filesystem")
        .await
        .expect_err("unreachable");

    harness.transport.set_reachable(&id).expect("writable");
    assert!(harness.gateway.catalog().tools("filesystem").await.is_ok());
    assert_eq!(harness.transport.list_tools_calls(&id).expect("readable"), 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn peeks_do_not_wait_for_an_inflight_refresh(harness: GatewayHarness) {
    let id = package_id("filesystem");
    let warm = harness.gateway.catalog().tools("filesystem").await.expect("catalog");
    harness.clock.advance(TimeDelta::seconds(301));
    harness
        .transport
        .set_discovery_delay(&id, Duration::from_secs(20))
        .expect("delay stored");

    let catalog = harness.gateway.catalog().clone();
    let refresh = tokio::spawn(async move { catalog.tools("filesystem").await });
    tokio::task::yield_now().await;

    let peeked = harness.gateway.catalog().cached_entry(&id).expect("slot table");
    assert_eq!(peeked, Some(warm));
    assert!(harness.gateway.catalog().invalidate(&id).expect("slot table"));

    refresh.await.expect("refresh task").expect("refreshed");
    assert_eq!(harness.transport.list_tools_calls(&id).expect("readable"), 2);
}

#[rstest]
#[tokio::test]
async fn expired_entries_are_rediscovered(harness: GatewayHarness) {
    let id = package_id("filesystem");
    harness.gateway.catalog().tools("filesystem").await.expect("catalog");

    harness.clock.advance(TimeDelta::seconds(299));
    harness.gateway.catalog().tools("filesystem").await.expect("catalog");
    assert_eq!(harness.transport.list_tools_calls(&id).expect("readable"), 1);

    harness.clock.advance(TimeDelta::seconds(2));
    harness.gateway.catalog().tools("filesystem").await.expect("catalog");
    assert_eq!(harness.transport.list_tools_calls(&id).expect("readable"), 2);
}

#[rstest]
#[tokio::test]
async fn failed_refresh_leaves_no_stale_entry(harness: GatewayHarness) {
    let id = package_id("filesystem");
    harness.gateway.catalog().tools("filesystem").await.expect("catalog");
    harness.clock.advance(TimeDelta::seconds(301));
    harness
        .transport
        .set_unreachable(&id, "connection refused")
        .expect("writable");

    let error = harness
        .gateway
        .catalog()
        .tools("filesystem")
        .await
        .expect_err("unreachable");

    assert_eq!(error.code(), ErrorCode::PackageUnavailable);
    assert!(
        harness
            .gateway
            .catalog()
            .cached_entry(&id)
            .expect("slot table")
            .is_none()
    );

    harness.transport.set_reachable(&id).expect("writable");
    assert!(harness.gateway.catalog().tools("filesystem").await.is_ok());
}

#[rstest]
#[tokio::test]
async fn schema_hashes_track_schema_changes(harness: GatewayHarness) {
    let id = package_id("search");
    let before = harness
        .gateway
        .catalog()
        .find_tool("search", "query")
        .await
        .expect("tool");

    harness.clock.advance(TimeDelta::seconds(301));
    let unchanged = harness
        .gateway
        .catalog()
        .find_tool("search", "query")
        .await
        .expect("tool");
    assert_eq!(before.schema_hash(), unchanged.schema_hash());

    let widened = ToolDefinition::new(
        "query",
        "query tool",
        json!({"type": "object", "required": ["q"], "properties": {"q": {"type": "string"}}}),
    )
    .expect("valid tool");
    harness
        .transport
        .set_tool_catalog(&id, vec![widened])
        .expect("catalog stored");
    harness.gateway.catalog().invalidate(&id).expect("slot table");

    let changed = harness
        .gateway
        .catalog()
        .find_tool("search", "query")
        .await
        .expect("tool");
    assert_ne!(before.schema_hash(), changed.schema_hash());
    assert_eq!(
        changed.schema_hash(),
        &SchemaHash::compute(changed.input_schema())
    );
}

#[rstest]
#[tokio::test]
async fn list_tools_pages_through_the_catalog(harness: GatewayHarness) {
    let first = harness
        .gateway
        .call("list_tools", json!({"package_id": "filesystem", "page_size": 2}))
        .await
        .expect("first page");
    assert_eq!(first["total"], json!(3));
    assert_eq!(first["tools"].as_array().map(Vec::len), Some(2));
    let token = first["next_page_token"].as_str().expect("more pages").to_owned();

    let again = harness
        .gateway
        .call(
            "list_tools",
            json!({"package_id": "filesystem", "page_size": 2, "page_token": token.clone()}),
        )
        .await
        .expect("second page");
    let repeat = harness
        .gateway
        .call(
            "list_tools",
            json!({"package_id": "filesystem", "page_size": 2, "page_token": token}),
        )
        .await
        .expect("second page again");

    assert_eq!(again, repeat);
    assert_eq!(again["tools"][0]["name"], json!("list_dir"));
    assert!(again.get("next_page_token").is_none());
}

#[rstest]
#[tokio::test]
async fn tokens_from_an_older_revision_are_rejected(harness: GatewayHarness) {
    let id = package_id("filesystem");
    let page = harness
        .gateway
        .catalog()
        .get_package_tools(
            "filesystem",
            &ListToolsOptions {
                page_size: Some(1),
                ..ListToolsOptions::default()
            },
        )
        .await
        .expect("first page");

    harness
        .transport
        .set_tool_catalog(&id, vec![open_tool("only_tool")])
        .expect("catalog stored");
    harness.gateway.catalog().invalidate(&id).expect("slot table");

    let error = harness
        .gateway
        .catalog()
        .get_package_tools(
            "filesystem",
            &ListToolsOptions {
                page_token: page.next_page_token,
                ..ListToolsOptions::default()
            },
        )
        .await
        .expect_err("stale token");
    assert_eq!(error.code(), ErrorCode::InvalidParams);
}

#[rstest]
#[tokio::test]
async fn summarised_listings_use_schema_skeletons(harness: GatewayHarness) {
    let page = harness
        .gateway
        .call(
            "list_tools",
            json!({"package_id": "filesystem", "summarize": true}),
        )
        .await
        .expect("listing");

    let read_file = &page["tools"][0];
    assert_eq!(read_file["description"], json!("Read a file from disk."));
    assert_eq!(
        read_file["input_schema"],
        json!({
            "type": "object",
            "required": ["path"],
            "properties": {"path": {"type": "string"}}
        })
    );
    assert_eq!(read_file["schema_hash"].as_str().map(str::len), Some(64));
    assert!(read_file.get("output_schema").is_none());
}
