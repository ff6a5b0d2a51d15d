//! Single and batched invocation through the gateway.

use super::helpers::{GatewayHarness, harness, harness_with, package_id};
use rstest::rstest;
use serde_json::{Value, json};
use std::time::Duration;
use switchyard::config::GatewaySettings;
use switchyard::dispatch::{Invocation, InvocationResult};
use switchyard::error::ErrorCode;
use switchyard::tool_registry::adapters::memory::ScriptedResponse;
use tokio::time::Instant;

fn error_code(result: &InvocationResult) -> Option<i32> {
    result.error().map(|payload| payload.code)
}

#[rstest]
#[case(json!({"package_id": "nope", "tool_id": "x"}), ErrorCode::PackageNotFound)]
#[case(json!({"package_id": "filesystem", "tool_id": "nope"}), ErrorCode::ToolNotFound)]
#[case(json!({"package_id": "legacy", "tool_id": "x"}), ErrorCode::PackageDisabled)]
#[case(json!({"package_id": "github", "tool_id": "create_issue"}), ErrorCode::AuthRequired)]
#[case(json!({"package_id": "filesystem", "tool_id": "read_file", "args": {}}), ErrorCode::ArgValidationFailed)]
#[tokio::test]
async fn use_tool_failures_carry_stable_codes(
    harness: GatewayHarness,
    #[case] arguments: Value,
    #[case] expected: ErrorCode,
) {
    let error = harness
        .gateway
        .call("use_tool", arguments)
        .await
        .expect_err("failing call");

    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn unknown_package_and_tool_codes_match_the_wire_table(harness: GatewayHarness) {
    let missing_package = harness
        .gateway
        .call("use_tool", json!({"package_id": "nope", "tool_id": "x"}))
        .await
        .expect_err("unknown package");
    let missing_tool = harness
        .gateway
        .call("use_tool", json!({"package_id": "filesystem", "tool_id": "nope"}))
        .await
        .expect_err("unknown tool");

    assert_eq!(missing_package.to_payload().code, -32001);
    assert_eq!(missing_tool.to_payload().code, -32002);
}

#[rstest]
#[tokio::test]
async fn dry_runs_validate_without_forwarding(harness: GatewayHarness) {
    let report = harness
        .gateway
        .call(
            "use_tool",
            json!({
                "package_id": "filesystem",
                "tool_id": "read_file",
                "args": {"path": "/tmp/a"},
                "dry_run": true
            }),
        )
        .await
        .expect("valid dry run");

    assert_eq!(report["valid"], json!(true));
    assert_eq!(report["dry_run"], json!(true));
    assert!(harness.transport.invocations().expect("readable").is_empty());
}

#[rstest]
#[tokio::test]
async fn downstream_faults_keep_their_payload(harness: GatewayHarness) {
    harness
        .transport
        .set_response(
            &package_id("filesystem"),
            "read_file",
            ScriptedResponse::fault("ENOENT: no such file", Some(json!({"errno": -2}))),
        )
        .expect("scripted");

    let error = harness
        .gateway
        .call(
            "use_tool",
            json!({"package_id": "filesystem", "tool_id": "read_file", "args": {"path": "/nope"}}),
        )
        .await
        .expect_err("downstream fault");

    let payload = error.to_payload();
    assert_eq!(payload.code, -32007);
    assert_eq!(payload.data, Some(json!({"errno": -2})));
}

#[rstest]
#[tokio::test]
async fn results_are_forwarded_unmodified(harness: GatewayHarness) {
    let value = harness
        .gateway
        .call(
            "use_tool",
            json!({"package_id": "search", "tool_id": "query", "args": {"q": "rust"}}),
        )
        .await
        .expect("echo reply");

    assert_eq!(value, json!({"tool": "query", "arguments": {"q": "rust"}}));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn batch_results_keep_input_order(harness: GatewayHarness) {
    let filesystem = package_id("filesystem");
    harness
        .transport
        .set_response(
            &filesystem,
            "write_file",
            ScriptedResponse::ok(json!("A")).after(Duration::from_millis(300)),
        )
        .expect("scripted");
    harness
        .transport
        .set_response(
            &filesystem,
            "list_dir",
            ScriptedResponse::ok(json!("C")).after(Duration::from_millis(200)),
        )
        .expect("scripted");
    harness
        .transport
        .set_response(
            &package_id("search"),
            "query",
            ScriptedResponse::fault("index offline", None),
        )
        .expect("scripted");

    let results = harness
        .gateway
        .dispatcher()
        .invoke_many(
            vec![
                Invocation::new("filesystem", "write_file", json!({})),
                Invocation::new("search", "query", json!({})),
                Invocation::new("filesystem", "list_dir", json!({})),
            ],
            None,
        )
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(InvocationResult::index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(results.first().and_then(InvocationResult::value), Some(&json!("A")));
    assert_eq!(results.get(1).and_then(error_code), Some(-32007));
    assert_eq!(results.get(2).and_then(InvocationResult::value), Some(&json!("C")));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn one_failure_does_not_block_its_siblings(harness: GatewayHarness) {
    let results = harness
        .gateway
        .dispatcher()
        .invoke_many(
            vec![
                Invocation::new("nope", "x", json!({})),
                Invocation::new("filesystem", "read_file", json!({"path": "/tmp/a"})),
                Invocation::new("filesystem", "read_file", json!({})),
                Invocation::new("search", "query", Value::Null),
            ],
            Some(2),
        )
        .await;

    let outcomes = results
        .iter()
        .map(|result| (result.is_ok(), error_code(result)))
        .collect::<Vec<_>>();
    assert_eq!(
        outcomes,
        vec![
            (false, Some(-32001)),
            (true, None),
            (false, Some(-32003)),
            (true, None),
        ]
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unreachable_package_fails_every_batch_member_alike(harness: GatewayHarness) {
    let filesystem = package_id("filesystem");
    harness
        .transport
        .set_discovery_delay(&filesystem, Duration::from_secs(120))
        .expect("delay stored");
    let started = Instant::now();

    let results = harness
        .gateway
        .dispatcher()
        .invoke_many(
            vec![
                Invocation::new("filesystem", "read_file", json!({"path": "/a"})),
                Invocation::new("filesystem", "write_file", json!({})),
                Invocation::new("filesystem", "list_dir", json!({})),
            ],
            None,
        )
        .await;

    assert_eq!(
        results.iter().map(error_code).collect::<Vec<_>>(),
        vec![Some(-32004), Some(-32004), Some(-32004)]
    );
    assert_eq!(harness.transport.list_tools_calls(&filesystem).expect("readable"), 1);
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_secs(31), "one discovery timeout expected, took {elapsed:?}");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn concurrency_is_bounded() {
    let harness = harness_with(GatewaySettings::default());
    let filesystem = package_id("filesystem");
    for tool in ["write_file", "list_dir"] {
        harness
            .transport
            .set_response(
                &filesystem,
                tool,
                ScriptedResponse::ok(json!(tool)).after(Duration::from_secs(1)),
            )
            .expect("scripted");
    }
    harness.gateway.catalog().tools("filesystem").await.expect("warm catalog");
    let started = Instant::now();

    let results = harness
        .gateway
        .dispatcher()
        .invoke_many(
            vec![
                Invocation::new("filesystem", "write_file", json!({})),
                Invocation::new("filesystem", "list_dir", json!({})),
                Invocation::new("filesystem", "write_file", json!({})),
                Invocation::new("filesystem", "list_dir", json!({})),
            ],
            Some(2),
        )
        .await;

    assert!(results.iter().all(InvocationResult::is_ok));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "two waves expected, took {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "two waves expected, took {elapsed:?}");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn batch_deadline_turns_stragglers_into_timeouts() {
    let harness = harness_with(GatewaySettings {
        batch_timeout_ms: 1_000,
        ..GatewaySettings::default()
    });
    harness
        .transport
        .set_response(
            &package_id("filesystem"),
            "write_file",
            ScriptedResponse::ok(json!("late")).after(Duration::from_secs(30)),
        )
        .expect("scripted");

    let results = harness
        .gateway
        .dispatcher()
        .invoke_many(
            vec![
                Invocation::new("filesystem", "list_dir", json!({})),
                Invocation::new("filesystem", "write_file", json!({})),
            ],
            None,
        )
        .await;

    assert_eq!(results.len(), 2);
    assert!(results.first().is_some_and(InvocationResult::is_ok));
    assert_eq!(results.get(1).and_then(error_code), Some(-32009));
}

#[rstest]
#[tokio::test]
async fn multi_use_tool_wraps_results(harness: GatewayHarness) {
    let response = harness
        .gateway
        .call(
            "multi_use_tool",
            json!({
                "invocations": [
                    {"package_id": "search", "tool_id": "query", "args": {"q": "a"}},
                    {"package_id": "filesystem", "tool_id": "nope"}
                ],
                "max_concurrency": 2
            }),
        )
        .await
        .expect("batch");

    let results = response["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2);
    assert_eq!(results.first().map(|r| &r["ok"]), Some(&json!(true)));
    assert_eq!(results.get(1).map(|r| &r["error"]["code"]), Some(&json!(-32002)));
}

#[rstest]
#[tokio::test]
async fn oversized_concurrency_requests_are_capped(harness: GatewayHarness) {
    let response = harness
        .gateway
        .call(
            "multi_use_tool",
            json!({
                "invocations": [
                    {"package_id": "filesystem", "tool_id": "read_file", "args": {"path": "/tmp/a"}}
                ],
                "max_concurrency": u64::MAX
            }),
        )
        .await
        .expect("batch");

    let results = response["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results.first().map(|r| &r["ok"]), Some(&json!(true)));
}

#[rstest]
#[tokio::test]
async fn empty_batches_yield_no_results(harness: GatewayHarness) {
    let response = harness
        .gateway
        .call("multi_use_tool", json!({"invocations": []}))
        .await
        .expect("empty batch");
    assert_eq!(response, json!({"results": []}));
}
