//! Authentication gating of OAuth packages.

use super::helpers::{GatewayHarness, harness, package_id};
use rstest::rstest;
use serde_json::json;
use switchyard::error::ErrorCode;

#[rstest]
#[tokio::test]
async fn completing_authentication_unlocks_the_package(harness: GatewayHarness) {
    let call = json!({"package_id": "github", "tool_id": "create_issue", "args": {}});
    let before = harness
        .gateway
        .call("use_tool", call.clone())
        .await
        .expect_err("gated");
    assert_eq!(before.code(), ErrorCode::AuthRequired);

    let flow = harness
        .gateway
        .call(
            "authenticate",
            json!({"package_id": "github", "wait_for_completion": true}),
        )
        .await
        .expect("flow");
    assert_eq!(flow["status"], json!("completed"));

    let after = harness.gateway.call("use_tool", call).await.expect("unlocked");
    assert_eq!(after["tool"], json!("create_issue"));
}

#[rstest]
#[tokio::test]
async fn downstream_auth_challenges_are_auth_required(harness: GatewayHarness) {
    harness
        .transport
        .set_auth_challenge(&package_id("search"), "token expired")
        .expect("writable");

    let error = harness
        .gateway
        .call("list_tools", json!({"package_id": "search"}))
        .await
        .expect_err("challenged");

    assert_eq!(error.code(), ErrorCode::AuthRequired);
}

#[rstest]
#[tokio::test]
async fn rejected_flows_surface_as_auth_required(harness: GatewayHarness) {
    harness.auth.reject(&package_id("github"), "consent denied");

    let error = harness
        .gateway
        .call("authenticate", json!({"package_id": "github"}))
        .await
        .expect_err("rejected");

    assert_eq!(error.code(), ErrorCode::AuthRequired);
    assert!(error.to_string().contains("consent denied"));
}
