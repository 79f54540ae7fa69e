//! Override lifecycle tests through the HTTP surface.

use axum::http::StatusCode;
use integration_tests::{
    fixtures::{FACEBOOK_FEED, GOOGLE_BRAND, GOOGLE_GENERIC, UNMAPPED_DISPLAY},
    setup::TestContext,
};
use serde_json::{json, Value};

fn classification_path(id: i64) -> String {
    format!("/api/campaigns/{}/classification", id)
}

#[tokio::test]
async fn test_apply_then_revert_restores_base() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let path = classification_path(FACEBOOK_FEED);

    let before: Value = server.get(&path).await.json();
    assert_eq!(before["network"], "Facebook");
    assert_eq!(before["override_id"], Value::Null);

    let applied = server
        .put(&path)
        .json(&json!({"network": "Google", "reason": "corrected", "author": "alice"}))
        .await;
    applied.assert_status_ok();
    let applied: Value = applied.json();
    assert_eq!(applied["network"], "Google");
    // Unset fields inherit the base mapping
    assert_eq!(applied["domain"], "Social");
    assert_eq!(applied["overridden_fields"], json!(["network"]));

    let after: Value = server.get(&path).await.json();
    assert_eq!(after["network"], "Google");

    server
        .delete(&path)
        .add_query_param("author", "alice")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let reverted: Value = server.get(&path).await.json();
    assert_eq!(reverted["network"], "Facebook");

    let history: Value = server.get(&format!("{}/history", path)).await.json();
    assert_eq!(history["count"], 1);
    assert_eq!(history["items"][0]["active"], false);
    assert_eq!(history["items"][0]["author"], "alice");
    assert_eq!(history["items"][0]["reason"], "corrected");
}

#[tokio::test]
async fn test_revert_without_override_is_idempotent() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for _ in 0..2 {
        server
            .delete(&classification_path(GOOGLE_BRAND))
            .add_query_param("author", "bob")
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
    assert_eq!(ctx.store.override_count(GOOGLE_BRAND), 0);
}

#[tokio::test]
async fn test_repeated_applies_keep_one_active_and_full_history() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let path = classification_path(GOOGLE_GENERIC);

    for network in ["Bing", "Yahoo", "DuckDuckGo"] {
        server
            .put(&path)
            .json(&json!({"network": network, "author": "carol"}))
            .await
            .assert_status_ok();
    }

    assert_eq!(ctx.store.active_override_count(GOOGLE_GENERIC), 1);
    let history: Value = server.get(&format!("{}/history", path)).await.json();
    assert_eq!(history["count"], 3);
    // Most recent first
    assert_eq!(history["items"][0]["fields"]["network"], "DuckDuckGo");
    assert_eq!(history["items"][0]["active"], true);
    assert_eq!(history["items"][2]["active"], false);

    let limited: Value = server
        .get(&format!("{}/history", path))
        .add_query_param("limit", "1")
        .await
        .json();
    assert_eq!(limited["count"], 1);
}

#[tokio::test]
async fn test_override_regroups_hierarchy() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .put(&classification_path(GOOGLE_GENERIC))
        .json(&json!({"network": "Bing", "author": "alice"}))
        .await
        .assert_status_ok();

    let body: Value = server
        .get("/api/hierarchy")
        .add_query_param("mode", "network")
        .await
        .json();
    let nodes = body["nodes"].as_array().unwrap();
    let bing = nodes.iter().find(|n| n["name"] == "Bing").unwrap();
    let google = nodes.iter().find(|n| n["name"] == "Google").unwrap();
    assert_eq!(bing["metrics"]["raw"]["sessions"], 20);
    assert_eq!(google["metrics"]["raw"]["sessions"], 10);
}

#[tokio::test]
async fn test_noop_override_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .put(&classification_path(FACEBOOK_FEED))
        .json(&json!({"network": "Facebook", "author": "alice"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_002");

    let empty = server
        .put(&classification_path(FACEBOOK_FEED))
        .json(&json!({"author": "alice"}))
        .await;
    empty.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(empty.json::<Value>()["code"], "VALID_002");
    assert_eq!(ctx.store.override_count(FACEBOOK_FEED), 0);
}

#[tokio::test]
async fn test_unknown_campaign_and_missing_mapping() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let unknown = server
        .put(&classification_path(999))
        .json(&json!({"network": "Google", "author": "alice"}))
        .await;
    unknown.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(unknown.json::<Value>()["code"], "VALID_004");

    let unmapped = server.get(&classification_path(UNMAPPED_DISPLAY)).await;
    unmapped.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(unmapped.json::<Value>()["code"], "NOT_FOUND_002");
}

#[tokio::test]
async fn test_request_shape_validation() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .put(&classification_path(FACEBOOK_FEED))
        .json(&json!({"network": "x".repeat(256), "author": ""}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_005");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    let bad_id = server.get("/api/campaigns/abc/classification").await;
    bad_id.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.json::<Value>()["code"], "VALID_007");

    let too_many = server
        .get(&format!("{}/history", classification_path(FACEBOOK_FEED)))
        .add_query_param("limit", "5000")
        .await;
    too_many.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(too_many.json::<Value>()["code"], "VALID_005");
}

#[tokio::test]
async fn test_bulk_import() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/classification/import")
        .json(&json!({
            "reason": "quarterly cleanup",
            "author": "ops",
            "records": [
                {"campaign_id": GOOGLE_BRAND, "network": "Bing"},
                {"campaign_id": FACEBOOK_FEED, "network": "Facebook"},
                {"campaign_id": 999, "network": "Google"}
            ]
        }))
        .await;
    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["failed"][0]["campaign_id"], 999);
    assert_eq!(summary["failed"][0]["code"], "VALID_004");

    let effective: Value = server.get(&classification_path(GOOGLE_BRAND)).await.json();
    assert_eq!(effective["network"], "Bing");
}

#[tokio::test]
async fn test_bulk_import_by_campaign_name() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/classification/import")
        .json(&json!({
            "reason": "sheet upload",
            "author": "ops",
            "records": [
                {"campaign_name": "  facebook mobile FEED ", "network": "Meta", "placement": "none"},
                {"campaign_name": "Retired Campaign", "network": "Google"}
            ]
        }))
        .await;
    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["failed"][0]["campaign_name"], "Retired Campaign");
    assert_eq!(summary["failed"][0]["code"], "NOT_FOUND_001");

    let effective: Value = server.get(&classification_path(FACEBOOK_FEED)).await.json();
    assert_eq!(effective["network"], "Meta");
    assert_eq!(effective["placement"], "Unknown");
}

#[tokio::test]
async fn test_suggestion_from_rules() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get(&format!("{}/suggestion", classification_path(GOOGLE_BRAND)))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["network"], "Google");
    assert_eq!(body["domain"], "Search Network");
    assert_eq!(body["campaign_name"], "Google Search Brand");

    // Suggestions never write
    assert_eq!(ctx.store.override_count(GOOGLE_BRAND), 0);
}
