//! Datastore failures surface with their codes and leave no partial writes.

use axum::http::StatusCode;
use integration_tests::{fixtures::FACEBOOK_FEED, setup::TestContext};
use serde_json::{json, Value};

#[tokio::test]
async fn test_fact_store_outage_returns_503() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.facts.set_should_fail(true);

    for path in ["/api/hierarchy", "/api/kpi/top-performers", "/api/timeseries"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json::<Value>()["code"], "DB_001", "{}", path);
    }

    // Classification reads do not touch the fact store
    server
        .get(&format!("/api/campaigns/{}/classification", FACEBOOK_FEED))
        .await
        .assert_status_ok();

    ctx.facts.set_should_fail(false);
    server.get("/api/hierarchy").await.assert_status_ok();
}

#[tokio::test]
async fn test_concurrent_override_conflict_returns_409() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.classifications.set_contended(true);

    let path = format!("/api/campaigns/{}/classification", FACEBOOK_FEED);
    let response = server
        .put(&path)
        .json(&json!({"network": "Google", "author": "alice"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "CONFLICT_001");
    assert_eq!(ctx.store.override_count(FACEBOOK_FEED), 0);

    ctx.classifications.set_contended(false);
    server
        .put(&path)
        .json(&json!({"network": "Google", "author": "alice"}))
        .await
        .assert_status_ok();
    assert_eq!(ctx.store.active_override_count(FACEBOOK_FEED), 1);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/classification/import")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_007");
}
