//! Tests for health check endpoints.
//!
//! The health registry is process-global, so only one test here changes it.

use axum::http::StatusCode;
use integration_tests::setup::TestContext;
use serde_json::Value;
use telemetry::health;

#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();

    for field in ["status", "clickhouse_connected", "postgres_connected", "metrics"] {
        assert!(body.get(field).is_some(), "missing '{}'", field);
    }
    assert!(body["metrics"].get("rollups_built").is_some());

    let status = body["status"].as_str().unwrap_or("");
    assert!(
        ["healthy", "degraded", "unhealthy"].contains(&status),
        "unexpected status '{}'",
        status
    );
}

#[tokio::test]
async fn test_readiness_follows_both_stores() {
    let ctx = TestContext::new();
    let server = ctx.server();

    health().clickhouse.set_healthy();
    health().postgres.set_unhealthy("connection refused");
    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = server.get("/health").await.json();
    assert_eq!(body["status"], "degraded");

    health().postgres.set_healthy();
    server.get("/health/ready").await.assert_status_ok();
}

#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server.get("/health/live").await.assert_status_ok();
}
