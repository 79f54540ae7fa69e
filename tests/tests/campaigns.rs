//! Manual cost and status edits.

use axum::http::StatusCode;
use integration_tests::{
    fixtures::{FACT_DAY, GOOGLE_BRAND, GOOGLE_GENERIC, NEXT_DAY, REDDIT_IDLE},
    setup::TestContext,
};
use serde_json::{json, Value};

#[tokio::test]
async fn test_cost_rolls_up_into_groups() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .put(&format!("/api/campaigns/{}/cost", GOOGLE_BRAND))
        .json(&json!({"cost": 60.0, "cost_status": "confirmed", "author": "finance"}))
        .await;
    response.assert_status_ok();
    let entry: Value = response.json();
    assert_eq!(entry["cost"], 60.0);
    assert_eq!(entry["cost_status"], "confirmed");
    assert_eq!(entry["author"], "finance");
    assert_eq!(entry["active"], true);

    server
        .put(&format!("/api/campaigns/{}/cost", GOOGLE_GENERIC))
        .json(&json!({"cost": 30.0, "author": "finance"}))
        .await
        .assert_status_ok();

    let body: Value = server
        .get("/api/hierarchy")
        .add_query_param("mode", "network")
        .await
        .json();
    let google = body["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["name"] == "Google")
        .unwrap();
    assert_eq!(google["metrics"]["cost"], 90.0);
    assert_eq!(google["metrics"]["cost_metrics"]["cost_per_session"], 3.0);
    assert_eq!(body["totals"]["cost"], 90.0);
}

#[tokio::test]
async fn test_invalid_cost_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let negative = server
        .put(&format!("/api/campaigns/{}/cost", GOOGLE_BRAND))
        .json(&json!({"cost": -1.0, "author": "finance"}))
        .await;
    negative.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(negative.json::<Value>()["code"], "VALID_005");

    let missing = server
        .put("/api/campaigns/999/cost")
        .json(&json!({"cost": 5.0, "author": "finance"}))
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["code"], "NOT_FOUND_001");

    let anonymous = server
        .put(&format!("/api/campaigns/{}/cost", GOOGLE_BRAND))
        .json(&json!({"cost": 5.0}))
        .await;
    anonymous.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(anonymous.json::<Value>()["code"], "VALID_007");

    let reversed = server
        .put(&format!("/api/campaigns/{}/cost", GOOGLE_BRAND))
        .json(&json!({
            "cost": 5.0,
            "author": "finance",
            "start_date": NEXT_DAY,
            "end_date": FACT_DAY
        }))
        .await;
    reversed.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(reversed.json::<Value>()["code"], "VALID_001");
}

#[tokio::test]
async fn test_dated_cost_only_counts_inside_its_period() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .put(&format!("/api/campaigns/{}/cost", GOOGLE_BRAND))
        .json(&json!({
            "cost": 48.0,
            "author": "finance",
            "start_date": FACT_DAY,
            "end_date": NEXT_DAY
        }))
        .await
        .assert_status_ok();

    let on_fact_day: Value = server
        .get("/api/hierarchy")
        .add_query_param("start", FACT_DAY)
        .add_query_param("end", FACT_DAY)
        .await
        .json();
    assert_eq!(on_fact_day["totals"]["cost"], 24.0);

    let whole_period: Value = server
        .get("/api/hierarchy")
        .add_query_param("start", FACT_DAY)
        .add_query_param("end", NEXT_DAY)
        .await
        .json();
    assert_eq!(whole_period["totals"]["cost"], 48.0);

    let after: Value = server
        .get("/api/hierarchy")
        .add_query_param("start", "2024-03-03")
        .await
        .json();
    assert_eq!(after["totals"]["cost"], 0.0);
}

#[tokio::test]
async fn test_cost_history_keeps_every_edit() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let path = format!("/api/campaigns/{}/cost", GOOGLE_GENERIC);

    for (cost, author) in [(10.0, "alice"), (25.0, "bob")] {
        server
            .put(&path)
            .json(&json!({"cost": cost, "author": author, "reason": "invoice"}))
            .await
            .assert_status_ok();
    }

    let history: Value = server.get(&format!("{}/history", path)).await.json();
    assert_eq!(history["count"], 2);
    let entries = &history["items"];
    assert_eq!(entries[0]["cost"], 25.0);
    assert_eq!(entries[0]["active"], true);
    assert_eq!(entries[1]["cost"], 10.0);
    assert_eq!(entries[1]["active"], false);
    assert_eq!(entries[1]["deactivated_by"], "bob");
    assert_eq!(entries[1]["reason"], "invoice");

    let missing = server.get("/api/campaigns/999/cost/history").await;
    missing.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_update() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .put(&format!("/api/campaigns/{}/status", REDDIT_IDLE))
        .json(&json!({"status": "paused"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "paused");

    let bogus = server
        .put(&format!("/api/campaigns/{}/status", REDDIT_IDLE))
        .json(&json!({"status": "archived"}))
        .await;
    bogus.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(bogus.json::<Value>()["code"], "VALID_005");
}
