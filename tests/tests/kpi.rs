//! Rankings, time series, and data-quality endpoint tests.

use axum::http::StatusCode;
use integration_tests::{
    fixtures::{FACEBOOK_FEED, FACT_DAY, GOOGLE_BRAND, GOOGLE_GENERIC, UNMAPPED_DISPLAY},
    setup::TestContext,
};
use serde_json::Value;

fn ids(body: &Value) -> Vec<i64> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["campaign_id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_top_performers_by_weighted_score() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/api/kpi/top-performers")
        .add_query_param("limit", "2")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), vec![FACEBOOK_FEED, UNMAPPED_DISPLAY]);
    // 0.3 * 150 + 0.4 * 35 + 0.3 * 7
    assert_eq!(body["items"][0]["score"], 61.1);
    assert_eq!(body["items"][0]["rank"], 1);

    let one_day: Value = server
        .get("/api/kpi/top-performers")
        .add_query_param("start", FACT_DAY)
        .add_query_param("end", FACT_DAY)
        .await
        .json();
    assert_eq!(ids(&one_day), vec![FACEBOOK_FEED, GOOGLE_GENERIC, GOOGLE_BRAND]);
}

#[tokio::test]
async fn test_top_networks_by_sessions() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body: Value = server.get("/api/kpi/top-networks").await.json();
    let networks: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["network"].as_str().unwrap())
        .collect();
    // Reddit has no sessions and is not ranked
    assert_eq!(networks, vec!["Facebook", "Unmapped", "Google"]);
    assert_eq!(body["items"][2]["campaign_count"], 2);
    assert_eq!(body["items"][2]["metrics"]["raw"]["sessions"], 30);
}

#[tokio::test]
async fn test_limit_bounds() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let zero: Value = server
        .get("/api/kpi/top-performers")
        .add_query_param("limit", "0")
        .await
        .json();
    assert_eq!(zero["count"], 0);

    let response = server
        .get("/api/kpi/top-networks")
        .add_query_param("limit", "1001")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_005");
}

#[tokio::test]
async fn test_daily_series_with_growth() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/api/timeseries")
        .add_query_param("granularity", "day")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["count"], 2);
    assert_eq!(body["items"][0]["raw"]["sessions"], 180);
    assert_eq!(body["items"][0]["session_growth_pct"], 0.0);
    assert_eq!(body["items"][1]["raw"]["sessions"], 40);
    assert_eq!(body["items"][1]["session_growth_pct"], -77.78);
}

#[tokio::test]
async fn test_hourly_series_for_selected_campaigns() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body: Value = server
        .get("/api/timeseries")
        .add_query_param("granularity", "hour")
        .add_query_param("campaign_ids", FACEBOOK_FEED.to_string())
        .await
        .json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["items"][1]["session_growth_pct"], -50.0);
    assert_eq!(body["items"][0]["rates"]["registration_rate"], 25.0);
}

#[tokio::test]
async fn test_unknown_granularity_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/api/timeseries")
        .add_query_param("granularity", "fortnight")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_006");
}

#[tokio::test]
async fn test_quality_report() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/api/quality").await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["campaigns_analyzed"], 4);
    assert_eq!(body["unmapped_count"], 1);
    let warnings: Vec<&str> = body["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w.as_str().unwrap())
        .collect();
    assert!(warnings
        .iter()
        .any(|w| *w == "1 campaigns are unmapped in hierarchy: Untracked Display"));
}
