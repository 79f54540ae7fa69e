//! Rollup tree endpoint tests.

use axum::http::StatusCode;
use integration_tests::{fixtures::FACT_DAY, setup::TestContext};
use serde_json::Value;

fn names(nodes: &Value) -> Vec<&str> {
    nodes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect()
}

fn child<'a>(nodes: &'a Value, name: &str) -> &'a Value {
    nodes
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["name"] == name)
        .unwrap_or_else(|| panic!("no node named {}", name))
}

/// Every group's raw counters equal the sum over its children
fn assert_sums_consistent(node: &Value) {
    let children = node["children"].as_array().unwrap();
    for counter in ["sessions", "registrations", "converted_users"] {
        let total: u64 = children
            .iter()
            .map(|c| c["metrics"]["raw"][counter].as_u64().unwrap())
            .sum();
        assert_eq!(node["metrics"]["raw"][counter].as_u64().unwrap(), total);
    }
    for c in children.iter().filter(|c| c["kind"] == "group") {
        assert_sums_consistent(c);
    }
}

#[tokio::test]
async fn test_network_mode_tree() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/api/hierarchy")
        .add_query_param("mode", "network")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["mode"], "network");
    assert_eq!(body["campaign_count"], 4);
    assert_eq!(body["totals"]["raw"]["sessions"], 220);
    // Reddit has no facts and is left out; unmapped campaigns are bucketed
    assert_eq!(names(&body["nodes"]), vec!["Facebook", "Google", "Unmapped"]);

    let google = child(&body["nodes"], "Google");
    let search = child(&google["children"], "Search");
    assert_eq!(search["metrics"]["raw"]["sessions"], 30);
    assert_eq!(search["campaign_count"], 2);

    for node in body["nodes"].as_array().unwrap() {
        assert_sums_consistent(node);
    }
}

#[tokio::test]
async fn test_registration_rate_over_summed_hours() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body: Value = server
        .get("/api/hierarchy")
        .add_query_param("mode", "network")
        .await
        .json();
    let facebook = child(&body["nodes"], "Facebook");
    let rate = facebook["metrics"]["rates"]["registration_rate"]
        .as_f64()
        .unwrap();
    assert!((rate - 35.0 / 150.0 * 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_special_mode_is_flat() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/api/hierarchy")
        .add_query_param("mode", "special")
        .add_query_param("start", FACT_DAY)
        .add_query_param("end", FACT_DAY)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    let nodes = body["nodes"].as_array().unwrap();
    assert!(nodes.iter().all(|n| n["kind"] == "campaign"));
    assert_eq!(
        names(&body["nodes"]),
        vec![
            "Facebook Mobile Feed",
            "Google Search Brand",
            "Google Search Generic"
        ]
    );
}

#[tokio::test]
async fn test_include_inactive_lists_idle_campaigns() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body: Value = server
        .get("/api/hierarchy")
        .add_query_param("mode", "special")
        .add_query_param("include_inactive", "true")
        .await
        .json();

    assert_eq!(body["campaign_count"], 5);
    let idle = child(&body["nodes"], "Reddit Promoted");
    assert_eq!(idle["metrics"]["raw"]["sessions"], 0);
    assert_eq!(idle["metrics"]["rates"]["registration_rate"], 0.0);
}

#[tokio::test]
async fn test_empty_range_returns_empty_tree() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/api/hierarchy")
        .add_query_param("start", "2020-01-01")
        .add_query_param("end", "2020-01-31")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["nodes"].as_array().unwrap().len(), 0);
    assert_eq!(body["totals"]["raw"]["sessions"], 0);
}

#[tokio::test]
async fn test_identical_requests_give_identical_trees() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let first: Value = server
        .get("/api/hierarchy")
        .add_query_param("mode", "domain")
        .await
        .json();
    let second: Value = server
        .get("/api/hierarchy")
        .add_query_param("mode", "domain")
        .await
        .json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_mode_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .get("/api/hierarchy")
        .add_query_param("mode", "region")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

#[tokio::test]
async fn test_bad_ranges_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let reversed = server
        .get("/api/hierarchy")
        .add_query_param("start", "2024-03-02")
        .add_query_param("end", "2024-03-01")
        .await;
    reversed.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(reversed.json::<Value>()["code"], "VALID_001");

    let malformed = server
        .get("/api/hierarchy")
        .add_query_param("start", "2024-13-01")
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(malformed.json::<Value>()["code"], "VALID_001");
}
