//! Federation change feed endpoint tests.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{get, Harness};
use sel_core::domains::auth::api_key::generate_secret;
use sel_core::domains::test_support::{MockApiKeyStore, MockChangeStore};

const EVENT_ULID: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";

fn seed_changes(harness: &Harness, count: i64) {
    for seq in 1..=count {
        harness
            .ctx
            .changes
            .push_change(MockChangeStore::change(seq, EVENT_ULID, "create"));
    }
}

#[tokio::test]
async fn feed_is_readable_anonymously() {
    let harness = Harness::new();
    seed_changes(&harness, 3);

    let (status, body) = get("/api/v1/feeds/changes").send(harness.app()).await;

    assert_eq!(status, StatusCode::OK);
    let changes = body["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 3);
    assert_eq!(changes[0]["sequence_number"], 1);
    assert_eq!(changes[0]["event_ulid"], EVENT_ULID);
    assert_eq!(changes[0]["action"], "create");
    assert!(body["cursor"].is_string());
    assert_eq!(body["has_more"], json!(false));
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn feed_pages_with_opaque_cursor() {
    let harness = Harness::new();
    seed_changes(&harness, 5);

    let (status, body) = get("/api/v1/feeds/changes?limit=2")
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changes"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], json!(true));
    let cursor = body["next_cursor"].as_str().unwrap().to_string();

    let (status, body) = get(format!("/api/v1/feeds/changes?after={cursor}&limit=2"))
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cursor"], json!(cursor));
    let changes = body["changes"].as_array().unwrap();
    assert_eq!(changes[0]["sequence_number"], 3);
    assert_eq!(changes[1]["sequence_number"], 4);
}

#[tokio::test]
async fn feed_rejects_bad_parameters() {
    let harness = Harness::new();

    let (status, _) = get("/api/v1/feeds/changes?limit=1001")
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get("/api/v1/feeds/changes?action=publish")
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get("/api/v1/feeds/changes?after=not-a-cursor")
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get("/api/v1/feeds/changes?since=yesterday")
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Invalid since parameter (must be RFC3339 timestamp)"
    );
}

#[tokio::test]
async fn feed_filters_by_action() {
    let harness = Harness::new();
    harness
        .ctx
        .changes
        .push_change(MockChangeStore::change(1, EVENT_ULID, "create"));
    harness
        .ctx
        .changes
        .push_change(MockChangeStore::change(2, EVENT_ULID, "delete"));

    let (status, body) = get("/api/v1/feeds/changes?action=delete")
        .send(harness.app())
        .await;

    assert_eq!(status, StatusCode::OK);
    let changes = body["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["action"], "delete");
}

#[tokio::test]
async fn snapshots_are_opt_in() {
    let harness = Harness::new();
    let mut change = MockChangeStore::change(1, EVENT_ULID, "create");
    change.snapshot = Some(json!({ "name": "Repair Cafe" }));
    harness.ctx.changes.push_change(change);

    let (_, body) = get("/api/v1/feeds/changes").send(harness.app()).await;
    assert!(body["changes"][0].get("snapshot").is_none());

    let (_, body) = get("/api/v1/feeds/changes?include_snapshot=true")
        .send(harness.app())
        .await;
    assert_eq!(body["changes"][0]["snapshot"]["name"], "Repair Cafe");
}

#[tokio::test]
async fn presented_api_key_must_be_valid() {
    let harness = Harness::new();
    seed_changes(&harness, 1);

    // A bearer token that is not an sel_ key passes through anonymously
    let (status, _) = get("/api/v1/feeds/changes")
        .bearer("some-opaque-token")
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::OK);

    // An sel_ key that matches nothing is rejected
    let (status, body) = get("/api/v1/feeds/changes")
        .bearer(&generate_secret())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid API key");
}

#[tokio::test]
async fn valid_api_key_records_last_use() {
    let harness = Harness::new();
    seed_changes(&harness, 1);

    let secret = generate_secret();
    let key = MockApiKeyStore::key("peer-node", &secret, true, None);
    let key_id = key.id;
    harness.ctx.keys.push_key(key);

    let (status, _) = get("/api/v1/feeds/changes")
        .bearer(&secret)
        .send(harness.app())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.ctx.keys.touched(), vec![key_id]);
}

#[tokio::test]
async fn expired_key_is_rejected() {
    let harness = Harness::new();
    let secret = generate_secret();
    let key = MockApiKeyStore::key(
        "stale-peer",
        &secret,
        true,
        Some(Utc::now() - Duration::hours(1)),
    );
    harness.ctx.keys.push_key(key);

    let (status, _) = get("/api/v1/feeds/changes")
        .bearer(&secret)
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
