//! Admin user management and API key endpoint tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{delete, get, post, put, Harness};
use sel_core::domains::test_support::MockUserStore;

#[tokio::test]
async fn created_users_start_inactive() {
    let harness = Harness::new();

    let (status, body) = post("/api/v1/admin/users")
        .bearer(&harness.admin_token())
        .json(json!({
            "username": "sam",
            "email": "sam@example.org",
            "role": "editor"
        }))
        .send(harness.app())
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "sam");
    assert_eq!(body["role"], "editor");
    assert_eq!(body["isActive"], json!(false));
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let harness = Harness::new();
    harness
        .ctx
        .users
        .push_user(MockUserStore::user("sam", "sam@example.org", "editor"));

    let (status, body) = post("/api/v1/admin/users")
        .bearer(&harness.admin_token())
        .json(json!({ "username": "sam", "email": "other@example.org" }))
        .send(harness.app())
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Username already taken");
}

#[tokio::test]
async fn create_requires_plausible_email() {
    let harness = Harness::new();
    let (status, _) = post("/api/v1/admin/users")
        .bearer(&harness.admin_token())
        .json(json!({ "username": "sam", "email": "not-an-email" }))
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_validates_limit_and_filters() {
    let harness = Harness::new();
    let mut active = MockUserStore::user("sam", "sam@example.org", "editor");
    active.is_active = true;
    harness.ctx.users.push_user(active);
    harness
        .ctx
        .users
        .push_user(MockUserStore::user("mira", "mira@example.org", "admin"));

    let (status, _) = get("/api/v1/admin/users?limit=0")
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get("/api/v1/admin/users?status=active")
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["username"], "sam");
    assert_eq!(body["total"], 1);

    let (status, body) = get("/api/v1/admin/users?role=admin")
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["username"], "mira");
}

#[tokio::test]
async fn update_merges_absent_fields() {
    let harness = Harness::new();
    let user = MockUserStore::user("sam", "sam@example.org", "editor");
    let id = user.id;
    harness.ctx.users.push_user(user);

    let (status, body) = put(format!("/api/v1/admin/users/{id}"))
        .bearer(&harness.admin_token())
        .json(json!({ "role": "admin" }))
        .send(harness.app())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "sam");
    assert_eq!(body["email"], "sam@example.org");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn activation_is_idempotence_checked() {
    let harness = Harness::new();
    let user = MockUserStore::user("sam", "sam@example.org", "editor");
    let id = user.id;
    harness.ctx.users.push_user(user);

    let (status, body) = post(format!("/api/v1/admin/users/{id}/activate"))
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], json!(true));

    let (status, body) = post(format!("/api/v1/admin/users/{id}/activate"))
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "User is already active");
}

#[tokio::test]
async fn delete_then_lookup_is_404() {
    let harness = Harness::new();
    let user = MockUserStore::user("sam", "sam@example.org", "editor");
    let id = user.id;
    harness.ctx.users.push_user(user);

    let (status, _) = delete(format!("/api/v1/admin/users/{id}"))
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(format!("/api/v1/admin/users/{id}"))
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_user_id_is_rejected() {
    let harness = Harness::new();
    let (status, _) = get("/api/v1/admin/users/not-a-uuid")
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// API keys
// =============================================================================

#[tokio::test]
async fn created_key_reveals_secret_once() {
    let harness = Harness::new();

    let (status, body) = post("/api/v1/admin/api-keys")
        .bearer(&harness.admin_token())
        .json(json!({ "name": "peer-node" }))
        .send(harness.app())
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "peer-node");
    let secret = body["keySecret"].as_str().unwrap();
    assert!(secret.starts_with("sel_"));
    assert_eq!(body["prefix"], &secret[..8]);

    // the listing never carries the secret or its hash
    let (status, body) = get("/api/v1/admin/api-keys")
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::OK);
    let item = &body["items"][0];
    assert_eq!(item["name"], "peer-node");
    assert!(item.get("keySecret").is_none());
    assert!(item.get("keyHash").is_none());
}

#[tokio::test]
async fn key_creation_requires_a_name() {
    let harness = Harness::new();
    let (status, _) = post("/api/v1/admin/api-keys")
        .bearer(&harness.admin_token())
        .json(json!({ "name": "  " }))
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn revoking_unknown_key_is_404() {
    let harness = Harness::new();
    let (status, _) = delete(format!(
        "/api/v1/admin/api-keys/{}",
        uuid::Uuid::new_v4()
    ))
    .bearer(&harness.admin_token())
    .send(harness.app())
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn revoked_key_disappears_from_active_use() {
    let harness = Harness::new();

    let (_, body) = post("/api/v1/admin/api-keys")
        .bearer(&harness.admin_token())
        .json(json!({ "name": "peer-node" }))
        .send(harness.app())
        .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _) = delete(format!("/api/v1/admin/api-keys/{id}"))
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = get("/api/v1/admin/api-keys")
        .bearer(&harness.admin_token())
        .send(harness.app())
        .await;
    assert_eq!(body["items"][0]["isActive"], json!(false));
}
