// Router test scaffolding - an AppState wired entirely to mock stores.

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::config::{Config, Environment};
use crate::domains::auth::JwtService;
use crate::domains::events::AdminService;
use crate::domains::federation::ChangeFeedService;
use crate::domains::test_support::{
    MockApiKeyStore, MockChangeStore, MockDirectoryStore, MockReviewStore, MockUserStore,
};
use crate::domains::users::UserService;
use crate::server::app::AppState;

pub const STATE_JWT_SECRET: &str = "test-jwt-secret";
pub const STATE_BASE_URL: &str = "https://sel.example.org";

/// AppState plus handles to its mock stores
pub struct TestContext {
    pub state: AppState,
    pub reviews: Arc<MockReviewStore>,
    pub users: Arc<MockUserStore>,
    pub keys: Arc<MockApiKeyStore>,
    pub directory: Arc<MockDirectoryStore>,
    pub changes: Arc<MockChangeStore>,
}

pub fn test_context(dev_fallback: bool) -> TestContext {
    let reviews = Arc::new(MockReviewStore::new());
    let users = Arc::new(MockUserStore::new());
    let keys = Arc::new(MockApiKeyStore::new());
    let directory = Arc::new(MockDirectoryStore::new());
    let changes = Arc::new(MockChangeStore::new());

    let config = Config {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        base_url: STATE_BASE_URL.to_string(),
        environment: Environment::Test,
        jwt_secret: STATE_JWT_SECRET.to_string(),
        jwt_issuer: "sel-server-test".to_string(),
        jwt_expiry_hours: 24,
        auth_dev_fallback: dev_fallback,
        allowed_origins: Vec::new(),
        node_version: "0.0.0-test".to_string(),
    };

    let state = AppState {
        jwt: Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            config.jwt_expiry_hours,
        )),
        admin: AdminService::new(reviews.clone()),
        users: UserService::new(users.clone()),
        change_feed: ChangeFeedService::new(changes.clone()),
        directory: directory.clone(),
        api_keys: keys.clone(),
        audit: AuditLog::new(),
        config: Arc::new(config),
    };

    TestContext {
        state,
        reviews,
        users,
        keys,
        directory,
        changes,
    }
}

pub fn state_with_mocks(dev_fallback: bool) -> AppState {
    test_context(dev_fallback).state
}
