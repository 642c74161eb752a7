//! Application setup and router wiring.

use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::audit::AuditLog;
use crate::config::{Config, Environment};
use crate::domains::auth::{ApiKeyStore, JwtService, PgApiKeyStore};
use crate::domains::events::{AdminService, PgReviewStore};
use crate::domains::federation::{ChangeFeedService, PgChangeStore};
use crate::domains::linked_data::{DirectoryStore, PgDirectoryStore};
use crate::domains::users::{PgUserStore, UserService};
use crate::server::middleware::{admin_auth, agent_auth};
use crate::server::routes::{
    admin_users, api_keys, feeds, health, public_pages, review_queue, wellknown,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub admin: AdminService,
    pub users: UserService,
    pub change_feed: ChangeFeedService,
    pub directory: Arc<dyn DirectoryStore>,
    pub api_keys: Arc<dyn ApiKeyStore>,
    pub jwt: Arc<JwtService>,
    pub audit: AuditLog,
}

impl AppState {
    /// Wire every service to Postgres-backed stores
    pub fn with_postgres(pool: PgPool, config: Config) -> Self {
        let jwt = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            config.jwt_expiry_hours,
        ));
        let review_store = Arc::new(PgReviewStore::new(pool.clone(), config.base_url.clone()));
        Self {
            admin: AdminService::new(review_store),
            users: UserService::new(Arc::new(PgUserStore::new(pool.clone()))),
            change_feed: ChangeFeedService::new(Arc::new(PgChangeStore::new(pool.clone()))),
            directory: Arc::new(PgDirectoryStore::new(pool.clone())),
            api_keys: Arc::new(PgApiKeyStore::new(pool)),
            jwt,
            audit: AuditLog::new(),
            config: Arc::new(config),
        }
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let admin_routes = Router::new()
        .route("/review-queue", get(review_queue::list))
        .route("/review-queue/:id", get(review_queue::get_detail))
        .route("/review-queue/:id/approve", post(review_queue::approve))
        .route("/review-queue/:id/reject", post(review_queue::reject))
        .route("/review-queue/:id/fix", post(review_queue::fix))
        .route("/review-queue/:id/merge", post(review_queue::merge))
        .route(
            "/users",
            get(admin_users::list).post(admin_users::create),
        )
        .route(
            "/users/:id",
            get(admin_users::get)
                .put(admin_users::update)
                .delete(admin_users::remove),
        )
        .route("/users/:id/activate", post(admin_users::activate))
        .route("/users/:id/deactivate", post(admin_users::deactivate))
        .route("/api-keys", get(api_keys::list).post(api_keys::create))
        .route("/api-keys/:id", delete(api_keys::revoke))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    let feed_routes = Router::new()
        .route("/api/v1/feeds/changes", get(feeds::list_changes))
        .route_layer(middleware::from_fn_with_state(state.clone(), agent_auth));

    Router::new()
        .route("/health", get(health::health))
        .route("/.well-known/sel-profile", get(wellknown::sel_profile))
        .route("/events/:id", get(public_pages::get_event))
        .route("/places/:id", get(public_pages::get_place))
        .route("/organizations/:id", get(public_pages::get_organization))
        .merge(feed_routes)
        .nest("/api/v1/admin", admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Production restricts origins to the configured whitelist; everything
/// else (dev, test) allows any origin.
fn cors_layer(config: &Config) -> CorsLayer {
    let allow_origin = if config.environment == Environment::Production {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    } else {
        AllowOrigin::any()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
