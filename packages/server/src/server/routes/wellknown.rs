use axum::{extract::State, Json};
use serde_json::{json, Value as JsonValue};

use crate::server::app::AppState;

/// GET /.well-known/sel-profile - node metadata for federation
/// discovery
pub async fn sel_profile(State(state): State<AppState>) -> Json<JsonValue> {
    Json(json!({
        "profile": "https://sel.events/profiles/interop",
        "version": state.config.node_version,
        "node": state.config.base_url,
        "updated": chrono::Utc::now().format("%Y-%m-%d").to_string(),
    }))
}
