use axum::Json;
use serde_json::{json, Value as JsonValue};

/// Liveness probe
pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}
