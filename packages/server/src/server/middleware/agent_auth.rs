use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::auth::api_key;
use crate::server::app::AppState;

/// Identified federation agent, available to handlers that want to
/// attribute feed reads or apply per-agent policy.
#[derive(Clone, Debug)]
pub struct AgentIdentity {
    pub key_id: Uuid,
    pub name: String,
}

/// Agent API-key middleware
///
/// Requests without an `sel_` bearer key pass through anonymously. A
/// presented key must validate; on success the agent identity lands in
/// request extensions and last-use is recorded best-effort.
pub async fn agent_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let raw_key = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| token.starts_with("sel_"))
        .map(str::to_string);

    if let Some(raw_key) = raw_key {
        let key = match api_key::authenticate(state.api_keys.as_ref(), &raw_key).await {
            Ok(Some(key)) => key,
            Ok(None) => {
                return ApiError::Unauthorized("Invalid API key".to_string()).into_response()
            }
            Err(err) => return ApiError::Internal(err).into_response(),
        };

        if let Err(err) = state.api_keys.touch_last_used(key.id).await {
            tracing::warn!(key_id = %key.id, error = %err, "failed to record API key use");
        }

        request.extensions_mut().insert(AgentIdentity {
            key_id: key.id,
            name: key.name,
        });
    }

    next.run(request).await
}
