use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::common::ApiError;
use crate::server::app::AppState;

/// Authenticated reviewer, inserted into request extensions for the
/// admin handlers to attribute decisions to.
#[derive(Clone, Debug)]
pub struct ReviewerIdentity {
    pub username: String,
    pub role: String,
}

/// Admin authentication middleware
///
/// Requires a Bearer token with the admin role. When the dev fallback
/// is enabled (never in production) an unauthenticated request proceeds
/// as the synthetic "admin" reviewer.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(identity) => {
            debug!(reviewer = %identity.username, "authenticated admin request");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<ReviewerIdentity, ApiError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        if state.config.auth_dev_fallback {
            return Ok(ReviewerIdentity {
                username: "admin".to_string(),
                role: "admin".to_string(),
            });
        }
        return Err(ApiError::Unauthorized(
            "Missing authorization header".to_string(),
        ));
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Malformed authorization header".to_string()))?;

    let claims = state
        .jwt
        .verify_token(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    if claims.role != "admin" {
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }

    Ok(ReviewerIdentity {
        username: claims.sub,
        role: claims.role,
    })
}
