use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit_details;
use crate::common::{ApiError, ApiResult};
use crate::domains::auth::api_key::{generate_secret, hash_key, ApiKey, KEY_PREFIX_LEN};
use crate::server::app::AppState;
use crate::server::extract::Json;
use crate::server::middleware::ReviewerIdentity;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyView {
    id: Uuid,
    name: String,
    prefix: String,
    is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<ApiKey> for ApiKeyView {
    fn from(key: ApiKey) -> Self {
        ApiKeyView {
            id: key.id,
            name: key.name,
            prefix: key.prefix,
            is_active: key.is_active,
            expires_at: key.expires_at,
            last_used_at: key.last_used_at,
            created_at: key.created_at,
        }
    }
}

/// The secret is only ever returned from the create call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedKeyView {
    #[serde(flatten)]
    key: ApiKeyView,
    key_secret: String,
}

#[derive(Debug, Serialize)]
pub struct ListKeysResponse {
    items: Vec<ApiKeyView>,
}

/// GET /api/v1/admin/api-keys
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<ListKeysResponse>> {
    let keys = state
        .api_keys
        .list()
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(ListKeysResponse {
        items: keys.into_iter().map(ApiKeyView::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    #[serde(default)]
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /api/v1/admin/api-keys
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<ReviewerIdentity>,
    Json(req): Json<CreateKeyRequest>,
) -> ApiResult<(StatusCode, Json<CreatedKeyView>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Key name is required"));
    }

    let secret = generate_secret();
    let prefix = &secret[..KEY_PREFIX_LEN];
    let result = state
        .api_keys
        .insert(name, prefix, &hash_key(&secret), req.expires_at)
        .await;

    match result {
        Ok(key) => {
            state.audit.success(
                "admin.api_keys.create",
                &actor.username,
                "api_key",
                &key.id.to_string(),
                audit_details! { "name" => key.name, "prefix" => key.prefix },
            );
            Ok((
                StatusCode::CREATED,
                Json(CreatedKeyView {
                    key: key.into(),
                    key_secret: secret,
                }),
            ))
        }
        Err(err) => {
            state.audit.failure(
                "admin.api_keys.create",
                &actor.username,
                "api_key",
                name,
                audit_details! { "error" => err },
            );
            Err(ApiError::Internal(err))
        }
    }
}

/// DELETE /api/v1/admin/api-keys/:id
pub async fn revoke(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(actor): Extension<ReviewerIdentity>,
) -> ApiResult<StatusCode> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::validation("Invalid key ID"))?;
    match state.api_keys.revoke(id).await {
        Ok(true) => {
            state.audit.success(
                "admin.api_keys.revoke",
                &actor.username,
                "api_key",
                &id.to_string(),
                audit_details! {},
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(ApiError::not_found("API key not found")),
        Err(err) => {
            state.audit.failure(
                "admin.api_keys.revoke",
                &actor.username,
                "api_key",
                &id.to_string(),
                audit_details! { "error" => err },
            );
            Err(ApiError::Internal(err))
        }
    }
}
