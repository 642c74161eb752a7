use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit_details;
use crate::common::{ApiError, ApiResult};
use crate::domains::users::models::admin_user::{
    AdminUser, ListUsersFilters, NewUser, UserRole, UserUpdate,
};
use crate::domains::users::UserError;
use crate::server::app::AppState;
use crate::server::extract::Json;
use crate::server::middleware::ReviewerIdentity;

const DEFAULT_USER_LIMIT: i64 = 50;
const MAX_USER_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    id: Uuid,
    username: String,
    email: String,
    role: String,
    is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdminUser> for UserView {
    fn from(user: AdminUser) -> Self {
        UserView {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    items: Vec<UserView>,
    next_cursor: Option<String>,
    total: i64,
}

fn map_user_error(err: UserError) -> ApiError {
    match err {
        UserError::NotFound => ApiError::not_found("User not found"),
        UserError::EmailTaken => ApiError::conflict("Email already taken"),
        UserError::UsernameTaken => ApiError::conflict("Username already taken"),
        UserError::AlreadyActive => ApiError::conflict("User is already active"),
        UserError::AlreadyInactive => ApiError::conflict("User is already inactive"),
        UserError::InvalidRequest(msg) => ApiError::Validation(msg),
        UserError::Database(err) => ApiError::Internal(err),
    }
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation("Invalid user ID"))
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub status: Option<String>,
    pub role: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// GET /api/v1/admin/users
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<ListUsersResponse>> {
    let is_active = match query.status.as_deref() {
        None | Some("") => None,
        Some("active") => Some(true),
        Some("inactive") => Some(false),
        Some(_) => {
            return Err(ApiError::validation(
                "Status must be 'active' or 'inactive'",
            ))
        }
    };

    let role = match query.role.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(UserRole::parse(raw).ok_or_else(|| {
            ApiError::validation("Role must be 'admin', 'editor', or 'viewer'")
        })?),
    };

    let limit = match query.limit.as_deref() {
        None | Some("") => DEFAULT_USER_LIMIT,
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|n| (1..=MAX_USER_LIMIT).contains(n))
            .ok_or_else(|| ApiError::validation("Limit must be between 1 and 100"))?,
    };

    let offset = match query.offset.as_deref() {
        None | Some("") => 0,
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| ApiError::validation("Offset must be a non-negative integer"))?,
    };

    let (users, total) = state
        .users
        .list_users(&ListUsersFilters {
            is_active,
            role,
            limit,
            offset,
        })
        .await
        .map_err(map_user_error)?;

    let next_cursor = if offset + limit < total {
        Some((offset + limit).to_string())
    } else {
        None
    };

    Ok(Json(ListUsersResponse {
        items: users.into_iter().map(UserView::from).collect(),
        next_cursor,
        total,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Option<UserRole>,
}

/// POST /api/v1/admin/users
///
/// New accounts start inactive and must be activated explicitly.
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<ReviewerIdentity>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let role = req.role.unwrap_or(UserRole::Viewer);
    let result = state
        .users
        .create_user(NewUser {
            username: req.username.clone(),
            email: req.email.clone(),
            role,
        })
        .await;

    match result {
        Ok(user) => {
            state.audit.success(
                "admin.users.create",
                &actor.username,
                "user",
                &user.id.to_string(),
                audit_details! { "username" => user.username, "role" => user.role },
            );
            Ok((StatusCode::CREATED, Json(user.into())))
        }
        Err(err) => {
            state.audit.failure(
                "admin.users.create",
                &actor.username,
                "user",
                &req.username,
                audit_details! { "error" => err },
            );
            Err(map_user_error(err))
        }
    }
}

/// GET /api/v1/admin/users/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserView>> {
    let id = parse_user_id(&id)?;
    let user = state.users.get_user(id).await.map_err(map_user_error)?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

/// PUT /api/v1/admin/users/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(actor): Extension<ReviewerIdentity>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserView>> {
    let id = parse_user_id(&id)?;
    let result = state
        .users
        .update_user(
            id,
            UserUpdate {
                username: req.username,
                email: req.email,
                role: req.role,
            },
        )
        .await;

    match result {
        Ok(user) => {
            state.audit.success(
                "admin.users.update",
                &actor.username,
                "user",
                &id.to_string(),
                audit_details! { "username" => user.username },
            );
            Ok(Json(user.into()))
        }
        Err(err) => {
            state.audit.failure(
                "admin.users.update",
                &actor.username,
                "user",
                &id.to_string(),
                audit_details! { "error" => err },
            );
            Err(map_user_error(err))
        }
    }
}

/// DELETE /api/v1/admin/users/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(actor): Extension<ReviewerIdentity>,
) -> ApiResult<StatusCode> {
    let id = parse_user_id(&id)?;
    match state.users.delete_user(id).await {
        Ok(()) => {
            state.audit.success(
                "admin.users.delete",
                &actor.username,
                "user",
                &id.to_string(),
                audit_details! {},
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            state.audit.failure(
                "admin.users.delete",
                &actor.username,
                "user",
                &id.to_string(),
                audit_details! { "error" => err },
            );
            Err(map_user_error(err))
        }
    }
}

/// POST /api/v1/admin/users/:id/activate
pub async fn activate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(actor): Extension<ReviewerIdentity>,
) -> ApiResult<Json<UserView>> {
    let id = parse_user_id(&id)?;
    match state.users.activate_user(id).await {
        Ok(user) => {
            state.audit.success(
                "admin.users.activate",
                &actor.username,
                "user",
                &id.to_string(),
                audit_details! { "username" => user.username },
            );
            Ok(Json(user.into()))
        }
        Err(err) => {
            state.audit.failure(
                "admin.users.activate",
                &actor.username,
                "user",
                &id.to_string(),
                audit_details! { "error" => err },
            );
            Err(map_user_error(err))
        }
    }
}

/// POST /api/v1/admin/users/:id/deactivate
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(actor): Extension<ReviewerIdentity>,
) -> ApiResult<Json<UserView>> {
    let id = parse_user_id(&id)?;
    match state.users.deactivate_user(id).await {
        Ok(user) => {
            state.audit.success(
                "admin.users.deactivate",
                &actor.username,
                "user",
                &id.to_string(),
                audit_details! { "username" => user.username },
            );
            Ok(Json(user.into()))
        }
        Err(err) => {
            state.audit.failure(
                "admin.users.deactivate",
                &actor.username,
                "user",
                &id.to_string(),
                audit_details! { "error" => err },
            );
            Err(map_user_error(err))
        }
    }
}
