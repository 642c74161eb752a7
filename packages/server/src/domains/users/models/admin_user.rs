use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Staff account that can sign into the moderation console
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String, // 'admin' | 'editor' | 'viewer'
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role enum for type-safe edges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Editor,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

/// Fields to change on an existing user; None leaves the stored value
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone)]
pub struct ListUsersFilters {
    pub is_active: Option<bool>,
    pub role: Option<UserRole>,
    pub limit: i64,
    pub offset: i64,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl AdminUser {
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT * FROM admin_users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(username: &str, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT * FROM admin_users WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT * FROM admin_users WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn list(filters: &ListUsersFilters, pool: &PgPool) -> Result<(Vec<Self>, i64)> {
        let users = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT * FROM admin_users
            WHERE deleted_at IS NULL
              AND ($1::boolean IS NULL OR is_active = $1)
              AND ($2::text IS NULL OR role = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filters.is_active)
        .bind(filters.role.map(|r| r.as_str()))
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM admin_users
            WHERE deleted_at IS NULL
              AND ($1::boolean IS NULL OR is_active = $1)
              AND ($2::text IS NULL OR role = $2)
            "#,
        )
        .bind(filters.is_active)
        .bind(filters.role.map(|r| r.as_str()))
        .fetch_one(pool)
        .await?;

        Ok((users, total))
    }

    /// New accounts start inactive until a first login activates them
    pub async fn insert(new_user: &NewUser, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (id, username, email, role, is_active)
            VALUES ($1, $2, $3, $4, false)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(new_user.role.as_str())
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn update(
        id: Uuid,
        username: &str,
        email: &str,
        role: UserRole,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, AdminUser>(
            r#"
            UPDATE admin_users
            SET username = $2, email = $3, role = $4, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(role.as_str())
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn set_active(id: Uuid, is_active: bool, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, AdminUser>(
            r#"
            UPDATE admin_users
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn soft_delete(id: Uuid, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE admin_users
            SET deleted_at = NOW(), is_active = false, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
