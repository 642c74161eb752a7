use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Organization - an event organizer or presenting group
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub ulid: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub lifecycle_state: String, // 'draft' | 'published' | 'deleted'
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn is_deleted(&self) -> bool {
        self.lifecycle_state == "deleted"
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Organization {
    pub async fn find_by_ulid(ulid: &str, pool: &PgPool) -> Result<Option<Self>> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE ulid = $1")
            .bind(ulid)
            .fetch_optional(pool)
            .await?;
        Ok(org)
    }
}
