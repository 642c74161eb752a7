use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Place - a venue events happen at
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Place {
    pub ulid: String,
    pub name: String,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub lifecycle_state: String, // 'draft' | 'published' | 'deleted'
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Place {
    pub fn is_deleted(&self) -> bool {
        self.lifecycle_state == "deleted"
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Place {
    pub async fn find_by_ulid(ulid: &str, pool: &PgPool) -> Result<Option<Self>> {
        let place = sqlx::query_as::<_, Place>("SELECT * FROM places WHERE ulid = $1")
            .bind(ulid)
            .fetch_optional(pool)
            .await?;
        Ok(place)
    }
}
