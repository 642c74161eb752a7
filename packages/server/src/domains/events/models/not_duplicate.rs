use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A reviewer's assertion that two events flagged as potential
/// duplicates are in fact distinct. Stored with the pair in canonical
/// order so (a, b) and (b, a) land on the same row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotDuplicate {
    pub id: i64,
    pub event_a_ulid: String,
    pub event_b_ulid: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl NotDuplicate {
    pub async fn insert(
        event_a: &str,
        event_b: &str,
        created_by: &str,
        pool: &PgPool,
    ) -> Result<()> {
        let (first, second) = if event_a <= event_b {
            (event_a, event_b)
        } else {
            (event_b, event_a)
        };
        sqlx::query(
            r#"
            INSERT INTO not_duplicates (event_a_ulid, event_b_ulid, created_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_a_ulid, event_b_ulid) DO NOTHING
            "#,
        )
        .bind(first)
        .bind(second)
        .bind(created_by)
        .execute(pool)
        .await?;
        Ok(())
    }
}
