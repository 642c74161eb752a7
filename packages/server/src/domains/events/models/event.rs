use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// Event - the central entity of the directory. ULIDs are stored in
/// canonical uppercase form; callers normalize before querying.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub ulid: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub venue_ulid: Option<String>,
    pub organizer_ulid: Option<String>,
    pub lifecycle_state: String, // 'draft' | 'published' | 'deleted'
    pub merged_into: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle enum for type-safe edges
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Draft,
    Published,
    Deleted,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Deleted => "deleted",
        }
    }
}

impl Event {
    pub fn is_deleted(&self) -> bool {
        self.lifecycle_state == Lifecycle::Deleted.as_str()
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Event {
    /// Find event by ULID
    pub async fn find_by_ulid(ulid: &str, pool: &PgPool) -> Result<Option<Self>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE ulid = $1")
            .bind(ulid)
            .fetch_optional(pool)
            .await?;
        Ok(event)
    }

    /// Lock and fetch an event inside a transaction
    pub async fn lock_by_ulid(ulid: &str, conn: &mut PgConnection) -> Result<Option<Self>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE ulid = $1 FOR UPDATE")
            .bind(ulid)
            .fetch_optional(conn)
            .await?;
        Ok(event)
    }

    /// Transition a draft event to published
    pub async fn publish(ulid: &str, conn: &mut PgConnection) -> Result<Self> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET lifecycle_state = 'published', updated_at = NOW()
            WHERE ulid = $1
            RETURNING *
            "#,
        )
        .bind(ulid)
        .fetch_one(conn)
        .await?;
        Ok(event)
    }

    /// Overwrite occurrence dates, keeping whichever side the caller
    /// did not supply
    pub async fn update_occurrence(
        ulid: &str,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET start_time = COALESCE($2, start_time),
                end_time = COALESCE($3, end_time),
                updated_at = NOW()
            WHERE ulid = $1
            RETURNING *
            "#,
        )
        .bind(ulid)
        .bind(start_time)
        .bind(end_time)
        .fetch_one(conn)
        .await?;
        Ok(event)
    }

    /// Soft-delete an event (lifecycle transitions to 'deleted')
    pub async fn soft_delete(ulid: &str, conn: &mut PgConnection) -> Result<Self> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET lifecycle_state = 'deleted', deleted_at = NOW(), updated_at = NOW()
            WHERE ulid = $1
            RETURNING *
            "#,
        )
        .bind(ulid)
        .fetch_one(conn)
        .await?;
        Ok(event)
    }

    /// Soft-delete the duplicate side of a merge and point it at the
    /// surviving event
    pub async fn mark_merged_into(
        duplicate_ulid: &str,
        primary_ulid: &str,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET lifecycle_state = 'deleted',
                merged_into = $2,
                deleted_at = NOW(),
                updated_at = NOW()
            WHERE ulid = $1
            RETURNING *
            "#,
        )
        .bind(duplicate_ulid)
        .bind(primary_ulid)
        .fetch_one(conn)
        .await?;
        Ok(event)
    }

    /// Gap-fill the primary event with fields the duplicate has and the
    /// primary lacks. Never overwrites populated fields.
    pub async fn gap_fill_from(
        primary_ulid: &str,
        duplicate_ulid: &str,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events AS p
            SET description = COALESCE(p.description, d.description),
                url = COALESCE(p.url, d.url),
                image_url = COALESCE(p.image_url, d.image_url),
                end_time = COALESCE(p.end_time, d.end_time),
                venue_ulid = COALESCE(p.venue_ulid, d.venue_ulid),
                organizer_ulid = COALESCE(p.organizer_ulid, d.organizer_ulid),
                updated_at = NOW()
            FROM events AS d
            WHERE p.ulid = $1 AND d.ulid = $2
            RETURNING p.*
            "#,
        )
        .bind(primary_ulid)
        .bind(duplicate_ulid)
        .fetch_one(conn)
        .await?;
        Ok(event)
    }
}
