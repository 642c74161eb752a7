use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};

/// A submission waiting for moderator action. Carries both the payload
/// as received and the normalized form, plus the validation warnings
/// produced at ingest time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewQueueEntry {
    pub id: i64,
    pub event_ulid: String,
    pub event_name: Option<String>,
    pub event_start_time: Option<DateTime<Utc>>,
    pub event_end_time: Option<DateTime<Utc>>,
    pub original_payload: JsonValue,
    pub normalized_payload: JsonValue,
    pub warnings: JsonValue, // array of ValidationWarning
    pub status: String,      // 'pending' | 'approved' | 'rejected' | 'merged'
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub merged_into: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status enum for type-safe edges
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    Merged,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Merged => "merged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "merged" => Some(Self::Merged),
            _ => None,
        }
    }
}

/// One validation warning attached to a queue entry, e.g.
/// `{ "code": "potential_duplicate", "details": { "matches": [...] } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub code: String,
    #[serde(default)]
    pub details: JsonValue,
}

impl ReviewQueueEntry {
    pub fn is_pending(&self) -> bool {
        self.status == ReviewStatus::Pending.as_str()
    }

    /// Decode the warnings column into typed warnings
    pub fn parsed_warnings(&self) -> Result<Vec<ValidationWarning>> {
        if self.warnings.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(self.warnings.clone())
            .with_context(|| format!("malformed warnings on review entry {}", self.id))
    }
}

/// Listing filters. Status has already been validated by the handler;
/// limit and cursor carry the sanitized values.
#[derive(Debug, Clone)]
pub struct ReviewQueueFilters {
    pub status: ReviewStatus,
    pub limit: i64,
    pub cursor: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ReviewQueuePage {
    pub entries: Vec<ReviewQueueEntry>,
    pub total: i64,
    pub next_cursor: Option<i64>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ReviewQueueEntry {
    /// Find a queue entry by its numeric id
    pub async fn find_by_id(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        let entry =
            sqlx::query_as::<_, ReviewQueueEntry>("SELECT * FROM event_review_queue WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(entry)
    }

    /// List queue entries matching the filters, newest submissions last.
    /// Fetches one row past the limit to detect whether more remain.
    pub async fn list(filters: &ReviewQueueFilters, pool: &PgPool) -> Result<ReviewQueuePage> {
        let mut entries = sqlx::query_as::<_, ReviewQueueEntry>(
            r#"
            SELECT * FROM event_review_queue
            WHERE status = $1
              AND ($2::bigint IS NULL OR id > $2)
            ORDER BY id ASC
            LIMIT $3
            "#,
        )
        .bind(filters.status.as_str())
        .bind(filters.cursor)
        .bind(filters.limit + 1)
        .fetch_all(pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM event_review_queue WHERE status = $1")
                .bind(filters.status.as_str())
                .fetch_one(pool)
                .await?;

        let next_cursor = if entries.len() as i64 > filters.limit {
            entries.truncate(filters.limit as usize);
            entries.last().map(|e| e.id)
        } else {
            None
        };

        Ok(ReviewQueuePage {
            entries,
            total,
            next_cursor,
        })
    }

    /// Move a pending entry to approved. Returns None when the entry is
    /// missing or no longer pending.
    pub async fn approve(
        id: i64,
        reviewed_by: &str,
        notes: Option<&str>,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let entry = sqlx::query_as::<_, ReviewQueueEntry>(
            r#"
            UPDATE event_review_queue
            SET status = 'approved',
                reviewed_by = $2,
                reviewed_at = NOW(),
                review_notes = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reviewed_by)
        .bind(notes)
        .fetch_optional(conn)
        .await?;
        Ok(entry)
    }

    /// Move a pending entry to rejected with the reviewer's reason
    pub async fn reject(
        id: i64,
        reviewed_by: &str,
        reason: &str,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let entry = sqlx::query_as::<_, ReviewQueueEntry>(
            r#"
            UPDATE event_review_queue
            SET status = 'rejected',
                reviewed_by = $2,
                reviewed_at = NOW(),
                rejection_reason = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reviewed_by)
        .bind(reason)
        .fetch_optional(conn)
        .await?;
        Ok(entry)
    }

    /// Move a pending entry to merged, recording the surviving event
    pub async fn mark_merged(
        id: i64,
        reviewed_by: &str,
        primary_ulid: &str,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let entry = sqlx::query_as::<_, ReviewQueueEntry>(
            r#"
            UPDATE event_review_queue
            SET status = 'merged',
                reviewed_by = $2,
                reviewed_at = NOW(),
                merged_into = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reviewed_by)
        .bind(primary_ulid)
        .fetch_optional(conn)
        .await?;
        Ok(entry)
    }
}
