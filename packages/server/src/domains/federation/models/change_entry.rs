use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};

/// One row in the append-only event change log consumed by federated
/// peers. The sequence number is the feed's cursor space.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChangeEntry {
    pub sequence_number: i64,
    pub event_ulid: String,
    pub action: String, // 'create' | 'update' | 'delete'
    pub snapshot: Option<JsonValue>,
    pub changed_at: DateTime<Utc>,
}

/// Action enum for type-safe edges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Query shape the feed service hands to the store. Limit already has
/// the +1 probe row applied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ListChangesQuery {
    pub after_sequence: i64,
    pub since: Option<DateTime<Utc>>,
    pub action: Option<ChangeAction>,
    pub limit: i64,
}

#[async_trait]
pub trait ChangeStore: Send + Sync {
    async fn list_changes(&self, query: &ListChangesQuery) -> Result<Vec<ChangeEntry>>;
}

#[derive(Clone)]
pub struct PgChangeStore {
    pool: PgPool,
}

impl PgChangeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeStore for PgChangeStore {
    async fn list_changes(&self, query: &ListChangesQuery) -> Result<Vec<ChangeEntry>> {
        ChangeEntry::list(query, &self.pool).await
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ChangeEntry {
    pub async fn list(query: &ListChangesQuery, pool: &PgPool) -> Result<Vec<ChangeEntry>> {
        let entries = sqlx::query_as::<_, ChangeEntry>(
            r#"
            SELECT sequence_number, event_ulid, action, snapshot, changed_at
            FROM event_changes
            WHERE sequence_number > $1
              AND ($2::timestamptz IS NULL OR changed_at >= $2)
              AND ($3::text IS NULL OR action = $3)
            ORDER BY sequence_number ASC
            LIMIT $4
            "#,
        )
        .bind(query.after_sequence)
        .bind(query.since)
        .bind(query.action.map(|a| a.as_str()))
        .bind(query.limit)
        .fetch_all(pool)
        .await?;
        Ok(entries)
    }

    /// Append a change row inside a moderation transaction so the feed
    /// never observes a half-applied decision.
    pub async fn record(
        event_ulid: &str,
        action: ChangeAction,
        snapshot: Option<&JsonValue>,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO event_changes (event_ulid, action, snapshot, changed_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(event_ulid)
        .bind(action.as_str())
        .bind(snapshot)
        .execute(conn)
        .await?;
        Ok(())
    }
}
