use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use sqlx::{PgConnection, PgPool};

/// Marker left behind when an entity is deleted or merged away, so its
/// URI keeps dereferencing with 410 Gone instead of vanishing.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tombstone {
    pub id: i64,
    pub entity_type: String, // 'event' | 'place' | 'organization'
    pub entity_ulid: String,
    pub deleted_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub superseded_by: Option<String>,
    pub payload: JsonValue,
}

impl Tombstone {
    /// Build the JSON-LD body served with 410 responses. When the entity
    /// was merged away, `sel:supersededBy` points at the survivor's URI.
    pub fn event_payload(
        base_url: &str,
        event_ulid: &str,
        deleted_at: DateTime<Utc>,
        reason: Option<&str>,
        superseded_by_ulid: Option<&str>,
    ) -> JsonValue {
        let mut payload = json!({
            "@context": "https://schema.org",
            "@type": "Event",
            "@id": format!("{}/events/{}", base_url, event_ulid),
            "sel:tombstone": true,
            "sel:deletedAt": deleted_at.to_rfc3339(),
        });
        if let Some(reason) = reason {
            payload["sel:reason"] = json!(reason);
        }
        if let Some(primary) = superseded_by_ulid {
            payload["sel:supersededBy"] = json!(format!("{}/events/{}", base_url, primary));
        }
        payload
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Tombstone {
    pub async fn find_for_entity(
        entity_type: &str,
        entity_ulid: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let tombstone = sqlx::query_as::<_, Tombstone>(
            "SELECT * FROM tombstones WHERE entity_type = $1 AND entity_ulid = $2",
        )
        .bind(entity_type)
        .bind(entity_ulid)
        .fetch_optional(pool)
        .await?;
        Ok(tombstone)
    }

    pub async fn insert(
        entity_type: &str,
        entity_ulid: &str,
        reason: Option<&str>,
        superseded_by: Option<&str>,
        payload: &JsonValue,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let tombstone = sqlx::query_as::<_, Tombstone>(
            r#"
            INSERT INTO tombstones (entity_type, entity_ulid, deleted_at, reason, superseded_by, payload)
            VALUES ($1, $2, NOW(), $3, $4, $5)
            ON CONFLICT (entity_type, entity_ulid) DO UPDATE
            SET deleted_at = EXCLUDED.deleted_at,
                reason = EXCLUDED.reason,
                superseded_by = EXCLUDED.superseded_by,
                payload = EXCLUDED.payload
            RETURNING *
            "#,
        )
        .bind(entity_type)
        .bind(entity_ulid)
        .bind(reason)
        .bind(superseded_by)
        .bind(payload)
        .fetch_one(conn)
        .await?;
        Ok(tombstone)
    }
}
