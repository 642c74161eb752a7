use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::common::{ApiError, ApiResult};
use crate::domains::federation::{ChangeFeedError, ChangeFeedParams};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangeFeedQuery {
    pub after: Option<String>,
    pub since: Option<String>,
    pub action: Option<String>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub include_snapshot: Option<String>,
}

/// GET /api/v1/feeds/changes - sequence-ordered change feed for
/// federated peers
pub async fn list_changes(
    State(state): State<AppState>,
    Query(query): Query<ChangeFeedQuery>,
) -> ApiResult<Json<JsonValue>> {
    let since = match query.since.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| {
                    ApiError::validation("Invalid since parameter (must be RFC3339 timestamp)")
                })?,
        ),
    };
    let include_snapshot = query.include_snapshot.as_deref() == Some("true");

    let result = state
        .change_feed
        .get_changes(ChangeFeedParams {
            after: query.after,
            since,
            action: query.action,
            limit: query.limit,
        })
        .await
        .map_err(|err| match err {
            ChangeFeedError::InvalidLimit
            | ChangeFeedError::InvalidAction
            | ChangeFeedError::InvalidCursor => ApiError::Validation(err.to_string()),
            ChangeFeedError::Database(err) => ApiError::Internal(err),
        })?;

    let changes: Vec<JsonValue> = result
        .changes
        .iter()
        .map(|change| {
            let mut item = json!({
                "sequence_number": change.sequence_number,
                "event_ulid": change.event_ulid,
                "action": change.action,
                "changed_at": change.changed_at,
            });
            if include_snapshot {
                if let Some(snapshot) = &change.snapshot {
                    item["snapshot"] = snapshot.clone();
                }
            }
            item
        })
        .collect();

    Ok(Json(json!({
        "cursor": result.cursor,
        "changes": changes,
        "next_cursor": result.next_cursor,
        "has_more": result.has_more,
    })))
}
