use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::audit_details;
use crate::common::pagination::parse_review_cursor;
use crate::common::{normalize_ulid, ApiError, ApiResult};
use crate::domains::events::changes::{calculate_changes, ChangeDetail};
use crate::domains::events::{
    AdminError, NotDuplicateOutcome, ReviewQueueEntry, ReviewQueueFilters, ReviewStatus,
    ValidationWarning,
};
use crate::domains::events::admin_service::DateCorrections;
use crate::server::app::AppState;
use crate::server::extract::Json;
use crate::server::middleware::ReviewerIdentity;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 100;

// =============================================================================
// Response shapes
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueItem {
    id: i64,
    event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_end_time: Option<DateTime<Utc>>,
    warnings: Vec<ValidationWarning>,
    status: String,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueDetail {
    id: i64,
    event_id: String,
    status: String,
    warnings: Vec<ValidationWarning>,
    original: JsonValue,
    normalized: JsonValue,
    changes: Vec<ChangeDetail>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    review_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    not_duplicates: Option<NotDuplicateOutcome>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    items: Vec<ReviewQueueItem>,
    next_cursor: Option<String>,
    total: i64,
}

fn build_item(entry: &ReviewQueueEntry) -> Result<ReviewQueueItem, anyhow::Error> {
    Ok(ReviewQueueItem {
        id: entry.id,
        event_id: entry.event_ulid.clone(),
        event_name: entry.event_name.clone(),
        event_start_time: entry.event_start_time,
        event_end_time: entry.event_end_time,
        warnings: entry.parsed_warnings()?,
        status: entry.status.clone(),
        created_at: entry.created_at,
        reviewed_by: entry.reviewed_by.clone(),
        reviewed_at: entry.reviewed_at,
        rejection_reason: entry.rejection_reason.clone(),
    })
}

fn build_detail(
    entry: &ReviewQueueEntry,
    not_duplicates: Option<NotDuplicateOutcome>,
) -> Result<ReviewQueueDetail, anyhow::Error> {
    Ok(ReviewQueueDetail {
        id: entry.id,
        event_id: entry.event_ulid.clone(),
        status: entry.status.clone(),
        warnings: entry.parsed_warnings()?,
        original: entry.original_payload.clone(),
        normalized: entry.normalized_payload.clone(),
        changes: calculate_changes(&entry.original_payload, &entry.normalized_payload),
        created_at: entry.created_at,
        reviewed_by: entry.reviewed_by.clone(),
        reviewed_at: entry.reviewed_at,
        review_notes: entry.review_notes.clone(),
        rejection_reason: entry.rejection_reason.clone(),
        not_duplicates: not_duplicates.filter(|o| !o.is_empty()),
    })
}

fn map_admin_error(err: AdminError) -> ApiError {
    match err {
        AdminError::ReviewNotFound => ApiError::not_found("Review entry not found"),
        AdminError::EventNotFound => ApiError::not_found("Event not found"),
        AdminError::AlreadyReviewed(status) => {
            ApiError::conflict(format!("Review entry has already been {status}"))
        }
        AdminError::EventDeleted => ApiError::conflict("Event has been deleted"),
        AdminError::CannotMergeSameEvent => {
            ApiError::validation("Cannot merge event into itself")
        }
        AdminError::InvalidDates(msg) | AdminError::InvalidRequest(msg) => {
            ApiError::Validation(msg)
        }
        AdminError::Database(err) => ApiError::Internal(err),
    }
}

fn parse_review_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation("Invalid review ID")),
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

/// GET /api/v1/admin/review-queue
///
/// An out-of-range or malformed limit silently falls back to the
/// default; a malformed cursor is ignored.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let status = match query.status.as_deref() {
        None | Some("") => ReviewStatus::Pending,
        Some(raw) => ReviewStatus::parse(raw).ok_or_else(|| {
            ApiError::validation("Status must be 'pending', 'approved', 'rejected', or 'merged'")
        })?,
    };

    let limit = query
        .limit
        .as_deref()
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|n| (1..=MAX_LIST_LIMIT).contains(n))
        .unwrap_or(DEFAULT_LIST_LIMIT);

    let cursor = query.cursor.as_deref().and_then(parse_review_cursor);

    let page = state
        .admin
        .list_entries(&ReviewQueueFilters {
            status,
            limit,
            cursor,
        })
        .await
        .map_err(map_admin_error)?;

    // Entries with unparseable warnings are skipped rather than failing
    // the whole page
    let items = page
        .entries
        .iter()
        .filter_map(|entry| match build_item(entry) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(review_id = entry.id, error = %err, "skipping malformed review entry");
                None
            }
        })
        .collect();

    Ok(Json(ListResponse {
        items,
        next_cursor: page.next_cursor.map(|id| id.to_string()),
        total: page.total,
    }))
}

/// GET /api/v1/admin/review-queue/:id
pub async fn get_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReviewQueueDetail>> {
    let id = parse_review_id(&id)?;
    let entry = state.admin.get_entry(id).await.map_err(map_admin_error)?;
    Ok(Json(build_detail(&entry, None)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub record_not_duplicates: bool,
}

/// POST /api/v1/admin/review-queue/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(reviewer): Extension<ReviewerIdentity>,
    body: Option<Json<ApproveRequest>>,
) -> ApiResult<Response> {
    let id = parse_review_id(&id)?;
    let Json(req) = body.unwrap_or_default();
    let notes = req.notes.as_deref().filter(|n| !n.is_empty());

    let result = state
        .admin
        .approve_event(id, &reviewer.username, notes, req.record_not_duplicates)
        .await;

    match result {
        Ok((entry, outcome)) => {
            state.audit.success(
                "admin.review.approve",
                &reviewer.username,
                "review",
                &id.to_string(),
                audit_details! { "event_id" => entry.event_ulid },
            );
            Ok(Json(build_detail(&entry, Some(outcome))?).into_response())
        }
        Err(err) => {
            state.audit.failure(
                "admin.review.approve",
                &reviewer.username,
                "review",
                &id.to_string(),
                audit_details! { "error" => err },
            );
            Err(map_admin_error(err))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

/// POST /api/v1/admin/review-queue/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(reviewer): Extension<ReviewerIdentity>,
    Json(req): Json<RejectRequest>,
) -> ApiResult<Response> {
    let id = parse_review_id(&id)?;
    if req.reason.trim().is_empty() {
        return Err(ApiError::validation("Rejection reason is required"));
    }

    let result = state
        .admin
        .reject_event(id, &reviewer.username, &req.reason)
        .await;

    match result {
        Ok((entry, outcome)) => {
            state.audit.success(
                "admin.review.reject",
                &reviewer.username,
                "review",
                &id.to_string(),
                audit_details! {
                    "event_id" => entry.event_ulid,
                    "reason" => req.reason,
                },
            );
            Ok(Json(build_detail(&entry, Some(outcome))?).into_response())
        }
        Err(err) => {
            state.audit.failure(
                "admin.review.reject",
                &reviewer.username,
                "review",
                &id.to_string(),
                audit_details! { "error" => err },
            );
            Err(map_admin_error(err))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FixCorrections {
    #[serde(rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct FixRequest {
    #[serde(default)]
    pub corrections: FixCorrections,
    #[serde(default)]
    pub notes: Option<String>,
}

/// POST /api/v1/admin/review-queue/:id/fix
pub async fn fix(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(reviewer): Extension<ReviewerIdentity>,
    Json(req): Json<FixRequest>,
) -> ApiResult<Response> {
    let id = parse_review_id(&id)?;
    let corrections = DateCorrections {
        start_time: req.corrections.start_date,
        end_time: req.corrections.end_date,
    };

    let result = state
        .admin
        .fix_event_dates(id, &reviewer.username, req.notes.as_deref(), &corrections)
        .await;

    match result {
        Ok(entry) => {
            state.audit.success(
                "admin.review.fix",
                &reviewer.username,
                "review",
                &id.to_string(),
                audit_details! { "event_id" => entry.event_ulid },
            );
            Ok(Json(build_detail(&entry, None)?).into_response())
        }
        Err(err) => {
            state.audit.failure(
                "admin.review.fix",
                &reviewer.username,
                "review",
                &id.to_string(),
                audit_details! { "error" => err },
            );
            Err(map_admin_error(err))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub primary_event_ulid: String,
}

/// POST /api/v1/admin/review-queue/:id/merge
pub async fn merge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(reviewer): Extension<ReviewerIdentity>,
    Json(req): Json<MergeRequest>,
) -> ApiResult<Response> {
    let id = parse_review_id(&id)?;
    if req.primary_event_ulid.is_empty() {
        return Err(ApiError::validation("primary_event_ulid is required"));
    }
    let primary_ulid = normalize_ulid(&req.primary_event_ulid)
        .ok_or_else(|| ApiError::validation("primary_event_ulid is not a valid ULID"))?;

    let result = state
        .admin
        .merge_events(id, &reviewer.username, &primary_ulid)
        .await;

    match result {
        Ok(entry) => {
            state.audit.success(
                "admin.review.merge",
                &reviewer.username,
                "review",
                &id.to_string(),
                audit_details! {
                    "duplicate_event" => entry.event_ulid,
                    "primary_event" => primary_ulid,
                },
            );
            Ok(Json(build_detail(&entry, None)?).into_response())
        }
        Err(err) => {
            state.audit.failure(
                "admin.review.merge",
                &reviewer.username,
                "review",
                &id.to_string(),
                audit_details! {
                    "error" => err,
                    "primary_event" => primary_ulid,
                },
            );
            Err(map_admin_error(err))
        }
    }
}
