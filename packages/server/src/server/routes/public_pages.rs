use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value as JsonValue};

use crate::common::{normalize_ulid, ApiError, ApiResult};
use crate::domains::events::Tombstone;
use crate::domains::linked_data::{negotiate, serializer_for, LinkedDataResource};
use crate::server::app::AppState;

/// GET /events/:id with content negotiation
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let ulid = valid_ulid(&id)?;
    let found = state.directory.find_event(&ulid).await?;
    match found {
        Some(event) if !event.is_deleted() => {
            let doc = LinkedDataResource::Event(event).to_json_ld(&state.config.base_url);
            serve(&headers, &doc, StatusCode::OK)
        }
        found => gone_or_missing(&state, &headers, "event", &ulid, found.is_some(), "Event").await,
    }
}

/// GET /places/:id with content negotiation
pub async fn get_place(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let ulid = valid_ulid(&id)?;
    let found = state.directory.find_place(&ulid).await?;
    match found {
        Some(place) if !place.is_deleted() => {
            let doc = LinkedDataResource::Place(place).to_json_ld(&state.config.base_url);
            serve(&headers, &doc, StatusCode::OK)
        }
        found => gone_or_missing(&state, &headers, "place", &ulid, found.is_some(), "Place").await,
    }
}

/// GET /organizations/:id with content negotiation
pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let ulid = valid_ulid(&id)?;
    let found = state.directory.find_organization(&ulid).await?;
    match found {
        Some(org) if !org.is_deleted() => {
            let doc = LinkedDataResource::Organization(org).to_json_ld(&state.config.base_url);
            serve(&headers, &doc, StatusCode::OK)
        }
        found => {
            gone_or_missing(
                &state,
                &headers,
                "organization",
                &ulid,
                found.is_some(),
                "Organization",
            )
            .await
        }
    }
}

fn valid_ulid(raw: &str) -> Result<String, ApiError> {
    normalize_ulid(raw).ok_or_else(|| ApiError::validation("Invalid ULID"))
}

/// The entity is deleted or absent: serve its tombstone if one exists,
/// a bare 410 if it was deleted without one, or 404.
async fn gone_or_missing(
    state: &AppState,
    headers: &HeaderMap,
    entity_type: &str,
    ulid: &str,
    exists_deleted: bool,
    type_name: &str,
) -> ApiResult<Response> {
    match state.directory.find_tombstone(entity_type, ulid).await? {
        Some(tombstone) => serve_tombstone(headers, &tombstone, type_name),
        None if exists_deleted => Err(ApiError::Gone),
        None => Err(ApiError::not_found(format!("{type_name} not found"))),
    }
}

/// Render the JSON-LD document in the negotiated format
fn serve(headers: &HeaderMap, doc: &JsonValue, status: StatusCode) -> ApiResult<Response> {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let serializer = serializer_for(negotiate(accept));
    let body = serializer.render(doc).map_err(ApiError::Internal)?;
    Ok((
        status,
        [(header::CONTENT_TYPE, serializer.content_type())],
        body,
    )
        .into_response())
}

/// 410 Gone with the tombstone document, still content-negotiated so
/// machine clients learn about supersession in their format of choice
fn serve_tombstone(
    headers: &HeaderMap,
    tombstone: &Tombstone,
    type_name: &str,
) -> ApiResult<Response> {
    let mut doc = tombstone.payload.clone();
    if !doc.is_object() {
        doc = json!({ "@type": type_name });
    }
    if let Some(obj) = doc.as_object_mut() {
        obj.entry("sel:tombstone").or_insert(json!(true));
        obj.entry("sel:deletedAt")
            .or_insert_with(|| json!(tombstone.deleted_at.to_rfc3339()));
    }
    serve(headers, &doc, StatusCode::GONE)
}
