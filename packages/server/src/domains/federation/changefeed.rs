use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::common::pagination::{decode_change_cursor, encode_change_cursor};

use super::models::change_entry::{ChangeAction, ChangeEntry, ChangeStore, ListChangesQuery};

pub const DEFAULT_CHANGE_FEED_LIMIT: i64 = 100;
pub const MAX_CHANGE_FEED_LIMIT: i64 = 1000;

#[derive(Debug, Error)]
pub enum ChangeFeedError {
    #[error("limit must be between 1 and {MAX_CHANGE_FEED_LIMIT}")]
    InvalidLimit,
    #[error("action must be 'create', 'update', or 'delete'")]
    InvalidAction,
    #[error("invalid cursor")]
    InvalidCursor,
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default)]
pub struct ChangeFeedParams {
    pub after: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub action: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChangeFeedResult {
    /// The position this page was read from, as an opaque cursor.
    pub cursor: String,
    pub changes: Vec<ChangeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Serves the federation change feed: sequence-ordered moderation
/// outcomes with opaque cursors, so peers can resume where they left
/// off.
#[derive(Clone)]
pub struct ChangeFeedService {
    store: Arc<dyn ChangeStore>,
}

impl ChangeFeedService {
    pub fn new(store: Arc<dyn ChangeStore>) -> Self {
        Self { store }
    }

    pub async fn get_changes(
        &self,
        params: ChangeFeedParams,
    ) -> Result<ChangeFeedResult, ChangeFeedError> {
        let limit = params.limit.unwrap_or(DEFAULT_CHANGE_FEED_LIMIT);
        if limit < 1 || limit > MAX_CHANGE_FEED_LIMIT {
            return Err(ChangeFeedError::InvalidLimit);
        }

        let action = match params.action.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(ChangeAction::parse(raw).ok_or(ChangeFeedError::InvalidAction)?),
        };

        let after_sequence = match params.after.as_deref() {
            None | Some("") => 0,
            Some(cursor) => {
                decode_change_cursor(cursor).map_err(|_| ChangeFeedError::InvalidCursor)?
            }
        };

        let query = ListChangesQuery {
            after_sequence,
            since: params.since,
            action,
            // one extra row to detect whether more remain
            limit: limit + 1,
        };

        let mut changes = self.store.list_changes(&query).await?;

        let has_more = changes.len() as i64 > limit;
        if has_more {
            changes.truncate(limit as usize);
        }
        let next_cursor = if has_more {
            changes
                .last()
                .map(|c| encode_change_cursor(c.sequence_number))
        } else {
            None
        };

        Ok(ChangeFeedResult {
            cursor: encode_change_cursor(after_sequence),
            changes,
            next_cursor,
            has_more,
        })
    }
}
