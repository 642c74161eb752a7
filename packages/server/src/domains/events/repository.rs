use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domains::federation::models::change_entry::{ChangeAction, ChangeEntry};

use super::admin_service::AdminError;
use super::models::event::Event;
use super::models::not_duplicate::NotDuplicate;
use super::models::review_queue::{ReviewQueueEntry, ReviewQueueFilters, ReviewQueuePage};
use super::models::tombstone::Tombstone;

/// Parameters for merging a duplicate event into its surviving primary.
#[derive(Debug, Clone)]
pub struct MergeParams {
    pub review_id: i64,
    pub duplicate_ulid: String,
    pub primary_ulid: String,
    pub reviewed_by: String,
}

/// Storage seam for the moderation workflow. Every `*_with_review`
/// method applies the event transition and the queue transition in one
/// transaction; a failure in either leaves both untouched.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_entries(&self, filters: &ReviewQueueFilters) -> Result<ReviewQueuePage>;

    async fn get_entry(&self, id: i64) -> Result<Option<ReviewQueueEntry>>;

    async fn approve_event_with_review(
        &self,
        event_ulid: &str,
        review_id: i64,
        reviewed_by: &str,
        notes: Option<&str>,
    ) -> Result<ReviewQueueEntry, AdminError>;

    async fn reject_event_with_review(
        &self,
        event_ulid: &str,
        review_id: i64,
        reviewed_by: &str,
        reason: &str,
    ) -> Result<ReviewQueueEntry, AdminError>;

    async fn fix_and_approve_event_with_review(
        &self,
        event_ulid: &str,
        review_id: i64,
        reviewed_by: &str,
        notes: &str,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<ReviewQueueEntry, AdminError>;

    async fn merge_events_with_review(
        &self,
        params: &MergeParams,
    ) -> Result<ReviewQueueEntry, AdminError>;

    async fn insert_not_duplicate(&self, event_a: &str, event_b: &str, created_by: &str)
        -> Result<()>;
}

#[derive(Clone)]
pub struct PgReviewStore {
    pool: PgPool,
    base_url: String,
}

impl PgReviewStore {
    pub fn new(pool: PgPool, base_url: String) -> Self {
        Self { pool, base_url }
    }

    /// Lock the event row, classifying absence and prior deletion.
    async fn lock_live_event(
        event_ulid: &str,
        conn: &mut PgConnection,
    ) -> Result<Event, AdminError> {
        let event = Event::lock_by_ulid(event_ulid, conn)
            .await?
            .ok_or(AdminError::EventNotFound)?;
        if event.is_deleted() {
            return Err(AdminError::EventDeleted);
        }
        Ok(event)
    }

    /// Classify a guarded queue update that matched no row: the entry
    /// either vanished or was decided by a concurrent reviewer.
    async fn classify_guard_miss(
        review_id: i64,
        conn: &mut PgConnection,
    ) -> Result<AdminError, AdminError> {
        let entry = sqlx::query_as::<_, ReviewQueueEntry>(
            "SELECT * FROM event_review_queue WHERE id = $1",
        )
        .bind(review_id)
        .fetch_optional(conn)
        .await
        .context("refetch review entry after guard miss")?;
        Ok(match entry {
            Some(entry) => AdminError::AlreadyReviewed(entry.status),
            None => AdminError::ReviewNotFound,
        })
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn list_entries(&self, filters: &ReviewQueueFilters) -> Result<ReviewQueuePage> {
        ReviewQueueEntry::list(filters, &self.pool).await
    }

    async fn get_entry(&self, id: i64) -> Result<Option<ReviewQueueEntry>> {
        ReviewQueueEntry::find_by_id(id, &self.pool).await
    }

    async fn approve_event_with_review(
        &self,
        event_ulid: &str,
        review_id: i64,
        reviewed_by: &str,
        notes: Option<&str>,
    ) -> Result<ReviewQueueEntry, AdminError> {
        let mut tx = self.pool.begin().await.context("begin approve tx")?;

        Self::lock_live_event(event_ulid, &mut tx).await?;
        let event = Event::publish(event_ulid, &mut tx)
            .await
            .context("publish event")?;

        let entry = match ReviewQueueEntry::approve(review_id, reviewed_by, notes, &mut tx).await? {
            Some(entry) => entry,
            None => return Err(Self::classify_guard_miss(review_id, &mut tx).await?),
        };

        let snapshot = serde_json::to_value(&event).context("serialize event snapshot")?;
        ChangeEntry::record(event_ulid, ChangeAction::Create, Some(&snapshot), &mut tx).await?;

        tx.commit().await.context("commit approve tx")?;
        Ok(entry)
    }

    async fn reject_event_with_review(
        &self,
        event_ulid: &str,
        review_id: i64,
        reviewed_by: &str,
        reason: &str,
    ) -> Result<ReviewQueueEntry, AdminError> {
        let mut tx = self.pool.begin().await.context("begin reject tx")?;

        let event = Event::lock_by_ulid(event_ulid, &mut tx)
            .await?
            .ok_or(AdminError::EventNotFound)?;
        if !event.is_deleted() {
            Event::soft_delete(event_ulid, &mut tx)
                .await
                .context("soft-delete rejected event")?;
        }

        let payload = Tombstone::event_payload(
            &self.base_url,
            event_ulid,
            Utc::now(),
            Some(reason),
            None,
        );
        Tombstone::insert("event", event_ulid, Some(reason), None, &payload, &mut tx).await?;

        let entry = match ReviewQueueEntry::reject(review_id, reviewed_by, reason, &mut tx).await? {
            Some(entry) => entry,
            None => return Err(Self::classify_guard_miss(review_id, &mut tx).await?),
        };

        ChangeEntry::record(event_ulid, ChangeAction::Delete, None, &mut tx).await?;

        tx.commit().await.context("commit reject tx")?;
        Ok(entry)
    }

    async fn fix_and_approve_event_with_review(
        &self,
        event_ulid: &str,
        review_id: i64,
        reviewed_by: &str,
        notes: &str,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<ReviewQueueEntry, AdminError> {
        let mut tx = self.pool.begin().await.context("begin fix tx")?;

        Self::lock_live_event(event_ulid, &mut tx).await?;
        let event = Event::update_occurrence(event_ulid, start_time, end_time, &mut tx)
            .await
            .context("apply date corrections")?;

        // Corrections may combine with stored dates, so check the result
        if let (Some(start), Some(end)) = (event.start_time, event.end_time) {
            if end < start {
                return Err(AdminError::InvalidDates(
                    "corrected endDate precedes startDate".to_string(),
                ));
            }
        }

        let event = Event::publish(event_ulid, &mut tx)
            .await
            .context("publish fixed event")?;

        let entry =
            match ReviewQueueEntry::approve(review_id, reviewed_by, Some(notes), &mut tx).await? {
                Some(entry) => entry,
                None => return Err(Self::classify_guard_miss(review_id, &mut tx).await?),
            };

        let snapshot = serde_json::to_value(&event).context("serialize event snapshot")?;
        ChangeEntry::record(event_ulid, ChangeAction::Create, Some(&snapshot), &mut tx).await?;

        tx.commit().await.context("commit fix tx")?;
        Ok(entry)
    }

    async fn merge_events_with_review(
        &self,
        params: &MergeParams,
    ) -> Result<ReviewQueueEntry, AdminError> {
        let mut tx = self.pool.begin().await.context("begin merge tx")?;

        Self::lock_live_event(&params.primary_ulid, &mut tx).await?;
        Event::lock_by_ulid(&params.duplicate_ulid, &mut tx)
            .await?
            .ok_or(AdminError::EventNotFound)?;

        let primary = Event::gap_fill_from(&params.primary_ulid, &params.duplicate_ulid, &mut tx)
            .await
            .context("gap-fill primary event")?;
        Event::mark_merged_into(&params.duplicate_ulid, &params.primary_ulid, &mut tx)
            .await
            .context("retire duplicate event")?;

        let payload = Tombstone::event_payload(
            &self.base_url,
            &params.duplicate_ulid,
            Utc::now(),
            Some("Merged as duplicate"),
            Some(&params.primary_ulid),
        );
        Tombstone::insert(
            "event",
            &params.duplicate_ulid,
            Some("Merged as duplicate"),
            Some(&params.primary_ulid),
            &payload,
            &mut tx,
        )
        .await?;

        let entry = match ReviewQueueEntry::mark_merged(
            params.review_id,
            &params.reviewed_by,
            &params.primary_ulid,
            &mut tx,
        )
        .await?
        {
            Some(entry) => entry,
            None => return Err(Self::classify_guard_miss(params.review_id, &mut tx).await?),
        };

        let snapshot = serde_json::to_value(&primary).context("serialize primary snapshot")?;
        ChangeEntry::record(&params.duplicate_ulid, ChangeAction::Delete, None, &mut tx).await?;
        ChangeEntry::record(
            &params.primary_ulid,
            ChangeAction::Update,
            Some(&snapshot),
            &mut tx,
        )
        .await?;

        tx.commit().await.context("commit merge tx")?;
        Ok(entry)
    }

    async fn insert_not_duplicate(
        &self,
        event_a: &str,
        event_b: &str,
        created_by: &str,
    ) -> Result<()> {
        NotDuplicate::insert(event_a, event_b, created_by, &self.pool).await
    }
}
