use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use super::changes::duplicate_match_ulids;
use super::models::review_queue::{ReviewQueueEntry, ReviewQueueFilters, ReviewQueuePage};
use super::repository::{MergeParams, ReviewStore};

/// Errors a moderation operation can surface. Everything except
/// `Database` maps to a 4xx problem document.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Review entry not found")]
    ReviewNotFound,
    #[error("Review entry has already been {0}")]
    AlreadyReviewed(String),
    #[error("Event not found")]
    EventNotFound,
    #[error("Event has been deleted")]
    EventDeleted,
    #[error("Cannot merge event into itself")]
    CannotMergeSameEvent,
    #[error("{0}")]
    InvalidDates(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Outcome of recording not-duplicate pairs after a decision. The
/// recording is advisory: failures are reported here and logged, never
/// propagated, because the moderation decision already committed.
#[derive(Debug, Default, Serialize)]
pub struct NotDuplicateOutcome {
    pub recorded: Vec<String>,
    pub failed: Vec<String>,
}

impl NotDuplicateOutcome {
    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty() && self.failed.is_empty()
    }
}

/// Date corrections supplied with a fix request.
#[derive(Debug, Clone, Default)]
pub struct DateCorrections {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Moderation workflow over the review queue: validates requests,
/// gates on pending status, and delegates the atomic state transitions
/// to the store.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn ReviewStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    pub async fn list_entries(
        &self,
        filters: &ReviewQueueFilters,
    ) -> Result<ReviewQueuePage, AdminError> {
        Ok(self.store.list_entries(filters).await?)
    }

    pub async fn get_entry(&self, id: i64) -> Result<ReviewQueueEntry, AdminError> {
        self.store
            .get_entry(id)
            .await?
            .ok_or(AdminError::ReviewNotFound)
    }

    /// Fetch an entry and refuse to act unless it is still pending.
    async fn get_pending_entry(&self, id: i64) -> Result<ReviewQueueEntry, AdminError> {
        let entry = self.get_entry(id).await?;
        if !entry.is_pending() {
            return Err(AdminError::AlreadyReviewed(entry.status));
        }
        Ok(entry)
    }

    /// Approve a pending entry, publishing its event. When the reviewer
    /// opts in, duplicate-warning matches are recorded as distinct
    /// events after the decision commits.
    pub async fn approve_event(
        &self,
        review_id: i64,
        reviewed_by: &str,
        notes: Option<&str>,
        mark_not_duplicate: bool,
    ) -> Result<(ReviewQueueEntry, NotDuplicateOutcome), AdminError> {
        let entry = self.get_pending_entry(review_id).await?;

        let updated = self
            .store
            .approve_event_with_review(&entry.event_ulid, review_id, reviewed_by, notes)
            .await?;

        let outcome = if mark_not_duplicate {
            self.record_not_duplicates(&updated, reviewed_by).await
        } else {
            NotDuplicateOutcome::default()
        };

        Ok((updated, outcome))
    }

    /// Reject a pending entry. The event is soft-deleted, tombstoned
    /// with the reason, and its duplicate-warning matches are always
    /// recorded as distinct so re-ingestion does not re-flag them.
    pub async fn reject_event(
        &self,
        review_id: i64,
        reviewed_by: &str,
        reason: &str,
    ) -> Result<(ReviewQueueEntry, NotDuplicateOutcome), AdminError> {
        if reason.trim().is_empty() {
            return Err(AdminError::InvalidRequest(
                "Rejection reason is required".to_string(),
            ));
        }

        let entry = self.get_pending_entry(review_id).await?;

        let updated = self
            .store
            .reject_event_with_review(&entry.event_ulid, review_id, reviewed_by, reason)
            .await?;

        let outcome = self.record_not_duplicates(&updated, reviewed_by).await;
        Ok((updated, outcome))
    }

    /// Apply date corrections and approve in one transaction. At least
    /// one correction is required; the notes record exactly what was
    /// applied.
    pub async fn fix_event_dates(
        &self,
        review_id: i64,
        reviewed_by: &str,
        notes: Option<&str>,
        corrections: &DateCorrections,
    ) -> Result<ReviewQueueEntry, AdminError> {
        if corrections.start_time.is_none() && corrections.end_time.is_none() {
            return Err(AdminError::InvalidRequest(
                "At least one correction is required".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (corrections.start_time, corrections.end_time) {
            if end < start {
                return Err(AdminError::InvalidDates(
                    "endDate must not precede startDate".to_string(),
                ));
            }
        }

        let entry = self.get_pending_entry(review_id).await?;
        let notes = Self::fix_notes(notes, corrections);

        let updated = self
            .store
            .fix_and_approve_event_with_review(
                &entry.event_ulid,
                review_id,
                reviewed_by,
                &notes,
                corrections.start_time,
                corrections.end_time,
            )
            .await?;
        Ok(updated)
    }

    /// Merge the entry's event into a surviving primary. The duplicate
    /// is retired behind a tombstone pointing at the survivor.
    pub async fn merge_events(
        &self,
        review_id: i64,
        reviewed_by: &str,
        primary_ulid: &str,
    ) -> Result<ReviewQueueEntry, AdminError> {
        let entry = self.get_pending_entry(review_id).await?;

        if entry.event_ulid == primary_ulid {
            return Err(AdminError::CannotMergeSameEvent);
        }

        let updated = self
            .store
            .merge_events_with_review(&MergeParams {
                review_id,
                duplicate_ulid: entry.event_ulid.clone(),
                primary_ulid: primary_ulid.to_string(),
                reviewed_by: reviewed_by.to_string(),
            })
            .await?;
        Ok(updated)
    }

    /// Record every duplicate-warning match on the entry as a distinct
    /// event. Best effort: individual failures are logged and reported
    /// in the outcome.
    pub async fn record_not_duplicates(
        &self,
        entry: &ReviewQueueEntry,
        reviewed_by: &str,
    ) -> NotDuplicateOutcome {
        let warnings = match entry.parsed_warnings() {
            Ok(warnings) => warnings,
            Err(err) => {
                tracing::warn!(
                    review_id = entry.id,
                    error = %err,
                    "record not-duplicates: failed to parse warnings"
                );
                return NotDuplicateOutcome::default();
            }
        };

        let mut outcome = NotDuplicateOutcome::default();
        for candidate in duplicate_match_ulids(&warnings) {
            match self
                .store
                .insert_not_duplicate(&entry.event_ulid, &candidate, reviewed_by)
                .await
            {
                Ok(()) => outcome.recorded.push(candidate),
                Err(err) => {
                    tracing::warn!(
                        review_id = entry.id,
                        event_ulid = %entry.event_ulid,
                        candidate_ulid = %candidate,
                        error = %err,
                        "record not-duplicates: insert failed"
                    );
                    outcome.failed.push(candidate);
                }
            }
        }
        outcome
    }

    fn fix_notes(notes: Option<&str>, corrections: &DateCorrections) -> String {
        let mut notes = match notes {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => "Manually corrected dates".to_string(),
        };
        if let Some(start) = corrections.start_time {
            notes.push_str(&format!(
                " (startDate: {})",
                start.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        if let Some(end) = corrections.end_time {
            notes.push_str(&format!(
                " (endDate: {})",
                end.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::test_support::MockReviewStore;
    use chrono::TimeZone;
    use serde_json::json;

    const EVENT_ULID: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    const OTHER_ULID: &str = "01BX5ZZKBKACTAV9WEVGEMMVRZ";

    fn service_with(store: MockReviewStore) -> (AdminService, Arc<MockReviewStore>) {
        let store = Arc::new(store);
        (AdminService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn approve_refuses_non_pending_entry() {
        let store = MockReviewStore::new();
        store.push_entry(MockReviewStore::entry(7, EVENT_ULID, "approved"));
        let (service, store) = service_with(store);

        let err = service
            .approve_event(7, "alice", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::AlreadyReviewed(ref s) if s == "approved"));
        assert!(store.approve_calls().is_empty());
    }

    #[tokio::test]
    async fn approve_records_not_duplicates_when_opted_in() {
        let store = MockReviewStore::new();
        let mut entry = MockReviewStore::entry(7, EVENT_ULID, "pending");
        entry.warnings = json!([{
            "code": "potential_duplicate",
            "details": { "matches": [{ "ulid": OTHER_ULID }] }
        }]);
        store.push_entry(entry);
        let (service, store) = service_with(store);

        let (updated, outcome) = service
            .approve_event(7, "alice", Some("looks good"), true)
            .await
            .unwrap();
        assert_eq!(updated.status, "approved");
        assert_eq!(outcome.recorded, vec![OTHER_ULID.to_string()]);
        assert_eq!(
            store.not_duplicate_calls(),
            vec![(
                EVENT_ULID.to_string(),
                OTHER_ULID.to_string(),
                "alice".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn approve_skips_not_duplicates_by_default() {
        let store = MockReviewStore::new();
        let mut entry = MockReviewStore::entry(7, EVENT_ULID, "pending");
        entry.warnings = json!([{
            "code": "potential_duplicate",
            "details": { "matches": [{ "ulid": OTHER_ULID }] }
        }]);
        store.push_entry(entry);
        let (service, store) = service_with(store);

        let (_, outcome) = service.approve_event(7, "alice", None, false).await.unwrap();
        assert!(outcome.is_empty());
        assert!(store.not_duplicate_calls().is_empty());
    }

    #[tokio::test]
    async fn reject_requires_a_reason() {
        let store = MockReviewStore::new();
        store.push_entry(MockReviewStore::entry(7, EVENT_ULID, "pending"));
        let (service, store) = service_with(store);

        let err = service.reject_event(7, "alice", "   ").await.unwrap_err();
        assert!(matches!(err, AdminError::InvalidRequest(_)));
        assert!(store.reject_calls().is_empty());
    }

    #[tokio::test]
    async fn reject_always_records_not_duplicates() {
        let store = MockReviewStore::new();
        let mut entry = MockReviewStore::entry(7, EVENT_ULID, "pending");
        entry.warnings = json!([{
            "code": "potential_duplicate",
            "details": { "matches": [{ "ulid": OTHER_ULID }] }
        }]);
        store.push_entry(entry);
        let (service, store) = service_with(store);

        let (updated, outcome) = service.reject_event(7, "alice", "spam").await.unwrap();
        assert_eq!(updated.status, "rejected");
        assert_eq!(outcome.recorded, vec![OTHER_ULID.to_string()]);
        assert_eq!(store.not_duplicate_calls().len(), 1);
    }

    #[tokio::test]
    async fn not_duplicate_failures_are_advisory() {
        let store = MockReviewStore::new();
        let mut entry = MockReviewStore::entry(7, EVENT_ULID, "pending");
        entry.warnings = json!([{
            "code": "potential_duplicate",
            "details": { "matches": [{ "ulid": OTHER_ULID }] }
        }]);
        store.push_entry(entry);
        store.fail_not_duplicates();
        let (service, _) = service_with(store);

        let (updated, outcome) = service.reject_event(7, "alice", "spam").await.unwrap();
        assert_eq!(updated.status, "rejected");
        assert!(outcome.recorded.is_empty());
        assert_eq!(outcome.failed, vec![OTHER_ULID.to_string()]);
    }

    #[tokio::test]
    async fn fix_requires_at_least_one_correction() {
        let store = MockReviewStore::new();
        store.push_entry(MockReviewStore::entry(7, EVENT_ULID, "pending"));
        let (service, store) = service_with(store);

        let err = service
            .fix_event_dates(7, "alice", None, &DateCorrections::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidRequest(_)));
        assert!(store.fix_calls().is_empty());
    }

    #[tokio::test]
    async fn fix_rejects_reversed_corrections() {
        let store = MockReviewStore::new();
        store.push_entry(MockReviewStore::entry(7, EVENT_ULID, "pending"));
        let (service, _) = service_with(store);

        let corrections = DateCorrections {
            start_time: Some(Utc.with_ymd_and_hms(2026, 3, 2, 19, 0, 0).unwrap()),
            end_time: Some(Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap()),
        };
        let err = service
            .fix_event_dates(7, "alice", None, &corrections)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidDates(_)));
    }

    #[tokio::test]
    async fn fix_notes_record_the_applied_corrections() {
        let store = MockReviewStore::new();
        store.push_entry(MockReviewStore::entry(7, EVENT_ULID, "pending"));
        let (service, store) = service_with(store);

        let corrections = DateCorrections {
            start_time: Some(Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap()),
            end_time: None,
        };
        service
            .fix_event_dates(7, "alice", None, &corrections)
            .await
            .unwrap();

        let calls = store.fix_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].notes,
            "Manually corrected dates (startDate: 2026-03-01T19:00:00Z)"
        );
    }

    #[tokio::test]
    async fn merge_rejects_self_merge() {
        let store = MockReviewStore::new();
        store.push_entry(MockReviewStore::entry(7, EVENT_ULID, "pending"));
        let (service, store) = service_with(store);

        let err = service
            .merge_events(7, "alice", EVENT_ULID)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::CannotMergeSameEvent));
        assert!(store.merge_calls().is_empty());
    }

    #[tokio::test]
    async fn merge_passes_both_sides_to_the_store() {
        let store = MockReviewStore::new();
        store.push_entry(MockReviewStore::entry(7, EVENT_ULID, "pending"));
        let (service, store) = service_with(store);

        let updated = service.merge_events(7, "alice", OTHER_ULID).await.unwrap();
        assert_eq!(updated.status, "merged");

        let calls = store.merge_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].duplicate_ulid, EVENT_ULID);
        assert_eq!(calls[0].primary_ulid, OTHER_ULID);
    }

    #[tokio::test]
    async fn missing_entry_is_not_found() {
        let (service, _) = service_with(MockReviewStore::new());
        let err = service
            .approve_event(99, "alice", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::ReviewNotFound));
    }
}
