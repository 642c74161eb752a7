// Mock stores for tests - call-recording implementations of the storage
// seams, so services and routers can be exercised without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use super::auth::api_key::{hash_key, ApiKey, ApiKeyStore, KEY_PREFIX_LEN};
use super::events::admin_service::AdminError;
use super::events::models::event::Event;
use super::events::models::review_queue::{
    ReviewQueueEntry, ReviewQueueFilters, ReviewQueuePage,
};
use super::events::models::tombstone::Tombstone;
use super::events::repository::{MergeParams, ReviewStore};
use super::federation::models::change_entry::{ChangeEntry, ChangeStore, ListChangesQuery};
use super::organizations::Organization;
use super::places::Place;
use super::users::models::admin_user::{AdminUser, ListUsersFilters, NewUser, UserRole};
use super::users::service::UserStore;
use crate::domains::linked_data::store::DirectoryStore;

// =============================================================================
// Mock Review Store
// =============================================================================

#[derive(Debug, Clone)]
pub struct ApproveCall {
    pub event_ulid: String,
    pub review_id: i64,
    pub reviewed_by: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RejectCall {
    pub event_ulid: String,
    pub review_id: i64,
    pub reviewed_by: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct FixCall {
    pub event_ulid: String,
    pub review_id: i64,
    pub reviewed_by: String,
    pub notes: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MockReviewStore {
    entries: Mutex<HashMap<i64, ReviewQueueEntry>>,
    approve_calls: Mutex<Vec<ApproveCall>>,
    reject_calls: Mutex<Vec<RejectCall>>,
    fix_calls: Mutex<Vec<FixCall>>,
    merge_calls: Mutex<Vec<MergeParams>>,
    not_duplicate_calls: Mutex<Vec<(String, String, String)>>,
    fail_not_duplicates: Mutex<bool>,
}

impl MockReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimal queue entry for tests
    pub fn entry(id: i64, event_ulid: &str, status: &str) -> ReviewQueueEntry {
        ReviewQueueEntry {
            id,
            event_ulid: event_ulid.to_string(),
            event_name: Some(format!("Event {id}")),
            event_start_time: None,
            event_end_time: None,
            original_payload: json!({}),
            normalized_payload: json!({}),
            warnings: JsonValue::Null,
            status: status.to_string(),
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            rejection_reason: None,
            merged_into: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn push_entry(&self, entry: ReviewQueueEntry) {
        self.entries.lock().unwrap().insert(entry.id, entry);
    }

    pub fn fail_not_duplicates(&self) {
        *self.fail_not_duplicates.lock().unwrap() = true;
    }

    pub fn approve_calls(&self) -> Vec<ApproveCall> {
        self.approve_calls.lock().unwrap().clone()
    }

    pub fn reject_calls(&self) -> Vec<RejectCall> {
        self.reject_calls.lock().unwrap().clone()
    }

    pub fn fix_calls(&self) -> Vec<FixCall> {
        self.fix_calls.lock().unwrap().clone()
    }

    pub fn merge_calls(&self) -> Vec<MergeParams> {
        self.merge_calls.lock().unwrap().clone()
    }

    pub fn not_duplicate_calls(&self) -> Vec<(String, String, String)> {
        self.not_duplicate_calls.lock().unwrap().clone()
    }

    fn transition(
        &self,
        review_id: i64,
        apply: impl FnOnce(&mut ReviewQueueEntry),
    ) -> Result<ReviewQueueEntry, AdminError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(&review_id).ok_or(AdminError::ReviewNotFound)?;
        if entry.status != "pending" {
            return Err(AdminError::AlreadyReviewed(entry.status.clone()));
        }
        apply(entry);
        entry.reviewed_at = Some(Utc::now());
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}

#[async_trait]
impl ReviewStore for MockReviewStore {
    async fn list_entries(&self, filters: &ReviewQueueFilters) -> Result<ReviewQueuePage> {
        let entries = self.entries.lock().unwrap();
        let mut matching: Vec<ReviewQueueEntry> = entries
            .values()
            .filter(|e| e.status == filters.status.as_str())
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.id);
        let total = matching.len() as i64;

        if let Some(cursor) = filters.cursor {
            matching.retain(|e| e.id > cursor);
        }
        let next_cursor = if matching.len() as i64 > filters.limit {
            matching.truncate(filters.limit as usize);
            matching.last().map(|e| e.id)
        } else {
            None
        };

        Ok(ReviewQueuePage {
            entries: matching,
            total,
            next_cursor,
        })
    }

    async fn get_entry(&self, id: i64) -> Result<Option<ReviewQueueEntry>> {
        Ok(self.entries.lock().unwrap().get(&id).cloned())
    }

    async fn approve_event_with_review(
        &self,
        event_ulid: &str,
        review_id: i64,
        reviewed_by: &str,
        notes: Option<&str>,
    ) -> Result<ReviewQueueEntry, AdminError> {
        self.approve_calls.lock().unwrap().push(ApproveCall {
            event_ulid: event_ulid.to_string(),
            review_id,
            reviewed_by: reviewed_by.to_string(),
            notes: notes.map(str::to_string),
        });
        self.transition(review_id, |entry| {
            entry.status = "approved".to_string();
            entry.reviewed_by = Some(reviewed_by.to_string());
            entry.review_notes = notes.map(str::to_string);
        })
    }

    async fn reject_event_with_review(
        &self,
        event_ulid: &str,
        review_id: i64,
        reviewed_by: &str,
        reason: &str,
    ) -> Result<ReviewQueueEntry, AdminError> {
        self.reject_calls.lock().unwrap().push(RejectCall {
            event_ulid: event_ulid.to_string(),
            review_id,
            reviewed_by: reviewed_by.to_string(),
            reason: reason.to_string(),
        });
        self.transition(review_id, |entry| {
            entry.status = "rejected".to_string();
            entry.reviewed_by = Some(reviewed_by.to_string());
            entry.rejection_reason = Some(reason.to_string());
        })
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
        self.fix_calls.lock().unwrap().push(FixCall {
            event_ulid: event_ulid.to_string(),
            review_id,
            reviewed_by: reviewed_by.to_string(),
            notes: notes.to_string(),
            start_time,
            end_time,
        });
        self.transition(review_id, |entry| {
            entry.status = "approved".to_string();
            entry.reviewed_by = Some(reviewed_by.to_string());
            entry.review_notes = Some(notes.to_string());
            if start_time.is_some() {
                entry.event_start_time = start_time;
            }
            if end_time.is_some() {
                entry.event_end_time = end_time;
            }
        })
    }

    async fn merge_events_with_review(
        &self,
        params: &MergeParams,
    ) -> Result<ReviewQueueEntry, AdminError> {
        self.merge_calls.lock().unwrap().push(params.clone());
        self.transition(params.review_id, |entry| {
            entry.status = "merged".to_string();
            entry.reviewed_by = Some(params.reviewed_by.clone());
            entry.merged_into = Some(params.primary_ulid.clone());
        })
    }

    async fn insert_not_duplicate(
        &self,
        event_a: &str,
        event_b: &str,
        created_by: &str,
    ) -> Result<()> {
        if *self.fail_not_duplicates.lock().unwrap() {
            return Err(anyhow!("not-duplicate insert failed"));
        }
        self.not_duplicate_calls.lock().unwrap().push((
            event_a.to_string(),
            event_b.to_string(),
            created_by.to_string(),
        ));
        Ok(())
    }
}

// =============================================================================
// Mock Change Store
// =============================================================================

#[derive(Default)]
pub struct MockChangeStore {
    entries: Mutex<Vec<ChangeEntry>>,
}

impl MockChangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_change(&self, entry: ChangeEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn change(seq: i64, event_ulid: &str, action: &str) -> ChangeEntry {
        ChangeEntry {
            sequence_number: seq,
            event_ulid: event_ulid.to_string(),
            action: action.to_string(),
            snapshot: None,
            changed_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ChangeStore for MockChangeStore {
    async fn list_changes(&self, query: &ListChangesQuery) -> Result<Vec<ChangeEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.sequence_number > query.after_sequence)
            .filter(|e| query.since.map_or(true, |since| e.changed_at >= since))
            .filter(|e| query.action.map_or(true, |a| e.action == a.as_str()))
            .take(query.limit as usize)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Mock User Store
// =============================================================================

#[derive(Default)]
pub struct MockUserStore {
    users: Mutex<Vec<AdminUser>>,
}

impl MockUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(username: &str, email: &str, role: &str) -> AdminUser {
        AdminUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            is_active: false,
            last_login_at: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn push_user(&self, user: AdminUser) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn list(&self, filters: &ListUsersFilters) -> Result<(Vec<AdminUser>, i64)> {
        let users = self.users.lock().unwrap();
        let matching: Vec<AdminUser> = users
            .iter()
            .filter(|u| u.deleted_at.is_none())
            .filter(|u| filters.is_active.map_or(true, |a| u.is_active == a))
            .filter(|u| filters.role.map_or(true, |r| u.role == r.as_str()))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filters.offset as usize)
            .take(filters.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn insert(&self, new_user: &NewUser) -> Result<AdminUser> {
        let user = AdminUser {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            role: new_user.role.as_str().to_string(),
            is_active: false,
            last_login_at: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
        role: UserRole,
    ) -> Result<Option<AdminUser>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
        else {
            return Ok(None);
        };
        user.username = username.to_string();
        user.email = email.to_string();
        user.role = role.as_str().to_string();
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<AdminUser>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
        else {
            return Ok(None);
        };
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
        else {
            return Ok(false);
        };
        user.deleted_at = Some(Utc::now());
        user.is_active = false;
        Ok(true)
    }
}

// =============================================================================
// Mock API Key Store
// =============================================================================

#[derive(Default)]
pub struct MockApiKeyStore {
    keys: Mutex<Vec<ApiKey>>,
    touched: Mutex<Vec<Uuid>>,
}

impl MockApiKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stored key from its secret
    pub fn key(
        name: &str,
        secret: &str,
        is_active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            name: name.to_string(),
            prefix: secret[..KEY_PREFIX_LEN].to_string(),
            key_hash: hash_key(secret),
            is_active,
            expires_at,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn push_key(&self, key: ApiKey) {
        self.keys.lock().unwrap().push(key);
    }

    pub fn touched(&self) -> Vec<Uuid> {
        self.touched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiKeyStore for MockApiKeyStore {
    async fn list(&self) -> Result<Vec<ApiKey>> {
        Ok(self.keys.lock().unwrap().clone())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .iter()
            .find(|k| k.prefix == prefix)
            .cloned())
    }

    async fn insert(
        &self,
        name: &str,
        prefix: &str,
        key_hash: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiKey> {
        let key = ApiKey {
            id: Uuid::new_v4(),
            name: name.to_string(),
            prefix: prefix.to_string(),
            key_hash: key_hash.to_string(),
            is_active: true,
            expires_at,
            last_used_at: None,
            created_at: Utc::now(),
        };
        self.keys.lock().unwrap().push(key.clone());
        Ok(key)
    }

    async fn revoke(&self, id: Uuid) -> Result<bool> {
        let mut keys = self.keys.lock().unwrap();
        let Some(key) = keys.iter_mut().find(|k| k.id == id) else {
            return Ok(false);
        };
        key.is_active = false;
        Ok(true)
    }

    async fn touch_last_used(&self, id: Uuid) -> Result<()> {
        self.touched.lock().unwrap().push(id);
        let mut keys = self.keys.lock().unwrap();
        if let Some(key) = keys.iter_mut().find(|k| k.id == id) {
            key.last_used_at = Some(Utc::now());
        }
        Ok(())
    }
}

// =============================================================================
// Mock Directory Store
// =============================================================================

#[derive(Default)]
pub struct MockDirectoryStore {
    events: Mutex<HashMap<String, Event>>,
    places: Mutex<HashMap<String, Place>>,
    organizations: Mutex<HashMap<String, Organization>>,
    tombstones: Mutex<HashMap<(String, String), Tombstone>>,
}

impl MockDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&self, event: Event) {
        self.events.lock().unwrap().insert(event.ulid.clone(), event);
    }

    pub fn push_place(&self, place: Place) {
        self.places.lock().unwrap().insert(place.ulid.clone(), place);
    }

    pub fn push_organization(&self, org: Organization) {
        self.organizations
            .lock()
            .unwrap()
            .insert(org.ulid.clone(), org);
    }

    pub fn push_tombstone(&self, tombstone: Tombstone) {
        self.tombstones.lock().unwrap().insert(
            (tombstone.entity_type.clone(), tombstone.entity_ulid.clone()),
            tombstone,
        );
    }
}

#[async_trait]
impl DirectoryStore for MockDirectoryStore {
    async fn find_event(&self, ulid: &str) -> Result<Option<Event>> {
        Ok(self.events.lock().unwrap().get(ulid).cloned())
    }

    async fn find_place(&self, ulid: &str) -> Result<Option<Place>> {
        Ok(self.places.lock().unwrap().get(ulid).cloned())
    }

    async fn find_organization(&self, ulid: &str) -> Result<Option<Organization>> {
        Ok(self.organizations.lock().unwrap().get(ulid).cloned())
    }

    async fn find_tombstone(&self, entity_type: &str, ulid: &str) -> Result<Option<Tombstone>> {
        Ok(self
            .tombstones
            .lock()
            .unwrap()
            .get(&(entity_type.to_string(), ulid.to_string()))
            .cloned())
    }
}
