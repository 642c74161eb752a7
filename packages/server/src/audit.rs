//! Structured audit trail for admin operations.
//!
//! Every terminal admin action (review decisions, user management, key
//! management) produces one entry, on success and on failure alike. The
//! entries are serialized as JSON and emitted through tracing under the
//! `audit` target so deployments can route them to a dedicated sink.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    /// Stable action identifier, e.g. "admin.review.approve".
    pub action: String,
    /// Authenticated actor (JWT subject) performing the action.
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// "success" or "failure".
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

/// Audit log handle, cheap to clone and share through app state.
#[derive(Debug, Clone, Default)]
pub struct AuditLog;

impl AuditLog {
    pub fn new() -> Self {
        AuditLog
    }

    pub fn success(
        &self,
        action: &str,
        actor: &str,
        resource_type: &str,
        resource_id: &str,
        details: BTreeMap<String, String>,
    ) {
        self.record(AuditEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            actor: actor.to_string(),
            resource_type: Some(resource_type.to_string()),
            resource_id: Some(resource_id.to_string()),
            outcome: "success",
            details,
        });
    }

    pub fn failure(
        &self,
        action: &str,
        actor: &str,
        resource_type: &str,
        resource_id: &str,
        details: BTreeMap<String, String>,
    ) {
        self.record(AuditEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            actor: actor.to_string(),
            resource_type: Some(resource_type.to_string()),
            resource_id: Some(resource_id.to_string()),
            outcome: "failure",
            details,
        });
    }

    fn record(&self, entry: AuditEntry) {
        match serde_json::to_string(&entry) {
            Ok(json) => tracing::info!(target: "audit", entry = %json),
            Err(err) => tracing::error!(error = %err, "failed to serialize audit entry"),
        }
    }
}

/// Convenience for building the `details` map inline.
#[macro_export]
macro_rules! audit_details {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = std::collections::BTreeMap::new();
        $( map.insert($key.to_string(), $value.to_string()); )*
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_serialize_with_stable_fields() {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            action: "admin.review.approve".to_string(),
            actor: "moderator".to_string(),
            resource_type: Some("review".to_string()),
            resource_id: Some("1".to_string()),
            outcome: "success",
            details: audit_details! { "event_id" => "01HTEST" },
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"action\":\"admin.review.approve\""));
        assert!(json.contains("\"outcome\":\"success\""));
        assert!(json.contains("\"event_id\":\"01HTEST\""));
    }
}
