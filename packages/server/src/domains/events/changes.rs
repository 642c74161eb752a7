use serde::Serialize;
use serde_json::Value as JsonValue;

use super::models::review_queue::ValidationWarning;

/// One field the normalizer corrected between the submitted payload and
/// the stored form, surfaced on the review detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeDetail {
    pub field: &'static str,
    pub original: String,
    pub corrected: String,
    pub reason: &'static str,
}

/// Diff the date fields of the submitted payload against the normalized
/// one. Only startDate and endDate are normalized at ingest, so the diff
/// is deliberately narrow.
pub fn calculate_changes(original: &JsonValue, normalized: &JsonValue) -> Vec<ChangeDetail> {
    let mut changes = Vec::new();

    if let (Some(orig_end), Some(norm_end)) = (
        original.get("endDate").and_then(JsonValue::as_str),
        normalized.get("endDate").and_then(JsonValue::as_str),
    ) {
        if orig_end != norm_end {
            changes.push(ChangeDetail {
                field: "endDate",
                original: orig_end.to_string(),
                corrected: norm_end.to_string(),
                reason: "Added 24 hours to fix reversed dates",
            });
        }
    }

    if let (Some(orig_start), Some(norm_start)) = (
        original.get("startDate").and_then(JsonValue::as_str),
        normalized.get("startDate").and_then(JsonValue::as_str),
    ) {
        if orig_start != norm_start {
            changes.push(ChangeDetail {
                field: "startDate",
                original: orig_start.to_string(),
                corrected: norm_start.to_string(),
                reason: "Date normalization",
            });
        }
    }

    changes
}

/// Pull the candidate ULIDs out of potential_duplicate warnings. Entries
/// without a usable `matches` list are skipped rather than treated as
/// errors.
pub fn duplicate_match_ulids(warnings: &[ValidationWarning]) -> Vec<String> {
    let mut ulids = Vec::new();
    for warning in warnings {
        if warning.code != "potential_duplicate" {
            continue;
        }
        let Some(matches) = warning.details.get("matches").and_then(JsonValue::as_array) else {
            continue;
        };
        for m in matches {
            if let Some(ulid) = m.get("ulid").and_then(JsonValue::as_str) {
                if !ulid.is_empty() {
                    ulids.push(ulid.to_string());
                }
            }
        }
    }
    ulids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_end_date_correction() {
        let original = json!({ "startDate": "2026-03-01T19:00:00Z", "endDate": "2026-03-01T17:00:00Z" });
        let normalized =
            json!({ "startDate": "2026-03-01T19:00:00Z", "endDate": "2026-03-02T17:00:00Z" });
        let changes = calculate_changes(&original, &normalized);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "endDate");
        assert_eq!(changes[0].reason, "Added 24 hours to fix reversed dates");
    }

    #[test]
    fn identical_payloads_produce_no_changes() {
        let payload = json!({ "startDate": "2026-03-01T19:00:00Z" });
        assert!(calculate_changes(&payload, &payload).is_empty());
    }

    #[test]
    fn extracts_duplicate_match_ulids() {
        let warnings = vec![
            ValidationWarning {
                code: "missing_end_date".to_string(),
                details: JsonValue::Null,
            },
            ValidationWarning {
                code: "potential_duplicate".to_string(),
                details: json!({ "matches": [
                    { "ulid": "01ARZ3NDEKTSV4RRFFQ69G5FAV", "similarity": 0.92 },
                    { "name": "no ulid, skipped" },
                    { "ulid": "" },
                ] }),
            },
        ];
        assert_eq!(
            duplicate_match_ulids(&warnings),
            vec!["01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string()]
        );
    }

    #[test]
    fn tolerates_malformed_duplicate_details() {
        let warnings = vec![ValidationWarning {
            code: "potential_duplicate".to_string(),
            details: json!({ "matches": "not a list" }),
        }];
        assert!(duplicate_match_ulids(&warnings).is_empty());
    }
}
