//! Opaque cursor encoding for paginated endpoints.
//!
//! Cursors are base64url without padding so they can travel in query
//! strings untouched. Change-feed cursors wrap the feed's BIGSERIAL
//! sequence number as `seq_<n>`; review-queue cursors are the plain
//! integer row id. Clients must treat both as opaque strings.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid cursor")]
pub struct InvalidCursor;

/// Encode a change-feed sequence number as an opaque cursor.
pub fn encode_change_cursor(sequence: i64) -> String {
    URL_SAFE_NO_PAD.encode(format!("seq_{}", sequence))
}

/// Decode a change-feed cursor back into a sequence number.
pub fn decode_change_cursor(cursor: &str) -> Result<i64, InvalidCursor> {
    let cursor = cursor.trim();
    if cursor.is_empty() {
        return Err(InvalidCursor);
    }
    let decoded = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| InvalidCursor)?;
    let value = String::from_utf8(decoded).map_err(|_| InvalidCursor)?;
    let seq = value
        .strip_prefix("seq_")
        .ok_or(InvalidCursor)?
        .parse::<i64>()
        .map_err(|_| InvalidCursor)?;
    if seq < 0 {
        return Err(InvalidCursor);
    }
    Ok(seq)
}

/// Parse a review-queue cursor. Anything that is not a positive integer
/// is treated as "no cursor" by callers, so this only validates shape.
pub fn parse_review_cursor(cursor: &str) -> Option<i64> {
    match cursor.trim().parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_cursor_round_trips() {
        let cursor = encode_change_cursor(1000);
        assert_eq!(decode_change_cursor(&cursor), Ok(1000));
    }

    #[test]
    fn change_cursor_rejects_garbage() {
        assert_eq!(decode_change_cursor(""), Err(InvalidCursor));
        assert_eq!(decode_change_cursor("not base64!"), Err(InvalidCursor));
        // Valid base64 but wrong payload
        let bogus = URL_SAFE_NO_PAD.encode("page_2");
        assert_eq!(decode_change_cursor(&bogus), Err(InvalidCursor));
        let negative = URL_SAFE_NO_PAD.encode("seq_-5");
        assert_eq!(decode_change_cursor(&negative), Err(InvalidCursor));
    }

    #[test]
    fn review_cursor_ignores_invalid_values() {
        assert_eq!(parse_review_cursor("42"), Some(42));
        assert_eq!(parse_review_cursor("0"), None);
        assert_eq!(parse_review_cursor("-3"), None);
        assert_eq!(parse_review_cursor("abc"), None);
    }
}
