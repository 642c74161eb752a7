//! ULID validation at the HTTP boundary.
//!
//! Entity identifiers are ULIDs stored in their canonical 26-character
//! Crockford base32 form. Path parameters are validated and normalized
//! to uppercase before they reach any query.

use ulid::Ulid;

/// Validate a ULID path parameter and return its canonical uppercase form.
pub fn normalize_ulid(value: &str) -> Option<String> {
    let trimmed = value.trim();
    Ulid::from_string(trimmed).ok().map(|u| u.to_string())
}
