//! Field cleaning applied between the raw and enriched records.
//!
//! Cleaning is deterministic over the immutable raw payload: concurrent
//! workers refining the same lead always compute equivalent output, which
//! is what makes the enriched overwrite safe under redelivery.

use capture::is_email_like;
use serde_json::Value;

/// Trim a string-ish payload field. Non-string scalars are rendered the
/// way the CRM would display them; absent and null become empty.
pub fn clean_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Trim, lower-case, and shape-check an email field. A value that is not
/// email-shaped cleans to empty rather than propagating garbage.
pub fn clean_email(value: Option<&Value>) -> String {
    let email = clean_string(value).to_lowercase();
    if is_email_like(&email) {
        email
    } else {
        String::new()
    }
}

/// Normalize a phone field to digits, retaining one leading `+`.
pub fn clean_phone(value: Option<&Value>) -> String {
    let raw = clean_string(value);
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    if raw.starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}
