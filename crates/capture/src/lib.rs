//! Leadflow capture stage.
//!
//! This is where CRM events enter the pipeline. We take the opaque webhook
//! payload, validate the fields the pipeline depends on, and produce the
//! immutable raw [`LeadEvent`] that gets written to the object store and
//! referenced from the delay queue.
//!
//! ## What we do here
//!
//! - **Validate required fields** — a name-like identifier and an
//!   email-like string at minimum; rejects with a typed [`CaptureError`]
//!   otherwise, so nothing partial is ever written.
//! - **Generate IDs** — the caller's `lead_id` is honored when supplied;
//!   otherwise intake mints a UUIDv4.
//! - **Stamp `received_at`** — which also selects the record's day
//!   partition in the object store.
//! - **Leave the payload alone** — cleaning happens at refinement, after
//!   the delay window; the raw record is a verbatim snapshot.
//!
//! ## Main entry point
//!
//! Call [`capture_event`] with the inbound JSON and a [`CaptureConfig`],
//! get back a [`LeadEvent`]. Errors are typed so ingress adapters can map
//! them to precise client responses.
//!
//! ## Example
//!
//! ```
//! use capture::{capture_event, CaptureConfig};
//!
//! let payload = serde_json::json!({
//!     "name": "Jane Smith",
//!     "email": "Jane@Test.com",
//!     "source": "webinar",
//! });
//!
//! let event = capture_event(payload, &CaptureConfig::default()).unwrap();
//! assert!(!event.lead_id.is_empty());
//! assert_eq!(event.payload_str("email"), Some("Jane@Test.com"));
//! ```

use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn, Level};
use uuid::Uuid;

mod config;
mod error;
mod fields;
mod types;

pub use crate::config::{CaptureConfig, RequiredField};
pub use crate::error::CaptureError;
pub use crate::fields::{is_email_like, sanitize};
pub use crate::types::{CaptureReceipt, LeadEvent, LeadStatus};

/// Validate an inbound CRM event and build the raw lead record.
///
/// Pure: no I/O happens here. The caller (the pipeline context) is
/// responsible for the raw write and the delayed enqueue, in that order.
pub fn capture_event(payload: Value, cfg: &CaptureConfig) -> Result<LeadEvent, CaptureError> {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "capture.event");
    let _guard = span.enter();

    match capture_inner(payload, cfg) {
        Ok(event) => {
            let elapsed_micros = start.elapsed().as_micros();
            info!(
                lead_id = %event.lead_id,
                field_count = event.payload.len(),
                elapsed_micros,
                "capture_success"
            );
            Ok(event)
        }
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(error = %err, elapsed_micros, "capture_failure");
            Err(err)
        }
    }
}

fn capture_inner(payload: Value, cfg: &CaptureConfig) -> Result<LeadEvent, CaptureError> {
    let map = match payload {
        Value::Object(map) => map,
        _ => return Err(CaptureError::NotAnObject),
    };

    // Reject oversized payloads before any field inspection.
    if let Some(limit) = cfg.max_payload_bytes {
        let len = serde_json::to_vec(&map)
            .map_err(|err| CaptureError::Unserializable(err.to_string()))?
            .len();
        if len > limit {
            return Err(CaptureError::PayloadTooLarge(format!(
                "payload size {len} exceeds limit of {limit}"
            )));
        }
    }

    for field in &cfg.required_fields {
        let present = map
            .get(field.key())
            .and_then(Value::as_str)
            .and_then(|s| fields::sanitize(s, cfg.strip_control_chars))
            .is_some();
        if !present {
            return Err(CaptureError::MissingField(field.key().to_string()));
        }
    }

    // The email shape is checked whenever an email is present, required or
    // not, so a malformed address never reaches the queue.
    if let Some(raw_email) = map.get("email").and_then(Value::as_str) {
        if let Some(email) = fields::sanitize(raw_email, cfg.strip_control_chars) {
            if !fields::is_email_like(&email) {
                return Err(CaptureError::InvalidEmail(email));
            }
        }
    }

    let lead_id = map
        .get("lead_id")
        .and_then(Value::as_str)
        .and_then(|s| fields::sanitize(s, cfg.strip_control_chars))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Ok(LeadEvent {
        lead_id,
        received_at: chrono::Utc::now(),
        status: LeadStatus::Captured,
        payload: map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_payload() -> Value {
        serde_json::json!({
            "name": "Jane Smith",
            "email": "Jane@Test.com",
            "phone": "+1 (555) 012-3456",
            "company": "Acme",
            "source": "webinar",
        })
    }

    #[test]
    fn capture_accepts_valid_event() {
        let event = capture_event(base_payload(), &CaptureConfig::default())
            .expect("capture should succeed");
        assert_eq!(event.status, LeadStatus::Captured);
        assert!(!event.lead_id.is_empty());
        // Payload is a verbatim snapshot, not cleaned.
        assert_eq!(event.payload_str("email"), Some("Jane@Test.com"));
    }

    #[test]
    fn capture_rejects_missing_name() {
        let mut payload = base_payload();
        payload.as_object_mut().unwrap().remove("name");

        let res = capture_event(payload, &CaptureConfig::default());
        assert_eq!(res, Err(CaptureError::MissingField("name".into())));
    }

    #[test]
    fn capture_rejects_whitespace_only_name() {
        let mut payload = base_payload();
        payload["name"] = Value::String("   ".into());

        let res = capture_event(payload, &CaptureConfig::default());
        assert_eq!(res, Err(CaptureError::MissingField("name".into())));
    }

    #[test]
    fn capture_rejects_missing_email() {
        let mut payload = base_payload();
        payload.as_object_mut().unwrap().remove("email");

        let res = capture_event(payload, &CaptureConfig::default());
        assert_eq!(res, Err(CaptureError::MissingField("email".into())));
    }

    #[test]
    fn capture_rejects_malformed_email() {
        let mut payload = base_payload();
        payload["email"] = Value::String("jane-at-test".into());

        let res = capture_event(payload, &CaptureConfig::default());
        assert!(matches!(res, Err(CaptureError::InvalidEmail(_))));
    }

    #[test]
    fn email_shape_checked_even_when_not_required() {
        let cfg = CaptureConfig {
            required_fields: vec![RequiredField::Name],
            ..Default::default()
        };
        let mut payload = base_payload();
        payload["email"] = Value::String("garbage".into());

        let res = capture_event(payload, &cfg);
        assert!(matches!(res, Err(CaptureError::InvalidEmail(_))));
    }

    #[test]
    fn capture_rejects_non_object_payload() {
        let res = capture_event(Value::String("hello".into()), &CaptureConfig::default());
        assert_eq!(res, Err(CaptureError::NotAnObject));
    }

    #[test]
    fn caller_supplied_lead_id_is_honored() {
        let mut payload = base_payload();
        payload
            .as_object_mut()
            .unwrap()
            .insert("lead_id".into(), Value::String("crm-lead-77".into()));

        let event = capture_event(payload, &CaptureConfig::default()).unwrap();
        assert_eq!(event.lead_id, "crm-lead-77");
    }

    #[test]
    fn generated_lead_ids_are_unique() {
        let a = capture_event(base_payload(), &CaptureConfig::default()).unwrap();
        let b = capture_event(base_payload(), &CaptureConfig::default()).unwrap();
        // Duplicate inbound content is deliberately not deduplicated; each
        // capture mints its own identity.
        assert_ne!(a.lead_id, b.lead_id);
    }

    #[test]
    fn control_characters_stripped_before_validation() {
        let mut payload = base_payload();
        payload["name"] = Value::String("\u{0007}\u{0003}".into());

        let res = capture_event(payload, &CaptureConfig::default());
        assert_eq!(res, Err(CaptureError::MissingField("name".into())));
    }

    #[test]
    fn payload_size_limit_enforced() {
        let cfg = CaptureConfig {
            max_payload_bytes: Some(64),
            ..Default::default()
        };
        let mut payload = base_payload();
        payload
            .as_object_mut()
            .unwrap()
            .insert("notes".into(), Value::String("x".repeat(256)));

        let res = capture_event(payload, &cfg);
        assert!(matches!(res, Err(CaptureError::PayloadTooLarge(_))));
    }
}
