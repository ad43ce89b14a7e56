//! Core data model types for the capture crate.
//!
//! These types represent the inbound CRM event and the immutable raw record
//! it becomes once validated. They are designed to be:
//!
//! - **Serializable**: the raw record is stored verbatim as JSON
//! - **Cloneable**: cheap to clone for pipeline processing
//! - **Comparable**: equality checks support idempotency testing
//!
//! # Lifecycle
//!
//! ```text
//! serde_json::Value (opaque CRM payload)
//!         ↓ capture_event()
//! LeadEvent
//! ├── lead_id: String (caller-supplied or generated UUIDv4)
//! ├── received_at: DateTime<Utc>
//! ├── status: LeadStatus::Captured
//! └── payload: Map<String, Value> (verbatim copy, never mutated)
//! ```
//!
//! The payload is deliberately left untouched at capture time; field
//! cleaning belongs to the refinement stage, which re-reads this record
//! after the delay window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a raw lead record.
///
/// A raw record only ever carries `Captured`; the enriched record produced
/// by refinement carries its own status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum LeadStatus {
    /// The event was validated and durably recorded; refinement is pending.
    Captured,
}

/// The immutable raw record written at capture time.
///
/// Owned exclusively by capture at creation and read-only thereafter: the
/// refinement stage recomputes its output from this record on every
/// (re)delivery, which is what makes redelivery-safe overwrites possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadEvent {
    /// Unique token for this lead. Honored when the caller supplies one,
    /// otherwise generated at intake.
    pub lead_id: String,

    /// Capture timestamp; also selects the day partition of the object key.
    pub received_at: DateTime<Utc>,

    pub status: LeadStatus,

    /// Verbatim key/value map from the CRM. Unrecognized fields ride along
    /// untouched so the enriched record can preserve them for audit.
    pub payload: Map<String, Value>,
}

impl LeadEvent {
    /// Fetch a payload field as a string slice, if present and a string.
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }
}

/// Synchronous capture response returned to the ingress caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureReceipt {
    pub lead_id: String,
}
