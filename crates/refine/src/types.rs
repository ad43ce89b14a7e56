//! Data model for the refinement stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status carried by an enriched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum RefinedStatus {
    Enriched,
}

/// Cleaned contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    /// Lower-cased; empty when the raw value was not email-shaped.
    pub email: String,
    /// Digits only, keeping a leading `+`.
    pub phone: String,
    pub company: String,
}

/// Lead qualification fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadDetails {
    /// Defaults to "Unknown" when the CRM sent nothing.
    pub source: String,
    pub campaign: String,
    pub lead_score: f64,
    /// Resolved owner, or "Unassigned".
    pub owner: String,
}

/// The cleaned, owner-resolved record produced by refinement.
///
/// Written at most logically once per lead: redelivery recomputes
/// equivalent content from the same immutable raw record and overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedLead {
    pub lead_id: String,
    pub captured_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
    pub status: RefinedStatus,
    pub contact: Contact,
    pub lead_details: LeadDetails,
    /// Verbatim copy of the raw payload for audit.
    pub original_payload: Map<String, Value>,
}

/// Terminal failure taxonomy for permanently failed leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ReasonCode {
    /// Raw record absent (or unreadable) at refinement time. Should not
    /// occur under correct intake behavior; logged loudly as a
    /// cross-component invariant violation.
    RawMissing,
    LookupNotFound,
    LookupForbidden,
    LookupRetriesExhausted,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReasonCode::RawMissing => "RAW_MISSING",
            ReasonCode::LookupNotFound => "LOOKUP_NOT_FOUND",
            ReasonCode::LookupForbidden => "LOOKUP_FORBIDDEN",
            ReasonCode::LookupRetriesExhausted => "LOOKUP_RETRIES_EXHAUSTED",
        };
        f.write_str(label)
    }
}

/// Advisory artifact written for a permanent failure.
///
/// A later successful run may coexist with a stale error record; readers
/// must treat the enriched record as authoritative once it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub lead_id: String,
    pub failed_at: DateTime<Utc>,
    pub reason_code: ReasonCode,
    pub detail: String,
    /// Object key of the raw record this failure refers to.
    pub raw_reference: String,
}

/// What the worker should do with the queue delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Remove the message; the lead reached a terminal state durably.
    Ack,
    /// Abandon the delivery so the queue redelivers.
    Retry,
}

/// Terminal-or-retry outcome of processing one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The enriched record was durably written.
    Enriched,
    /// A permanent failure was durably recorded.
    FailedPermanent(ReasonCode),
    /// Transient trouble; the delivery is abandoned for redelivery.
    Retry,
}

impl Outcome {
    pub fn disposition(&self) -> Disposition {
        match self {
            Outcome::Enriched | Outcome::FailedPermanent(_) => Disposition::Ack,
            Outcome::Retry => Disposition::Retry,
        }
    }
}

/// Per-message result within a batch; items are independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub lead_id: String,
    pub outcome: Outcome,
}
