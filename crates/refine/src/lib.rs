//! Leadflow refinement stage — the core state machine.
//!
//! Consumes delayed queue messages, re-reads the immutable raw record,
//! cleans the contact fields, resolves the owner, and writes either the
//! enriched record or a permanent-failure artifact. Per lead the states
//! are `PENDING → ENRICHING → {ENRICHED, FAILED_TRANSIENT,
//! FAILED_PERMANENT}`; a transient failure is not observable externally —
//! it surfaces only as a [`Disposition::Retry`] so the queue redelivers.
//!
//! The engine is built on three invariants:
//!
//! - **Idempotency**: enriched and error writes are last-writer-wins
//!   overwrites recomputed from the same immutable raw record, so
//!   duplicate delivery is harmless.
//! - **Durability before ack**: a delivery is acknowledged only after the
//!   terminal write succeeded; a failed write abandons the delivery.
//! - **Per-item independence**: one message's failure never blocks or
//!   fails the rest of its batch.

mod clean;
mod config;
mod engine;
mod error;
mod types;

pub use crate::clean::{clean_email, clean_phone, clean_string};
pub use crate::config::RefineConfig;
pub use crate::engine::Refiner;
pub use crate::error::RefineError;
pub use crate::types::{
    BatchItem, Contact, Disposition, ErrorRecord, LeadDetails, Outcome, ReasonCode, RefinedLead,
    RefinedStatus,
};
