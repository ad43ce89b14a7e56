//! Error types produced by the capture crate.
//!
//! Every variant is a validation failure: capture either writes the whole
//! raw record or nothing. The errors are typed (not generic strings) so an
//! ingress adapter can map them to precise client responses, and cloneable
//! and comparable so tests can assert on them directly.

use thiserror::Error;

/// Errors that can occur while validating an inbound CRM event.
///
/// These are the only failures surfaced synchronously to the event's
/// caller; everything downstream of a successful capture is handled
/// asynchronously inside the refinement pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CaptureError {
    /// The inbound payload is not a JSON object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// A required field is absent, not a string, or empty after
    /// sanitization.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The email field is present but not email-shaped.
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    /// The serialized payload exceeds the configured size limit.
    #[error("payload exceeds size limit: {0}")]
    PayloadTooLarge(String),

    /// The payload could not be re-serialized for the size check.
    #[error("payload not serializable: {0}")]
    Unserializable(String),
}

impl CaptureError {
    /// All capture errors are client-side issues (malformed input).
    pub fn is_client_error(&self) -> bool {
        true
    }

    /// Suggested HTTP status code for an ingress adapter.
    pub fn http_status_code(&self) -> u16 {
        match self {
            CaptureError::PayloadTooLarge(_) => 413,
            _ => 400,
        }
    }
}
