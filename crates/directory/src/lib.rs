//! Owner lookup for the leadflow pipeline.
//!
//! The directory is an external read-only service mapping an identifier to
//! the responsible salesperson. It may fail transiently (network, 5xx) or
//! permanently (not found, forbidden) — the two classes have distinct
//! recovery paths in the refinement state machine, so every [`LookupError`]
//! carries its [`FailureKind`].
//!
//! [`HttpOwnerLookup`] is the production implementation;
//! [`StubOwnerLookup`] backs tests and offline runs without any network
//! mocking, which is the point of keeping the lookup behind a trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod http;
mod stub;

pub use crate::http::HttpOwnerLookup;
pub use crate::stub::StubOwnerLookup;

/// An owner record as served by the directory.
///
/// Field aliases accept the directory's wire names (`lead_owner`,
/// `lead_email`) as well as the plain forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRecord {
    /// The resolved salesperson, if the directory knows one.
    #[serde(alias = "lead_owner")]
    pub owner: Option<String>,
    /// Contact address for the owner.
    #[serde(alias = "lead_email")]
    pub email: Option<String>,
    /// Sales funnel the lead belongs to.
    pub funnel: Option<String>,
}

impl OwnerRecord {
    pub fn named(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Default::default()
        }
    }
}

/// Failure classes with distinct recovery paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retryable: infrastructure trouble that may heal on its own.
    Transient,
    /// Terminal: retrying cannot change the answer.
    Permanent,
}

/// Errors surfaced by an owner lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LookupError {
    /// The directory has no record for the identifier (4xx not-found).
    #[error("owner not found: {0}")]
    NotFound(String),

    /// The directory refused the request (401/403).
    #[error("owner lookup forbidden: {0}")]
    Forbidden(String),

    /// Transport-level failure: connect, timeout, DNS, reset.
    #[error("owner lookup transport failure: {0}")]
    Transport(String),

    /// An unexpected HTTP status.
    #[error("owner directory returned status {status}")]
    Status { status: u16 },

    /// The response body was not a decodable owner record.
    #[error("invalid owner record: {0}")]
    InvalidRecord(String),
}

impl LookupError {
    /// Classify this failure for the retry policy.
    ///
    /// Mirrors the upstream semantics: 4xx-equivalents won't heal, 5xx and
    /// transport errors might, and unknown failures are retried (an
    /// undecodable body is usually a proxy error page, not a stable
    /// directory answer).
    pub fn kind(&self) -> FailureKind {
        match self {
            LookupError::NotFound(_) | LookupError::Forbidden(_) => FailureKind::Permanent,
            LookupError::Status { status } if (400..500).contains(status) => FailureKind::Permanent,
            LookupError::Status { .. } => FailureKind::Transient,
            LookupError::Transport(_) | LookupError::InvalidRecord(_) => FailureKind::Transient,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }
}

/// Read-only resolution of a lead's responsible salesperson.
#[async_trait]
pub trait OwnerLookup: Send + Sync {
    async fn resolve(&self, id: &str) -> Result<OwnerRecord, LookupError>;
}
