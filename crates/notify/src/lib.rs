//! Team notification sink for enriched leads.
//!
//! Notifications are best-effort and fire-and-forget: the refinement
//! engine logs a failure and moves on. Nothing here may block or fail the
//! enriched write, which has already committed by the time a notification
//! is attempted, and nothing retries — a duplicate queue delivery may
//! legitimately produce a duplicate alert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod message;
mod slack;

pub use crate::message::slack_payload;
pub use crate::slack::SlackNotifier;

/// The alert content delivered to the team channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadAlert {
    pub lead_id: String,
    pub name: Option<String>,
    /// Resolved owner, or "Unassigned".
    pub owner: String,
    /// CRM status label when present, otherwise the pipeline status.
    pub status_label: String,
    pub email: Option<String>,
    pub source: Option<String>,
    pub funnel: Option<String>,
    pub enriched_at: DateTime<Utc>,
}

/// Errors from a notification attempt. Callers log these; they never
/// propagate into a queue disposition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("notification transport failure: {0}")]
    Transport(String),

    #[error("notification endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Push channel for lead alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &LeadAlert) -> Result<(), NotifyError>;
}

/// Sink used when no notification endpoint is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, alert: &LeadAlert) -> Result<(), NotifyError> {
        tracing::debug!(lead_id = %alert.lead_id, "notification sink unconfigured, skipping");
        Ok(())
    }
}
