//! Delay queue adapter for the leadflow pipeline.
//!
//! This crate defines the contract the refinement worker consumes against:
//! an at-least-once queue with a per-message delivery delay, batched
//! consumption, and visibility-timeout leasing. The external queue is
//! abstracted behind [`DelayQueue`]; [`InMemoryDelayQueue`] implements the
//! same semantics in process for tests and single-node deployments.
//!
//! ## Counters
//!
//! Two counters travel with a delivery and they are deliberately distinct:
//!
//! - [`QueueMessage::attempt`] is the *application* retry counter. It is
//!   bumped only when a consumer explicitly [`nack`](DelayQueue::nack)s a
//!   delivery to request a retry (e.g. a transient owner-lookup failure).
//!   The refinement retry ceiling is evaluated against this counter.
//! - [`Delivery::redelivery_count`] is maintained by the queue itself and
//!   counts every redelivery, including leases that expired because a
//!   worker crashed mid-batch. Crash redeliveries do not consume retry
//!   budget.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;

pub use crate::memory::InMemoryDelayQueue;

/// Platform ceiling on the delivery delay. Requests above this are clamped,
/// never rejected.
pub const MAX_DELIVERY_DELAY: Duration = Duration::from_secs(900);

/// Default lease duration before an unacknowledged delivery is considered
/// abandoned and becomes eligible for redelivery.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(300);

/// Clamp a requested delivery delay to [`MAX_DELIVERY_DELAY`].
pub fn clamp_delay(requested: Duration) -> Duration {
    if requested > MAX_DELIVERY_DELAY {
        tracing::debug!(
            requested_secs = requested.as_secs(),
            ceiling_secs = MAX_DELIVERY_DELAY.as_secs(),
            "delivery delay clamped to platform ceiling"
        );
        MAX_DELIVERY_DELAY
    } else {
        requested
    }
}

/// The message envelope referencing a captured raw record.
///
/// The message carries a pointer (`object_key`), never the payload itself;
/// the processor re-reads the raw record at refinement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub lead_id: String,
    /// Object store key of the raw record.
    pub object_key: String,
    pub enqueued_at: DateTime<Utc>,
    /// Application retry counter; see the crate docs on counters.
    #[serde(default)]
    pub attempt: u32,
}

/// Opaque handle identifying one delivery lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AckHandle(pub(crate) u64);

impl std::fmt::Display for AckHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One leased delivery handed to a consumer.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: QueueMessage,
    pub handle: AckHandle,
    /// Queue-maintained count of redeliveries (0 on first delivery).
    pub redelivery_count: u32,
}

/// Errors surfaced by queue operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueueError {
    /// The underlying queue transport failed.
    #[error("queue backend failure: {0}")]
    Backend(String),

    /// The handle does not identify a live lease (already acked, or the
    /// lease expired and the message was redelivered elsewhere).
    #[error("unknown or superseded delivery handle: {0}")]
    UnknownHandle(AckHandle),
}

impl QueueError {
    pub fn backend(msg: impl Into<String>) -> Self {
        QueueError::Backend(msg.into())
    }
}

/// Adapter trait over an at-least-once, visibility-timeout queue.
///
/// Guarantees an implementation must provide:
///
/// - a message becomes visible no earlier than `delay` after enqueue;
/// - a delivery may occur more than once (crash, lease expiry, nack);
/// - no ordering across messages, even within one batch;
/// - `ack` permanently removes a delivery, `nack` abandons it so the queue
///   redelivers after the visibility timeout with `attempt` incremented.
pub trait DelayQueue: Send + Sync {
    /// Enqueue `message` so it becomes visible no earlier than `delay`
    /// from now.
    fn enqueue(&self, message: QueueMessage, delay: Duration) -> Result<(), QueueError>;

    /// Receive up to `max` currently-visible messages, leasing each for
    /// the visibility timeout. Returns an empty batch when nothing is due.
    fn receive_batch(&self, max: usize) -> Result<Vec<Delivery>, QueueError>;

    /// Acknowledge a delivery, permanently removing the message.
    fn ack(&self, handle: AckHandle) -> Result<(), QueueError>;

    /// Abandon a delivery, requesting an application-level retry: the
    /// message becomes visible again after the visibility timeout with
    /// `attempt + 1`.
    fn nack(&self, handle: AckHandle) -> Result<(), QueueError>;
}
