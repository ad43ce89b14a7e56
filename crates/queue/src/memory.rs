//! In-memory delay queue with faithful at-least-once semantics.
//!
//! Uses `tokio::time::Instant` for all deadlines so tests can pause and
//! advance the clock instead of sleeping through real delay windows.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::{AckHandle, DelayQueue, Delivery, QueueError, QueueMessage, DEFAULT_VISIBILITY_TIMEOUT};

struct Lease {
    handle: u64,
    expires_at: Instant,
}

struct Entry {
    message: QueueMessage,
    visible_at: Instant,
    redelivery_count: u32,
    delivered_once: bool,
    lease: Option<Lease>,
}

struct State {
    next_handle: u64,
    entries: Vec<Entry>,
}

/// In-process [`DelayQueue`] implementation.
///
/// A delivery leases its message for the visibility timeout. An expired
/// lease is released on the next receive sweep and the message redelivered
/// with `attempt` unchanged (crash redelivery); an explicit nack releases
/// the lease with `attempt + 1` (application retry). Both paths show up in
/// the queue-maintained redelivery count.
pub struct InMemoryDelayQueue {
    visibility_timeout: Duration,
    state: Mutex<State>,
}

impl InMemoryDelayQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            visibility_timeout,
            state: Mutex::new(State {
                next_handle: 0,
                entries: Vec::new(),
            }),
        }
    }

    /// Number of messages currently held (visible, delayed, or leased).
    pub fn depth(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.entries.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, QueueError> {
        self.state
            .lock()
            .map_err(|_| QueueError::backend("poisoned lock"))
    }
}

impl Default for InMemoryDelayQueue {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_TIMEOUT)
    }
}

impl DelayQueue for InMemoryDelayQueue {
    fn enqueue(&self, message: QueueMessage, delay: Duration) -> Result<(), QueueError> {
        let mut state = self.lock()?;
        tracing::debug!(
            lead_id = %message.lead_id,
            delay_secs = delay.as_secs(),
            "message enqueued"
        );
        state.entries.push(Entry {
            message,
            visible_at: Instant::now() + delay,
            redelivery_count: 0,
            delivered_once: false,
            lease: None,
        });
        Ok(())
    }

    fn receive_batch(&self, max: usize) -> Result<Vec<Delivery>, QueueError> {
        let mut state = self.lock()?;
        let now = Instant::now();
        let visibility_timeout = self.visibility_timeout;

        // Release expired leases first: the consumer that held them is
        // presumed dead, so the message goes back without touching the
        // application attempt counter.
        for entry in state.entries.iter_mut() {
            if matches!(&entry.lease, Some(lease) if lease.expires_at <= now) {
                tracing::debug!(lead_id = %entry.message.lead_id, "lease expired, releasing");
                entry.lease = None;
            }
        }

        let mut next_handle = state.next_handle;
        let mut batch = Vec::new();
        for entry in state.entries.iter_mut() {
            if batch.len() >= max {
                break;
            }
            if entry.lease.is_some() || entry.visible_at > now {
                continue;
            }
            if entry.delivered_once {
                entry.redelivery_count += 1;
            } else {
                entry.delivered_once = true;
            }
            next_handle += 1;
            entry.lease = Some(Lease {
                handle: next_handle,
                expires_at: now + visibility_timeout,
            });
            batch.push(Delivery {
                message: entry.message.clone(),
                handle: AckHandle(next_handle),
                redelivery_count: entry.redelivery_count,
            });
        }
        state.next_handle = next_handle;

        Ok(batch)
    }

    fn ack(&self, handle: AckHandle) -> Result<(), QueueError> {
        let mut state = self.lock()?;
        let position = state
            .entries
            .iter()
            .position(|entry| matches!(&entry.lease, Some(lease) if lease.handle == handle.0));
        match position {
            Some(index) => {
                let entry = state.entries.swap_remove(index);
                tracing::debug!(lead_id = %entry.message.lead_id, "message acked");
                Ok(())
            }
            None => Err(QueueError::UnknownHandle(handle)),
        }
    }

    fn nack(&self, handle: AckHandle) -> Result<(), QueueError> {
        let mut state = self.lock()?;
        let visibility_timeout = self.visibility_timeout;
        let entry = state
            .entries
            .iter_mut()
            .find(|entry| matches!(&entry.lease, Some(lease) if lease.handle == handle.0));
        match entry {
            Some(entry) => {
                entry.lease = None;
                entry.message.attempt += 1;
                entry.visible_at = Instant::now() + visibility_timeout;
                tracing::debug!(
                    lead_id = %entry.message.lead_id,
                    attempt = entry.message.attempt,
                    "message nacked, retry scheduled"
                );
                Ok(())
            }
            None => Err(QueueError::UnknownHandle(handle)),
        }
    }
}
