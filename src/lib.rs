//! Workspace umbrella crate for the leadflow pipeline.
//!
//! Stitches the stage crates together behind a single dependency-injected
//! [`Pipeline`] context: capture validation, the durable raw write, the
//! delayed enqueue, and the batch refinement loop. HTTP ingress is an
//! external collaborator — it calls [`Pipeline::capture`] and maps the
//! typed errors to its own responses.
//!
//! ```no_run
//! use leadflow::{LeadflowConfig, Pipeline};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LeadflowConfig {
//!     skip_lookup: true,
//!     ..Default::default()
//! };
//! let pipeline = Pipeline::from_config(&cfg)?;
//!
//! let receipt = pipeline.capture(serde_json::json!({
//!     "name": "Jane Smith",
//!     "email": "Jane@Test.com",
//! }))?;
//! println!("captured {}", receipt.lead_id);
//!
//! // After the delay window elapses, a worker drains the queue:
//! let settled = pipeline.run_batch().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

mod config;

pub use crate::config::LeadflowConfig;

pub use capture::{
    capture_event, CaptureConfig, CaptureError, CaptureReceipt, LeadEvent, LeadStatus,
};
pub use directory::{
    FailureKind, HttpOwnerLookup, LookupError, OwnerLookup, OwnerRecord, StubOwnerLookup,
};
pub use notify::{LeadAlert, NoopNotifier, Notifier, NotifyError, SlackNotifier};
pub use queue::{
    clamp_delay, AckHandle, DelayQueue, Delivery, InMemoryDelayQueue, QueueError, QueueMessage,
    MAX_DELIVERY_DELAY,
};
pub use refine::{
    BatchItem, Contact, Disposition, ErrorRecord, LeadDetails, Outcome, ReasonCode, RefineConfig,
    RefinedLead, RefinedStatus, Refiner,
};
pub use store::{
    get_json, object_key, put_json, sibling_key, BackendConfig, InMemoryStore, ObjectStore,
    RecordClass, StoreError,
};

/// Errors surfaced by the pipeline context.
///
/// Only [`PipelineError::Capture`] is a client-side rejection; the rest are
/// infrastructure trouble. [`is_retryable`](PipelineError::is_retryable)
/// tells an ingress caller whether re-submitting the same event is safe
/// and useful.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error("capture validation failure: {0}")]
    Capture(#[from] CaptureError),

    #[error("object store failure: {0}")]
    Store(#[from] StoreError),

    /// Enqueue failed after the raw write committed. The raw record is
    /// intact and re-submission is safe: the overwrite is idempotent.
    #[error("queue failure: {0}")]
    Queue(#[from] QueueError),

    #[error("record serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Store(_) | PipelineError::Queue(_))
    }
}

/// Assembly-time knobs for [`Pipeline::new`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub capture: CaptureConfig,
    pub refine: RefineConfig,
    /// Requested delay window; clamped to [`MAX_DELIVERY_DELAY`] at
    /// enqueue time.
    pub delay: Duration,
    pub batch_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            refine: RefineConfig::default(),
            delay: Duration::from_secs(600),
            batch_size: 10,
        }
    }
}

/// Dependency-injected pipeline context.
///
/// Holds the store, queue, lookup, and notifier seams plus per-stage
/// configuration. Stateless across invocations: workers coordinate only
/// through the queue's visibility lease and the store's last-writer-wins
/// overwrites, so contexts can be replicated freely.
pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn DelayQueue>,
    refiner: Refiner,
    capture_cfg: CaptureConfig,
    delay: Duration,
    batch_size: usize,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn DelayQueue>,
        lookup: Arc<dyn OwnerLookup>,
        notifier: Arc<dyn Notifier>,
        options: PipelineOptions,
    ) -> Self {
        let refiner = Refiner::new(store.clone(), lookup, notifier, options.refine);
        Self {
            store,
            queue,
            refiner,
            capture_cfg: options.capture,
            delay: options.delay,
            batch_size: options.batch_size,
        }
    }

    /// Assemble a pipeline from loaded configuration: redb or in-memory
    /// store, in-process delay queue, HTTP owner lookup (or a stub when
    /// the lookup is skipped), and the Slack sink when configured.
    pub fn from_config(cfg: &LeadflowConfig) -> Result<Self, PipelineError> {
        let backend = if cfg.store_path.is_empty() {
            BackendConfig::in_memory()
        } else {
            BackendConfig::redb(cfg.store_path.clone())
        };
        let store: Arc<dyn ObjectStore> = Arc::from(backend.build()?);

        let queue: Arc<dyn DelayQueue> =
            Arc::new(InMemoryDelayQueue::new(cfg.visibility_timeout()));

        let lookup: Arc<dyn OwnerLookup> = if cfg.skip_lookup {
            Arc::new(StubOwnerLookup::new())
        } else {
            Arc::new(HttpOwnerLookup::new(
                cfg.lookup_base_url.clone(),
                cfg.lookup_timeout(),
            ))
        };

        let notifier: Arc<dyn Notifier> = if cfg.notify_webhook_url.is_empty() {
            Arc::new(NoopNotifier)
        } else {
            Arc::new(SlackNotifier::new(cfg.notify_webhook_url.clone()))
        };

        let options = PipelineOptions {
            capture: CaptureConfig::default(),
            refine: RefineConfig {
                retry_ceiling: cfg.retry_ceiling,
                skip_lookup: cfg.skip_lookup,
            },
            delay: cfg.delay(),
            batch_size: cfg.batch_size,
        };

        Ok(Self::new(store, queue, lookup, notifier, options))
    }

    /// Capture an inbound CRM event.
    ///
    /// Side-effect ordering is the contract here: the raw write must
    /// complete before the enqueue. If the enqueue fails afterwards the
    /// raw write is *not* rolled back — the caller gets a retryable error
    /// and re-submission overwrites idempotently.
    pub fn capture(&self, payload: Value) -> Result<CaptureReceipt, PipelineError> {
        let event = capture_event(payload, &self.capture_cfg)?;

        let raw_key = object_key(
            RecordClass::Raw,
            event.received_at.date_naive(),
            &event.lead_id,
        );
        put_json(self.store.as_ref(), &raw_key, &event)?;

        let delay = clamp_delay(self.delay);
        let message = QueueMessage {
            lead_id: event.lead_id.clone(),
            object_key: raw_key,
            enqueued_at: Utc::now(),
            attempt: 0,
        };
        self.queue.enqueue(message, delay)?;

        info!(
            lead_id = %event.lead_id,
            delay_secs = delay.as_secs(),
            "lead captured and scheduled"
        );
        Ok(CaptureReceipt {
            lead_id: event.lead_id,
        })
    }

    /// Consume and settle one batch of due deliveries.
    ///
    /// Each delivery is acked only after its terminal write succeeded;
    /// retry outcomes are nacked so the queue redelivers after the
    /// visibility timeout.
    pub async fn run_batch(&self) -> Result<Vec<BatchItem>, PipelineError> {
        let deliveries = self.queue.receive_batch(self.batch_size)?;
        if deliveries.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = deliveries.len(), "processing delivery batch");

        let messages: Vec<QueueMessage> =
            deliveries.iter().map(|d| d.message.clone()).collect();
        let results = self.refiner.process_batch(&messages).await;

        for (delivery, item) in deliveries.iter().zip(results.iter()) {
            let settled = match item.outcome.disposition() {
                Disposition::Ack => self.queue.ack(delivery.handle),
                Disposition::Retry => self.queue.nack(delivery.handle),
            };
            if let Err(err) = settled {
                // A lost race with lease expiry: the message will be
                // redelivered and the idempotent write makes that safe.
                warn!(lead_id = %item.lead_id, error = %err, "failed to settle delivery");
            }
        }

        Ok(results)
    }

    /// The object store this pipeline writes to.
    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}
