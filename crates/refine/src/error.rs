//! Errors internal to the refinement engine.
//!
//! These never reach the ingress caller; every variant maps to an
//! abandoned delivery (the queue redelivers and the idempotent write is
//! retried).

use thiserror::Error;

/// I/O-level failures during refinement.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RefineError {
    /// The object store failed a read or a durable write.
    #[error("store failure: {0}")]
    Store(#[from] store::StoreError),

    /// A record failed to (de)serialize.
    #[error("record serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}
