//! Configuration for the refinement engine.

use serde::{Deserialize, Serialize};

/// Runtime configuration for refinement behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Maximum number of transient-lookup retries before a lead is
    /// permanently failed with `LOOKUP_RETRIES_EXHAUSTED`. The counter is
    /// the application `attempt` travelling in the queue envelope, not the
    /// queue's own redelivery count.
    pub retry_ceiling: u32,

    /// Bypass the owner lookup entirely; the owner falls back to the
    /// payload's own `owner` field or "Unassigned". Used for offline runs
    /// and environments without a directory.
    pub skip_lookup: bool,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            retry_ceiling: 2,
            skip_lookup: false,
        }
    }
}
