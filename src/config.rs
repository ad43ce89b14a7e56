//! Environment-style configuration for the leadflow worker.
//!
//! Settings load from an optional `leadflow` config file and are overridden
//! by `LEADFLOW_*` environment variables (e.g. `LEADFLOW_DELAY_SECONDS=300`,
//! `LEADFLOW_LOOKUP_BASE_URL=https://owners.internal/dir`). Per-invocation
//! configuration is then carried inside the [`Pipeline`](crate::Pipeline)
//! context rather than read from ambient globals, which keeps the state
//! machine testable without a live environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration surface of the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeadflowConfig {
    /// Path of the redb object store file. Empty selects the in-memory
    /// store (records do not survive the process).
    #[serde(default)]
    pub store_path: String,

    /// Delay window in seconds between capture and refinement (0–900).
    /// Values above the 900 s platform ceiling are clamped, not rejected.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,

    /// Base URL of the owner directory; `GET {base}/{id}.json`.
    #[serde(default)]
    pub lookup_base_url: String,

    /// Per-request owner lookup timeout in seconds.
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    /// Slack-compatible webhook for lead alerts. Empty disables
    /// notifications.
    #[serde(default)]
    pub notify_webhook_url: String,

    /// Transient-lookup retries before `LOOKUP_RETRIES_EXHAUSTED`.
    #[serde(default = "default_retry_ceiling")]
    pub retry_ceiling: u32,

    /// Maximum messages consumed per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Queue visibility timeout in seconds.
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    /// Bypass the owner lookup (offline / directory-less environments).
    #[serde(default)]
    pub skip_lookup: bool,

    /// Emit logs as JSON instead of human-readable lines.
    #[serde(default)]
    pub log_json: bool,

    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LeadflowConfig {
    fn default() -> Self {
        Self {
            store_path: String::new(),
            delay_seconds: default_delay_seconds(),
            lookup_base_url: String::new(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
            notify_webhook_url: String::new(),
            retry_ceiling: default_retry_ceiling(),
            batch_size: default_batch_size(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            skip_lookup: false,
            log_json: false,
            log_level: default_log_level(),
        }
    }
}

impl LeadflowConfig {
    /// Load configuration from the optional `leadflow` file and
    /// `LEADFLOW_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("leadflow").required(false))
            .add_source(config::Environment::with_prefix("LEADFLOW").separator("__"));

        let cfg: LeadflowConfig = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Validate internal consistency; intended for process start-up.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be >= 1");
        }
        if self.visibility_timeout_secs == 0 {
            anyhow::bail!("visibility_timeout_secs must be >= 1");
        }
        if !self.skip_lookup && self.lookup_base_url.is_empty() {
            anyhow::bail!("lookup_base_url is required unless skip_lookup is set");
        }
        Ok(())
    }

    /// Requested delay window; the pipeline clamps it to the 900 s ceiling
    /// at enqueue time.
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

fn default_delay_seconds() -> u64 {
    600
}

fn default_lookup_timeout_secs() -> u64 {
    5
}

fn default_retry_ceiling() -> u32 {
    2
}

fn default_batch_size() -> usize {
    10
}

fn default_visibility_timeout_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}
