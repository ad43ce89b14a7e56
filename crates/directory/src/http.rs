//! HTTP owner directory client.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use tracing::debug;

use crate::{LookupError, OwnerLookup, OwnerRecord};

// Global HTTP client with connection pooling; per-request deadlines are
// applied at the call site so the pool can be shared across configs.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(8)
        .build()
        .expect("Failed to build HTTP client")
});

/// Owner lookup against an HTTP directory serving
/// `GET {base_url}/{id}.json`.
pub struct HttpOwnerLookup {
    base_url: String,
    timeout: Duration,
}

impl HttpOwnerLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, timeout }
    }

    fn owner_url(&self, id: &str) -> String {
        format!("{}/{}.json", self.base_url, id)
    }
}

#[async_trait]
impl OwnerLookup for HttpOwnerLookup {
    async fn resolve(&self, id: &str) -> Result<OwnerRecord, LookupError> {
        let url = self.owner_url(id);
        debug!(%url, "owner lookup request");

        let response = HTTP_CLIENT
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<OwnerRecord>()
                .await
                .map_err(|err| LookupError::InvalidRecord(err.to_string())),
            StatusCode::NOT_FOUND => Err(LookupError::NotFound(id.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(LookupError::Forbidden(id.to_string()))
            }
            status => Err(LookupError::Status {
                status: status.as_u16(),
            }),
        }
    }
}
