//! Durable object store for the leadflow pipeline.
//!
//! Raw, enriched, and error records all live in one append/overwrite blob
//! store keyed by a hierarchical path (`raw/2025/08/06/<lead_id>.json`).
//! The store deliberately has last-writer-wins semantics: the refinement
//! stage recomputes equivalent content from the same immutable raw record,
//! so overwriting under redelivery is safe.
//!
//! Two backends are provided behind [`BackendConfig`]:
//!
//! - [`InMemoryStore`] — a `RwLock<HashMap>`; used in tests and ephemeral
//!   deployments.
//! - `RedbStore` — an embedded ACID store (feature `backend-redb`, on by
//!   default).

use thiserror::Error;

mod backend;
mod keys;

pub use crate::backend::{BackendConfig, InMemoryStore};
#[cfg(feature = "backend-redb")]
pub use crate::backend::redb::RedbStore;
pub use crate::keys::{object_key, partition, sibling_key, KeyParts, RecordClass};

/// Errors surfaced by object store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The underlying backend failed (I/O, transaction, lock poisoning).
    #[error("store backend failure: {0}")]
    Backend(String),

    /// An object key does not follow the `prefix/yyyy/mm/dd/<id>.json` layout.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

/// Trait for a blob store keyed by hierarchical string paths.
///
/// `put` overwrites unconditionally; there is no append or compare-and-swap.
/// Implementations must be shareable across worker tasks (`Send + Sync`).
pub trait ObjectStore: Send + Sync {
    /// Insert or overwrite the object at `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    /// Fetch the object at `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Remove the object at `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// List all keys beginning with `prefix`, in unspecified order.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Serialize `value` as JSON and overwrite `key` with it.
pub fn put_json<T: serde::Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value)
        .map_err(|err| StoreError::backend(format!("serialize {key}: {err}")))?;
    store.put(key, &bytes)
}

/// Fetch `key` and deserialize it as JSON, or `None` if absent.
pub fn get_json<T: serde::de::DeserializeOwned>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .map_err(|err| StoreError::backend(format!("deserialize {key}: {err}")))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}
