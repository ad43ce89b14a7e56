//! Redb backend for durable lead record storage.
//!
//! Redb is a pure Rust embedded key-value store with ACID transactions.
//! Commits are synchronous, so a returned `Ok` from [`ObjectStore::put`]
//! means the record is durable — the refinement engine relies on this
//! before acknowledging a queue delivery.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::{ObjectStore, StoreError};

/// Single table holding every record class; the key layout already
/// partitions by `raw/`, `enriched/`, `errors/`.
const OBJECTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("lead_objects");

/// Redb-backed object store.
///
/// The `Arc<Database>` allows safe sharing across worker tasks; redb
/// handles its own internal locking and MVCC.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::backend(e.to_string()))?;

        // Accessing the table once creates it if it doesn't exist.
        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        {
            let _table = write_txn
                .open_table(OBJECTS_TABLE)
                .map_err(|e| StoreError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::backend(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl ObjectStore for RedbStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(OBJECTS_TABLE)
                .map_err(|e| StoreError::backend(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StoreError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(OBJECTS_TABLE)
            .map_err(|e| StoreError::backend(e.to_string()))?;

        match table
            .get(key)
            .map_err(|e| StoreError::backend(e.to_string()))?
        {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(OBJECTS_TABLE)
                .map_err(|e| StoreError::backend(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| StoreError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(OBJECTS_TABLE)
            .map_err(|e| StoreError::backend(e.to_string()))?;

        let mut keys = Vec::new();
        // Keys are ordered, so everything matching the prefix is contiguous.
        for item in table
            .range(prefix..)
            .map_err(|e| StoreError::backend(e.to_string()))?
        {
            let (key, _) = item.map_err(|e| StoreError::backend(e.to_string()))?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_string());
        }
        Ok(keys)
    }
}
