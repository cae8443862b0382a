//! State Module
//!
//! Key-value storage the pipeline's collaborators read and write through.
//! Admission never touches the base store directly: every run works in a
//! [`CacheStore`] overlay whose [`WriteSet`] is applied only on success.

mod cache;
mod overlay;
mod shared;

pub use cache::MemStore;
pub use overlay::{CacheStore, WriteSet};
pub use shared::SharedStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Minimal ordered key-value interface.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// All entries whose key starts with `prefix`, in key order.
    fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// Reads a JSON-encoded record.
pub fn get_json<T: DeserializeOwned>(store: &dyn KvStore, key: &[u8]) -> Result<Option<T>, StoreError> {
    match store.get(key) {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: hex::encode(key),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Writes a JSON-encoded record.
pub fn set_json<T: Serialize>(store: &mut dyn KvStore, key: Vec<u8>, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Corrupt {
        key: hex::encode(&key),
        reason: e.to_string(),
    })?;
    store.set(key, bytes);
    Ok(())
}
