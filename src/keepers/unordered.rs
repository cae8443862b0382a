use chrono::{DateTime, Utc};
use ethers::types::Address;
use tracing::debug;

use super::UnorderedNonceManager;
use crate::error::AnteError;
use crate::state::KvStore;

const NONCE_PREFIX: &[u8] = b"unordered/";

/// Consumed unordered nonces keyed by `(timeout, sender)`.
///
/// A transaction's timeout timestamp is its nonce and also the record's
/// expiry. Keys lead with the big-endian timeout so expired records form a
/// contiguous prefix of the range and purging stops at the first live one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreUnorderedNonceManager;

impl StoreUnorderedNonceManager {
    pub fn new() -> Self {
        Self
    }

    fn key(sender: &Address, nanos: u64) -> Vec<u8> {
        let mut key = NONCE_PREFIX.to_vec();
        key.extend_from_slice(&nanos.to_be_bytes());
        key.extend_from_slice(sender.as_bytes());
        key
    }

    fn nanos(ts: DateTime<Utc>) -> Result<u64, AnteError> {
        ts.timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| AnteError::InvalidRequest(format!("timeout timestamp {ts} is out of range")))
    }

    fn key_nanos(key: &[u8]) -> Option<u64> {
        let raw = key.get(NONCE_PREFIX.len()..NONCE_PREFIX.len() + 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Some(u64::from_be_bytes(buf))
    }
}

impl UnorderedNonceManager for StoreUnorderedNonceManager {
    fn contains(
        &self,
        store: &dyn KvStore,
        sender: &Address,
        timeout: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AnteError> {
        let nanos = Self::nanos(timeout)?;
        if !store.has(&Self::key(sender, nanos)) {
            return Ok(false);
        }
        // A record past its expiry is garbage awaiting a purge, not a live nonce.
        Ok(timeout >= now)
    }

    fn try_add_nonce(
        &self,
        store: &mut dyn KvStore,
        sender: &Address,
        timeout: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AnteError> {
        if self.contains(store, sender, timeout, now)? {
            return Err(AnteError::UnorderedNonceUsed {
                address: *sender,
                nonce: timeout.timestamp_nanos_opt().unwrap_or_default(),
            });
        }
        let nanos = Self::nanos(timeout)?;
        store.set(Self::key(sender, nanos), Vec::new());
        Ok(())
    }

    fn remove_expired(&self, store: &mut dyn KvStore, now: DateTime<Utc>) -> Result<usize, AnteError> {
        let cutoff = Self::nanos(now)?;
        let expired: Vec<Vec<u8>> = store
            .prefix_entries(NONCE_PREFIX)
            .into_iter()
            .map(|(key, _)| key)
            .take_while(|key| Self::key_nanos(key).is_some_and(|n| n < cutoff))
            .collect();

        for key in &expired {
            store.delete(key);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "purged expired unordered nonces");
        }
        Ok(expired.len())
    }
}
