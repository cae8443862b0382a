use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use super::MemStore;

/// A base store shared between concurrent admission callers.
///
/// Runs that may commit hold the write guard from their first read to their
/// commit, so a sequence or nonce check-and-record is atomic against other
/// runs on the same store. Simulations only need the read guard.
#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<MemStore>>,
}

impl SharedStore {
    pub fn new(store: MemStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MemStore> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, MemStore> {
        self.inner.write()
    }

    /// A detached copy of the current contents.
    pub fn snapshot(&self) -> MemStore {
        self.inner.read().clone()
    }
}
