use std::collections::BTreeMap;

use super::KvStore;

/// Copy-on-write overlay over a read-only parent store.
///
/// Reads check the overlay first, then fall through to the parent.
/// Writes and deletes only go to the overlay; dropping it discards them and
/// [`CacheStore::into_write_set`] hands them back for committing.
pub struct CacheStore<'a> {
    parent: &'a dyn KvStore,
    /// `None` marks a deletion that shadows the parent.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.writes.is_empty()
    }

    pub fn into_write_set(self) -> WriteSet {
        WriteSet {
            entries: self.writes,
        }
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(Some(value)) => Some(value.clone()),
            Some(None) => None,
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }

    fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self.parent.prefix_entries(prefix).into_iter().collect();
        for (key, value) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

/// Writes captured by a finished overlay, ready to apply to a base store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    entries: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn apply(self, target: &mut dyn KvStore) {
        for (key, value) in self.entries {
            match value {
                Some(v) => target.set(key, v),
                None => target.delete(&key),
            }
        }
    }
}
