use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::backend::KvBackend;
use crate::error::{StoreError, StoreResult};

/// In-memory, `BTreeMap`-based backend.
///
/// Intended for tests and embedding. Keys stay ordered so iteration matches
/// what a disk-backed ordered store would give.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::EngineClosed);
        }
        Ok(())
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        let map = self
            .entries
            .read()
            .map_err(|_| StoreError::lock_poisoned("memory backend"))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        let mut map = self
            .entries
            .write()
            .map_err(|_| StoreError::lock_poisoned("memory backend"))?;
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.ensure_open()?;
        let mut map = self
            .entries
            .write()
            .map_err(|_| StoreError::lock_poisoned("memory backend"))?;
        map.clear();
        Ok(())
    }

    /// Drops every entry; the backend holds nothing once closed.
    fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::EngineClosed);
        }
        let mut map = self
            .entries
            .write()
            .map_err(|_| StoreError::lock_poisoned("memory backend"))?;
        *map = BTreeMap::new();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("key_count", &self.len())
            .finish()
    }
}
