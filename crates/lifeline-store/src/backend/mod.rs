//! Pluggable byte-string stores underneath the ledger.

pub mod file;
pub mod memory;

pub use file::{FileBackend, SyncMode, DEFAULT_COMPACT_MIN_BYTES, LOG_FILE_NAME};
pub use memory::MemoryBackend;

use crate::error::StoreResult;

/// Ordered key-value store the ledger is layered on.
///
/// Implementations must serialize physical writes internally; the ledger
/// issues independent single-key operations and never asks for multi-key
/// transactions.
pub trait KvBackend: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Irreversibly erase every key.
    fn delete_all(&self) -> StoreResult<()>;

    /// Flush and release resources. Every later call, including a second
    /// `close`, fails with [`StoreError::EngineClosed`](crate::StoreError::EngineClosed).
    fn close(&self) -> StoreResult<()>;

    /// Whether anything is stored under `key`.
    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
