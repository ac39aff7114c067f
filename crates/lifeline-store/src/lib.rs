//! Storage engine for the lifeline ledger.
//!
//! Records and lifeline indices live side by side in one ordered byte-string
//! store, separated by a one-byte scope prefix:
//!
//! ```text
//! 0x01 || reference_key   lifeline index
//! 0x02 || reference_key   record
//! ```
//!
//! Records are written once under an address derived from their encoded
//! content and the current pulse. Indices are plain read-then-write values.
//!
//! # Backends
//!
//! All backends implement the [`KvBackend`] trait:
//!
//! - [`MemoryBackend`]: `BTreeMap` store for tests and embedding
//! - [`FileBackend`]: CRC-framed append-only log replayed on open
//!
//! # Design Rules
//!
//! 1. Records are immutable once written.
//! 2. The all-zero reference always holds the bootstrap record.
//! 3. Index writes are last-physical-write-wins; callers that need ordering
//!    wrap their read-modify-write in [`LedgerStore::with_lifeline_lock`].
//! 4. Every I/O and decode failure is surfaced, never retried or ignored.

pub mod backend;
pub mod config;
pub mod error;
pub mod ledger;
mod locks;
pub mod scope;

pub use backend::{FileBackend, KvBackend, MemoryBackend, SyncMode};
pub use config::{BackendConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use ledger::LedgerStore;
pub use scope::{scoped_key, Scope, SCOPED_KEY_SIZE};
