use std::io;
use std::path::PathBuf;

use lifeline_types::Reference;

use crate::scope::Scope;

/// Errors from storage engine operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Nothing is stored under the reference in the given scope.
    #[error("{scope} not found: {reference}")]
    NotFound { scope: Scope, reference: Reference },

    /// Stored bytes exist but do not decode as what was asked for.
    #[error("corrupt entry at {reference}: expected {expected}: {reason}")]
    CorruptRecord {
        reference: Reference,
        expected: String,
        reason: String,
    },

    /// The backing store failed to open, read or write.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] io::Error),

    /// The log is damaged before its end; replaying past the damage would
    /// drop committed entries.
    #[error("ledger log {} is corrupt at byte {offset}", path.display())]
    CorruptLog { path: PathBuf, offset: u64 },

    /// The engine has been closed.
    #[error("ledger store is closed")]
    EngineClosed,

    /// A value could not be serialized for writing.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        Self::StorageUnavailable(io::Error::other(format!("{what} lock poisoned")))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
