use lifeline_store::StoreError;

/// Errors produced by the artifact manager.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// A storage read or write failed, or a stored record had the wrong kind.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The registry has no entry under the given key.
    #[error("unknown reference key: {0}")]
    UnknownReference(String),

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

impl ArtifactError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}

/// Result alias for artifact operations.
pub type ArtifactResult<T> = Result<T, ArtifactError>;
