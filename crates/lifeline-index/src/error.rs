use crate::codec::IndexKind;

/// Errors from encoding or decoding a lifeline index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexCodecError {
    #[error("empty index payload")]
    Empty,

    /// The stored tag is not the kind of index the caller asked for.
    #[error("expected {expected} index, found tag {found:#04x}")]
    UnexpectedTag { expected: IndexKind, found: u8 },

    #[error("malformed {kind} index body: {reason}")]
    Body { kind: IndexKind, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for index codec operations.
pub type IndexResult<T> = Result<T, IndexCodecError>;
