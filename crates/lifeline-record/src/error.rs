use crate::record::RecordKind;

/// Errors from encoding or decoding a record envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The input had no bytes at all, not even a discriminator.
    #[error("empty record envelope")]
    Empty,

    /// The discriminator byte does not name a known record kind.
    #[error("unknown record tag {0:#04x}")]
    UnknownTag(u8),

    /// The body after a valid discriminator could not be parsed.
    #[error("malformed {kind} body: {reason}")]
    Body { kind: RecordKind, reason: String },

    /// The record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
