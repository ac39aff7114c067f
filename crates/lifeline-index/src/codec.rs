use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{IndexCodecError, IndexResult};
use crate::lifeline::{ClassLifeline, ObjectLifeline};

/// Discriminator for the index variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IndexKind {
    Class = 1,
    Object = 2,
}

impl IndexKind {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Class => write!(f, "class lifeline"),
            Self::Object => write!(f, "object lifeline"),
        }
    }
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub fn encode_class(index: &ClassLifeline) -> IndexResult<Vec<u8>> {
    encode_tagged(IndexKind::Class, index)
}

pub fn decode_class(bytes: &[u8]) -> IndexResult<ClassLifeline> {
    decode_tagged(IndexKind::Class, bytes)
}

pub fn encode_object(index: &ObjectLifeline) -> IndexResult<Vec<u8>> {
    encode_tagged(IndexKind::Object, index)
}

pub fn decode_object(bytes: &[u8]) -> IndexResult<ObjectLifeline> {
    decode_tagged(IndexKind::Object, bytes)
}

fn encode_tagged<T: Serialize>(kind: IndexKind, index: &T) -> IndexResult<Vec<u8>> {
    let body = options()
        .serialize(index)
        .map_err(|e| IndexCodecError::Serialization(e.to_string()))?;
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(kind.tag());
    out.extend_from_slice(&body);
    Ok(out)
}

fn decode_tagged<T: DeserializeOwned>(kind: IndexKind, bytes: &[u8]) -> IndexResult<T> {
    let (&tag, body) = bytes.split_first().ok_or(IndexCodecError::Empty)?;
    if tag != kind.tag() {
        return Err(IndexCodecError::UnexpectedTag {
            expected: kind,
            found: tag,
        });
    }
    options()
        .deserialize(body)
        .map_err(|e| IndexCodecError::Body {
            kind,
            reason: e.to_string(),
        })
}
