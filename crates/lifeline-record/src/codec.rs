//! Tagged envelope codec.
//!
//! ```text
//! [1 byte: RecordKind tag]
//! [N bytes: bincode body, fixed-width integers, no trailing bytes]
//! ```

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};
use crate::record::{Record, RecordKind};

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode a record into its tagged envelope.
pub fn encode(record: &Record) -> CodecResult<Vec<u8>> {
    let body = match record {
        Record::ClassActivate(r) => encode_body(r)?,
        Record::ClassAmend(r) => encode_body(r)?,
        Record::ObjectActivate(r) => encode_body(r)?,
        Record::ObjectAmend(r) => encode_body(r)?,
        Record::ObjectAppend(r) => encode_body(r)?,
    };
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(record.kind().tag());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a tagged envelope, selecting the variant from its discriminator.
pub fn decode(bytes: &[u8]) -> CodecResult<Record> {
    let (&tag, body) = bytes.split_first().ok_or(CodecError::Empty)?;
    let kind = RecordKind::from_tag(tag).ok_or(CodecError::UnknownTag(tag))?;
    let record = match kind {
        RecordKind::ClassActivate => Record::ClassActivate(decode_body(kind, body)?),
        RecordKind::ClassAmend => Record::ClassAmend(decode_body(kind, body)?),
        RecordKind::ObjectActivate => Record::ObjectActivate(decode_body(kind, body)?),
        RecordKind::ObjectAmend => Record::ObjectAmend(decode_body(kind, body)?),
        RecordKind::ObjectAppend => Record::ObjectAppend(decode_body(kind, body)?),
    };
    Ok(record)
}

fn encode_body<T: Serialize>(body: &T) -> CodecResult<Vec<u8>> {
    options()
        .serialize(body)
        .map_err(|e| CodecError::Serialization(e.to_string()))
}

fn decode_body<T: DeserializeOwned>(kind: RecordKind, body: &[u8]) -> CodecResult<T> {
    options()
        .deserialize(body)
        .map_err(|e| CodecError::Body {
            kind,
            reason: e.to_string(),
        })
}
