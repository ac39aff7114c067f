use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{RecordId, RECORD_ID_SIZE};

/// Length of a reference in its fixed-width key encoding.
pub const REFERENCE_KEY_SIZE: usize = RECORD_ID_SIZE * 2;

/// Address of a stored record.
///
/// `domain` identifies the owning domain or class lineage; `record`
/// identifies this specific record. Two references are equal iff both parts
/// are byte-equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Reference {
    pub domain: RecordId,
    pub record: RecordId,
}

impl Reference {
    pub const fn new(domain: RecordId, record: RecordId) -> Self {
        Self { domain, record }
    }

    /// The all-zero reference reserved for the bootstrap record.
    pub const fn zero() -> Self {
        Self {
            domain: RecordId::zero(),
            record: RecordId::zero(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.domain.is_zero() && self.record.is_zero()
    }

    /// Physical lookup key: domain identifier followed by record identifier.
    pub fn key(&self) -> [u8; REFERENCE_KEY_SIZE] {
        let mut out = [0u8; REFERENCE_KEY_SIZE];
        out[..RECORD_ID_SIZE].copy_from_slice(&self.domain.to_bytes());
        out[RECORD_ID_SIZE..].copy_from_slice(&self.record.to_bytes());
        out
    }

    /// Parse a key produced by [`Reference::key`].
    pub fn from_key(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != REFERENCE_KEY_SIZE {
            return Err(TypeError::InvalidLength {
                expected: REFERENCE_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            domain: RecordId::from_bytes(&bytes[..RECORD_ID_SIZE])?,
            record: RecordId::from_bytes(&bytes[RECORD_ID_SIZE..])?,
        })
    }

    /// Hex encoding of the key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.key())
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_key(&bytes)
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reference({}:{}/{}:{})",
            self.domain.pulse,
            self.domain.short_hex(),
            self.record.pulse,
            self.record.short_hex()
        )
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.record)
    }
}
