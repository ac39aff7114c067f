use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::pulse::PulseNumber;

/// Length of the content digest in bytes.
pub const HASH_SIZE: usize = 32;

/// Length of a [`RecordId`] in its fixed-width encoding.
pub const RECORD_ID_SIZE: usize = PulseNumber::SIZE + HASH_SIZE;

/// Domain tag prepended to record content before hashing.
const RECORD_HASH_DOMAIN: &str = "lifeline-record-v1";

/// Identifier of a stored record: the pulse it was written in plus the
/// BLAKE3 digest of its encoded content.
///
/// The pulse buckets records chronologically; the hash makes the identifier
/// unique within a bucket. The derived ordering is pulse-first and carries no
/// ledger meaning beyond that.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct RecordId {
    pub pulse: PulseNumber,
    pub hash: [u8; HASH_SIZE],
}

impl RecordId {
    pub const fn new(pulse: PulseNumber, hash: [u8; HASH_SIZE]) -> Self {
        Self { pulse, hash }
    }

    /// Compute the identifier for `content` written during `pulse`.
    ///
    /// Deterministic: the same bytes in the same pulse always produce the
    /// same identifier.
    pub fn compute(content: &[u8], pulse: PulseNumber) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(RECORD_HASH_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(content);
        Self {
            pulse,
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// The all-zero identifier reserved for bootstrap.
    pub const fn zero() -> Self {
        Self {
            pulse: PulseNumber(0),
            hash: [0u8; HASH_SIZE],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.pulse.0 == 0 && self.hash == [0u8; HASH_SIZE]
    }

    /// Fixed-width encoding: big-endian pulse followed by the digest.
    pub fn to_bytes(&self) -> [u8; RECORD_ID_SIZE] {
        let mut out = [0u8; RECORD_ID_SIZE];
        out[..PulseNumber::SIZE].copy_from_slice(&self.pulse.to_be_bytes());
        out[PulseNumber::SIZE..].copy_from_slice(&self.hash);
        out
    }

    /// Parse the fixed-width encoding produced by [`RecordId::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != RECORD_ID_SIZE {
            return Err(TypeError::InvalidLength {
                expected: RECORD_ID_SIZE,
                actual: bytes.len(),
            });
        }
        let mut pulse = [0u8; PulseNumber::SIZE];
        pulse.copy_from_slice(&bytes[..PulseNumber::SIZE]);
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&bytes[PulseNumber::SIZE..]);
        Ok(Self {
            pulse: PulseNumber::from_be_bytes(pulse),
            hash,
        })
    }

    /// Short hex of the digest (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.hash[..4])
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({}:{})", self.pulse, self.short_hex())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pulse, hex::encode(self.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_deterministic() {
        let a = RecordId::compute(b"content", PulseNumber(5));
        let b = RecordId::compute(b"content", PulseNumber(5));
        assert_eq!(a, b);
    }

    #[test]
    fn pulse_changes_identity() {
        let a = RecordId::compute(b"content", PulseNumber(5));
        let b = RecordId::compute(b"content", PulseNumber(6));
        assert_ne!(a, b);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn content_changes_identity() {
        let a = RecordId::compute(b"one", PulseNumber(1));
        let b = RecordId::compute(b"two", PulseNumber(1));
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn hash_is_domain_separated() {
        let id = RecordId::compute(b"content", PulseNumber(1));
        assert_ne!(id.hash, *blake3::hash(b"content").as_bytes());
    }

    #[test]
    fn zero_is_zero() {
        assert!(RecordId::zero().is_zero());
        assert!(!RecordId::compute(b"", PulseNumber(0)).is_zero());
    }

    #[test]
    fn bytes_roundtrip() {
        let id = RecordId::compute(b"roundtrip", PulseNumber(0xdead_beef));
        let bytes = id.to_bytes();
        assert_eq!(&bytes[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(RecordId::from_bytes(&bytes).unwrap(), id);
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        let err = RecordId::from_bytes(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: RECORD_ID_SIZE,
                actual: 10
            }
        );
    }

    #[test]
    fn display_shows_pulse_and_full_hash() {
        let id = RecordId::compute(b"x", PulseNumber(3));
        let shown = format!("{id}");
        assert!(shown.starts_with("3:"));
        assert_eq!(shown.len(), 2 + 64);
    }
}
