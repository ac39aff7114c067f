use serde::{Deserialize, Serialize};

use lifeline_types::Reference;

/// Opaque contract state payload.
pub type Memory = Vec<u8>;

/// Discriminator for the record variants.
///
/// The tag bytes are part of the on-disk format and must never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordKind {
    ClassActivate = 1,
    ClassAmend = 2,
    ObjectActivate = 3,
    ObjectAmend = 4,
    ObjectAppend = 5,
}

impl RecordKind {
    /// The envelope discriminator byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Map a discriminator byte back to a kind.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::ClassActivate),
            2 => Some(Self::ClassAmend),
            3 => Some(Self::ObjectActivate),
            4 => Some(Self::ObjectAmend),
            5 => Some(Self::ObjectAppend),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassActivate => write!(f, "class-activate"),
            Self::ClassAmend => write!(f, "class-amend"),
            Self::ObjectActivate => write!(f, "object-activate"),
            Self::ObjectAmend => write!(f, "object-amend"),
            Self::ObjectAppend => write!(f, "object-append"),
        }
    }
}

// ---------------------------------------------------------------------------
// Class records
// ---------------------------------------------------------------------------

/// Declares a new class.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassActivateRecord {
    pub domain: Reference,
    /// Initial class metadata (code blob).
    pub code: Vec<u8>,
}

/// Supersedes a class's metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAmendRecord {
    pub domain: Reference,
    /// The class state this amendment replaces: the activation for the first
    /// amendment, the previous amendment afterwards.
    pub previous: Reference,
    pub new_code: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Object records
// ---------------------------------------------------------------------------

/// Declares a new object instance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectActivateRecord {
    pub domain: Reference,
    /// Class activation this object instantiates.
    pub class: Reference,
    pub memory: Memory,
}

/// Replaces an object's memory wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAmendRecord {
    pub domain: Reference,
    pub previous: Reference,
    pub new_memory: Memory,
}

/// Attaches memory that lives alongside an object's primary state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAppendRecord {
    pub domain: Reference,
    pub append_memory: Memory,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Any record that can be stored in the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    ClassActivate(ClassActivateRecord),
    ClassAmend(ClassAmendRecord),
    ObjectActivate(ObjectActivateRecord),
    ObjectAmend(ObjectAmendRecord),
    ObjectAppend(ObjectAppendRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::ClassActivate(_) => RecordKind::ClassActivate,
            Self::ClassAmend(_) => RecordKind::ClassAmend,
            Self::ObjectActivate(_) => RecordKind::ObjectActivate,
            Self::ObjectAmend(_) => RecordKind::ObjectAmend,
            Self::ObjectAppend(_) => RecordKind::ObjectAppend,
        }
    }

    /// The domain this record belongs to.
    pub fn domain(&self) -> &Reference {
        match self {
            Self::ClassActivate(r) => &r.domain,
            Self::ClassAmend(r) => &r.domain,
            Self::ObjectActivate(r) => &r.domain,
            Self::ObjectAmend(r) => &r.domain,
            Self::ObjectAppend(r) => &r.domain,
        }
    }

    /// The payload relevant to reconstruction: memory for object records,
    /// code for class records.
    pub fn memory(&self) -> &[u8] {
        match self {
            Self::ClassActivate(r) => &r.code,
            Self::ClassAmend(r) => &r.new_code,
            Self::ObjectActivate(r) => &r.memory,
            Self::ObjectAmend(r) => &r.new_memory,
            Self::ObjectAppend(r) => &r.append_memory,
        }
    }

    /// Encode into the tagged envelope.
    pub fn encode(&self) -> crate::CodecResult<Vec<u8>> {
        crate::codec::encode(self)
    }

    /// Decode a tagged envelope.
    pub fn decode(bytes: &[u8]) -> crate::CodecResult<Self> {
        crate::codec::decode(bytes)
    }
}

macro_rules! record_variant {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Record {
            fn from(record: $ty) -> Self {
                Record::$variant(record)
            }
        }

        impl TryFrom<Record> for $ty {
            type Error = Record;

            fn try_from(record: Record) -> Result<Self, Record> {
                match record {
                    Record::$variant(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }
    };
}

record_variant!(ClassActivate, ClassActivateRecord);
record_variant!(ClassAmend, ClassAmendRecord);
record_variant!(ObjectActivate, ObjectActivateRecord);
record_variant!(ObjectAmend, ObjectAmendRecord);
record_variant!(ObjectAppend, ObjectAppendRecord);
