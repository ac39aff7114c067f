//! Record model for the lifeline ledger.
//!
//! Records are the immutable, content-addressed units of ledger data. Every
//! record belongs to a domain and is one of five closed variants:
//!
//! - [`ClassActivateRecord`]: declares a class
//! - [`ClassAmendRecord`]: supersedes a class's code
//! - [`ObjectActivateRecord`]: declares an object with its initial memory
//! - [`ObjectAmendRecord`]: replaces an object's memory wholesale
//! - [`ObjectAppendRecord`]: attaches delegate memory to an object
//!
//! On disk a record is a tagged envelope: one discriminator byte followed by
//! the bincode body. Encoding is deterministic because record addresses are
//! derived from the encoded bytes.

pub mod codec;
pub mod error;
pub mod record;

pub use codec::{decode, encode};
pub use error::{CodecError, CodecResult};
pub use record::{
    ClassActivateRecord, ClassAmendRecord, Memory, ObjectActivateRecord, ObjectAmendRecord,
    ObjectAppendRecord, Record, RecordKind,
};
