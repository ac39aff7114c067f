//! Lifeline indices for the lifeline ledger.
//!
//! A lifeline is the mutable pointer layered over an entity's immutable
//! record chain. There is one index per activated entity:
//!
//! - [`ClassLifeline`]: the latest class amendment, if any
//! - [`ObjectLifeline`]: the latest object state plus attached delegates
//!
//! Indices are stored with the same tagged layout as records so that reading
//! the wrong kind of index fails loudly instead of misparsing. They carry no
//! validation of their own: the component that mutates an index is
//! responsible for the pointers it writes.

pub mod codec;
pub mod error;
pub mod lifeline;

pub use codec::{decode_class, decode_object, encode_class, encode_object, IndexKind};
pub use error::{IndexCodecError, IndexResult};
pub use lifeline::{ClassLifeline, ObjectLifeline};
