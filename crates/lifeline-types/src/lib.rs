//! Foundation types for the lifeline ledger.
//!
//! Every stored record is addressed by a [`Reference`]: the identifier of the
//! domain that owns it plus the identifier of the record itself. A
//! [`RecordId`] pairs a coarse time bucket ([`PulseNumber`]) with the BLAKE3
//! digest of the record's encoded content.
//!
//! # Key Types
//!
//! - [`PulseNumber`]: coarse epoch counter used to bucket records
//! - [`PulseSource`]: where the current pulse comes from
//! - [`RecordId`]: `(pulse, hash)` content identifier
//! - [`Reference`]: `(domain, record)` address with a fixed-width key form

pub mod error;
pub mod id;
pub mod pulse;
pub mod reference;

pub use error::TypeError;
pub use id::{RecordId, HASH_SIZE, RECORD_ID_SIZE};
pub use pulse::{ManualPulse, PulseNumber, PulseSource, SystemPulse};
pub use reference::{Reference, REFERENCE_KEY_SIZE};
