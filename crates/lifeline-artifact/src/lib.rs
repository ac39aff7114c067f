//! Artifact manager for the lifeline ledger.
//!
//! Turns an entity's immutable record chain plus its mutable lifeline index
//! into a point-in-time view:
//!
//! - [`ObjectDescriptor`]: activation, latest amendment and delegates
//! - [`ClassDescriptor`]: activation, latest amendment and amend history
//!
//! The [`ArtifactManager`] is also the write path that keeps lifelines
//! consistent: every index read-modify-write runs under the store's
//! per-lifeline lock, so concurrent amendments or appends to one object are
//! never lost, even across managers sharing a store.

pub mod descriptor;
pub mod error;
pub mod manager;
pub mod registry;

pub use descriptor::{ClassDescriptor, ObjectDescriptor};
pub use error::{ArtifactError, ArtifactResult};
pub use manager::ArtifactManager;
pub use registry::ReferenceRegistry;
