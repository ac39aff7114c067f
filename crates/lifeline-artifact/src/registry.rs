//! Cross-domain reference registry.
//!
//! Published references are looked up by a string key, either the
//! reference's own hex form or a well-known name. A registry belongs to one
//! [`ArtifactManager`](crate::ArtifactManager) and lives exactly as long as
//! it; there is no process-wide instance.

use std::collections::HashMap;
use std::sync::RwLock;

use lifeline_types::Reference;

use crate::error::{ArtifactError, ArtifactResult};

#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    entries: RwLock<HashMap<String, Reference>>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `reference` under its hex key and return the key.
    pub fn register(&self, reference: Reference) -> ArtifactResult<String> {
        let key = reference.to_hex();
        self.register_named(key.clone(), reference)?;
        Ok(key)
    }

    /// Publish `reference` under an explicit name, replacing any previous
    /// entry with that name.
    pub fn register_named(&self, name: impl Into<String>, reference: Reference) -> ArtifactResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ArtifactError::LockPoisoned("registry"))?;
        entries.insert(name.into(), reference);
        Ok(())
    }

    /// Look up a published reference.
    pub fn resolve(&self, key: &str) -> ArtifactResult<Reference> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ArtifactError::LockPoisoned("registry"))?;
        entries
            .get(key)
            .copied()
            .ok_or_else(|| ArtifactError::UnknownReference(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
