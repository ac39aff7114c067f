use std::sync::Arc;

use tracing::debug;

use lifeline_index::{ClassLifeline, ObjectLifeline};
use lifeline_record::{
    ClassActivateRecord, ClassAmendRecord, Memory, ObjectActivateRecord, ObjectAmendRecord,
    ObjectAppendRecord, Record, RecordKind,
};
use lifeline_store::{LedgerStore, StoreError};
use lifeline_types::Reference;

use crate::descriptor::{fetch_as, ClassDescriptor, ObjectDescriptor};
use crate::error::ArtifactResult;
use crate::registry::ReferenceRegistry;

/// Reads and writes classes and objects on top of a [`LedgerStore`].
///
/// Every mutation of an existing lifeline runs under the store's lock for
/// that lifeline, so the index read-modify-write cycle never loses a
/// concurrent update. Any number of managers may share one store.
#[derive(Debug)]
pub struct ArtifactManager {
    store: Arc<LedgerStore>,
    registry: ReferenceRegistry,
}

impl ArtifactManager {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self {
            store,
            registry: ReferenceRegistry::new(),
        }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Assemble the current view of the object activated at `reference`.
    pub fn get_object_descriptor(&self, reference: &Reference) -> ArtifactResult<ObjectDescriptor<'_>> {
        let activation: ObjectActivateRecord =
            fetch_as(&self.store, reference, RecordKind::ObjectActivate)?;
        let lifeline = self.store.get_object_index(reference)?;

        let latest_amend = if lifeline.is_amended(reference) {
            Some(fetch_as::<ObjectAmendRecord>(
                &self.store,
                &lifeline.latest_state,
                RecordKind::ObjectAmend,
            )?)
        } else {
            None
        };

        Ok(ObjectDescriptor::new(
            &self.store,
            *reference,
            activation,
            latest_amend,
            lifeline,
        ))
    }

    /// Assemble the current view of the class activated at `reference`.
    pub fn get_class_descriptor(&self, reference: &Reference) -> ArtifactResult<ClassDescriptor<'_>> {
        let activation: ClassActivateRecord =
            fetch_as(&self.store, reference, RecordKind::ClassActivate)?;
        let lifeline = self.store.get_class_index(reference)?;

        let latest_amend = match lifeline.latest_amend {
            Some(amend) => Some(fetch_as::<ClassAmendRecord>(
                &self.store,
                &amend,
                RecordKind::ClassAmend,
            )?),
            None => None,
        };

        Ok(ClassDescriptor::new(
            &self.store,
            *reference,
            activation,
            latest_amend,
            lifeline,
        ))
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    /// Write a class activation and create its lifeline.
    ///
    /// Activating identical content again in the same pulse returns the
    /// existing reference and leaves its lifeline untouched.
    pub fn activate_class(&self, domain: Reference, code: Memory) -> ArtifactResult<Reference> {
        let record = Record::from(ClassActivateRecord { domain, code });
        let reference = self.store.set_record(&record)?;

        self.store.with_lifeline_lock(&reference, || -> ArtifactResult<_> {
            if self.lifeline_exists(self.store.get_class_index(&reference))? {
                debug!(class = %reference, "class already active");
                return Ok(());
            }
            self.store.set_class_index(&reference, &ClassLifeline::new())?;
            Ok(())
        })?;

        debug!(class = %reference, "class activated");
        Ok(reference)
    }

    /// Replace a class's code, chaining the amendment after its latest state.
    pub fn amend_class(&self, class: &Reference, new_code: Memory) -> ArtifactResult<Reference> {
        let activation: ClassActivateRecord =
            fetch_as(&self.store, class, RecordKind::ClassActivate)?;

        self.store.with_lifeline_lock(class, || -> ArtifactResult<_> {
            let mut lifeline = self.store.get_class_index(class)?;
            let record = Record::from(ClassAmendRecord {
                domain: activation.domain,
                previous: lifeline.latest_state(class),
                new_code,
            });
            let amend = self.store.set_record(&record)?;
            lifeline.set_latest_amend(amend);
            self.store.set_class_index(class, &lifeline)?;
            debug!(class = %class, amend = %amend, "class amended");
            Ok(amend)
        })
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Write an object activation for `class` and create its lifeline.
    ///
    /// `class` must refer to a class activation record.
    pub fn activate_object(
        &self,
        domain: Reference,
        class: &Reference,
        memory: Memory,
    ) -> ArtifactResult<Reference> {
        fetch_as::<ClassActivateRecord>(&self.store, class, RecordKind::ClassActivate)?;

        let record = Record::from(ObjectActivateRecord {
            domain,
            class: *class,
            memory,
        });
        let reference = self.store.set_record(&record)?;

        self.store.with_lifeline_lock(&reference, || -> ArtifactResult<_> {
            if self.lifeline_exists(self.store.get_object_index(&reference))? {
                debug!(object = %reference, "object already active");
                return Ok(());
            }
            self.store
                .set_object_index(&reference, &ObjectLifeline::new(reference, *class))?;
            Ok(())
        })?;

        debug!(object = %reference, class = %class, "object activated");
        Ok(reference)
    }

    /// Replace an object's memory, chaining the amendment after its latest
    /// state.
    pub fn amend_object(&self, object: &Reference, new_memory: Memory) -> ArtifactResult<Reference> {
        let activation: ObjectActivateRecord =
            fetch_as(&self.store, object, RecordKind::ObjectActivate)?;

        self.store.with_lifeline_lock(object, || -> ArtifactResult<_> {
            let mut lifeline = self.store.get_object_index(object)?;
            let record = Record::from(ObjectAmendRecord {
                domain: activation.domain,
                previous: lifeline.latest_state,
                new_memory,
            });
            let amend = self.store.set_record(&record)?;
            lifeline.set_latest_state(amend);
            self.store.set_object_index(object, &lifeline)?;
            debug!(object = %object, amend = %amend, "object amended");
            Ok(amend)
        })
    }

    /// Attach a delegate to an object after all existing ones.
    pub fn append_object(&self, object: &Reference, append_memory: Memory) -> ArtifactResult<Reference> {
        let activation: ObjectActivateRecord =
            fetch_as(&self.store, object, RecordKind::ObjectActivate)?;

        self.store.with_lifeline_lock(object, || -> ArtifactResult<_> {
            let mut lifeline = self.store.get_object_index(object)?;
            let record = Record::from(ObjectAppendRecord {
                domain: activation.domain,
                append_memory,
            });
            let append = self.store.set_record(&record)?;
            lifeline.push_append(append);
            self.store.set_object_index(object, &lifeline)?;
            debug!(
                object = %object,
                append = %append,
                delegates = lifeline.append_refs.len(),
                "delegate appended"
            );
            Ok(append)
        })
    }

    /// `Ok(true)` when the lookup found a lifeline, `Ok(false)` when none is
    /// stored, any other failure propagated.
    fn lifeline_exists<T>(&self, lookup: Result<T, StoreError>) -> ArtifactResult<bool> {
        match lookup {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
