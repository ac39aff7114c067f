use std::collections::HashSet;

use lifeline_index::{ClassLifeline, ObjectLifeline};
use lifeline_record::{
    ClassActivateRecord, ClassAmendRecord, Memory, ObjectActivateRecord, ObjectAmendRecord,
    ObjectAppendRecord, Record, RecordKind,
};
use lifeline_store::{LedgerStore, StoreError};
use lifeline_types::Reference;

use crate::error::ArtifactResult;

/// Fetch the record at `reference` and insist it is of variant `T`.
///
/// A record of another kind is reported as corrupt, naming both kinds.
pub(crate) fn fetch_as<T>(
    store: &LedgerStore,
    reference: &Reference,
    expected: RecordKind,
) -> ArtifactResult<T>
where
    T: TryFrom<Record, Error = Record>,
{
    let record = store.get_record(reference)?;
    T::try_from(record).map_err(|found| {
        StoreError::CorruptRecord {
            reference: *reference,
            expected: expected.to_string(),
            reason: format!("found {} record", found.kind()),
        }
        .into()
    })
}

// ---------------------------------------------------------------------------
// ObjectDescriptor
// ---------------------------------------------------------------------------

/// Point-in-time view of an object.
///
/// Built from the activation record, the latest amendment (if the object has
/// been amended) and the lifeline index as they were when the descriptor was
/// assembled. Delegates are resolved lazily from the same store.
#[derive(Debug)]
pub struct ObjectDescriptor<'a> {
    store: &'a LedgerStore,
    reference: Reference,
    activation: ObjectActivateRecord,
    latest_amend: Option<ObjectAmendRecord>,
    lifeline: ObjectLifeline,
}

impl<'a> ObjectDescriptor<'a> {
    pub fn new(
        store: &'a LedgerStore,
        reference: Reference,
        activation: ObjectActivateRecord,
        latest_amend: Option<ObjectAmendRecord>,
        lifeline: ObjectLifeline,
    ) -> Self {
        Self {
            store,
            reference,
            activation,
            latest_amend,
            lifeline,
        }
    }

    /// The object's activation reference.
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn class(&self) -> &Reference {
        &self.activation.class
    }

    pub fn activation(&self) -> &ObjectActivateRecord {
        &self.activation
    }

    pub fn latest_amend(&self) -> Option<&ObjectAmendRecord> {
        self.latest_amend.as_ref()
    }

    pub fn lifeline(&self) -> &ObjectLifeline {
        &self.lifeline
    }

    /// Current memory: the latest amendment wins, otherwise the object is
    /// still in its activated state.
    pub fn memory(&self) -> &[u8] {
        match &self.latest_amend {
            Some(amend) => &amend.new_memory,
            None => &self.activation.memory,
        }
    }

    /// Memory of every attached delegate, in attachment order.
    ///
    /// Stops at the first reference that cannot be fetched or is not an
    /// append record.
    pub fn delegates(&self) -> ArtifactResult<Vec<Memory>> {
        self.lifeline
            .append_refs
            .iter()
            .map(|r| {
                fetch_as::<ObjectAppendRecord>(self.store, r, RecordKind::ObjectAppend)
                    .map(|append| append.append_memory)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ClassDescriptor
// ---------------------------------------------------------------------------

/// Point-in-time view of a class.
#[derive(Debug)]
pub struct ClassDescriptor<'a> {
    store: &'a LedgerStore,
    reference: Reference,
    activation: ClassActivateRecord,
    latest_amend: Option<ClassAmendRecord>,
    lifeline: ClassLifeline,
}

impl<'a> ClassDescriptor<'a> {
    pub fn new(
        store: &'a LedgerStore,
        reference: Reference,
        activation: ClassActivateRecord,
        latest_amend: Option<ClassAmendRecord>,
        lifeline: ClassLifeline,
    ) -> Self {
        Self {
            store,
            reference,
            activation,
            latest_amend,
            lifeline,
        }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn activation(&self) -> &ClassActivateRecord {
        &self.activation
    }

    pub fn latest_amend(&self) -> Option<&ClassAmendRecord> {
        self.latest_amend.as_ref()
    }

    pub fn lifeline(&self) -> &ClassLifeline {
        &self.lifeline
    }

    /// Current class code.
    pub fn code(&self) -> &[u8] {
        match &self.latest_amend {
            Some(amend) => &amend.new_code,
            None => &self.activation.code,
        }
    }

    /// Every state of the class, newest first, ending with the activation.
    pub fn history(&self) -> ArtifactResult<Vec<Reference>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.lifeline.latest_state(&self.reference);

        while cursor != self.reference {
            if !seen.insert(cursor) {
                return Err(StoreError::CorruptRecord {
                    reference: cursor,
                    expected: RecordKind::ClassAmend.to_string(),
                    reason: "amendment chain loops".into(),
                }
                .into());
            }
            let amend: ClassAmendRecord = fetch_as(self.store, &cursor, RecordKind::ClassAmend)?;
            chain.push(cursor);
            cursor = amend.previous;
        }
        chain.push(self.reference);
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use lifeline_store::StoreConfig;
    use lifeline_types::{PulseNumber, RecordId};

    use crate::ArtifactManager;

    fn store() -> LedgerStore {
        LedgerStore::initialize(&StoreConfig::in_memory()).unwrap()
    }

    fn domain() -> Reference {
        Reference::new(RecordId::zero(), RecordId::compute(b"domain", PulseNumber(1)))
    }

    /// Writes a bare object activation and its lifeline, the way a ledger
    /// would before any amendment.
    fn activated(store: &LedgerStore) -> (Reference, ObjectActivateRecord) {
        let activation = ObjectActivateRecord {
            memory: vec![1],
            ..Default::default()
        };
        let reference = store.set_record(&activation.clone().into()).unwrap();
        (reference, activation)
    }

    // ---- memory ---------------------------------------------------------------

    #[test]
    fn memory_falls_back_to_activation() {
        let store = store();
        let (obj, activation) = activated(&store);
        let amend = ObjectAmendRecord {
            previous: obj,
            new_memory: vec![2],
            ..Default::default()
        };
        let amend_ref = store.set_record(&amend.clone().into()).unwrap();
        let mut lifeline = ObjectLifeline::new(obj, Reference::zero());
        lifeline.set_latest_state(amend_ref);
        store.set_object_index(&obj, &lifeline).unwrap();

        let desc = ObjectDescriptor::new(&store, obj, activation.clone(), None, lifeline.clone());
        assert_eq!(desc.memory(), &[1]);

        let desc = ObjectDescriptor::new(&store, obj, activation, Some(amend), lifeline);
        assert_eq!(desc.memory(), &[2]);
    }

    #[test]
    fn last_amendment_wins() {
        let store = Arc::new(store());
        let manager = ArtifactManager::new(Arc::clone(&store));
        let class = manager.activate_class(domain(), b"class".to_vec()).unwrap();
        let obj = manager.activate_object(domain(), &class, vec![0]).unwrap();
        manager.amend_object(&obj, b"M1".to_vec()).unwrap();
        manager.amend_object(&obj, b"M2".to_vec()).unwrap();

        let desc = manager.get_object_descriptor(&obj).unwrap();
        assert_eq!(desc.memory(), b"M2");
    }

    // ---- delegates ------------------------------------------------------------

    #[test]
    fn delegates_in_attachment_order() {
        let store = store();
        let (obj, activation) = activated(&store);
        let write = |memory: u8| {
            let append = ObjectAppendRecord {
                append_memory: vec![memory],
                ..Default::default()
            };
            store.set_record(&append.into()).unwrap()
        };
        // Stored in a different order than they are attached.
        let d3 = write(3);
        let d1 = write(1);
        let d2 = write(2);

        let mut lifeline = ObjectLifeline::new(obj, Reference::zero());
        for d in [d1, d2, d3] {
            lifeline.push_append(d);
        }
        store.set_object_index(&obj, &lifeline).unwrap();

        let desc = ObjectDescriptor::new(&store, obj, activation, None, lifeline);
        assert_eq!(desc.delegates().unwrap(), vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn activate_amend_append_scenario() {
        let store = Arc::new(store());
        let manager = ArtifactManager::new(Arc::clone(&store));
        let class = manager.activate_class(domain(), b"class".to_vec()).unwrap();
        let obj = manager.activate_object(domain(), &class, vec![1]).unwrap();
        manager.amend_object(&obj, vec![2]).unwrap();
        manager.append_object(&obj, vec![2]).unwrap();
        manager.append_object(&obj, vec![3]).unwrap();

        let desc = manager.get_object_descriptor(&obj).unwrap();
        assert_eq!(desc.memory(), &[2]);
        assert_eq!(desc.delegates().unwrap(), vec![vec![2], vec![3]]);
        assert_eq!(desc.lifeline().append_refs.len(), 2);
    }

    #[test]
    fn non_append_delegate_is_corrupt() {
        let store = store();
        let (obj, activation) = activated(&store);
        let mut lifeline = ObjectLifeline::new(obj, Reference::zero());
        lifeline.push_append(obj);

        let desc = ObjectDescriptor::new(&store, obj, activation, None, lifeline);
        match desc.delegates().unwrap_err() {
            crate::ArtifactError::Store(StoreError::CorruptRecord { expected, reason, .. }) => {
                assert_eq!(expected, RecordKind::ObjectAppend.to_string());
                assert!(reason.contains("object-activate"));
            }
            other => panic!("expected CorruptRecord, got {other:?}"),
        }
    }

    #[test]
    fn missing_delegate_is_not_found() {
        let store = store();
        let (obj, activation) = activated(&store);
        let mut lifeline = ObjectLifeline::new(obj, Reference::zero());
        lifeline.push_append(Reference::new(
            RecordId::zero(),
            RecordId::compute(b"gone", PulseNumber(1)),
        ));

        let desc = ObjectDescriptor::new(&store, obj, activation, None, lifeline);
        assert!(desc.delegates().unwrap_err().is_not_found());
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let store = Arc::new(store());
        let manager = Arc::new(ArtifactManager::new(Arc::clone(&store)));
        let class = manager.activate_class(domain(), b"class".to_vec()).unwrap();
        let obj = manager.activate_object(domain(), &class, vec![1]).unwrap();

        let handles: Vec<_> = (0u8..8)
            .map(|i| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.append_object(&obj, vec![i]).unwrap())
            })
            .collect();
        for h in handles {
            h.join().expect("append thread should not panic");
        }

        let desc = manager.get_object_descriptor(&obj).unwrap();
        let mut delegates = desc.delegates().unwrap();
        delegates.sort();
        assert_eq!(delegates, (0u8..8).map(|i| vec![i]).collect::<Vec<_>>());
    }

    // ---- classes --------------------------------------------------------------

    #[test]
    fn class_history_walks_back_to_activation() {
        let store = Arc::new(store());
        let manager = ArtifactManager::new(Arc::clone(&store));
        let class = manager.activate_class(domain(), b"v1".to_vec()).unwrap();
        let v2 = manager.amend_class(&class, b"v2".to_vec()).unwrap();
        let v3 = manager.amend_class(&class, b"v3".to_vec()).unwrap();

        let desc = manager.get_class_descriptor(&class).unwrap();
        assert_eq!(desc.code(), b"v3");
        assert_eq!(desc.history().unwrap(), vec![v3, v2, class]);
    }

    #[test]
    fn unamended_class_history_is_activation_only() {
        let store = Arc::new(store());
        let manager = ArtifactManager::new(Arc::clone(&store));
        let class = manager.activate_class(domain(), b"v1".to_vec()).unwrap();

        let desc = manager.get_class_descriptor(&class).unwrap();
        assert_eq!(desc.code(), b"v1");
        assert!(desc.latest_amend().is_none());
        assert_eq!(desc.history().unwrap(), vec![class]);
    }

    #[test]
    fn broken_amendment_chain_is_corrupt() {
        let store = store();
        let activation = ClassActivateRecord {
            code: b"v1".to_vec(),
            ..Default::default()
        };
        let class = store.set_record(&activation.clone().into()).unwrap();
        // Chained onto the zero record rather than onto `class`.
        let stray = ClassAmendRecord {
            new_code: b"v2".to_vec(),
            ..Default::default()
        };
        let stray_ref = store.set_record(&stray.into()).unwrap();
        let mut lifeline = ClassLifeline::new();
        lifeline.set_latest_amend(stray_ref);

        let desc = ClassDescriptor::new(&store, class, activation, None, lifeline);
        match desc.history().unwrap_err() {
            crate::ArtifactError::Store(StoreError::CorruptRecord { reference, .. }) => {
                assert_eq!(reference, store.zero_reference());
            }
            other => panic!("expected CorruptRecord, got {other:?}"),
        }
    }
}
