use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use lifeline_index::{ClassLifeline, IndexKind, ObjectLifeline};
use lifeline_record::{ClassActivateRecord, Record};
use lifeline_types::{PulseNumber, PulseSource, RecordId, Reference};

use crate::backend::KvBackend;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::locks::LifelineLocks;
use crate::scope::{scoped_key, Scope};

/// The ledger's persistence engine.
///
/// Wraps a [`KvBackend`] with scoped keys, content-addressed record writes
/// and lifeline index storage. Shared between threads behind an `Arc`; all
/// calls block for the duration of a local backend access.
pub struct LedgerStore {
    backend: Box<dyn KvBackend>,
    pulse: Arc<dyn PulseSource>,
    locks: LifelineLocks,
    closed: AtomicBool,
}

impl LedgerStore {
    /// Open the configured backend and bootstrap it.
    pub fn initialize(config: &StoreConfig) -> StoreResult<Self> {
        let backend = config.open_backend()?;
        Self::open(backend, Arc::new(config.pulse_source()))
    }

    /// Wrap an already opened backend, writing the zero record if it is
    /// missing.
    pub fn open(backend: Box<dyn KvBackend>, pulse: Arc<dyn PulseSource>) -> StoreResult<Self> {
        let store = Self {
            backend,
            pulse,
            locks: LifelineLocks::default(),
            closed: AtomicBool::new(false),
        };
        store.bootstrap()?;
        info!(pulse = %store.pulse.current(), "ledger store ready");
        Ok(store)
    }

    /// The reserved reference under which the bootstrap record lives.
    pub fn zero_reference(&self) -> Reference {
        Reference::zero()
    }

    /// The pulse new records are currently addressed under.
    pub fn current_pulse(&self) -> PulseNumber {
        self.pulse.current()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    /// Fetch and decode the record stored at `reference`.
    pub fn get_record(&self, reference: &Reference) -> StoreResult<Record> {
        let bytes = self.read(Scope::Record, reference)?;
        Record::decode(&bytes).map_err(|e| StoreError::CorruptRecord {
            reference: *reference,
            expected: "record".into(),
            reason: e.to_string(),
        })
    }

    /// Persist `record` and return its address.
    ///
    /// The address is the record's domain plus the hash of its encoded bytes
    /// in the current pulse, so writing identical content again within the
    /// same pulse rewrites the same key.
    pub fn set_record(&self, record: &Record) -> StoreResult<Reference> {
        self.ensure_open()?;
        let bytes = record
            .encode()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let pulse = self.pulse.current();
        let reference = Reference::new(record.domain().record, RecordId::compute(&bytes, pulse));
        self.backend
            .put(&scoped_key(Scope::Record, &reference), &bytes)?;
        debug!(reference = %reference, kind = %record.kind(), "record written");
        Ok(reference)
    }

    // -----------------------------------------------------------------------
    // Lifeline indices
    // -----------------------------------------------------------------------

    pub fn get_class_index(&self, reference: &Reference) -> StoreResult<ClassLifeline> {
        let bytes = self.read(Scope::Lifeline, reference)?;
        lifeline_index::decode_class(&bytes).map_err(|e| StoreError::CorruptRecord {
            reference: *reference,
            expected: IndexKind::Class.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn set_class_index(&self, reference: &Reference, index: &ClassLifeline) -> StoreResult<()> {
        let bytes = lifeline_index::encode_class(index)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write(Scope::Lifeline, reference, &bytes)?;
        debug!(reference = %reference, "class lifeline written");
        Ok(())
    }

    pub fn get_object_index(&self, reference: &Reference) -> StoreResult<ObjectLifeline> {
        let bytes = self.read(Scope::Lifeline, reference)?;
        lifeline_index::decode_object(&bytes).map_err(|e| StoreError::CorruptRecord {
            reference: *reference,
            expected: IndexKind::Object.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn set_object_index(
        &self,
        reference: &Reference,
        index: &ObjectLifeline,
    ) -> StoreResult<()> {
        let bytes = lifeline_index::encode_object(index)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write(Scope::Lifeline, reference, &bytes)?;
        debug!(
            reference = %reference,
            latest = %index.latest_state,
            appends = index.append_refs.len(),
            "object lifeline written"
        );
        Ok(())
    }

    /// Run `f` while holding the lock for the lifeline at `reference`.
    ///
    /// Index writes themselves are last-physical-write-wins; writers that
    /// read an index, change it and write it back do so in here. The lock
    /// table belongs to the store, so every handle sharing it is serialized.
    pub fn with_lifeline_lock<T, E>(
        &self,
        reference: &Reference,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.locks.with_lock(reference, f)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Release the backend. Every later call fails with
    /// [`StoreError::EngineClosed`], including a second `close`.
    pub fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::EngineClosed);
        }
        self.backend.close()?;
        info!("ledger store closed");
        Ok(())
    }

    /// Erase the entire backing store and re-write the zero record.
    ///
    /// Only meant for tests and re-bootstrapping.
    pub fn drop_all(&self) -> StoreResult<()> {
        self.ensure_open()?;
        warn!("dropping all ledger data");
        self.backend.delete_all()?;
        self.bootstrap()
    }

    fn bootstrap(&self) -> StoreResult<()> {
        let key = scoped_key(Scope::Record, &Reference::zero());
        if self.backend.contains(&key)? {
            return Ok(());
        }
        let bytes = zero_record()
            .encode()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.put(&key, &bytes)?;
        info!("wrote bootstrap zero record");
        Ok(())
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_closed() {
            return Err(StoreError::EngineClosed);
        }
        Ok(())
    }

    fn read(&self, scope: Scope, reference: &Reference) -> StoreResult<Vec<u8>> {
        self.ensure_open()?;
        self.backend
            .get(&scoped_key(scope, reference))?
            .ok_or(StoreError::NotFound {
                scope,
                reference: *reference,
            })
    }

    fn write(&self, scope: Scope, reference: &Reference, bytes: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        self.backend.put(&scoped_key(scope, reference), bytes)
    }
}

/// Placeholder stored at the zero reference: an empty class activation.
fn zero_record() -> Record {
    Record::ClassActivate(ClassActivateRecord {
        domain: Reference::zero(),
        code: Vec::new(),
    })
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("pulse", &self.pulse.current())
            .field("closed", &self.is_closed())
            .finish()
    }
}
