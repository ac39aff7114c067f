use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lifeline_types::Reference;

use crate::error::StoreError;

/// One mutex per lifeline, created on demand and dropped once idle.
#[derive(Debug, Default)]
pub(crate) struct LifelineLocks {
    table: Mutex<HashMap<Reference, Arc<Mutex<()>>>>,
}

impl LifelineLocks {
    /// Run `f` while holding the lock for `reference`.
    pub(crate) fn with_lock<T, E>(
        &self,
        reference: &Reference,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let lock = {
            let mut table = self
                .table
                .lock()
                .map_err(|_| StoreError::lock_poisoned("lifeline table"))?;
            Arc::clone(table.entry(*reference).or_default())
        };

        let result = {
            let _guard = lock
                .lock()
                .map_err(|_| StoreError::lock_poisoned("lifeline"))?;
            f()
        };

        let mut table = self
            .table
            .lock()
            .map_err(|_| StoreError::lock_poisoned("lifeline table"))?;
        // Only the table and this call hold it: nobody else is waiting.
        if Arc::strong_count(&lock) == 2 {
            table.remove(reference);
        }
        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use lifeline_types::{PulseNumber, RecordId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn reference() -> Reference {
        Reference::new(RecordId::zero(), RecordId::compute(b"locked", PulseNumber(1)))
    }

    #[test]
    fn returns_closure_result() {
        let locks = LifelineLocks::default();
        let value: StoreResult<i32> = locks.with_lock(&reference(), || Ok(7));
        assert_eq!(value.unwrap(), 7);
    }

    #[test]
    fn idle_locks_are_removed() {
        let locks = LifelineLocks::default();
        locks
            .with_lock(&reference(), || StoreResult::Ok(()))
            .unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn closure_error_is_returned_and_lock_released() {
        let locks = LifelineLocks::default();
        let err = locks
            .with_lock(&reference(), || -> StoreResult<()> { Err(StoreError::EngineClosed) })
            .unwrap_err();
        assert!(matches!(err, StoreError::EngineClosed));
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn serializes_critical_sections() {
        let locks = Arc::new(LifelineLocks::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    locks
                        .with_lock(&reference(), || {
                            assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                            thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                            StoreResult::Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
    }
}
