//! Container-lifetime instance cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::error::{DiError, DiResult};
use crate::instance::{InstanceRecord, InstanceState};
use crate::internal::{current_chain, ConstructionTracker};
use crate::lifecycle::{self, CreationLog};
use crate::observer::Observers;

/// One instance per singleton id for the life of the container.
///
/// Builds are serialized per id through the construction tracker, with a
/// double-checked cache lookup, so the factory of each id runs exactly once.
/// A failed build leaves nothing behind and the next request retries.
/// Once drained, the store stays closed: a build finishing afterwards is
/// destroyed and reported as `ShutDown`.
#[derive(Default)]
pub(crate) struct SingletonStore {
    cache: RwLock<HashMap<String, Arc<InstanceRecord>>>,
    log: CreationLog,
    closed: AtomicBool,
}

impl SingletonStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get_or_build<F>(
        &self,
        id: &str,
        container: u64,
        tracker: &ConstructionTracker,
        observers: &Observers,
        build: F,
    ) -> DiResult<Arc<InstanceRecord>>
    where
        F: FnOnce() -> DiResult<Arc<InstanceRecord>>,
    {
        // Fast path
        if let Some(record) = self.cache.read().get(id) {
            trace!(id, "singleton cache hit");
            return Ok(record.clone());
        }

        let slot = format!("singleton:{}", id);
        let _slot = tracker.acquire(&slot, id, || current_chain(container))?;

        // Double-check: another thread may have finished while we waited
        if let Some(record) = self.cache.read().get(id) {
            return Ok(record.clone());
        }

        let record = build()?;

        let mut cache = self.cache.write();
        if self.closed.load(Ordering::Acquire) {
            drop(cache);
            warn!(id, "container shut down during construction; discarding singleton");
            for e in lifecycle::run_destroy_all(vec![record], observers) {
                warn!(error = %e, "destroy hook of discarded singleton failed");
            }
            return Err(DiError::ShutDown);
        }
        cache.insert(id.to_string(), record.clone());
        // Logged under the cache lock so `drain` never misses it
        self.log.push(record.clone());
        Ok(record)
    }

    pub(crate) fn state(&self, id: &str) -> Option<InstanceState> {
        self.cache.read().get(id).map(|r| r.state())
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Empties the cache, returning records in creation order.
    pub(crate) fn drain(&self) -> Vec<Arc<InstanceRecord>> {
        self.closed.store(true, Ordering::Release);
        let mut cache = self.cache.write();
        cache.clear();
        self.log.take()
    }
}
