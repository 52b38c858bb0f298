//! Per-context instance caches and the calling thread's current context.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::error::{DiError, DiResult};
use crate::instance::InstanceRecord;
use crate::internal::{current_chain, ConstructionTracker};
use crate::lifecycle::{self, CreationLog};
use crate::observer::Observers;

/// Identifies one active context: `(scope name, context key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ContextKey {
    pub(crate) scope: String,
    pub(crate) context: String,
}

impl ContextKey {
    pub(crate) fn new(scope: &str, context: &str) -> Self {
        Self {
            scope: scope.to_string(),
            context: context.to_string(),
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.context)
    }
}

/// Instances of one active context.
#[derive(Default)]
pub(crate) struct ContextState {
    instances: RwLock<HashMap<String, Arc<InstanceRecord>>>,
    log: CreationLog,
    closed: AtomicBool,
}

/// All active contexts of a container.
#[derive(Default)]
pub(crate) struct ContextualStore {
    active: RwLock<HashMap<ContextKey, Arc<ContextState>>>,
}

impl ContextualStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Activates `key`. An identical key may not be active twice.
    pub(crate) fn begin(&self, key: ContextKey) -> DiResult<()> {
        let mut active = self.active.write();
        if active.contains_key(&key) {
            return Err(DiError::ScopeAlreadyActive {
                scope: key.scope,
                context: key.context,
            });
        }
        debug!(context = %key, "context started");
        active.insert(key, Arc::new(ContextState::default()));
        Ok(())
    }

    /// Deactivates `key`, returning its instances in creation order.
    pub(crate) fn end(&self, key: &ContextKey) -> DiResult<Vec<Arc<InstanceRecord>>> {
        let state = self
            .active
            .write()
            .remove(key)
            .ok_or_else(|| DiError::ScopeNotActive {
                scope: key.scope.clone(),
                context: Some(key.context.clone()),
            })?;
        debug!(context = %key, "context ended");
        Ok(Self::close(&state))
    }

    /// Deactivates every context.
    pub(crate) fn end_all(&self) -> Vec<(ContextKey, Vec<Arc<InstanceRecord>>)> {
        let drained: Vec<_> = self.active.write().drain().collect();
        drained
            .into_iter()
            .map(|(key, state)| {
                let records = Self::close(&state);
                (key, records)
            })
            .collect()
    }

    pub(crate) fn is_active(&self, key: &ContextKey) -> bool {
        self.active.read().contains_key(key)
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active.read().len()
    }

    /// Cached instance of `id` in the context, built on first access.
    ///
    /// A build that completes after the context ended is destroyed right away
    /// and reported as `ScopeNotActive`.
    pub(crate) fn get_or_build<F>(
        &self,
        key: &ContextKey,
        id: &str,
        container: u64,
        tracker: &ConstructionTracker,
        observers: &Observers,
        build: F,
    ) -> DiResult<Arc<InstanceRecord>>
    where
        F: FnOnce() -> DiResult<Arc<InstanceRecord>>,
    {
        let not_active = || DiError::ScopeNotActive {
            scope: key.scope.clone(),
            context: Some(key.context.clone()),
        };
        let state = self.active.read().get(key).cloned().ok_or_else(not_active)?;

        if let Some(record) = state.instances.read().get(id) {
            trace!(id, context = %key, "contextual cache hit");
            return Ok(record.clone());
        }

        let slot = format!("ctx:{}:{}", key, id);
        let _slot = tracker.acquire(&slot, id, || current_chain(container))?;

        if let Some(record) = state.instances.read().get(id) {
            return Ok(record.clone());
        }

        let record = build()?;

        let mut instances = state.instances.write();
        if state.closed.load(Ordering::Acquire) {
            drop(instances);
            warn!(id, context = %key, "context ended during construction; discarding instance");
            for e in lifecycle::run_destroy_all(vec![record], observers) {
                warn!(error = %e, "destroy hook of discarded instance failed");
            }
            return Err(not_active());
        }
        instances.insert(id.to_string(), record.clone());
        // Logged under the instances lock so `close` never misses it
        state.log.push(record.clone());
        Ok(record)
    }

    fn close(state: &ContextState) -> Vec<Arc<InstanceRecord>> {
        state.closed.store(true, Ordering::Release);
        let mut instances = state.instances.write();
        instances.clear();
        state.log.take()
    }
}

// (container id, scope name) -> context keys bound to the calling thread,
// innermost last
thread_local! {
    static BINDINGS: RefCell<HashMap<(u64, String), Vec<String>>> = RefCell::new(HashMap::new());
}

/// Makes `context` the calling thread's current context for `scope`, on top
/// of any binding it already has.
pub(crate) fn bind(container: u64, scope: &str, context: &str) {
    BINDINGS.with(|b| {
        b.borrow_mut()
            .entry((container, scope.to_string()))
            .or_default()
            .push(context.to_string())
    });
}

/// Drops every binding of `context` for `scope`; the binding below becomes
/// current again.
pub(crate) fn unbind(container: u64, scope: &str, context: &str) {
    update(container, scope, |stack| stack.retain(|c| c != context));
}

/// Drops the innermost binding of `context` for `scope`.
pub(crate) fn release(container: u64, scope: &str, context: &str) {
    update(container, scope, |stack| {
        if let Some(pos) = stack.iter().rposition(|c| c == context) {
            stack.remove(pos);
        }
    });
}

/// Forgets all of the calling thread's bindings for `container`.
pub(crate) fn unbind_container(container: u64) {
    let _ = BINDINGS.try_with(|b| b.borrow_mut().retain(|(owner, _), _| *owner != container));
}

fn update(container: u64, scope: &str, f: impl FnOnce(&mut Vec<String>)) {
    // try_with: guards may drop during thread teardown
    let _ = BINDINGS.try_with(|b| {
        let mut b = b.borrow_mut();
        let key = (container, scope.to_string());
        if let Some(stack) = b.get_mut(&key) {
            f(stack);
            if stack.is_empty() {
                b.remove(&key);
            }
        }
    });
}

/// The calling thread's current context for `scope`.
pub(crate) fn current(container: u64, scope: &str) -> Option<String> {
    BINDINGS.with(|b| {
        b.borrow()
            .get(&(container, scope.to_string()))
            .and_then(|stack| stack.last().cloned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::BeanDefinition;

    struct Bean;

    fn build(id: &str) -> DiResult<Arc<InstanceRecord>> {
        let definition = Arc::new(BeanDefinition::builder::<Bean>(id).factory(|_| Ok(Bean)));
        let record = Arc::new(InstanceRecord::new(definition, Arc::new(Bean)));
        lifecycle::run_init(&record)?;
        Ok(record)
    }

    #[test]
    fn test_begin_twice_fails() {
        let store = ContextualStore::new();
        store.begin(ContextKey::new("request", "r1")).unwrap();
        let err = store.begin(ContextKey::new("request", "r1")).unwrap_err();
        assert!(matches!(err, DiError::ScopeAlreadyActive { .. }));
        store.begin(ContextKey::new("request", "r2")).unwrap();
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn test_instances_are_per_context() {
        let store = ContextualStore::new();
        let tracker = ConstructionTracker::new();
        let observers = Observers::new();
        let r1 = ContextKey::new("request", "r1");
        let r2 = ContextKey::new("request", "r2");
        store.begin(r1.clone()).unwrap();
        store.begin(r2.clone()).unwrap();

        let a = store.get_or_build(&r1, "log", 0, &tracker, &observers, || build("log")).unwrap();
        let b = store.get_or_build(&r1, "log", 0, &tracker, &observers, || build("log")).unwrap();
        let c = store.get_or_build(&r2, "log", 0, &tracker, &observers, || build("log")).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));

        let ended = store.end(&r1).unwrap();
        assert_eq!(ended.len(), 1);
        assert!(!store.is_active(&r1));
        assert!(store.is_active(&r2));
    }

    #[test]
    fn test_get_after_end_fails() {
        let store = ContextualStore::new();
        let tracker = ConstructionTracker::new();
        let key = ContextKey::new("request", "r1");
        store.begin(key.clone()).unwrap();
        store.end(&key).unwrap();

        let err = store
            .get_or_build(&key, "log", 0, &tracker, &Observers::new(), || build("log"))
            .unwrap_err();
        assert!(matches!(err, DiError::ScopeNotActive { .. }));
        assert!(store.end(&key).is_err());
    }

    #[test]
    fn test_thread_bindings_nest() {
        assert_eq!(current(99, "request"), None);
        bind(99, "request", "r1");
        bind(99, "request", "r2");
        assert_eq!(current(99, "request").as_deref(), Some("r2"));

        // Attached twice, released once
        bind(99, "request", "r1");
        release(99, "request", "r1");
        assert_eq!(current(99, "request").as_deref(), Some("r2"));

        unbind(99, "request", "other");
        assert_eq!(current(99, "request").as_deref(), Some("r2"));
        unbind(99, "request", "r2");
        assert_eq!(current(99, "request").as_deref(), Some("r1"));

        bind(99, "session", "s1");
        unbind_container(99);
        assert_eq!(current(99, "request"), None);
        assert_eq!(current(99, "session"), None);
    }
}
