//! Diagnostic observers for container events.
//!
//! Observers receive bean creation, destruction and resolution failures. They
//! run synchronously on the resolving thread, so keep implementations cheap.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::DiError;
use crate::scope::Scope;

/// Observer trait for container events.
///
/// Every method has a no-op default, so implementors override only what they
/// need. Register observers with
/// [`Container::add_observer`](crate::Container::add_observer) before sealing.
///
/// # Examples
///
/// ```
/// use beanpod::{BeanDefinition, Container, ContainerObserver, Scope};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     created: AtomicUsize,
/// }
///
/// impl ContainerObserver for CountingObserver {
///     fn bean_created(&self, _id: &str, _scope: &Scope, _elapsed: Duration) {
///         self.created.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// struct Clock;
///
/// let observer = Arc::new(CountingObserver::default());
/// let container = Container::new();
/// container.add_observer(observer.clone()).unwrap();
/// container
///     .register(BeanDefinition::builder::<Clock>("clock").prototype().factory(|_| Ok(Clock)))
///     .unwrap();
/// container.seal().unwrap();
///
/// container.get_bean::<Clock>().unwrap();
/// container.get_bean::<Clock>().unwrap();
/// assert_eq!(observer.created.load(Ordering::Relaxed), 2);
/// ```
pub trait ContainerObserver: Send + Sync {
    /// A bean reached `Initialized`. `elapsed` covers dependency resolution,
    /// the factory and the init hook.
    fn bean_created(&self, id: &str, scope: &Scope, elapsed: Duration) {
        let _ = (id, scope, elapsed);
    }

    /// A bean's destroy hook ran (or it had none) and it is now `Destroyed`.
    fn bean_destroyed(&self, id: &str) {
        let _ = id;
    }

    /// A top-level lookup failed.
    fn resolution_failed(&self, capability: &str, error: &DiError) {
        let _ = (capability, error);
    }
}

/// Registered observers.
///
/// Near-zero overhead when empty.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ContainerObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn bean_created(&self, id: &str, scope: &Scope, elapsed: Duration) {
        for observer in &self.observers {
            observer.bean_created(id, scope, elapsed);
        }
    }

    #[inline]
    pub(crate) fn bean_destroyed(&self, id: &str) {
        for observer in &self.observers {
            observer.bean_destroyed(id);
        }
    }

    #[inline]
    pub(crate) fn resolution_failed(&self, capability: &str, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(capability, error);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// The container already logs at `debug`/`trace`; this observer adds one
/// event per bean under the `beanpod::observer` target, which is convenient
/// to enable on its own with an env filter.
///
/// # Examples
///
/// ```
/// use beanpod::{Container, TracingObserver};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.add_observer(Arc::new(TracingObserver::new())).unwrap();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerObserver for TracingObserver {
    fn bean_created(&self, id: &str, scope: &Scope, elapsed: Duration) {
        debug!(target: "beanpod::observer", id, %scope, ?elapsed, "bean created");
    }

    fn bean_destroyed(&self, id: &str) {
        debug!(target: "beanpod::observer", id, "bean destroyed");
    }

    fn resolution_failed(&self, capability: &str, error: &DiError) {
        warn!(target: "beanpod::observer", capability, %error, "resolution failed");
    }
}
