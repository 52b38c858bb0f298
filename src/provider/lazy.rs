use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::DiResult;

use super::context::HandleTarget;

/// Deferred lookup of a capability.
///
/// Nothing is resolved when the provider is created. Every [`get`](Self::get)
/// runs the full resolution against the container at that moment, so a
/// prototype yields a fresh instance per call and a contextual bean is taken
/// from the caller's current context.
///
/// Holds only a weak reference to the container; after the container is
/// dropped or shut down, `get` fails with `ShutDown`.
///
/// # Examples
///
/// ```
/// use beanpod::{BeanDefinition, Container};
/// use std::sync::Arc;
///
/// struct Ticket;
///
/// let container = Container::new();
/// container.register(BeanDefinition::builder::<Ticket>("ticket")
///     .prototype()
///     .factory(|_| Ok(Ticket))).unwrap();
/// container.seal().unwrap();
///
/// let tickets = container.lazy_provider::<Ticket>(None);
/// let a = tickets.get().unwrap();
/// let b = tickets.get().unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
/// ```
pub struct LazyProvider<C: ?Sized> {
    target: HandleTarget,
    _marker: PhantomData<fn() -> Arc<C>>,
}

impl<C: ?Sized + Send + Sync + 'static> LazyProvider<C> {
    pub(crate) fn new(target: HandleTarget) -> Self {
        Self {
            target,
            _marker: PhantomData,
        }
    }

    /// Resolves and returns the bean now.
    pub fn get(&self) -> DiResult<Arc<C>> {
        self.target.fetch::<C>()
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.target.qualifier.as_deref()
    }
}

impl<C: ?Sized> Clone for LazyProvider<C> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            _marker: PhantomData,
        }
    }
}

impl<C: ?Sized> fmt::Debug for LazyProvider<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyProvider")
            .field("capability", &self.target.capability)
            .field("qualifier", &self.target.qualifier)
            .finish()
    }
}
