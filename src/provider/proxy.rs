use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::DiResult;

use super::context::HandleTarget;

/// Forwarding stand-in for a contextual bean.
///
/// The target definition is fixed when the proxy is wired into its owner.
/// Each call looks the live instance up in the calling thread's current
/// context: within one context every call reaches the same instance, across
/// contexts different ones, and with no active context the call fails with
/// `ScopeNotActive`. Failure is deferred to use, never to injection.
///
/// Rust cannot synthesize an implementation of `C` for the proxy, so calls go
/// through [`call`](Self::call) or [`get`](Self::get).
///
/// # Examples
///
/// ```
/// use beanpod::{BeanDefinition, Container, DiError};
/// use std::sync::Arc;
///
/// struct RequestId(String);
///
/// let container = Container::new();
/// container.register(BeanDefinition::builder::<RequestId>("requestId")
///     .contextual("request")
///     .factory(|_| Ok(RequestId(format!("req")))))
///     .unwrap();
/// container.seal().unwrap();
///
/// let proxy = container.scoped_proxy::<RequestId>(None).unwrap();
/// assert!(matches!(proxy.get(), Err(DiError::ScopeNotActive { .. })));
///
/// container.begin_scope("request", "r1").unwrap();
/// let len = proxy.call(|id| id.0.len()).unwrap();
/// assert_eq!(len, 3);
/// container.end_scope("request", "r1").unwrap();
/// ```
pub struct ScopedProxy<C: ?Sized> {
    target: HandleTarget,
    _marker: PhantomData<fn() -> Arc<C>>,
}

impl<C: ?Sized + Send + Sync + 'static> ScopedProxy<C> {
    pub(crate) fn new(target: HandleTarget) -> Self {
        Self {
            target,
            _marker: PhantomData,
        }
    }

    /// The instance bound to the caller's current context.
    pub fn get(&self) -> DiResult<Arc<C>> {
        self.target.fetch::<C>()
    }

    /// Forwards one call to the instance bound to the caller's current context.
    pub fn call<R, F>(&self, f: F) -> DiResult<R>
    where
        F: FnOnce(&C) -> R,
    {
        let target = self.get()?;
        Ok(f(&target))
    }

    /// Id of the definition this proxy forwards to.
    pub fn definition_id(&self) -> Option<&str> {
        self.target.definition_id.as_deref()
    }
}

impl<C: ?Sized> Clone for ScopedProxy<C> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            _marker: PhantomData,
        }
    }
}

impl<C: ?Sized> fmt::Debug for ScopedProxy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedProxy")
            .field("capability", &self.target.capability)
            .field("definition_id", &self.target.definition_id)
            .finish()
    }
}
