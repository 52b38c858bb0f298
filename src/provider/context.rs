//! Resolved dependencies handed to factory functions.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::capability::Capability;
use crate::container::ContainerInner;
use crate::definition::AnyBox;
use crate::error::{DiError, DiResult};

use super::{LazyProvider, ScopedProxy};

/// The declared dependencies of a bean, already resolved, in declaration
/// order.
///
/// Direct dependencies are fully initialized instances; lazy and proxied ones
/// are handles that resolve on use.
///
/// # Examples
///
/// ```
/// use beanpod::{BeanDefinition, Container};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Clock;
/// struct UserService { db: Arc<Database>, clock: beanpod::LazyProvider<Clock> }
///
/// let container = Container::new();
/// container.register(BeanDefinition::builder::<Database>("database")
///     .factory(|_| Ok(Database { url: "postgres://localhost".to_string() }))).unwrap();
/// container.register(BeanDefinition::builder::<Clock>("clock")
///     .prototype()
///     .factory(|_| Ok(Clock))).unwrap();
/// container.register(BeanDefinition::builder::<UserService>("userService")
///     .depends_on::<Database>()
///     .lazy::<Clock>()
///     .factory(|deps| Ok(UserService {
///         db: deps.bean::<Database>(0)?,
///         clock: deps.lazy::<Clock>(1)?,
///     }))).unwrap();
/// container.seal().unwrap();
///
/// let service = container.get_bean::<UserService>().unwrap();
/// assert_eq!(service.db.url, "postgres://localhost");
/// assert!(service.clock.get().is_ok());
/// ```
pub struct Dependencies {
    owner: String,
    values: Vec<AnyBox>,
}

impl Dependencies {
    pub(crate) fn new(owner: String, values: Vec<AnyBox>) -> Self {
        Self { owner, values }
    }

    /// The direct dependency at `index` as `Arc<C>`.
    pub fn bean<C: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<C>> {
        self.value::<Arc<C>>(index)
    }

    /// The lazy dependency at `index`.
    pub fn lazy<C: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> DiResult<LazyProvider<C>> {
        self.value::<LazyProvider<C>>(index)
    }

    /// The proxied dependency at `index`.
    pub fn proxy<C: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> DiResult<ScopedProxy<C>> {
        self.value::<ScopedProxy<C>>(index)
    }

    /// Id of the bean being built.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value<V: Any + Clone>(&self, index: usize) -> DiResult<V> {
        self.values
            .get(index)
            .and_then(|v| v.downcast_ref::<V>())
            .cloned()
            .ok_or_else(|| DiError::TypeMismatch {
                id: self.owner.clone(),
                expected: std::any::type_name::<V>(),
            })
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("owner", &self.owner)
            .field("len", &self.values.len())
            .finish()
    }
}

/// What a lazy provider or scoped proxy resolves against.
#[derive(Clone)]
pub(crate) struct HandleTarget {
    pub(crate) container: Weak<ContainerInner>,
    pub(crate) capability: Capability,
    pub(crate) qualifier: Option<String>,
    /// Fixed at wiring time for proxies; `None` resolves on every call
    pub(crate) definition_id: Option<String>,
}

impl HandleTarget {
    pub(crate) fn fetch<C: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<C>> {
        let container = self.container.upgrade().ok_or(DiError::ShutDown)?;
        let boxed = match &self.definition_id {
            Some(id) => container.instance_by_id(id, self.capability)?,
            None => container.resolve(self.capability, self.qualifier.as_deref())?,
        };
        let id = self.definition_id.as_deref().unwrap_or(self.capability.name());
        unbox::<C>(boxed, id)
    }
}

impl fmt::Debug for HandleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTarget")
            .field("capability", &self.capability)
            .field("qualifier", &self.qualifier)
            .field("definition_id", &self.definition_id)
            .finish()
    }
}

/// Recovers the `Arc<C>` produced by a capability cast.
pub(crate) fn unbox<C: ?Sized + Send + Sync + 'static>(boxed: AnyBox, id: &str) -> DiResult<Arc<C>> {
    boxed
        .downcast::<Arc<C>>()
        .map(|arc| *arc)
        .map_err(|_| DiError::TypeMismatch {
            id: id.to_string(),
            expected: std::any::type_name::<C>(),
        })
}
