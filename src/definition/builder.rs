//! Typed builder for [`BeanDefinition`].

use std::marker::PhantomData;
use std::sync::Arc;

use super::{
    AnyArc, AnyBox, BeanDefinition, CapabilityBinding, DefinitionSource, Dependency,
    DependencyKind, LifecycleHook,
};
use crate::capability::Capability;
use crate::error::BoxError;
use crate::provider::{Dependencies, HandleTarget, LazyProvider, ScopedProxy};
use crate::scope::Scope;

/// Builder for a bean of concrete type `T`.
///
/// Replaces annotation-driven wiring with explicit metadata: capabilities,
/// scope, ordered dependencies, hooks, qualifier and primary flag. The
/// terminal call is [`factory`](Self::factory), which yields the finished
/// [`BeanDefinition`].
///
/// # Examples
///
/// ```rust
/// use beanpod::{BeanDefinition, Container, DependencyKind};
/// use std::sync::Arc;
///
/// trait Repository: Send + Sync {
///     fn name(&self) -> &str;
/// }
///
/// struct MemoryRepository;
/// impl Repository for MemoryRepository {
///     fn name(&self) -> &str { "memory" }
/// }
///
/// struct Service {
///     repository: Arc<dyn Repository>,
/// }
///
/// let container = Container::new();
/// container.register(
///     BeanDefinition::builder::<MemoryRepository>("repository")
///         .provides::<dyn Repository>(|bean| bean as Arc<dyn Repository>)
///         .factory(|_| Ok(MemoryRepository)),
/// ).unwrap();
///
/// let service = BeanDefinition::builder::<Service>("service")
///     .depends_on::<dyn Repository>()
///     .factory(|deps| Ok(Service { repository: deps.bean::<dyn Repository>(0)? }));
/// assert_eq!(service.dependencies()[0].kind(), DependencyKind::Direct);
/// container.register(service).unwrap();
/// container.seal().unwrap();
///
/// let service = container.get_bean::<Service>().unwrap();
/// assert_eq!(service.repository.name(), "memory");
/// ```
pub struct BeanDefinitionBuilder<T> {
    id: String,
    capabilities: Vec<CapabilityBinding>,
    scope: Scope,
    dependencies: Vec<Dependency>,
    init_hook: Option<LifecycleHook>,
    destroy_hook: Option<LifecycleHook>,
    qualifier: Option<String>,
    primary: bool,
    source: DefinitionSource,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> BeanDefinitionBuilder<T> {
    pub(crate) fn new(id: String) -> Self {
        let concrete = CapabilityBinding {
            capability: Capability::of::<T>(),
            cast: Arc::new(|instance: &AnyArc| {
                instance
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|bean| Box::new(bean) as AnyBox)
            }),
        };

        Self {
            id,
            capabilities: vec![concrete],
            scope: Scope::Singleton,
            dependencies: Vec::new(),
            init_hook: None,
            destroy_hook: None,
            qualifier: None,
            primary: false,
            source: DefinitionSource::Manual,
            _marker: PhantomData,
        }
    }

    /// Adds `C` (usually a `dyn Trait`) to the capability set.
    ///
    /// `cast` performs the unsizing conversion, e.g.
    /// `|bean| bean as Arc<dyn Repository>`.
    pub fn provides<C>(mut self, cast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let capability = Capability::of::<C>();
        let binding = CapabilityBinding {
            capability,
            cast: Arc::new(move |instance: &AnyArc| {
                instance
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|bean| Box::new(cast(bean)) as AnyBox)
            }),
        };
        match self.capabilities.iter().position(|b| b.capability == capability) {
            Some(pos) => self.capabilities[pos] = binding,
            None => self.capabilities.push(binding),
        }
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn singleton(self) -> Self {
        self.scope(Scope::Singleton)
    }

    pub fn prototype(self) -> Self {
        self.scope(Scope::Prototype)
    }

    /// One instance per active context of `scope_name`.
    pub fn contextual(self, scope_name: impl Into<String>) -> Self {
        self.scope(Scope::Contextual(scope_name.into()))
    }

    /// Declares a dependency resolved and initialized before the factory runs.
    pub fn depends_on<C: ?Sized + Send + Sync + 'static>(self) -> Self {
        self.push_dependency::<C>(None, DependencyKind::Direct, None)
    }

    pub fn depends_on_qualified<C: ?Sized + Send + Sync + 'static>(
        self,
        qualifier: impl Into<String>,
    ) -> Self {
        self.push_dependency::<C>(Some(qualifier.into()), DependencyKind::Direct, None)
    }

    /// Declares a dependency injected as a [`LazyProvider<C>`].
    pub fn lazy<C: ?Sized + Send + Sync + 'static>(self) -> Self {
        self.push_dependency::<C>(None, DependencyKind::Lazy, Some(lazy_handle::<C>()))
    }

    pub fn lazy_qualified<C: ?Sized + Send + Sync + 'static>(
        self,
        qualifier: impl Into<String>,
    ) -> Self {
        self.push_dependency::<C>(
            Some(qualifier.into()),
            DependencyKind::Lazy,
            Some(lazy_handle::<C>()),
        )
    }

    /// Declares a dependency injected as a [`ScopedProxy<C>`].
    ///
    /// The target definition is resolved when this bean is wired; the live
    /// instance is looked up in the caller's current context on every use.
    pub fn proxied<C: ?Sized + Send + Sync + 'static>(self) -> Self {
        self.push_dependency::<C>(None, DependencyKind::Proxied, Some(proxy_handle::<C>()))
    }

    pub fn proxied_qualified<C: ?Sized + Send + Sync + 'static>(
        self,
        qualifier: impl Into<String>,
    ) -> Self {
        self.push_dependency::<C>(
            Some(qualifier.into()),
            DependencyKind::Proxied,
            Some(proxy_handle::<C>()),
        )
    }

    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Marks this definition as the default among candidates of a capability.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn source(mut self, source: DefinitionSource) -> Self {
        self.source = source;
        self
    }

    /// Shorthand for `source(DefinitionSource::Scanned)`.
    pub fn scanned(self) -> Self {
        self.source(DefinitionSource::Scanned)
    }

    /// Runs after construction, before the bean is handed to any caller.
    pub fn init_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.init_hook = Some(typed_hook(name.into(), hook));
        self
    }

    /// Runs when the owning store tears the bean down.
    ///
    /// Never runs for prototypes: the caller owns their destruction.
    pub fn destroy_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.destroy_hook = Some(typed_hook(name.into(), hook));
        self
    }

    /// Sets the build function and finishes the definition.
    ///
    /// The factory receives the declared dependencies in declaration order.
    pub fn factory<F>(self, factory: F) -> BeanDefinition
    where
        F: Fn(&Dependencies) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        BeanDefinition {
            id: self.id,
            type_name: std::any::type_name::<T>(),
            capabilities: self.capabilities,
            scope: self.scope,
            dependencies: self.dependencies,
            factory: Arc::new(move |deps: &Dependencies| {
                factory(deps).map(|bean| Arc::new(bean) as AnyArc)
            }),
            init_hook: self.init_hook,
            destroy_hook: self.destroy_hook,
            qualifier: self.qualifier,
            primary: self.primary,
            source: self.source,
        }
    }

    fn push_dependency<C: ?Sized + 'static>(
        mut self,
        qualifier: Option<String>,
        kind: DependencyKind,
        handle: Option<super::HandleFn>,
    ) -> Self {
        self.dependencies.push(Dependency {
            capability: Capability::of::<C>(),
            qualifier,
            kind,
            handle,
        });
        self
    }
}

fn typed_hook<T, F>(name: String, hook: F) -> LifecycleHook
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
{
    let hook_name = name.clone();
    LifecycleHook {
        name,
        run: Arc::new(move |instance: &AnyArc| match instance.downcast_ref::<T>() {
            Some(bean) => hook(bean),
            None => Err(format!(
                "hook '{}' expected {}",
                hook_name,
                std::any::type_name::<T>()
            )
            .into()),
        }),
    }
}

fn lazy_handle<C: ?Sized + Send + Sync + 'static>() -> super::HandleFn {
    Arc::new(|target: HandleTarget| Box::new(LazyProvider::<C>::new(target)) as AnyBox)
}

fn proxy_handle<C: ?Sized + Send + Sync + 'static>() -> super::HandleFn {
    Arc::new(|target: HandleTarget| Box::new(ScopedProxy::<C>::new(target)) as AnyBox)
}
