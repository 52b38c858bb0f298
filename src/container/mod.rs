//! The container facade.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::capability::Capability;
use crate::config::ContainerConfig;
use crate::definition::BeanDefinition;
use crate::descriptors::BeanDescriptor;
use crate::error::{DestructionError, DiError, DiResult};
use crate::instance::InstanceState;
use crate::lifecycle;
use crate::observer::ContainerObserver;
use crate::provider::{unbox, HandleTarget, LazyProvider, ScopedProxy};
use crate::resolver::DependencyResolver;
use crate::store::{contextual, ContextKey};

mod inner;

pub(crate) use inner::ContainerInner;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// In-process bean container.
///
/// A container goes through three phases:
///
/// 1. **Setup**: [`register`](Self::register) definitions and
///    [`add_observer`](Self::add_observer).
/// 2. **Running**: after [`seal`](Self::seal) the registry is frozen and
///    beans are looked up with [`get_bean`](Self::get_bean) and friends.
///    Contextual scopes are opened and closed with
///    [`begin_scope`](Self::begin_scope) / [`end_scope`](Self::end_scope).
/// 3. **Shut down**: [`shutdown`](Self::shutdown) destroys every cached
///    instance; any later call fails with `ShutDown`.
///
/// `Container` is a cheap handle (`Arc` inside) and may be cloned and shared
/// across threads.
///
/// # Examples
///
/// ```
/// use beanpod::{BeanDefinition, Container};
/// use std::sync::Arc;
///
/// trait DiscountPolicy: Send + Sync {
///     fn discount(&self, price: u64) -> u64;
/// }
///
/// struct FixDiscountPolicy;
/// impl DiscountPolicy for FixDiscountPolicy {
///     fn discount(&self, _price: u64) -> u64 { 1000 }
/// }
///
/// struct RateDiscountPolicy;
/// impl DiscountPolicy for RateDiscountPolicy {
///     fn discount(&self, price: u64) -> u64 { price / 10 }
/// }
///
/// let container = Container::new();
/// container.register(BeanDefinition::builder::<FixDiscountPolicy>("fixDiscountPolicy")
///     .provides::<dyn DiscountPolicy>(|bean| bean as Arc<dyn DiscountPolicy>)
///     .factory(|_| Ok(FixDiscountPolicy))).unwrap();
/// container.register(BeanDefinition::builder::<RateDiscountPolicy>("rateDiscountPolicy")
///     .provides::<dyn DiscountPolicy>(|bean| bean as Arc<dyn DiscountPolicy>)
///     .primary()
///     .factory(|_| Ok(RateDiscountPolicy))).unwrap();
/// container.seal().unwrap();
///
/// let policy = container.get_bean::<dyn DiscountPolicy>().unwrap();
/// assert_eq!(policy.discount(10000), 1000);
///
/// let fixed = container.get_bean_qualified::<dyn DiscountPolicy>("fixDiscountPolicy").unwrap();
/// assert_eq!(fixed.discount(20000), 1000);
///
/// assert!(container.shutdown().is_empty());
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Creates a container with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        let id = NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed);
        debug!(container = id, ?config, "creating container");
        Self {
            inner: Arc::new(ContainerInner::new(id, config)),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    // ----- Setup -----

    /// Adds a definition to the registry.
    ///
    /// Fails with `DuplicateId` if the id is taken (see
    /// [`ContainerConfig::allow_definition_overriding`] for the one
    /// exception) and with `Sealed` after [`seal`](Self::seal).
    pub fn register(&self, definition: BeanDefinition) -> DiResult<()> {
        if self.inner.is_shut_down() {
            return Err(DiError::ShutDown);
        }
        self.inner.registry.write().register(definition)
    }

    /// Freezes the registry. Lookups are only allowed afterwards.
    ///
    /// With `pre_instantiate_on_seal` configured, also runs
    /// [`pre_instantiate_singletons`](Self::pre_instantiate_singletons).
    /// Sealing twice is a no-op.
    pub fn seal(&self) -> DiResult<()> {
        if self.inner.is_shut_down() {
            return Err(DiError::ShutDown);
        }
        {
            let mut registry = self.inner.registry.write();
            if registry.is_sealed() {
                return Ok(());
            }
            registry.seal();
            info!(container = self.inner.id, definitions = registry.len(), "registry sealed");
        }
        if self.inner.config.pre_instantiate_on_seal {
            self.pre_instantiate_singletons()?;
        }
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.registry.read().is_sealed()
    }

    /// Registers an observer. Only allowed before sealing.
    pub fn add_observer(&self, observer: Arc<dyn ContainerObserver>) -> DiResult<()> {
        let registry = self.inner.registry.read();
        if registry.is_sealed() {
            return Err(DiError::Sealed);
        }
        self.inner.observers.write().add(observer);
        Ok(())
    }

    // ----- Lookup -----

    /// The unique bean providing `C`.
    ///
    /// Fails with `NoSuchBean` when nothing provides `C` and with `Ambiguous`
    /// when several definitions do and not exactly one of them is `primary`.
    pub fn get_bean<C: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<C>> {
        self.lookup::<C>(None)
    }

    /// The bean providing `C` selected by `qualifier`.
    ///
    /// The qualifier matches a definition's qualifier tag first and falls back
    /// to its id. It takes precedence over `primary`.
    pub fn get_bean_qualified<C: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: &str,
    ) -> DiResult<Arc<C>> {
        self.lookup::<C>(Some(qualifier))
    }

    /// Like [`get_bean`](Self::get_bean), but a missing bean is `Ok(None)`.
    ///
    /// Every other failure (ambiguity, construction, scope) still propagates.
    pub fn get_bean_optional<C: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> DiResult<Option<Arc<C>>> {
        match self.lookup::<C>(None) {
            Ok(bean) => Ok(Some(bean)),
            Err(DiError::NoSuchBean { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The bean registered under `id`, viewed as `C`.
    ///
    /// Fails with `TypeMismatch` if that bean does not provide `C`.
    pub fn get_bean_by_id<C: ?Sized + Send + Sync + 'static>(&self, id: &str) -> DiResult<Arc<C>> {
        let capability = Capability::of::<C>();
        let result = self
            .inner
            .instance_by_id(id, capability)
            .and_then(|boxed| unbox::<C>(boxed, id));
        self.observe(capability, result)
    }

    /// Every bean providing `C`, in registration order, keyed by id.
    pub fn get_beans_of_type<C: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> DiResult<Vec<(String, Arc<C>)>> {
        let capability = Capability::of::<C>();
        self.inner.check_usable()?;
        let definitions: Vec<_> = self
            .inner
            .registry
            .read()
            .providers_of(capability)
            .cloned()
            .collect();

        let result = definitions
            .iter()
            .map(|definition| -> DiResult<(String, Arc<C>)> {
                let boxed = self.inner.cast_instance(definition, capability)?;
                Ok((definition.id.clone(), unbox::<C>(boxed, &definition.id)?))
            })
            .collect();
        self.observe(capability, result)
    }

    /// The id the resolver selects for `C` and `qualifier`, without building
    /// anything.
    pub fn resolve_id<C: ?Sized + 'static>(&self, qualifier: Option<&str>) -> DiResult<String> {
        self.inner.check_usable()?;
        let registry = self.inner.registry.read();
        let id = DependencyResolver::new(&registry).resolve_id(Capability::of::<C>(), qualifier)?;
        Ok(id)
    }

    // ----- Indirection handles -----

    /// A provider that resolves `C` on every call.
    pub fn lazy_provider<C: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: Option<&str>,
    ) -> LazyProvider<C> {
        LazyProvider::new(self.handle_target::<C>(qualifier, None))
    }

    /// A proxy forwarding to the contextual bean selected for `C` now.
    pub fn scoped_proxy<C: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: Option<&str>,
    ) -> DiResult<ScopedProxy<C>> {
        let id = self.resolve_id::<C>(qualifier)?;
        Ok(ScopedProxy::new(self.handle_target::<C>(qualifier, Some(id))))
    }

    // ----- Introspection -----

    /// Ids of all definitions in registration order.
    pub fn bean_definition_names(&self) -> Vec<String> {
        self.inner
            .registry
            .read()
            .iter()
            .map(|d| d.id.clone())
            .collect()
    }

    pub fn contains_bean(&self, id: &str) -> bool {
        self.inner.registry.read().get(id).is_some()
    }

    pub fn bean_definition(&self, id: &str) -> Option<BeanDescriptor> {
        self.inner
            .registry
            .read()
            .get(id)
            .map(|d| BeanDescriptor::from_definition(d))
    }

    /// Descriptors of all definitions in registration order.
    pub fn bean_descriptors(&self) -> Vec<BeanDescriptor> {
        self.inner
            .registry
            .read()
            .iter()
            .map(|d| BeanDescriptor::from_definition(d))
            .collect()
    }

    /// State of the cached singleton `id`, if it has been built.
    pub fn singleton_state(&self, id: &str) -> Option<InstanceState> {
        self.inner.singletons.state(id)
    }

    pub fn singleton_count(&self) -> usize {
        self.inner.singletons.len()
    }

    // ----- Contextual scopes -----

    /// Activates the context `(scope, context)` and makes it the calling
    /// thread's current context for `scope`.
    ///
    /// Begins nest: ending the inner context makes the outer one current
    /// again. Fails with `ScopeAlreadyActive` if that exact key is active.
    pub fn begin_scope(&self, scope: &str, context: &str) -> DiResult<()> {
        if self.inner.is_shut_down() {
            return Err(DiError::ShutDown);
        }
        self.inner.contexts.begin(ContextKey::new(scope, context))?;
        contextual::bind(self.inner.id, scope, context);
        Ok(())
    }

    /// Ends the context, destroying its instances in reverse creation order.
    ///
    /// Destroy hook failures do not stop teardown; they are returned together.
    pub fn end_scope(&self, scope: &str, context: &str) -> DiResult<Vec<DestructionError>> {
        if self.inner.is_shut_down() {
            return Err(DiError::ShutDown);
        }
        let records = self.inner.contexts.end(&ContextKey::new(scope, context))?;
        contextual::unbind(self.inner.id, scope, context);
        let observers = self.inner.observers.read_recursive();
        Ok(lifecycle::run_destroy_all(records, &observers))
    }

    /// Makes an already active context current on the calling thread until
    /// the returned guard drops.
    ///
    /// Used by worker threads serving a context begun elsewhere.
    pub fn attach_scope(&self, scope: &str, context: &str) -> DiResult<ScopeGuard> {
        if self.inner.is_shut_down() {
            return Err(DiError::ShutDown);
        }
        if !self.inner.contexts.is_active(&ContextKey::new(scope, context)) {
            return Err(DiError::ScopeNotActive {
                scope: scope.to_string(),
                context: Some(context.to_string()),
            });
        }
        contextual::bind(self.inner.id, scope, context);
        Ok(ScopeGuard {
            container: self.inner.id,
            scope: scope.to_string(),
            context: context.to_string(),
            _not_send: PhantomData,
        })
    }

    /// The calling thread's current context key for `scope`.
    pub fn current_context(&self, scope: &str) -> Option<String> {
        contextual::current(self.inner.id, scope)
    }

    // ----- Lifecycle -----

    /// Builds and initializes every singleton in registration order.
    ///
    /// Stops at the first failure, surfacing misconfiguration (missing
    /// dependency, ambiguity, cycle, scope mismatch) before request-time use.
    pub fn pre_instantiate_singletons(&self) -> DiResult<()> {
        self.inner.check_usable()?;
        let singletons: Vec<_> = self
            .inner
            .registry
            .read()
            .iter()
            .filter(|d| d.scope.is_singleton())
            .cloned()
            .collect();

        for definition in &singletons {
            self.inner.instance_of(definition)?;
        }
        info!(container = self.inner.id, count = singletons.len(), "singletons pre-instantiated");
        Ok(())
    }

    /// Destroys every cached instance and marks the container unusable.
    ///
    /// Active contexts are ended first, then singletons are destroyed in exact
    /// reverse creation order. Destroy hook failures are collected, never
    /// fatal. A second call returns an empty list.
    pub fn shutdown(&self) -> Vec<DestructionError> {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return Vec::new();
        }
        info!(container = self.inner.id, "shutting down container");

        let observers = self.inner.observers.read_recursive();
        let mut errors = Vec::new();
        for (key, records) in self.inner.contexts.end_all() {
            debug!(context = %key, "ending context on shutdown");
            errors.extend(lifecycle::run_destroy_all(records, &observers));
        }
        contextual::unbind_container(self.inner.id);
        errors.extend(lifecycle::run_destroy_all(self.inner.singletons.drain(), &observers));
        errors
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.is_shut_down()
    }

    fn lookup<C: ?Sized + Send + Sync + 'static>(&self, qualifier: Option<&str>) -> DiResult<Arc<C>> {
        let capability = Capability::of::<C>();
        let result = self
            .inner
            .resolve(capability, qualifier)
            .and_then(|boxed| unbox::<C>(boxed, capability.name()));
        self.observe(capability, result)
    }

    fn observe<T>(&self, capability: Capability, result: DiResult<T>) -> DiResult<T> {
        if let Err(error) = &result {
            debug!(capability = capability.name(), %error, "lookup failed");
            let observers = self.inner.observers.read_recursive();
            if observers.has_observers() {
                observers.resolution_failed(capability.name(), error);
            }
        }
        result
    }

    fn handle_target<C: ?Sized + 'static>(
        &self,
        qualifier: Option<&str>,
        definition_id: Option<String>,
    ) -> HandleTarget {
        HandleTarget {
            container: Arc::downgrade(&self.inner),
            capability: Capability::of::<C>(),
            qualifier: qualifier.map(str::to_string),
            definition_id,
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("definitions", &self.inner.registry.read().len())
            .field("sealed", &self.is_sealed())
            .field("active_contexts", &self.inner.contexts.active_count())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Keeps a context current on the calling thread; on drop the binding it
/// covered becomes current again.
#[must_use = "the context is detached again when the guard is dropped"]
pub struct ScopeGuard {
    container: u64,
    scope: String,
    context: String,
    // Thread-bound
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        contextual::release(self.container, &self.scope, &self.context);
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("scope", &self.scope)
            .field("context", &self.context)
            .finish()
    }
}
