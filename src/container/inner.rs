//! Shared container state and the build pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::debug;

use crate::capability::Capability;
use crate::config::ContainerConfig;
use crate::definition::{AnyBox, BeanDefinition, Dependency, DependencyKind};
use crate::error::{DiError, DiResult};
use crate::instance::{InstanceRecord, InstanceState};
use crate::internal::{ConstructionTracker, StackGuard};
use crate::lifecycle;
use crate::observer::Observers;
use crate::provider::{Dependencies, HandleTarget};
use crate::registry::BeanRegistry;
use crate::resolver::DependencyResolver;
use crate::scope::Scope;
use crate::store::{contextual, ContextKey, ContextualStore, PrototypeFactory, SingletonStore};

pub(crate) struct ContainerInner {
    pub(crate) id: u64,
    pub(crate) config: ContainerConfig,
    pub(crate) registry: RwLock<BeanRegistry>,
    pub(crate) singletons: SingletonStore,
    pub(crate) prototypes: PrototypeFactory,
    pub(crate) contexts: ContextualStore,
    pub(crate) tracker: ConstructionTracker,
    pub(crate) observers: RwLock<Observers>,
    pub(crate) shut_down: AtomicBool,
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        // Only the dropping thread can be reached
        contextual::unbind_container(self.id);
    }
}

impl ContainerInner {
    pub(crate) fn new(id: u64, config: ContainerConfig) -> Self {
        Self {
            id,
            registry: RwLock::new(BeanRegistry::new(config.allow_definition_overriding)),
            config,
            singletons: SingletonStore::new(),
            prototypes: PrototypeFactory,
            contexts: ContextualStore::new(),
            tracker: ConstructionTracker::new(),
            observers: RwLock::new(Observers::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Lookups need a sealed, running container.
    pub(crate) fn check_usable(&self) -> DiResult<()> {
        if self.is_shut_down() {
            return Err(DiError::ShutDown);
        }
        if !self.registry.read().is_sealed() {
            return Err(DiError::NotSealed);
        }
        Ok(())
    }

    pub(crate) fn definition_for(
        &self,
        capability: Capability,
        qualifier: Option<&str>,
    ) -> DiResult<Arc<BeanDefinition>> {
        let registry = self.registry.read();
        let definition = DependencyResolver::new(&registry).resolve(capability, qualifier)?;
        Ok(definition.clone())
    }

    pub(crate) fn definition_by_id(
        &self,
        id: &str,
        capability: Capability,
    ) -> DiResult<Arc<BeanDefinition>> {
        self.registry
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DiError::NoSuchBean {
                capability: capability.name(),
                qualifier: Some(id.to_string()),
            })
    }

    /// Resolves `capability` and returns the erased `Arc<C>`.
    pub(crate) fn resolve(
        self: &Arc<Self>,
        capability: Capability,
        qualifier: Option<&str>,
    ) -> DiResult<AnyBox> {
        self.check_usable()?;
        let definition = self.definition_for(capability, qualifier)?;
        self.cast_instance(&definition, capability)
    }

    /// Fetches the bean with `id` and returns it as the erased `Arc<C>`.
    pub(crate) fn instance_by_id(
        self: &Arc<Self>,
        id: &str,
        capability: Capability,
    ) -> DiResult<AnyBox> {
        self.check_usable()?;
        let definition = self.definition_by_id(id, capability)?;
        self.cast_instance(&definition, capability)
    }

    pub(crate) fn cast_instance(
        self: &Arc<Self>,
        definition: &Arc<BeanDefinition>,
        capability: Capability,
    ) -> DiResult<AnyBox> {
        let record = self.instance_of(definition)?;
        definition
            .cast(&record.instance, capability)
            .ok_or_else(|| DiError::TypeMismatch {
                id: definition.id.clone(),
                expected: capability.name(),
            })
    }

    /// An initialized instance of `definition` from the store its scope
    /// selects.
    pub(crate) fn instance_of(
        self: &Arc<Self>,
        definition: &Arc<BeanDefinition>,
    ) -> DiResult<Arc<InstanceRecord>> {
        match &definition.scope {
            Scope::Singleton => {
                let observers = self.observers.read_recursive();
                self.singletons.get_or_build(
                    &definition.id,
                    self.id,
                    &self.tracker,
                    &observers,
                    || self.instantiate(definition),
                )
            }
            Scope::Prototype => self
                .prototypes
                .get(&definition.id, || self.instantiate(definition)),
            Scope::Contextual(scope) => {
                let context = contextual::current(self.id, scope).ok_or_else(|| {
                    DiError::ScopeNotActive {
                        scope: scope.clone(),
                        context: None,
                    }
                })?;
                let key = ContextKey::new(scope, &context);
                let observers = self.observers.read_recursive();
                self.contexts.get_or_build(
                    &key,
                    &definition.id,
                    self.id,
                    &self.tracker,
                    &observers,
                    || self.instantiate(definition),
                )
            }
        }
    }

    /// Builds one instance: dependencies, factory, then init hook.
    fn instantiate(self: &Arc<Self>, definition: &Arc<BeanDefinition>) -> DiResult<Arc<InstanceRecord>> {
        let _frame = StackGuard::enter(self.id, &definition.id, self.config.max_resolution_depth)?;
        let started = Instant::now();
        debug!(id = %definition.id, scope = %definition.scope, "building bean");

        let mut values = Vec::with_capacity(definition.dependencies.len());
        for dependency in &definition.dependencies {
            values.push(self.dependency_value(definition, dependency)?);
        }
        let dependencies = Dependencies::new(definition.id.clone(), values);

        let instance = (definition.factory)(&dependencies)
            .map_err(|e| DiError::from_factory(&definition.id, e))?;
        let record = Arc::new(InstanceRecord::new(definition.clone(), instance));
        record.advance(InstanceState::Injected);
        lifecycle::run_init(&record)?;

        let elapsed = started.elapsed();
        debug!(id = %definition.id, ?elapsed, "bean initialized");
        let observers = self.observers.read_recursive();
        if observers.has_observers() {
            observers.bean_created(&definition.id, &definition.scope, elapsed);
        }
        Ok(record)
    }

    fn dependency_value(
        self: &Arc<Self>,
        owner: &BeanDefinition,
        dependency: &Dependency,
    ) -> DiResult<AnyBox> {
        match dependency.kind {
            DependencyKind::Direct => {
                let target = self.definition_for(dependency.capability, dependency.qualifier())?;
                if owner.scope.is_singleton() && target.scope.context_name().is_some() {
                    return Err(DiError::ScopeMismatch {
                        id: owner.id.clone(),
                        dependency: target.id.clone(),
                    });
                }
                self.cast_instance(&target, dependency.capability)
            }
            DependencyKind::Lazy | DependencyKind::Proxied => {
                let definition_id = if dependency.kind == DependencyKind::Proxied {
                    let target =
                        self.definition_for(dependency.capability, dependency.qualifier())?;
                    Some(target.id.clone())
                } else {
                    None
                };
                let handle = dependency.handle.as_ref().ok_or_else(|| DiError::TypeMismatch {
                    id: owner.id.clone(),
                    expected: dependency.capability.name(),
                })?;
                Ok(handle(HandleTarget {
                    container: Arc::downgrade(self),
                    capability: dependency.capability,
                    qualifier: dependency.qualifier.clone(),
                    definition_id,
                }))
            }
        }
    }
}
