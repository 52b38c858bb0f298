//! Bean definitions: immutable metadata describing how to build a bean.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::capability::Capability;
use crate::provider::{Dependencies, HandleTarget};
use crate::error::BoxError;
use crate::scope::Scope;

pub mod builder;
pub use builder::BeanDefinitionBuilder;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;
// Type-erased `Arc<C>` (or handle) produced for one capability
pub(crate) type AnyBox = Box<dyn Any + Send + Sync>;

pub(crate) type FactoryFn = Arc<dyn Fn(&Dependencies) -> Result<AnyArc, BoxError> + Send + Sync>;
pub(crate) type CastFn = Arc<dyn Fn(&AnyArc) -> Option<AnyBox> + Send + Sync>;
pub(crate) type HookFn = Arc<dyn Fn(&AnyArc) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type HandleFn = Arc<dyn Fn(HandleTarget) -> AnyBox + Send + Sync>;

/// Which collaborator produced a definition.
///
/// Consulted by the override policy: with
/// [`ContainerConfig::allow_definition_overriding`](crate::ContainerConfig)
/// a `Manual` definition may replace a `Scanned` one sharing its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum DefinitionSource {
    /// Registered explicitly by application configuration
    #[default]
    Manual,
    /// Emitted by a scanning collaborator
    Scanned,
}

/// How a dependency is handed to the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum DependencyKind {
    /// Resolved and initialized before the factory runs
    Direct,
    /// A [`LazyProvider`](crate::LazyProvider) that resolves on every call
    Lazy,
    /// A [`ScopedProxy`](crate::ScopedProxy) bound to the current context on every call
    Proxied,
}

/// One declared dependency: capability, optional qualifier and injection kind.
#[derive(Clone)]
pub struct Dependency {
    pub(crate) capability: Capability,
    pub(crate) qualifier: Option<String>,
    pub(crate) kind: DependencyKind,
    pub(crate) handle: Option<HandleFn>,
}

impl Dependency {
    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn kind(&self) -> DependencyKind {
        self.kind
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("capability", &self.capability)
            .field("qualifier", &self.qualifier)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A named init or destroy callback.
#[derive(Clone)]
pub(crate) struct LifecycleHook {
    pub(crate) name: String,
    pub(crate) run: HookFn,
}

#[derive(Clone)]
pub(crate) struct CapabilityBinding {
    pub(crate) capability: Capability,
    pub(crate) cast: CastFn,
}

/// Metadata describing how to build one bean.
///
/// Definitions are created with [`BeanDefinition::builder`] and are immutable
/// once built. The registry hands them out as `Arc<BeanDefinition>`.
///
/// # Examples
///
/// ```rust
/// use beanpod::{BeanDefinition, Capability, Scope};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".to_string() }
/// }
///
/// let definition = BeanDefinition::builder::<English>("english")
///     .provides::<dyn Greeter>(|bean| bean as Arc<dyn Greeter>)
///     .qualifier("en")
///     .primary()
///     .factory(|_| Ok(English));
///
/// assert_eq!(definition.id(), "english");
/// assert_eq!(definition.scope(), &Scope::Singleton);
/// assert!(definition.provides(Capability::of::<dyn Greeter>()));
/// assert!(definition.provides(Capability::of::<English>()));
/// assert!(definition.is_primary());
/// ```
pub struct BeanDefinition {
    pub(crate) id: String,
    pub(crate) type_name: &'static str,
    pub(crate) capabilities: Vec<CapabilityBinding>,
    pub(crate) scope: Scope,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) factory: FactoryFn,
    pub(crate) init_hook: Option<LifecycleHook>,
    pub(crate) destroy_hook: Option<LifecycleHook>,
    pub(crate) qualifier: Option<String>,
    pub(crate) primary: bool,
    pub(crate) source: DefinitionSource,
}

impl BeanDefinition {
    /// Starts a definition for a bean of concrete type `T`.
    ///
    /// `T` itself is always part of the capability set.
    pub fn builder<T: Send + Sync + 'static>(id: impl Into<String>) -> BeanDefinitionBuilder<T> {
        BeanDefinitionBuilder::new(id.into())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `std::any::type_name` of the concrete bean type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn source(&self) -> DefinitionSource {
        self.source
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Capabilities in declaration order, the concrete type first.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().map(|b| b.capability)
    }

    /// Whether the capability set includes `capability`.
    pub fn provides(&self, capability: Capability) -> bool {
        self.capabilities.iter().any(|b| b.capability == capability)
    }

    pub fn init_hook_name(&self) -> Option<&str> {
        self.init_hook.as_ref().map(|h| h.name.as_str())
    }

    pub fn destroy_hook_name(&self) -> Option<&str> {
        self.destroy_hook.as_ref().map(|h| h.name.as_str())
    }

    /// Casts a built instance to the erased `Arc<C>` for `capability`.
    pub(crate) fn cast(&self, instance: &AnyArc, capability: Capability) -> Option<AnyBox> {
        self.capabilities
            .iter()
            .find(|b| b.capability == capability)
            .and_then(|b| (b.cast)(instance))
    }

    /// Whether this definition matches a qualifier by its `qualifier` field.
    pub(crate) fn has_qualifier(&self, qualifier: &str) -> bool {
        self.qualifier.as_deref() == Some(qualifier)
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("capabilities", &self.capabilities().collect::<Vec<_>>())
            .field("scope", &self.scope)
            .field("dependencies", &self.dependencies)
            .field("qualifier", &self.qualifier)
            .field("primary", &self.primary)
            .field("source", &self.source)
            .finish()
    }
}
