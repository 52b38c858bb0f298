//! Bean descriptors for introspection and diagnostics.

#[cfg(feature = "config")]
use serde::Serialize;

use crate::definition::{BeanDefinition, DefinitionSource, DependencyKind};
use crate::scope::Scope;

/// Read-only view of a registered definition.
///
/// # Examples
///
/// ```rust
/// use beanpod::{BeanDefinition, Container, Scope};
/// use std::sync::Arc;
///
/// trait Repository: Send + Sync {}
/// struct MemoryRepository;
/// impl Repository for MemoryRepository {}
///
/// let container = Container::new();
/// container.register(BeanDefinition::builder::<MemoryRepository>("memberRepository")
///     .provides::<dyn Repository>(|bean| bean as Arc<dyn Repository>)
///     .destroy_hook("close", |_| Ok(()))
///     .factory(|_| Ok(MemoryRepository))).unwrap();
///
/// let descriptor = container.bean_definition("memberRepository").unwrap();
/// assert_eq!(descriptor.scope, Scope::Singleton);
/// assert_eq!(descriptor.capabilities.len(), 2);
/// assert!(descriptor.provides("Repository"));
/// assert_eq!(descriptor.destroy_hook.as_deref(), Some("close"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize))]
pub struct BeanDescriptor {
    pub id: String,
    /// Concrete bean type
    pub type_name: &'static str,
    /// Capability type names, the concrete type first
    pub capabilities: Vec<&'static str>,
    pub scope: Scope,
    pub dependencies: Vec<DependencyDescriptor>,
    pub qualifier: Option<String>,
    pub primary: bool,
    pub init_hook: Option<String>,
    pub destroy_hook: Option<String>,
    pub source: DefinitionSource,
}

/// One declared dependency of a [`BeanDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize))]
pub struct DependencyDescriptor {
    pub capability: &'static str,
    pub qualifier: Option<String>,
    pub kind: DependencyKind,
}

impl BeanDescriptor {
    pub(crate) fn from_definition(definition: &BeanDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            type_name: definition.type_name,
            capabilities: definition.capabilities().map(|c| c.name()).collect(),
            scope: definition.scope.clone(),
            dependencies: definition
                .dependencies
                .iter()
                .map(|d| DependencyDescriptor {
                    capability: d.capability.name(),
                    qualifier: d.qualifier.clone(),
                    kind: d.kind,
                })
                .collect(),
            qualifier: definition.qualifier.clone(),
            primary: definition.primary,
            init_hook: definition.init_hook_name().map(str::to_string),
            destroy_hook: definition.destroy_hook_name().map(str::to_string),
            source: definition.source,
        }
    }

    /// Whether any capability name contains `name`.
    pub fn provides(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.contains(name))
    }
}
