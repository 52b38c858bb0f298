//! Bean scope definitions.

use std::fmt;

/// Scopes controlling instance caching and lifetime
///
/// The scope is fixed when a definition is registered and never changes.
///
/// # Scope Characteristics
///
/// - **Singleton**: one instance per container, destroyed on `shutdown()`
/// - **Prototype**: a fresh instance per request, owned by the caller
/// - **Contextual**: one instance per active `(scope name, context key)`,
///   destroyed on `end_scope()`
///
/// # Examples
///
/// ```rust
/// use beanpod::{BeanDefinition, Container, Scope};
/// use std::sync::Arc;
///
/// struct Counter;
///
/// let container = Container::new();
/// container
///     .register(BeanDefinition::builder::<Counter>("counter")
///         .scope(Scope::Prototype)
///         .factory(|_| Ok(Counter)))
///     .unwrap();
/// container.seal().unwrap();
///
/// let a = container.get_bean::<Counter>().unwrap();
/// let b = container.get_bean::<Counter>().unwrap();
/// assert!(!Arc::ptr_eq(&a, &b)); // Prototype: always different
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum Scope {
    /// Single instance per container, cached until shutdown
    #[default]
    Singleton,
    /// New instance per resolution, never cached
    Prototype,
    /// Single instance per active context of the named scope (e.g. `"request"`)
    Contextual(String),
}

impl Scope {
    /// Convenience constructor for a contextual scope.
    pub fn contextual(name: impl Into<String>) -> Self {
        Scope::Contextual(name.into())
    }

    /// Whether instances of this scope live for the whole container lifetime.
    pub fn is_singleton(&self) -> bool {
        matches!(self, Scope::Singleton)
    }

    /// The scope name of a contextual scope.
    pub fn context_name(&self) -> Option<&str> {
        match self {
            Scope::Contextual(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => f.write_str("singleton"),
            Scope::Prototype => f.write_str("prototype"),
            Scope::Contextual(name) => f.write_str(name),
        }
    }
}
