//! Error types for the bean container.

use thiserror::Error;

/// Boxed error returned by factories and lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Container errors
///
/// Every failure path of registration, resolution, scoping and construction
/// ends up here, carrying the offending bean id(s) or capability name.
///
/// # Examples
///
/// ```rust
/// use beanpod::{Container, DiError};
///
/// trait Unregistered: Send + Sync {}
///
/// let container = Container::new();
/// container.seal().unwrap();
/// match container.get_bean::<dyn Unregistered>() {
///     Err(DiError::NoSuchBean { capability, qualifier }) => {
///         assert!(capability.contains("Unregistered"));
///         assert_eq!(qualifier, None);
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use beanpod::DiError;
///
/// let circular = DiError::Circular(vec!["a".into(), "b".into(), "a".into()]);
/// assert_eq!(circular.to_string(), "Circular dependency: a -> b -> a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// A definition with this id is already registered
    #[error("Duplicate bean id: {0}")]
    DuplicateId(String),
    /// No definition provides the capability (and qualifier, if given)
    #[error("No bean found for {capability}{}", qualifier_suffix(.qualifier))]
    NoSuchBean {
        capability: &'static str,
        qualifier: Option<String>,
    },
    /// More than one candidate left after qualifier and primary filtering
    #[error("Ambiguous bean for {capability}: candidates [{}]", .candidates.join(", "))]
    Ambiguous {
        capability: &'static str,
        candidates: Vec<String>,
    },
    /// Circular dependency detected (includes the chain of bean ids)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Contextual bean requested outside of an active matching scope
    #[error("Scope '{scope}' is not active{}", context_suffix(.context))]
    ScopeNotActive {
        scope: String,
        context: Option<String>,
    },
    /// `begin_scope` called for a key that is already active
    #[error("Scope '{scope}' is already active for context '{context}'")]
    ScopeAlreadyActive { scope: String, context: String },
    /// A singleton declared a direct dependency on a contextual bean
    #[error("Bean '{id}' cannot depend directly on contextual bean '{dependency}'; use a lazy provider or scoped proxy")]
    ScopeMismatch { id: String, dependency: String },
    /// The factory function failed
    #[error("Factory for bean '{id}' failed: {message}")]
    Construction { id: String, message: String },
    /// The init hook failed
    #[error("Init hook '{hook}' of bean '{id}' failed: {message}")]
    Initialization {
        id: String,
        hook: String,
        message: String,
    },
    /// The bean does not provide the requested capability or dependency kind
    #[error("Type mismatch for bean '{id}': expected {expected}")]
    TypeMismatch { id: String, expected: &'static str },
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Registration attempted after `seal()`
    #[error("Registry is sealed")]
    Sealed,
    /// Resolution attempted before `seal()`
    #[error("Registry is not sealed")]
    NotSealed,
    /// The container was shut down
    #[error("Container has been shut down")]
    ShutDown,
}

fn qualifier_suffix(qualifier: &Option<String>) -> String {
    match qualifier {
        Some(q) => format!(" with qualifier '{}'", q),
        None => String::new(),
    }
}

fn context_suffix(context: &Option<String>) -> String {
    match context {
        Some(c) => format!(" for context '{}'", c),
        None => String::new(),
    }
}

impl DiError {
    /// Converts a factory error into a container error.
    ///
    /// Errors that already are `DiError` (for example from a lazy provider
    /// invoked inside a factory) pass through unchanged.
    pub(crate) fn from_factory(id: &str, err: BoxError) -> Self {
        match err.downcast::<DiError>() {
            Ok(inner) => *inner,
            Err(other) => DiError::Construction {
                id: id.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// A destroy hook that failed during `end_scope` or `shutdown`.
///
/// Destruction errors are collected rather than aborting teardown, so one
/// broken bean cannot keep the others from releasing their resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Destroy hook '{hook}' of bean '{id}' failed: {message}")]
pub struct DestructionError {
    pub id: String,
    pub hook: String,
    pub message: String,
}

/// Result type for container operations
///
/// # Examples
///
/// ```rust
/// use beanpod::{DiResult, DiError};
///
/// fn lookup() -> DiResult<()> {
///     Err(DiError::NotSealed)
/// }
///
/// assert!(lookup().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
