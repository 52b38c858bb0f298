//! # beanpod
//!
//! A minimal in-process object-graph container: it builds, wires, scopes and
//! tears down a graph of interdependent beans on behalf of an application.
//!
//! ## Features
//!
//! - **Explicit definitions**: beans are described with a typed builder, no reflection
//! - **Trait capabilities**: look beans up by concrete type or by `dyn Trait`
//! - **Deterministic resolution**: qualifier beats primary; anything else is ambiguous
//! - **Scopes**: Singleton, Prototype and named Contextual scopes (e.g. `"request"`)
//! - **Scope bridging**: lazy providers and scoped proxies for short-lived beans in long-lived owners
//! - **Lifecycle**: init hooks bottom-up, destroy hooks in exact reverse creation order
//! - **Thread-safe**: per-id construction, cycle detection across threads without deadlock
//!
//! ## Quick Start
//!
//! ```rust
//! use beanpod::{BeanDefinition, Container};
//! use std::sync::Arc;
//!
//! trait MemberRepository: Send + Sync {
//!     fn name(&self, id: u64) -> Option<String>;
//! }
//!
//! struct MemoryMemberRepository;
//! impl MemberRepository for MemoryMemberRepository {
//!     fn name(&self, id: u64) -> Option<String> {
//!         (id == 1).then(|| "memberA".to_string())
//!     }
//! }
//!
//! struct MemberService {
//!     repository: Arc<dyn MemberRepository>,
//! }
//!
//! let container = Container::new();
//! container.register(BeanDefinition::builder::<MemoryMemberRepository>("memberRepository")
//!     .provides::<dyn MemberRepository>(|bean| bean as Arc<dyn MemberRepository>)
//!     .factory(|_| Ok(MemoryMemberRepository))).unwrap();
//! container.register(BeanDefinition::builder::<MemberService>("memberService")
//!     .depends_on::<dyn MemberRepository>()
//!     .factory(|deps| Ok(MemberService { repository: deps.bean::<dyn MemberRepository>(0)? }))).unwrap();
//! container.seal().unwrap();
//!
//! let service = container.get_bean::<MemberService>().unwrap();
//! assert_eq!(service.repository.name(1).as_deref(), Some("memberA"));
//!
//! // Singletons are shared
//! let again = container.get_bean::<MemberService>().unwrap();
//! assert!(Arc::ptr_eq(&service, &again));
//! ```
//!
//! ## Contextual Scopes
//!
//! ```rust
//! use beanpod::{BeanDefinition, Container};
//! use std::sync::Arc;
//!
//! struct RequestLog { url: std::sync::Mutex<Option<String>> }
//!
//! let container = Container::new();
//! container.register(BeanDefinition::builder::<RequestLog>("requestLog")
//!     .contextual("request")
//!     .factory(|_| Ok(RequestLog { url: Default::default() }))).unwrap();
//! container.seal().unwrap();
//!
//! container.begin_scope("request", "r1").unwrap();
//! let a = container.get_bean::<RequestLog>().unwrap();
//! let b = container.get_bean::<RequestLog>().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! container.end_scope("request", "r1").unwrap();
//!
//! // Outside a context the bean is unavailable
//! assert!(container.get_bean::<RequestLog>().is_err());
//! ```

pub mod capability;
pub mod config;
pub mod container;
pub mod definition;
pub mod descriptors;
pub mod error;
pub mod instance;
pub mod observer;
pub mod provider;
pub mod sample;
pub mod scope;

// Internal modules
mod internal;
mod lifecycle;
mod registry;
mod resolver;
mod store;

// Re-export core types
pub use capability::Capability;
pub use config::{ConfigError, ContainerConfig};
pub use container::{Container, ScopeGuard};
pub use definition::{BeanDefinition, BeanDefinitionBuilder, DefinitionSource, Dependency, DependencyKind};
pub use descriptors::{BeanDescriptor, DependencyDescriptor};
pub use error::{BoxError, DestructionError, DiError, DiResult};
pub use instance::InstanceState;
pub use observer::{ContainerObserver, TracingObserver};
pub use provider::{Dependencies, LazyProvider, ScopedProxy};
pub use scope::Scope;
