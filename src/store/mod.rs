//! Scope stores: where live instances are kept, one policy per scope.

pub(crate) mod contextual;
pub(crate) mod prototype;
pub(crate) mod singleton;

pub(crate) use contextual::{ContextKey, ContextualStore};
pub(crate) use prototype::PrototypeFactory;
pub(crate) use singleton::SingletonStore;
