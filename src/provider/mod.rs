//! Dependency handles given to factories: resolved values, lazy providers and
//! scoped proxies.

pub mod context;
mod lazy;
mod proxy;

pub use context::Dependencies;
pub use lazy::LazyProvider;
pub use proxy::ScopedProxy;

pub(crate) use context::{unbox, HandleTarget};
