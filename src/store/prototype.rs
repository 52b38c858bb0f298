//! Uncached instances.

use std::sync::Arc;

use tracing::trace;

use crate::error::DiResult;
use crate::instance::InstanceRecord;

/// Builds a fresh instance on every request.
///
/// Nothing is cached or logged: once the instance is `Initialized` the caller
/// owns it, and its destroy hook is never run by the container.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PrototypeFactory;

impl PrototypeFactory {
    pub(crate) fn get<F>(&self, id: &str, build: F) -> DiResult<Arc<InstanceRecord>>
    where
        F: FnOnce() -> DiResult<Arc<InstanceRecord>>,
    {
        trace!(id, "building prototype");
        build()
    }
}
