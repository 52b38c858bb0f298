//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{DiError, DiResult};

// Thread-local resolution stacks, one per container
thread_local! {
    static RESOLUTION_TLS: RefCell<HashMap<u64, Vec<String>>> = RefCell::new(HashMap::new());
}

/// Guard for one frame of the thread-local resolution stack.
///
/// Entering an id that is already on the calling thread's stack fails with
/// `Circular`, carrying the path from the first occurrence back to it.
/// Example path: `["orderService", "memberRepository", "orderService"]`.
pub(crate) struct StackGuard {
    container: u64,
}

impl StackGuard {
    pub(crate) fn enter(container: u64, id: &str, max_depth: usize) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            let stack = tls.entry(container).or_default();

            // Circular detection BEFORE pushing the new id
            if stack.iter().any(|n| n == id) {
                let mut path = stack.clone();
                path.push(id.to_string());
                return Err(DiError::Circular(path));
            }

            // Depth guard
            if stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(max_depth));
            }

            stack.push(id.to_string());
            Ok(Self { container })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        // try_with: the TLS may already be gone during thread teardown
        let _ = RESOLUTION_TLS.try_with(|tls| {
            let mut tls = tls.borrow_mut();
            if let Some(stack) = tls.get_mut(&self.container) {
                stack.pop();
                if stack.is_empty() {
                    tls.remove(&self.container);
                }
            }
        });
    }
}

/// Ids currently being built by the calling thread, outermost first.
pub(crate) fn current_chain(container: u64) -> Vec<String> {
    RESOLUTION_TLS.with(|tls| tls.borrow().get(&container).cloned().unwrap_or_default())
}
