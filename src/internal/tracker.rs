//! Per-id construction slots shared by all threads of a container.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::error::{DiError, DiResult};

struct Waiting {
    slot: String,
    id: String,
}

#[derive(Default)]
struct TrackerState {
    /// slot key -> thread currently building it
    owners: HashMap<String, ThreadId>,
    /// thread -> slot it is blocked on
    waiting: HashMap<ThreadId, Waiting>,
}

impl TrackerState {
    /// Follows the wait-for chain starting at `owner`.
    ///
    /// Returns the ids along the chain if it leads back to `me`.
    fn wait_path_to(&self, mut owner: ThreadId, me: ThreadId) -> Option<Vec<String>> {
        let mut path = Vec::new();
        // Bounded by the number of blocked threads
        for _ in 0..=self.waiting.len() {
            let blocked_on = self.waiting.get(&owner)?;
            path.push(blocked_on.id.clone());
            owner = *self.owners.get(&blocked_on.slot)?;
            if owner == me {
                return Some(path);
            }
        }
        None
    }
}

/// The container-wide "in construction" set.
///
/// A slot serializes construction of one cacheable instance (one singleton, or
/// one contextual instance within one context). Unrelated slots never block
/// each other. Before blocking on a slot the caller checks the wait-for graph,
/// so a cycle spread over several threads fails with `Circular` instead of
/// deadlocking.
#[derive(Default)]
pub(crate) struct ConstructionTracker {
    state: Mutex<TrackerState>,
    released: Condvar,
}

impl ConstructionTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claims `slot` for the calling thread, waiting while another thread
    /// holds it.
    ///
    /// `chain` yields the caller's own resolution stack and is only consulted
    /// to build the error path.
    pub(crate) fn acquire<F>(&self, slot: &str, id: &str, chain: F) -> DiResult<SlotGuard<'_>>
    where
        F: Fn() -> Vec<String>,
    {
        let me = thread::current().id();
        let mut state = self.state.lock();

        loop {
            let owner = match state.owners.get(slot) {
                None => {
                    state.owners.insert(slot.to_string(), me);
                    return Ok(SlotGuard {
                        tracker: self,
                        slot: slot.to_string(),
                    });
                }
                Some(&owner) => owner,
            };

            if owner == me {
                let mut path = chain();
                path.push(id.to_string());
                return Err(DiError::Circular(path));
            }

            if let Some(rest) = state.wait_path_to(owner, me) {
                let mut path = chain();
                path.push(id.to_string());
                path.extend(rest);
                return Err(DiError::Circular(path));
            }

            state.waiting.insert(
                me,
                Waiting {
                    slot: slot.to_string(),
                    id: id.to_string(),
                },
            );
            self.released.wait(&mut state);
            state.waiting.remove(&me);
        }
    }

    #[cfg(test)]
    fn is_held(&self, slot: &str) -> bool {
        self.state.lock().owners.contains_key(slot)
    }
}

/// Releases the slot and wakes waiters on drop.
pub(crate) struct SlotGuard<'t> {
    tracker: &'t ConstructionTracker,
    slot: String,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.tracker.state.lock().owners.remove(&self.slot);
        self.tracker.released.notify_all();
    }
}
