//! Live instance records.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::definition::{AnyArc, BeanDefinition};

/// Lifecycle state of a live bean.
///
/// States only move forward: `Created -> Injected -> Initialized -> Destroyed`.
/// A bean is handed to callers only once it is `Initialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstanceState {
    /// The factory returned
    Created = 0,
    /// Dependencies are bound
    Injected = 1,
    /// The init hook completed (or there was none)
    Initialized = 2,
    /// The destroy hook ran; the instance must not be used again
    Destroyed = 3,
}

impl InstanceState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => InstanceState::Created,
            1 => InstanceState::Injected,
            2 => InstanceState::Initialized,
            _ => InstanceState::Destroyed,
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstanceState::Created => "created",
            InstanceState::Injected => "injected",
            InstanceState::Initialized => "initialized",
            InstanceState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// One live object together with the definition that built it.
pub(crate) struct InstanceRecord {
    pub(crate) definition: Arc<BeanDefinition>,
    pub(crate) instance: AnyArc,
    state: AtomicU8,
}

impl InstanceRecord {
    pub(crate) fn new(definition: Arc<BeanDefinition>, instance: AnyArc) -> Self {
        Self {
            definition,
            instance,
            state: AtomicU8::new(InstanceState::Created as u8),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.definition.id
    }

    pub(crate) fn state(&self) -> InstanceState {
        InstanceState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves to `next` unless already there or beyond.
    ///
    /// Returns whether the state changed.
    pub(crate) fn advance(&self, next: InstanceState) -> bool {
        let previous = self.state.fetch_max(next as u8, Ordering::AcqRel);
        previous < next as u8
    }
}

impl fmt::Debug for InstanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRecord")
            .field("id", &self.definition.id)
            .field("state", &self.state())
            .finish()
    }
}
