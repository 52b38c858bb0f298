//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod tracker;

pub(crate) use circular::{current_chain, StackGuard};
pub(crate) use tracker::ConstructionTracker;
