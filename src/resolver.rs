//! Dependency resolution: picks exactly one definition for a capability.

use std::sync::Arc;

use crate::capability::Capability;
use crate::definition::BeanDefinition;
use crate::error::{DiError, DiResult};
use crate::registry::BeanRegistry;

/// Resolves a `(capability, qualifier)` request against the registry.
///
/// Precedence is **qualifier > primary > nothing**:
///
/// 1. Candidates are the definitions providing the capability, narrowed by
///    the qualifier when one is given (qualifier field first, then id).
/// 2. No candidates: `NoSuchBean`, carrying the qualifier if one was given.
/// 3. Exactly one candidate: it wins.
/// 4. Several: keep those marked `primary`; exactly one left wins, otherwise
///    `Ambiguous` with every remaining candidate id.
///
/// Registration order never breaks a tie.
pub(crate) struct DependencyResolver<'r> {
    registry: &'r BeanRegistry,
}

impl<'r> DependencyResolver<'r> {
    pub(crate) fn new(registry: &'r BeanRegistry) -> Self {
        Self { registry }
    }

    pub(crate) fn resolve(
        &self,
        capability: Capability,
        qualifier: Option<&str>,
    ) -> DiResult<&'r Arc<BeanDefinition>> {
        let candidates = self.registry.lookup(capability, qualifier);

        match candidates.len() {
            0 => Err(DiError::NoSuchBean {
                capability: capability.name(),
                qualifier: qualifier.map(str::to_string),
            }),
            1 => Ok(candidates[0]),
            _ => {
                let primaries: Vec<_> = candidates.iter().filter(|d| d.is_primary()).collect();
                if primaries.len() == 1 {
                    return Ok(*primaries[0]);
                }
                // Report the primaries when several claim it, all candidates otherwise
                let remaining = if primaries.is_empty() {
                    candidates.iter().map(|d| d.id.clone()).collect()
                } else {
                    primaries.iter().map(|d| d.id.clone()).collect()
                };
                Err(DiError::Ambiguous {
                    capability: capability.name(),
                    candidates: remaining,
                })
            }
        }
    }

    /// Resolves to a definition id.
    pub(crate) fn resolve_id(
        &self,
        capability: Capability,
        qualifier: Option<&str>,
    ) -> DiResult<String> {
        self.resolve(capability, qualifier).map(|d| d.id.clone())
    }
}
