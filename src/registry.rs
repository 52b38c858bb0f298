//! Bean definition registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::capability::Capability;
use crate::definition::{BeanDefinition, DefinitionSource};
use crate::error::{DiError, DiResult};

/// Registry holding all bean definitions in registration order.
///
/// Definitions are indexed by id and by every capability they provide.
/// Once sealed, the registry rejects any further change.
pub(crate) struct BeanRegistry {
    /// Definitions in registration order
    definitions: Vec<Arc<BeanDefinition>>,
    /// id -> position in `definitions`
    by_id: HashMap<String, usize>,
    /// capability -> positions in `definitions`, registration order
    by_capability: HashMap<Capability, Vec<usize>>,
    sealed: bool,
    allow_overriding: bool,
}

impl BeanRegistry {
    pub(crate) fn new(allow_overriding: bool) -> Self {
        Self {
            definitions: Vec::new(),
            by_id: HashMap::new(),
            by_capability: HashMap::new(),
            sealed: false,
            allow_overriding,
        }
    }

    /// Adds a definition.
    ///
    /// A duplicate id fails with `DuplicateId`, except that with overriding
    /// allowed a `Manual` definition replaces a `Scanned` one in place.
    pub(crate) fn register(&mut self, definition: BeanDefinition) -> DiResult<()> {
        if self.sealed {
            return Err(DiError::Sealed);
        }

        if let Some(&pos) = self.by_id.get(&definition.id) {
            let existing = &self.definitions[pos];
            let may_override = self.allow_overriding
                && definition.source == DefinitionSource::Manual
                && existing.source == DefinitionSource::Scanned;
            if !may_override {
                return Err(DiError::DuplicateId(definition.id));
            }

            warn!(
                id = %definition.id,
                replaced = existing.type_name,
                replacement = definition.type_name,
                "manual bean definition overrides scanned definition"
            );
            self.definitions[pos] = Arc::new(definition);
            self.rebuild_capability_index();
            return Ok(());
        }

        debug!(id = %definition.id, scope = %definition.scope, "registering bean definition");
        let pos = self.definitions.len();
        for capability in definition.capabilities() {
            self.by_capability.entry(capability).or_default().push(pos);
        }
        self.by_id.insert(definition.id.clone(), pos);
        self.definitions.push(Arc::new(definition));
        Ok(())
    }

    /// Freezes the registry.
    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Arc<BeanDefinition>> {
        self.by_id.get(id).map(|&pos| &self.definitions[pos])
    }

    /// Definitions providing `capability`, narrowed by `qualifier` if given.
    ///
    /// The qualifier first matches the `qualifier` field exactly. Only when no
    /// definition carries that qualifier does it fall back to matching the
    /// definition id ("match by name").
    pub(crate) fn lookup(
        &self,
        capability: Capability,
        qualifier: Option<&str>,
    ) -> Vec<&Arc<BeanDefinition>> {
        let all = self.providers_of(capability);
        match qualifier {
            None => all.collect(),
            Some(q) => {
                let by_qualifier: Vec<_> = all.clone().filter(|d| d.has_qualifier(q)).collect();
                if !by_qualifier.is_empty() {
                    by_qualifier
                } else {
                    all.filter(|d| d.id == q).collect()
                }
            }
        }
    }

    /// Every definition providing `capability`, in registration order.
    pub(crate) fn providers_of(
        &self,
        capability: Capability,
    ) -> impl Iterator<Item = &Arc<BeanDefinition>> + Clone + '_ {
        self.by_capability
            .get(&capability)
            .map(|positions| positions.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&pos| &self.definitions[pos])
    }

    /// All definitions in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<BeanDefinition>> {
        self.definitions.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.definitions.len()
    }

    fn rebuild_capability_index(&mut self) {
        self.by_capability.clear();
        for (pos, definition) in self.definitions.iter().enumerate() {
            for capability in definition.capabilities() {
                self.by_capability.entry(capability).or_default().push(pos);
            }
        }
    }
}
