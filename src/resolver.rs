//! Component registry for a single generation run.
//!
//! The [`Resolver`] maps canonical identities to components. Every builder
//! registers a pending component for an identity *before* descending into
//! its children, so a second visit (including one through a cycle) finds the
//! entry and stops.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::trace;

use crate::component::{ComponentDefinition, TypeDefinition};
use crate::error::GenerateError;
use crate::reference::ComponentReference;

/// Memoizing store of identity -> component.
///
/// Scoped to one run; concurrent runs must each use their own instance.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Resolver {
    components: BTreeMap<String, ComponentDefinition>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `component` under its canonical identity, replacing any entry.
    pub fn register(&mut self, component: ComponentDefinition) {
        trace!(id = %component.id, pending = component.is_pending(), "register component");
        self.components
            .insert(component.id.canonical().to_string(), component);
    }

    pub fn resolve(&self, id: &ComponentReference) -> Option<&ComponentDefinition> {
        self.components.get(id.canonical())
    }

    pub fn contains(&self, id: &ComponentReference) -> bool {
        self.components.contains_key(id.canonical())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Registered components in canonical order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.components.values()
    }

    /// Concrete definition registered for `id`, following reference chains.
    pub fn resolve_definition(
        &self,
        id: &ComponentReference,
    ) -> Result<&TypeDefinition, GenerateError> {
        let component = self
            .resolve(id)
            .ok_or_else(|| GenerateError::DanglingReference {
                reference: id.to_string(),
            })?;
        self.follow(component)
    }

    /// Check that every registered component reaches a definition.
    pub fn verify(&self) -> Result<(), GenerateError> {
        for component in self.components() {
            self.follow(component)?;
        }
        Ok(())
    }

    /// Follow `component` until a concrete definition is reached.
    ///
    /// A link to an unregistered or still pending component is a
    /// `DanglingReference`; a chain that revisits a component is an
    /// `UnterminatedReference`.
    pub fn follow<'a>(
        &'a self,
        component: &'a ComponentDefinition,
    ) -> Result<&'a TypeDefinition, GenerateError> {
        let mut visited = HashSet::new();
        let mut current = component;

        loop {
            if let Some(definition) = &current.definition {
                return Ok(definition);
            }

            let Some(target) = &current.reference else {
                return Err(GenerateError::DanglingReference {
                    reference: current.id.to_string(),
                });
            };

            if !visited.insert(target.canonical()) {
                return Err(GenerateError::UnterminatedReference {
                    reference: component.id.to_string(),
                });
            }

            current = self
                .resolve(target)
                .ok_or_else(|| GenerateError::DanglingReference {
                    reference: target.to_string(),
                })?;
        }
    }
}
